//! Verdict parsing
//!
//! Judges reply in a loosely-held two-block format: a ranking line and a
//! justification line. Parsing is the pipeline's main source of data loss,
//! so every failure is an explicit variant and the raw text always travels
//! with the structured result for audit.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::exercises::Language;

use super::{Presentation, StructuredRanking};

/// Unstructured response from one judge for one (exercise, presentation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVerdict {
    pub judge: String,
    pub exercise_index: usize,
    pub text: String,
}

/// Why a verdict could not be turned into a structured ranking
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    #[error("verdict has fewer than two blocks")]
    MissingBlocks,

    #[error("no ranking list found in ranking block")]
    NoRankingList,

    #[error("malformed ranking entry: '{0}'")]
    MalformedEntry(String),

    #[error("expected {expected} ranking entries, found {found}")]
    WrongEntryCount { expected: usize, found: usize },

    #[error("cannot parse ordinal from '{0}'")]
    BadOrdinal(String),

    #[error("label '{0}' does not match any presented candidate")]
    UnknownLabel(String),

    #[error("label '{0}' appears more than once")]
    DuplicateLabel(String),

    #[error("ranks {0:?} are not a permutation of 1..=3")]
    NotAPermutation(Vec<u8>),
}

/// Successful parse of one verdict
#[derive(Debug, Clone)]
pub struct ParsedVerdict {
    pub ranking: StructuredRanking,
    pub justification: String,
}

/// Parse one raw verdict against the presentation used to produce it.
///
/// Slot labels in the ranking list are resolved through the presentation's
/// slot mapping back to true language tags; this is the step that undoes
/// the shuffle.
pub fn parse_verdict(
    verdict: &RawVerdict,
    presentation: &Presentation,
) -> Result<ParsedVerdict, VerdictError> {
    let (ranking_block, justification_block) = split_blocks(&verdict.text)?;

    let entries = extract_entries(&ranking_block)?;
    if entries.len() != presentation.len() {
        return Err(VerdictError::WrongEntryCount {
            expected: presentation.len(),
            found: entries.len(),
        });
    }

    let mut pairs: Vec<(Language, u8)> = Vec::with_capacity(entries.len());
    for (label, ordinal) in entries {
        let language: Language = label
            .parse()
            .map_err(|_| VerdictError::UnknownLabel(label.clone()))?;
        let slot = presentation
            .slot_of(language)
            .ok_or_else(|| VerdictError::UnknownLabel(label.clone()))?;
        let tag = presentation
            .language_at(slot)
            .ok_or_else(|| VerdictError::UnknownLabel(label.clone()))?;
        pairs.push((tag, ordinal));
    }

    let ranking = StructuredRanking::from_pairs(&pairs)?;

    Ok(ParsedVerdict {
        ranking,
        justification: clean_justification(&justification_block),
    })
}

/// Split the verdict into a ranking block and a justification block.
/// The literal markers win; the first blank line is the fallback.
fn split_blocks(text: &str) -> Result<(String, String), VerdictError> {
    let lines: Vec<&str> = text.lines().collect();

    let rank_idx = lines
        .iter()
        .position(|l| l.to_lowercase().contains("ranking:"));
    let just_idx = lines
        .iter()
        .position(|l| l.to_lowercase().contains("justification:"));

    if let (Some(r), Some(j)) = (rank_idx, just_idx) {
        if j > r {
            return Ok((lines[r..j].join("\n"), lines[j..].join("\n")));
        }
    }

    // Fallback: first blank line separates the two blocks
    if let Some(blank) = lines.iter().position(|l| l.trim().is_empty()) {
        let first = lines[..blank].join("\n");
        let second = lines[blank + 1..].join("\n");
        if !first.trim().is_empty() && !second.trim().is_empty() {
            return Ok((first, second));
        }
    }

    Err(VerdictError::MissingBlocks)
}

/// Extract `label: ordinal` pairs from the ranking block
fn extract_entries(block: &str) -> Result<Vec<(String, u8)>, VerdictError> {
    // Prefer the bracketed list; fall back to whatever follows the marker
    let bracketed = Regex::new(r"\[([^\]]*)\]").unwrap();
    let list = match bracketed.captures(block) {
        Some(caps) => caps[1].to_string(),
        None => {
            let marker = Regex::new(r"(?i)ranking\s*:").unwrap();
            match marker.find(block) {
                Some(m) => block[m.end()..].trim().to_string(),
                None => return Err(VerdictError::NoRankingList),
            }
        }
    };

    if list.trim().is_empty() {
        return Err(VerdictError::NoRankingList);
    }

    let ordinal_re = Regex::new(r"^\s*(\d+)").unwrap();

    let mut entries = Vec::new();
    for piece in list.split(',') {
        let mut halves = piece.splitn(2, ':');
        let label = halves
            .next()
            .map(|s| s.trim().trim_matches('*').trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerdictError::MalformedEntry(piece.trim().to_string()))?;
        let ordinal_text = halves
            .next()
            .map(str::trim)
            .ok_or_else(|| VerdictError::MalformedEntry(piece.trim().to_string()))?;

        // Leading integer; trailing text like "1st place" is tolerated
        let ordinal: u8 = ordinal_re
            .captures(ordinal_text)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| VerdictError::BadOrdinal(ordinal_text.to_string()))?;

        entries.push((label, ordinal));
    }

    Ok(entries)
}

/// Strip the marker and optional brackets from the justification block
fn clean_justification(block: &str) -> String {
    let marker = Regex::new(r"(?i)^\s*\**\s*justification\s*:\s*\**\s*").unwrap();
    let stripped = marker.replace(block.trim(), "");
    let text = stripped.trim();
    let text = text.strip_prefix('[').unwrap_or(text);
    let text = text.strip_suffix(']').unwrap_or(text);
    text.trim().trim_end_matches('*').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::Language::*;

    fn verdict(text: &str) -> RawVerdict {
        RawVerdict {
            judge: "gpt-4o-mini".to_string(),
            exercise_index: 17,
            text: text.to_string(),
        }
    }

    fn roster_presentation() -> Presentation {
        Presentation::new(vec![De, En, Ar])
    }

    #[test]
    fn test_parse_well_formed_verdict() {
        let parsed = parse_verdict(
            &verdict(
                "**Ranking:** [de: 2, en: 1, ar: 3]\n\
                 **Justification:** [The English solution is clearest.]",
            ),
            &roster_presentation(),
        )
        .unwrap();

        assert_eq!(parsed.ranking.rank_of(En), Some(1));
        assert_eq!(parsed.ranking.rank_of(De), Some(2));
        assert_eq!(parsed.ranking.rank_of(Ar), Some(3));
        assert_eq!(parsed.justification, "The English solution is clearest.");
    }

    #[test]
    fn test_round_trip_through_presentation() {
        // Constructing a verdict from a known ranking and presentation and
        // parsing it back recovers the ranking exactly.
        let presentations = [
            vec![En, De, Ar],
            vec![En, Ar, De],
            vec![De, En, Ar],
            vec![De, Ar, En],
            vec![Ar, En, De],
            vec![Ar, De, En],
        ];
        let ranking =
            StructuredRanking::from_pairs(&[(En, 2), (De, 3), (Ar, 1)]).unwrap();

        for shown in presentations {
            let presentation = Presentation::new(shown);
            let list = presentation
                .slots()
                .iter()
                .map(|&lang| format!("{}: {}", lang, ranking.rank_of(lang).unwrap()))
                .collect::<Vec<_>>()
                .join(", ");
            let text = format!(
                "**Ranking:** [{}]\n**Justification:** [consistent ordering]",
                list
            );

            let parsed = parse_verdict(&verdict(&text), &presentation).unwrap();
            assert_eq!(parsed.ranking, ranking);
        }
    }

    #[test]
    fn test_rejects_tied_ordinals() {
        let err = parse_verdict(
            &verdict("**Ranking:** [de: 1, en: 1, ar: 2]\n**Justification:** [tied]"),
            &roster_presentation(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::NotAPermutation(_)));
    }

    #[test]
    fn test_tolerates_ordinal_suffixes() {
        let parsed = parse_verdict(
            &verdict(
                "**Ranking:** [de: 1st, en: 2nd place, ar: 3rd]\n\
                 **Justification:** [suffixed ordinals]",
            ),
            &roster_presentation(),
        )
        .unwrap();
        assert_eq!(parsed.ranking.rank_of(De), Some(1));
        assert_eq!(parsed.ranking.rank_of(Ar), Some(3));
    }

    #[test]
    fn test_blank_line_fallback_without_markers() {
        let parsed = parse_verdict(
            &verdict("[de: 3, en: 1, ar: 2]\n\nThe English answer was complete."),
            &roster_presentation(),
        )
        .unwrap();
        assert_eq!(parsed.ranking.rank_of(En), Some(1));
        assert_eq!(parsed.justification, "The English answer was complete.");
    }

    #[test]
    fn test_noise_before_markers_is_tolerated() {
        let parsed = parse_verdict(
            &verdict(
                "Here is my evaluation of the three solutions.\n\
                 **Ranking:** [de: 2, en: 1, ar: 3]\n\
                 **Justification:** [noise up front]",
            ),
            &roster_presentation(),
        )
        .unwrap();
        assert_eq!(parsed.ranking.rank_of(En), Some(1));
    }

    #[test]
    fn test_missing_justification_block_fails() {
        let err = parse_verdict(
            &verdict("**Ranking:** [de: 2, en: 1, ar: 3]"),
            &roster_presentation(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::MissingBlocks));
    }

    #[test]
    fn test_wrong_entry_count() {
        let err = parse_verdict(
            &verdict("**Ranking:** [de: 2, en: 1]\n**Justification:** [two only]"),
            &roster_presentation(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::WrongEntryCount {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_unknown_label() {
        let err = parse_verdict(
            &verdict("**Ranking:** [fr: 1, en: 2, ar: 3]\n**Justification:** [wrong tag]"),
            &roster_presentation(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::UnknownLabel(_)));
    }

    #[test]
    fn test_unparseable_ordinal() {
        let err = parse_verdict(
            &verdict(
                "**Ranking:** [de: first, en: 2, ar: 3]\n**Justification:** [words]",
            ),
            &roster_presentation(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::BadOrdinal(_)));
    }
}
