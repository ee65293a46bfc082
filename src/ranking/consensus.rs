//! Majority-vote consensus across judges
//!
//! Positions are resolved independently: Best can settle on a language
//! while Mid stays tied. A language qualifies for a position only with a
//! strict majority of the usable rankings; zero or several qualifiers both
//! collapse to the TIE sentinel.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::exercises::Language;

use super::StructuredRanking;

/// Outcome for one position: a single qualifying language, or TIE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Language(Language),
    Tie,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Language(lang) => lang.as_str(),
            Placement::Tie => "TIE",
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Placement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Placement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "TIE" {
            return Ok(Placement::Tie);
        }
        s.parse::<Language>()
            .map(Placement::Language)
            .map_err(serde::de::Error::custom)
    }
}

/// Majority verdict for one exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusDecision {
    pub best: Placement,
    pub mid: Placement,
    pub worst: Placement,
    /// Rankings that survived calling and parsing
    pub usable_judges: usize,
    /// Set when fewer than two usable rankings backed the decision
    pub low_confidence: bool,
}

/// Reconcile the usable rankings for one exercise into a consensus.
///
/// The threshold is a strict majority of the usable rankings
/// (votes * 2 > usable), which reduces to "at least 2 of 3" for a full
/// three-judge panel and generalizes to any panel size. Deterministic and
/// independent of the order rankings are supplied in.
pub fn decide_consensus(rankings: &[StructuredRanking]) -> ConsensusDecision {
    let usable = rankings.len();

    let mut languages: Vec<Language> = Vec::new();
    for ranking in rankings {
        for lang in ranking.languages() {
            if !languages.contains(&lang) {
                languages.push(lang);
            }
        }
    }
    languages.sort_by_key(|l| l.as_str());

    let placement_for = |position: u8| -> Placement {
        let qualifiers: Vec<Language> = languages
            .iter()
            .copied()
            .filter(|&lang| {
                let votes = rankings
                    .iter()
                    .filter(|r| r.rank_of(lang) == Some(position))
                    .count();
                votes * 2 > usable
            })
            .collect();

        match qualifiers.as_slice() {
            [single] => Placement::Language(*single),
            _ => Placement::Tie,
        }
    };

    ConsensusDecision {
        best: placement_for(1),
        mid: placement_for(2),
        worst: placement_for(3),
        usable_judges: usable,
        low_confidence: usable < 2,
    }
}
