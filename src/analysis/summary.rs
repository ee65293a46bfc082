//! Per-criterion and per-placement summary tables
//!
//! Summary tables are derived artifacts: recomputed from scratch every run,
//! never mutated incrementally.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exercises::{Language, ScoreTable};
use crate::ranking::{ConsensusDecision, Placement};

/// A rubric value that fell outside the declared score range. Flagged and
/// excluded from the mean, never clamped or substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFlag {
    pub language: Language,
    pub row: usize,
    pub criterion: String,
    pub value: f64,
}

/// Per-criterion, per-language mean rubric scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTable {
    /// criterion -> language -> mean of in-range scores (absent when a
    /// language produced no valid value for the criterion)
    pub means: IndexMap<String, IndexMap<Language, f64>>,
    pub flags: Vec<ScoreFlag>,
}

impl SummaryTable {
    /// Language with the highest mean for each criterion
    pub fn highest_by_criterion(&self) -> IndexMap<String, Language> {
        self.means
            .iter()
            .filter_map(|(criterion, by_lang)| {
                by_lang
                    .iter()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(&lang, _)| (criterion.clone(), lang))
            })
            .collect()
    }
}

/// Compute per-criterion means for each language's score table.
///
/// Values outside [min_score, max_score] are dropped from the mean and
/// recorded as flags.
pub fn summarize_scores(
    tables: &[ScoreTable],
    criteria: &[String],
    min_score: f64,
    max_score: f64,
) -> SummaryTable {
    let mut means: IndexMap<String, IndexMap<Language, f64>> = IndexMap::new();
    let mut flags = Vec::new();

    for criterion in criteria {
        let mut by_lang: IndexMap<Language, f64> = IndexMap::new();

        for table in tables {
            let mut sum = 0.0;
            let mut count = 0usize;

            for (row_idx, row) in table.rows.iter().enumerate() {
                let Some(&value) = row.scores.get(criterion) else {
                    continue;
                };
                if value < min_score || value > max_score || !value.is_finite() {
                    flags.push(ScoreFlag {
                        language: table.language,
                        row: row_idx,
                        criterion: criterion.clone(),
                        value,
                    });
                    continue;
                }
                sum += value;
                count += 1;
            }

            if count > 0 {
                by_lang.insert(table.language, sum / count as f64);
            }
        }

        means.insert(criterion.clone(), by_lang);
    }

    SummaryTable { means, flags }
}

/// Per-language tallies of Best/Mid/Worst placements across a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementCounts {
    pub best: IndexMap<String, usize>,
    pub mid: IndexMap<String, usize>,
    pub worst: IndexMap<String, usize>,
    pub total_decisions: usize,
    pub low_confidence: usize,
}

impl PlacementCounts {
    /// Count for one (position row, placement key) cell, zero when absent
    pub fn get(&self, position: &str, key: &str) -> usize {
        let map = match position {
            "Best" => &self.best,
            "Mid" => &self.mid,
            "Worst" => &self.worst,
            _ => return 0,
        };
        map.get(key).copied().unwrap_or(0)
    }
}

/// Tally consensus decisions into per-language placement counts.
/// The TIE sentinel gets its own row, as in the cleaned results table.
pub fn count_placements(decisions: &[ConsensusDecision]) -> PlacementCounts {
    let mut counts = PlacementCounts {
        total_decisions: decisions.len(),
        ..Default::default()
    };

    let mut bump = |map: &mut IndexMap<String, usize>, placement: &Placement| {
        *map.entry(placement.as_str().to_string()).or_insert(0) += 1;
    };

    for decision in decisions {
        bump(&mut counts.best, &decision.best);
        bump(&mut counts.mid, &decision.mid);
        bump(&mut counts.worst, &decision.worst);
        if decision.low_confidence {
            counts.low_confidence += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::loader::ScoreRow;
    use crate::exercises::Language::*;
    use crate::ranking::decide_consensus;
    use crate::ranking::StructuredRanking;

    fn table(language: Language, rows: Vec<Vec<(&str, f64)>>) -> ScoreTable {
        ScoreTable {
            language,
            rows: rows
                .into_iter()
                .map(|scores| ScoreRow {
                    exercise: None,
                    scores: scores
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                })
                .collect(),
        }
    }

    fn criteria() -> Vec<String> {
        vec!["Clarity".to_string(), "Correctness".to_string()]
    }

    #[test]
    fn test_means_per_criterion_and_language() {
        let tables = vec![
            table(En, vec![
                vec![("Clarity", 2.0), ("Correctness", 1.0)],
                vec![("Clarity", 1.0), ("Correctness", 2.0)],
            ]),
            table(De, vec![
                vec![("Clarity", 0.0), ("Correctness", 1.0)],
                vec![("Clarity", 1.0), ("Correctness", 1.0)],
            ]),
        ];

        let summary = summarize_scores(&tables, &criteria(), 0.0, 2.0);
        assert_eq!(summary.means["Clarity"][&En], 1.5);
        assert_eq!(summary.means["Clarity"][&De], 0.5);
        assert_eq!(summary.means["Correctness"][&En], 1.5);
        assert!(summary.flags.is_empty());

        let highest = summary.highest_by_criterion();
        assert_eq!(highest["Clarity"], En);
    }

    #[test]
    fn test_out_of_range_scores_are_excluded_and_flagged() {
        // 3 with a declared max of 2 must not be clamped into the mean
        let tables = vec![table(En, vec![
            vec![("Clarity", 3.0)],
            vec![("Clarity", 1.0)],
            vec![("Clarity", 1.0)],
        ])];

        let summary = summarize_scores(&tables, &criteria(), 0.0, 2.0);
        assert_eq!(summary.means["Clarity"][&En], 1.0);
        assert_eq!(summary.flags.len(), 1);
        assert_eq!(summary.flags[0].value, 3.0);
        assert_eq!(summary.flags[0].row, 0);
    }

    #[test]
    fn test_language_with_no_valid_scores_has_no_mean() {
        let tables = vec![table(De, vec![vec![("Clarity", -5.0)]])];
        let summary = summarize_scores(&tables, &criteria(), 0.0, 2.0);
        assert!(summary.means["Clarity"].get(&De).is_none());
        assert_eq!(summary.flags.len(), 1);
    }

    #[test]
    fn test_placement_counts_include_tie_row() {
        let unanimous = vec![
            StructuredRanking::from_pairs(&[(En, 1), (De, 2), (Ar, 3)]).unwrap(),
            StructuredRanking::from_pairs(&[(En, 1), (De, 2), (Ar, 3)]).unwrap(),
            StructuredRanking::from_pairs(&[(En, 1), (De, 2), (Ar, 3)]).unwrap(),
        ];
        let split = vec![
            StructuredRanking::from_pairs(&[(En, 1), (De, 2), (Ar, 3)]).unwrap(),
            StructuredRanking::from_pairs(&[(De, 1), (Ar, 2), (En, 3)]).unwrap(),
            StructuredRanking::from_pairs(&[(Ar, 1), (En, 2), (De, 3)]).unwrap(),
        ];

        let decisions = vec![decide_consensus(&unanimous), decide_consensus(&split)];
        let counts = count_placements(&decisions);

        assert_eq!(counts.total_decisions, 2);
        assert_eq!(counts.get("Best", "en"), 1);
        assert_eq!(counts.get("Best", "TIE"), 1);
        assert_eq!(counts.get("Worst", "ar"), 1);
        assert_eq!(counts.low_confidence, 0);
    }
}
