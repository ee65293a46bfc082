//! Most-differently-performing exercises
//!
//! For each exercise, the overall score is the mean of its in-range
//! criterion scores; the spread is the gap between the strongest and
//! weakest language. Sorting by spread surfaces the exercises where the
//! language choice mattered most.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exercises::{Language, ScoreTable};

use super::summary::ScoreFlag;

/// One exercise's per-language overall means and their spread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSpread {
    /// Stable row label, 1-based like the upstream tables
    pub exercise: String,
    pub index: usize,
    pub mean_by_language: IndexMap<Language, f64>,
    /// max - min across languages
    pub spread: f64,
}

/// Build the disagreement report from per-language score tables, sorted by
/// spread descending.
///
/// Tables of different lengths are truncated to the shortest with a warning.
/// A language with no valid score for an exercise contributes 0.0, matching
/// the upstream fill.
pub fn disagreement_report(
    tables: &[ScoreTable],
    criteria: &[String],
    min_score: f64,
    max_score: f64,
) -> (Vec<ExerciseSpread>, Vec<ScoreFlag>) {
    let mut flags = Vec::new();

    if tables.is_empty() {
        return (Vec::new(), flags);
    }

    let min_len = tables.iter().map(|t| t.rows.len()).min().unwrap_or(0);
    for table in tables {
        if table.rows.len() != min_len {
            tracing::warn!(
                "Score table for {} has {} rows, truncating to {}",
                table.language,
                table.rows.len(),
                min_len
            );
        }
    }

    let mut report = Vec::with_capacity(min_len);

    for index in 0..min_len {
        let mut mean_by_language: IndexMap<Language, f64> = IndexMap::new();

        for table in tables {
            let row = &table.rows[index];
            let mut sum = 0.0;
            let mut count = 0usize;

            for criterion in criteria {
                let Some(&value) = row.scores.get(criterion) else {
                    continue;
                };
                if value < min_score || value > max_score || !value.is_finite() {
                    flags.push(ScoreFlag {
                        language: table.language,
                        row: index,
                        criterion: criterion.clone(),
                        value,
                    });
                    continue;
                }
                sum += value;
                count += 1;
            }

            let mean = if count > 0 { sum / count as f64 } else { 0.0 };
            mean_by_language.insert(table.language, mean);
        }

        let max = mean_by_language
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let min = mean_by_language
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let spread = if mean_by_language.is_empty() {
            0.0
        } else {
            max - min
        };

        report.push(ExerciseSpread {
            exercise: format!("exercise_{}", index + 1),
            index,
            mean_by_language,
            spread,
        });
    }

    // Largest disagreement first; index keeps equal spreads stable
    report.sort_by(|a, b| {
        b.spread
            .partial_cmp(&a.spread)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });

    (report, flags)
}
