//! Input-table loading from JSON files
//!
//! Solution and technical-term tables are produced upstream, one file per
//! language, keyed consistently by (topic area, topic, progress level,
//! exercise text) and ordered identically across files. Each file declares
//! its own language. Tables of unequal length are truncated to the shortest
//! with a warning rather than failing the run.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Exercise, ExerciseSet, Language, ProgressLevel};

/// Error type for table loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Duplicate table for language {0}")]
    DuplicateLanguage(Language),

    #[error("Empty exercise set")]
    Empty,
}

/// Top-level solution table file
#[derive(Debug, Deserialize)]
struct SolutionTableFile {
    #[allow(dead_code)]
    #[serde(default)]
    version: Option<String>,
    language: Language,
    rows: Vec<SolutionRow>,
}

/// One row of a solution table (flat, human-friendly schema)
#[derive(Debug, Deserialize)]
struct SolutionRow {
    topic_area: String,
    topic: String,
    progress_level: String,
    exercise: String,
    solution: String,
}

/// Top-level technical-terms table file
#[derive(Debug, Deserialize)]
struct TermsTableFile {
    language: Language,
    rows: Vec<TermsRow>,
}

#[derive(Debug, Deserialize)]
struct TermsRow {
    #[allow(dead_code)]
    #[serde(default)]
    exercise: Option<String>,
    technical_terms: String,
}

fn parse_solution_table(content: &str) -> Result<SolutionTableFile, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse(format!("solution table: {}", e)))
}

fn parse_terms_table(content: &str) -> Result<TermsTableFile, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse(format!("terms table: {}", e)))
}

/// Load the full exercise set from per-language solution and terms tables.
///
/// The roster order follows the order solution files are given; the first
/// file is the reference for exercise metadata (topic, progress level,
/// exercise text). Terms tables are joined positionally; a missing row
/// falls back at prompt time.
pub fn load_exercise_set<P: AsRef<Path>>(
    solution_paths: &[P],
    terms_paths: &[P],
) -> Result<ExerciseSet, LoadError> {
    let mut solutions: IndexMap<Language, Vec<SolutionRow>> = IndexMap::new();
    for path in solution_paths {
        let content = std::fs::read_to_string(path.as_ref())?;
        let table = parse_solution_table(&content)?;
        if solutions.insert(table.language, table.rows).is_some() {
            return Err(LoadError::DuplicateLanguage(table.language));
        }
    }

    let mut terms: IndexMap<Language, Vec<TermsRow>> = IndexMap::new();
    for path in terms_paths {
        let content = std::fs::read_to_string(path.as_ref())?;
        let table = parse_terms_table(&content)?;
        if terms.insert(table.language, table.rows).is_some() {
            return Err(LoadError::DuplicateLanguage(table.language));
        }
    }

    build_exercise_set(solutions, terms)
}

fn build_exercise_set(
    solutions: IndexMap<Language, Vec<SolutionRow>>,
    terms: IndexMap<Language, Vec<TermsRow>>,
) -> Result<ExerciseSet, LoadError> {
    let languages: Vec<Language> = solutions.keys().copied().collect();
    let &reference = languages.first().ok_or(LoadError::Empty)?;

    // Tables must line up row for row; degrade to the shortest common length.
    let min_len = solutions
        .values()
        .map(|rows| rows.len())
        .min()
        .ok_or(LoadError::Empty)?;
    for (lang, rows) in &solutions {
        if rows.len() != min_len {
            tracing::warn!(
                "Solution table for {} has {} rows, truncating to {}",
                lang,
                rows.len(),
                min_len
            );
        }
    }
    if min_len == 0 {
        return Err(LoadError::Empty);
    }

    let reference_rows = &solutions[&reference];

    let mut exercises = Vec::with_capacity(min_len);
    for index in 0..min_len {
        let base = &reference_rows[index];

        let progress_level: ProgressLevel = base
            .progress_level
            .parse()
            .map_err(|e| LoadError::Parse(format!("row {}: {}", index, e)))?;

        let row_solutions: IndexMap<Language, String> = languages
            .iter()
            .filter_map(|&lang| {
                solutions
                    .get(&lang)
                    .and_then(|rows| rows.get(index))
                    .map(|row| (lang, row.solution.clone()))
            })
            .collect();

        let row_terms: IndexMap<Language, String> = languages
            .iter()
            .filter_map(|&lang| {
                terms
                    .get(&lang)
                    .and_then(|rows| rows.get(index))
                    .map(|row| (lang, row.technical_terms.clone()))
            })
            .collect();

        exercises.push(Exercise {
            index,
            topic_area: base.topic_area.clone(),
            topic: base.topic.clone(),
            progress_level,
            text: base.exercise.clone(),
            solutions: row_solutions,
            technical_terms: row_terms,
        });
    }

    Ok(ExerciseSet {
        exercises,
        languages,
    })
}

// ── Rubric score tables ───────────────────────────────────────────────────

/// Per-language rubric score table, one row per exercise
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreTable {
    pub language: Language,
    pub rows: Vec<ScoreRow>,
}

/// Criterion scores for one exercise
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRow {
    #[serde(default)]
    pub exercise: Option<String>,
    /// Criterion name -> raw score as reported by the upstream evaluator
    pub scores: IndexMap<String, f64>,
}

/// Load one language's rubric score table from a JSON file
pub fn load_score_table_from_file(path: impl AsRef<Path>) -> Result<ScoreTable, LoadError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    load_score_table_from_str(&content)
}

pub fn load_score_table_from_str(content: &str) -> Result<ScoreTable, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse(format!("score table: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution_rows(solutions: &[&str]) -> Vec<SolutionRow> {
        solutions
            .iter()
            .enumerate()
            .map(|(i, s)| SolutionRow {
                topic_area: "Arithmetic".to_string(),
                topic: "Fractions".to_string(),
                progress_level: "D".to_string(),
                exercise: format!("exercise {}", i),
                solution: s.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_build_truncates_to_shortest() {
        let mut solutions = IndexMap::new();
        solutions.insert(Language::En, solution_rows(&["a", "b", "c"]));
        solutions.insert(Language::De, solution_rows(&["x", "y"]));
        solutions.insert(Language::Ar, solution_rows(&["p", "q", "r"]));

        let set = build_exercise_set(solutions, IndexMap::new()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.exercises[1].solutions[&Language::De], "y");
        assert_eq!(set.exercises[1].solutions[&Language::Ar], "q");
    }

    #[test]
    fn test_build_rejects_unknown_progress_level() {
        let mut rows = solution_rows(&["a"]);
        rows[0].progress_level = "Z".to_string();
        let mut solutions = IndexMap::new();
        solutions.insert(Language::En, rows);

        assert!(matches!(
            build_exercise_set(solutions, IndexMap::new()),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_solution_table_json() {
        let json = r#"{
            "version": "1.0",
            "language": "de",
            "rows": [
                {
                    "topic_area": "Geometry",
                    "topic": "Angles",
                    "progress_level": "F",
                    "exercise": "Finde den fehlenden Winkel",
                    "solution": "Die Winkelsumme im Dreieck ist 180..."
                }
            ]
        }"#;

        let table = parse_solution_table(json).unwrap();
        assert_eq!(table.language, Language::De);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].progress_level, "F");
    }

    #[test]
    fn test_load_score_table() {
        let json = r#"{
            "language": "de",
            "rows": [
                {
                    "exercise": "exercise 0",
                    "scores": {"Clarity": 1.5, "Correctness of Final Answer": 2.0}
                }
            ]
        }"#;

        let table = load_score_table_from_str(json).unwrap();
        assert_eq!(table.language, Language::De);
        assert_eq!(table.rows[0].scores["Clarity"], 1.5);
    }

    #[test]
    fn test_terms_join_is_positional() {
        let mut solutions = IndexMap::new();
        solutions.insert(Language::En, solution_rows(&["a", "b"]));
        let mut terms = IndexMap::new();
        terms.insert(
            Language::En,
            vec![TermsRow {
                exercise: None,
                technical_terms: "fraction, denominator".to_string(),
            }],
        );

        let set = build_exercise_set(solutions, terms).unwrap();
        assert_eq!(set.exercises[0].terms_for(Language::En), "fraction, denominator");
        // second row has no terms entry; prompt-time fallback applies
        assert_eq!(set.exercises[1].terms_for(Language::En), "No specific terms");
    }
}
