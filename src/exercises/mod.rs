//! Exercise definitions and loading

pub mod loader;

pub use loader::{
    load_exercise_set, load_score_table_from_file, LoadError, ScoreRow, ScoreTable,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Solution language for a generated explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
    Ar,
}

impl Language {
    pub fn all() -> Vec<Language> {
        vec![Language::En, Language::De, Language::Ar]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Ar => "ar",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "de" | "german" => Ok(Language::De),
            "ar" | "arabic" => Ok(Language::Ar),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// School progress level an exercise is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProgressLevel {
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl ProgressLevel {
    /// Grade label shown to judges
    pub fn label(&self) -> &'static str {
        match self {
            ProgressLevel::B => "2nd grade (7yo)",
            ProgressLevel::C => "4th grade (9yo)",
            ProgressLevel::D => "6th grade (11yo)",
            ProgressLevel::E => "7th grade (12yo)",
            ProgressLevel::F => "8th grade (13yo)",
            ProgressLevel::G => "9th grade (14yo)",
            ProgressLevel::H => "10th grade (15yo)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressLevel::B => "B",
            ProgressLevel::C => "C",
            ProgressLevel::D => "D",
            ProgressLevel::E => "E",
            ProgressLevel::F => "F",
            ProgressLevel::G => "G",
            ProgressLevel::H => "H",
        }
    }
}

impl std::str::FromStr for ProgressLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "B" => Ok(ProgressLevel::B),
            "C" => Ok(ProgressLevel::C),
            "D" => Ok(ProgressLevel::D),
            "E" => Ok(ProgressLevel::E),
            "F" => Ok(ProgressLevel::F),
            "G" => Ok(ProgressLevel::G),
            "H" => Ok(ProgressLevel::H),
            _ => Err(format!("Unknown progress level: {}", s)),
        }
    }
}

/// One generated explanation for one exercise, in one language.
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub language: Language,
    pub text: String,
}

/// One exercise with its per-language candidate solutions and technical terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Stable index into the ordered exercise list
    pub index: usize,
    pub topic_area: String,
    pub topic: String,
    pub progress_level: ProgressLevel,
    /// Exercise text in the reference language
    pub text: String,
    /// Candidate solution per language
    pub solutions: IndexMap<Language, String>,
    /// Technical terms required to solve the exercise, per language
    pub technical_terms: IndexMap<Language, String>,
}

impl Exercise {
    /// Whether a candidate exists for every language in the roster.
    /// Ranking is only attempted for complete exercises.
    pub fn is_complete(&self, languages: &[Language]) -> bool {
        languages.iter().all(|lang| {
            self.solutions
                .get(lang)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false)
        })
    }

    /// Candidates in roster order, or None if any language is missing
    pub fn candidates(&self, languages: &[Language]) -> Option<Vec<Candidate>> {
        languages
            .iter()
            .map(|&language| {
                self.solutions.get(&language).map(|text| Candidate {
                    language,
                    text: text.clone(),
                })
            })
            .collect()
    }

    /// Technical terms for a language, with the fallback the judges expect
    pub fn terms_for(&self, language: Language) -> &str {
        self.technical_terms
            .get(&language)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("No specific terms")
    }
}

/// The ordered exercise set under evaluation
#[derive(Debug, Clone)]
pub struct ExerciseSet {
    pub exercises: Vec<Exercise>,
    pub languages: Vec<Language>,
}

impl ExerciseSet {
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Exercises that have all candidates present, with their indices
    pub fn complete_exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises
            .iter()
            .filter(|ex| ex.is_complete(&self.languages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_with(solutions: &[(Language, &str)]) -> Exercise {
        Exercise {
            index: 0,
            topic_area: "Arithmetic".to_string(),
            topic: "Fractions".to_string(),
            progress_level: ProgressLevel::D,
            text: "Add 1/2 and 1/3".to_string(),
            solutions: solutions
                .iter()
                .map(|&(l, s)| (l, s.to_string()))
                .collect(),
            technical_terms: IndexMap::new(),
        }
    }

    #[test]
    fn test_language_round_trip() {
        for lang in Language::all() {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn test_progress_level_labels() {
        assert_eq!("B".parse::<ProgressLevel>().unwrap().label(), "2nd grade (7yo)");
        assert_eq!("h".parse::<ProgressLevel>().unwrap().label(), "10th grade (15yo)");
        assert!("X".parse::<ProgressLevel>().is_err());
    }

    #[test]
    fn test_complete_requires_all_languages() {
        let full = exercise_with(&[
            (Language::En, "first add..."),
            (Language::De, "zuerst..."),
            (Language::Ar, "..."),
        ]);
        assert!(full.is_complete(&Language::all()));

        let partial = exercise_with(&[(Language::En, "first add..."), (Language::De, "")]);
        assert!(!partial.is_complete(&Language::all()));
        assert!(partial.candidates(&Language::all()).is_none());
    }

    #[test]
    fn test_terms_fallback() {
        let ex = exercise_with(&[(Language::En, "solution")]);
        assert_eq!(ex.terms_for(Language::En), "No specific terms");
    }
}
