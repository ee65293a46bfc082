//! Cross-run summarization

pub mod spread;
pub mod summary;

pub use spread::{disagreement_report, ExerciseSpread};
pub use summary::{
    count_placements, summarize_scores, PlacementCounts, ScoreFlag, SummaryTable,
};
