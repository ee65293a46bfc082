//! Cross-Language Tutoring-Explanation Ranking Benchmark
//!
//! This crate compares LLM-generated math-tutoring explanations across
//! natural languages. A panel of judge models ranks the three candidate
//! solutions for each exercise; verdicts are parsed into validated
//! rankings, reconciled by strict-majority vote into Best/Mid/Worst
//! decisions, and aggregated into cross-run summary tables.
//!
//! # Features
//!
//! - Presentation-order randomization per (exercise, judge) to cancel
//!   positional bias, with a reversible slot mapping
//! - Tolerant two-block verdict parsing with explicit failure variants
//! - Strict-majority consensus with independent positions and TIE handling
//! - Rubric-score summaries with range validation and a per-exercise
//!   disagreement report
//! - Append-only JSONL result records, recomputable without re-calling
//!   judges
//!
//! # Example
//!
//! ```no_run
//! use tutorbench::{
//!     config::Config,
//!     judges::build_judges,
//!     runner::{JudgePanel, PanelConfig},
//!     ranking::decide_consensus,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_or_default();
//!     let judges = build_judges(&config);
//!     let panel = JudgePanel::new(judges, PanelConfig::from_evaluation(&config.evaluation));
//!     // ... load exercises, run the panel, reconcile verdicts
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod exercises;
pub mod judges;
pub mod ranking;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        count_placements, disagreement_report, summarize_scores, PlacementCounts, SummaryTable,
    };
    pub use crate::config::Config;
    pub use crate::exercises::{Candidate, Exercise, ExerciseSet, Language, ProgressLevel};
    pub use crate::judges::{
        build_judges, CompletionRequest, CompletionResponse, JudgeBackend, JudgeError,
        JudgeResult, Message,
    };
    pub use crate::ranking::{
        build_ranking_prompt, decide_consensus, parse_verdict, ConsensusDecision, Placement,
        Presentation, RawVerdict, StructuredRanking,
    };
    pub use crate::reporting::{ExerciseRecord, RankingTableWriter, RunSummary};
    pub use crate::runner::{JudgePanel, PanelConfig};
}
