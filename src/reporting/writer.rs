//! Durable result records
//!
//! The consensus table is a JSONL file, one record per completed exercise,
//! appended and synced as the run progresses so a crash loses at most the
//! in-flight exercise.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exercises::ProgressLevel;
use crate::ranking::{ConsensusDecision, Presentation, StructuredRanking};
use crate::runner::CallStatus;

/// One judge's contribution to an exercise record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeOpinion {
    pub judge: String,
    /// Languages in the order shown to this judge
    pub presentation: Presentation,
    pub status: CallStatus,
    pub ranking: Option<StructuredRanking>,
    pub justification: Option<String>,
    /// Verbatim judge response, kept for audit even when parsing succeeds
    pub raw_text: Option<String>,
    /// Call or parse failure description
    pub error: Option<String>,
    pub attempts: u32,
}

/// One durable row of the consensus table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub exercise_index: usize,
    pub progress_level: ProgressLevel,
    pub opinions: Vec<JudgeOpinion>,
    pub consensus: ConsensusDecision,
    pub timestamp: DateTime<Utc>,
}

/// Append-only writer for the per-exercise consensus table
pub struct RankingTableWriter {
    path: PathBuf,
}

impl RankingTableWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and sync it to disk
    pub fn append(&self, record: &ExerciseRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.sync_all()
    }
}

/// Read a consensus table back; used to recompute decisions from stored
/// raw verdicts without re-calling judges.
pub fn read_ranking_table(path: impl AsRef<Path>) -> std::io::Result<Vec<ExerciseRecord>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut records = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ExerciseRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed record on line {}: {}", line_no + 1, e);
            }
        }
    }

    Ok(records)
}

/// End-of-run summary artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub timestamp: String,
    pub exercises_total: usize,
    pub exercises_ranked: usize,
    pub exercises_skipped_incomplete: usize,
    pub judge_calls: usize,
    /// Failed calls per judge, after retries
    pub call_failures: IndexMap<String, usize>,
    /// Unusable verdicts per judge
    pub parse_failures: IndexMap<String, usize>,
    pub low_confidence_decisions: usize,
    pub detailed_results_file: String,
}

impl RunSummary {
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::Language::*;
    use crate::ranking::{decide_consensus, Placement};

    fn sample_record(index: usize) -> ExerciseRecord {
        let ranking = StructuredRanking::from_pairs(&[(En, 1), (De, 2), (Ar, 3)]).unwrap();
        let consensus = decide_consensus(&[ranking.clone(), ranking.clone(), ranking.clone()]);

        ExerciseRecord {
            exercise_index: index,
            progress_level: ProgressLevel::D,
            opinions: vec![JudgeOpinion {
                judge: "gpt-4o-mini".to_string(),
                presentation: Presentation::new(vec![De, En, Ar]),
                status: CallStatus::Success,
                ranking: Some(ranking),
                justification: Some("clear steps".to_string()),
                raw_text: Some("**Ranking:** [de: 2, en: 1, ar: 3]".to_string()),
                error: None,
                attempts: 1,
            }],
            consensus,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consensus.jsonl");
        let writer = RankingTableWriter::new(&path);

        writer.append(&sample_record(0)).unwrap();
        writer.append(&sample_record(1)).unwrap();

        let records = read_ranking_table(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].exercise_index, 0);
        assert_eq!(records[1].exercise_index, 1);
        assert_eq!(records[0].consensus.best, Placement::Language(En));
        assert_eq!(
            records[0].opinions[0].ranking.as_ref().unwrap().rank_of(En),
            Some(1)
        );
    }

    #[test]
    fn test_append_preserves_earlier_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consensus.jsonl");

        RankingTableWriter::new(&path).append(&sample_record(0)).unwrap();
        // A second writer (a resumed run) appends rather than truncates
        RankingTableWriter::new(&path).append(&sample_record(1)).unwrap();

        let records = read_ranking_table(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consensus.jsonl");
        let writer = RankingTableWriter::new(&path);
        writer.append(&sample_record(0)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        drop(file);

        let records = read_ranking_table(&path).unwrap();
        assert_eq!(records.len(), 1);
    }
}
