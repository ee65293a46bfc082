//! Results reporting

pub mod writer;

pub use writer::{
    read_ranking_table, ExerciseRecord, JudgeOpinion, RankingTableWriter, RunSummary,
};

use indexmap::IndexMap;

use crate::analysis::{ExerciseSpread, PlacementCounts, SummaryTable};
use crate::exercises::Language;

/// Counters accumulated by the rank loop; folded into the final summary
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub exercises_total: usize,
    pub exercises_ranked: usize,
    pub exercises_skipped_incomplete: usize,
    pub judge_calls: usize,
    pub call_failures: IndexMap<String, usize>,
    pub parse_failures: IndexMap<String, usize>,
    pub low_confidence_decisions: usize,
}

impl RunStats {
    pub fn record_call_failure(&mut self, judge: &str) {
        *self.call_failures.entry(judge.to_string()).or_insert(0) += 1;
    }

    pub fn record_parse_failure(&mut self, judge: &str) {
        *self.parse_failures.entry(judge.to_string()).or_insert(0) += 1;
    }

    pub fn into_summary(
        self,
        run_id: impl Into<String>,
        detailed_file: impl Into<String>,
    ) -> RunSummary {
        RunSummary {
            run_id: run_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            exercises_total: self.exercises_total,
            exercises_ranked: self.exercises_ranked,
            exercises_skipped_incomplete: self.exercises_skipped_incomplete,
            judge_calls: self.judge_calls,
            call_failures: self.call_failures,
            parse_failures: self.parse_failures,
            low_confidence_decisions: self.low_confidence_decisions,
            detailed_results_file: detailed_file.into(),
        }
    }
}

/// End-of-run console report: what was computed and what was skipped
pub fn print_run_report(summary: &RunSummary, placements: &PlacementCounts, languages: &[Language]) {
    println!("\n=== Ranking Run Results ===\n");
    println!("Run ID: {}", summary.run_id);
    println!(
        "Exercises: {} ranked, {} skipped incomplete, {} total",
        summary.exercises_ranked, summary.exercises_skipped_incomplete, summary.exercises_total
    );
    println!("Judge calls: {}", summary.judge_calls);

    if summary.call_failures.is_empty() && summary.parse_failures.is_empty() {
        println!("No judge failures.");
    } else {
        for (judge, count) in &summary.call_failures {
            println!("  {} call failures: {}", judge, count);
        }
        for (judge, count) in &summary.parse_failures {
            println!("  {} unusable verdicts: {}", judge, count);
        }
    }

    if summary.low_confidence_decisions > 0 {
        println!(
            "Low-confidence decisions (fewer than 2 usable judges): {}",
            summary.low_confidence_decisions
        );
    }

    print_placement_table(placements, languages);
}

/// Per-language placement counts, TIE row last
pub fn print_placement_table(placements: &PlacementCounts, languages: &[Language]) {
    println!("\nMajority Vote Placements:");
    println!("{:-<50}", "");
    println!("{:<10} {:>8} {:>8} {:>8}", "Language", "Best", "Mid", "Worst");
    println!("{:-<50}", "");

    let mut rows: Vec<String> = languages.iter().map(|l| l.as_str().to_string()).collect();
    rows.push("TIE".to_string());

    for row in rows {
        println!(
            "{:<10} {:>8} {:>8} {:>8}",
            row,
            placements.get("Best", &row),
            placements.get("Mid", &row),
            placements.get("Worst", &row)
        );
    }
    println!("{:-<50}", "");
}

/// Per-criterion mean scores per language, plus the per-criterion leader
pub fn print_score_summary(table: &SummaryTable, languages: &[Language]) {
    println!("\n=== Cross-Language Score Summary ===\n");
    print!("{:<48}", "Criterion");
    for lang in languages {
        print!(" {:>8}", lang.as_str());
    }
    println!(" {:>8}", "leader");
    println!("{:-<80}", "");

    let highest = table.highest_by_criterion();

    for (criterion, by_lang) in &table.means {
        print!("{:<48}", criterion);
        for lang in languages {
            match by_lang.get(lang) {
                Some(mean) => print!(" {:>8.3}", mean),
                None => print!(" {:>8}", "-"),
            }
        }
        match highest.get(criterion) {
            Some(lang) => println!(" {:>8}", lang.as_str()),
            None => println!(" {:>8}", "-"),
        }
    }
    println!("{:-<80}", "");

    if !table.flags.is_empty() {
        println!("\nFlagged out-of-range scores (excluded from means):");
        for flag in &table.flags {
            println!(
                "  {} row {} '{}': {}",
                flag.language, flag.row, flag.criterion, flag.value
            );
        }
    }
}

/// Exercises sorted by cross-language score spread
pub fn print_disagreements(report: &[ExerciseSpread], languages: &[Language], limit: usize) {
    println!("\n=== Most Differently Performing Exercises ===\n");
    print!("{:<16}", "Exercise");
    for lang in languages {
        print!(" {:>8}", lang.as_str());
    }
    println!(" {:>8}", "spread");
    println!("{:-<60}", "");

    for entry in report.iter().take(limit) {
        print!("{:<16}", entry.exercise);
        for lang in languages {
            match entry.mean_by_language.get(lang) {
                Some(mean) => print!(" {:>8.3}", mean),
                None => print!(" {:>8}", "-"),
            }
        }
        println!(" {:>8.3}", entry.spread);
    }
    println!("{:-<60}", "");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_fold_into_summary() {
        let mut stats = RunStats {
            exercises_total: 10,
            exercises_ranked: 8,
            exercises_skipped_incomplete: 2,
            judge_calls: 24,
            ..Default::default()
        };
        stats.record_call_failure("gemini-1.5-flash");
        stats.record_call_failure("gemini-1.5-flash");
        stats.record_parse_failure("qwen-plus");

        let summary = stats.into_summary("20250101-000000", "consensus.jsonl");
        assert_eq!(summary.call_failures["gemini-1.5-flash"], 2);
        assert_eq!(summary.parse_failures["qwen-plus"], 1);
        assert_eq!(summary.exercises_ranked, 8);
        assert_eq!(summary.detailed_results_file, "consensus.jsonl");
    }
}
