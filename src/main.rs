//! TutorBench CLI

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use tracing_subscriber::EnvFilter;

use tutorbench::{
    analysis::{count_placements, disagreement_report, summarize_scores, SummaryTable},
    config::Config,
    exercises::{load_exercise_set, load_score_table_from_file, Language, ScoreTable},
    judges::build_judges,
    ranking::{decide_consensus, parse_verdict, RawVerdict},
    reporting::{
        print_disagreements, print_placement_table, print_run_report, print_score_summary,
        read_ranking_table, ExerciseRecord, JudgeOpinion, RankingTableWriter, RunStats,
    },
    runner::{JudgePanel, PanelConfig},
};

#[derive(Parser)]
#[command(name = "tutorbench")]
#[command(about = "Cross-language ranking benchmark for LLM math-tutoring explanations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate solutions with the judge panel
    Rank {
        /// Per-language solution table files (each declares its language)
        #[arg(short, long, num_args = 1.., required = true)]
        solutions: Vec<PathBuf>,

        /// Per-language technical-term table files
        #[arg(short, long, num_args = 0..)]
        terms: Vec<PathBuf>,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Resume cursor: first exercise index to process
        #[arg(long, default_value = "0")]
        start_index: usize,

        /// Cap on exercises ranked this run (default from config)
        #[arg(long)]
        max_exercises: Option<usize>,
    },

    /// Recompute consensus decisions from a stored consensus table
    Consensus {
        /// Path to a consensus.jsonl produced by `rank`
        #[arg(short, long)]
        input: PathBuf,

        /// Write the recomputed table here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross-language rubric score summary
    Summarize {
        /// Per-language score table files
        #[arg(short, long, num_args = 1.., required = true)]
        scores: Vec<PathBuf>,

        /// Write the summary table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Exercises ranked by cross-language score spread
    Disagreements {
        /// Per-language score table files
        #[arg(short, long, num_args = 1.., required = true)]
        scores: Vec<PathBuf>,

        /// How many exercises to print
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the loaded exercise set
    ListExercises {
        #[arg(short, long, num_args = 1.., required = true)]
        solutions: Vec<PathBuf>,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/tutorbench.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("tutorbench=debug,info")
    } else {
        EnvFilter::new("tutorbench=info,warn")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Rank {
            solutions,
            terms,
            output,
            start_index,
            max_exercises,
        } => {
            run_rank(&config, solutions, terms, output, start_index, max_exercises).await?;
        }

        Commands::Consensus { input, output } => {
            recompute_consensus(&config, input, output)?;
        }

        Commands::Summarize { scores, output } => {
            run_summarize(&config, scores, output)?;
        }

        Commands::Disagreements {
            scores,
            limit,
            output,
        } => {
            run_disagreements(&config, scores, limit, output)?;
        }

        Commands::ListExercises { solutions } => {
            list_exercises(solutions)?;
        }

        Commands::InitConfig { output } => {
            init_config(&config, output)?;
        }
    }

    Ok(())
}

async fn run_rank(
    config: &Config,
    solutions: Vec<PathBuf>,
    terms: Vec<PathBuf>,
    output: Option<PathBuf>,
    start_index: usize,
    max_exercises: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();
    let run_id = started_at.format("%Y%m%d-%H%M%S").to_string();

    println!("=== TutorBench Ranking Run ===");
    println!("Run ID: {}", run_id);
    println!();

    let judges = build_judges(config);
    if judges.is_empty() {
        eprintln!("Error: No judges available. Set API keys in environment.");
        for jc in config.enabled_judges() {
            eprintln!("  {} for {}", jc.api_key_env, jc.name);
        }
        std::process::exit(1);
    }

    let set = load_exercise_set(&solutions, &terms)?;
    let panel = JudgePanel::new(judges, PanelConfig::from_evaluation(&config.evaluation));

    println!("Judges: {}", panel.judge_names().join(", "));
    println!("Languages: {}", join_languages(&set.languages));
    println!("Exercises: {}", set.len());
    println!();

    let output_base = output.unwrap_or_else(|| PathBuf::from(&config.evaluation.output_dir));
    let run_dir = output_base.join(&run_id);
    std::fs::create_dir_all(&run_dir)?;

    let table_path = run_dir.join("consensus.jsonl");
    let writer = RankingTableWriter::new(&table_path);

    let limit = max_exercises.unwrap_or(config.evaluation.max_exercises);

    let mut stats = RunStats {
        exercises_total: set.len(),
        ..Default::default()
    };
    let mut decisions = Vec::new();
    let mut ranked = 0usize;

    for exercise in set.exercises.iter().skip(start_index) {
        if ranked >= limit {
            break;
        }

        if !exercise.is_complete(&set.languages) {
            stats.exercises_skipped_incomplete += 1;
            tracing::warn!(
                "Skipping exercise {}: not all candidate solutions present",
                exercise.index
            );
            continue;
        }

        if ranked > 0 {
            panel.inter_exercise_delay().await;
        }

        println!("Evaluating exercise {}...", exercise.index);
        let calls = panel.run_exercise(exercise, &set.languages).await;
        stats.judge_calls += calls.len();

        let mut opinions = Vec::with_capacity(calls.len());
        let mut rankings = Vec::new();

        for call in calls {
            let mut opinion = JudgeOpinion {
                judge: call.judge.clone(),
                presentation: call.presentation.clone(),
                status: call.status,
                ranking: None,
                justification: None,
                raw_text: call.verdict.as_ref().map(|v| v.text.clone()),
                error: call.error_message.clone(),
                attempts: call.attempts,
            };

            match &call.verdict {
                Some(verdict) => match parse_verdict(verdict, &call.presentation) {
                    Ok(parsed) => {
                        rankings.push(parsed.ranking.clone());
                        opinion.ranking = Some(parsed.ranking);
                        opinion.justification = Some(parsed.justification);
                    }
                    Err(e) => {
                        stats.record_parse_failure(&call.judge);
                        tracing::warn!(
                            "Unusable verdict from {} for exercise {}: {} (raw: {:?})",
                            call.judge,
                            exercise.index,
                            e,
                            verdict.text
                        );
                        opinion.error = Some(e.to_string());
                    }
                },
                None => {
                    stats.record_call_failure(&call.judge);
                }
            }

            opinions.push(opinion);
        }

        let consensus = decide_consensus(&rankings);
        if consensus.low_confidence {
            stats.low_confidence_decisions += 1;
        }
        println!(
            "  Best={} Mid={} Worst={} ({} usable judges)",
            consensus.best, consensus.mid, consensus.worst, consensus.usable_judges
        );

        let record = ExerciseRecord {
            exercise_index: exercise.index,
            progress_level: exercise.progress_level,
            opinions,
            consensus: consensus.clone(),
            timestamp: Utc::now(),
        };
        writer.append(&record)?;

        decisions.push(consensus);
        ranked += 1;
        stats.exercises_ranked += 1;
    }

    let placements = count_placements(&decisions);
    let summary = stats.into_summary(&run_id, "consensus.jsonl");

    let summary_path = run_dir.join("summary.json");
    summary.write_to_file(&summary_path)?;

    print_run_report(&summary, &placements, &set.languages);
    println!("\nConsensus table written to: {}", table_path.display());
    println!("Run summary written to: {}", summary_path.display());

    Ok(())
}

/// Re-parse stored raw verdicts and recompute every consensus decision.
/// The ranking core is stateless, so this needs no judge calls.
fn recompute_consensus(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_ranking_table(&input)?;
    if records.is_empty() {
        eprintln!("Error: No records in {}", input.display());
        std::process::exit(1);
    }

    println!("Recomputing consensus for {} records...", records.len());

    let mut recomputed = Vec::with_capacity(records.len());
    let mut changed = 0usize;

    for mut record in records {
        let mut rankings = Vec::new();

        for opinion in &mut record.opinions {
            let Some(text) = opinion.raw_text.clone() else {
                continue;
            };
            let verdict = RawVerdict {
                judge: opinion.judge.clone(),
                exercise_index: record.exercise_index,
                text,
            };
            match parse_verdict(&verdict, &opinion.presentation) {
                Ok(parsed) => {
                    rankings.push(parsed.ranking.clone());
                    opinion.ranking = Some(parsed.ranking);
                    opinion.justification = Some(parsed.justification);
                }
                Err(e) => {
                    tracing::warn!(
                        "Unusable stored verdict from {} for exercise {}: {}",
                        opinion.judge,
                        record.exercise_index,
                        e
                    );
                    opinion.ranking = None;
                }
            }
        }

        let consensus = decide_consensus(&rankings);
        if consensus != record.consensus {
            changed += 1;
        }
        record.consensus = consensus;
        recomputed.push(record);
    }

    println!("Decisions changed: {}", changed);

    let decisions: Vec<_> = recomputed.iter().map(|r| r.consensus.clone()).collect();
    let placements = count_placements(&decisions);
    print_placement_table(&placements, &config.evaluation.languages);

    if let Some(path) = output {
        let writer = RankingTableWriter::new(&path);
        for record in &recomputed {
            writer.append(record)?;
        }
        println!("Recomputed table written to: {}", path.display());
    }

    Ok(())
}

fn run_summarize(
    config: &Config,
    scores: Vec<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = load_score_tables(&scores)?;
    let languages: Vec<Language> = tables.iter().map(|t| t.language).collect();

    let summary = summarize_scores(
        &tables,
        &config.evaluation.criteria,
        config.evaluation.min_score,
        config.evaluation.max_score,
    );

    print_score_summary(&summary, &languages);

    if let Some(path) = output {
        write_score_summary(&summary, &path)?;
        println!("\nSummary written to: {}", path.display());
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct ScoreSummaryArtifact<'a> {
    summary: &'a SummaryTable,
    highest_by_criterion: IndexMap<String, Language>,
}

fn write_score_summary(summary: &SummaryTable, path: &PathBuf) -> std::io::Result<()> {
    let artifact = ScoreSummaryArtifact {
        summary,
        highest_by_criterion: summary.highest_by_criterion(),
    };
    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}

fn run_disagreements(
    config: &Config,
    scores: Vec<PathBuf>,
    limit: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = load_score_tables(&scores)?;
    let languages: Vec<Language> = tables.iter().map(|t| t.language).collect();

    let (report, flags) = disagreement_report(
        &tables,
        &config.evaluation.criteria,
        config.evaluation.min_score,
        config.evaluation.max_score,
    );

    print_disagreements(&report, &languages, limit);

    if !flags.is_empty() {
        println!("\nFlagged out-of-range scores (excluded from means):");
        for flag in &flags {
            println!(
                "  {} row {} '{}': {}",
                flag.language, flag.row, flag.criterion, flag.value
            );
        }
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)?;
        println!("\nReport written to: {}", path.display());
    }

    Ok(())
}

fn load_score_tables(paths: &[PathBuf]) -> Result<Vec<ScoreTable>, Box<dyn std::error::Error>> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(load_score_table_from_file(path)?);
    }
    if tables.is_empty() {
        eprintln!("Error: No score tables to analyze");
        std::process::exit(1);
    }
    Ok(tables)
}

fn list_exercises(solutions: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let set = load_exercise_set(&solutions, &[])?;

    println!("Loaded Exercises ({}):", set.len());
    println!("{:-<70}", "");

    for exercise in &set.exercises {
        let complete = if exercise.is_complete(&set.languages) {
            "complete"
        } else {
            "incomplete"
        };
        println!(
            "  {:>4} | {} | {} | {} | {}",
            exercise.index,
            exercise.topic_area,
            exercise.topic,
            exercise.progress_level.label(),
            complete
        );
    }

    Ok(())
}

fn init_config(config: &Config, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}

fn join_languages(languages: &[Language]) -> String {
    languages
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
