use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use survey_scorer::config::OutputFormat;
use survey_scorer::record::ScoredResponse;
use survey_scorer::scoring::ScoringEngine;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one or more response files and print the results
    Score {
        /// Schema file, or an instrument name looked up in the configured schema_dir
        #[arg(short, long)]
        schema: String,

        /// Answer files (YAML or JSON); glob patterns are expanded
        #[arg(short, long, required = true, num_args = 1..)]
        answers: Vec<String>,

        /// Also write the scored records to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format, else table)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Show evaluation order, dependencies and a description of every rule
    Explain {
        #[arg(short, long)]
        schema: String,
    },
    /// Score response files, or read a saved score archive, and print per-score statistics
    Stats {
        #[arg(short, long, required_unless_present = "archive")]
        schema: Option<String>,

        #[arg(short, long, num_args = 1.., required_unless_present = "archive")]
        answers: Vec<String>,

        /// Read scores from a file written by `score --output` instead of scoring answers
        #[arg(long, conflicts_with_all = ["schema", "answers"])]
        archive: Option<PathBuf>,

        /// Output format; json prints machine-readable statistics, anything else text
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "survey-scorer")]
#[command(about = "Score questionnaire responses against rule schemas", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/survey-scorer/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match survey_scorer::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = survey_scorer::telemetry::init(cli.verbose, config.log_level.as_deref()) {
        eprintln!("Config error: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = survey_scorer::output::should_use_colors();

    match cli.command {
        Commands::Score {
            schema,
            answers,
            output,
            format,
        } => {
            let engine = load_engine_or_exit(&schema, &config, cli.verbose);
            let records = score_or_exit(&engine, &answers).await;

            let rendered = match format.unwrap_or(config.format) {
                OutputFormat::Table => {
                    Ok(survey_scorer::output::format_score_table(&records, use_colors))
                }
                OutputFormat::Tsv => Ok(survey_scorer::output::format_tsv(&records)),
                OutputFormat::Json => survey_scorer::output::format_json(&records),
            };
            match rendered {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Failed to format scores: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            }

            if let Some(path) = output {
                let title = engine.schema().title.clone();
                if let Err(e) = survey_scorer::record::save_scored_responses(&path, title, records) {
                    eprintln!("Failed to save scores: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
                if cli.verbose {
                    eprintln!("Saved scores to {}", path.display());
                }
            }
        }
        Commands::Explain { schema } => {
            let engine = load_engine_or_exit(&schema, &config, cli.verbose);
            println!(
                "{}",
                survey_scorer::output::format_explain(&engine, use_colors)
            );
        }
        Commands::Stats {
            schema,
            answers,
            archive,
            format,
        } => {
            let records = match (archive, schema) {
                (Some(path), _) => match survey_scorer::record::load_scored_responses(&path) {
                    Ok(archive) => {
                        if cli.verbose {
                            eprintln!(
                                "Loaded {} scored responses from {}",
                                archive.records.len(),
                                path.display()
                            );
                        }
                        archive.records
                    }
                    Err(e) => {
                        eprintln!("Archive error: {:#}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                },
                (None, Some(schema)) => {
                    let engine = load_engine_or_exit(&schema, &config, cli.verbose);
                    score_or_exit(&engine, &answers).await
                }
                (None, None) => {
                    eprintln!("Either --schema with --answers, or --archive, is required.");
                    std::process::exit(EXIT_INPUT);
                }
            };
            let stats = survey_scorer::analytics::summarize(records.iter().map(|r| &r.scores));

            if format.unwrap_or(config.format) == OutputFormat::Json {
                match serde_json::to_string_pretty(&stats) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Failed to format statistics: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                }
            } else {
                println!("{}", survey_scorer::output::format_stats(&stats, use_colors));
            }
        }
    }

    if cli.verbose {
        let elapsed = Duration::from_millis(start_time.elapsed().as_millis() as u64);
        eprintln!();
        eprintln!("Done in {}", humantime::format_duration(elapsed));
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Resolve and load the schema, then build the engine shared by every response.
fn load_engine_or_exit(
    reference: &str,
    config: &survey_scorer::config::Config,
    verbose: bool,
) -> Arc<ScoringEngine> {
    let schema_path = match survey_scorer::survey::resolve_schema_path(
        reference,
        config.schema_dir.as_deref(),
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Schema error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };
    let schema = match survey_scorer::survey::load_schema(&schema_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Schema error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };
    let engine = Arc::new(ScoringEngine::new(schema));

    if verbose {
        eprintln!(
            "Loaded schema {} ({} questions, {} rules)",
            schema_path.display(),
            engine.schema().questions.len(),
            engine.schema().scoring_rules.len()
        );
    }

    engine
}

/// Expand answer arguments and score every file. Files that fail are reported
/// and skipped; exits with EXIT_INPUT only when nothing could be scored.
async fn score_or_exit(engine: &Arc<ScoringEngine>, answers: &[String]) -> Vec<ScoredResponse> {
    let paths = match survey_scorer::batch::expand_answer_paths(answers) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Answers error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    if paths.is_empty() {
        eprintln!("No answer files matched.");
        std::process::exit(EXIT_INPUT);
    }

    let outcome = survey_scorer::batch::score_files(Arc::clone(engine), paths).await;

    for (path, e) in &outcome.failed {
        eprintln!("Failed to score {}: {:#}", path.display(), e);
    }

    if outcome.scored.is_empty() {
        eprintln!("No responses could be scored.");
        std::process::exit(EXIT_INPUT);
    }

    outcome.scored
}
