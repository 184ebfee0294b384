//! Somnia CLI - Command-line interface for the Somnia aggregation engine
//!
//! Commands:
//! - aggregate: Turn raw sleep-stage samples into per-night records
//! - score: Derive score/rank display values for aggregated nights

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use somnia_core::adapters::{
    parse_samples_array, parse_samples_ndjson, HealthConnectAdapter, HealthKitAdapter,
    SamplePayloadAdapter,
};
use somnia_core::types::{AggregatedNight, NightDisplay};
use somnia_core::{NightAggregator, NightlyScore, SleepError, ENGINE_VERSION};

/// Somnia - On-device aggregation engine for wearable sleep-stage samples
#[derive(Parser)]
#[command(name = "somnia")]
#[command(author = "Somnia Labs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Aggregate wearable sleep samples into nightly records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate raw sleep-stage samples into per-night records
    Aggregate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Source payload format
        #[arg(long, default_value = "samples")]
        source_format: SourceFormat,

        /// Input framing (only for the native samples format)
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Derive score, rank tier, and display values
    Score {
        /// Aggregated-nights JSON file to score (use - for stdin)
        #[arg(short, long, conflicts_with = "minutes")]
        input: Option<PathBuf>,

        /// Score a single total-minutes value instead of a file
        #[arg(long)]
        minutes: Option<i64>,

        /// Force JSON output even on a TTY
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum SourceFormat {
    /// Native {start, end, stageValue} samples
    Samples,
    /// HealthKit sleep-analysis export (array of {startDate, endDate, value})
    Healthkit,
    /// Health Connect sleep session ({stages: [{startTime, endTime, stage}]})
    HealthConnect,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one sample per line)
    Ndjson,
    /// JSON array of samples
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one night per line)
    Ndjson,
    /// JSON array of nights
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SomniaCliError> {
    match cli.command {
        Commands::Aggregate {
            input,
            output,
            source_format,
            input_format,
            output_format,
        } => cmd_aggregate(&input, &output, source_format, input_format, output_format),

        Commands::Score {
            input,
            minutes,
            json,
        } => cmd_score(input.as_deref(), minutes, json),
    }
}

fn cmd_aggregate(
    input: &PathBuf,
    output: &PathBuf,
    source_format: SourceFormat,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), SomniaCliError> {
    let input_data = read_input(input)?;

    let samples = match source_format {
        SourceFormat::Samples => match input_format {
            InputFormat::Ndjson => parse_samples_ndjson(&input_data)?,
            InputFormat::Json => parse_samples_array(&input_data)?,
        },
        SourceFormat::Healthkit => HealthKitAdapter.parse(&input_data)?,
        SourceFormat::HealthConnect => HealthConnectAdapter.parse(&input_data)?,
    };

    if samples.is_empty() {
        return Err(SomniaCliError::NoSamples);
    }

    let nights = NightAggregator::aggregate(&samples);

    let output_data = format_nights(&nights, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_score(
    input: Option<&std::path::Path>,
    minutes: Option<i64>,
    json: bool,
) -> Result<(), SomniaCliError> {
    if let Some(total_minutes) = minutes {
        let nightly = NightlyScore::for_minutes(total_minutes);
        if json || !atty::is(atty::Stream::Stdout) {
            println!("{}", serde_json::to_string(&nightly)?);
        } else {
            println!(
                "{} minutes -> score {} ({})",
                total_minutes.max(0),
                nightly.score,
                nightly.rank_tier.as_str()
            );
        }
        return Ok(());
    }

    let path = input.ok_or(SomniaCliError::MissingScoreInput)?;
    let input_data = read_input(&path.to_path_buf())?;
    let nights: Vec<AggregatedNight> = serde_json::from_str(&input_data)?;

    let displays: Vec<NightDisplay> = nights.iter().map(NightDisplay::for_night).collect();

    if json || !atty::is(atty::Stream::Stdout) {
        println!("{}", serde_json::to_string_pretty(&displays)?);
    } else {
        println!("Nightly Scores");
        println!("==============");
        for display in &displays {
            println!(
                "{}  score {:>3}  {:<8}  {:>3}% of goal  {} light min",
                display.date,
                display.score,
                display.rank_tier.as_str(),
                (display.progress_ratio * 100.0).round() as u32,
                display.light_minutes
            );
        }
    }

    Ok(())
}

// Helper functions

fn read_input(path: &PathBuf) -> Result<String, SomniaCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_nights(
    nights: &[AggregatedNight],
    format: &OutputFormat,
) -> Result<String, SomniaCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for night in nights {
                lines.push(serde_json::to_string(night)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(nights)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(nights)?),
    }
}

// Error types

#[derive(Debug)]
enum SomniaCliError {
    Io(io::Error),
    Engine(SleepError),
    Json(serde_json::Error),
    NoSamples,
    MissingScoreInput,
}

impl From<io::Error> for SomniaCliError {
    fn from(e: io::Error) -> Self {
        SomniaCliError::Io(e)
    }
}

impl From<SleepError> for SomniaCliError {
    fn from(e: SleepError) -> Self {
        SomniaCliError::Engine(e)
    }
}

impl From<serde_json::Error> for SomniaCliError {
    fn from(e: serde_json::Error) -> Self {
        SomniaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SomniaCliError> for CliError {
    fn from(e: SomniaCliError) -> Self {
        match e {
            SomniaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SomniaCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that input matches the selected source format".to_string()),
            },
            SomniaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SomniaCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SomniaCliError::MissingScoreInput => CliError {
                code: "MISSING_INPUT".to_string(),
                message: "score requires --input or --minutes".to_string(),
                hint: Some("Pass an aggregated-nights file or a minutes value".to_string()),
            },
        }
    }
}
