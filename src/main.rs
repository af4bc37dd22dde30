//! CLI entry point for the mastery grader.
//!
//! Provides subcommands for repairing and curving a mastery report export
//! and for managing the persistent per-student override table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mastery_grader::grading::{GradingContext, assign_scores, curve};
use mastery_grader::output::{print_json, write_report};
use mastery_grader::overrides::{OverrideStore, OverrideTable};
use mastery_grader::repair::{SMART_SCORE_COLUMN, read_report};
use mastery_grader::summary::GradeSummary;
use mastery_grader::table::Table;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mastery_grader")]
#[command(about = "A tool to curve mastery report scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair a report export, curve every score, and write the result
    Grade {
        /// Path to the exported report CSV
        #[arg(value_name = "INPUT")]
        input: String,

        /// CSV file to write the graded report to
        #[arg(short, long, default_value = "graded.csv")]
        output: String,

        /// SmartScore threshold for grading (0-100)
        #[arg(short = 's', long, value_parser = clap::value_parser!(u8).range(0..=100))]
        smart_score: u8,

        /// Optional overrides CSV imported (replacing the stored set) before grading
        #[arg(long)]
        overrides: Option<String>,
    },
    /// Manage the persistent per-student override table
    Overrides {
        #[command(subcommand)]
        command: OverrideCommands,
    },
}

#[derive(Subcommand)]
enum OverrideCommands {
    /// Replace the override table with the contents of a CSV file
    Import {
        /// CSV with Student ID, Smart Score Threshold, and Minimum Grade columns
        file: String,
    },
    /// Set one student's overrides, keeping any unspecified field
    Set {
        student_id: String,

        /// Per-student SmartScore threshold (0-100)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Grade floor applied after curving (0-100)
        #[arg(short, long)]
        minimum: Option<f64>,
    },
    /// Remove one student's overrides
    Remove { student_id: String },
    /// Remove every override
    Clear,
    /// Write the override table to a CSV file
    Export { file: String },
    /// List the current overrides
    List,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mastery_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mastery_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            input,
            output,
            smart_score,
            overrides,
        } => {
            run_grade(&input, &output, f64::from(smart_score), overrides.as_deref())?;
        }
        Commands::Overrides { command } => {
            let mut table = OverrideTable::new(OverrideStore::open_default());

            match command {
                OverrideCommands::Import { file } => {
                    table.import(Path::new(&file))?;
                }
                OverrideCommands::Set {
                    student_id,
                    threshold,
                    minimum,
                } => {
                    table.set(&student_id, threshold, minimum);
                    info!(student_id = %student_id, "Override saved");
                }
                OverrideCommands::Remove { student_id } => {
                    table.remove(&student_id);
                    info!(student_id = %student_id, "Override removed");
                }
                OverrideCommands::Clear => {
                    table.clear_all();
                    info!("All overrides cleared");
                }
                OverrideCommands::Export { file } => {
                    table.export(Path::new(&file))?;
                    info!(file = %file, "Overrides exported");
                }
                OverrideCommands::List => {
                    if !table.has_overrides() {
                        info!("No overrides set");
                    }
                    for record in table.records() {
                        info!(
                            student_id = %record.student_id,
                            threshold = record.threshold,
                            minimum_grade = record.minimum_grade,
                            "Override"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Runs one full grading pass: repair and load the report, optionally
/// import an overrides file, curve every score, and export the result.
#[tracing::instrument(skip(overrides_file))]
fn run_grade(input: &str, output: &str, threshold: f64, overrides_file: Option<&str>) -> Result<()> {
    let mut report = read_report(Path::new(input))?;
    info!(rows = report.row_count(), "Report repaired and loaded");

    let mut overrides = OverrideTable::new(OverrideStore::open_default());
    if let Some(file) = overrides_file {
        overrides.import(Path::new(file))?;
    }
    if overrides.has_overrides() {
        info!(count = overrides.records().len(), "Student overrides active");
    }

    sample_calculations(&report, threshold);

    let ctx = GradingContext {
        threshold,
        overrides: &overrides,
    };
    assign_scores(&mut report, &ctx)?;

    write_report(output, &report)?;

    let summary = GradeSummary::from_report(&report, &overrides);
    print_json(&summary)?;
    info!(output, "Graded report written");

    Ok(())
}

/// Logs example curve calculations for the first few scored rows, so the
/// chosen threshold can be sanity-checked against real data.
fn sample_calculations(report: &Table, threshold: f64) {
    if threshold == 0.0 {
        return;
    }
    let Some(smart_col) = report.column_index(SMART_SCORE_COLUMN) else {
        return;
    };

    let samples = (0..report.row_count())
        .filter_map(|row| report.number(row, smart_col))
        .take(3);
    for smart_score in samples {
        debug!(
            smart_score,
            grade = curve(smart_score, threshold),
            "Sample calculation"
        );
    }
}
