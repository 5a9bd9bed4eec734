//! CLI entry point for the exam/report regression analysis.
//!
//! Provides subcommands for analyzing a pair of CSV files, running the
//! analysis on generated demo data, and printing the active subject
//! configuration.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use exam_report_rater::analyzers::types::TableSource;
use exam_report_rater::{
    SubjectSet, analyze,
    demo::{self, DEFAULT_SEED, DEFAULT_STUDENTS},
    loader::{DEFAULT_DELIMITER, load_table},
    output::{log_report, write_all},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "exam_report_rater")]
#[command(about = "Regression analysis of exam scores against report-card grades", long_about = None)]
struct Cli {
    /// JSON file with the ordered subject list (defaults to the built-in five subjects)
    #[arg(short, long, global = true, value_name = "JSON")]
    subjects: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an exam CSV against a report-card CSV
    Analyze {
        /// Exam scores CSV
        #[arg(short, long)]
        exam: String,

        /// Report-card scores CSV
        #[arg(short, long)]
        report: String,

        /// Directory to write result files to
        #[arg(short, long, default_value = "output")]
        output: String,

        /// Field delimiter of both CSV files
        #[arg(short, long, default_value_t = DEFAULT_DELIMITER as char)]
        delimiter: char,
    },
    /// Generate demo data and analyze it
    Demo {
        /// Directory to write the generated CSV files to
        #[arg(short = 'd', long, default_value = "demo_data")]
        data_dir: String,

        /// Directory to write result files to
        #[arg(short, long, default_value = "output")]
        output: String,

        /// Number of students to generate
        #[arg(short = 'n', long, default_value_t = DEFAULT_STUDENTS)]
        students: usize,

        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Print the active subject configuration
    Subjects,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/exam_report_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("exam_report_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let subjects = match &cli.subjects {
        Some(path) => SubjectSet::load(path)?,
        None => SubjectSet::default(),
    };

    let result = match cli.command {
        Commands::Analyze {
            exam,
            report,
            output,
            delimiter,
        } => run_analysis(&subjects, &exam, &report, &output, delimiter),
        Commands::Demo {
            data_dir,
            output,
            students,
            seed,
        } => run_demo(&subjects, &data_dir, &output, students, seed),
        Commands::Subjects => {
            info!(id_column = subjects.id_column(), "Subject configuration");
            for (i, s) in subjects.iter().enumerate() {
                info!(
                    index = i,
                    name = %s.name,
                    exam_column = %s.exam_column,
                    report_column = %s.report_column,
                    "Subject"
                );
            }
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}

/// Loads both CSV files, runs the pipeline and writes the result files.
#[tracing::instrument(skip(subjects))]
fn run_analysis(
    subjects: &SubjectSet,
    exam: &str,
    report: &str,
    output: &str,
    delimiter: char,
) -> Result<()> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{delimiter}'");
    }
    let delimiter = delimiter as u8;

    let exam_table = load_table(exam, TableSource::Exam, subjects, delimiter)
        .with_context(|| format!("failed to load exam data from '{exam}'"))?;
    let report_table = load_table(report, TableSource::Report, subjects, delimiter)
        .with_context(|| format!("failed to load report data from '{report}'"))?;

    let analysis = analyze(&exam_table, &report_table)?;
    info!(
        students = analysis.aligned.len(),
        subjects = subjects.len(),
        "Students aligned across both tables"
    );

    log_report(&analysis);
    write_all(Path::new(output), &analysis)?;
    Ok(())
}

/// Generates demo CSV files and analyzes them like user-supplied data.
#[tracing::instrument(skip(subjects))]
fn run_demo(
    subjects: &SubjectSet,
    data_dir: &str,
    output: &str,
    students: usize,
    seed: u64,
) -> Result<()> {
    let data = demo::generate(subjects, students, seed)?;
    let (exam, report) = demo::write_demo_files(&data, subjects, data_dir)?;

    run_analysis(
        subjects,
        &exam.to_string_lossy(),
        &report.to_string_lossy(),
        output,
        DEFAULT_DELIMITER as char,
    )
}
