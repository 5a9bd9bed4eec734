//! Output formatting and persistence for analysis results.
//!
//! Supports a logged console report, CSV export of the comparison and detail
//! tables, and a JSON summary.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::pipeline::Analysis;
use crate::analyzers::types::{OverallSummary, SubjectComparison};

pub const COMPARISON_FILE: &str = "regression_comparison.csv";
pub const DETAILS_FILE: &str = "detailed_results.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// One row of the comparison CSV.
#[derive(Debug, Serialize)]
struct ComparisonRecord<'a> {
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Simple_R2")]
    simple_r2: f64,
    #[serde(rename = "Simple_RMSE")]
    simple_rmse: f64,
    #[serde(rename = "Multi_R2")]
    multi_r2: f64,
    #[serde(rename = "Multi_RMSE")]
    multi_rmse: f64,
    #[serde(rename = "R2_Gain")]
    r2_gain: f64,
}

impl<'a> From<&'a SubjectComparison> for ComparisonRecord<'a> {
    fn from(s: &'a SubjectComparison) -> Self {
        Self {
            subject: &s.subject,
            simple_r2: s.simple_r2,
            simple_rmse: s.simple_rmse,
            multi_r2: s.multi_r2,
            multi_rmse: s.multi_rmse,
            r2_gain: s.r2_improvement,
        }
    }
}

/// Fitted model parameters of one subject, as written to the JSON summary.
#[derive(Debug, Serialize)]
struct SubjectModels<'a> {
    subject: &'a str,
    simple_slope: Option<f64>,
    simple_intercept: f64,
    multi_coefficients: &'a [f64],
    multi_intercept: f64,
}

/// Top-level JSON document written as `summary.json`.
#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    generated_at: DateTime<Utc>,
    subjects: &'a [String],
    summary: &'a OverallSummary,
    comparisons: &'a [SubjectComparison],
    models: Vec<SubjectModels<'a>>,
}

/// Logs the simple, multi-predictor and summary tables.
pub fn log_report(analysis: &Analysis) {
    info!("Simple regression results");
    for r in &analysis.results {
        info!(
            "  {:<12} R²={:.4} RMSE={:.3} slope={:.3} intercept={:.3}",
            r.subject,
            r.simple.r2,
            r.simple.rmse,
            r.simple.slope().unwrap_or(f64::NAN),
            r.simple.intercept
        );
    }

    info!("Multi-predictor regression results");
    for r in &analysis.results {
        info!(
            "  {:<12} R²={:.4} RMSE={:.3} R² gain={:+.4} ({:+.1}%)",
            r.subject,
            r.multi.r2,
            r.multi.rmse,
            r.r2_improvement,
            r.r2_improvement * 100.0
        );
    }

    let s = &analysis.report.summary;
    info!(
        students = s.student_count,
        subjects = s.subject_count,
        mean_simple_r2 = s.mean_simple_r2,
        mean_multi_r2 = s.mean_multi_r2,
        mean_improvement = s.mean_improvement,
        best_subject = %s.best_subject,
        best_multi_r2 = s.best_multi_r2,
        "Summary"
    );
}

/// Writes the per-subject comparison table as CSV.
pub fn write_comparison_csv(path: &Path, analysis: &Analysis) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(create(path)?);
    for s in &analysis.report.subjects {
        writer.serialize(ComparisonRecord::from(s))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Comparison CSV written");
    Ok(())
}

/// Writes the per-student, per-subject prediction table as CSV.
pub fn write_details_csv(path: &Path, analysis: &Analysis) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(create(path)?);
    for row in &analysis.report.details {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = analysis.report.details.len(), "Details CSV written");
    Ok(())
}

/// Writes the overall summary and fitted parameters as pretty-printed JSON.
pub fn write_summary_json(path: &Path, analysis: &Analysis) -> Result<()> {
    let models = analysis
        .results
        .iter()
        .map(|r| SubjectModels {
            subject: &r.subject,
            simple_slope: r.simple.slope(),
            simple_intercept: r.simple.intercept,
            multi_coefficients: &r.multi.coefficients,
            multi_intercept: r.multi.intercept,
        })
        .collect();

    let doc = SummaryDocument {
        generated_at: Utc::now(),
        subjects: analysis.aligned.subjects(),
        summary: &analysis.report.summary,
        comparisons: &analysis.report.subjects,
        models,
    };

    serde_json::to_writer_pretty(create(path)?, &doc)?;
    debug!(path = %path.display(), "Summary JSON written");
    Ok(())
}

/// Writes all three result files into `dir`, creating it if needed.
pub fn write_all(dir: &Path, analysis: &Analysis) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let comparison = dir.join(COMPARISON_FILE);
    let details = dir.join(DETAILS_FILE);
    let summary = dir.join(SUMMARY_FILE);

    write_comparison_csv(&comparison, analysis)?;
    write_details_csv(&details, analysis)?;
    write_summary_json(&summary, analysis)?;

    info!(dir = %dir.display(), "Results written");
    Ok(vec![comparison, details, summary])
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::pipeline::analyze;
    use crate::demo::generate;
    use crate::subjects::SubjectSet;
    use std::env;

    fn analysis() -> Analysis {
        let data = generate(&SubjectSet::default(), 30, 42).unwrap();
        analyze(&data.exam, &data.report).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_log_report_does_not_panic() {
        log_report(&analysis());
    }

    #[test]
    fn test_comparison_csv_has_one_row_per_subject() {
        let dir = temp_dir("exam_report_rater_test_comparison");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(COMPARISON_FILE);

        write_comparison_csv(&path, &analysis()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Subject,Simple_R2,Simple_RMSE,Multi_R2,Multi_RMSE,R2_Gain");
        assert_eq!(lines.len(), 6);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_all() {
        let dir = temp_dir("exam_report_rater_test_write_all");
        let _ = fs::remove_dir_all(&dir);

        let paths = write_all(&dir, &analysis()).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.exists()));

        let details = fs::read_to_string(dir.join(DETAILS_FILE)).unwrap();
        // 1 header + 30 students × 5 subjects
        assert_eq!(details.lines().count(), 151);
        assert!(details.starts_with(
            "student_id,subject,exam_t,report_t,simple_predicted,multi_predicted"
        ));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(json["summary"]["student_count"], 30);
        assert_eq!(json["models"].as_array().unwrap().len(), 5);
        assert_eq!(
            json["models"][0]["multi_coefficients"].as_array().unwrap().len(),
            5
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
