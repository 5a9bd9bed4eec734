//! Data types used by the analysis pipeline.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::subjects::SubjectSet;

/// Which of the two source tables a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    Exam,
    Report,
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Exam => write!(f, "exam"),
            TableSource::Report => write!(f, "report"),
        }
    }
}

/// Regression model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Simple,
    Multi,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Simple => write!(f, "simple"),
            Model::Multi => write!(f, "multi-predictor"),
        }
    }
}

/// One student's scores, indexed in subject-set order. `None` is a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub id: String,
    pub scores: Vec<Option<f64>>,
}

impl StudentRow {
    pub fn new(id: impl Into<String>, scores: Vec<Option<f64>>) -> Self {
        Self {
            id: id.into(),
            scores,
        }
    }

    /// Convenience constructor for rows without missing values.
    pub fn complete(id: impl Into<String>, scores: &[f64]) -> Self {
        Self::new(id, scores.iter().copied().map(Some).collect())
    }
}

/// Raw scores of one source table.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub(crate) source: TableSource,
    pub(crate) subjects: Vec<String>,
    pub(crate) rows: Vec<StudentRow>,
}

impl RawTable {
    /// Builds a table, rejecting duplicate identifiers and rows whose score
    /// count does not match the subject set.
    pub fn new(source: TableSource, subjects: &SubjectSet, rows: Vec<StudentRow>) -> Result<Self> {
        check_rows(source, subjects.len(), &rows)?;
        Ok(Self {
            source,
            subjects: subjects.names(),
            rows,
        })
    }

    pub fn source(&self) -> TableSource {
        self.source
    }

    pub fn rows(&self) -> &[StudentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one subject column, in row order.
    pub fn column(&self, subject: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.scores[subject]).collect()
    }
}

fn check_rows(source: TableSource, expected: usize, rows: &[StudentRow]) -> Result<()> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if row.scores.len() != expected {
            return Err(AnalysisError::ScoreCountMismatch {
                id: row.id.clone(),
                expected,
                actual: row.scores.len(),
            });
        }
        if !seen.insert(row.id.as_str()) {
            return Err(AnalysisError::DuplicateStudent {
                id: row.id.clone(),
                table: source,
            });
        }
    }
    Ok(())
}

/// A table whose scores are T-scores computed over each full column.
///
/// Only produced by [`crate::analyzers::normalize::normalize`].
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub(crate) source: TableSource,
    pub(crate) subjects: Vec<String>,
    pub(crate) rows: Vec<StudentRow>,
}

impl NormalizedTable {
    pub fn source(&self) -> TableSource {
        self.source
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn rows(&self) -> &[StudentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, subject: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.scores[subject]).collect()
    }
}

/// A joined row: complete exam and report T-scores for every subject.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub id: String,
    pub exam: Vec<f64>,
    pub report: Vec<f64>,
}

/// Inner join of the exam and report tables on student identifier.
#[derive(Debug, Clone)]
pub struct AlignedTable {
    pub(crate) subjects: Vec<String>,
    pub(crate) rows: Vec<AlignedRow>,
    pub(crate) unmatched: usize,
    pub(crate) incomplete: usize,
}

impl AlignedTable {
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers found in only one of the two tables.
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Matched identifiers dropped for a missing T-score.
    pub fn incomplete(&self) -> usize {
        self.incomplete
    }

    pub fn exam_column(&self, subject: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r.exam[subject]).collect()
    }

    pub fn report_column(&self, subject: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r.report[subject]).collect()
    }

    /// Exam T-scores of every subject, one vector per row.
    pub fn exam_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.exam.clone()).collect()
    }
}

/// Output of a least-squares fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    #[serde(skip)]
    pub predictions: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub r2: f64,
    pub rmse: f64,
}

impl FitResult {
    /// Evaluates the fitted model on one predictor vector.
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    /// Slope of a single-predictor fit, `None` if nothing was fitted.
    pub fn slope(&self) -> Option<f64> {
        self.coefficients.first().copied()
    }
}

/// Simple and multi-predictor fits for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub subject: String,
    pub simple: FitResult,
    pub multi: FitResult,
    pub r2_improvement: f64,
}

impl AnalysisResult {
    pub fn new(subject: impl Into<String>, simple: FitResult, multi: FitResult) -> Self {
        let r2_improvement = multi.r2 - simple.r2;
        Self {
            subject: subject.into(),
            simple,
            multi,
            r2_improvement,
        }
    }
}

/// Fit quality of both models for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectComparison {
    pub subject: String,
    pub simple_r2: f64,
    pub simple_rmse: f64,
    pub multi_r2: f64,
    pub multi_rmse: f64,
    pub r2_improvement: f64,
}

/// Averages across subjects and the best-predicted subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSummary {
    pub student_count: usize,
    pub subject_count: usize,
    pub mean_simple_r2: f64,
    pub mean_multi_r2: f64,
    pub mean_improvement: f64,
    pub best_subject: String,
    pub best_multi_r2: f64,
}

/// One student × subject row of the detailed prediction table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub student_id: String,
    pub subject: String,
    pub exam_t: f64,
    pub report_t: f64,
    pub simple_predicted: f64,
    pub multi_predicted: f64,
}

/// Everything the reporter derives from a set of [`AnalysisResult`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub subjects: Vec<SubjectComparison>,
    pub summary: OverallSummary,
    #[serde(skip)]
    pub details: Vec<PredictionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_subjects() -> SubjectSet {
        SubjectSet::from_pairs(&[("A", "A_E", "A_R"), ("B", "B_E", "B_R")]).unwrap()
    }

    #[test]
    fn test_raw_table_rejects_duplicate_ids() {
        let rows = vec![
            StudentRow::complete("s1", &[1.0, 2.0]),
            StudentRow::complete("s1", &[3.0, 4.0]),
        ];
        let err = RawTable::new(TableSource::Report, &two_subjects(), rows).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::DuplicateStudent {
                id: "s1".into(),
                table: TableSource::Report,
            }
        );
    }

    #[test]
    fn test_raw_table_rejects_short_rows() {
        let rows = vec![StudentRow::complete("s1", &[1.0])];
        let err = RawTable::new(TableSource::Exam, &two_subjects(), rows).unwrap_err();
        assert!(matches!(err, AnalysisError::ScoreCountMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_fit_result_predict() {
        let fit = FitResult {
            predictions: vec![],
            coefficients: vec![2.0, -1.0],
            intercept: 0.5,
            r2: 1.0,
            rmse: 0.0,
        };
        assert_eq!(fit.predict(&[3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_analysis_result_keeps_negative_improvement() {
        let fit = |r2| FitResult {
            predictions: vec![],
            coefficients: vec![1.0],
            intercept: 0.0,
            r2,
            rmse: 0.0,
        };
        let result = AnalysisResult::new("A", fit(0.8), fit(0.5));
        assert!((result.r2_improvement + 0.3).abs() < 1e-12);
    }
}
