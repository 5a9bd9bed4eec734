//! Simple vs multi-predictor comparison and the per-student detail table.

use std::collections::HashMap;

use crate::analyzers::types::{
    AlignedTable, AnalysisResult, ComparisonReport, OverallSummary, PredictionRow,
    SubjectComparison,
};
use crate::analyzers::utility::mean;
use crate::error::{AnalysisError, Result};

/// Builds the comparison report for every subject of `aligned`.
///
/// `results` may be in any order, but must hold one entry per subject of the
/// aligned table. Improvements are reported as-is, including negative ones.
///
/// # Errors
///
/// - [`AnalysisError::MissingSubjectResult`] for the first subject without a result
/// - [`AnalysisError::LengthMismatch`], wrapped with the subject name, when a
///   result's coefficients or predictions do not fit the aligned table
pub fn compare(aligned: &AlignedTable, results: &[AnalysisResult]) -> Result<ComparisonReport> {
    let by_subject: HashMap<&str, &AnalysisResult> =
        results.iter().map(|r| (r.subject.as_str(), r)).collect();

    let ordered = aligned
        .subjects()
        .iter()
        .map(|s| {
            by_subject
                .get(s.as_str())
                .copied()
                .ok_or_else(|| AnalysisError::MissingSubjectResult { subject: s.clone() })
        })
        .collect::<Result<Vec<_>>>()?;

    for r in &ordered {
        check_shape(aligned, r).map_err(|e| e.for_subject(&r.subject))?;
    }

    let subjects: Vec<SubjectComparison> = ordered
        .iter()
        .map(|r| SubjectComparison {
            subject: r.subject.clone(),
            simple_r2: r.simple.r2,
            simple_rmse: r.simple.rmse,
            multi_r2: r.multi.r2,
            multi_rmse: r.multi.rmse,
            r2_improvement: r.r2_improvement,
        })
        .collect();

    let summary = summarize(aligned.len(), &subjects);
    let details = detail_rows(aligned, &ordered);

    Ok(ComparisonReport {
        subjects,
        summary,
        details,
    })
}

fn check_shape(aligned: &AlignedTable, result: &AnalysisResult) -> Result<()> {
    let checks = [
        ("simple coefficients", 1, result.simple.coefficients.len()),
        (
            "multi-predictor coefficients",
            aligned.subjects().len(),
            result.multi.coefficients.len(),
        ),
        (
            "multi-predictor predictions",
            aligned.len(),
            result.multi.predictions.len(),
        ),
    ];

    match checks.into_iter().find(|(_, expected, actual)| expected != actual) {
        Some((input, expected, actual)) => Err(AnalysisError::LengthMismatch {
            input,
            expected,
            actual,
        }),
        None => Ok(()),
    }
}

fn summarize(student_count: usize, subjects: &[SubjectComparison]) -> OverallSummary {
    let simple: Vec<f64> = subjects.iter().map(|s| s.simple_r2).collect();
    let multi: Vec<f64> = subjects.iter().map(|s| s.multi_r2).collect();
    let gains: Vec<f64> = subjects.iter().map(|s| s.r2_improvement).collect();

    // Strictly greater keeps the first subject on ties.
    let best = subjects
        .iter()
        .skip(1)
        .fold(subjects.first(), |best, s| match best {
            Some(b) if s.multi_r2 > b.multi_r2 => Some(s),
            _ => best,
        });

    OverallSummary {
        student_count,
        subject_count: subjects.len(),
        mean_simple_r2: mean(&simple),
        mean_multi_r2: mean(&multi),
        mean_improvement: mean(&gains),
        best_subject: best.map(|b| b.subject.clone()).unwrap_or_default(),
        best_multi_r2: best.map_or(0.0, |b| b.multi_r2),
    }
}

fn detail_rows(aligned: &AlignedTable, ordered: &[&AnalysisResult]) -> Vec<PredictionRow> {
    let mut rows = Vec::with_capacity(aligned.len() * ordered.len());

    for (r, row) in aligned.rows().iter().enumerate() {
        for (i, result) in ordered.iter().enumerate() {
            rows.push(PredictionRow {
                student_id: row.id.clone(),
                subject: result.subject.clone(),
                exam_t: row.exam[i],
                report_t: row.report[i],
                simple_predicted: result.simple.predict(&row.exam[i..=i]),
                multi_predicted: result.multi.predictions[r],
            });
        }
    }

    rows
}
