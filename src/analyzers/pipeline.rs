//! Pipeline driver: normalize, align, fit both models per subject, compare.

use tracing::info;

use crate::analyzers::align::align;
use crate::analyzers::compare::compare;
use crate::analyzers::multi::fit_all_multi;
use crate::analyzers::normalize::normalize;
use crate::analyzers::simple::fit_all_simple;
use crate::analyzers::types::{AlignedTable, AnalysisResult, ComparisonReport, RawTable};
use crate::error::Result;

/// Output of one analysis run. Nothing is cached between runs.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub aligned: AlignedTable,
    pub results: Vec<AnalysisResult>,
    pub report: ComparisonReport,
}

impl Analysis {
    /// Result for one subject, by name.
    pub fn result(&self, subject: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.subject == subject)
    }
}

/// Runs the full pipeline: normalize each table, align them, fit both models
/// for every subject and build the comparison report.
///
/// The first failing stage aborts the run; no partial results are returned.
#[tracing::instrument(skip_all, fields(exam_rows = exam.len(), report_rows = report.len()))]
pub fn analyze(exam: &RawTable, report: &RawTable) -> Result<Analysis> {
    let exam_t = normalize(exam)?;
    let report_t = normalize(report)?;
    let aligned = align(&exam_t, &report_t)?;

    let simple = fit_all_simple(&aligned)?;
    let multi = fit_all_multi(&aligned)?;

    let results: Vec<AnalysisResult> = aligned
        .subjects()
        .iter()
        .zip(simple.into_iter().zip(multi))
        .map(|(subject, (s, m))| AnalysisResult::new(subject.clone(), s, m))
        .collect();

    for r in &results {
        info!(
            subject = %r.subject,
            simple_r2 = r.simple.r2,
            multi_r2 = r.multi.r2,
            r2_improvement = r.r2_improvement,
            "Subject analyzed"
        );
    }

    let report = compare(&aligned, &results)?;
    info!(
        students = report.summary.student_count,
        best_subject = %report.summary.best_subject,
        "Analysis complete"
    );

    Ok(Analysis {
        aligned,
        results,
        report,
    })
}
