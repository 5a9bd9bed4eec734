//! Inner join of the normalized exam and report tables.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::analyzers::types::{AlignedRow, AlignedTable, NormalizedTable, StudentRow};
use crate::error::{AnalysisError, Result};

/// Joins `exam` and `report` on student identifier.
///
/// Identifiers present in only one table are dropped, as are matched rows with
/// any missing T-score. Row order follows the exam table. An empty result is
/// returned as-is; the fitters reject it.
#[tracing::instrument(skip_all, fields(exam_rows = exam.len(), report_rows = report.len()))]
pub fn align(exam: &NormalizedTable, report: &NormalizedTable) -> Result<AlignedTable> {
    if exam.subjects != report.subjects {
        return Err(AnalysisError::SubjectMismatch);
    }

    let by_id: HashMap<&str, &StudentRow> =
        report.rows.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut rows = Vec::new();
    let mut matched = HashSet::new();
    let mut incomplete = 0;

    for exam_row in &exam.rows {
        let Some(report_row) = by_id.get(exam_row.id.as_str()) else {
            continue;
        };
        matched.insert(exam_row.id.as_str());

        match (complete(exam_row), complete(report_row)) {
            (Some(exam_t), Some(report_t)) => rows.push(AlignedRow {
                id: exam_row.id.clone(),
                exam: exam_t,
                report: report_t,
            }),
            _ => incomplete += 1,
        }
    }

    let unmatched = (exam.len() - matched.len()) + (report.len() - matched.len());
    debug!(unmatched, incomplete, "Dropped students during alignment");
    info!(students = rows.len(), "Tables aligned");

    Ok(AlignedTable {
        subjects: exam.subjects.clone(),
        rows,
        unmatched,
        incomplete,
    })
}

fn complete(row: &StudentRow) -> Option<Vec<f64>> {
    row.scores.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::TableSource;

    fn table(source: TableSource, rows: Vec<StudentRow>) -> NormalizedTable {
        NormalizedTable {
            source,
            subjects: vec!["A".into(), "B".into()],
            rows,
        }
    }

    #[test]
    fn test_inner_join_follows_exam_order() {
        let exam = table(
            TableSource::Exam,
            vec![
                StudentRow::complete("c", &[1.0, 2.0]),
                StudentRow::complete("a", &[3.0, 4.0]),
                StudentRow::complete("x", &[5.0, 6.0]),
            ],
        );
        let report = table(
            TableSource::Report,
            vec![
                StudentRow::complete("a", &[7.0, 8.0]),
                StudentRow::complete("y", &[0.0, 0.0]),
                StudentRow::complete("c", &[9.0, 10.0]),
            ],
        );

        let aligned = align(&exam, &report).unwrap();
        let ids: Vec<_> = aligned.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(aligned.rows()[0].report, vec![9.0, 10.0]);
        assert_eq!(aligned.unmatched(), 2);
        assert_eq!(aligned.incomplete(), 0);
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let exam = table(
            TableSource::Exam,
            vec![
                StudentRow::new("a", vec![Some(1.0), None]),
                StudentRow::complete("b", &[1.0, 2.0]),
            ],
        );
        let report = table(
            TableSource::Report,
            vec![
                StudentRow::complete("a", &[1.0, 2.0]),
                StudentRow::new("b", vec![None, Some(2.0)]),
            ],
        );

        let aligned = align(&exam, &report).unwrap();
        assert!(aligned.is_empty());
        assert_eq!(aligned.incomplete(), 2);
    }

    #[test]
    fn test_subject_mismatch() {
        let exam = table(TableSource::Exam, vec![]);
        let mut report = table(TableSource::Report, vec![]);
        report.subjects.reverse();
        assert_eq!(align(&exam, &report).unwrap_err(), AnalysisError::SubjectMismatch);
    }
}
