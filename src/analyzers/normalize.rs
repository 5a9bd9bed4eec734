//! Raw score → T-score conversion.

use tracing::debug;

use crate::analyzers::types::{NormalizedTable, RawTable, StudentRow, TableSource};
use crate::analyzers::utility::{mean, stddev};
use crate::error::{AnalysisError, Result};

/// Converts one column to T-scores: `50 + 10 * (x - mean) / population_sd`.
///
/// Mean and SD are taken over the non-missing values; missing values stay
/// missing. A column with zero SD (all values equal, or fewer than two values)
/// cannot be normalized and yields `None`.
pub fn t_scores(values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    // Equal values can still leave a rounding-error SD, so test equality directly.
    if present.iter().all(|v| Some(v) == present.first()) {
        return None;
    }

    let m = mean(&present);
    let sd = stddev(&present, m);
    if sd == 0.0 || !sd.is_finite() {
        return None;
    }

    Some(
        values
            .iter()
            .map(|v| v.map(|x| 50.0 + 10.0 * (x - m) / sd))
            .collect(),
    )
}

/// Normalizes every subject column of `table` over that table alone.
///
/// # Errors
///
/// [`AnalysisError::DegenerateDistribution`] if any subject column has zero variance.
#[tracing::instrument(skip(table), fields(source = %table.source(), rows = table.len()))]
pub fn normalize(table: &RawTable) -> Result<NormalizedTable> {
    let source: TableSource = table.source;
    let mut columns = Vec::with_capacity(table.subjects.len());

    for (i, subject) in table.subjects.iter().enumerate() {
        let column = t_scores(&table.column(i)).ok_or_else(|| {
            AnalysisError::DegenerateDistribution {
                subject: subject.clone(),
                table: source,
            }
        })?;
        columns.push(column);
    }

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| StudentRow::new(row.id.clone(), columns.iter().map(|c| c[r]).collect()))
        .collect();

    debug!(subjects = table.subjects.len(), "T-scores computed");

    Ok(NormalizedTable {
        source,
        subjects: table.subjects.clone(),
        rows,
    })
}
