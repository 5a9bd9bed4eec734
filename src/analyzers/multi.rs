//! Multi-predictor least squares: each subject's report T against every
//! subject's exam T.

use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::analyzers::types::{AlignedTable, FitResult, Model};
use crate::analyzers::utility::{fit_quality, mean};
use crate::error::{AnalysisError, Result};

/// Fits `y = Σ coeff_i * x_i + intercept` by ordinary least squares.
///
/// `rows` holds one predictor vector per observation; coefficients come back
/// in the same order as the predictors. The centered design is scaled to unit
/// column norms and solved through its SVD.
///
/// # Errors
///
/// - [`AnalysisError::LengthMismatch`] if `rows` and `y` differ in length, or a
///   row is wider or narrower than the first one
/// - [`AnalysisError::InsufficientData`] unless there are more rows than predictors
/// - [`AnalysisError::SingularDesign`] if the design is rank deficient
///   (collinear or constant predictors)
/// - [`AnalysisError::UndefinedFitQuality`] if every `y` is equal
pub fn fit_multi(rows: &[Vec<f64>], y: &[f64]) -> Result<FitResult> {
    if rows.len() != y.len() {
        return Err(AnalysisError::LengthMismatch {
            input: "target",
            expected: rows.len(),
            actual: y.len(),
        });
    }
    let n = rows.len();
    let p = rows.first().map_or(0, Vec::len);
    if let Some(row) = rows.iter().find(|r| r.len() != p) {
        return Err(AnalysisError::LengthMismatch {
            input: "predictor row",
            expected: p,
            actual: row.len(),
        });
    }

    if n <= p || n < 2 {
        return Err(AnalysisError::InsufficientData {
            model: Model::Multi,
            required: p + 1,
            actual: n,
        });
    }

    // Centering removes the intercept column from the system.
    let x_means: Vec<f64> = (0..p)
        .map(|j| mean(&rows.iter().map(|r| r[j]).collect::<Vec<_>>()))
        .collect();
    let y_mean = mean(y);

    let mut design = DMatrix::from_fn(n, p, |i, j| rows[i][j] - x_means[j]);
    let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

    let scales: Vec<f64> = design.column_iter().map(|c| c.norm()).collect();
    if scales.iter().any(|s| *s == 0.0) {
        return Err(AnalysisError::SingularDesign);
    }
    for (mut column, s) in design.column_iter_mut().zip(&scales) {
        column /= *s;
    }

    let svd = design.svd(true, true);
    // Rank cutoff: largest singular value × ε × max(n, p).
    let tolerance = svd.singular_values.amax() * f64::EPSILON * n.max(p) as f64;
    if svd.rank(tolerance) < p {
        return Err(AnalysisError::SingularDesign);
    }
    let scaled = svd
        .solve(&target, tolerance)
        .map_err(|_| AnalysisError::SingularDesign)?;

    let coefficients: Vec<f64> = scaled.iter().zip(&scales).map(|(b, s)| b / s).collect();
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_means)
            .map(|(c, m)| c * m)
            .sum::<f64>();

    let predictions: Vec<f64> = rows
        .iter()
        .map(|row| {
            intercept
                + coefficients
                    .iter()
                    .zip(row)
                    .map(|(c, v)| c * v)
                    .sum::<f64>()
        })
        .collect();

    let (r2, rmse) = fit_quality(y, &predictions);
    let r2 = r2.ok_or(AnalysisError::UndefinedFitQuality)?;

    Ok(FitResult {
        predictions,
        coefficients,
        intercept,
        r2,
        rmse,
    })
}

/// Fits one multi-predictor model per target subject, in subject order.
pub fn fit_all_multi(aligned: &AlignedTable) -> Result<Vec<FitResult>> {
    let predictors = aligned.exam_matrix();

    aligned
        .subjects()
        .iter()
        .enumerate()
        .map(|(i, subject)| {
            let fit = fit_multi(&predictors, &aligned.report_column(i))
                .map_err(|e| e.for_subject(subject))?;
            info!(
                subject = %subject,
                r2 = fit.r2,
                rmse = fit.rmse,
                "Multi-predictor regression fitted"
            );
            Ok(fit)
        })
        .collect()
}
