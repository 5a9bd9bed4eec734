//! Single-predictor least squares: report T ~ exam T, per subject.

use tracing::info;

use crate::analyzers::types::{AlignedTable, FitResult, Model};
use crate::analyzers::utility::{fit_quality, mean};
use crate::error::{AnalysisError, Result};

/// Fits `y = slope * x + intercept` by ordinary least squares.
///
/// # Errors
///
/// - [`AnalysisError::LengthMismatch`] if `x` and `y` differ in length
/// - [`AnalysisError::InsufficientData`] with fewer than two rows
/// - [`AnalysisError::ZeroPredictorVariance`] if every `x` is equal
/// - [`AnalysisError::UndefinedFitQuality`] if every `y` is equal
pub fn fit_simple(x: &[f64], y: &[f64]) -> Result<FitResult> {
    if x.len() != y.len() {
        return Err(AnalysisError::LengthMismatch {
            input: "target",
            expected: x.len(),
            actual: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            model: Model::Simple,
            required: 2,
            actual: n,
        });
    }

    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - x_mean).powi(2);
        sxy += (xi - x_mean) * (yi - y_mean);
    }

    if sxx == 0.0 {
        return Err(AnalysisError::ZeroPredictorVariance);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let predictions: Vec<f64> = x.iter().map(|xi| slope * xi + intercept).collect();

    let (r2, rmse) = fit_quality(y, &predictions);
    let r2 = r2.ok_or(AnalysisError::UndefinedFitQuality)?;

    Ok(FitResult {
        predictions,
        coefficients: vec![slope],
        intercept,
        r2,
        rmse,
    })
}

/// Fits one simple model per subject, in subject order.
pub fn fit_all_simple(aligned: &AlignedTable) -> Result<Vec<FitResult>> {
    aligned
        .subjects()
        .iter()
        .enumerate()
        .map(|(i, subject)| {
            let fit = fit_simple(&aligned.exam_column(i), &aligned.report_column(i))
                .map_err(|e| e.for_subject(subject))?;
            info!(
                subject = %subject,
                r2 = fit.r2,
                rmse = fit.rmse,
                "Simple regression fitted"
            );
            Ok(fit)
        })
        .collect()
}
