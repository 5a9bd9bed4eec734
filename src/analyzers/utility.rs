/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Sum of squared deviations around `mean`.
pub fn sum_sq_dev(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// R² and RMSE of `predicted` against `observed`.
///
/// Returns `None` for R² when the observed values have zero total sum of squares.
pub fn fit_quality(observed: &[f64], predicted: &[f64]) -> (Option<f64>, f64) {
    let n = observed.len();
    if n == 0 {
        return (None, 0.0);
    }

    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot = sum_sq_dev(observed, mean(observed));

    let rmse = (ss_res / n as f64).sqrt();
    let r2 = if ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    };

    (r2, rmse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(stddev(&values, m), 2.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[], 0.0), 0.0);
    }

    #[test]
    fn test_fit_quality_perfect() {
        let (r2, rmse) = fit_quality(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(r2, Some(1.0));
        assert_eq!(rmse, 0.0);
    }

    #[test]
    fn test_fit_quality_mean_prediction_is_zero() {
        let (r2, rmse) = fit_quality(&[1.0, 3.0], &[2.0, 2.0]);
        assert_eq!(r2, Some(0.0));
        assert_eq!(rmse, 1.0);
    }

    #[test]
    fn test_fit_quality_can_be_negative() {
        let (r2, _) = fit_quality(&[1.0, 3.0], &[3.0, 1.0]);
        assert_eq!(r2, Some(-3.0));
    }

    #[test]
    fn test_fit_quality_constant_target_is_undefined() {
        let (r2, _) = fit_quality(&[4.0, 4.0, 4.0], &[4.0, 4.0, 4.0]);
        assert_eq!(r2, None);
    }
}
