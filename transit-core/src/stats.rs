//! # Statistics Module
//!
//! Small numerical helpers shared by the series normalisation and the
//! standalone outlier filter.

use crate::error::{Result, TransitError};

/// Default rejection threshold for [`reject_outliers`], in standard deviations.
pub const DEFAULT_OUTLIER_SIGMA: f64 = 3.0;

/// Calculates the median of a slice.
///
/// For even-length data the two middle values are averaged. The input is
/// expected to be finite; NaN values sort as equal and give an arbitrary
/// result.
///
/// # Returns
/// * `Ok(median)` - The median value
/// * `Err(TransitError::EmptySeries)` - If `values` is empty
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(TransitError::EmptySeries);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    let median_value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Ok(median_value)
}

/// Splits `data` into values kept and indices rejected as high outliers.
///
/// A value is rejected when it lies `m` or more population standard
/// deviations *above* the mean. Low values are never rejected: transit dips
/// are exactly the signal this tool is looking for.
///
/// Not used by the interactive flow; kept as a standalone utility.
///
/// # Arguments
/// * `data` - Flux values to filter
/// * `m` - Threshold in standard deviations (see [`DEFAULT_OUTLIER_SIGMA`])
///
/// # Returns
/// * `(kept, rejected)` - Retained values in input order and the indices
///   of the rejected ones
pub fn reject_outliers(data: &[f64], m: f64) -> (Vec<f64>, Vec<usize>) {
    if data.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let sigma = (data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

    let mut kept = Vec::with_capacity(data.len());
    let mut rejected = Vec::new();
    for (i, &value) in data.iter().enumerate() {
        if value - mean >= m * sigma {
            rejected.push(i);
        } else {
            kept.push(value);
        }
    }

    (kept, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_odd_and_even() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_relative_eq!(median(&[7.5]).unwrap(), 7.5);
    }

    #[test]
    fn test_median_empty_is_error() {
        assert!(matches!(median(&[]), Err(TransitError::EmptySeries)));
    }

    #[test]
    fn test_reject_outliers_high_spike() {
        let mut data = vec![1.0; 20];
        data[7] = 50.0;

        let (kept, rejected) = reject_outliers(&data, DEFAULT_OUTLIER_SIGMA);

        assert_eq!(rejected, vec![7]);
        assert_eq!(kept.len(), 19);
        assert!(kept.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_reject_outliers_keeps_dips() {
        let mut data = vec![1.0; 20];
        data[3] = -50.0;

        let (kept, rejected) = reject_outliers(&data, DEFAULT_OUTLIER_SIGMA);

        assert!(rejected.is_empty());
        assert_eq!(kept, data);
    }

    #[test]
    fn test_reject_outliers_constant_rejects_everything() {
        // sigma is zero, so every value sits at ">= 0 * m" above the mean
        let (kept, rejected) = reject_outliers(&[2.0, 2.0, 2.0], 3.0);
        assert!(kept.is_empty());
        assert_eq!(rejected, vec![0, 1, 2]);
    }
}
