//! # Folding Module
//!
//! Phase-folds a light curve on a candidate period: every sample is mapped
//! to its offset from the nearest predicted transit, so all cycles collapse
//! onto one period-wide window centred on zero.

use crate::error::{Result, TransitError};
use crate::series::TimeSeries;
use log::debug;

/// Offset of `t` from the nearest transit predicted by `epoch` and `period`.
///
/// The cycle count is rounded half away from zero (`f64::round`): a sample
/// half a period after the epoch maps to `-period / 2`, one half a period
/// before it maps to `+period / 2`.
///
/// The caller guarantees `period > 0`.
pub fn fold_point(t: f64, epoch: f64, period: f64) -> f64 {
    let cycles = ((t - epoch) / period).round();
    t - (epoch + cycles * period)
}

/// Folds every sample time in `time`.
///
/// # Arguments
/// * `time` - Sample times in days
/// * `epoch` - Time of the reference transit
/// * `period` - Transit period in days, must be positive and finite
///
/// # Returns
/// * `Ok(folded)` - Same length as `time`, values within about ±period/2
/// * `Err(InvalidInput)` - If the period is not a positive finite number
pub fn fold_time(time: &[f64], epoch: f64, period: f64) -> Result<Vec<f64>> {
    if !(period.is_finite() && period > 0.0) {
        return Err(TransitError::invalid(format!(
            "fold period must be positive, got {period}"
        )));
    }
    if !epoch.is_finite() {
        return Err(TransitError::invalid(format!(
            "fold epoch must be finite, got {epoch}"
        )));
    }

    debug!(
        "Folding {} samples at epoch {} with period {}",
        time.len(),
        epoch,
        period
    );
    Ok(time.iter().map(|&t| fold_point(t, epoch, period)).collect())
}

/// Folds the time axis of a series.
pub fn fold_series(series: &TimeSeries, epoch: f64, period: f64) -> Result<Vec<f64>> {
    fold_time(series.time(), epoch, period)
}
