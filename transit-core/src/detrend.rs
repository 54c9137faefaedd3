//! # Detrending Module
//!
//! Removes slow brightness drift from a light curve with a centred moving
//! average so that periodic transit dips stand out.
//!
//! The window width grows with the square root of the series length and is
//! always odd. The first and last `w / 2` samples have no full window around
//! them and are copied through uncorrected.

use crate::error::{Result, TransitError};
use crate::series::TimeSeries;
use log::debug;

/// Moving average window for a series of `n` samples.
///
/// `floor(sqrt(n))`, decremented by one when even so the window has a centre.
/// Returns 0 only for `n == 0`.
pub fn detrend_window(n: usize) -> usize {
    let w = (n as f64).sqrt().floor() as usize;
    if w % 2 == 0 { w.saturating_sub(1) } else { w }
}

/// Computes the detrended flux of a series.
pub fn detrend_series(series: &TimeSeries) -> Result<Vec<f64>> {
    detrend(series.flux())
}

/// Subtracts a centred moving average from `flux` and re-centres it at 1.0.
///
/// Each corrected sample is `flux[i] - mean(window around i) + 1.0`. The
/// window is slid along by dropping the oldest value and adding the newest
/// rather than summing from scratch.
///
/// # Returns
/// * `Ok(detrended)` - Same length as `flux`
/// * `Err(EmptySeries)` - If `flux` is empty
pub fn detrend(flux: &[f64]) -> Result<Vec<f64>> {
    let n = flux.len();
    if n == 0 {
        return Err(TransitError::EmptySeries);
    }

    let w = detrend_window(n);
    let half = w / 2;
    debug!("Detrending {} samples with window {}", n, w);

    let mut detrended = Vec::with_capacity(n);
    detrended.extend_from_slice(&flux[..half]);

    let mut window_sum: f64 = flux[..w].iter().sum();
    for i in 0..=(n - w) {
        let moving_average = window_sum / w as f64;
        detrended.push(flux[half + i] - moving_average + 1.0);
        if i + w < n {
            window_sum += flux[i + w] - flux[i];
        }
    }

    detrended.extend_from_slice(&flux[n - half..]);
    Ok(detrended)
}
