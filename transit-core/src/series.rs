//! # Time Series Module
//!
//! The light curve data model: a finite-filtered, median-normalised pair of
//! time and flux arrays with an optional catalog identifier.
//!
//! ## Features
//! - Drops every sample whose time or flux is non-finite, as a pair
//! - Normalises flux so its median is 1.0
//! - Extracts Kepler IDs (`kplr` + nine digits) from file names

use crate::error::{Result, TransitError};
use crate::stats;
use log::debug;

/// Prefix used by the Kepler archive in light curve file names.
const KEPLER_PREFIX: &str = "kplr";
/// Number of digits in a Kepler input catalog ID.
const KEPLER_ID_DIGITS: usize = 9;

/// An immutable light curve.
///
/// Built once per loaded file; a new file replaces it entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time: Vec<f64>,
    flux: Vec<f64>,
    identifier: String,
}

impl TimeSeries {
    /// Builds a series from raw parallel arrays.
    ///
    /// # Arguments
    /// * `time` - Sample times in days, assumed increasing
    /// * `flux` - Observed flux, same length as `time`
    /// * `identifier` - Catalog label, may be empty
    ///
    /// # Returns
    /// * `Err(InvalidInput)` - If the arrays differ in length
    /// * `Err(EmptySeries)` - If no finite pair survives the filter
    pub fn new(time: Vec<f64>, flux: Vec<f64>, identifier: impl Into<String>) -> Result<Self> {
        if time.len() != flux.len() {
            return Err(TransitError::invalid(format!(
                "time has {} samples but flux has {}",
                time.len(),
                flux.len()
            )));
        }

        let total = time.len();
        let (time, mut flux): (Vec<f64>, Vec<f64>) = time
            .into_iter()
            .zip(flux)
            .filter(|(t, f)| t.is_finite() && f.is_finite())
            .unzip();

        let median = stats::median(&flux)?;
        if median == 0.0 {
            return Err(TransitError::invalid("median flux is zero, cannot normalise"));
        }
        for f in flux.iter_mut() {
            *f /= median;
        }

        debug!(
            "Built series: kept {} of {} samples, median flux {}",
            time.len(),
            total,
            median
        );

        Ok(Self {
            time,
            flux,
            identifier: identifier.into(),
        })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// First and last sample time.
    pub fn bounds(&self) -> (f64, f64) {
        // Construction guarantees at least one sample.
        (self.time[0], self.time[self.time.len() - 1])
    }

    /// Plot title, e.g. `Kepler ID - 012345678`, when an identifier is set.
    pub fn title(&self) -> Option<String> {
        if self.identifier.is_empty() {
            None
        } else {
            Some(format!("Kepler ID - {}", self.identifier))
        }
    }
}

/// Finds a Kepler ID embedded in a file name.
///
/// Looks for the first `kplr` immediately followed by nine ASCII digits and
/// returns those digits. Anything after the ninth digit is ignored, so
/// `kplr0123456789` yields `012345678`.
pub fn kepler_id_from_name(name: &str) -> Option<String> {
    name.match_indices(KEPLER_PREFIX).find_map(|(start, _)| {
        let digits = name.get(start + KEPLER_PREFIX.len()..)?;
        let id: String = digits.chars().take(KEPLER_ID_DIGITS).collect();
        (id.len() == KEPLER_ID_DIGITS && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
    })
}
