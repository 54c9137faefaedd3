//! # Error Module
//!
//! Typed failures for the transit engine. Every numerical operation reports
//! problems to its caller through [`TransitError`]; only a missing catalog
//! cache is treated as a recoverable, expected condition by the storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, TransitError>;

/// Errors produced by the transit engine.
#[derive(Error, Debug)]
pub enum TransitError {
    /// Malformed numeric argument, non-positive period, mismatched lengths.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No finite data points left after filtering.
    #[error("series is empty after discarding non-finite samples")]
    EmptySeries,
    #[error("index {index} out of range for catalog of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    /// A catalog line that does not follow `Epoch: <num> | Period: <num-or->`.
    #[error("malformed catalog entry: {0}")]
    MalformedEntry(String),
    #[error("no catalog cache at {}", .0.display())]
    MissingCache(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "fits")]
    #[error("FITS error: {0}")]
    Fits(String),
}

impl TransitError {
    /// Shorthand for building an [`TransitError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        TransitError::InvalidInput(msg.into())
    }
}
