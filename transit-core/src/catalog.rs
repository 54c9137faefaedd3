//! # Transit Catalog Module
//!
//! Saved transit candidates for the currently loaded light curve.
//!
//! Each candidate is stored as one human-readable line:
//!
//! ```text
//! Epoch: 131.51 | Period: 3.54
//! Epoch: 12.34 | Period: -
//! ```
//!
//! A dash stands for "period not determined yet".
//!
//! Numbers are written in their shortest exact form (`7`, not `7.00`) so a
//! line always parses back to the same entry.

use crate::error::{Result, TransitError};
use log::info;
use std::fmt;
use std::str::FromStr;

/// Token written in place of a missing period.
pub const NO_PERIOD: &str = "-";

const EPOCH_LABEL: &str = "Epoch:";
const PERIOD_LABEL: &str = "Period:";

/// One saved transit candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// Time of the reference transit in days.
    pub epoch: f64,
    /// Transit period in days, if one was committed.
    pub period: Option<f64>,
}

impl CatalogEntry {
    /// Creates an entry, checking that the epoch is finite and the period,
    /// when present, is finite and positive.
    pub fn new(epoch: f64, period: Option<f64>) -> Result<Self> {
        if !epoch.is_finite() {
            return Err(TransitError::invalid(format!("epoch must be finite, got {epoch}")));
        }
        if let Some(p) = period {
            if !(p.is_finite() && p > 0.0) {
                return Err(TransitError::invalid(format!("period must be positive, got {p}")));
            }
        }
        Ok(Self { epoch, period })
    }

    /// The newline-terminated line stored in the cache file.
    pub fn serialize(&self) -> String {
        format!("{self}\n")
    }

    /// Parses one `Epoch: <num> | Period: <num-or-dash>` line.
    ///
    /// A trailing newline is accepted. Whitespace around the separator and
    /// the numbers is ignored.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || TransitError::MalformedEntry(line.trim_end().to_string());

        let record = line.trim_end_matches(['\n', '\r']);
        let (epoch_part, period_part) = record.split_once('|').ok_or_else(malformed)?;

        let epoch_text = epoch_part
            .trim()
            .strip_prefix(EPOCH_LABEL)
            .ok_or_else(malformed)?
            .trim();
        let period_text = period_part
            .trim()
            .strip_prefix(PERIOD_LABEL)
            .ok_or_else(malformed)?
            .trim();

        let epoch: f64 = epoch_text.parse().map_err(|_| malformed())?;
        let period = if period_text == NO_PERIOD {
            None
        } else {
            Some(period_text.parse::<f64>().map_err(|_| malformed())?)
        };

        Self::new(epoch, period).map_err(|_| malformed())
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period {
            Some(period) => write!(f, "{EPOCH_LABEL} {} | {PERIOD_LABEL} {}", self.epoch, period),
            None => write!(f, "{EPOCH_LABEL} {} | {PERIOD_LABEL} {NO_PERIOD}", self.epoch),
        }
    }
}

impl FromStr for CatalogEntry {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Ordered list of saved candidates for one light curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitCatalog {
    entries: Vec<CatalogEntry>,
}

impl TransitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate and returns its index.
    ///
    /// The epoch is checked here even though the interactive flow only calls
    /// this with a committed marker: the catalog is also driven from scripts.
    ///
    /// # Returns
    /// * `Err(InvalidInput)` - If `epoch` is `None` or either value is invalid.
    ///   The catalog is left unchanged.
    pub fn save(&mut self, epoch: Option<f64>, period: Option<f64>) -> Result<usize> {
        let epoch = epoch
            .ok_or_else(|| TransitError::invalid("offset of the first transit should be selected"))?;
        let entry = CatalogEntry::new(epoch, period)?;
        info!("Saved transit entry: {entry}");
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Removes and returns the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Result<CatalogEntry> {
        if index >= self.entries.len() {
            return Err(TransitError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let entry = self.entries.remove(index);
        info!("Deleted transit entry {index}: {entry}");
        Ok(entry)
    }

    pub fn get(&self, index: usize) -> Result<&CatalogEntry> {
        self.entries.get(index).ok_or(TransitError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The full cache file contents, one serialized entry per line.
    pub fn to_text(&self) -> String {
        self.entries.iter().map(CatalogEntry::serialize).collect()
    }

    /// Parses cache file contents. Blank lines are skipped; any other line
    /// that fails to parse rejects the whole text.
    pub fn from_text(text: &str) -> Result<Self> {
        let entries = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                CatalogEntry::parse(line).map_err(|_| {
                    TransitError::MalformedEntry(format!("line {}: {}", number + 1, line.trim_end()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Parses cache file contents, keeping every good line.
    ///
    /// Returns the catalog and the malformed lines, each prefixed with its
    /// line number.
    pub fn from_text_lossy(text: &str) -> (Self, Vec<String>) {
        let mut entries = Vec::new();
        let mut rejected = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match CatalogEntry::parse(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => rejected.push(format!("line {}: {}", number + 1, line.trim_end())),
            }
        }
        (Self { entries }, rejected)
    }
}
