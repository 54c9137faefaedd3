//! # Transit Marker Module
//!
//! The interactive state machine behind transit line placement.
//!
//! The astronomer hovers to preview the first transit, clicks to commit it,
//! hovers again to preview the period (distance from the first marker), and
//! clicks to commit that too. Once both are set, every periodic repeat of the
//! first marker inside the series' time range is computed so the
//! presentation layer can draw it.
//!
//! ## States
//! - `Empty`: nothing placed or previewed
//! - `FirstPending`: epoch previewed under the pointer
//! - `FirstPlaced`: epoch committed
//! - `SecondPending`: period previewed under the pointer
//! - `BothPlaced`: epoch and period committed, folding allowed
//!
//! Folding is a mode on top of `BothPlaced`; it never resets the markers.
//! The engine only holds positions; drawing is left to the caller.

use crate::catalog::CatalogEntry;
use crate::config::TransitConfig;
use crate::error::{Result, TransitError};
use log::{debug, warn};

/// Where the marker state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPhase {
    Empty,
    FirstPending,
    FirstPlaced,
    SecondPending,
    BothPlaced,
}

/// Which side of the first marker a repeat lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A periodic repeat of the first transit marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatMarker {
    /// Cycles away from the epoch, starting at 1.
    pub index: usize,
    /// Time-axis position in days.
    pub position: f64,
    pub side: Side,
}

/// Repeat markers on both sides of the epoch, nearest first.
///
/// With the epoch inside the bounds, `left[k - 1]` and `right[k - 1]` hold
/// the repeat `k` cycles away, so one side growing or shrinking never moves
/// the other. With the epoch outside, the near side starts at the first
/// cycle that lands in range and `index` still counts cycles from the epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repeats {
    pub left: Vec<RepeatMarker>,
    pub right: Vec<RepeatMarker>,
}

impl Repeats {
    /// Computes every repeat of `epoch` within `bounds`, at most
    /// `max_per_side` on each side. Farther repeats beyond capacity are
    /// dropped. A non-positive period yields no repeats.
    ///
    /// Each side stops at its far bound. Cycles that have not reached the
    /// near bound yet (epoch outside the range) are skipped and take no slot.
    pub fn compute(epoch: f64, period: f64, bounds: (f64, f64), max_per_side: usize) -> Self {
        if !(period.is_finite() && period > 0.0) {
            return Self::default();
        }
        let (first, last) = bounds;

        let left = Self::extend_side(
            Side::Left,
            max_per_side,
            Self::cycles_to_cover(epoch - last, period),
            |k| epoch - k as f64 * period,
            |position| position > last,
            |position| position < first,
        );
        let right = Self::extend_side(
            Side::Right,
            max_per_side,
            Self::cycles_to_cover(first - epoch, period),
            |k| epoch + k as f64 * period,
            |position| position < first,
            |position| position > last,
        );

        debug!(
            "Computed {} left and {} right repeats for epoch {} period {}",
            left.len(),
            right.len(),
            epoch,
            period
        );
        Self { left, right }
    }

    /// Whole periods needed to cross `gap`; zero when there is no gap.
    fn cycles_to_cover(gap: f64, period: f64) -> usize {
        if gap > 0.0 {
            (gap / period).ceil() as usize
        } else {
            0
        }
    }

    /// Walks `k = start, start + 1, ...` until a position passes the far
    /// bound or the side is full. Positions short of the near bound are
    /// skipped.
    fn extend_side(
        side: Side,
        capacity: usize,
        start: usize,
        position_at: impl Fn(usize) -> f64,
        short_of_range: impl Fn(f64) -> bool,
        past_range: impl Fn(f64) -> bool,
    ) -> Vec<RepeatMarker> {
        let start = start.max(1);
        let mut markers = Vec::new();
        let mut index = start;
        loop {
            let position = position_at(index);
            if past_range(position) {
                return markers;
            }
            if short_of_range(position) {
                // `start` can land one cycle short through rounding. Anything
                // more means the period is too small to step across the gap.
                if index > start {
                    debug!("{:?} repeats never reach the time range", side);
                    return markers;
                }
            } else if markers.len() == capacity {
                warn!(
                    "More than {} {:?} repeats in range; dropping the farthest",
                    capacity, side
                );
                return markers;
            } else {
                markers.push(RepeatMarker {
                    index,
                    position,
                    side,
                });
            }
            index = match index.checked_add(1) {
                Some(next) => next,
                None => return markers,
            };
        }
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Left repeats then right repeats.
    pub fn iter(&self) -> impl Iterator<Item = &RepeatMarker> {
        self.left.iter().chain(self.right.iter())
    }
}

/// What the presentation layer should draw this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerLayout {
    /// First transit marker; pinned to 0.0 while folded.
    pub first: Option<f64>,
    pub repeats: Repeats,
    pub folded: bool,
}

/// Tracks marker placement for one loaded light curve.
#[derive(Debug, Clone)]
pub struct TransitMarkerEngine {
    bounds: (f64, f64),
    max_repeats_per_side: usize,
    preview_decimals: Option<u32>,

    epoch: Option<f64>,
    period: Option<f64>,
    first_placed: bool,
    period_placed: bool,

    preview_epoch: Option<f64>,
    preview_period: Option<f64>,

    folded: bool,
    repeats: Repeats,
}

impl TransitMarkerEngine {
    /// Creates an empty engine for a series spanning `bounds`.
    pub fn new(bounds: (f64, f64), config: &TransitConfig) -> Self {
        Self {
            bounds,
            max_repeats_per_side: config.max_repeats_per_side,
            preview_decimals: config.preview_decimals,
            epoch: None,
            period: None,
            first_placed: false,
            period_placed: false,
            preview_epoch: None,
            preview_period: None,
            folded: false,
            repeats: Repeats::default(),
        }
    }

    pub fn phase(&self) -> MarkerPhase {
        match (self.first_placed, self.period_placed) {
            (true, true) => MarkerPhase::BothPlaced,
            (true, false) if self.preview_period.is_some() => MarkerPhase::SecondPending,
            (true, false) => MarkerPhase::FirstPlaced,
            (false, _) if self.preview_epoch.is_some() => MarkerPhase::FirstPending,
            (false, _) => MarkerPhase::Empty,
        }
    }

    /// Committed epoch.
    pub fn epoch(&self) -> Option<f64> {
        self.epoch
    }

    /// Committed period.
    pub fn period(&self) -> Option<f64> {
        self.period
    }

    pub fn preview_epoch(&self) -> Option<f64> {
        self.preview_epoch
    }

    pub fn preview_period(&self) -> Option<f64> {
        self.preview_period
    }

    pub fn first_placed(&self) -> bool {
        self.first_placed
    }

    pub fn period_placed(&self) -> bool {
        self.period_placed
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Repeats of the committed epoch and period.
    pub fn repeats(&self) -> &Repeats {
        &self.repeats
    }

    /// True once both epoch and period are committed.
    pub fn can_fold(&self) -> bool {
        self.fold_params().is_some()
    }

    /// Committed `(epoch, period)` pair, if both are set.
    pub fn fold_params(&self) -> Option<(f64, f64)> {
        match (self.first_placed, self.period_placed, self.epoch, self.period) {
            (true, true, Some(epoch), Some(period)) => Some((epoch, period)),
            _ => None,
        }
    }

    /// Pointer moved to time-axis coordinate `x`.
    ///
    /// Updates the epoch preview until the first marker is committed, then
    /// the period preview until the period is committed. Ignored while folded
    /// or once both are placed.
    pub fn pointer_moved(&mut self, x: f64) {
        if self.folded || !x.is_finite() {
            return;
        }
        if !self.first_placed {
            self.preview_epoch = Some(self.round_preview(x));
        } else if !self.period_placed {
            if let Some(epoch) = self.epoch {
                self.preview_period = Some(self.round_preview((epoch - x).abs()));
            }
        }
    }

    /// Commits whatever is currently previewed.
    ///
    /// A click with nothing previewed, or with a zero period preview, does
    /// nothing. Returns the phase after the click.
    pub fn clicked(&mut self) -> MarkerPhase {
        if self.folded {
            return self.phase();
        }
        if !self.first_placed {
            if let Some(epoch) = self.preview_epoch.take() {
                self.epoch = Some(epoch);
                self.first_placed = true;
                debug!("First transit placed at {}", epoch);
            }
        } else if !self.period_placed {
            if let Some(period) = self.preview_period.filter(|p| *p > 0.0) {
                self.preview_period = None;
                self.period = Some(period);
                self.period_placed = true;
                debug!("Period placed: {}", period);
                self.recompute_repeats();
            }
        }
        self.phase()
    }

    /// The epoch and period fields were edited directly.
    ///
    /// `None` stands for an empty field. The fields then fully determine the
    /// markers: an epoch commits the first marker, an epoch plus a period
    /// commits both, and an empty epoch clears everything.
    ///
    /// While folded, two values simply replace the fold parameters; an empty
    /// field leaves fold mode and applies the edit unfolded.
    ///
    /// # Returns
    /// * `Err(InvalidInput)` - If the epoch is not finite or the period is not
    ///   positive. The state is left unchanged.
    pub fn edit_fields(&mut self, epoch: Option<f64>, period: Option<f64>) -> Result<()> {
        if let Some(e) = epoch {
            if !e.is_finite() {
                return Err(TransitError::invalid(format!("epoch must be finite, got {e}")));
            }
        }
        if let Some(p) = period {
            if !(p.is_finite() && p > 0.0) {
                return Err(TransitError::invalid(format!("period must be positive, got {p}")));
            }
        }

        if self.folded {
            if let (Some(e), Some(p)) = (epoch, period) {
                self.epoch = Some(e);
                self.period = Some(p);
                debug!("Refolding at epoch {} period {}", e, p);
                return Ok(());
            }
            self.clear();
        }

        self.preview_epoch = None;
        self.preview_period = None;
        match epoch {
            Some(e) => {
                self.epoch = Some(e);
                self.first_placed = true;
                self.period = period;
                self.period_placed = period.is_some();
            }
            None => {
                self.epoch = None;
                self.period = None;
                self.first_placed = false;
                self.period_placed = false;
            }
        }
        self.recompute_repeats();
        Ok(())
    }

    /// Restores a saved candidate. Always leaves fold mode.
    pub fn load_entry(&mut self, entry: &CatalogEntry) {
        self.clear();
        self.epoch = Some(entry.epoch);
        self.first_placed = true;
        if let Some(period) = entry.period {
            self.period = Some(period);
            self.period_placed = true;
        }
        self.recompute_repeats();
    }

    /// Back to `Empty`, unfolded.
    pub fn clear(&mut self) {
        self.epoch = None;
        self.period = None;
        self.first_placed = false;
        self.period_placed = false;
        self.preview_epoch = None;
        self.preview_period = None;
        self.folded = false;
        self.repeats = Repeats::default();
    }

    /// Switches fold mode. Returns whether the view is now folded.
    ///
    /// # Returns
    /// * `Err(InvalidInput)` - When folding without both markers committed
    pub fn toggle_fold(&mut self) -> Result<bool> {
        if self.folded {
            self.folded = false;
            self.recompute_repeats();
            return Ok(false);
        }
        if !self.can_fold() {
            return Err(TransitError::invalid(
                "both the first transit and the period must be placed before folding",
            ));
        }
        self.folded = true;
        Ok(true)
    }

    /// The `(epoch, period)` to store for the current markers.
    ///
    /// # Returns
    /// * `Err(InvalidInput)` - If the first transit has not been placed
    pub fn save_candidate(&self) -> Result<(f64, Option<f64>)> {
        match (self.first_placed, self.epoch) {
            (true, Some(epoch)) => Ok((epoch, if self.period_placed { self.period } else { None })),
            _ => Err(TransitError::invalid(
                "offset of the first transit should be selected",
            )),
        }
    }

    /// Marker positions to draw, including live previews.
    pub fn layout(&self) -> MarkerLayout {
        if self.folded {
            return MarkerLayout {
                first: Some(0.0),
                repeats: Repeats::default(),
                folded: true,
            };
        }

        let first = self.epoch.or(self.preview_epoch);
        let repeats = match (self.period_placed, self.epoch, self.preview_period) {
            (true, _, _) => self.repeats.clone(),
            (false, Some(epoch), Some(preview)) => {
                Repeats::compute(epoch, preview, self.bounds, self.max_repeats_per_side)
            }
            _ => Repeats::default(),
        };

        MarkerLayout {
            first,
            repeats,
            folded: false,
        }
    }

    fn recompute_repeats(&mut self) {
        self.repeats = match (self.period_placed, self.epoch, self.period) {
            (true, Some(epoch), Some(period)) => {
                Repeats::compute(epoch, period, self.bounds, self.max_repeats_per_side)
            }
            _ => Repeats::default(),
        };
    }

    fn round_preview(&self, value: f64) -> f64 {
        match self.preview_decimals {
            Some(decimals) => {
                let scale = 10f64.powi(decimals as i32);
                (value * scale).round() / scale
            }
            None => value,
        }
    }
}
