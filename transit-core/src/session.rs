//! # Session Module
//!
//! Owns everything tied to the currently open light curve: the series, its
//! marker state, its saved candidates, and the derived fold/detrend arrays.
//! Opening a new file flushes and replaces all of it at once.
//!
//! The presentation layer feeds pointer and field events in and pulls a
//! [`PlotFrame`] out after each one.

use crate::catalog::{CatalogEntry, TransitCatalog};
use crate::config::TransitConfig;
use crate::detrend::detrend_series;
use crate::error::{Result, TransitError};
use crate::fold::fold_series;
use crate::markers::{MarkerLayout, TransitMarkerEngine};
use crate::series::TimeSeries;
use crate::source::{LoadedSeries, load_series, source_for_path};
use crate::store::CatalogStore;
use log::{debug, info};
use std::path::Path;

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFrame {
    /// Raw or folded time.
    pub x: Vec<f64>,
    /// Raw or detrended flux.
    pub y: Vec<f64>,
    pub title: Option<String>,
    pub folded: bool,
    pub detrended: bool,
    pub markers: MarkerLayout,
}

/// State owned per open light curve.
#[derive(Debug)]
struct ActiveSeries {
    loaded: LoadedSeries,
    markers: TransitMarkerEngine,
    catalog: TransitCatalog,
    detrended: Option<Vec<f64>>,
    folded_time: Option<Vec<f64>>,
}

impl ActiveSeries {
    /// Keeps the folded time axis in step with the marker engine.
    fn refresh_fold(&mut self) -> Result<()> {
        self.folded_time = match (self.markers.is_folded(), self.markers.fold_params()) {
            (true, Some((epoch, period))) => {
                Some(fold_series(&self.loaded.series, epoch, period)?)
            }
            _ => None,
        };
        Ok(())
    }
}

/// The running application's single light curve session.
#[derive(Debug)]
pub struct Session {
    config: TransitConfig,
    store: CatalogStore,
    detrend: bool,
    active: Option<ActiveSeries>,
}

impl Session {
    pub fn new(config: TransitConfig) -> Self {
        let store = CatalogStore::new(config.cache_dir.clone());
        Self {
            config,
            store,
            detrend: false,
            active: None,
        }
    }

    pub fn config(&self) -> &TransitConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn series(&self) -> Option<&TimeSeries> {
        self.active.as_ref().map(|a| &a.loaded.series)
    }

    /// Content hash of the open file.
    pub fn hash(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.loaded.hash.as_str())
    }

    pub fn markers(&self) -> Option<&TransitMarkerEngine> {
        self.active.as_ref().map(|a| &a.markers)
    }

    pub fn catalog(&self) -> Option<&TransitCatalog> {
        self.active.as_ref().map(|a| &a.catalog)
    }

    pub fn is_detrending(&self) -> bool {
        self.detrend
    }

    /// Reads a light curve file and opens it.
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let source = source_for_path(path)?;
        let loaded = load_series(source.as_ref())?;
        self.open(loaded)
    }

    /// Replaces the open light curve.
    ///
    /// Builds the new file's state first, then flushes the previous catalog
    /// and swaps. If the flush fails the previous file stays open. Reopening
    /// the same content keeps the in-memory catalog.
    pub fn open(&mut self, loaded: LoadedSeries) -> Result<()> {
        let markers = TransitMarkerEngine::new(loaded.series.bounds(), &self.config);
        let detrended = if self.detrend {
            Some(detrend_series(&loaded.series)?)
        } else {
            None
        };
        let catalog = match &self.active {
            Some(active) if active.loaded.hash == loaded.hash => active.catalog.clone(),
            _ => self.store.load(&loaded.hash),
        };

        self.flush()?;
        if let Some(previous) = self.active.take() {
            debug!("Closed {}", previous.loaded.path.display());
        }

        info!(
            "Opened {} with {} saved entries",
            loaded.path.display(),
            catalog.len()
        );
        self.active = Some(ActiveSeries {
            loaded,
            markers,
            catalog,
            detrended,
            folded_time: None,
        });
        Ok(())
    }

    /// Writes the open file's catalog to the cache.
    pub fn flush(&self) -> Result<()> {
        match &self.active {
            Some(active) => self.store.flush(&active.loaded.hash, &active.catalog),
            None => Ok(()),
        }
    }

    /// Flushes and drops the open file. Call before exiting.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        if let Some(active) = self.active.take() {
            debug!("Closed {}", active.loaded.path.display());
        }
        Ok(())
    }

    /// Turns flux detrending on or off for this and later files.
    pub fn set_detrend(&mut self, on: bool) -> Result<()> {
        self.detrend = on;
        if let Some(active) = self.active.as_mut() {
            active.detrended = if on {
                Some(detrend_series(&active.loaded.series)?)
            } else {
                None
            };
        }
        Ok(())
    }

    /// Pointer moved over the plot. Ignored with no file open.
    pub fn pointer_moved(&mut self, x: f64) {
        if let Some(active) = self.active.as_mut() {
            active.markers.pointer_moved(x);
        }
    }

    /// Plot clicked. Ignored with no file open.
    pub fn clicked(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.markers.clicked();
        }
    }

    /// Epoch/period fields edited; `None` is an empty field.
    pub fn edit_fields(&mut self, epoch: Option<f64>, period: Option<f64>) -> Result<()> {
        let active = self.active_mut()?;
        active.markers.edit_fields(epoch, period)?;
        active.refresh_fold()
    }

    /// Folds or unfolds the plot. Returns whether it is now folded.
    pub fn toggle_fold(&mut self) -> Result<bool> {
        let active = self.active_mut()?;
        let folded = active.markers.toggle_fold()?;
        active.refresh_fold()?;
        Ok(folded)
    }

    /// Removes every marker and unfolds.
    pub fn clear_markers(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.markers.clear();
            active.folded_time = None;
        }
    }

    /// Saves the current markers as a candidate, then clears them.
    ///
    /// Returns the new entry's index.
    pub fn save_candidate(&mut self) -> Result<usize> {
        let active = self.active_mut()?;
        let (epoch, period) = active.markers.save_candidate()?;
        let index = active.catalog.save(Some(epoch), period)?;
        active.markers.clear();
        active.folded_time = None;
        Ok(index)
    }

    /// Deletes a saved candidate.
    pub fn delete_entry(&mut self, index: usize) -> Result<CatalogEntry> {
        self.active_mut()?.catalog.remove(index)
    }

    /// Restores a saved candidate's markers, unfolded.
    pub fn load_entry(&mut self, index: usize) -> Result<()> {
        let active = self.active_mut()?;
        let entry = *active.catalog.get(index)?;
        active.markers.load_entry(&entry);
        active.folded_time = None;
        Ok(())
    }

    /// What to draw now, or `None` with no file open.
    pub fn frame(&self) -> Option<PlotFrame> {
        let active = self.active.as_ref()?;
        let series = &active.loaded.series;

        let x = active
            .folded_time
            .clone()
            .unwrap_or_else(|| series.time().to_vec());
        let y = active
            .detrended
            .clone()
            .unwrap_or_else(|| series.flux().to_vec());

        Some(PlotFrame {
            x,
            y,
            title: series.title(),
            folded: active.folded_time.is_some(),
            detrended: active.detrended.is_some(),
            markers: active.markers.layout(),
        })
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSeries> {
        self.active
            .as_mut()
            .ok_or_else(|| TransitError::invalid("no light curve is open"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerPhase;
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn loaded(hash: &str) -> LoadedSeries {
        let time: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let flux = vec![1.0; time.len()];
        LoadedSeries {
            series: TimeSeries::new(time, flux, "000757450").unwrap(),
            hash: hash.to_string(),
            path: PathBuf::from(format!("{hash}.csv")),
        }
    }

    fn session(dir: &TempDir) -> Session {
        Session::new(TransitConfig {
            cache_dir: dir.path().to_path_buf(),
            ..TransitConfig::default()
        })
    }

    #[test]
    fn test_events_without_file_are_ignored_or_rejected() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);

        session.pointer_moved(10.0);
        session.clicked();
        assert!(session.frame().is_none());
        assert!(matches!(
            session.edit_fields(Some(1.0), None),
            Err(TransitError::InvalidInput(_))
        ));
        assert!(session.save_candidate().is_err());
    }

    #[test]
    fn test_fold_frame() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("aaaa")).unwrap();

        session.edit_fields(Some(50.0), Some(10.0)).unwrap();
        assert!(session.toggle_fold().unwrap());

        let frame = session.frame().unwrap();
        assert!(frame.folded);
        assert_eq!(frame.markers.first, Some(0.0));
        assert!(frame.x.iter().all(|x| x.abs() <= 5.0 + 1e-9));
        assert_abs_diff_eq!(frame.x[53], 3.0);

        // Editing while folded refolds without leaving fold mode.
        session.edit_fields(Some(50.0), Some(20.0)).unwrap();
        let frame = session.frame().unwrap();
        assert!(frame.folded);
        assert_abs_diff_eq!(frame.x[63], -7.0);

        assert!(!session.toggle_fold().unwrap());
        let frame = session.frame().unwrap();
        assert_eq!(frame.x[63], 63.0);
        assert_eq!(frame.markers.first, Some(50.0));
    }

    #[test]
    fn test_detrend_persists_across_files() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("aaaa")).unwrap();
        session.set_detrend(true).unwrap();
        assert!(session.frame().unwrap().detrended);

        session.open(loaded("bbbb")).unwrap();
        let frame = session.frame().unwrap();
        assert!(frame.detrended);
        assert_eq!(frame.y.len(), 101);

        session.set_detrend(false).unwrap();
        assert!(!session.frame().unwrap().detrended);
    }

    #[test]
    fn test_save_clears_markers_and_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("aaaa")).unwrap();

        session.pointer_moved(42.0);
        session.clicked();
        assert_eq!(session.save_candidate().unwrap(), 0);
        assert_eq!(session.markers().unwrap().phase(), MarkerPhase::Empty);

        session.edit_fields(Some(50.0), Some(10.0)).unwrap();
        assert_eq!(session.save_candidate().unwrap(), 1);

        // Switching files flushes; coming back restores the entries.
        session.open(loaded("bbbb")).unwrap();
        assert!(session.catalog().unwrap().is_empty());
        session.open(loaded("aaaa")).unwrap();

        let catalog = session.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().period, None);
        assert_eq!(catalog.get(1).unwrap().period, Some(10.0));
    }

    #[test]
    fn test_load_and_delete_entry() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("aaaa")).unwrap();
        session.edit_fields(Some(50.0), Some(25.0)).unwrap();
        session.save_candidate().unwrap();

        session.edit_fields(Some(10.0), Some(3.0)).unwrap();
        session.toggle_fold().unwrap();
        session.load_entry(0).unwrap();

        let frame = session.frame().unwrap();
        assert!(!frame.folded);
        assert_eq!(frame.markers.first, Some(50.0));
        assert_eq!(frame.markers.repeats.len(), 4);

        let removed = session.delete_entry(0).unwrap();
        assert_eq!(removed.epoch, 50.0);
        assert!(matches!(
            session.load_entry(0),
            Err(TransitError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_malformed_cache_line_does_not_block_open() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        let text = "Epoch: 1.5 | Period: 2\nEpoch: 1,5 | Period: -\n";
        std::fs::write(dir.path().join("aaaa"), text).unwrap();

        session.open(loaded("aaaa")).unwrap();

        let catalog = session.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().epoch, 1.5);
        let backup = std::fs::read_to_string(dir.path().join("aaaa.malformed")).unwrap();
        assert_eq!(backup, text);

        session.close().unwrap();
        let rewritten = std::fs::read_to_string(dir.path().join("aaaa")).unwrap();
        assert_eq!(rewritten, "Epoch: 1.5 | Period: 2\n");
    }

    #[test]
    fn test_failed_flush_keeps_previous_file_open() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("cache");
        std::fs::write(&blocker, "").unwrap();
        let mut session = Session::new(TransitConfig {
            cache_dir: blocker,
            ..TransitConfig::default()
        });
        session.open(loaded("aaaa")).unwrap();
        session.edit_fields(Some(1.5), None).unwrap();
        session.save_candidate().unwrap();

        assert!(session.open(loaded("bbbb")).is_err());

        assert_eq!(session.hash(), Some("aaaa"));
        assert_eq!(session.catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_reopen_same_content_keeps_unflushed_entries() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("aaaa")).unwrap();
        session.edit_fields(Some(1.5), None).unwrap();
        session.save_candidate().unwrap();

        session.open(loaded("aaaa")).unwrap();

        assert_eq!(session.catalog().unwrap().len(), 1);
        assert_eq!(session.markers().unwrap().phase(), MarkerPhase::Empty);
    }

    #[test]
    fn test_close_flushes() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        session.open(loaded("cccc")).unwrap();
        session.edit_fields(Some(1.5), None).unwrap();
        session.save_candidate().unwrap();

        session.close().unwrap();

        assert!(!session.is_loaded());
        let text = std::fs::read_to_string(dir.path().join("cccc")).unwrap();
        assert_eq!(text, "Epoch: 1.5 | Period: -\n");
    }
}
