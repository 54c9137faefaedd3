//! # Catalog Store Module
//!
//! Persists a [`TransitCatalog`] as a plain text file inside a cache
//! directory. The file name is the content hash of the light curve, so a
//! source file maps to the same catalog wherever it lives on disk.

use crate::catalog::TransitCatalog;
use crate::error::{Result, TransitError};
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads and writes catalog files under one cache directory.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    cache_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the catalog file for a source file's content hash.
    pub fn path_for(&self, hash: &str) -> PathBuf {
        self.cache_dir.join(hash)
    }

    /// Reads the catalog for `hash`.
    ///
    /// # Returns
    /// * `Err(MissingCache)` - If no catalog has been flushed for this hash yet
    /// * `Err(MalformedEntry)` - If the file contains an unparsable line
    pub fn read(&self, hash: &str) -> Result<TransitCatalog> {
        let path = self.path_for(hash);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TransitError::MissingCache(path));
            }
            Err(e) => return Err(e.into()),
        };
        TransitCatalog::from_text(&text)
    }

    /// Loads the catalog for `hash`. Never fails: a load problem means no
    /// saved entries.
    ///
    /// A missing file is the normal first-open case. An unreadable file
    /// starts empty. Malformed lines are skipped and the good ones kept; the
    /// file as found is copied to `<hash>.malformed` first, since the next
    /// flush rewrites it without those lines.
    pub fn load(&self, hash: &str) -> TransitCatalog {
        let path = self.path_for(hash);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No catalog at {}, starting empty", path.display());
                return TransitCatalog::new();
            }
            Err(e) => {
                warn!("Could not read catalog {}: {}. Starting empty", path.display(), e);
                return TransitCatalog::new();
            }
        };

        let (catalog, rejected) = TransitCatalog::from_text_lossy(&text);
        if !rejected.is_empty() {
            for line in &rejected {
                warn!("Skipping malformed entry in {}: {}", path.display(), line);
            }
            let backup = self.backup_path_for(hash);
            match fs::copy(&path, &backup) {
                Ok(_) => warn!("Original catalog kept as {}", backup.display()),
                Err(e) => warn!("Could not back up catalog to {}: {}", backup.display(), e),
            }
        }

        info!("Loaded {} saved transit entries for {}", catalog.len(), hash);
        catalog
    }

    /// Where [`load`](Self::load) copies a catalog that had malformed lines.
    pub fn backup_path_for(&self, hash: &str) -> PathBuf {
        self.path_for(hash).with_extension("malformed")
    }

    /// Writes `catalog` for `hash`, overwriting any previous file.
    ///
    /// An empty catalog with no file on disk writes nothing. An empty catalog
    /// over an existing file truncates it, so deleting every entry sticks.
    pub fn flush(&self, hash: &str, catalog: &TransitCatalog) -> Result<()> {
        let path = self.path_for(hash);
        if catalog.is_empty() && !path.exists() {
            debug!("Nothing to flush for {}", hash);
            return Ok(());
        }

        fs::create_dir_all(&self.cache_dir).inspect_err(|e| {
            warn!(
                "Could not create cache directory {}: {}",
                self.cache_dir.display(),
                e
            )
        })?;
        fs::write(&path, catalog.to_text())?;
        info!("Flushed {} transit entries to {}", catalog.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HASH: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn test_missing_cache_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());

        assert!(matches!(store.read(HASH), Err(TransitError::MissingCache(_))));
        assert!(store.load(HASH).is_empty());
    }

    #[test]
    fn test_flush_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().join("nested").join("cache"));

        let mut catalog = TransitCatalog::new();
        catalog.save(Some(131.51), Some(3.54)).unwrap();
        catalog.save(Some(12.34), None).unwrap();
        store.flush(HASH, &catalog).unwrap();

        let text = fs::read_to_string(store.path_for(HASH)).unwrap();
        assert_eq!(text, "Epoch: 131.51 | Period: 3.54\nEpoch: 12.34 | Period: -\n");
        assert_eq!(store.load(HASH), catalog);
    }

    #[test]
    fn test_empty_flush_without_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());

        store.flush(HASH, &TransitCatalog::new()).unwrap();

        assert!(!store.path_for(HASH).exists());
    }

    #[test]
    fn test_empty_flush_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());

        let mut catalog = TransitCatalog::new();
        catalog.save(Some(1.0), None).unwrap();
        store.flush(HASH, &catalog).unwrap();

        catalog.remove(0).unwrap();
        store.flush(HASH, &catalog).unwrap();

        assert!(store.load(HASH).is_empty());
    }

    #[test]
    fn test_malformed_line_is_skipped_and_backed_up() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path());
        let text = "Epoch: 1.5 | Period: 2\nEpoch: 1,5 | Period: -\n";
        fs::write(store.path_for(HASH), text).unwrap();

        assert!(matches!(store.read(HASH), Err(TransitError::MalformedEntry(_))));

        let catalog = store.load(HASH);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().period, Some(2.0));
        assert_eq!(fs::read_to_string(store.backup_path_for(HASH)).unwrap(), text);
    }

    #[test]
    fn test_unreadable_cache_loads_empty() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("cache");
        fs::write(&blocker, "").unwrap();
        let store = CatalogStore::new(&blocker);

        assert!(store.load(HASH).is_empty());
    }
}
