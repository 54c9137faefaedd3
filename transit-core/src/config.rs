//! # Configuration Module
//!
//! User-tunable settings, persisted as JSON. Every field has a default, so a
//! partial or missing file is fine.

use crate::error::{Result, TransitError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Repeat markers drawn on each side of the first transit.
pub const DEFAULT_MAX_REPEATS_PER_SIDE: usize = 16;
/// Decimals kept when a hover position becomes an epoch or period preview.
pub const DEFAULT_PREVIEW_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    /// Directory holding one catalog file per light curve.
    pub cache_dir: PathBuf,
    /// Capacity of each side of the repeat marker list.
    pub max_repeats_per_side: usize,
    /// Rounding applied to hover previews; `None` keeps full precision.
    pub preview_decimals: Option<u32>,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            max_repeats_per_side: DEFAULT_MAX_REPEATS_PER_SIDE,
            preview_decimals: Some(DEFAULT_PREVIEW_DECIMALS),
        }
    }
}

impl TransitConfig {
    /// Loads a config file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text).map_err(|e| {
            TransitError::invalid(format!("config {} is not valid: {e}", path.display()))
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TransitError::invalid(format!("cannot encode config: {e}")))?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = TransitConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, TransitConfig::default());
        assert_eq!(config.max_repeats_per_side, 16);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transit.json");
        fs::write(&path, r#"{ "max_repeats_per_side": 4, "preview_decimals": null }"#).unwrap();

        let config = TransitConfig::load(&path).unwrap();

        assert_eq!(config.max_repeats_per_side, 4);
        assert_eq!(config.preview_decimals, None);
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transit.json");
        let config = TransitConfig {
            cache_dir: dir.path().join("catalogs"),
            max_repeats_per_side: 8,
            preview_decimals: Some(3),
        };

        config.save(&path).unwrap();

        assert_eq!(TransitConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transit.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(TransitConfig::load(&path), Err(TransitError::InvalidInput(_))));
    }
}
