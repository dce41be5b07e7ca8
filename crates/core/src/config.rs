//! Predictor configuration
//!
//! Settings are read from a JSON file, with every field optional, and may
//! then be overridden from the environment:
//!
//! - `WIND_DATASET_DIR` replaces [`PredictorConfig::dataset_directory`]
//! - `WIND_OUTPUT_DIR` replaces [`PredictorConfig::output_directory`]

use crate::dataset::{
    GridLayout, LatestCache, OpenOptions, DEFAULT_DIRECTORY, DEFAULT_FORECAST_HOURS,
};
use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the dataset directory
pub const ENV_DATASET_DIR: &str = "WIND_DATASET_DIR";

/// Environment variable naming the output directory
pub const ENV_OUTPUT_DIR: &str = "WIND_OUTPUT_DIR";

/// Where datasets live and how they are opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Directory scanned for datasets
    pub dataset_directory: PathBuf,
    /// Directory new datasets are written to
    pub output_directory: PathBuf,
    /// Horizon (hours) of datasets opened with a fixed layout or created
    pub forecast_hours: u32,
    /// Lifetime of the latest-dataset cache entry
    pub cache_ttl_secs: u64,
    /// Derive the horizon of existing files from their size
    ///
    /// Only affects opens made through [`PredictorConfig::open_options`];
    /// the latest-dataset cache always derives the horizon.
    pub derive_horizon: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            dataset_directory: PathBuf::from(DEFAULT_DIRECTORY),
            output_directory: PathBuf::from(DEFAULT_DIRECTORY),
            forecast_hours: DEFAULT_FORECAST_HOURS,
            cache_ttl_secs: 60,
            derive_horizon: true,
        }
    }
}

impl PredictorConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `Config` if it is not
    /// valid JSON for this structure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| DatasetError::Config(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), "Loaded predictor configuration");
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| DatasetError::Config(e.to_string()))?;
        fs::write(path, contents).map_err(|e| DatasetError::io(path, e))
    }

    /// Apply `WIND_DATASET_DIR` and `WIND_OUTPUT_DIR` from the process
    /// environment
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply directory overrides from `lookup`, keyed by environment
    /// variable name; empty values are ignored
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = value(ENV_DATASET_DIR) {
            debug!(key = ENV_DATASET_DIR, %dir, "Dataset directory overridden");
            self.dataset_directory = PathBuf::from(dir);
        }
        if let Some(dir) = value(ENV_OUTPUT_DIR) {
            debug!(key = ENV_OUTPUT_DIR, %dir, "Output directory overridden");
            self.output_directory = PathBuf::from(dir);
        }
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Layout for `forecast_hours`
    ///
    /// # Errors
    /// Returns `InvalidHorizon` if `forecast_hours` is not a multiple of 3
    pub fn layout(&self) -> Result<GridLayout> {
        GridLayout::new(self.forecast_hours)
    }

    /// Options for opening existing datasets under this configuration
    ///
    /// # Errors
    /// Returns `InvalidHorizon` as for [`PredictorConfig::layout`]
    pub fn open_options(&self) -> Result<OpenOptions> {
        Ok(OpenOptions::new()
            .derive_horizon(self.derive_horizon)
            .layout(self.layout()?))
    }

    /// A latest-dataset cache using the configured lifetime
    ///
    /// The cache opens with horizon derivation regardless of
    /// `derive_horizon`.
    pub fn cache(&self) -> LatestCache {
        LatestCache::new(self.cache_ttl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PredictorConfig::default();
        assert_eq!(config.dataset_directory, Path::new("/srv/wind-datasets"));
        assert_eq!(config.output_directory, config.dataset_directory);
        assert_eq!(config.forecast_hours, 192);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert!(config.derive_horizon);
    }

    #[test]
    fn test_overrides_replace_directories() {
        let config = PredictorConfig::default().apply_overrides(|key| match key {
            "WIND_DATASET_DIR" => Some("/tmp/wind".to_string()),
            "WIND_OUTPUT_DIR" => Some("/tmp/out".to_string()),
            _ => None,
        });
        assert_eq!(config.dataset_directory, Path::new("/tmp/wind"));
        assert_eq!(config.output_directory, Path::new("/tmp/out"));
    }

    #[test]
    fn test_empty_or_missing_overrides_are_ignored() {
        let config = PredictorConfig::default().apply_overrides(|key| {
            (key == ENV_DATASET_DIR).then(String::new)
        });
        assert_eq!(config, PredictorConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictor.json");
        fs::write(&path, r#"{ "forecast_hours": 72, "derive_horizon": false }"#).unwrap();

        let config = PredictorConfig::load(&path).unwrap();
        assert_eq!(config.forecast_hours, 72);
        assert!(!config.derive_horizon);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.layout().unwrap().shape()[0], 25);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictor.json");
        let config = PredictorConfig {
            dataset_directory: dir.path().to_path_buf(),
            cache_ttl_secs: 5,
            ..PredictorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PredictorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            PredictorConfig::load(dir.path().join("missing.json")),
            Err(DatasetError::Io { .. })
        ));

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ forecast_hours: ").unwrap();
        assert!(matches!(PredictorConfig::load(&path), Err(DatasetError::Config(_))));
    }

    #[test]
    fn test_invalid_horizon_rejected() {
        let config = PredictorConfig {
            forecast_hours: 10,
            ..PredictorConfig::default()
        };
        assert!(matches!(config.layout(), Err(DatasetError::InvalidHorizon(10))));
        assert!(config.open_options().is_err());
    }

    #[test]
    fn test_derive_horizon_only_governs_explicit_opens() {
        let dir = TempDir::new().unwrap();
        let t = Utc.with_ymd_and_hms(2014, 2, 1, 0, 0, 0).unwrap();
        Dataset::create(&t, dir.path(), GridLayout::new(0).unwrap()).unwrap();

        let config = PredictorConfig {
            forecast_hours: 3,
            derive_horizon: false,
            ..PredictorConfig::default()
        };
        let fixed = config.open_options().unwrap().open(&t, dir.path());
        assert!(matches!(fixed, Err(DatasetError::SizeMismatch { .. })));

        let latest = config.cache().latest(dir.path(), false).unwrap();
        assert_eq!(latest.forecast_hours(), 0);
    }
}
