use crate::error::AppError;
use crate::search::SearchConfig;
use crate::tariff::TariffConfig;
use crate::tracking::TrackingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything tunable, one section per engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tariffs: TariffConfig,
    pub search: SearchConfig,
    pub tracking: TrackingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.tariffs.validate()?;
        self.search.validate()?;
        if self.tracking.max_fixes_per_package == 0 {
            return Err(AppError::Config(
                "tracking.max_fixes_per_package must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("shalom").join("config.json"))
}

/// Load configuration from `path`, or from the default location
///
/// A missing file yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: AppConfig = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
