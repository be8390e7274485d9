//! Configuration management for fleetstatus.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fleetstatus";

/// Default photo directory name inside the data directory.
const PHOTOS_DIR_NAME: &str = "photos";

/// Prefix of the environment variables read by [`Config::load_from`].
pub const ENV_PREFIX: &str = "FLEETSTATUS_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLEETSTATUS_`, `__` between
///    section and key), plus the bare `DATABASE_URI` / `DATABASE_NAME`
/// 2. TOML config file at `~/.config/fleetstatus/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store connection.
    pub database: DatabaseConfig,
    /// Terminal rendering.
    pub display: DisplayConfig,
    /// Vehicle photo hosting.
    pub photos: PhotoConfig,
}

/// Document store connection settings. Both fields are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store location: a database file path, or `:memory:`.
    pub uri: String,
    /// Logical database name that namespaces the collections.
    pub name: String,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Title printed above the dashboard.
    pub app_title: String,
    /// `strftime` format used for dates in tables.
    pub date_format: String,
}

/// Photo-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Directory receiving uploaded photos.
    /// Defaults to `~/.local/share/fleetstatus/photos`
    pub directory: Option<PathBuf>,
    /// Width photos are cropped to.
    pub width: u32,
    /// Height photos are cropped to.
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            app_title: "Fleet Status".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            directory: None,
            width: 800,
            height: 600,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config: Config = Self::figment(config_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_unchecked(config_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self::figment(config_path).extract()?)
    }

    fn figment(config_path: Option<PathBuf>) -> Figment {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URI", "DATABASE_NAME"])
                    .map(|key| key.as_str().replacen('_', ".", 1).into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database.uri.trim().is_empty() {
            return Err(Error::config_validation(
                "database.uri is required (set it in the config file or DATABASE_URI)",
            ));
        }

        if self.database.name.trim().is_empty() {
            return Err(Error::config_validation(
                "database.name is required (set it in the config file or DATABASE_NAME)",
            ));
        }

        if self.photos.width == 0 || self.photos.height == 0 {
            return Err(Error::config_validation(format!(
                "photo dimensions must be greater than 0 (got {}x{})",
                self.photos.width, self.photos.height
            )));
        }

        if StrftimeItems::new(&self.display.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::config_validation(format!(
                "invalid date_format: {}",
                self.display.date_format
            )));
        }

        Ok(())
    }

    /// Get the photo directory, resolving defaults if not set.
    #[must_use]
    pub fn photos_dir(&self) -> PathBuf {
        self.photos
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(PHOTOS_DIR_NAME))
    }

    /// Whether the configured store lives in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        Path::new(&self.database.uri).as_os_str() == crate::store::MEMORY_URI
    }
}
