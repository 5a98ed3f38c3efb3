//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first match wins:
//! 1. `$REPOWATCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repowatch/config.toml`
//! 3. `~/.repowatch/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use repowatch::core::config::Config;
//!
//! let result = Config::load().unwrap();
//! let config = result.config;
//!
//! println!("watching: {}", config.watch_enabled());
//! println!("walk: {:?}", config.walk_options());
//! ```

pub mod schema;

pub use schema::{BackendConfig, FileConfig, StatusConfig, WatchConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::git::WalkOptions;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REPOWATCH_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Where it was loaded from, if a file was found.
    pub path: Option<PathBuf>,
}

/// Loaded configuration with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    file: FileConfig,
}

impl Config {
    /// Wrap an already-parsed file.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file })
    }

    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read,
    /// parsed, or validated.
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        match Self::find() {
            Some(path) => {
                let config = Self::read(&path)?;
                Ok(ConfigLoadResult {
                    config,
                    path: Some(path),
                })
            }
            None => Ok(ConfigLoadResult {
                config: Config::default(),
                path: None,
            }),
        }
    }

    /// Locate the config file, if any.
    fn find() -> Option<PathBuf> {
        // 1. Check $REPOWATCH_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/repowatch/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repowatch/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.repowatch/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".repowatch/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read, parse, and validate one config file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_file(file)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Process-global backend options.
    pub fn backend(&self) -> &BackendConfig {
        &self.file.backend
    }

    /// Options for status walks.
    pub fn walk_options(&self) -> WalkOptions {
        self.file.status.walk_options()
    }

    /// Whether handles watch their metadata directory.
    pub fn watch_enabled(&self) -> bool {
        self.file.watch.enabled
    }

    /// Whether the watch covers subdirectories.
    pub fn watch_recursive(&self) -> bool {
        self.file.watch.recursive
    }
}
