//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [backend]
//! object_caching = true
//! strict_hash_verification = true
//!
//! [status]
//! include_untracked = true
//! include_ignored = true
//! recurse_untracked_dirs = true
//!
//! [watch]
//! enabled = true
//! recursive = true
//! ```
//!
//! # Validation
//!
//! Values are checked after parsing; contradictory combinations are
//! rejected rather than silently resolved. An unset
//! `recurse_untracked_dirs` follows `include_untracked`.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::git::WalkOptions;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Process-wide backend options
    pub backend: BackendConfig,

    /// Status walk options
    pub status: StatusConfig,

    /// Metadata directory watching
    pub watch: WatchConfig,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.status.validate()
    }
}

/// Process-global libgit2 options, applied once at init.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Keep decoded objects in libgit2's object cache
    pub object_caching: bool,

    /// Verify object hashes when reading from the object database
    pub strict_hash_verification: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            object_caching: true,
            strict_hash_verification: true,
        }
    }
}

/// Which entries status walks report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Report untracked files
    pub include_untracked: bool,

    /// Report ignored files
    pub include_ignored: bool,

    /// Descend into untracked directories; unset means "when untracked
    /// files are reported"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurse_untracked_dirs: Option<bool>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        let walk = WalkOptions::default();
        Self {
            include_untracked: walk.include_untracked,
            include_ignored: walk.include_ignored,
            recurse_untracked_dirs: None,
        }
    }
}

impl StatusConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.recurse_untracked_dirs == Some(true) && !self.include_untracked {
            return Err(ConfigError::InvalidValue(
                "status.recurse_untracked_dirs requires status.include_untracked".to_string(),
            ));
        }
        Ok(())
    }

    /// The walk options these settings describe.
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            include_untracked: self.include_untracked,
            include_ignored: self.include_ignored,
            recurse_untracked_dirs: self
                .recurse_untracked_dirs
                .unwrap_or(self.include_untracked),
        }
    }
}

/// Metadata directory watching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Install a watch at all; when off, status is cached until
    /// invalidated explicitly
    pub enabled: bool,

    /// Watch subdirectories (`refs/`, `logs/`) as well
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recursive: true,
        }
    }
}
