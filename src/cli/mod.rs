//! cli
//!
//! Command-line interface layer for repowatch.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Load configuration and build the registry
//! - Delegate to command handlers

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::Config;
use crate::repo::Registry;
use crate::ui::output::Verbosity;

/// Execution context shared by command handlers.
#[derive(Debug)]
pub struct Context {
    /// Directory commands run in
    pub cwd: PathBuf,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Registry handing out repository handles
    pub registry: Registry,
}

impl Context {
    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let cwd = match cli.cwd.clone() {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let loaded = Config::load().context("Failed to load configuration")?;
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), "loaded config");
    }

    let ctx = Context {
        cwd,
        verbosity: Verbosity::from_flags(cli.quiet),
        registry: Registry::from_config(&loaded.config),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "repowatch=debug" } else { "repowatch=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
