//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves its path arguments against the context's directory
//! 2. Acquires the repository through the context's registry
//! 3. Formats and displays output
//!
//! Handlers never write to the repository.

mod diff;
mod root;
mod status;
mod watch;

// Re-export command functions for testing and direct invocation
pub use diff::{hunk, lines};
pub use root::root;
pub use status::status;
pub use watch::watch;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::paths;
use crate::repo::SharedRepository;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Root { path } => root::root(ctx, path.as_deref()),
        Command::Status { json } => status::status(ctx, json),
        Command::Lines { file, json } => diff::lines(ctx, &file, json),
        Command::Hunk { file, line } => diff::hunk(ctx, &file, line),
        Command::Watch { count, interval_ms } => watch::watch(ctx, count, interval_ms),
    }
}

/// Acquire the repository containing `path`.
fn acquire(ctx: &Context, path: &Path) -> Result<SharedRepository> {
    let path = ctx.resolve(path);
    ctx.registry
        .acquire(&path)
        .with_context(|| format!("Failed to open repository at '{}'", path.display()))
}

/// Path of `file` relative to the repository's work tree.
fn work_relative(repo: &SharedRepository, file: &Path) -> Result<PathBuf> {
    let file = std::fs::canonicalize(file)
        .with_context(|| format!("Failed to resolve '{}'", file.display()))?;
    let work = paths::canonicalize_or_keep(repo.work_path());

    file.strip_prefix(&work)
        .map(Path::to_path_buf)
        .with_context(|| {
            format!(
                "'{}' is outside the work tree '{}'",
                file.display(),
                work.display()
            )
        })
}
