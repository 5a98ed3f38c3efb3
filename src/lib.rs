//! repowatch - Shared, cached access to Git repositories
//!
//! repowatch sits between editor-style tooling and libgit2. Any number of
//! threads can ask for the repository containing a path and get the same
//! handle back; the handle caches the work-tree status until the
//! repository's metadata changes on disk, and compares in-memory buffers
//! against the committed version of a file line by line.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface for the `repowatch` binary
//! - [`core`] - Configuration and path normalization
//! - [`git`] - The single doorway to libgit2: errors, init, backend traits
//! - [`repo`] - Registry, repository handles, status cache, diff snapshots
//! - [`watch`] - Filesystem change subscriptions
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. One live handle per repository root at a time
//! 2. Backend calls never run concurrently
//! 3. A cached status never predates the last observed metadata change
//! 4. A handle's watch is removed before the handle is destroyed
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let repo = repowatch::acquire_repository(Path::new("src/lib.rs"))?;
//! let status = repo.status()?;
//! for path in &status.modified {
//!     println!("M {}", path.display());
//! }
//! # Ok::<(), repowatch::git::GitError>(())
//! ```

pub mod cli;
pub mod core;
pub mod git;
pub mod repo;
pub mod ui;
pub mod watch;

use std::path::Path;

use git::GitError;
use repo::{Registry, SharedRepository};

/// Acquire the repository containing `path` from the process-wide registry.
///
/// The first call loads configuration and initializes the backend.
pub fn acquire_repository(path: &Path) -> Result<SharedRepository, GitError> {
    Registry::global().acquire(path)
}
