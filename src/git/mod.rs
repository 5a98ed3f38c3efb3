//! git
//!
//! Single interface for all version-control backend access.
//!
//! # Architecture
//!
//! This module is the **only doorway** to the backend. No other module
//! calls `git2` for repository operations; they go through the
//! [`Backend`] / [`BackendRepo`] traits instead, which keeps the cache
//! layers testable against [`mock::MockBackend`].
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Status walks and flag classification
//! - `HEAD:<path>` blob lookup
//! - Blob-to-buffer diffs with zero context
//! - Process-wide init and the backend lock
//! - Error normalization into [`GitError`]
//!
//! # Example
//!
//! ```no_run
//! use repowatch::git::{backend_lock, Backend, Git2Backend, WalkOptions};
//! use std::path::Path;
//!
//! let backend = Git2Backend::default();
//! let root = {
//!     let _guard = backend_lock();
//!     backend.discover(Path::new("."))?
//! };
//! let repo = {
//!     let _guard = backend_lock();
//!     backend.open(&root)?
//! };
//!
//! let _guard = backend_lock();
//! repo.walk_status(&WalkOptions::default(), &mut |path, flags| {
//!     println!("{:?} {}", flags, path.display());
//! })?;
//! # Ok::<(), repowatch::git::GitError>(())
//! ```

mod error;
mod git2_backend;
mod init;
mod interface;
pub mod mock;
mod status;

pub use error::{last_error_message, GitError};
pub use git2_backend::Git2Backend;
pub use init::{backend_lock, ensure_initialized, is_initialized};
pub use interface::{Backend, BackendRepo, DiffHunk, DiffLine, DiffOptions, WalkOptions};
pub use status::FileStatus;
