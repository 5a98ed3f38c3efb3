//! git::error
//!
//! Typed failures for every backend call.
//!
//! libgit2 records a thread-global "last error" whenever a call returns a
//! nonzero status; `git2::Error` captures that slot at the moment of failure.
//! [`last_error_message`] reads it back out and each variant of [`GitError`]
//! carries it so callers see the backend's own wording.
//!
//! # Categories
//!
//! - [`GitError::OpenFailed`]: path is not a repository, or its watch could not be installed
//! - [`GitError::DiscoveryFailed`]: no repository in the path's ancestry
//! - [`GitError::NoBaseline`]: `HEAD` has no blob for the requested path
//! - [`GitError::Backend`]: any other nonzero backend status

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from backend operations.
///
/// None of these are retried internally. The caller decides whether a
/// failure is worth another attempt (for example after a stale handle).
#[derive(Debug, Clone, Error)]
pub enum GitError {
    /// The path could not be opened as a repository.
    #[error("failed to open repository at {path}: {message}")]
    OpenFailed {
        /// The path that was opened
        path: PathBuf,
        /// Backend error text
        message: String,
    },

    /// No repository was found in the path or any of its ancestors.
    #[error("no repository found for {path}: {message}")]
    DiscoveryFailed {
        /// The path discovery started from
        path: PathBuf,
        /// Backend error text
        message: String,
    },

    /// `HEAD` has no committed version of the path.
    ///
    /// This is the normal outcome for newly added files and means "nothing
    /// to diff against", not a broken repository.
    #[error("no committed version of {path} at HEAD: {message}")]
    NoBaseline {
        /// Path relative to the repository root
        path: PathBuf,
        /// Backend error text
        message: String,
    },

    /// Any other backend failure.
    #[error("{operation} failed: {message}")]
    Backend {
        /// What was being attempted (e.g. "status walk")
        operation: &'static str,
        /// Backend error text
        message: String,
    },
}

impl GitError {
    pub(crate) fn open(path: &Path, err: &git2::Error) -> Self {
        GitError::OpenFailed {
            path: path.to_path_buf(),
            message: last_error_message(Some(err)),
        }
    }

    pub(crate) fn discovery(path: &Path, err: &git2::Error) -> Self {
        GitError::DiscoveryFailed {
            path: path.to_path_buf(),
            message: last_error_message(Some(err)),
        }
    }

    pub(crate) fn no_baseline(path: &Path, err: &git2::Error) -> Self {
        GitError::NoBaseline {
            path: path.to_path_buf(),
            message: last_error_message(Some(err)),
        }
    }

    pub(crate) fn backend(operation: &'static str, err: &git2::Error) -> Self {
        GitError::Backend {
            operation,
            message: last_error_message(Some(err)),
        }
    }

    /// The backend's error text carried by this failure.
    pub fn message(&self) -> &str {
        match self {
            GitError::OpenFailed { message, .. }
            | GitError::DiscoveryFailed { message, .. }
            | GitError::NoBaseline { message, .. }
            | GitError::Backend { message, .. } => message,
        }
    }

    /// Whether this failure only means the file has no committed version.
    pub fn is_no_baseline(&self) -> bool {
        matches!(self, GitError::NoBaseline { .. })
    }
}

/// Human-readable text of the backend's last recorded error.
///
/// Returns the empty string when no error was recorded.
///
/// # Example
///
/// ```
/// use repowatch::git::last_error_message;
///
/// assert_eq!(last_error_message(None), "");
///
/// let err = git2::Error::from_str("reference 'HEAD' not found\n");
/// assert_eq!(last_error_message(Some(&err)), "reference 'HEAD' not found");
/// ```
pub fn last_error_message(err: Option<&git2::Error>) -> String {
    match err {
        Some(err) => err.message().trim_end().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_carried_by_every_variant() {
        let err = git2::Error::from_str("boom");
        let path = Path::new("src/lib.rs");

        assert_eq!(GitError::open(path, &err).message(), "boom");
        assert_eq!(GitError::discovery(path, &err).message(), "boom");
        assert_eq!(GitError::no_baseline(path, &err).message(), "boom");
        assert_eq!(GitError::backend("status walk", &err).message(), "boom");
    }

    #[test]
    fn display_formatting() {
        let err = GitError::Backend {
            operation: "status walk",
            message: "index is locked".to_string(),
        };
        assert_eq!(err.to_string(), "status walk failed: index is locked");

        let err = GitError::NoBaseline {
            path: PathBuf::from("new.txt"),
            message: "the path 'new.txt' does not exist in the given tree".to_string(),
        };
        assert!(err.to_string().starts_with("no committed version of new.txt"));
        assert!(err.is_no_baseline());
    }

    #[test]
    fn empty_when_nothing_recorded() {
        assert_eq!(last_error_message(None), "");
    }
}
