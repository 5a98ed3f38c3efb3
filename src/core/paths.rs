//! core::paths
//!
//! Path normalization for backend-reported paths.
//!
//! libgit2 reports directories with a trailing separator (`/repo/.git/`,
//! `/repo/`, `untracked-dir/`). Every path that crosses the backend seam is
//! run through [`normalize`] so that the same directory always compares and
//! hashes the same, which the registry relies on for its keys.
//!
//! File names are bytes, not text. Paths reported as raw bytes go through
//! [`normalize_bytes`], which never replaces invalid UTF-8.
//!
//! # Example
//!
//! ```
//! use repowatch::core::paths::{normalize, normalize_bytes};
//! use std::path::PathBuf;
//!
//! assert_eq!(normalize("/repo/.git/"), PathBuf::from("/repo/.git"));
//! assert_eq!(normalize("src/lib.rs"), PathBuf::from("src/lib.rs"));
//! assert_eq!(normalize_bytes(b"target/"), PathBuf::from("target"));
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;

/// Strip one trailing `/` or `\` from a backend path string.
///
/// A lone separator (the filesystem root) is kept as is.
pub fn normalize(raw: &str) -> PathBuf {
    match raw.strip_suffix(['/', '\\']) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => PathBuf::from(raw),
    }
}

/// [`normalize`] for paths that may not be valid UTF-8.
pub fn normalize_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(raw) => normalize(raw),
        // Rebuilding from components drops the trailing separator.
        None => path.components().collect(),
    }
}

/// [`normalize`] for a path the backend reported as raw bytes.
pub fn normalize_bytes(raw: &[u8]) -> PathBuf {
    let trimmed = match raw.split_last() {
        Some((b'/' | b'\\', rest)) if !rest.is_empty() => rest,
        _ => raw,
    };
    bytes_to_path(trimmed)
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(bytes))
}

// libgit2 hands out UTF-8 paths on non-unix platforms.
#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Resolve symlinks in `path`, or keep it normalized if that fails.
///
/// A path that cannot be resolved may name the same directory as a resolved
/// one under a different spelling, so the failure is logged.
pub fn canonicalize_or_keep(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot resolve path; using it as given");
            normalize_path(path)
        }
    }
}
