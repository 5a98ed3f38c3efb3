//! git::interface
//!
//! The backend seam.
//!
//! # Architecture
//!
//! Everything above this module talks to version control through two
//! object-safe traits:
//!
//! - [`Backend`]: process-level entry points (discovery, opening)
//! - [`BackendRepo`]: one open repository connection
//!
//! [`Git2Backend`](super::Git2Backend) implements them with libgit2;
//! [`MockBackend`](super::mock::MockBackend) implements them in memory for
//! deterministic tests. Callers are responsible for holding
//! [`backend_lock`](super::backend_lock) around each call.
//!
//! # Invariants
//!
//! - Returned paths are normalized (no trailing separator)
//! - Status entries carry paths relative to the work tree
//! - Diff hunks are returned in ascending position order

use std::path::{Path, PathBuf};

use super::GitError;

/// Which entries a status walk reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Report untracked files
    pub include_untracked: bool,
    /// Report ignored files
    pub include_ignored: bool,
    /// Descend into untracked directories instead of reporting the directory
    pub recurse_untracked_dirs: bool,
}

impl Default for WalkOptions {
    /// libgit2's own status defaults.
    fn default() -> Self {
        Self {
            include_untracked: true,
            include_ignored: true,
            recurse_untracked_dirs: true,
        }
    }
}

/// Options for blob-to-buffer diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOptions {
    /// Unchanged lines reported around each change
    pub context_lines: u32,
}

/// One line of a diff hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Origin marker: `'+'`, `'-'`, `' '`, or one of libgit2's
    /// end-of-file markers (`'='`, `'>'`, `'<'`)
    pub origin: char,
    /// Line content including its trailing newline, if any, exactly as
    /// it appears in the file
    pub content: Vec<u8>,
}

/// A contiguous region of change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    /// The `@@ -a,b +c,d @@` header line, including its newline
    pub header: Vec<u8>,
    /// First line in the old side (1-based)
    pub old_start: u32,
    /// Number of old lines
    pub old_lines: u32,
    /// First line in the new side (1-based; 0 when inserting before line 1
    /// of an empty side)
    pub new_start: u32,
    /// Number of new lines
    pub new_lines: u32,
    /// Lines in emission order
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The hunk's 0-based half-open range in the new side.
    ///
    /// Pure deletions yield an empty range positioned at the line above
    /// the removed lines.
    ///
    /// # Example
    ///
    /// ```
    /// use repowatch::git::DiffHunk;
    ///
    /// let hunk = DiffHunk {
    ///     header: b"@@ -3,0 +4,2 @@\n".to_vec(),
    ///     old_start: 3,
    ///     old_lines: 0,
    ///     new_start: 4,
    ///     new_lines: 2,
    ///     lines: Vec::new(),
    /// };
    /// assert_eq!(hunk.new_range(), (3, 5));
    /// ```
    pub fn new_range(&self) -> (usize, usize) {
        let start = (self.new_start as usize).saturating_sub(1);
        let end = (self.new_start as usize + self.new_lines as usize).saturating_sub(1);
        (start, end)
    }

    /// Whether 0-based new-side `line` falls in this hunk.
    ///
    /// A line matches its hunk's start position even when the hunk covers
    /// no new lines, so a deletion is reachable from the line above it. A
    /// deletion at the top of a file starts above line 0 and matches no
    /// line.
    pub fn touches_new_line(&self, line: usize) -> bool {
        let start = i64::from(self.new_start) - 1;
        let end = start + i64::from(self.new_lines);
        let Ok(line) = i64::try_from(line) else {
            return false;
        };
        line == start || (start..end).contains(&line)
    }
}

/// Process-level backend entry points.
pub trait Backend: Send + Sync {
    /// Find the repository containing `path`, walking up through its
    /// ancestors. Returns the canonical metadata directory.
    ///
    /// # Errors
    ///
    /// - [`GitError::DiscoveryFailed`] if no ancestor is a repository
    fn discover(&self, path: &Path) -> Result<PathBuf, GitError>;

    /// Open the repository rooted exactly at `root` (no discovery).
    ///
    /// # Errors
    ///
    /// - [`GitError::OpenFailed`] if `root` is not a repository
    fn open(&self, root: &Path) -> Result<Box<dyn BackendRepo>, GitError>;
}

/// One open repository connection.
pub trait BackendRepo: Send {
    /// The work tree, or `None` for a bare repository.
    fn workdir(&self) -> Option<PathBuf>;

    /// The metadata directory (`.git`, or the bare repository itself).
    fn metadata_dir(&self) -> PathBuf;

    /// Walk the working tree status, calling `visit` once per reported path
    /// with its path relative to the work tree and its raw flags.
    fn walk_status(
        &self,
        options: &WalkOptions,
        visit: &mut dyn FnMut(&Path, git2::Status),
    ) -> Result<(), GitError>;

    /// Read the content of `HEAD:<relative>`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NoBaseline`] if `HEAD` has no blob at that path
    fn head_blob(&self, relative: &Path) -> Result<Vec<u8>, GitError>;

    /// Diff committed blob content against an in-memory buffer.
    fn diff_blob_to_buffer(
        &self,
        blob: &[u8],
        buffer: &[u8],
        path: &Path,
        options: &DiffOptions,
    ) -> Result<Vec<DiffHunk>, GitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(old_start: u32, old_lines: u32, new_start: u32, new_lines: u32) -> DiffHunk {
        DiffHunk {
            header: Vec::new(),
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines: Vec::new(),
        }
    }

    #[test]
    fn addition_range() {
        assert_eq!(hunk(2, 0, 3, 1).new_range(), (2, 3));
    }

    #[test]
    fn deletion_is_empty_range_at_line_above() {
        assert_eq!(hunk(2, 1, 1, 0).new_range(), (0, 0));
    }

    #[test]
    fn deletion_at_top_saturates() {
        assert_eq!(hunk(1, 1, 0, 0).new_range(), (0, 0));
    }

    #[test]
    fn touches_lines_inside_range() {
        let added = hunk(2, 0, 3, 2);
        assert!(!added.touches_new_line(1));
        assert!(added.touches_new_line(2));
        assert!(added.touches_new_line(3));
        assert!(!added.touches_new_line(4));
    }

    #[test]
    fn deletion_touches_line_above() {
        let deleted = hunk(3, 1, 2, 0);
        assert!(deleted.touches_new_line(1));
        assert!(!deleted.touches_new_line(2));
    }

    #[test]
    fn deletion_at_top_touches_nothing() {
        let deleted = hunk(1, 1, 0, 0);
        assert!(!deleted.touches_new_line(0));
        assert!(!deleted.touches_new_line(1));
    }

    #[test]
    fn walk_defaults_match_libgit2() {
        let options = WalkOptions::default();
        assert!(options.include_untracked);
        assert!(options.include_ignored);
        assert!(options.recurse_untracked_dirs);
    }
}
