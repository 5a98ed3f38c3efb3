//! repo::diff
//!
//! Line-level comparison of an editor buffer against `HEAD`.
//!
//! A [`DiffSnapshot`] reads the committed blob once and then answers any
//! number of queries against changing buffer contents. It borrows the
//! repository it came from and cannot outlive it.
//!
//! # Example
//!
//! ```no_run
//! use repowatch::acquire_repository;
//!
//! let repo = acquire_repository("src/lib.rs".as_ref())?;
//! let snapshot = repo.diff("src/lib.rs".as_ref())?;
//!
//! let buffer = std::fs::read("src/lib.rs").unwrap();
//! let lines = snapshot.lines(&buffer)?;
//! for (start, end) in &lines.modified {
//!     println!("modified: {}..{}", start, end);
//! }
//! std::io::Write::write_all(&mut std::io::stdout(), &snapshot.hunk_bytes(&buffer, 10)?)
//!     .unwrap();
//! # Ok::<(), repowatch::git::GitError>(())
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Repository;
use crate::git::{backend_lock, DiffHunk, DiffOptions, GitError};

/// Changed line ranges in a candidate buffer.
///
/// Ranges are 0-based and half-open. Entries keep the backend's order
/// (ascending by position) and are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lines {
    /// Lines that exist only in the buffer
    pub added: Vec<(usize, usize)>,
    /// Positions where committed lines were removed; each points at the
    /// line above the removal
    pub removed: Vec<usize>,
    /// Lines that replace committed lines
    pub modified: Vec<(usize, usize)>,
}

impl Lines {
    /// Whether no line differs.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Fold step: classify one hunk.
    fn push_hunk(mut self, hunk: &DiffHunk) -> Self {
        let (start, end) = hunk.new_range();
        if hunk.old_lines == 0 && hunk.new_lines > 0 {
            self.added.push((start, end));
        } else if hunk.new_lines == 0 && hunk.old_lines > 0 {
            self.removed.push(start);
        } else {
            self.modified.push((start, end));
        }
        self
    }
}

/// The committed version of one file, ready to diff against buffers.
pub struct DiffSnapshot<'repo> {
    repo: &'repo Repository,
    path: PathBuf,
    blob: Vec<u8>,
    options: DiffOptions,
}

impl std::fmt::Debug for DiffSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffSnapshot")
            .field("path", &self.path)
            .field("blob_len", &self.blob.len())
            .field("options", &self.options)
            .finish()
    }
}

impl<'repo> DiffSnapshot<'repo> {
    /// Resolve `HEAD:<relative>` and keep its content.
    ///
    /// # Errors
    ///
    /// - [`GitError::NoBaseline`] if `HEAD` has no blob at `relative`
    pub(crate) fn new(repo: &'repo Repository, relative: &Path) -> Result<Self, GitError> {
        let blob = {
            let _guard = backend_lock();
            repo.connection().head_blob(relative)?
        };

        Ok(Self {
            repo,
            path: relative.to_path_buf(),
            blob,
            options: DiffOptions { context_lines: 0 },
        })
    }

    /// Path relative to the repository root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The committed content.
    pub fn baseline(&self) -> &[u8] {
        &self.blob
    }

    /// Diff `buffer` against the committed content and fold over the hunks
    /// in position order.
    pub fn fold_hunks<A, F>(&self, buffer: &[u8], init: A, f: F) -> Result<A, GitError>
    where
        F: FnMut(A, &DiffHunk) -> A,
    {
        let hunks = {
            let _guard = backend_lock();
            self.repo
                .connection()
                .diff_blob_to_buffer(&self.blob, buffer, &self.path, &self.options)?
        };
        Ok(hunks.iter().fold(init, f))
    }

    /// Classify every changed range of `buffer`.
    pub fn lines(&self, buffer: &[u8]) -> Result<Lines, GitError> {
        self.fold_hunks(buffer, Lines::default(), Lines::push_hunk)
    }

    /// Raw diff bytes of the hunk touching `line` (0-based).
    ///
    /// The header of the first matching hunk is followed by each of its
    /// lines prefixed with its origin marker. Line content is copied
    /// verbatim. Returns an empty vector when no hunk touches `line`.
    pub fn hunk_bytes(&self, buffer: &[u8], line: usize) -> Result<Vec<u8>, GitError> {
        self.fold_hunks(buffer, Vec::new(), |mut text, hunk| {
            if hunk.touches_new_line(line) {
                for diff_line in &hunk.lines {
                    if text.is_empty() {
                        text.extend_from_slice(&hunk.header);
                    }
                    let mut origin = [0; 4];
                    text.extend_from_slice(diff_line.origin.encode_utf8(&mut origin).as_bytes());
                    text.extend_from_slice(&diff_line.content);
                }
            }
            text
        })
    }

    /// [`hunk_bytes`](Self::hunk_bytes) as text, with invalid UTF-8
    /// replaced.
    pub fn hunk_text(&self, buffer: &[u8], line: usize) -> Result<String, GitError> {
        let bytes = self.hunk_bytes(buffer, line)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::DiffLine;

    fn hunk(old_lines: u32, new_start: u32, new_lines: u32) -> DiffHunk {
        DiffHunk {
            header: format!("@@ -1,{} +{},{} @@\n", old_lines, new_start, new_lines).into_bytes(),
            old_start: 1,
            old_lines,
            new_start,
            new_lines,
            lines: vec![DiffLine {
                origin: '+',
                content: b"x\n".to_vec(),
            }],
        }
    }

    #[test]
    fn classify_added() {
        let lines = Lines::default().push_hunk(&hunk(0, 4, 2));
        assert_eq!(lines.added, vec![(3, 5)]);
        assert!(lines.removed.is_empty());
        assert!(lines.modified.is_empty());
    }

    #[test]
    fn classify_removed() {
        let lines = Lines::default().push_hunk(&hunk(3, 2, 0));
        assert_eq!(lines.removed, vec![1]);
        assert!(lines.added.is_empty());
    }

    #[test]
    fn classify_modified() {
        let lines = Lines::default().push_hunk(&hunk(1, 7, 2));
        assert_eq!(lines.modified, vec![(6, 8)]);
    }

    #[test]
    fn order_is_kept_and_not_merged() {
        let lines = [hunk(0, 1, 1), hunk(0, 2, 1), hunk(1, 5, 1)]
            .iter()
            .fold(Lines::default(), Lines::push_hunk);
        assert_eq!(lines.added, vec![(0, 1), (1, 2)]);
        assert_eq!(lines.modified, vec![(4, 5)]);
        assert!(!lines.is_empty());
    }
}
