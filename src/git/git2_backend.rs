//! git::git2_backend
//!
//! libgit2-backed implementation of the backend seam.
//!
//! Every method here performs exactly one logical backend call and expects
//! the caller to hold [`backend_lock`](super::backend_lock).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::interface::{Backend, BackendRepo, DiffHunk, DiffLine, DiffOptions, WalkOptions};
use super::{ensure_initialized, GitError};
use crate::core::config::BackendConfig;
use crate::core::paths;

/// Backend over a real libgit2.
#[derive(Debug, Clone, Copy)]
pub struct Git2Backend {
    _private: (),
}

impl Git2Backend {
    /// Create the backend, running the one-time global init with `config`.
    pub fn new(config: &BackendConfig) -> Self {
        ensure_initialized(config);
        Self { _private: () }
    }
}

impl Default for Git2Backend {
    fn default() -> Self {
        Self::new(&BackendConfig::default())
    }
}

impl Backend for Git2Backend {
    fn discover(&self, path: &Path) -> Result<PathBuf, GitError> {
        let found = git2::Repository::discover_path(path, Vec::<&OsStr>::new())
            .map_err(|e| GitError::discovery(path, &e))?;
        let found = paths::normalize_path(&found);
        trace!(start = %path.display(), root = %found.display(), "discovered repository");

        // libgit2 reports the path it walked through; resolve symlinks so
        // every route into the same repository yields one key.
        Ok(paths::canonicalize_or_keep(&found))
    }

    fn open(&self, root: &Path) -> Result<Box<dyn BackendRepo>, GitError> {
        let repo = git2::Repository::open(root).map_err(|e| GitError::open(root, &e))?;
        Ok(Box::new(Git2Repo { repo }))
    }
}

/// An open libgit2 repository.
struct Git2Repo {
    repo: git2::Repository,
}

impl BackendRepo for Git2Repo {
    fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(paths::normalize_path)
    }

    fn metadata_dir(&self) -> PathBuf {
        paths::normalize_path(self.repo.path())
    }

    fn walk_status(
        &self,
        options: &WalkOptions,
        visit: &mut dyn FnMut(&Path, git2::Status),
    ) -> Result<(), GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(options.include_untracked)
            .include_ignored(options.include_ignored)
            .recurse_untracked_dirs(options.recurse_untracked_dirs);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::backend("status walk", &e))?;

        for entry in statuses.iter() {
            // Untracked directories are reported with a trailing separator.
            let path = paths::normalize_bytes(entry.path_bytes());
            visit(&path, entry.status());
        }

        Ok(())
    }

    fn head_blob(&self, relative: &Path) -> Result<Vec<u8>, GitError> {
        let head = self.repo.head().map_err(|e| match e.code() {
            git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound => {
                GitError::no_baseline(relative, &e)
            }
            _ => GitError::backend("revision lookup", &e),
        })?;
        let tree = head
            .peel_to_tree()
            .map_err(|e| GitError::no_baseline(relative, &e))?;

        // Looked up by path rather than by revspec so non-UTF-8 names resolve.
        let entry = tree.get_path(relative).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => {
                GitError::no_baseline(relative, &e)
            }
            _ => GitError::backend("revision lookup", &e),
        })?;
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Err(GitError::NoBaseline {
                path: relative.to_path_buf(),
                message: format!("'{}' is not a file at HEAD", relative.display()),
            });
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| GitError::backend("blob lookup", &e))?;
        Ok(blob.content().to_vec())
    }

    fn diff_blob_to_buffer(
        &self,
        blob: &[u8],
        buffer: &[u8],
        path: &Path,
        options: &DiffOptions,
    ) -> Result<Vec<DiffHunk>, GitError> {
        diff_buffers(blob, buffer, path, options)
    }
}

/// Diff two in-memory buffers with libgit2's diff engine.
///
/// This needs no repository, which lets the in-memory backend reuse the
/// real engine.
pub(crate) fn diff_buffers(
    old: &[u8],
    new: &[u8],
    path: &Path,
    options: &DiffOptions,
) -> Result<Vec<DiffHunk>, GitError> {
    let mut opts = git2::DiffOptions::new();
    opts.context_lines(options.context_lines);

    let patch = git2::Patch::from_buffers(old, Some(path), new, Some(path), Some(&mut opts))
        .map_err(|e| GitError::backend("diff", &e))?;

    let mut hunks = Vec::with_capacity(patch.num_hunks());
    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, line_count) = patch
            .hunk(hunk_idx)
            .map_err(|e| GitError::backend("diff", &e))?;

        let mut lines = Vec::with_capacity(line_count);
        for line_idx in 0..line_count {
            let line = patch
                .line_in_hunk(hunk_idx, line_idx)
                .map_err(|e| GitError::backend("diff", &e))?;
            lines.push(DiffLine {
                origin: line.origin(),
                content: line.content().to_vec(),
            });
        }

        hunks.push(DiffHunk {
            header: hunk.header().to_vec(),
            old_start: hunk.old_start(),
            old_lines: hunk.old_lines(),
            new_start: hunk.new_start(),
            new_lines: hunk.new_lines(),
            lines,
        });
    }

    Ok(hunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_context() -> DiffOptions {
        DiffOptions { context_lines: 0 }
    }

    mod diff_buffers {
        use super::*;

        #[test]
        fn identical_buffers_have_no_hunks() {
            let text = b"one\ntwo\nthree\n";
            let hunks = diff_buffers(text, text, Path::new("f.txt"), &zero_context()).unwrap();
            assert!(hunks.is_empty());
        }

        #[test]
        fn appended_line() {
            let hunks = diff_buffers(
                b"one\ntwo\n",
                b"one\ntwo\nthree\n",
                Path::new("f.txt"),
                &zero_context(),
            )
            .unwrap();

            assert_eq!(hunks.len(), 1);
            let hunk = &hunks[0];
            assert_eq!(hunk.old_lines, 0);
            assert_eq!(hunk.new_start, 3);
            assert_eq!(hunk.new_lines, 1);
            assert!(hunk.header.starts_with(b"@@"));
            assert_eq!(hunk.lines.len(), 1);
            assert_eq!(hunk.lines[0].origin, '+');
            assert_eq!(hunk.lines[0].content, b"three\n");
        }

        #[test]
        fn changed_line_reports_both_sides() {
            let hunks = diff_buffers(
                b"one\ntwo\nthree\n",
                b"one\nTWO\nthree\n",
                Path::new("f.txt"),
                &zero_context(),
            )
            .unwrap();

            assert_eq!(hunks.len(), 1);
            let origins: Vec<char> = hunks[0].lines.iter().map(|l| l.origin).collect();
            assert_eq!(origins, vec!['-', '+']);
        }

        #[test]
        fn bytes_are_kept_verbatim() {
            let hunks = diff_buffers(
                b"caf\xe9\n",
                b"CAF\xe9\n",
                Path::new("latin1.txt"),
                &zero_context(),
            )
            .unwrap();

            assert_eq!(hunks.len(), 1);
            assert_eq!(hunks[0].lines[0].content, b"caf\xe9\n");
            assert_eq!(hunks[0].lines[1].content, b"CAF\xe9\n");
        }

        #[test]
        fn hunks_in_ascending_order() {
            let hunks = diff_buffers(
                b"a\nb\nc\nd\ne\n",
                b"A\nb\nc\nd\nE\n",
                Path::new("f.txt"),
                &zero_context(),
            )
            .unwrap();

            assert_eq!(hunks.len(), 2);
            assert!(hunks[0].new_start < hunks[1].new_start);
        }
    }
}
