//! git::mock
//!
//! In-memory backend for deterministic testing.
//!
//! # Design
//!
//! `MockBackend` stores repositories as plain data: a work tree path, a
//! metadata path, the status entries a walk should report, and the blobs
//! committed at `HEAD`. Every call is counted so tests can observe exactly
//! how often the cache layers reach the backend. Diffs are computed with
//! libgit2's buffer diff, which needs no repository on disk.
//!
//! # Example
//!
//! ```
//! use git2::Status;
//! use repowatch::git::mock::{MockBackend, MockRepo};
//! use repowatch::git::Backend;
//! use std::path::Path;
//!
//! let backend = MockBackend::new();
//! backend.add_repo(
//!     MockRepo::new("/work/project")
//!         .with_head_file("README.md", "# Project\n")
//!         .with_status("src/main.rs", Status::WT_MODIFIED),
//! );
//!
//! let root = backend.discover(Path::new("/work/project/src")).unwrap();
//! assert_eq!(root, Path::new("/work/project/.git"));
//! assert_eq!(backend.calls().discover, 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::git2_backend::diff_buffers;
use super::interface::{Backend, BackendRepo, DiffHunk, DiffOptions, WalkOptions};
use super::GitError;

/// Mock backend for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockBackendInner {
    /// Repositories keyed by metadata directory.
    repos: HashMap<PathBuf, MockRepo>,
    /// Operation to fail on.
    fail_on: Option<FailOn>,
    /// Call counters.
    calls: CallCounts,
}

/// A repository described as data.
#[derive(Debug, Clone)]
pub struct MockRepo {
    workdir: Option<PathBuf>,
    metadata_dir: PathBuf,
    statuses: Vec<(PathBuf, git2::Status)>,
    head: HashMap<PathBuf, Vec<u8>>,
}

impl MockRepo {
    /// A non-bare repository whose metadata lives in `<workdir>/.git`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            metadata_dir: workdir.join(".git"),
            workdir: Some(workdir),
            statuses: Vec::new(),
            head: HashMap::new(),
        }
    }

    /// A bare repository.
    pub fn bare(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: None,
            metadata_dir: metadata_dir.into(),
            statuses: Vec::new(),
            head: HashMap::new(),
        }
    }

    /// Add a status entry the walk will report.
    pub fn with_status(mut self, path: impl Into<PathBuf>, flags: git2::Status) -> Self {
        self.statuses.push((path.into(), flags));
        self
    }

    /// Commit a file at `HEAD`.
    pub fn with_head_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.head.insert(path.into(), content.into());
        self
    }

    /// The metadata directory this repository is keyed by.
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.metadata_dir)
            || self.workdir.as_deref().is_some_and(|w| path.starts_with(w))
    }
}

/// Which operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// Fail `discover`.
    Discover,
    /// Fail `open`.
    Open,
    /// Fail status walks.
    StatusWalk,
    /// Fail diff computation.
    Diff,
}

/// Number of calls made per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Discovery calls
    pub discover: usize,
    /// Open calls
    pub open: usize,
    /// Status walks
    pub status_walks: usize,
    /// `HEAD:<path>` lookups
    pub blob_reads: usize,
    /// Diff computations
    pub diffs: usize,
}

impl MockBackend {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockBackendInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a repository.
    pub fn add_repo(&self, repo: MockRepo) {
        let key = repo.metadata_dir.clone();
        self.state().repos.insert(key, repo);
    }

    /// Replace the status entries of a registered repository.
    pub fn set_statuses(&self, metadata_dir: &Path, statuses: Vec<(PathBuf, git2::Status)>) {
        if let Some(repo) = self.state().repos.get_mut(metadata_dir) {
            repo.statuses = statuses;
        }
    }

    /// Configure an operation to fail. `None` clears it.
    pub fn fail_on(&self, op: Option<FailOn>) {
        self.state().fail_on = op;
    }

    /// Snapshot of the call counters.
    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    fn failure(&self, op: FailOn) -> Option<git2::Error> {
        (self.state().fail_on == Some(op))
            .then(|| git2::Error::from_str(&format!("injected {:?} failure", op)))
    }
}

impl Backend for MockBackend {
    fn discover(&self, path: &Path) -> Result<PathBuf, GitError> {
        self.state().calls.discover += 1;
        if let Some(err) = self.failure(FailOn::Discover) {
            return Err(GitError::discovery(path, &err));
        }

        let state = self.state();
        state
            .repos
            .values()
            .filter(|repo| repo.contains(path))
            // The innermost repository wins, as with nested work trees.
            .max_by_key(|repo| repo.metadata_dir.components().count())
            .map(|repo| repo.metadata_dir.clone())
            .ok_or_else(|| GitError::DiscoveryFailed {
                path: path.to_path_buf(),
                message: format!(
                    "could not find repository at '{}'",
                    path.display()
                ),
            })
    }

    fn open(&self, root: &Path) -> Result<Box<dyn BackendRepo>, GitError> {
        self.state().calls.open += 1;
        if let Some(err) = self.failure(FailOn::Open) {
            return Err(GitError::open(root, &err));
        }

        if !self.state().repos.contains_key(root) {
            return Err(GitError::OpenFailed {
                path: root.to_path_buf(),
                message: format!("'{}' is not a repository", root.display()),
            });
        }

        Ok(Box::new(MockConnection {
            backend: self.clone(),
            root: root.to_path_buf(),
        }))
    }
}

/// An open connection to a mock repository.
///
/// Reads the backend's current data on every call, so edits made through
/// [`MockBackend::set_statuses`] are visible to already-open handles.
struct MockConnection {
    backend: MockBackend,
    root: PathBuf,
}

impl MockConnection {
    fn repo(&self) -> Result<MockRepo, GitError> {
        self.backend
            .state()
            .repos
            .get(&self.root)
            .cloned()
            .ok_or_else(|| GitError::Backend {
                operation: "repository lookup",
                message: format!("'{}' was removed", self.root.display()),
            })
    }
}

impl BackendRepo for MockConnection {
    fn workdir(&self) -> Option<PathBuf> {
        self.repo().ok().and_then(|r| r.workdir)
    }

    fn metadata_dir(&self) -> PathBuf {
        self.root.clone()
    }

    fn walk_status(
        &self,
        options: &WalkOptions,
        visit: &mut dyn FnMut(&Path, git2::Status),
    ) -> Result<(), GitError> {
        self.backend.state().calls.status_walks += 1;
        if let Some(err) = self.backend.failure(FailOn::StatusWalk) {
            return Err(GitError::backend("status walk", &err));
        }

        for (path, flags) in self.repo()?.statuses {
            if !options.include_untracked && flags.contains(git2::Status::WT_NEW) {
                continue;
            }
            if !options.include_ignored && flags.contains(git2::Status::IGNORED) {
                continue;
            }
            visit(&path, flags);
        }
        Ok(())
    }

    fn head_blob(&self, relative: &Path) -> Result<Vec<u8>, GitError> {
        self.backend.state().calls.blob_reads += 1;

        self.repo()?
            .head
            .get(relative)
            .cloned()
            .ok_or_else(|| GitError::NoBaseline {
                path: relative.to_path_buf(),
                message: format!(
                    "the path '{}' does not exist in the given tree",
                    relative.display()
                ),
            })
    }

    fn diff_blob_to_buffer(
        &self,
        blob: &[u8],
        buffer: &[u8],
        path: &Path,
        options: &DiffOptions,
    ) -> Result<Vec<DiffHunk>, GitError> {
        self.backend.state().calls.diffs += 1;
        if let Some(err) = self.backend.failure(FailOn::Diff) {
            return Err(GitError::backend("diff", &err));
        }

        diff_buffers(blob, buffer, path, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_from_nested_path() {
        let backend = MockBackend::new();
        backend.add_repo(MockRepo::new("/w/outer"));
        backend.add_repo(MockRepo::new("/w/outer/vendor/inner"));

        let root = backend.discover(Path::new("/w/outer/vendor/inner/src")).unwrap();
        assert_eq!(root, Path::new("/w/outer/vendor/inner/.git"));

        let root = backend.discover(Path::new("/w/outer/src")).unwrap();
        assert_eq!(root, Path::new("/w/outer/.git"));
    }

    #[test]
    fn discover_outside_any_repo_fails() {
        let backend = MockBackend::new();
        backend.add_repo(MockRepo::new("/w/project"));

        let err = backend.discover(Path::new("/elsewhere")).unwrap_err();
        assert!(matches!(err, GitError::DiscoveryFailed { .. }));
    }

    #[test]
    fn open_unknown_root_fails() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.open(Path::new("/nope/.git")),
            Err(GitError::OpenFailed { .. })
        ));
        assert_eq!(backend.calls().open, 1);
    }

    #[test]
    fn injected_failure() {
        let backend = MockBackend::new();
        backend.add_repo(MockRepo::new("/w/project"));
        backend.fail_on(Some(FailOn::StatusWalk));

        let conn = backend.open(Path::new("/w/project/.git")).unwrap();
        let err = conn
            .walk_status(&WalkOptions::default(), &mut |_, _| {})
            .unwrap_err();
        assert!(err.message().contains("injected"));

        backend.fail_on(None);
        assert!(conn.walk_status(&WalkOptions::default(), &mut |_, _| {}).is_ok());
        assert_eq!(backend.calls().status_walks, 2);
    }

    #[test]
    fn walk_respects_filters() {
        let backend = MockBackend::new();
        backend.add_repo(
            MockRepo::new("/w/project")
                .with_status("new.txt", git2::Status::WT_NEW)
                .with_status("target", git2::Status::IGNORED)
                .with_status("lib.rs", git2::Status::WT_MODIFIED),
        );
        let conn = backend.open(Path::new("/w/project/.git")).unwrap();

        let options = WalkOptions {
            include_untracked: false,
            include_ignored: false,
            recurse_untracked_dirs: false,
        };
        let mut seen = Vec::new();
        conn.walk_status(&options, &mut |path, _| seen.push(path.to_path_buf()))
            .unwrap();
        assert_eq!(seen, vec![PathBuf::from("lib.rs")]);
    }

    #[test]
    fn bare_repo_has_no_workdir() {
        let backend = MockBackend::new();
        backend.add_repo(MockRepo::bare("/srv/project.git"));

        let conn = backend.open(Path::new("/srv/project.git")).unwrap();
        assert!(conn.workdir().is_none());
        assert_eq!(conn.metadata_dir(), PathBuf::from("/srv/project.git"));
    }
}
