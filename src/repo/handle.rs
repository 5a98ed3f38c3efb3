//! repo::handle
//!
//! One open repository with a watch-invalidated status cache.
//!
//! # Lifecycle
//!
//! 1. [`Repository::open`] opens the backend connection at an exact root,
//!    reads the work-tree and metadata paths, and subscribes to change
//!    events on the metadata directory.
//! 2. [`Repository::status`] serves the cached status, walking the backend
//!    only when the cache is empty.
//! 3. Any watch event except the end-of-burst hint empties the cache.
//! 4. Dropping the handle drops the subscription first, so no callback
//!    runs against a half-destroyed handle.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use super::diff::DiffSnapshot;
use super::status::{Status, StatusBuilder, StatusCache};
use crate::core::paths;
use crate::git::{backend_lock, Backend, BackendRepo, FileStatus, GitError, WalkOptions};
use crate::watch::{Subscription, WatchFacility};

/// Options applied when opening a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// What status walks report
    pub walk: WalkOptions,
    /// Watch subdirectories of the metadata directory
    pub watch_recursive: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            watch_recursive: true,
        }
    }
}

/// An open repository.
///
/// Shared between threads through the [`Registry`](super::Registry).
pub struct Repository {
    // Declared first so it is dropped first.
    subscription: Option<Box<dyn Subscription>>,
    /// Always locked after `backend_lock`, so never contended.
    connection: Mutex<Box<dyn BackendRepo>>,
    work_path: PathBuf,
    metadata_path: PathBuf,
    walk: WalkOptions,
    status: Arc<StatusCache>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("work_path", &self.work_path)
            .field("metadata_path", &self.metadata_path)
            .field("watched", &self.subscription.is_some())
            .finish()
    }
}

impl Repository {
    /// Open the repository rooted exactly at `root`.
    ///
    /// Pass `watcher: None` to skip watching; the status cache then stays
    /// valid until [`invalidate_status`](Self::invalidate_status) is called.
    ///
    /// # Errors
    ///
    /// - [`GitError::OpenFailed`] if `root` is not a repository or the
    ///   watch cannot be installed
    pub fn open(
        backend: &dyn Backend,
        watcher: Option<&dyn WatchFacility>,
        root: &Path,
        options: &OpenOptions,
    ) -> Result<Self, GitError> {
        let (connection, work_path, metadata_path) = {
            let _guard = backend_lock();
            let connection = backend.open(root)?;
            let metadata_path = connection.metadata_dir();
            let work_path = connection
                .workdir()
                .unwrap_or_else(|| metadata_path.clone());
            (connection, work_path, metadata_path)
        };
        let metadata_path = paths::canonicalize_or_keep(&metadata_path);

        let status = Arc::new(StatusCache::default());

        let subscription = match watcher {
            Some(watcher) => {
                let cache = Arc::clone(&status);
                let subscription = watcher
                    .subscribe(
                        &metadata_path,
                        options.watch_recursive,
                        Box::new(move |event| {
                            if !event.is_changes_done() {
                                trace!(path = %event.path.display(), "metadata changed");
                                cache.invalidate();
                            }
                        }),
                    )
                    .map_err(|e| GitError::OpenFailed {
                        path: root.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Some(subscription)
            }
            None => None,
        };

        debug!(
            work = %work_path.display(),
            metadata = %metadata_path.display(),
            watched = subscription.is_some(),
            "repository opened"
        );

        Ok(Self {
            subscription,
            connection: Mutex::new(connection),
            work_path,
            metadata_path,
            walk: options.walk,
            status,
        })
    }

    pub(crate) fn connection(&self) -> MutexGuard<'_, Box<dyn BackendRepo>> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The work tree (the metadata directory for bare repositories).
    pub fn work_path(&self) -> &Path {
        &self.work_path
    }

    /// The metadata directory.
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Added and modified paths of the work tree.
    ///
    /// Served from cache when valid. Otherwise one walk runs; concurrent
    /// callers wait for it instead of starting their own.
    pub fn status(&self) -> Result<Arc<Status>, GitError> {
        self.status.get_or_compute(|| self.walk_status())
    }

    fn walk_status(&self) -> Result<Status, GitError> {
        debug!(work = %self.work_path.display(), "walking status");
        let mut builder = StatusBuilder::new(&self.work_path);

        let _guard = backend_lock();
        self.connection()
            .walk_status(&self.walk, &mut |path, flags| {
                builder.record(path, FileStatus::classify(flags));
            })?;

        Ok(builder.finish())
    }

    /// Status of one absolute path, computing the status if needed.
    pub fn status_of(&self, path: &Path) -> Result<FileStatus, GitError> {
        Ok(self.status()?.status_of(path))
    }

    /// Whether a valid status is cached.
    pub fn is_status_cached(&self) -> bool {
        self.status.get().is_some()
    }

    /// Drop the cached status so the next [`status`](Self::status) walks.
    pub fn invalidate_status(&self) {
        self.status.invalidate();
    }

    /// Snapshot `HEAD:<relative>` for line queries.
    ///
    /// # Errors
    ///
    /// - [`GitError::NoBaseline`] if `HEAD` has no blob at `relative`
    pub fn diff(&self, relative: &Path) -> Result<DiffSnapshot<'_>, GitError> {
        DiffSnapshot::new(self, relative)
    }
}

impl Drop for Repository {
    fn drop(&mut self) {
        self.subscription.take();
        debug!(metadata = %self.metadata_path.display(), "repository closed");
    }
}

/// Find the repository root for any path inside it.
///
/// # Errors
///
/// - [`GitError::DiscoveryFailed`] if no ancestor of `path` is a repository
pub fn root_path(backend: &dyn Backend, path: &Path) -> Result<PathBuf, GitError> {
    let _guard = backend_lock();
    backend.discover(path)
}
