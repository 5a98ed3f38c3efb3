//! repo::status
//!
//! The cached status value and its cache.
//!
//! # Invariants
//!
//! - A [`Status`] is immutable once built; callers share it as `Arc<Status>`
//! - The cache is either empty or holds a status computed with no
//!   invalidation in between its start and its store
//! - At most one walk runs per cache at a time; callers arriving while a
//!   walk is in flight wait for it and reuse its result
//! - Invalidation only touches the state lock, never the refresh lock, so a
//!   watch callback cannot block behind a running walk

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::git::{FileStatus, GitError};

/// Changed paths of one work tree, as absolute paths.
///
/// Each changed file also contributes every ancestor directory below the
/// work-tree root, so "does this folder contain changes?" is a set lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// New and untracked files, plus their ancestor directories
    pub added: BTreeSet<PathBuf>,
    /// Modified files, plus their ancestor directories
    pub modified: BTreeSet<PathBuf>,
}

impl Status {
    /// Whether nothing is added or modified.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty()
    }

    /// The status of an absolute path as far as this snapshot knows.
    ///
    /// Only `New`, `Modified`, and `Current` are retained by the cache.
    pub fn status_of(&self, path: &Path) -> FileStatus {
        if self.added.contains(path) {
            FileStatus::New
        } else if self.modified.contains(path) {
            FileStatus::Modified
        } else {
            FileStatus::Current
        }
    }
}

/// Accumulates classified walk entries into a [`Status`].
#[derive(Debug)]
pub(crate) struct StatusBuilder<'a> {
    work_path: &'a Path,
    status: Status,
}

impl<'a> StatusBuilder<'a> {
    pub(crate) fn new(work_path: &'a Path) -> Self {
        Self {
            work_path,
            status: Status::default(),
        }
    }

    /// Record one walk entry given relative to the work tree.
    pub(crate) fn record(&mut self, relative: &Path, status: FileStatus) {
        let set = match status {
            FileStatus::New => &mut self.status.added,
            FileStatus::Modified => &mut self.status.modified,
            _ => return,
        };

        let mut current = Some(relative);
        while let Some(rel) = current.filter(|r| !r.as_os_str().is_empty()) {
            set.insert(self.work_path.join(rel));
            current = rel.parent();
        }
    }

    pub(crate) fn finish(self) -> Status {
        self.status
    }
}

#[derive(Debug, Default)]
struct CacheState {
    cached: Option<Arc<Status>>,
    /// Bumped by every invalidation.
    generation: u64,
}

/// Single-flight cache for one repository's status.
#[derive(Debug, Default)]
pub(crate) struct StatusCache {
    state: Mutex<CacheState>,
    refresh: Mutex<()>,
}

impl StatusCache {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The cached status, if valid.
    pub(crate) fn get(&self) -> Option<Arc<Status>> {
        self.state().cached.clone()
    }

    /// Drop the cached status. Never blocks on a running walk.
    pub(crate) fn invalidate(&self) {
        let mut state = self.state();
        state.generation = state.generation.wrapping_add(1);
        if state.cached.take().is_some() {
            trace!("status cache invalidated");
        }
    }

    /// Return the cached status or run `compute` to fill it.
    pub(crate) fn get_or_compute<F>(&self, compute: F) -> Result<Arc<Status>, GitError>
    where
        F: FnOnce() -> Result<Status, GitError>,
    {
        if let Some(status) = self.get() {
            return Ok(status);
        }

        let _refresh = self
            .refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // A walk that finished while we waited already filled the cache.
        let generation = {
            let state = self.state();
            if let Some(status) = &state.cached {
                return Ok(Arc::clone(status));
            }
            state.generation
        };

        let status = Arc::new(compute()?);

        let mut state = self.state();
        if state.generation == generation {
            state.cached = Some(Arc::clone(&status));
        } else {
            debug!("status changed during walk; result not cached");
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    mod builder {
        use super::*;

        #[test]
        fn ancestors_are_recorded_but_not_root() {
            let work = Path::new("/work");
            let mut builder = StatusBuilder::new(work);
            builder.record(Path::new("a/b/c.txt"), FileStatus::Modified);
            let status = builder.finish();

            let expected: BTreeSet<PathBuf> = ["/work/a", "/work/a/b", "/work/a/b/c.txt"]
                .iter()
                .map(PathBuf::from)
                .collect();
            assert_eq!(status.modified, expected);
            assert!(!status.modified.contains(work));
            assert!(status.added.is_empty());
        }

        #[test]
        fn new_goes_to_added() {
            let mut builder = StatusBuilder::new(Path::new("/work"));
            builder.record(Path::new("notes.md"), FileStatus::New);
            let status = builder.finish();

            assert!(status.added.contains(Path::new("/work/notes.md")));
            assert_eq!(status.added.len(), 1);
            assert_eq!(status.status_of(Path::new("/work/notes.md")), FileStatus::New);
        }

        #[test]
        fn other_states_are_not_retained() {
            let mut builder = StatusBuilder::new(Path::new("/work"));
            for state in [
                FileStatus::Current,
                FileStatus::Deleted,
                FileStatus::Renamed,
                FileStatus::TypeChange,
                FileStatus::Unreadable,
                FileStatus::Ignored,
                FileStatus::Conflicted,
            ] {
                builder.record(Path::new("x/y"), state);
            }
            assert!(builder.finish().is_empty());
        }

        #[test]
        fn shared_ancestors_collapse() {
            let mut builder = StatusBuilder::new(Path::new("/work"));
            builder.record(Path::new("src/a.rs"), FileStatus::Modified);
            builder.record(Path::new("src/b.rs"), FileStatus::Modified);
            let status = builder.finish();

            assert_eq!(status.modified.len(), 3);
            assert_eq!(
                status.status_of(Path::new("/work/src")),
                FileStatus::Modified
            );
            assert_eq!(
                status.status_of(Path::new("/work/other")),
                FileStatus::Current
            );
        }
    }

    mod cache {
        use super::*;

        fn one_file() -> Status {
            let mut builder = StatusBuilder::new(Path::new("/w"));
            builder.record(Path::new("f"), FileStatus::New);
            builder.finish()
        }

        #[test]
        fn computes_once_until_invalidated() {
            let cache = StatusCache::default();
            let walks = AtomicUsize::new(0);
            let compute = || {
                walks.fetch_add(1, Ordering::SeqCst);
                Ok(one_file())
            };

            let first = cache.get_or_compute(compute).unwrap();
            let second = cache.get_or_compute(compute).unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(walks.load(Ordering::SeqCst), 1);

            cache.invalidate();
            assert!(cache.get().is_none());
            cache.get_or_compute(compute).unwrap();
            assert_eq!(walks.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn failure_leaves_cache_empty() {
            let cache = StatusCache::default();
            let result = cache.get_or_compute(|| {
                Err(GitError::Backend {
                    operation: "status walk",
                    message: "boom".to_string(),
                })
            });
            assert!(result.is_err());
            assert!(cache.get().is_none());
        }

        #[test]
        fn invalidation_during_walk_is_not_lost() {
            let cache = StatusCache::default();
            let status = cache
                .get_or_compute(|| {
                    cache.invalidate();
                    Ok(one_file())
                })
                .unwrap();

            assert!(!status.is_empty());
            assert!(cache.get().is_none());
        }

        #[test]
        fn concurrent_callers_share_one_walk() {
            let cache = Arc::new(StatusCache::default());
            let walks = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(Barrier::new(8));

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let cache = Arc::clone(&cache);
                    let walks = Arc::clone(&walks);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_compute(|| {
                                walks.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(std::time::Duration::from_millis(20));
                                Ok(one_file())
                            })
                            .unwrap()
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(walks.load(Ordering::SeqCst), 1);
        }
    }
}
