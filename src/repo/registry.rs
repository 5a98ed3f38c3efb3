//! repo::registry
//!
//! Process-wide table of open repositories.
//!
//! # Sharing
//!
//! Every acquisition of the same repository, from any path inside it,
//! yields the same [`Repository`]. The table counts live acquisitions per
//! root; when the last [`SharedRepository`] from the last acquisition is
//! dropped, the entry is removed and the repository closed while the
//! table lock is held. A concurrent acquire therefore either finds the
//! live handle or opens a fresh one after the old one is gone, never a
//! handle in the middle of being destroyed.
//!
//! # Locking
//!
//! Discovery runs before the table lock is taken. Opening runs under it,
//! so two threads racing on the same root cannot both open it.

use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{debug, warn};

use super::handle::{root_path, OpenOptions, Repository};
use crate::core::config::Config;
use crate::git::{Backend, Git2Backend, GitError};
use crate::watch::{NotifyWatcher, WatchFacility};

struct Entry {
    repo: Arc<Repository>,
    refs: usize,
}

struct RegistryInner {
    backend: Arc<dyn Backend>,
    watcher: Option<Arc<dyn WatchFacility>>,
    options: OpenOptions,
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl RegistryInner {
    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Table of open repositories keyed by metadata directory.
///
/// Clones share the table.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("open", &self.len())
            .field("watching", &self.inner.watcher.is_some())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Registry {
    /// Create a registry over an explicit backend and watch facility.
    pub fn new(
        backend: Arc<dyn Backend>,
        watcher: Option<Arc<dyn WatchFacility>>,
        options: OpenOptions,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                watcher,
                options,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a registry using libgit2 and native watches as configured.
    pub fn from_config(config: &Config) -> Self {
        let watcher: Option<Arc<dyn WatchFacility>> = if config.watch_enabled() {
            Some(Arc::new(NotifyWatcher::new()))
        } else {
            None
        };
        let options = OpenOptions {
            walk: config.walk_options(),
            watch_recursive: config.watch_recursive(),
        };
        Self::new(
            Arc::new(Git2Backend::new(config.backend())),
            watcher,
            options,
        )
    }

    /// The process-wide registry, configured from the user's config file on
    /// first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let config = match Config::load() {
                Ok(loaded) => {
                    if let Some(path) = &loaded.path {
                        debug!(path = %path.display(), "loaded config");
                    }
                    loaded.config
                }
                Err(e) => {
                    warn!(error = %e, "ignoring invalid config; using defaults");
                    Config::default()
                }
            };
            Registry::from_config(&config)
        })
    }

    /// Find the repository root (its metadata directory) for any path
    /// inside it.
    pub fn root_path(&self, path: &Path) -> Result<PathBuf, GitError> {
        root_path(self.inner.backend.as_ref(), path)
    }

    /// Get the shared handle for the repository containing `path`, opening
    /// it if no live handle exists.
    ///
    /// # Errors
    ///
    /// - [`GitError::DiscoveryFailed`] if `path` is not inside a repository
    /// - [`GitError::OpenFailed`] if the discovered root cannot be opened
    pub fn acquire(&self, path: &Path) -> Result<SharedRepository, GitError> {
        let root = self.root_path(path)?;

        let mut entries = self.inner.entries();
        let repo = match entries.get_mut(&root) {
            Some(entry) => {
                entry.refs += 1;
                debug!(root = %root.display(), refs = entry.refs, "repository shared");
                Arc::clone(&entry.repo)
            }
            None => {
                let repo = Arc::new(Repository::open(
                    self.inner.backend.as_ref(),
                    self.inner.watcher.as_deref(),
                    &root,
                    &self.inner.options,
                )?);
                entries.insert(
                    root.clone(),
                    Entry {
                        repo: Arc::clone(&repo),
                        refs: 1,
                    },
                );
                repo
            }
        };
        drop(entries);

        Ok(SharedRepository {
            repo,
            lease: Arc::new(Lease {
                root,
                registry: Arc::clone(&self.inner),
            }),
        })
    }

    /// Number of open repositories.
    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    /// Whether no repository is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether opened handles watch their metadata directory.
    pub fn is_watching(&self) -> bool {
        self.inner.watcher.is_some()
    }

    /// Live acquisitions of the repository at `root`, 0 if not open.
    pub fn ref_count(&self, root: &Path) -> usize {
        self.inner.entries().get(root).map_or(0, |e| e.refs)
    }
}

/// One acquisition. Releases its count on drop.
struct Lease {
    root: PathBuf,
    registry: Arc<RegistryInner>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut entries = self.registry.entries();
        let Some(entry) = entries.get_mut(&self.root) else {
            return;
        };
        entry.refs -= 1;
        if entry.refs == 0 {
            // The table held the last other reference: the repository is
            // closed here, under the lock.
            entries.remove(&self.root);
            debug!(root = %self.root.display(), "repository released");
        }
    }
}

/// A shared handle to an open repository.
///
/// Derefs to [`Repository`]. Cloning shares the acquisition; the
/// repository stays open until every clone of every acquisition is gone.
#[derive(Clone)]
pub struct SharedRepository {
    // Dropped before the lease so the table entry holds the last reference.
    repo: Arc<Repository>,
    lease: Arc<Lease>,
}

impl SharedRepository {
    /// The registry key: the repository's metadata directory.
    pub fn root(&self) -> &Path {
        &self.lease.root
    }

    /// Whether two handles refer to the same open repository.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.repo, &b.repo)
    }
}

impl Deref for SharedRepository {
    type Target = Repository;

    fn deref(&self) -> &Repository {
        &self.repo
    }
}

impl std::fmt::Debug for SharedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRepository")
            .field("root", &self.lease.root)
            .field("repo", &*self.repo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{FailOn, MockBackend, MockRepo};
    use crate::watch::ManualWatcher;
    use std::sync::Barrier;

    const META: &str = "/mock/project/.git";

    fn registry() -> (MockBackend, ManualWatcher, Registry) {
        let backend = MockBackend::new();
        backend.add_repo(MockRepo::new("/mock/project").with_head_file("a.txt", "a\n"));
        backend.add_repo(MockRepo::new("/mock/other"));
        let watcher = ManualWatcher::new();
        let registry = Registry::new(
            Arc::new(backend.clone()),
            Some(Arc::new(watcher.clone())),
            OpenOptions::default(),
        );
        (backend, watcher, registry)
    }

    mod acquire {
        use super::*;

        #[test]
        fn same_repo_from_different_paths() {
            let (backend, _watcher, registry) = registry();
            let a = registry.acquire(Path::new("/mock/project/src")).unwrap();
            let b = registry.acquire(Path::new("/mock/project/docs/x.md")).unwrap();

            assert!(SharedRepository::ptr_eq(&a, &b));
            assert_eq!(a.root(), Path::new(META));
            assert_eq!(registry.len(), 1);
            assert_eq!(registry.ref_count(Path::new(META)), 2);
            assert_eq!(backend.calls().open, 1);
        }

        #[test]
        fn different_repos_get_different_handles() {
            let (_backend, _watcher, registry) = registry();
            let a = registry.acquire(Path::new("/mock/project")).unwrap();
            let b = registry.acquire(Path::new("/mock/other")).unwrap();

            assert!(!SharedRepository::ptr_eq(&a, &b));
            assert_eq!(registry.len(), 2);
        }

        #[test]
        fn outside_any_repo() {
            let (_backend, _watcher, registry) = registry();
            let err = registry.acquire(Path::new("/nowhere")).unwrap_err();
            assert!(matches!(err, GitError::DiscoveryFailed { .. }));
            assert!(registry.is_empty());
        }

        #[test]
        fn failed_open_leaves_no_entry() {
            let (backend, _watcher, registry) = registry();
            backend.fail_on(Some(FailOn::Open));
            let err = registry.acquire(Path::new("/mock/project")).unwrap_err();
            assert!(matches!(err, GitError::OpenFailed { .. }));
            assert!(registry.is_empty());

            backend.fail_on(None);
            assert!(registry.acquire(Path::new("/mock/project")).is_ok());
        }
    }

    mod release {
        use super::*;

        #[test]
        fn last_release_closes() {
            let (_backend, watcher, registry) = registry();
            let a = registry.acquire(Path::new("/mock/project")).unwrap();
            let b = registry.acquire(Path::new("/mock/project")).unwrap();

            drop(a);
            assert_eq!(registry.ref_count(Path::new(META)), 1);
            assert_eq!(watcher.subscription_count(), 1);

            drop(b);
            assert!(registry.is_empty());
            assert_eq!(watcher.subscription_count(), 0);
        }

        #[test]
        fn clones_share_one_acquisition() {
            let (_backend, _watcher, registry) = registry();
            let a = registry.acquire(Path::new("/mock/project")).unwrap();
            let c = a.clone();
            assert_eq!(registry.ref_count(Path::new(META)), 1);

            drop(a);
            assert_eq!(registry.len(), 1);
            assert_eq!(c.work_path(), Path::new("/mock/project"));

            drop(c);
            assert!(registry.is_empty());
        }

        #[test]
        fn reacquire_after_close_opens_fresh() {
            let (backend, _watcher, registry) = registry();
            drop(registry.acquire(Path::new("/mock/project")).unwrap());
            let _again = registry.acquire(Path::new("/mock/project")).unwrap();
            assert_eq!(backend.calls().open, 2);
        }

        #[test]
        fn handle_outlives_registry_value() {
            let (_backend, _watcher, registry) = registry();
            let a = registry.acquire(Path::new("/mock/project")).unwrap();
            let observer = registry.clone();
            drop(registry);

            assert_eq!(observer.len(), 1);
            drop(a);
            assert!(observer.is_empty());
        }
    }

    #[test]
    fn concurrent_acquire_opens_once() {
        let (backend, _watcher, registry) = registry();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let path = PathBuf::from(format!("/mock/project/dir{}", i));
                    registry.acquire(&path).unwrap()
                })
            })
            .collect();

        let repos: Vec<SharedRepository> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(backend.calls().open, 1);
        assert!(repos
            .windows(2)
            .all(|pair| SharedRepository::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(registry.ref_count(Path::new(META)), 8);

        drop(repos);
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_status_and_diff_through_shared_handle() {
        let (backend, _watcher, registry) = registry();
        let repo = registry.acquire(Path::new("/mock/project")).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || {
                    let status = repo.status().unwrap();
                    let snapshot = repo.diff(Path::new("a.txt")).unwrap();
                    let lines = snapshot.lines(b"a\nb\n").unwrap();
                    (status.is_empty(), lines.added)
                })
            })
            .collect();

        for handle in handles {
            let (empty, added) = handle.join().unwrap();
            assert!(empty);
            assert_eq!(added, vec![(1, 2)]);
        }
        assert_eq!(backend.calls().status_walks, 1);
    }
}
