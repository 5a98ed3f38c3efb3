//! watch::manual
//!
//! A watch facility whose events are fired by hand.
//!
//! # Example
//!
//! ```
//! use repowatch::watch::{ManualWatcher, WatchEvent, WatchFacility};
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let watcher = ManualWatcher::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! let sub = watcher
//!     .subscribe(Path::new("/repo/.git"), true, Box::new(move |_| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }))
//!     .unwrap();
//!
//! watcher.fire(WatchEvent::changed("/repo/.git/index"));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! drop(sub);
//! watcher.fire(WatchEvent::changed("/repo/.git/index"));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Subscription, WatchCallback, WatchError, WatchEvent, WatchFacility};

/// Manually driven watch facility.
///
/// Clones share subscribers.
#[derive(Clone, Default)]
pub struct ManualWatcher {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    id: u64,
    dir: PathBuf,
    recursive: bool,
    callback: Arc<WatchCallback>,
}

impl Subscriber {
    fn wants(&self, path: &Path) -> bool {
        if self.recursive {
            path.starts_with(&self.dir)
        } else {
            path == self.dir || path.parent() == Some(self.dir.as_path())
        }
    }
}

impl std::fmt::Debug for ManualWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualWatcher")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

impl ManualWatcher {
    /// Create a facility with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver `event` to every subscription covering its path.
    ///
    /// Returns the number of callbacks invoked. Callbacks run on the
    /// calling thread, outside the facility's lock.
    pub fn fire(&self, event: WatchEvent) -> usize {
        let targets: Vec<Arc<WatchCallback>> = self
            .state()
            .subscribers
            .iter()
            .filter(|s| s.wants(&event.path))
            .map(|s| Arc::clone(&s.callback))
            .collect();

        for callback in &targets {
            callback(event.clone());
        }
        targets.len()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Whether some live subscription watches exactly `dir`.
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.state().subscribers.iter().any(|s| s.dir == dir)
    }
}

impl WatchFacility for ManualWatcher {
    fn subscribe(
        &self,
        dir: &Path,
        recursive: bool,
        callback: WatchCallback,
    ) -> Result<Box<dyn Subscription>, WatchError> {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber {
            id,
            dir: dir.to_path_buf(),
            recursive,
            callback: Arc::new(callback),
        });

        Ok(Box::new(ManualSubscription {
            id,
            path: dir.to_path_buf(),
            watcher: self.clone(),
        }))
    }
}

struct ManualSubscription {
    id: u64,
    path: PathBuf,
    watcher: ManualWatcher,
}

impl Subscription for ManualSubscription {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ManualSubscription {
    fn drop(&mut self) {
        let id = self.id;
        self.watcher.state().subscribers.retain(|s| s.id != id);
    }
}
