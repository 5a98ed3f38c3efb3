//! watch::notify_watcher
//!
//! Native filesystem notifications via `notify`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::{Subscription, WatchCallback, WatchError, WatchEvent, WatchEventKind, WatchFacility};

impl From<&EventKind> for WatchEventKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            // A writer closed the file: the burst that produced the
            // preceding modify events is over.
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => WatchEventKind::ChangesDone,
            _ => WatchEventKind::Changed,
        }
    }
}

/// Watch facility backed by the platform's native watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcher {
    _private: (),
}

impl NotifyWatcher {
    /// Create the facility. Watchers are created per subscription.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchFacility for NotifyWatcher {
    fn subscribe(
        &self,
        dir: &Path,
        recursive: bool,
        callback: WatchCallback,
    ) -> Result<Box<dyn Subscription>, WatchError> {
        let watched = dir.to_path_buf();
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let kind = WatchEventKind::from(&event.kind);
                if event.paths.is_empty() {
                    callback(WatchEvent {
                        kind,
                        path: watched.clone(),
                    });
                }
                for path in event.paths {
                    callback(WatchEvent { kind, path });
                }
            }
            Err(e) => {
                // Events may have been dropped (e.g. queue overflow).
                warn!(dir = %watched.display(), error = %e, "watch error");
                callback(WatchEvent::changed(watched.clone()));
            }
        };

        let mut watcher =
            RecommendedWatcher::new(handler, Config::default()).map_err(WatchError::Create)?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(dir, mode)
            .map_err(|e| WatchError::WatchPath {
                path: dir.to_path_buf(),
                source: e,
            })?;

        debug!(dir = %dir.display(), recursive, "watch installed");
        Ok(Box::new(NotifySubscription {
            path: dir.to_path_buf(),
            watcher: Mutex::new(watcher),
        }))
    }
}

/// A live native watch.
struct NotifySubscription {
    path: PathBuf,
    watcher: Mutex<RecommendedWatcher>,
}

impl Subscription for NotifySubscription {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NotifySubscription {
    fn drop(&mut self) {
        let watcher = self
            .watcher
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = watcher.unwatch(&self.path) {
            // The directory may already be gone.
            debug!(dir = %self.path.display(), error = %e, "unwatch failed");
        }
        debug!(dir = %self.path.display(), "watch removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};

    mod classify {
        use super::*;

        #[test]
        fn close_after_write_is_changes_done() {
            let kind = EventKind::Access(AccessKind::Close(AccessMode::Write));
            assert_eq!(WatchEventKind::from(&kind), WatchEventKind::ChangesDone);
        }

        #[test]
        fn modifications_are_changes() {
            for kind in [
                EventKind::Create(CreateKind::File),
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                EventKind::Remove(RemoveKind::File),
                EventKind::Any,
            ] {
                assert_eq!(WatchEventKind::from(&kind), WatchEventKind::Changed);
            }
        }
    }

    #[test]
    fn subscribe_to_missing_dir_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");

        let result = NotifyWatcher::new().subscribe(&missing, true, Box::new(|_| {}));
        assert!(matches!(result, Err(WatchError::WatchPath { .. })));
    }

    #[test]
    fn subscription_reports_its_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let sub = NotifyWatcher::new()
            .subscribe(temp.path(), false, Box::new(|_| {}))
            .unwrap();
        assert_eq!(sub.path(), temp.path());
    }
}
