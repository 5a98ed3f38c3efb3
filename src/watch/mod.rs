//! watch
//!
//! Filesystem change subscriptions.
//!
//! # Design
//!
//! A [`WatchFacility`] hands out [`Subscription`]s. The subscription owns
//! the OS watch and tears it down when dropped, so a repository handle that
//! owns its subscription stops receiving events exactly when it is
//! destroyed.
//!
//! Events are classified into two kinds only:
//!
//! - [`WatchEventKind::Changed`]: something under the directory changed
//! - [`WatchEventKind::ChangesDone`]: a writer finished a burst of changes
//!   (a file opened for writing was closed). This always follows the
//!   `Changed` events it summarizes.
//!
//! Callbacks run on whatever thread the facility delivers on and must stay
//! cheap: no backend calls, no blocking on locks held across backend calls.
//!
//! # Implementations
//!
//! - [`NotifyWatcher`]: native OS notifications via `notify`
//! - [`ManualWatcher`]: events fired by hand, for tests

mod manual;
mod notify_watcher;

pub use manual::ManualWatcher;
pub use notify_watcher::NotifyWatcher;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from watch subscriptions.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The native watcher could not be created.
    #[error("failed to create watcher: {0}")]
    Create(#[source] notify::Error),

    /// The directory could not be watched.
    #[error("failed to watch {path}: {source}")]
    WatchPath {
        /// The directory
        path: PathBuf,
        /// Underlying cause
        source: notify::Error,
    },
}

/// Kind of change reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// Something changed.
    Changed,
    /// A burst of changes just completed.
    ChangesDone,
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// What happened
    pub kind: WatchEventKind,
    /// The affected path
    pub path: PathBuf,
}

impl WatchEvent {
    /// A `Changed` event.
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Changed,
            path: path.into(),
        }
    }

    /// A `ChangesDone` hint.
    pub fn changes_done(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::ChangesDone,
            path: path.into(),
        }
    }

    /// Whether this is only the end-of-burst hint.
    pub fn is_changes_done(&self) -> bool {
        self.kind == WatchEventKind::ChangesDone
    }
}

/// Callback invoked for each event.
pub type WatchCallback = Box<dyn Fn(WatchEvent) + Send + Sync + 'static>;

/// Something that can watch directories.
pub trait WatchFacility: Send + Sync {
    /// Start delivering events for `dir` to `callback`.
    ///
    /// Events stop when the returned subscription is dropped.
    fn subscribe(
        &self,
        dir: &Path,
        recursive: bool,
        callback: WatchCallback,
    ) -> Result<Box<dyn Subscription>, WatchError>;
}

/// A live watch. Dropping it unsubscribes.
pub trait Subscription: Send + Sync {
    /// The watched directory.
    fn path(&self) -> &Path;
}
