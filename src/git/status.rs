//! git::status
//!
//! Classification of raw status flags.
//!
//! A single path can carry several flags at once (staged as new and also
//! ignored, say). [`FileStatus::classify`] reduces them to one value using a
//! fixed priority, first match wins:
//!
//! new > modified > deleted > renamed > typechange > unreadable > ignored >
//! conflicted > current
//!
//! Index and work-tree flags of the same kind are treated alike.

use std::fmt;

use git2::Status;

/// `GIT_STATUS_WT_UNREADABLE`, which `git2::Status` has no constant for.
pub(crate) const WT_UNREADABLE: Status = Status::from_bits_retain(1 << 12);

/// The single state reported for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileStatus {
    /// Unchanged since `HEAD`.
    Current,
    /// Untracked, or staged as a new file.
    New,
    /// Content differs from `HEAD`.
    Modified,
    /// Removed from the index or work tree.
    Deleted,
    /// Renamed in the index or work tree.
    Renamed,
    /// File type changed (e.g. file to symlink).
    TypeChange,
    /// Present but could not be read.
    Unreadable,
    /// Matched by an ignore rule.
    Ignored,
    /// Has unresolved merge conflicts.
    Conflicted,
}

impl FileStatus {
    /// Reduce raw flags to one status.
    ///
    /// # Example
    ///
    /// ```
    /// use git2::Status;
    /// use repowatch::git::FileStatus;
    ///
    /// let flags = Status::WT_NEW | Status::IGNORED;
    /// assert_eq!(FileStatus::classify(flags), FileStatus::New);
    /// assert_eq!(FileStatus::classify(Status::CURRENT), FileStatus::Current);
    /// ```
    pub fn classify(flags: Status) -> Self {
        if flags.intersects(Status::INDEX_NEW | Status::WT_NEW) {
            FileStatus::New
        } else if flags.intersects(Status::INDEX_MODIFIED | Status::WT_MODIFIED) {
            FileStatus::Modified
        } else if flags.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
            FileStatus::Deleted
        } else if flags.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
            FileStatus::Renamed
        } else if flags.intersects(Status::INDEX_TYPECHANGE | Status::WT_TYPECHANGE) {
            FileStatus::TypeChange
        } else if flags.intersects(WT_UNREADABLE) {
            FileStatus::Unreadable
        } else if flags.intersects(Status::IGNORED) {
            FileStatus::Ignored
        } else if flags.intersects(Status::CONFLICTED) {
            FileStatus::Conflicted
        } else {
            FileStatus::Current
        }
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Current => "current",
            FileStatus::New => "new",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::TypeChange => "typechange",
            FileStatus::Unreadable => "unreadable",
            FileStatus::Ignored => "ignored",
            FileStatus::Conflicted => "conflicted",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
