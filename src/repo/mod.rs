//! repo
//!
//! Shared, cached repository handles.
//!
//! # Architecture
//!
//! - [`Registry`] hands out one [`SharedRepository`] per repository and
//!   closes it when the last holder lets go
//! - [`Repository`] caches the work-tree [`Status`] and empties the cache
//!   whenever its metadata directory changes
//! - [`DiffSnapshot`] compares editor buffers against the committed file
//!
//! All backend calls made from here hold
//! [`backend_lock`](crate::git::backend_lock), so handles can be used from
//! any thread.

mod diff;
mod handle;
mod registry;
mod status;

pub use diff::{DiffSnapshot, Lines};
pub use handle::{root_path, OpenOptions, Repository};
pub use registry::{Registry, SharedRepository};
pub use status::Status;
