//! core
//!
//! Configuration and path handling shared by every layer.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Normalization of backend-reported paths

pub mod config;
pub mod paths;
