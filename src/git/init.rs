//! git::init
//!
//! Process-wide backend setup and the backend lock.
//!
//! # Invariants
//!
//! - Global options are applied exactly once, by whichever caller gets
//!   there first; later callers observe the options that won
//! - Every call into the backend runs while holding [`backend_lock`]
//! - The lock is held for one backend call only, never across a watch
//!   callback or a return to the caller
//!
//! No teardown is performed. libgit2's global state is reclaimed at process
//! exit, after every repository handle is gone.

use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing::debug;

use crate::core::config::BackendConfig;

static INITIALIZED: OnceLock<BackendConfig> = OnceLock::new();

static BACKEND_LOCK: Mutex<()> = Mutex::new(());

/// Apply the backend's process-global options, once.
///
/// Calling any `git2::opts` setter also runs libgit2's own global init,
/// so this doubles as the init gate.
pub fn ensure_initialized(config: &BackendConfig) -> &'static BackendConfig {
    INITIALIZED.get_or_init(|| {
        let _guard = backend_lock();
        git2::opts::enable_caching(config.object_caching);
        git2::opts::strict_hash_verification(config.strict_hash_verification);
        debug!(
            object_caching = config.object_caching,
            strict_hash_verification = config.strict_hash_verification,
            "backend initialized"
        );
        config.clone()
    })
}

/// Whether [`ensure_initialized`] has run.
pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}

/// Serialize access to the backend.
///
/// libgit2 is not safe for concurrent entry across its internal caches.
/// A panic while holding the guard leaves no state behind it, so a
/// poisoned lock is simply taken over.
pub fn backend_lock() -> MutexGuard<'static, ()> {
    BACKEND_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_is_idempotent() {
        let first = ensure_initialized(&BackendConfig::default());
        let other = BackendConfig {
            object_caching: !first.object_caching,
            ..BackendConfig::default()
        };
        let second = ensure_initialized(&other);

        assert!(is_initialized());
        assert_eq!(first, second);
    }

    #[test]
    fn concurrent_initialization_runs_once() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ensure_initialized(&BackendConfig::default()).clone()))
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn lock_recovers_from_poison() {
        let _ = std::thread::spawn(|| {
            let _guard = backend_lock();
            panic!("poison the backend lock");
        })
        .join();

        drop(backend_lock());
    }
}
