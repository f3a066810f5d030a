//! In-memory, content-addressed storage for macro-generated artifacts.
//!
//! This crate holds the shared mutable state of a build session: the
//! [`ArtifactStore`] keyed by content-derived [`ArtifactId`]s, the per-file
//! [`FileArtifactIndex`] that records which identities each source file
//! currently owns, the [`ArtifactCache`] that keeps the two consistent across
//! re-transforms, and the [`DependencyWatchIndex`] mapping watched paths back
//! to the macro resolutions that depend on them.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod file_index;
pub mod store;
pub mod watch;

pub use artifact::{Artifact, ArtifactId, ARTIFACT_ID_PREFIX};
pub use cache::{ArtifactCache, Commit, EvictionPolicy};
pub use file_index::FileArtifactIndex;
pub use store::ArtifactStore;
pub use watch::{DependencyWatchIndex, WatchTarget};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// No code path panics while holding one of these locks, so the protected
/// maps are always consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
