//! Content-addressed map from artifact identities to finalized artifacts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::artifact::{Artifact, ArtifactId};
use crate::lock;

/// Thread-safe store of finalized artifacts keyed by [`ArtifactId`].
///
/// Entries are immutable once inserted. Inserting an identity that is already
/// present leaves the existing entry untouched; since identities are derived
/// from content, the existing entry already has the same bytes.
#[derive(Default)]
pub struct ArtifactStore {
    entries: Mutex<HashMap<ArtifactId, Arc<Artifact>>>,
}

impl ArtifactStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the artifact produced by `build` unless `id` is already stored.
    ///
    /// `build` only runs when the identity is absent, so finalization work
    /// (such as attaching a source map) happens once per stored artifact.
    /// Returns `Ok(true)` if a new entry was inserted.
    pub fn try_insert_with<E>(
        &self,
        id: &ArtifactId,
        build: impl FnOnce() -> Result<Artifact, E>,
    ) -> Result<bool, E> {
        let mut entries = lock(&self.entries);
        if entries.contains_key(id) {
            return Ok(false);
        }
        let artifact = build()?;
        entries.insert(id.clone(), Arc::new(artifact));
        Ok(true)
    }

    /// Inserts `artifact` under `id` unless the identity is already stored.
    pub fn insert(&self, id: &ArtifactId, artifact: Artifact) -> bool {
        self.try_insert_with::<std::convert::Infallible>(id, || Ok(artifact))
            .unwrap_or_else(|never| match never {})
    }

    /// Returns `true` if the identity is stored.
    pub fn has(&self, id: &str) -> bool {
        lock(&self.entries).contains_key(id)
    }

    /// Returns the stored artifact for an identity.
    pub fn get(&self, id: &str) -> Option<Arc<Artifact>> {
        lock(&self.entries).get(id).cloned()
    }

    /// Removes an identity, returning `true` if it was present.
    pub fn remove(&self, id: &str) -> bool {
        lock(&self.entries).remove(id).is_some()
    }

    /// Returns the number of stored artifacts.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Removes every stored artifact.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}
