//! Keeps the artifact store and the per-file index consistent across re-transforms.
//!
//! Every transform of a file starts with [`ArtifactCache::evict_file`], which
//! releases all identities the file owned in its previous transform. New
//! artifacts are then committed one call at a time with
//! [`ArtifactCache::commit`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::artifact::{Artifact, ArtifactId};
use crate::file_index::FileArtifactIndex;
use crate::lock;
use crate::store::ArtifactStore;

/// What happens to a stored identity when a file that owned it is re-transformed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Remove the identity only once no file owns it anymore.
    #[default]
    RefCounted,
    /// Remove the identity whenever any owning file is re-transformed, even if
    /// other files still import it.
    Eager,
}

/// Outcome of committing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Identity of the committed artifact.
    pub id: ArtifactId,
    /// `true` if the artifact was newly stored, `false` if an identical one
    /// was already present.
    pub inserted: bool,
    /// `true` if the identity was not yet attributed to the committing file.
    pub attributed: bool,
}

/// Artifact store plus file attribution, guarded for concurrent transforms.
///
/// Lock order is always index then store, so eviction and commits for
/// different files never deadlock and a shared identity cannot be dropped
/// between a commit's store check and its attribution.
#[derive(Default)]
pub struct ArtifactCache {
    store: ArtifactStore,
    index: Mutex<FileArtifactIndex>,
    eviction: EvictionPolicy,
}

impl ArtifactCache {
    /// Creates an empty cache with the given eviction policy.
    pub fn new(eviction: EvictionPolicy) -> Self {
        Self {
            store: ArtifactStore::new(),
            index: Mutex::new(FileArtifactIndex::new()),
            eviction,
        }
    }

    /// Returns the configured eviction policy.
    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Releases every identity attributed to `file` and leaves it with an empty entry.
    ///
    /// Returns the number of identities removed from the store.
    pub fn evict_file(&self, file: &Path) -> usize {
        let mut index = lock(&self.index);
        let previous = index.take(file);
        let mut removed = 0;
        for id in &previous {
            let drop_entry = match self.eviction {
                EvictionPolicy::Eager => true,
                EvictionPolicy::RefCounted => !index.is_referenced(id),
            };
            if drop_entry && self.store.remove(id.as_str()) {
                removed += 1;
            }
        }
        if !previous.is_empty() {
            debug!(
                file = %file.display(),
                released = previous.len(),
                removed,
                "evicted artifacts"
            );
        }
        removed
    }

    /// Hashes, stores and attributes one artifact to `file`.
    ///
    /// `finalize` runs only when the identity is not yet stored and may
    /// mutate the artifact (for example to append a source map) before it is
    /// inserted. The identity is computed from the artifact as passed in.
    pub fn commit<E>(
        &self,
        file: &Path,
        artifact: Artifact,
        finalize: impl FnOnce(&mut Artifact) -> Result<(), E>,
    ) -> Result<Commit, E> {
        let id = ArtifactId::for_artifact(&artifact);
        let mut index = lock(&self.index);
        let inserted = self.store.try_insert_with(&id, || {
            let mut artifact = artifact;
            finalize(&mut artifact)?;
            Ok(artifact)
        })?;
        let attributed = index.attribute(file, &id);
        trace!(file = %file.display(), %id, inserted, "committed artifact");
        Ok(Commit {
            id,
            inserted,
            attributed,
        })
    }

    /// Replaces all artifacts owned by `file` with `artifacts`.
    ///
    /// Returns the identities in generation order, one per distinct artifact.
    pub fn replace(&self, file: &Path, artifacts: Vec<Artifact>) -> Vec<ArtifactId> {
        self.evict_file(file);
        let mut ids = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let commit = self
                .commit::<std::convert::Infallible>(file, artifact, |_| Ok(()))
                .unwrap_or_else(|never| match never {});
            if commit.attributed {
                ids.push(commit.id);
            }
        }
        ids
    }

    /// Returns the identities currently owned by `file`.
    pub fn artifacts_for(&self, file: &Path) -> Vec<ArtifactId> {
        lock(&self.index).artifacts_for(file).to_vec()
    }

    /// Returns `true` if the identity is stored.
    pub fn has(&self, id: &str) -> bool {
        self.store.has(id)
    }

    /// Returns the stored artifact for an identity.
    pub fn get(&self, id: &str) -> Option<Arc<Artifact>> {
        self.store.get(id)
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Drops every artifact and attribution.
    pub fn clear(&self) {
        let mut index = lock(&self.index);
        index.clear();
        self.store.clear();
    }
}
