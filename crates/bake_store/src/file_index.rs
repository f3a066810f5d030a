//! Per-source-file attribution of artifact identities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactId;

/// Records, for every transformed source file, the ordered identities it owns.
///
/// The index is not synchronized on its own; [`ArtifactCache`](crate::ArtifactCache)
/// guards it together with the store so that attribution and eviction are
/// observed atomically.
#[derive(Debug, Default)]
pub struct FileArtifactIndex {
    by_file: HashMap<PathBuf, Vec<ArtifactId>>,
}

impl FileArtifactIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the entry for `file` to an empty list, returning its previous identities.
    pub fn take(&mut self, file: &Path) -> Vec<ArtifactId> {
        self.by_file
            .insert(file.to_path_buf(), Vec::new())
            .unwrap_or_default()
    }

    /// Attributes `id` to `file`.
    ///
    /// Returns `false` if the file already owned that identity.
    pub fn attribute(&mut self, file: &Path, id: &ArtifactId) -> bool {
        let ids = self.by_file.entry(file.to_path_buf()).or_default();
        if ids.contains(id) {
            return false;
        }
        ids.push(id.clone());
        true
    }

    /// Returns the identities currently attributed to `file`, in generation order.
    pub fn artifacts_for(&self, file: &Path) -> &[ArtifactId] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if any file still owns `id`.
    pub fn is_referenced(&self, id: &ArtifactId) -> bool {
        self.by_file.values().any(|ids| ids.contains(id))
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.by_file.clear();
    }
}
