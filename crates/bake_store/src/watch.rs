//! Maps watched filesystem paths back to the macro resolutions depending on them.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lock;

/// A macro module specifier as resolved from one importing file.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct WatchTarget {
    /// The macro module specifier, as written in the import.
    pub specifier: String,
    /// The file whose import resolved `specifier`.
    pub importer: PathBuf,
}

impl WatchTarget {
    /// Creates a new watch target.
    pub fn new(specifier: impl Into<String>, importer: impl Into<PathBuf>) -> Self {
        Self {
            specifier: specifier.into(),
            importer: importer.into(),
        }
    }
}

/// Thread-safe index from dependency paths to the resolutions that depend on them.
///
/// Recording is additive and idempotent. A change notification invalidates
/// each distinct target recorded for the path exactly once.
#[derive(Default)]
pub struct DependencyWatchIndex {
    entries: Mutex<HashMap<PathBuf, BTreeSet<WatchTarget>>>,
}

impl DependencyWatchIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the resolution of `specifier` from `importer` depends on `dependency`.
    ///
    /// Returns `false` if the triple was already recorded.
    pub fn record(&self, dependency: &Path, specifier: &str, importer: &Path) -> bool {
        let added = lock(&self.entries)
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(WatchTarget::new(specifier, importer));
        if added {
            debug!(
                dependency = %dependency.display(),
                specifier,
                importer = %importer.display(),
                "watching macro dependency"
            );
        }
        added
    }

    /// Returns the targets recorded for `dependency`, in sorted order.
    pub fn targets(&self, dependency: &Path) -> Vec<WatchTarget> {
        lock(&self.entries)
            .get(dependency)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Handles a change of `dependency`, calling `invalidate` once per recorded target.
    ///
    /// The index lock is released before `invalidate` runs, so the callback
    /// may block or call back into the index. Returns the number of targets
    /// invalidated; unknown paths invalidate nothing.
    pub fn on_change(&self, dependency: &Path, mut invalidate: impl FnMut(&WatchTarget)) -> usize {
        let targets = self.targets(dependency);
        for target in &targets {
            invalidate(target);
        }
        if !targets.is_empty() {
            debug!(
                dependency = %dependency.display(),
                invalidated = targets.len(),
                "macro dependency changed"
            );
        }
        targets.len()
    }

    /// Returns the number of watched paths.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if no path is watched.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Forgets every recorded dependency.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_idempotent() {
        let index = DependencyWatchIndex::new();
        let dep = Path::new("/proj/macro.js");
        assert!(index.record(dep, "./macro", Path::new("/proj/a.js")));
        assert!(!index.record(dep, "./macro", Path::new("/proj/a.js")));
        assert_eq!(index.targets(dep).len(), 1);
    }

    #[test]
    fn unknown_path_is_noop() {
        let index = DependencyWatchIndex::new();
        let mut calls = 0;
        let n = index.on_change(Path::new("/nothing"), |_| calls += 1);
        assert_eq!(n, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn change_invalidates_each_distinct_target_once() {
        let index = DependencyWatchIndex::new();
        let dep = Path::new("/proj/macro.js");
        index.record(dep, "./macro", Path::new("/proj/a.js"));
        index.record(dep, "./macro", Path::new("/proj/a.js"));
        index.record(dep, "./macro", Path::new("/proj/b.js"));
        index.record(dep, "../macro", Path::new("/proj/sub/c.js"));

        let mut seen = Vec::new();
        let n = index.on_change(dep, |t| seen.push(t.clone()));
        assert_eq!(n, 3);
        assert_eq!(
            seen,
            vec![
                WatchTarget::new("../macro", "/proj/sub/c.js"),
                WatchTarget::new("./macro", "/proj/a.js"),
                WatchTarget::new("./macro", "/proj/b.js"),
            ]
        );
    }

    #[test]
    fn many_paths_map_to_one_target() {
        let index = DependencyWatchIndex::new();
        let importer = Path::new("/proj/a.js");
        index.record(Path::new("/proj/macro.js"), "./macro", importer);
        index.record(Path::new("/proj/package.json"), "./macro", importer);
        assert_eq!(index.len(), 2);

        let mut calls = 0;
        index.on_change(Path::new("/proj/package.json"), |_| calls += 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn callback_may_reenter_index() {
        let index = DependencyWatchIndex::new();
        let dep = Path::new("/proj/macro.js");
        index.record(dep, "./macro", Path::new("/proj/a.js"));
        index.on_change(dep, |t| {
            index.record(Path::new("/proj/other.js"), &t.specifier, &t.importer);
        });
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn clear_forgets_everything() {
        let index = DependencyWatchIndex::new();
        index.record(Path::new("/a"), "./m", Path::new("/b"));
        index.clear();
        assert!(index.is_empty());
    }
}
