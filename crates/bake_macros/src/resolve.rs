//! Module resolution seam consumed by the invoker.
//!
//! Resolution itself (package lookup, loading, installing) belongs to the
//! host. The orchestrator only needs to know whether a specifier resolved,
//! which files the resolution depends on, and how to drop a stale result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::module::MacroModule;

/// Errors reported by a [`ModuleResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No module matches the specifier.
    #[error("Cannot find module '{specifier}' from '{importer}'")]
    NotFound {
        /// The requested specifier.
        specifier: String,
        /// The importing file, displayed.
        importer: String,
    },
    /// The module was found but could not be loaded.
    #[error("Failed to load module '{specifier}': {message}")]
    Load {
        /// The requested specifier.
        specifier: String,
        /// The loader's message.
        message: String,
    },
}

impl ResolveError {
    /// Creates a [`ResolveError::NotFound`].
    pub fn not_found(specifier: &str, importer: &Path) -> Self {
        ResolveError::NotFound {
            specifier: specifier.to_string(),
            importer: importer.display().to_string(),
        }
    }
}

/// A successfully resolved macro module.
#[derive(Clone)]
pub struct ResolvedModule {
    /// The loaded module.
    pub module: Arc<dyn MacroModule>,
    /// Where the module was resolved to.
    pub path: PathBuf,
    /// Files whose change invalidates this resolution.
    pub dependencies: Vec<PathBuf>,
}

impl std::fmt::Debug for ResolvedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModule")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Resolves macro specifiers relative to an importing file.
///
/// Implementations may block (loading from disk, installing packages); the
/// invoker never holds a lock while calling them.
pub trait ModuleResolver: Send + Sync {
    /// Resolves `specifier` as imported from `importer`.
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<ResolvedModule, ResolveError>;

    /// Drops any cached resolution of `specifier` from `importer`.
    fn invalidate(&self, specifier: &str, importer: &Path);
}

/// Loads a module without caching. Wrap in a [`CachingResolver`].
pub trait ModuleLoader: Send + Sync {
    /// Loads `specifier` as imported from `importer`.
    fn load(&self, specifier: &str, importer: &Path) -> Result<ResolvedModule, ResolveError>;
}

type ResolutionKey = (String, PathBuf);

/// Memoizes a [`ModuleLoader`] per `(specifier, importer)` pair.
pub struct CachingResolver<L> {
    loader: L,
    cache: Mutex<HashMap<ResolutionKey, ResolvedModule>>,
}

impl<L: ModuleLoader> CachingResolver<L> {
    /// Wraps `loader`.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the wrapped loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Returns `true` if a resolution is cached for the pair.
    pub fn is_cached(&self, specifier: &str, importer: &Path) -> bool {
        self.lock()
            .contains_key(&(specifier.to_string(), importer.to_path_buf()))
    }

    /// Returns the number of cached resolutions.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResolutionKey, ResolvedModule>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: ModuleLoader> ModuleResolver for CachingResolver<L> {
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<ResolvedModule, ResolveError> {
        let key = (specifier.to_string(), importer.to_path_buf());
        if let Some(hit) = self.lock().get(&key) {
            trace!(specifier, importer = %importer.display(), "resolution cache hit");
            return Ok(hit.clone());
        }
        // Loading may block, so the cache lock is not held across it.
        let resolved = self.loader.load(specifier, importer)?;
        debug!(
            specifier,
            importer = %importer.display(),
            path = %resolved.path.display(),
            "resolved macro module"
        );
        self.lock().insert(key, resolved.clone());
        Ok(resolved)
    }

    fn invalidate(&self, specifier: &str, importer: &Path) {
        let removed = self
            .lock()
            .remove(&(specifier.to_string(), importer.to_path_buf()))
            .is_some();
        debug!(specifier, importer = %importer.display(), removed, "invalidated resolution");
    }
}

/// A module registered with [`StaticModules`].
#[derive(Clone)]
pub struct StaticModule {
    module: Arc<dyn MacroModule>,
    path: PathBuf,
    dependencies: Vec<PathBuf>,
}

impl StaticModule {
    /// Registers `module` as living at `path`.
    pub fn new(path: impl Into<PathBuf>, module: impl MacroModule + 'static) -> Self {
        Self {
            module: Arc::new(module),
            path: path.into(),
            dependencies: Vec::new(),
        }
    }

    /// Declares a file whose change invalidates resolutions of this module.
    pub fn depends_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependencies.push(path.into());
        self
    }
}

/// An in-process [`ModuleLoader`] serving modules registered by specifier.
///
/// The module path itself is always reported as a dependency, ahead of any
/// declared with [`StaticModule::depends_on`]. Clones share one registry, so
/// a handle kept outside a [`CachingResolver`] can swap modules between
/// builds.
#[derive(Clone, Default)]
pub struct StaticModules {
    modules: Arc<Mutex<HashMap<String, StaticModule>>>,
}

impl StaticModules {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module, returning `self` for chaining.
    pub fn with(self, specifier: impl Into<String>, module: StaticModule) -> Self {
        self.register(specifier, module);
        self
    }

    /// Registers or replaces a module.
    pub fn register(&self, specifier: impl Into<String>, module: StaticModule) {
        self.modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(specifier.into(), module);
    }
}

impl ModuleLoader for StaticModules {
    fn load(&self, specifier: &str, importer: &Path) -> Result<ResolvedModule, ResolveError> {
        let modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = modules
            .get(specifier)
            .ok_or_else(|| ResolveError::not_found(specifier, importer))?;
        let mut dependencies = Vec::with_capacity(entry.dependencies.len() + 1);
        dependencies.push(entry.path.clone());
        dependencies.extend(entry.dependencies.iter().cloned());
        Ok(ResolvedModule {
            module: Arc::clone(&entry.module),
            path: entry.path.clone(),
            dependencies,
        })
    }
}
