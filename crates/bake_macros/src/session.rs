//! The per-build macro session: transforms, virtual modules and watch events.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use bake_common::CallSite;
use bake_config::BakeConfig;
use bake_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, ErrorTranslator, FullStack, MacroError,
    MarkerTrimmer, StackTrimmer, TerminalRenderer,
};
use bake_source::{SourceFile, SourceType};
use bake_sourcemap::SourceMapStitcher;
use bake_store::{Artifact, ArtifactCache, ArtifactId, DependencyWatchIndex};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::context::MacroValue;
use crate::invoker::{InvokeError, InvokeRequest, MacroInvoker};
use crate::parser::{MacroCall, MacroParser, ParseIssue, ParseRequest};
use crate::resolve::ModuleResolver;

/// Matches the `with { type: 'macro' }` import attribute.
static MACRO_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"with\s*\{\s*type:\s*['"]macro['"]\s*\}"#)
        .expect("macro attribute pattern is valid")
});

/// A transformed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOutput {
    /// Rewritten code followed by one `import "<id>";` line per artifact.
    pub code: String,
    /// The parser's source map, passed through.
    pub map: Option<String>,
    /// Artifact identities attributed to the file, in generation order.
    pub artifacts: Vec<ArtifactId>,
    /// Files the bundler should watch on behalf of this file.
    pub watch_files: Vec<PathBuf>,
}

/// A failed transform. The file keeps no artifacts, but the dependencies
/// recorded before the failure stay watched.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to expand macros in {}: {} error(s)", .file.display(), .diagnostics.len())]
pub struct TransformError {
    /// The file that failed.
    pub file: PathBuf,
    /// Everything that went wrong, macro failures first.
    pub diagnostics: Vec<Diagnostic>,
    /// Files the bundler should watch so a fix triggers a rebuild.
    pub watch_files: Vec<PathBuf>,
    code: Arc<str>,
}

impl TransformError {
    /// Renders every diagnostic against the file's source.
    pub fn render(&self, renderer: &dyn DiagnosticRenderer) -> String {
        let file = SourceFile::new(self.file.clone(), self.code.to_string());
        self.diagnostics
            .iter()
            .map(|diag| renderer.render(diag, Some(&file)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders every diagnostic with the [`TerminalRenderer`].
    pub fn render_terminal(&self) -> String {
        self.render(&TerminalRenderer::new())
    }

    /// Returns the macro errors in the order they occurred.
    pub fn macro_errors(&self) -> impl Iterator<Item = &MacroError> {
        self.diagnostics.iter().filter_map(|d| d.macro_error.as_ref())
    }
}

/// Shared state for one build session.
///
/// Transforms of distinct files may run concurrently; all maps are guarded
/// internally and no lock is held while a macro or resolver runs.
pub struct MacroSession {
    config: BakeConfig,
    cache: ArtifactCache,
    watch: DependencyWatchIndex,
    resolver: Arc<dyn ModuleResolver>,
    translator: ErrorTranslator,
    stitcher: SourceMapStitcher,
}

impl MacroSession {
    /// Creates a session from configuration and a resolver.
    pub fn new(config: BakeConfig, resolver: Arc<dyn ModuleResolver>) -> Self {
        let trimmer: Arc<dyn StackTrimmer> = if config.errors.trim_stacks {
            Arc::new(MarkerTrimmer::new(config.errors.stack_marker.clone()))
        } else {
            Arc::new(FullStack)
        };
        Self {
            cache: ArtifactCache::new(config.artifacts.eviction),
            watch: DependencyWatchIndex::new(),
            resolver,
            translator: ErrorTranslator::new(trimmer),
            stitcher: SourceMapStitcher::new(),
            config,
        }
    }

    /// Emits artifact source map paths relative to `root`.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.stitcher = SourceMapStitcher::with_project_root(root);
        self
    }

    /// Replaces the stack trimmer used for execution failures.
    pub fn with_stack_trimmer(mut self, trimmer: Arc<dyn StackTrimmer>) -> Self {
        self.translator = ErrorTranslator::new(trimmer);
        self
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    /// Returns the artifact cache.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Returns the dependency watch index.
    pub fn watch_index(&self) -> &DependencyWatchIndex {
        &self.watch
    }

    /// Returns `true` if `path` is included and `code` imports a macro.
    pub fn should_transform(&self, path: &Path, code: &str) -> bool {
        self.config.include.matches(path) && MACRO_ATTRIBUTE.is_match(code)
    }

    /// Expands every macro call in one file.
    ///
    /// Returns `Ok(None)` for files that are not candidates; their previous
    /// artifacts are left alone. Otherwise the file's previous artifacts are
    /// released first, and released again if any call fails.
    pub fn transform(
        &self,
        path: &Path,
        code: &str,
        parser: &dyn MacroParser,
    ) -> Result<Option<TransformOutput>, TransformError> {
        let candidate = SourceType::from_path(path).filter(|_| self.should_transform(path, code));
        let Some(source_type) = candidate else {
            trace!(file = %path.display(), "skipping transform");
            return Ok(None);
        };
        debug!(file = %path.display(), %source_type, "transforming");

        self.cache.evict_file(path);

        let invoker = MacroInvoker::new(
            &self.cache,
            &self.watch,
            self.resolver.as_ref(),
            &self.translator,
            self.config.artifacts.source_maps.then_some(&self.stitcher),
        );
        let mut artifacts = Vec::new();
        let mut watch_files = Vec::new();
        let mut failures = Vec::new();

        let mut expand = |call: MacroCall| -> Result<MacroValue, MacroError> {
            let request = InvokeRequest {
                specifier: &call.specifier,
                export_name: &call.export_name,
                importer: path,
                location: call.location,
                args: &call.args,
                source: code,
            };
            match invoker.invoke(&request) {
                Ok(invocation) => {
                    artifacts.extend(invocation.artifacts);
                    merge_watch_files(&mut watch_files, invocation.dependencies);
                    Ok(invocation.value)
                }
                Err(InvokeError {
                    error,
                    dependencies,
                }) => {
                    merge_watch_files(&mut watch_files, dependencies);
                    failures.push(Diagnostic::from_macro_error(
                        error.clone(),
                        CallSite::new(path, call.location),
                    ));
                    Err(error)
                }
            }
        };

        let request = ParseRequest {
            source_type,
            path,
            code,
        };
        let parsed = parser.transform(request, &mut expand);

        let mut diagnostics = failures;
        let parsed = match parsed {
            Ok(parsed) if diagnostics.is_empty() => parsed,
            Ok(_) => return Err(self.fail(path, code, diagnostics, watch_files)),
            Err(issues) => {
                diagnostics.extend(issues.into_iter().map(|issue| issue_diagnostic(path, issue)));
                return Err(self.fail(path, code, diagnostics, watch_files));
            }
        };

        let mut output = parsed.code;
        output.push('\n');
        output.push_str(
            &artifacts
                .iter()
                .map(|id| format!("import \"{id}\";"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        debug!(
            file = %path.display(),
            artifacts = artifacts.len(),
            watch_files = watch_files.len(),
            "transformed"
        );
        Ok(Some(TransformOutput {
            code: output,
            map: parsed.map,
            artifacts,
            watch_files,
        }))
    }

    /// Transforms independent files in parallel.
    ///
    /// Results are returned in input order.
    pub fn transform_batch<P, C>(
        &self,
        files: &[(P, C)],
        parser: &dyn MacroParser,
    ) -> Vec<Result<Option<TransformOutput>, TransformError>>
    where
        P: AsRef<Path> + Sync,
        C: AsRef<str> + Sync,
    {
        files
            .par_iter()
            .map(|(path, code)| self.transform(path.as_ref(), code.as_ref(), parser))
            .collect()
    }

    /// Answers a bundler resolve request: `Some(id)` if the session owns it.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.is_owned(id).then(|| id.to_string())
    }

    /// Returns `true` if `id` names a stored artifact.
    ///
    /// Specifiers that are not shaped like an artifact identity are rejected
    /// without touching the store.
    pub fn is_owned(&self, id: &str) -> bool {
        ArtifactId::parse(id).is_some() && self.cache.has(id)
    }

    /// Returns the stored artifact for `id`.
    pub fn load(&self, id: &str) -> Option<Arc<Artifact>> {
        self.cache.get(id)
    }

    /// Handles a change to `path`, invalidating every resolution recorded
    /// against it. Returns the number of invalidations.
    pub fn on_file_changed(&self, path: &Path) -> usize {
        self.watch.on_change(path, |target| {
            self.resolver.invalidate(&target.specifier, &target.importer);
        })
    }

    /// Returns the artifact identities attributed to `path`.
    pub fn artifacts_for(&self, path: &Path) -> Vec<ArtifactId> {
        self.cache.artifacts_for(path)
    }

    /// Drops every artifact, attribution and watch entry.
    pub fn reset(&self) {
        self.cache.clear();
        self.watch.clear();
        debug!("session reset");
    }

    fn fail(
        &self,
        path: &Path,
        code: &str,
        diagnostics: Vec<Diagnostic>,
        watch_files: Vec<PathBuf>,
    ) -> TransformError {
        let released = self.cache.evict_file(path);
        debug!(
            file = %path.display(),
            errors = diagnostics.len(),
            released,
            watch_files = watch_files.len(),
            "transform failed"
        );
        TransformError {
            file: path.to_path_buf(),
            diagnostics,
            watch_files,
            code: Arc::from(code),
        }
    }
}

impl fmt::Debug for MacroSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroSession")
            .field("config", &self.config)
            .field("artifacts", &self.cache.store().len())
            .field("watched", &self.watch.len())
            .finish_non_exhaustive()
    }
}

fn merge_watch_files(watch_files: &mut Vec<PathBuf>, dependencies: Vec<PathBuf>) {
    for dep in dependencies {
        if !watch_files.contains(&dep) {
            watch_files.push(dep);
        }
    }
}

fn issue_diagnostic(path: &Path, issue: ParseIssue) -> Diagnostic {
    match issue {
        ParseIssue::Syntax { message, location } => Diagnostic::error(
            DiagnosticCode::SYNTAX,
            message,
            location.map(|loc| CallSite::new(path, loc)),
        ),
        ParseIssue::Evaluation { location } => Diagnostic::error(
            DiagnosticCode::MACRO_ARGUMENT,
            "Could not statically evaluate macro argument",
            Some(CallSite::new(path, location)),
        ),
    }
}
