//! Resolves, validates and calls one macro export.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use bake_common::{CallSite, Location};
use bake_diagnostics::{ErrorTranslator, Failure, MacroError, MacroFailure, Phase};
use bake_sourcemap::SourceMapStitcher;
use bake_store::{ArtifactCache, ArtifactId, DependencyWatchIndex};
use tracing::{debug, trace, warn};

use crate::context::{CallContext, MacroValue};
use crate::module::Export;
use crate::resolve::ModuleResolver;

/// One macro call to perform.
#[derive(Debug, Clone, Copy)]
pub struct InvokeRequest<'a> {
    /// The macro module specifier as written in the import.
    pub specifier: &'a str,
    /// The imported export name.
    pub export_name: &'a str,
    /// The file containing the call.
    pub importer: &'a Path,
    /// Where the call appears in the importer.
    pub location: Location,
    /// The evaluated call arguments.
    pub args: &'a [MacroValue],
    /// The importer's full original text, embedded in artifact source maps.
    pub source: &'a str,
}

/// The result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// The value to substitute at the call site.
    pub value: MacroValue,
    /// Identities newly attributed to the importer, in emission order.
    pub artifacts: Vec<ArtifactId>,
    /// Files recorded in the watch index for this call.
    pub dependencies: Vec<PathBuf>,
}

/// A failed call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct InvokeError {
    /// The translated macro error.
    pub error: MacroError,
    /// Files recorded in the watch index before the call failed.
    pub dependencies: Vec<PathBuf>,
}

/// Performs macro calls against a session's shared state.
pub struct MacroInvoker<'a> {
    cache: &'a ArtifactCache,
    watch: &'a DependencyWatchIndex,
    resolver: &'a dyn ModuleResolver,
    translator: &'a ErrorTranslator,
    stitcher: Option<&'a SourceMapStitcher>,
}

impl<'a> MacroInvoker<'a> {
    /// Creates an invoker. Artifacts get inline source maps only when a
    /// stitcher is given.
    pub fn new(
        cache: &'a ArtifactCache,
        watch: &'a DependencyWatchIndex,
        resolver: &'a dyn ModuleResolver,
        translator: &'a ErrorTranslator,
        stitcher: Option<&'a SourceMapStitcher>,
    ) -> Self {
        Self {
            cache,
            watch,
            resolver,
            translator,
            stitcher,
        }
    }

    /// Calls the export named by `request`.
    ///
    /// Artifacts emitted by the macro are committed only if it returns
    /// successfully. Dependencies are recorded as soon as they are known:
    /// resolution hints once the module resolves, and requested files once
    /// the macro returns, whether it succeeded or not.
    pub fn invoke(&self, request: &InvokeRequest<'_>) -> Result<Invocation, InvokeError> {
        let mut dependencies = Vec::new();
        match self.call(request, &mut dependencies) {
            Ok((value, artifacts)) => Ok(Invocation {
                value,
                artifacts,
                dependencies,
            }),
            Err(error) => Err(InvokeError {
                error,
                dependencies,
            }),
        }
    }

    fn call(
        &self,
        request: &InvokeRequest<'_>,
        dependencies: &mut Vec<PathBuf>,
    ) -> Result<(MacroValue, Vec<ArtifactId>), MacroError> {
        let InvokeRequest {
            specifier,
            export_name,
            importer,
            ..
        } = *request;
        debug!(specifier, export_name, importer = %importer.display(), "invoking macro");

        let resolved = self
            .resolver
            .resolve(specifier, importer)
            .map_err(|e| self.fail(Phase::Resolution, Failure::Unresolved(e.to_string())))?;

        for dep in &resolved.dependencies {
            self.watch.record(dep, specifier, importer);
            dependencies.push(dep.clone());
        }

        let function = match resolved.module.export(export_name) {
            Some(Export::Function(f)) => f,
            Some(Export::Value(_)) => {
                return Err(self.fail(
                    Phase::Resolution,
                    Failure::NotCallable {
                        specifier: specifier.to_string(),
                        export: export_name.to_string(),
                    },
                ))
            }
            None => {
                return Err(self.fail(
                    Phase::Resolution,
                    Failure::MissingExport {
                        specifier: specifier.to_string(),
                        export: export_name.to_string(),
                    },
                ))
            }
        };

        let mut ctx = CallContext::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| function.call(&mut ctx, request.args)))
            .unwrap_or_else(|payload| Err(MacroFailure::from_panic(payload)));
        let (assets, requested) = ctx.into_parts();
        for dep in requested {
            self.watch.record(&dep, specifier, importer);
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }
        let value = outcome.map_err(|failure| {
            if !assets.is_empty() {
                trace!(discarded = assets.len(), "dropping artifacts of failed macro");
            }
            self.fail(Phase::Execution, Failure::Thrown(failure))
        })?;

        let call_site = CallSite::new(importer, request.location);
        let mut artifacts = Vec::with_capacity(assets.len());
        for asset in assets {
            let commit = self
                .cache
                .commit(importer, asset, |artifact| match self.stitcher {
                    Some(stitcher) => {
                        stitcher.attach(&mut artifact.content, &call_site, request.source)
                    }
                    None => Ok(()),
                })
                .map_err(|e| {
                    self.fail(
                        Phase::Execution,
                        Failure::Thrown(MacroFailure::new(e.to_string())),
                    )
                })?;
            debug!(
                id = %commit.id,
                inserted = commit.inserted,
                importer = %importer.display(),
                "registered artifact"
            );
            if commit.attributed {
                artifacts.push(commit.id);
            }
        }

        Ok((value, artifacts))
    }

    fn fail(&self, phase: Phase, failure: Failure) -> MacroError {
        let error = self.translator.translate(phase, failure);
        warn!(kind = %error.kind, message = %error.message, "macro failed");
        error
    }
}
