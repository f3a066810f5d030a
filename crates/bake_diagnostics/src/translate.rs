//! Normalizes caught failures into [`MacroError`]s.

use std::sync::Arc;

use crate::failure::{Failure, MacroFailure, Phase};
use crate::macro_error::{ErrorKind, MacroError};
use crate::stack::{MarkerTrimmer, StackTrimmer};

/// Frame text identifying the orchestrator's own frames by default.
pub const DEFAULT_STACK_MARKER: &str = "bake_macros";

/// Maps a failure and the phase it was caught in to a [`MacroError`].
///
/// Resolution messages pass through as the resolver reported them;
/// execution messages are rendered through the configured [`StackTrimmer`].
#[derive(Clone)]
pub struct ErrorTranslator {
    trimmer: Arc<dyn StackTrimmer>,
}

impl ErrorTranslator {
    /// Creates a translator with a custom stack trimmer.
    pub fn new(trimmer: Arc<dyn StackTrimmer>) -> Self {
        Self { trimmer }
    }

    /// Translates `failure`, caught in `phase`, into the external error contract.
    pub fn translate(&self, phase: Phase, failure: Failure) -> MacroError {
        let kind = match phase {
            Phase::Resolution => ErrorKind::Resolution,
            Phase::Execution => ErrorKind::Execution,
        };
        let message = match failure {
            Failure::Unresolved(message) => message,
            Failure::MissingExport { specifier, export } => {
                format!("\"{specifier}\" does not export \"{export}\".")
            }
            Failure::NotCallable { specifier, export } => {
                format!("\"{export}\" in \"{specifier}\" is not a function.")
            }
            Failure::Thrown(MacroFailure::Error { message, stack }) => {
                self.trimmer.render(&message, &stack)
            }
            Failure::Thrown(other) => other.message(),
        };
        MacroError { kind, message }
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(Arc::new(MarkerTrimmer::new(DEFAULT_STACK_MARKER)))
    }
}

impl std::fmt::Debug for ErrorTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorTranslator").finish_non_exhaustive()
    }
}
