//! Diagnostics attributed to macro call sites.

use bake_common::CallSite;
use serde::{Deserialize, Serialize};

use crate::code::DiagnosticCode;
use crate::macro_error::{ErrorKind, MacroError};

/// An error diagnostic with an optional call-site location.
///
/// Every diagnostic fails the transform that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the problem was detected, if known.
    pub call_site: Option<CallSite>,
    /// The macro error this diagnostic was created from, if any.
    pub macro_error: Option<MacroError>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(
        code: DiagnosticCode,
        message: impl Into<String>,
        call_site: Option<CallSite>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            call_site,
            macro_error: None,
        }
    }

    /// Creates a diagnostic for a failed macro call, attributed to its call site.
    ///
    /// Resolution failures read "Error loading macro", execution failures
    /// "Error evaluating macro".
    pub fn from_macro_error(error: MacroError, call_site: CallSite) -> Self {
        let (code, prefix) = match error.kind {
            ErrorKind::Resolution => (DiagnosticCode::MACRO_LOAD, "Error loading macro"),
            ErrorKind::Execution => (DiagnosticCode::MACRO_EXECUTION, "Error evaluating macro"),
        };
        let mut diag = Self::error(code, format!("{prefix}: {}", error.message), Some(call_site));
        diag.macro_error = Some(error);
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bake_common::Location;

    fn site() -> CallSite {
        CallSite::new("src/main.js", Location::new(3, 10))
    }

    #[test]
    fn load_error_message() {
        let diag = Diagnostic::from_macro_error(MacroError::resolution("not found"), site());
        assert_eq!(diag.code, DiagnosticCode::MACRO_LOAD);
        assert_eq!(diag.message, "Error loading macro: not found");
        assert_eq!(diag.macro_error.unwrap().kind, ErrorKind::Resolution);
    }

    #[test]
    fn execution_error_message() {
        let diag = Diagnostic::from_macro_error(MacroError::execution("boom"), site());
        assert_eq!(diag.code, DiagnosticCode::MACRO_EXECUTION);
        assert_eq!(diag.message, "Error evaluating macro: boom");
        assert_eq!(diag.call_site, Some(site()));
    }

    #[test]
    fn syntax_error_without_location() {
        let diag = Diagnostic::error(DiagnosticCode::SYNTAX, "unexpected token", None);
        assert_eq!(diag.message, "unexpected token");
        assert!(diag.call_site.is_none());
        assert!(diag.macro_error.is_none());
    }
}
