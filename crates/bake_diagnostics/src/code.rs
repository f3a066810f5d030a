//! Diagnostic codes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured diagnostic code.
///
/// Displayed as `E` followed by a zero-padded 3-digit number, e.g. `E002`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCode(u16);

impl DiagnosticCode {
    /// The source file could not be parsed.
    pub const SYNTAX: DiagnosticCode = DiagnosticCode(1);
    /// A macro argument could not be evaluated statically.
    pub const MACRO_ARGUMENT: DiagnosticCode = DiagnosticCode(2);
    /// A macro could not be loaded (resolution failure).
    pub const MACRO_LOAD: DiagnosticCode = DiagnosticCode(3);
    /// A macro failed while running (execution failure).
    pub const MACRO_EXECUTION: DiagnosticCode = DiagnosticCode(4);

    /// Returns the numeric identifier.
    pub fn number(self) -> u16 {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.0)
    }
}
