//! The two-kind structured error exposed to the build pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The phase a macro failure belongs to.
///
/// Serialized as the integer codes `1` (resolution) and `2` (execution).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ErrorKind {
    /// The module could not be resolved, lacks the export, or the export is
    /// not callable.
    Resolution,
    /// The macro body failed while running.
    Execution,
}

impl ErrorKind {
    /// Returns the wire code for this kind.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Resolution => 1,
            ErrorKind::Execution => 2,
        }
    }
}

impl From<ErrorKind> for u8 {
    fn from(kind: ErrorKind) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for ErrorKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ErrorKind::Resolution),
            2 => Ok(ErrorKind::Execution),
            other => Err(format!("unknown macro error kind {other}")),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Resolution => write!(f, "resolution"),
            ErrorKind::Execution => write!(f, "execution"),
        }
    }
}

/// A macro failure normalized for the caller: a kind plus a message.
///
/// Created once at the failure boundary and propagated unchanged; the
/// orchestrator never retries.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct MacroError {
    /// Which phase failed.
    pub kind: ErrorKind,
    /// The failure message, possibly followed by user stack frames.
    pub message: String,
}

impl MacroError {
    /// Creates a resolution-phase error.
    pub fn resolution(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Resolution,
            message: message.into(),
        }
    }

    /// Creates an execution-phase error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Execution,
            message: message.into(),
        }
    }
}
