//! Raw failures caught at the macro boundary, before translation.

use std::any::Any;
use std::fmt;

use serde_json::Value;

/// The phase in which a failure was caught.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Phase {
    /// Resolving the module, looking up the export, or checking it is callable.
    Resolution,
    /// Running the macro function.
    Execution,
}

/// What a macro function reports when it fails.
///
/// Macro authors return `Err(MacroFailure)`; panics inside a macro are caught
/// and converted with [`MacroFailure::from_panic`].
#[derive(Clone, PartialEq, Debug)]
pub enum MacroFailure {
    /// An error with a message and, optionally, the call-stack frames that
    /// led to it (innermost first, without the message header line).
    Error {
        /// The error message.
        message: String,
        /// Stack frame lines.
        stack: Vec<String>,
    },
    /// A non-error value was raised.
    Value(Value),
    /// The macro panicked.
    Panic(String),
}

impl MacroFailure {
    /// Creates an error failure with no stack.
    pub fn new(message: impl Into<String>) -> Self {
        MacroFailure::Error {
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Attaches stack frames to an error failure. Other variants are returned unchanged.
    pub fn with_stack<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            MacroFailure::Error { message, .. } => MacroFailure::Error {
                message,
                stack: frames.into_iter().map(Into::into).collect(),
            },
            other => other,
        }
    }

    /// Converts a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "macro panicked".to_string()
        };
        MacroFailure::Panic(message)
    }

    /// Returns the failure's message without any stack frames.
    pub fn message(&self) -> String {
        match self {
            MacroFailure::Error { message, .. } | MacroFailure::Panic(message) => message.clone(),
            MacroFailure::Value(Value::String(s)) => s.clone(),
            MacroFailure::Value(other) => other.to_string(),
        }
    }
}

impl fmt::Display for MacroFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Any failure the invoker can catch, before it is translated to a
/// [`MacroError`](crate::MacroError).
#[derive(Clone, PartialEq, Debug)]
pub enum Failure {
    /// The resolver could not load the module; carries its message verbatim.
    Unresolved(String),
    /// The module has no export with the requested name.
    MissingExport {
        /// The module specifier.
        specifier: String,
        /// The requested export name.
        export: String,
    },
    /// The export exists but is not a function.
    NotCallable {
        /// The module specifier.
        specifier: String,
        /// The requested export name.
        export: String,
    },
    /// The macro function failed.
    Thrown(MacroFailure),
}
