//! Structured macro errors, failure translation, and call-site diagnostics.
//!
//! Every failure raised while resolving or running a macro is normalized by
//! the [`ErrorTranslator`] into a [`MacroError`] with one of two
//! [`ErrorKind`]s. The transform pipeline attributes those errors (and
//! parser-side problems) to call sites as [`Diagnostic`]s, collected in a
//! thread-safe [`DiagnosticSink`] and rendered by a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod failure;
pub mod macro_error;
pub mod renderer;
pub mod sink;
pub mod stack;
pub mod translate;

pub use code::DiagnosticCode;
pub use diagnostic::Diagnostic;
pub use failure::{Failure, MacroFailure, Phase};
pub use macro_error::{ErrorKind, MacroError};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use sink::DiagnosticSink;
pub use stack::{FullStack, MarkerTrimmer, MessageOnly, StackTrimmer};
pub use translate::ErrorTranslator;
