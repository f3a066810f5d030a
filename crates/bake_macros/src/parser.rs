//! The parser collaborator seam.
//!
//! Locating macro calls, evaluating their arguments and splicing the results
//! back into the code is the parser's job. The session only answers the
//! calls it is handed.

use std::path::Path;

use bake_common::Location;
use bake_diagnostics::MacroError;
use bake_source::SourceType;

use crate::context::MacroValue;

/// A file handed to the parser.
#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    /// The file's dialect, from its extension.
    pub source_type: SourceType,
    /// The file path.
    pub path: &'a Path,
    /// The file's original text.
    pub code: &'a str,
}

/// A macro call found by the parser, with statically evaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    /// The macro import specifier.
    pub specifier: String,
    /// The imported export name.
    pub export_name: String,
    /// The evaluated arguments.
    pub args: Vec<MacroValue>,
    /// Where the call appears.
    pub location: Location,
}

/// The parser's rewritten output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModule {
    /// The code with every macro call substituted.
    pub code: String,
    /// The parser's source map for the rewrite, as JSON.
    pub map: Option<String>,
}

/// A problem the parser reports instead of producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// The file does not parse.
    Syntax {
        /// The parser's message.
        message: String,
        /// Where parsing failed, if known.
        location: Option<Location>,
    },
    /// A macro argument is not a static value.
    Evaluation {
        /// Where the argument appears.
        location: Location,
    },
}

/// Rewrites a file by expanding its macro calls through `expand`.
///
/// `expand` is called once per macro call in source order. When it returns
/// an error the parser may keep going to report more problems, but the
/// session fails the transform either way.
pub trait MacroParser: Send + Sync {
    /// Transforms one file.
    fn transform(
        &self,
        request: ParseRequest<'_>,
        expand: &mut dyn FnMut(MacroCall) -> Result<MacroValue, MacroError>,
    ) -> Result<ParsedModule, Vec<ParseIssue>>;
}
