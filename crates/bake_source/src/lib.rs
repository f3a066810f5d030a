//! Source file line indexing and source type detection.
//!
//! [`SourceFile`] resolves byte offsets to [`Location`](bake_common::Location)s
//! and extracts individual lines for diagnostics. [`line_starts`] is shared
//! with the source map stitcher, which maps every generated line of an
//! artifact. [`SourceType`] selects the parser dialect from a file extension.

#![warn(missing_docs)]

pub mod source_file;
pub mod source_type;

pub use source_file::{line_starts, SourceFile};
pub use source_type::SourceType;
