//! Line-granular source maps tying generated artifacts back to macro call sites.
//!
//! Artifacts are synthesized wholesale by a macro, so the [`SourceMapStitcher`]
//! maps every generated line to the single call-site position instead of
//! claiming column-level fidelity. The resulting [`SourceMap`] (revision 3) is
//! appended to the artifact as an inline `sourceMappingURL` comment.

#![warn(missing_docs)]

pub mod map;
pub mod stitch;
pub mod vlq;

pub use map::{Mapping, SourceMap};
pub use stitch::SourceMapStitcher;
pub use vlq::VlqError;
