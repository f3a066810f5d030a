//! Builds per-artifact source maps pointing every generated line at one call site.

use std::path::{Path, PathBuf};

use bake_common::{BakeResult, CallSite};
use bake_source::line_starts;

use crate::map::SourceMap;
use crate::vlq;

/// Produces line-granular source maps for macro-generated artifacts.
///
/// Every generated line (including the line after a trailing newline) maps to
/// column 0 of the generated output and to the single originating call site.
#[derive(Debug, Clone, Default)]
pub struct SourceMapStitcher {
    /// Source paths under this root are emitted relative to it.
    project_root: Option<PathBuf>,
}

impl SourceMapStitcher {
    /// Creates a stitcher that emits importer paths unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stitcher that emits importer paths relative to `root`.
    pub fn with_project_root(root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: Some(root.into()),
        }
    }

    /// Builds the map for `content` generated by the macro call at `call_site`.
    ///
    /// `source_content` is the importing file's full original text, embedded
    /// in `sourcesContent`.
    pub fn stitch(&self, content: &[u8], call_site: &CallSite, source_content: &str) -> SourceMap {
        let line_count = line_starts(content).len();
        let mut map = SourceMap::for_source(
            self.source_name(&call_site.file),
            Some(source_content.to_string()),
        );

        let first = vlq::encode_segment(&[
            0,
            0,
            i64::from(call_site.location.line.saturating_sub(1)),
            i64::from(call_site.location.col),
        ]);
        let mut mappings = String::with_capacity(first.len() + line_count * 5);
        mappings.push_str(&first);
        for _ in 1..line_count {
            mappings.push_str(";AAAA");
        }
        map.mappings = mappings;
        map
    }

    /// Appends the inline map for `content` as a trailing block comment.
    pub fn attach(
        &self,
        content: &mut Vec<u8>,
        call_site: &CallSite,
        source_content: &str,
    ) -> BakeResult<()> {
        let comment = self.stitch(content, call_site, source_content).inline_comment()?;
        content.push(b'\n');
        content.extend_from_slice(comment.as_bytes());
        Ok(())
    }

    fn source_name(&self, file: &Path) -> String {
        let relative = self
            .project_root
            .as_deref()
            .and_then(|root| file.strip_prefix(root).ok())
            .unwrap_or(file);
        relative.to_string_lossy().replace('\\', "/")
    }
}
