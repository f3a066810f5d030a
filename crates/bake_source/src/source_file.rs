//! Source file representation with line-start indexing for fast line/column lookup.

use bake_common::Location;
use std::path::PathBuf;

/// A source file handed to a transform, with precomputed line starts.
pub struct SourceFile {
    /// The filesystem path of this file.
    pub path: PathBuf,
    /// The full text content of the file.
    pub content: String,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Creates a new `SourceFile` with precomputed line starts.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = line_starts(content.as_bytes());
        Self {
            path: path.into(),
            content,
            line_starts,
        }
    }

    /// Converts a byte offset into a [`Location`] (1-based line, 0-based column).
    ///
    /// Offsets past the end of the file resolve onto the last line.
    pub fn location(&self, byte_offset: u32) -> Location {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Location::new(
            (line_idx as u32) + 1,
            byte_offset - self.line_starts[line_idx],
        )
    }

    /// Returns the text of a 1-based line without its terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |&next| next as usize);
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// Computes the byte offsets of each line start in the given content.
///
/// Every `\n` starts a new line, so the result always has one more entry
/// than the number of newlines.
pub fn line_starts(content: &[u8]) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.iter().enumerate() {
        if *byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}
