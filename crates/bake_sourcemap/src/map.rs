//! Source map revision 3 model and inline serialization.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bake_common::{BakeResult, InternalError, Location};
use serde::{Deserialize, Serialize};

use crate::vlq::{self, VlqError};

/// A source map in the revision 3 JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Format revision, always `3`.
    pub version: u32,
    /// Original source paths referenced by the mappings.
    pub sources: Vec<String>,
    /// Full original content for each entry in `sources`.
    #[serde(default)]
    pub sources_content: Vec<Option<String>>,
    /// Symbol names referenced by the mappings.
    #[serde(default)]
    pub names: Vec<String>,
    /// VLQ-encoded mapping segments, one group per generated line.
    pub mappings: String,
}

/// A single decoded mapping entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Generated line, 1-based.
    pub generated_line: u32,
    /// Generated column, 0-based.
    pub generated_col: u32,
    /// Index into [`SourceMap::sources`].
    pub source: u32,
    /// Original position in that source.
    pub original: Location,
}

impl SourceMap {
    /// Creates an empty map for a single source.
    pub fn for_source(source: impl Into<String>, content: Option<String>) -> Self {
        Self {
            version: 3,
            sources: vec![source.into()],
            sources_content: vec![content],
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    /// Serializes the map to compact JSON.
    pub fn to_json(&self) -> BakeResult<String> {
        serde_json::to_string(self)
            .map_err(|e| InternalError::new(format!("failed to serialize source map: {e}")))
    }

    /// Parses a map from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encodes the map as a base64 `data:` URL.
    pub fn to_data_url(&self) -> BakeResult<String> {
        let json = self.to_json()?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(json)
        ))
    }

    /// Returns the block-comment form used to inline the map into an artifact.
    pub fn inline_comment(&self) -> BakeResult<String> {
        Ok(format!("/*# sourceMappingURL={} */", self.to_data_url()?))
    }

    /// Recovers a map from an inline comment produced by [`inline_comment`](Self::inline_comment).
    ///
    /// Returns `None` if `text` contains no decodable inline map.
    pub fn from_inline_comment(text: &str) -> Option<Self> {
        const MARKER: &str = "sourceMappingURL=data:application/json;charset=utf-8;base64,";
        let start = text.rfind(MARKER)? + MARKER.len();
        let rest = &text[start..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '*')
            .unwrap_or(rest.len());
        let json = STANDARD.decode(&rest[..end]).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Decodes `mappings` into absolute positions.
    ///
    /// Only segments with at least four fields (those that point at a source)
    /// are returned.
    pub fn decode_mappings(&self) -> Result<Vec<Mapping>, VlqError> {
        let mut out = Vec::new();
        let (mut source, mut orig_line, mut orig_col) = (0i64, 0i64, 0i64);

        for (line_idx, line) in self.mappings.split(';').enumerate() {
            let mut gen_col = 0i64;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let fields = vlq::decode_segment(segment)?;
                gen_col += fields[0];
                if fields.len() < 4 {
                    continue;
                }
                source += fields[1];
                orig_line += fields[2];
                orig_col += fields[3];
                out.push(Mapping {
                    generated_line: line_idx as u32 + 1,
                    generated_col: gen_col as u32,
                    source: source as u32,
                    original: Location::new(orig_line as u32 + 1, orig_col as u32),
                });
            }
        }
        Ok(out)
    }
}
