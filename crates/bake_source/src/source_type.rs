//! Parser dialect selection from file extensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The language dialect a parser collaborator should use for a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Plain JavaScript (`.js`).
    Js,
    /// JavaScript with JSX (`.jsx`).
    Jsx,
    /// TypeScript (`.ts`).
    Ts,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
}

impl SourceType {
    /// Detects the source type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(SourceType::Js),
            "jsx" => Some(SourceType::Jsx),
            "ts" | "mts" | "cts" => Some(SourceType::Ts),
            "tsx" => Some(SourceType::Tsx),
            _ => None,
        }
    }

    /// Detects the source type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Js => write!(f, "js"),
            SourceType::Jsx => write!(f, "jsx"),
            SourceType::Ts => write!(f, "ts"),
            SourceType::Tsx => write!(f, "tsx"),
        }
    }
}
