//! Macro-generated artifacts and their content-derived identities.

use std::borrow::Borrow;
use std::fmt;

use bake_common::ContentHash;
use serde::{Deserialize, Serialize};

/// Prefix shared by every artifact identity.
pub const ARTIFACT_ID_PREFIX: &str = "macro-";

/// A build artifact emitted by a macro through `add_asset`.
///
/// The orchestrator only looks at `kind` (used as the virtual module's
/// extension) and `content` (hashed for identity and served on load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact kind, e.g. `"css"`.
    pub kind: String,
    /// Raw artifact bytes.
    pub content: Vec<u8>,
}

impl Artifact {
    /// Creates a new artifact.
    pub fn new(kind: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    /// Returns the content as UTF-8 text, if it is valid UTF-8.
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// The identity of a stored artifact: `macro-<sha256(content)>.<kind>`.
///
/// Identities depend only on content and kind, never on the file or call site
/// that produced the artifact. They double as virtual module specifiers.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Computes the identity of an artifact.
    pub fn for_artifact(artifact: &Artifact) -> Self {
        let hash = ContentHash::from_bytes(&artifact.content);
        Self(format!("{ARTIFACT_ID_PREFIX}{hash}.{}", artifact.kind))
    }

    /// Parses a string that has the shape of an artifact identity.
    ///
    /// This only validates the format; it does not check that the artifact
    /// exists in any store.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(ARTIFACT_ID_PREFIX)?;
        let (digest, kind) = rest.split_once('.')?;
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        if kind.is_empty() {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactId({})", self.0)
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ArtifactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_format() {
        let id = ArtifactId::for_artifact(&Artifact::new("css", ".a { color: red }"));
        let s = id.as_str();
        assert!(s.starts_with("macro-"));
        assert!(s.ends_with(".css"));
        assert_eq!(s.len(), "macro-".len() + 64 + ".css".len());
    }

    #[test]
    fn same_content_and_kind_share_identity() {
        let a = ArtifactId::for_artifact(&Artifact::new("css", "color: red"));
        let b = ArtifactId::for_artifact(&Artifact::new("css", "color: red"));
        assert_eq!(a, b);
    }

    #[test]
    fn kind_or_content_change_identity() {
        let base = ArtifactId::for_artifact(&Artifact::new("css", "color: red"));
        let other_kind = ArtifactId::for_artifact(&Artifact::new("txt", "color: red"));
        let other_content = ArtifactId::for_artifact(&Artifact::new("css", "color: blue"));
        assert_ne!(base, other_kind);
        assert_ne!(base, other_content);
    }

    #[test]
    fn parse_accepts_generated_identities() {
        let id = ArtifactId::for_artifact(&Artifact::new("css", "x"));
        assert_eq!(ArtifactId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(ArtifactId::parse("./style.css").is_none());
        assert!(ArtifactId::parse("macro-abc.css").is_none());
        let digest = "0".repeat(64);
        assert!(ArtifactId::parse(&format!("macro-{digest}.")).is_none());
        assert!(ArtifactId::parse(&format!("macro-{digest}")).is_none());
        assert!(ArtifactId::parse(&format!("macro-{digest}.css")).is_some());
    }

    #[test]
    fn content_str_handles_binary() {
        assert_eq!(Artifact::new("css", "a").content_str(), Some("a"));
        assert_eq!(Artifact::new("bin", vec![0xff, 0xfe]).content_str(), None);
    }

    #[test]
    fn serde_is_plain_string() {
        let id = ArtifactId::for_artifact(&Artifact::new("css", "x"));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
