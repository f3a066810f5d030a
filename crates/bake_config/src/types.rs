//! Configuration types deserialized from `bake.toml`.

use bake_store::EvictionPolicy;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::{Component, Path};

/// The top-level orchestrator configuration parsed from `bake.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BakeConfig {
    /// Which files are candidates for macro expansion.
    #[serde(default)]
    pub include: IncludeConfig,
    /// Artifact retention and source map settings.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    /// How macro failures are reported.
    #[serde(default)]
    pub errors: ErrorConfig,
}

/// File selection for the transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncludeConfig {
    /// File extensions (without the leading dot) eligible for transformation.
    ///
    /// Accepts a single string or a list of strings.
    #[serde(
        default = "default_extensions",
        deserialize_with = "deserialize_string_or_vec"
    )]
    pub extensions: Vec<String>,
    /// Directory names whose contents are never transformed.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl IncludeConfig {
    /// Returns `true` if `path` has an eligible extension and no path
    /// component names an excluded directory.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        if !self.extensions.iter().any(|e| e == ext) {
            return false;
        }
        let Some(parent) = path.parent() else {
            return true;
        };
        !parent.components().any(|c| match c {
            Component::Normal(name) => self
                .exclude_dirs
                .iter()
                .any(|dir| name.to_str() == Some(dir.as_str())),
            _ => false,
        })
    }
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx"].map(String::from).to_vec()
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

/// Artifact retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactConfig {
    /// When artifacts are dropped from the store after their last importer
    /// stops referencing them.
    #[serde(default)]
    pub eviction: EvictionPolicy,
    /// Whether artifacts get an inline source map pointing at their call site.
    #[serde(default = "default_true")]
    pub source_maps: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            eviction: EvictionPolicy::default(),
            source_maps: true,
        }
    }
}

/// Macro failure reporting settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorConfig {
    /// Whether execution stack traces are cut at the first orchestrator frame.
    #[serde(default = "default_true")]
    pub trim_stacks: bool,
    /// Frame text marking the first orchestrator frame.
    #[serde(default = "default_stack_marker")]
    pub stack_marker: String,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            trim_stacks: true,
            stack_marker: default_stack_marker(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stack_marker() -> String {
    "bake_macros".to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_include_matches_script_files() {
        let include = IncludeConfig::default();
        assert!(include.matches(Path::new("src/main.ts")));
        assert!(include.matches(Path::new("/abs/app/view.jsx")));
        assert!(include.matches(Path::new("index.js")));
        assert!(!include.matches(Path::new("src/style.css")));
        assert!(!include.matches(Path::new("README")));
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let include = IncludeConfig::default();
        assert!(!include.matches(Path::new("/app/node_modules/pkg/index.js")));
        assert!(!include.matches(Path::new("node_modules/pkg/index.ts")));
        // Only whole components count.
        assert!(include.matches(Path::new("/app/my_node_modules/index.js")));
    }

    #[test]
    fn file_named_like_excluded_dir_is_kept() {
        let include = IncludeConfig {
            extensions: vec!["js".into()],
            exclude_dirs: vec!["vendor".into()],
        };
        assert!(include.matches(Path::new("src/vendor.js")));
        assert!(!include.matches(Path::new("src/vendor/lib.js")));
    }

    #[test]
    fn defaults() {
        let config = BakeConfig::default();
        assert_eq!(config.artifacts.eviction, EvictionPolicy::RefCounted);
        assert!(config.artifacts.source_maps);
        assert!(config.errors.trim_stacks);
        assert_eq!(config.errors.stack_marker, "bake_macros");
    }
}
