//! The capability object handed to a macro for the duration of one call.

use std::path::{Path, PathBuf};

use bake_store::Artifact;

/// A value passed to or returned from a macro.
pub type MacroValue = serde_json::Value;

/// What a running macro may do besides returning a value.
pub trait MacroContext {
    /// Emits a build artifact. It is committed only if the call succeeds.
    fn add_asset(&mut self, artifact: Artifact);

    /// Asks for the importing file to be re-transformed when `path` changes.
    fn invalidate_on_file_change(&mut self, path: &Path);
}

/// Buffers everything a single macro call requests.
#[derive(Debug, Default)]
pub struct CallContext {
    assets: Vec<Artifact>,
    dependencies: Vec<PathBuf>,
}

impl CallContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the context, yielding its artifacts and dependencies in
    /// request order.
    pub fn into_parts(self) -> (Vec<Artifact>, Vec<PathBuf>) {
        (self.assets, self.dependencies)
    }
}

impl MacroContext for CallContext {
    fn add_asset(&mut self, artifact: Artifact) {
        self.assets.push(artifact);
    }

    fn invalidate_on_file_change(&mut self, path: &Path) {
        if !self.dependencies.iter().any(|p| p == path) {
            self.dependencies.push(path.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_in_order() {
        let mut ctx = CallContext::new();
        ctx.add_asset(Artifact::new("css", "a{}"));
        ctx.add_asset(Artifact::new("css", "b{}"));
        ctx.invalidate_on_file_change(Path::new("theme.json"));
        ctx.invalidate_on_file_change(Path::new("theme.json"));

        let (assets, deps) = ctx.into_parts();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].content, b"a{}");
        assert_eq!(deps, vec![PathBuf::from("theme.json")]);
    }
}
