//! The contract between the orchestrator and macro modules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bake_diagnostics::MacroFailure;

use crate::context::{MacroContext, MacroValue};

/// A callable macro export.
///
/// Implemented for every `Send + Sync` closure of type
/// `Fn(&mut dyn MacroContext, &[MacroValue]) -> Result<MacroValue, MacroFailure>`.
pub trait MacroFn: Send + Sync {
    /// Runs the macro with already-evaluated call arguments.
    fn call(&self, ctx: &mut dyn MacroContext, args: &[MacroValue])
        -> Result<MacroValue, MacroFailure>;
}

impl<F> MacroFn for F
where
    F: Fn(&mut dyn MacroContext, &[MacroValue]) -> Result<MacroValue, MacroFailure> + Send + Sync,
{
    fn call(
        &self,
        ctx: &mut dyn MacroContext,
        args: &[MacroValue],
    ) -> Result<MacroValue, MacroFailure> {
        self(ctx, args)
    }
}

/// A named member of a macro module.
#[derive(Clone)]
pub enum Export {
    /// A callable macro.
    Function(Arc<dyn MacroFn>),
    /// A plain value. Calling it is a resolution failure.
    Value(MacroValue),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Function(_) => f.write_str("Function(..)"),
            Export::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// A loaded macro module.
pub trait MacroModule: Send + Sync {
    /// Looks up a named export.
    fn export(&self, name: &str) -> Option<Export>;
}

/// A macro module assembled from closures and constants.
#[derive(Clone, Debug, Default)]
pub struct ExportTable {
    exports: BTreeMap<String, Export>,
}

impl ExportTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable export.
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut dyn MacroContext, &[MacroValue]) -> Result<MacroValue, MacroFailure>
            + Send
            + Sync
            + 'static,
    {
        self.exports.insert(name.into(), Export::Function(Arc::new(f)));
        self
    }

    /// Adds a callable export implemented by a [`MacroFn`] type.
    pub fn macro_fn(mut self, name: impl Into<String>, f: Arc<dyn MacroFn>) -> Self {
        self.exports.insert(name.into(), Export::Function(f));
        self
    }

    /// Adds a non-callable export.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<MacroValue>) -> Self {
        self.exports.insert(name.into(), Export::Value(value.into()));
        self
    }

    /// Returns the export names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

impl MacroModule for ExportTable {
    fn export(&self, name: &str) -> Option<Export> {
        self.exports.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use serde_json::json;

    #[test]
    fn table_lookup() {
        let table = ExportTable::new()
            .function("double", |_ctx, args| {
                let n = args.first().and_then(MacroValue::as_i64).unwrap_or(0);
                Ok(json!(n * 2))
            })
            .value("VERSION", "1.0.0");

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["VERSION", "double"]);
        assert!(table.export("missing").is_none());
        assert!(matches!(table.export("VERSION"), Some(Export::Value(_))));

        let Some(Export::Function(f)) = table.export("double") else {
            panic!("expected a function export");
        };
        let mut ctx = CallContext::new();
        assert_eq!(f.call(&mut ctx, &[json!(21)]).unwrap(), json!(42));
    }
}
