//! Compile-time macro execution for a bundler's transform pipeline.
//!
//! A [`MacroSession`] owns the artifact cache and the dependency watch index
//! for one build session. For each file it is asked to transform, it drives a
//! [`MacroParser`] collaborator, answering every macro call the parser finds
//! through the [`MacroInvoker`]: the macro module is resolved with a
//! [`ModuleResolver`], the export is validated and called with a
//! [`MacroContext`], and the artifacts the macro emits become virtual modules
//! the bundler can resolve and load back from the session.

#![warn(missing_docs)]

pub mod context;
pub mod invoker;
pub mod module;
pub mod parser;
pub mod resolve;
pub mod session;

pub use context::{CallContext, MacroContext, MacroValue};
pub use invoker::{Invocation, InvokeError, InvokeRequest, MacroInvoker};
pub use module::{Export, ExportTable, MacroFn, MacroModule};
pub use parser::{MacroCall, MacroParser, ParseIssue, ParseRequest, ParsedModule};
pub use resolve::{
    CachingResolver, ModuleLoader, ModuleResolver, ResolveError, ResolvedModule, StaticModule,
    StaticModules,
};
pub use session::{MacroSession, TransformError, TransformOutput};
