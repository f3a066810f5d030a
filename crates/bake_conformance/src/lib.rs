//! Conformance test helpers for the bake macro orchestrator.
//!
//! Provides a small reference parser collaborator that understands macro
//! imports and literal-argument calls, a resolver wrapper that records
//! invalidations, a stock macro module, and a build driver that runs many
//! files through one session and gathers the results for assertion in
//! integration tests.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use bake_config::BakeConfig;
use bake_diagnostics::{Diagnostic, DiagnosticSink, MacroError, MacroFailure};
use bake_macros::{
    CachingResolver, ExportTable, MacroCall, MacroParser, MacroSession, MacroValue,
    ModuleResolver, ParseIssue, ParseRequest, ParsedModule, ResolveError, ResolvedModule,
    StaticModule, StaticModules, TransformError, TransformOutput,
};
use bake_source::SourceFile;
use bake_store::Artifact;
use regex::Regex;

/// Project root used by every helper session.
pub const PROJECT_ROOT: &str = "/proj";

static MACRO_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"import\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]\s*"#,
        r#"with\s*\{\s*type:\s*['"]macro['"]\s*\}\s*;?"#,
    ))
    .expect("macro import pattern is valid")
});

static CALL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").expect("call pattern is valid")
});

/// A reference parser for macro imports with literal arguments.
///
/// Macro import statements are removed. Each call to an imported binding
/// whose arguments are all string, number, boolean or `null` literals is
/// replaced by the JSON text of the macro's return value.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralParser;

impl MacroParser for LiteralParser {
    fn transform(
        &self,
        request: ParseRequest<'_>,
        expand: &mut dyn FnMut(MacroCall) -> Result<MacroValue, MacroError>,
    ) -> Result<ParsedModule, Vec<ParseIssue>> {
        let file = SourceFile::new(request.path, request.code);
        let code = request.code;

        let mut bindings: HashMap<String, (String, String)> = HashMap::new();
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for caps in MACRO_IMPORT.captures_iter(code) {
            let specifier = caps[2].to_string();
            for binding in caps[1].split(',').map(str::trim).filter(|b| !b.is_empty()) {
                let (export, local) = match binding.split_once(" as ") {
                    Some((export, local)) => (export.trim(), local.trim()),
                    None => (binding, binding),
                };
                bindings.insert(local.to_string(), (specifier.clone(), export.to_string()));
            }
            if let Some(whole) = caps.get(0) {
                edits.push((whole.range(), String::new()));
            }
        }

        let mut issues = Vec::new();
        let mut cursor = 0;
        for caps in CALL_START.captures_iter(code) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() < cursor || edits.iter().any(|(r, _)| r.contains(&whole.start())) {
                continue;
            }
            let preceded_by_ident = code[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
            let Some((specifier, export_name)) = bindings.get(name.as_str()) else {
                continue;
            };
            if preceded_by_ident {
                continue;
            }

            let location = file.location(whole.start() as u32);
            let Some(close) = find_closing_paren(code, whole.end()) else {
                issues.push(ParseIssue::Syntax {
                    message: format!("unclosed call to macro `{}`", name.as_str()),
                    location: Some(location),
                });
                break;
            };
            cursor = close + 1;

            let args = match parse_arguments(&code[whole.end()..close]) {
                Some(args) => args,
                None => {
                    issues.push(ParseIssue::Evaluation { location });
                    continue;
                }
            };
            let call = MacroCall {
                specifier: specifier.clone(),
                export_name: export_name.clone(),
                args,
                location,
            };
            if let Ok(value) = expand(call) {
                edits.push((whole.start()..close + 1, value.to_string()));
            }
        }

        if !issues.is_empty() {
            return Err(issues);
        }

        edits.sort_by_key(|(range, _)| range.start);
        let mut out = String::with_capacity(code.len());
        let mut last = 0;
        for (range, replacement) in edits {
            out.push_str(&code[last..range.start]);
            out.push_str(&replacement);
            last = range.end;
        }
        out.push_str(&code[last..]);
        Ok(ParsedModule {
            code: out,
            map: None,
        })
    }
}

/// Returns the byte offset of the `)` closing a call whose arguments start at `from`.
fn find_closing_paren(code: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in code[from..].char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => return Some(from + offset),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Parses a comma-separated list of literals. `None` if any is not static.
fn parse_arguments(text: &str) -> Option<Vec<MacroValue>> {
    let mut args = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let (value, tail) = parse_literal(rest)?;
        args.push(value);
        rest = tail.trim_start();
        match rest.strip_prefix(',') {
            Some(after) => rest = after.trim_start(),
            None if rest.is_empty() => {}
            None => return None,
        }
    }
    Some(args)
}

fn parse_literal(text: &str) -> Option<(MacroValue, &str)> {
    let first = text.chars().next()?;
    if first == '\'' || first == '"' {
        let mut value = String::new();
        let mut chars = text.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                _ if c == first => return Some((MacroValue::String(value), &text[i + 1..])),
                _ => value.push(c),
            }
        }
        return None;
    }

    let end = text
        .find(|c: char| c == ',' || c.is_whitespace())
        .unwrap_or(text.len());
    let (token, tail) = text.split_at(end);
    let value = match token {
        "true" => MacroValue::Bool(true),
        "false" => MacroValue::Bool(false),
        "null" => MacroValue::Null,
        _ => match serde_json::from_str::<MacroValue>(token).ok()? {
            number @ MacroValue::Number(_) => number,
            _ => return None,
        },
    };
    Some((value, tail))
}

/// Wraps a resolver and records every invalidation it receives.
pub struct RecordingResolver<R> {
    inner: R,
    invalidations: Mutex<Vec<(String, PathBuf)>>,
}

impl<R: ModuleResolver> RecordingResolver<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            invalidations: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns the `(specifier, importer)` pairs invalidated so far.
    pub fn invalidations(&self) -> Vec<(String, PathBuf)> {
        self.invalidations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<R: ModuleResolver> ModuleResolver for RecordingResolver<R> {
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<ResolvedModule, ResolveError> {
        self.inner.resolve(specifier, importer)
    }

    fn invalidate(&self, specifier: &str, importer: &Path) {
        self.invalidations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((specifier.to_string(), importer.to_path_buf()));
        self.inner.invalidate(specifier, importer);
    }
}

/// The resolver type used by [`Harness`].
pub type HarnessResolver = RecordingResolver<CachingResolver<StaticModules>>;

/// Builds the stock macro module served as `./macros.js`.
///
/// | export | behaviour |
/// |---|---|
/// | `css(text)` | emits a `css` artifact with `text`, returns `"css"` |
/// | `asset(kind, text)` | emits an artifact of any kind, returns `kind` |
/// | `twice(text)` | emits `text` as css twice, returns `2` |
/// | `watch(path)` | watches `path`, returns `null` |
/// | `boom()` | fails with `boom` and a stack reaching into the orchestrator |
/// | `emitThenThrow(text)` | emits `text`, then fails |
/// | `panics()` | panics |
/// | `VERSION` | the string `"1.0.0"` (not callable) |
pub fn stock_macros() -> ExportTable {
    ExportTable::new()
        .function("css", |ctx, args| {
            ctx.add_asset(Artifact::new("css", string_arg(args, 0)?));
            Ok(MacroValue::from("css"))
        })
        .function("asset", |ctx, args| {
            let kind = string_arg(args, 0)?;
            ctx.add_asset(Artifact::new(kind.clone(), string_arg(args, 1)?));
            Ok(MacroValue::from(kind))
        })
        .function("twice", |ctx, args| {
            let text = string_arg(args, 0)?;
            ctx.add_asset(Artifact::new("css", text.clone()));
            ctx.add_asset(Artifact::new("css", text));
            Ok(MacroValue::from(2))
        })
        .function("watch", |ctx, args| {
            ctx.invalidate_on_file_change(Path::new(&string_arg(args, 0)?));
            Ok(MacroValue::Null)
        })
        .function("watchThenThrow", |ctx, args| {
            let path = string_arg(args, 0)?;
            ctx.invalidate_on_file_change(Path::new(&path));
            Err(MacroFailure::new(format!("{path}: unexpected end of JSON input")))
        })
        .function("boom", |_, _| {
            Err(MacroFailure::new("boom").with_stack([
                "    at boom (/proj/macros.js:12:11)",
                "    at render (/proj/theme.js:4:3)",
                "    at MacroInvoker::invoke (bake_macros/src/invoker.rs:1:1)",
                "    at MacroSession::transform (bake_macros/src/session.rs:1:1)",
            ]))
        })
        .function("emitThenThrow", |ctx, args| {
            ctx.add_asset(Artifact::new("css", string_arg(args, 0)?));
            Err(MacroFailure::new("failed after emitting"))
        })
        .function("panics", |_, _| panic!("macro panicked on purpose"))
        .value("VERSION", "1.0.0")
}

fn string_arg(args: &[MacroValue], index: usize) -> Result<String, MacroFailure> {
    args.get(index)
        .and_then(MacroValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| MacroFailure::new(format!("argument {index} must be a string")))
}

/// A session wired to [`stock_macros`] through a recording resolver.
pub struct Harness {
    /// The session under test.
    pub session: MacroSession,
    /// The resolver the session uses.
    pub resolver: Arc<HarnessResolver>,
    /// The module registry, for swapping modules between builds.
    pub modules: StaticModules,
}

impl Harness {
    /// Creates a harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(BakeConfig::default())
    }

    /// Creates a harness with `config`.
    ///
    /// `./macros.js` resolves to `/proj/macros.js` and additionally depends
    /// on `/proj/tokens.json`.
    pub fn with_config(config: BakeConfig) -> Self {
        let modules = StaticModules::new().with(
            "./macros.js",
            StaticModule::new("/proj/macros.js", stock_macros()).depends_on("/proj/tokens.json"),
        );
        let resolver = Arc::new(RecordingResolver::new(CachingResolver::new(modules.clone())));
        let session_resolver: Arc<dyn ModuleResolver> = resolver.clone();
        let session = MacroSession::new(config, session_resolver).with_project_root(PROJECT_ROOT);
        Self {
            session,
            resolver,
            modules,
        }
    }

    /// Transforms one file with the [`LiteralParser`].
    pub fn transform(
        &self,
        path: &str,
        code: &str,
    ) -> Result<Option<TransformOutput>, TransformError> {
        self.session.transform(Path::new(path), code, &LiteralParser)
    }

    /// Returns the invalidations the session has issued.
    pub fn invalidations(&self) -> Vec<(String, PathBuf)> {
        self.resolver.invalidations()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of running many files through one session.
pub struct BuildResult {
    /// One entry per input file, in input order; `None` if the file was
    /// skipped or failed.
    pub outputs: Vec<(PathBuf, Option<TransformOutput>)>,
    /// Diagnostics from every failed file.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of diagnostics emitted across the build.
    pub error_count: usize,
}

impl BuildResult {
    /// Returns the output for `path`, if it transformed successfully.
    pub fn output(&self, path: &str) -> Option<&TransformOutput> {
        self.outputs
            .iter()
            .find(|(p, _)| p == Path::new(path))
            .and_then(|(_, out)| out.as_ref())
    }
}

/// Transforms `files` in parallel and gathers the outcome.
pub fn build(session: &MacroSession, files: &[(&str, &str)]) -> BuildResult {
    let sink = DiagnosticSink::new();
    let results = session.transform_batch(files, &LiteralParser);
    let outputs = files
        .iter()
        .zip(results)
        .map(|((path, _), result)| {
            let output = match result {
                Ok(output) => output,
                Err(err) => {
                    for diag in err.diagnostics {
                        sink.emit(diag);
                    }
                    None
                }
            };
            (PathBuf::from(path), output)
        })
        .collect();
    BuildResult {
        outputs,
        error_count: sink.error_count(),
        diagnostics: sink.take_all(),
    }
}
