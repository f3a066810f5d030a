//! Resolution and execution failures surfaced through the two-kind contract.

use bake_conformance::{build, Harness};
use bake_config::load_config_from_str;
use bake_diagnostics::{DiagnosticCode, ErrorKind, MacroError};

const IMPORT: &str = concat!(
    "import { css, boom, emitThenThrow, panics, missing, VERSION } ",
    "from './macros.js' with { type: 'macro' };\n",
);

fn file(body: &str) -> String {
    format!("{IMPORT}{body}")
}

fn single_error(h: &Harness, body: &str) -> MacroError {
    let err = h.transform("/proj/a.js", &file(body)).unwrap_err();
    let errors: Vec<_> = err.macro_errors().cloned().collect();
    assert_eq!(errors.len(), 1, "expected one macro error, got {errors:?}");
    errors.into_iter().next().unwrap()
}

#[test]
fn missing_export_is_resolution_failure() {
    let h = Harness::new();
    let err = single_error(&h, "missing();\n");
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert_eq!(err.message, "\"./macros.js\" does not export \"missing\".");
}

#[test]
fn non_callable_export_is_resolution_failure() {
    let h = Harness::new();
    let err = single_error(&h, "VERSION();\n");
    assert_eq!(err.kind, ErrorKind::Resolution);
    assert!(err.message.contains("is not a function"));
}

#[test]
fn unresolvable_module_is_resolution_failure() {
    let h = Harness::new();
    let code = "import { css } from './nowhere.js' with { type: 'macro' };\ncss('a');\n";
    let err = h.transform("/proj/a.js", code).unwrap_err();
    let error = err.macro_errors().next().unwrap();
    assert_eq!(error.kind, ErrorKind::Resolution);
    assert!(error.message.starts_with("Cannot find module './nowhere.js'"));
}

#[test]
fn thrown_error_is_execution_failure_with_trimmed_stack() {
    let h = Harness::new();
    let err = single_error(&h, "boom();\n");
    assert_eq!(err.kind, ErrorKind::Execution);
    assert!(err.message.starts_with("boom"));
    assert_eq!(
        err.message,
        "boom\n    at boom (/proj/macros.js:12:11)\n    at render (/proj/theme.js:4:3)"
    );
}

#[test]
fn untrimmed_stacks_when_disabled() {
    let config = load_config_from_str("[errors]\ntrim_stacks = false\n").unwrap();
    let h = Harness::with_config(config);
    let err = single_error(&h, "boom();\n");
    assert!(err.message.contains("bake_macros/src/session.rs"));
}

#[test]
fn wire_format_uses_integer_kinds() {
    let h = Harness::new();
    let err = single_error(&h, "missing();\n");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["kind"], 1);
    let err = single_error(&h, "boom();\n");
    assert_eq!(serde_json::to_value(&err).unwrap()["kind"], 2);
}

#[test]
fn throw_after_add_asset_commits_nothing() {
    let h = Harness::new();
    let err = single_error(&h, "emitThenThrow('lost{}');\n");
    assert_eq!(err.kind, ErrorKind::Execution);
    assert!(h.session.cache().store().is_empty());
    assert!(h.session.artifacts_for("/proj/a.js".as_ref()).is_empty());
}

#[test]
fn panic_is_execution_failure() {
    let h = Harness::new();
    let err = single_error(&h, "panics();\n");
    assert_eq!(err.kind, ErrorKind::Execution);
    assert_eq!(err.message, "macro panicked on purpose");
}

#[test]
fn failing_retransform_leaves_no_artifacts() {
    let h = Harness::new();
    let ok = h.transform("/proj/a.js", &file("css('a{}');\n")).unwrap().unwrap();
    h.transform("/proj/a.js", &file("css('b{}');\nboom();\n"))
        .unwrap_err();

    assert!(h.session.artifacts_for("/proj/a.js".as_ref()).is_empty());
    assert!(!h.session.is_owned(ok.artifacts[0].as_str()));
    assert!(h.session.cache().store().is_empty());
}

#[test]
fn every_failing_call_is_reported_at_its_call_site() {
    let h = Harness::new();
    let err = h
        .transform("/proj/a.js", &file("missing();\nlet x = boom();\n"))
        .unwrap_err();
    assert_eq!(err.diagnostics.len(), 2);
    assert_eq!(err.diagnostics[0].code, DiagnosticCode::MACRO_LOAD);
    assert_eq!(err.diagnostics[1].code, DiagnosticCode::MACRO_EXECUTION);
    let site = err.diagnostics[1].call_site.as_ref().unwrap();
    assert_eq!((site.location.line, site.location.col), (3, 8));

    let rendered = err.render_terminal();
    let load_error = concat!(
        "error[E003]: Error loading macro: ",
        "\"./macros.js\" does not export \"missing\".",
    );
    assert!(rendered.contains(load_error));
    assert!(rendered.contains("error[E004]: Error evaluating macro: boom"));
    assert!(rendered.contains("--> /proj/a.js:3:9"));
    assert!(rendered.contains("3 | let x = boom();"));
}

#[test]
fn non_static_argument_fails_transform() {
    let h = Harness::new();
    let err = h
        .transform("/proj/a.js", &file("css(someVariable);\n"))
        .unwrap_err();
    assert_eq!(err.diagnostics[0].code, DiagnosticCode::MACRO_ARGUMENT);
    assert_eq!(
        err.diagnostics[0].message,
        "Could not statically evaluate macro argument"
    );
}

#[test]
fn build_collects_diagnostics_per_failed_file() {
    let h = Harness::new();
    let good = file("css('a{}');\n");
    let bad = file("boom();\n");
    let result = build(
        &h.session,
        &[("/proj/good.js", good.as_str()), ("/proj/bad.js", bad.as_str())],
    );
    assert_eq!(result.error_count, 1);
    assert!(result.output("/proj/good.js").is_some());
    assert!(result.output("/proj/bad.js").is_none());
}
