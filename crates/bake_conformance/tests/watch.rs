//! Dependency watching and resolution invalidation.

use std::path::{Path, PathBuf};

use bake_conformance::Harness;
use bake_macros::{ExportTable, MacroValue, StaticModule};

const IMPORT: &str = "import { css, watch } from './macros.js' with { type: 'macro' };\n";

fn file(body: &str) -> String {
    format!("{IMPORT}{body}")
}

#[test]
fn unrecorded_path_is_a_no_op() {
    let h = Harness::new();
    h.transform("/proj/a.js", &file("css('a{}');\n")).unwrap();
    assert_eq!(h.session.on_file_changed(Path::new("/proj/unrelated.txt")), 0);
    assert!(h.invalidations().is_empty());
}

#[test]
fn resolution_dependencies_are_watched() {
    let h = Harness::new();
    let out = h.transform("/proj/a.js", &file("css('a{}');\n")).unwrap().unwrap();
    assert_eq!(
        out.watch_files,
        vec![PathBuf::from("/proj/macros.js"), PathBuf::from("/proj/tokens.json")]
    );
}

#[test]
fn change_invalidates_each_pair_exactly_once() {
    let h = Harness::new();
    // Two calls to the same module from one file record one pair.
    h.transform("/proj/a.js", &file("css('a{}');\ncss('b{}');\n"))
        .unwrap();
    h.transform("/proj/b.js", &file("css('a{}');\n")).unwrap();

    assert_eq!(h.session.on_file_changed(Path::new("/proj/tokens.json")), 2);
    let mut invalidated = h.invalidations();
    invalidated.sort();
    assert_eq!(
        invalidated,
        vec![
            ("./macros.js".to_string(), PathBuf::from("/proj/a.js")),
            ("./macros.js".to_string(), PathBuf::from("/proj/b.js")),
        ]
    );
}

#[test]
fn macro_requested_dependency_is_watched() {
    let h = Harness::new();
    let out = h
        .transform("/proj/a.js", &file("watch('/proj/theme.json');\n"))
        .unwrap()
        .unwrap();
    assert!(out.watch_files.contains(&PathBuf::from("/proj/theme.json")));

    assert_eq!(h.session.on_file_changed(Path::new("/proj/theme.json")), 1);
    assert_eq!(
        h.invalidations(),
        vec![("./macros.js".to_string(), PathBuf::from("/proj/a.js"))]
    );
}

#[test]
fn failed_macro_keeps_requested_dependency_watched() {
    let h = Harness::new();
    let code = concat!(
        "import { watchThenThrow } from './macros.js' with { type: 'macro' };\n",
        "watchThenThrow('/proj/theme.json');\n",
    );
    let err = h.transform("/proj/a.js", code).unwrap_err();
    assert!(err.watch_files.contains(&PathBuf::from("/proj/theme.json")));
    assert!(err.watch_files.contains(&PathBuf::from("/proj/macros.js")));
    assert!(h.session.artifacts_for(Path::new("/proj/a.js")).is_empty());

    let targets = h.session.watch_index().targets(Path::new("/proj/theme.json"));
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].importer, PathBuf::from("/proj/a.js"));

    // Fixing the file re-triggers the importer.
    assert_eq!(h.session.on_file_changed(Path::new("/proj/theme.json")), 1);
    assert_eq!(
        h.invalidations(),
        vec![("./macros.js".to_string(), PathBuf::from("/proj/a.js"))]
    );
}

#[test]
fn missing_export_still_records_resolution_dependencies() {
    let h = Harness::new();
    let code = "import { nope } from './macros.js' with { type: 'macro' };\nnope();\n";
    h.transform("/proj/a.js", code).unwrap_err();
    assert_eq!(h.session.on_file_changed(Path::new("/proj/macros.js")), 1);
}

#[test]
fn invalidation_makes_next_transform_re_resolve() {
    let h = Harness::new();
    let code = file("let v = css('a{}');\n");
    let before = h.transform("/proj/a.js", &code).unwrap().unwrap();
    assert!(before.code.contains("let v = \"css\";"));

    // Swap the module; the cached resolution still serves the old one.
    h.modules.register(
        "./macros.js",
        StaticModule::new(
            "/proj/macros.js",
            ExportTable::new().function("css", |_, _| Ok(MacroValue::from("v2"))),
        ),
    );
    let stale = h.transform("/proj/a.js", &code).unwrap().unwrap();
    assert!(stale.code.contains("let v = \"css\";"));

    h.session.on_file_changed(Path::new("/proj/macros.js"));
    let fresh = h.transform("/proj/a.js", &code).unwrap().unwrap();
    assert!(fresh.code.contains("let v = \"v2\";"));
    assert!(fresh.artifacts.is_empty());
}

#[test]
fn change_drops_cached_resolutions_of_all_importers() {
    let h = Harness::new();
    let code = file("let v = css('a{}');\n");
    h.transform("/proj/a.js", &code).unwrap();
    h.transform("/proj/b.js", &code).unwrap();
    assert_eq!(h.resolver.inner().cached_len(), 2);

    h.session.on_file_changed(Path::new("/proj/tokens.json"));
    assert_eq!(h.resolver.inner().cached_len(), 0);
}
