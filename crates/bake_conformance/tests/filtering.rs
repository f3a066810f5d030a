//! Which files the session transforms.

use bake_conformance::Harness;
use bake_config::load_config_from_str;

const MACRO_FILE: &str = "import { css } from './macros.js' with { type: 'macro' };\ncss('a{}');\n";

#[test]
fn files_without_macro_imports_are_skipped() {
    let h = Harness::new();
    let out = h
        .transform("/proj/a.js", "import { css } from './macros.js';\ncss('a{}');\n")
        .unwrap();
    assert!(out.is_none());
    assert!(h.session.cache().store().is_empty());
}

#[test]
fn marker_tolerates_whitespace_and_quotes() {
    let h = Harness::new();
    let code = "import { css } from \"./macros.js\" with {\n    type: \"macro\"\n};\ncss('a{}');\n";
    assert!(h.transform("/proj/a.ts", code).unwrap().is_some());
}

#[test]
fn non_script_and_dependency_files_are_skipped() {
    let h = Harness::new();
    assert!(h.transform("/proj/a.css", MACRO_FILE).unwrap().is_none());
    assert!(h
        .transform("/proj/node_modules/pkg/index.js", MACRO_FILE)
        .unwrap()
        .is_none());
    for ext in ["js", "jsx", "ts", "tsx"] {
        let path = format!("/proj/a.{ext}");
        assert!(h.transform(&path, MACRO_FILE).unwrap().is_some(), "{path}");
    }
}

#[test]
fn include_configuration_is_honoured() {
    let config = load_config_from_str(
        "[include]\nextensions = [\"ts\"]\nexclude_dirs = [\"generated\"]\n",
    )
    .unwrap();
    let h = Harness::with_config(config);
    assert!(h.transform("/proj/a.js", MACRO_FILE).unwrap().is_none());
    assert!(h.transform("/proj/generated/a.ts", MACRO_FILE).unwrap().is_none());
    assert!(h.transform("/proj/node_modules/a.ts", MACRO_FILE).unwrap().is_some());
}
