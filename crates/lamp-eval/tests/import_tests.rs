//! Module loader tests: file and package resolution, filter semantics,
//! transitive pass-through, and registry growth on re-import.

use lamp_eval::{ErrorKind, Evaluator, Value};
use std::fs;
use tempfile::TempDir;

fn run(ev: &mut Evaluator, source: &str) -> Value {
    let program = lamp_parser::parse(source, "test.lmp").expect("parse failed");
    ev.run(&program).expect("evaluation failed")
}

fn write_module(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("failed to write module");
    path.display().to_string()
}

#[test]
fn imported_functions_are_called_by_namespace() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "utils.lmp", "func add(x, y) { x + y }");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    assert_eq!(
        run(&mut ev, &format!("import {path} utils:add(1, 2)")),
        Value::Int(3)
    );
}

#[test]
fn imported_names_do_not_resolve_unqualified() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "utils.lmp", "func add(x, y) { x + y }");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    run(&mut ev, &format!("import {path}"));
    let program = lamp_parser::parse("add(1, 2)", "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFunction("add".into()));
}

#[test]
fn filter_keeps_only_listed_names_from_the_target_namespace() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "utils.lmp", "func f() { 1 } func g() { 2 }");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    assert_eq!(run(&mut ev, &format!("import {path} (f) utils:f()")), Value::Int(1));

    let program = lamp_parser::parse("utils:g()", "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFunction("utils:g".into()));
}

#[test]
fn transitive_records_pass_through_a_filter() {
    let dir = TempDir::new().unwrap();
    let helper = write_module(&dir, "helper.lmp", "func twice(x) { x * 2 }");
    let lib = write_module(
        &dir,
        "lib.lmp",
        &format!("import {helper} func local() {{ 1 }}"),
    );

    // Filtering lib's own names must not drop helper's records.
    let mut ev = Evaluator::new("test", "test.lmp", false);
    let source = format!("import {lib} (local) helper:twice(21)");
    assert_eq!(run(&mut ev, &source), Value::Int(42));
}

#[test]
fn reimporting_grows_the_registry() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "utils.lmp", "func f() { 1 }");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    run(&mut ev, &format!("import {path}"));
    let after_one = ev.functions.len();
    run(&mut ev, &format!("import {path}"));
    assert_eq!(ev.functions.len(), after_one * 2);
}

#[test]
fn unfiltered_import_stamps_the_module_identity() {
    let dir = TempDir::new().unwrap();
    let helper = write_module(&dir, "helper.lmp", "func twice(x) { x * 2 }");
    let lib = write_module(&dir, "lib.lmp", &format!("import {helper}"));

    let mut ev = Evaluator::new("test", "test.lmp", false);
    run(&mut ev, &format!("import {lib}"));
    let record = ev
        .functions
        .records()
        .find(|r| r.name == "twice")
        .expect("twice merged transitively");
    // The unfiltered outer import overwrites the module field with its own
    // resolved identity.
    assert_eq!(record.module, lib);
}

#[test]
fn missing_import_file_fails() {
    let mut ev = Evaluator::new("test", "test.lmp", false);
    let program = lamp_parser::parse("import nope.lmp", "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingFile("nope.lmp".into()));
}

#[test]
fn unknown_package_provider_fails() {
    let mut ev = Evaluator::new("test", "test.lmp", false);
    let program = lamp_parser::parse("import bogus:thing", "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPackageProvider("bogus".into()));
}

#[test]
fn package_imports_resolve_against_the_package_dir() {
    let dir = TempDir::new().unwrap();
    write_module(&dir, "mathx.lmp", "func half(x) { x / 2 }");
    std::env::set_var("LAMP_PACKAGE_PATH", dir.path());

    let mut ev = Evaluator::new("test", "test.lmp", false);
    let value = run(&mut ev, "import lamp:mathx mathx:half(10)");
    std::env::remove_var("LAMP_PACKAGE_PATH");
    assert_eq!(value, Value::Int(5));

    // Package records carry the package-qualified identity.
    let record = ev
        .functions
        .records()
        .find(|r| r.name == "half")
        .expect("half merged");
    assert_eq!(record.module, "lamp:mathx");
}

#[test]
fn import_errors_carry_the_imported_file_identity() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "broken.lmp", "undefined_name");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    let program = lamp_parser::parse(&format!("import {path}"), "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidVariable("undefined_name".into()));
    assert_eq!(err.file, path);
}

#[test]
fn struct_types_stay_file_local() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, "shapes.lmp", "struct Circle { r }");

    let mut ev = Evaluator::new("test", "test.lmp", false);
    run(&mut ev, &format!("import {path}"));
    let program = lamp_parser::parse("c = shapes:Circle", "test.lmp").unwrap();
    let err = ev.run(&program).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFunction("shapes:Circle".into()));
}
