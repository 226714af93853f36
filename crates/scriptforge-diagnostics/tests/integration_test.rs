//! Integration tests for scriptforge-diagnostics.
//!
//! These tests cover:
//! - Reports built from real interpreter failures of scripts on disk
//! - Graceful degradation when source, line or stack are missing

use scriptforge_diagnostics::{ErrorDiagnostics, StackTrace};
use scriptforge_runtime::{ScriptEngine, ScriptError, ScriptSource};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

fn write_script(dir: &Path, name: &str, code: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, code).unwrap();
    path
}

fn fail(path: &Path) -> (ScriptSource, ScriptError) {
    let script = ScriptSource::from_file(path).unwrap();
    let engine = ScriptEngine::new();
    let failure = engine.load(&script).unwrap_err();
    (script, failure)
}

// ==============================================================================
// Reports From Real Failures
// ==============================================================================

#[test]
fn test_report_for_nil_global_call() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_script(
        temp_dir.path(),
        "script.lua",
        "-- shop\nlocal price = 10\n\nlocal function buy()\n  local total = price * 2\n  local ok = true\n  doThing(total)\nend\n\nbuy()\n",
    );

    let (script, failure) = fail(&path);
    let report = ErrorDiagnostics::for_script(&script).diagnose(&failure, "load");

    assert_eq!(report.line, Some(7));
    assert!(report
        .message
        .starts_with("script.lua:7: attempt to call a nil value (global 'doThing')"));

    let context = report.code_context.as_ref().unwrap();
    assert_eq!(
        context.lines.iter().map(|l| l.number).collect::<Vec<_>>(),
        vec![4, 5, 6, 7, 8]
    );
    assert_eq!(context.error_line().unwrap().text, "  doThing(total)");

    let site = report.stack.error_site().unwrap();
    assert_eq!(site.location, "script.lua:7");
    assert!(report
        .stack
        .frames()
        .iter()
        .any(|frame| frame.location == "script.lua:10"));

    let identifiers: Vec<&str> = report
        .hints
        .iter()
        .filter_map(|block| block.identifier.as_ref())
        .map(|identifier| identifier.name.as_str())
        .collect();
    assert_eq!(identifiers, vec!["doThing"]);

    let text = report.to_string();
    assert!(text.contains(">>> 7 |   doThing(total)"));
    assert!(text.contains("<- error site"));
}

#[test]
fn test_report_for_syntax_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_script(temp_dir.path(), "broken.lua", "local a = 1\nlocal b = = 2\n");

    let (script, failure) = fail(&path);
    let report = ErrorDiagnostics::for_script(&script).diagnose(&failure, "load");

    assert_eq!(report.line, Some(2));
    assert!(report.code_context.is_some());
    assert!(matches!(report.stack, StackTrace::Synthesized(_)));
}

#[test]
fn test_report_survives_deleted_source() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_script(temp_dir.path(), "gone.lua", "local t = nil\nprint(t.field)\n");

    let (script, failure) = fail(&path);
    std::fs::remove_file(&path).unwrap();

    let report = ErrorDiagnostics::for_script(&script).report(&failure, "load");
    assert_eq!(report.line, Some(2));
    assert!(report.code_context.is_none());
    assert_eq!(report.hints[0].rule, "nil_index");
    assert!(!report.to_string().contains("Code context:"));
}

#[test]
fn test_report_without_line_prefix() {
    let failure = ScriptError::new("attempt to call a nil value");
    let report = ErrorDiagnostics::new("x.lua", "x.lua").diagnose(&failure, "on_tick");

    assert_eq!(report.line, None);
    assert!(report.code_context.is_none());
    assert_eq!(report.stack, StackTrace::Unavailable);
    assert_eq!(report.hints[0].rule, "nil_call");
    assert!(report.to_string().contains("stack trace not available"));
}
