//! Integration tests for the `esparse` binary.
//!
//! These tests verify:
//! - `parse` prints a valid ESTree `Program`
//! - flags and `--options` reach the parser
//! - fatal syntax errors exit non-zero
//! - `tokenize` prints the token array

use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "esparse-cli", "--bin", "esparse", "--"]);
    cmd
}

fn write_source(dir: &tempfile::TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_parse_prints_program() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "a.js", "let answer = 6 * 7;");

    let output = cargo_bin()
        .arg("parse")
        .arg(&file)
        .output()
        .expect("Failed to run parse command");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert_eq!(json["type"], "Program");
    assert_eq!(json["sourceType"], "script");
    assert_eq!(json["body"][0]["declarations"][0]["init"]["operator"], "*");
}

#[test]
fn test_parse_module_with_range() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "m.mjs", "export default 1;");

    let output = cargo_bin()
        .args(["parse", "--module", "--range", "--compact"])
        .arg(&file)
        .output()
        .expect("Failed to run parse command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim().lines().count(), 1, "compact output is one line");
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["sourceType"], "module");
    assert_eq!(json["body"][0]["range"], serde_json::json!([0, 17]));
}

#[test]
fn test_parse_options_json() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "view.jsx", "<App title=\"x\" />");

    let output = cargo_bin()
        .args(["parse", "--options", r#"{"jsx":true}"#])
        .arg(&file)
        .output()
        .expect("Failed to run parse command");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["body"][0]["expression"]["type"], "JSXElement");
}

#[test]
fn test_parse_error_exits_non_zero() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "bad.js", "a && b ?? c");

    let output = cargo_bin()
        .arg("parse")
        .arg(&file)
        .output()
        .expect("Failed to run parse command");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unexpected token ??"), "stderr: {stderr}");
}

#[test]
fn test_parse_tolerant_lists_errors() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "loose.js", "return 1;");

    let output = cargo_bin()
        .args(["parse", "--tolerant"])
        .arg(&file)
        .output()
        .expect("Failed to run parse command");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["errors"][0]["description"], "Illegal return statement");
    assert_eq!(json["body"][0]["type"], "ReturnStatement");
}

#[test]
fn test_tokenize_prints_tokens() {
    let dir = tempdir().unwrap();
    let file = write_source(&dir, "t.js", "x = /re/g // c");

    let output = cargo_bin()
        .args(["tokenize", "--comment"])
        .arg(&file)
        .output()
        .expect("Failed to run tokenize command");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tokens = json.as_array().expect("token array");
    assert_eq!(tokens[2]["type"], "RegularExpression");
    assert_eq!(tokens[2]["regex"]["flags"], "g");
    assert_eq!(tokens[3]["type"], "LineComment");
}

#[test]
fn test_version() {
    let output = cargo_bin().arg("version").output().expect("Failed to run version command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("esparse "));
}
