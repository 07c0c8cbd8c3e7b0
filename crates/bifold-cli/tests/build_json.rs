//! Integration tests for `bifold build --json` output.
//!
//! These tests verify:
//! - JSON output is always valid JSON (stdout carries nothing else)
//! - the `ok` boolean and counts are present
//! - failures report `ok: false` with an error message and non-zero exit

use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "bifold-cli", "--bin", "bifold", "--"]);
    cmd
}

#[test]
fn test_build_json_is_valid_json() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(
        src.join("index.ts"),
        "import { x } from \"./dep\";\nconsole.log(x);\n",
    )
    .unwrap();
    std::fs::write(src.join("dep.ts"), "export const x = 1;\n").unwrap();

    let output = cargo_bin()
        .args(["build", "--json", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run build command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["ok"], true);
    assert_eq!(json["sources"], 2);
    assert_eq!(json["cjs_files"], 2);
    assert_eq!(json["esm_files"], 2);
    assert!(json.get("duration_ms").is_some());
    assert!(json.get("error").is_none());
}

#[test]
fn test_build_json_error_is_reported() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("bifold.json"), "{not json").unwrap();

    let output = cargo_bin()
        .args(["build", "--json", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run build command");

    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["ok"], false);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Failed to parse config"));
}
