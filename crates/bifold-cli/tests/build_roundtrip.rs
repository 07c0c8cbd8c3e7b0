//! Integration tests for `bifold build` output trees.
//!
//! Drives the real binary over a fixture project and verifies:
//! - the CJS tree has one compiled file per source with untouched imports
//! - the ESM tree carries rewritten `.mjs` import specifiers
//! - the progress lines land on stdout

use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "bifold-cli", "--bin", "bifold", "--"]);
    cmd
}

fn write_fixture(root: &Path) {
    let src = root.join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(
        src.join("index.ts"),
        "import { greet } from \"./util\";\nconsole.log(greet);\n",
    )
    .unwrap();
    std::fs::write(src.join("util.ts"), "export const greet = \"hello\";\n").unwrap();
}

#[test]
fn test_build_produces_dual_trees() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());

    let output = cargo_bin()
        .args(["build", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run build command");

    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // CJS tree: per-file output, specifiers untouched.
    let cjs_index = std::fs::read_to_string(dir.path().join("dist/cjs/index.js")).unwrap();
    assert!(cjs_index.contains("from \"./util\""));
    assert!(!cjs_index.contains("./util.mjs"));
    assert!(dir.path().join("dist/cjs/util.js").is_file());

    // ESM tree: rewritten specifiers, .mjs files.
    let esm_index = std::fs::read_to_string(dir.path().join("dist/esm/index.mjs")).unwrap();
    assert!(esm_index.contains("from \"./util.mjs\""));
    assert!(dir.path().join("dist/esm/util.mjs").is_file());
}

#[test]
fn test_build_progress_lines_on_stdout() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());

    let output = cargo_bin()
        .args(["build", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run build command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generating CommonJS build for node"));
    assert!(stdout.contains("Generating ESM build"));
}

#[test]
fn test_version_prints_version() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run version command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("bifold "));
}
