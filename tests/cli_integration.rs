//! Integration tests for the `pathexpr` command-line interface
//!
//! Tests query, update (dry run and --write) and types against a temporary
//! workspace.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to create a workspace with a YAML file, a Rust file and a config
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(
        dir.path().join("bands.yml"),
        "group:\n  value: queen\n  formed: 1970\n",
    )
    .unwrap();

    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/main.rs"),
        "fn main() {\n    println!(\"hi\");\n}\n",
    )
    .unwrap();

    fs::write(
        dir.path().join("pathexpr.toml"),
        r#"[[microgrammars]]
name = "Founded"
grammar = "formed: $year"
[microgrammars.submatchers]
year = "[0-9]{4}"
"#,
    )
    .unwrap();

    dir
}

fn pathexpr(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pathexpr"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_query_prints_addresses() {
    let dir = setup_test_workspace();
    let output = pathexpr(dir.path(), &["query", "//File()"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/bands.yml"));
    assert!(stdout.contains("/src/main.rs"));
    assert!(stdout.contains("3 match(es)"));
}

#[test]
fn test_query_json() {
    let dir = setup_test_workspace();
    let output = pathexpr(
        dir.path(),
        &["query", "/bands.yml/YamlFile()/group/value", "--json"],
    );

    assert!(output.status.success());
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["address"], "/bands.yml/YamlFile()/group/value");
    assert_eq!(items[0]["value"], "queen");
    assert_eq!(items[0]["format"]["start"]["line_number_from1"], 2);
    assert_eq!(items[0]["format"]["start"]["column_number_from1"], 10);
}

#[test]
fn test_update_dry_run_leaves_files() {
    let dir = setup_test_workspace();
    let output = pathexpr(
        dir.path(),
        &[
            "update",
            "/bands.yml/YamlFile()/group/value",
            "Jefferson Airplane",
            "--diff",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dry run"));
    assert!(stdout.contains("+  value: Jefferson Airplane"));
    assert!(stdout.contains("-  value: queen"));

    let content = fs::read_to_string(dir.path().join("bands.yml")).unwrap();
    assert!(content.contains("value: queen"));
}

#[test]
fn test_update_write_persists() {
    let dir = setup_test_workspace();
    let output = pathexpr(
        dir.path(),
        &[
            "update",
            "/bands.yml/YamlFile()/group/value",
            "Jefferson Airplane",
            "--write",
        ],
    );

    assert!(output.status.success());
    let content = fs::read_to_string(dir.path().join("bands.yml")).unwrap();
    assert_eq!(content, "group:\n  value: Jefferson Airplane\n  formed: 1970\n");

    // Querying again sees the written value
    let output = pathexpr(
        dir.path(),
        &["query", "/bands.yml/YamlFile()/group/value", "--json"],
    );
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items[0]["value"], "Jefferson Airplane");
}

#[test]
fn test_config_microgrammar_available_to_cli() {
    let dir = setup_test_workspace();
    let output = pathexpr(
        dir.path(),
        &["query", "/bands.yml/Founded()/year", "--json"],
    );

    assert!(output.status.success());
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["value"], "1970");
    assert_eq!(items[0]["address"], "/bands.yml/Founded()/year");
}

#[test]
fn test_invalid_expression_fails() {
    let dir = setup_test_workspace();
    let output = pathexpr(dir.path(), &["query", "//File()["]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("//File()["));
}

#[test]
fn test_unknown_type_suggests_name() {
    let dir = setup_test_workspace();
    let output = pathexpr(dir.path(), &["query", "//YamlFlie()"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("YamlFile"));
}

#[test]
fn test_types_lists_builtin_views() {
    let output = Command::new(env!("CARGO_BIN_EXE_pathexpr"))
        .args(["types"])
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["File", "Directory", "RustFile", "YamlFile", "YamlString"] {
        assert!(
            stdout.lines().any(|line| line == name),
            "missing {name} in:\n{stdout}"
        );
    }
}
