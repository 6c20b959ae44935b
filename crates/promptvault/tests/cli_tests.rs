//! CLI integration tests.
//!
//! These tests run the built binary against a fixture project whose remote
//! tier is a plain directory.

use promptvault_test_utils::{content, BuiltTestPromptTree, TestPromptTree};
use std::process::{Command, Output};

fn promptvault(tree: &BuiltTestPromptTree, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_promptvault"))
        .arg("--dir")
        .arg(tree.path())
        .args(args)
        .env("XDG_CONFIG_HOME", tree.path().join(".config"))
        .env_remove("PROMPTVAULT_CONFIG_CONTENT")
        .env_remove("PROMPTVAULT_LOCAL_ROOT")
        .env_remove("PROMPTVAULT_REMOTE_BUCKET")
        .env_remove("PROMPTVAULT_REMOTE_PREFIX")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn project() -> BuiltTestPromptTree {
    TestPromptTree::new()
        .with_sample_prompts()
        .with_config(&content::fs_remote_config("bucket", "prompt-artifacts"))
        .build()
}

#[test]
fn test_version_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_promptvault"))
        .arg("version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(stdout(&output).contains("promptvault"));
}

#[test]
fn test_help_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_promptvault"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Versioned prompt snapshots"));
    assert!(out.contains("save"));
    assert!(out.contains("compare"));
}

#[test]
fn test_save_then_list_versions() {
    let tree = project();

    let output = promptvault(&tree, &["save", "--bump", "minor"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Saved version 0.1.0"));

    let output = promptvault(&tree, &["save", "--bump", "patch"]);
    assert!(stdout(&output).contains("Saved version 0.1.1"));

    let output = promptvault(&tree, &["--json", "versions"]);
    assert!(output.status.success());
    let versions: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(versions, vec!["0.1.1", "0.1.0"]);

    assert!(tree
        .path()
        .join("bucket/prompt-artifacts/Version 0.1.0/generic/metric_1.yaml")
        .is_file());
}

#[test]
fn test_get_field_from_latest() {
    let tree = project();
    assert!(promptvault(&tree, &["save"]).status.success());

    let output = promptvault(
        &tree,
        &[
            "get",
            "customized",
            "brand_1",
            "metric_1",
            "--version",
            "latest",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("metric_1:"));
}

#[test]
fn test_load_into_target() {
    let tree = project();
    assert!(promptvault(&tree, &["save"]).status.success());

    let target = tree.path().join("restored");
    let output = promptvault(
        &tree,
        &["load", "1.0.0", "--target", target.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(target.join("customized/brand_2/metric_1.yaml").is_file());

    // A second load into the same directory is refused.
    let output = promptvault(
        &tree,
        &["load", "1.0.0", "--target", target.to_str().unwrap()],
    );
    assert!(!output.status.success());
}

#[test]
fn test_compare_reports_changes() {
    let tree = project();
    assert!(promptvault(&tree, &["save"]).status.success());
    tree.write_prompt("generic/metric_2.yaml", "metric_2: {}\n");
    assert!(promptvault(&tree, &["save"]).status.success());

    let output = promptvault(&tree, &["--json", "compare", "1.0.0", "2.0.0"]);
    assert!(output.status.success());
    let comparison: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comparison["added"], serde_json::json!(["generic/metric_2.yaml"]));
    assert_eq!(comparison["removed"], serde_json::json!([]));
}

#[test]
fn test_local_commands() {
    let tree = project();

    let output = promptvault(&tree, &["search", "BRAND_1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "customized/brand_1/metric_1.yaml");

    let output = promptvault(&tree, &["--json", "stats"]);
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total_files"], 3);

    let output = promptvault(&tree, &["tree"]);
    assert!(stdout(&output).contains("brand_2/"));
}

#[test]
fn test_remote_command_without_remote_fails() {
    let tree = TestPromptTree::new().with_sample_prompts().build();
    let output = promptvault(&tree, &["versions"]);
    assert!(!output.status.success());
}
