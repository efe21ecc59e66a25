//! CLI Integration Tests for atlas
//!
//! These tests execute the binary and verify correct behavior for:
//! - Text and JSON reports
//! - Attribute/metric selection and config files
//! - Error handling (invalid dataset, invalid config)

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DATASET: &str = r#"[
  {"feature_file": "build.feature", "test_num": 1, "test_case": "Build a blank site",
   "steps": [
     {"step_num": 1, "step_name": "I have a blank site in \"_site\"", "step_definition": "FileUtils.mkdir_p(path)"},
     {"step_num": 2, "step_name": "I run jekyll build", "step_definition": "run_jekyll(\"build\")"}
   ]},
  {"feature_file": "build.feature", "test_num": 2, "test_case": "Build with drafts",
   "steps": [
     {"step_num": 1, "step_name": "I have a \"_drafts\" directory", "step_definition": "FileUtils.mkdir_p(path)"},
     {"step_num": 2, "step_name": "I run jekyll build --drafts", "step_definition": "run_jekyll(\"build\")"}
   ]},
  {"feature_file": "cache.feature", "test_num": 3, "test_case": "Purge the cache",
   "steps": [
     {"step_num": 1, "step_name": "the cache is warm", "step_definition": "cache.warm!"},
     {"step_num": 2, "step_name": "I purge the cache"}
   ]},
  {"feature_file": "cache.feature", "test_num": 4, "test_case": "Cache survives restart",
   "steps": [
     {"step_num": 1, "step_name": "the cache is warm", "step_definition": "cache.warm!"},
     {"step_num": 2, "step_name": "I restart the server", "step_definition": "server.restart"}
   ]}
]"#;

/// Helper to create a temp dir holding a dataset file
fn create_dataset(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scenarios.json");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_text_report_lists_every_branch() {
    let (_dir, dataset) = create_dataset(DATASET);

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Dataset: 4 test cases, 2 groups"))
        .stdout(predicate::str::contains("Step Name NCD Metrics:"))
        .stdout(predicate::str::contains("Step Definition Cosine Metrics:"))
        .stdout(predicate::str::contains("Scenario Title Manhattan Metrics:"))
        .stdout(predicate::str::contains("  MAP: "))
        .stdout(predicate::str::contains("  Micro F1: "));
}

#[test]
fn test_json_report_to_file() {
    let (dir, dataset) = create_dataset(DATASET);
    let output = dir.path().join("report.json");

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset)
        .arg("--format")
        .arg("json")
        .arg("-o")
        .arg(&output);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Report written to"));

    let content = fs::read_to_string(&output).unwrap();
    let report: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(report["branches"].as_array().unwrap().len(), 12);
    assert_eq!(report["clusters"], 2);
    assert_eq!(report["dataset_digest"].as_str().unwrap().len(), 64);
    assert!(report["generated_at"].is_string());
}

#[test]
fn test_attribute_and_metric_selection() {
    let (_dir, dataset) = create_dataset(DATASET);

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset)
        .arg("--attribute")
        .arg("cleaned-step-name")
        .arg("--metric")
        .arg("ncd")
        .arg("--mode")
        .arg("ranking");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Cleaned Step Name NCD Metrics:"))
        .stdout(predicate::str::contains("Step Name Cosine").not())
        .stdout(predicate::str::contains("Micro F1").not());
}

#[test]
fn test_list_clusters_shows_titles() {
    let (_dir, dataset) = create_dataset(DATASET);

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset)
        .arg("--attribute")
        .arg("title")
        .arg("--metric")
        .arg("cosine")
        .arg("--list-clusters");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Scenario Title Cosine Clusters:"))
        .stdout(predicate::str::contains("  - Purge the cache"))
        .stdout(predicate::str::contains("Cluster 0:"));
}

#[test]
fn test_config_file_is_applied() {
    let (dir, dataset) = create_dataset(DATASET);
    let config = dir.path().join("atlas.json");
    fs::write(&config, r#"{"metrics": ["euclidean"], "attributes": ["scenario_title"]}"#).unwrap();

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset).arg("-c").arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Scenario Title Euclidean Metrics:"))
        .stdout(predicate::str::contains("Step Name NCD").not());
}

#[test]
fn test_too_many_clusters_reports_failed_branches() {
    let (_dir, dataset) = create_dataset(DATASET);

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset).arg("--metric").arg("ncd").arg("-k").arg("9");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("failed"));
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_missing_dataset_fails() {
    let dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(dir.path().join("absent.json"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read dataset"));
}

#[test]
fn test_invalid_dataset_fails() {
    let (_dir, dataset) = create_dataset(
        r#"[{"feature_file": "a.feature", "test_num": 1, "test_case": "t",
             "steps": [{"step_num": 2, "step_name": "out of order"}]}]"#,
    );

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid dataset"));
}

#[test]
fn test_malformed_json_fails() {
    let (_dir, dataset) = create_dataset("{not json");

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset);

    cmd.assert().failure().code(1);
}

#[test]
fn test_empty_dataset_fails() {
    let (_dir, dataset) = create_dataset("[]");

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no test cases"));
}

#[test]
fn test_invalid_config_fails() {
    let (dir, dataset) = create_dataset(DATASET);
    let config = dir.path().join("atlas.json");
    fs::write(&config, r#"{"max_iter": 0}"#).unwrap();

    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg(&dataset).arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("max_iter"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("atlas").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
