//! Integration tests for the sepnode binary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

// Two 5-cliques {0..4} and {5..9} joined by the edge 4-5.
fn write_two_cliques(dir: &Path, with_communities: bool) -> PathBuf {
    let mut text = String::from("t # 0\n");
    for vertex in 0..10 {
        if with_communities {
            writeln!(text, "v {} 0 {}", vertex, vertex / 5).unwrap();
        } else {
            writeln!(text, "v {} 0", vertex).unwrap();
        }
    }
    for base in [0, 5] {
        for a in base..base + 5 {
            for b in a + 1..base + 5 {
                writeln!(text, "e {} {}", a, b).unwrap();
            }
        }
    }
    text.push_str("# bridge\ne 4 5\n");
    let path = dir.join("two_cliques.graph");
    fs::write(&path, text).unwrap();
    path
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = Command::cargo_bin("sepnode").unwrap().args(args).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn fixture(with_communities: bool) -> (TempDir, String) {
    let dir = tempdir().unwrap();
    let path = write_two_cliques(dir.path(), with_communities);
    let path = path.to_str().unwrap().to_owned();
    (dir, path)
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("sepnode").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("anneal"));
}

#[test]
fn test_classify_with_ground_truth() {
    let (_dir, path) = fixture(true);
    let report = run_json(&["classify", &path, "--seed", "3"]);
    assert_eq!(report["nodes"], 10);
    assert_eq!(report["edges"], 21);
    assert_eq!(report["communities"].as_array().unwrap().len(), 2);
    assert_eq!(report["violations"]["separation"], 0);
    assert_eq!(report["violations"]["injectivity"], 0);
    assert_eq!(report["violations"]["surjectivity"], 0);
    assert!((report["nmi"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert!(report["modularity"].as_f64().unwrap() > 0.3);
}

#[test]
fn test_classify_without_ground_truth() {
    let (_dir, path) = fixture(false);
    let report = run_json(&["classify", &path]);
    assert!(report["violations"].is_null());
    assert!(report["nmi"].is_null());
    assert!(!report["separators"].as_array().unwrap().is_empty());
}

#[test]
fn test_classify_parallel_flag_matches_sequential() {
    let (_dir, path) = fixture(true);
    let sequential = run_json(&["classify", &path, "--seed", "3"]);
    let parallel = run_json(&["classify", &path, "--seed", "3", "--parallel"]);
    assert_eq!(sequential["separators"], parallel["separators"]);
}

#[test]
fn test_classify_reads_yaml_config() {
    let (dir, path) = fixture(true);
    let config = dir.path().join("run.yaml");
    fs::write(&config, "depth: 1\ndamping: 1.0\nseed: 5\n").unwrap();
    let report = run_json(&["classify", &path, "--config", config.to_str().unwrap()]);
    assert_eq!(report["nodes"], 10);
}

#[test]
fn test_anneal_reports_best_state() {
    let (_dir, path) = fixture(true);
    let report = run_json(&["anneal", &path, "--iterations", "300", "--temperature", "10", "--seed", "1"]);
    assert!(report["objective"].as_f64().unwrap() <= 0.0);
    assert!(report["violations"]["separation"].is_u64());
}

#[test]
fn test_anneal_requires_ground_truth() {
    let (_dir, path) = fixture(false);
    let mut cmd = Command::cargo_bin("sepnode").unwrap();
    cmd.args(["anneal", &path]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("ground-truth"));
}

#[test]
fn test_missing_graph_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.graph");
    let mut cmd = Command::cargo_bin("sepnode").unwrap();
    cmd.arg("classify").arg(missing.to_str().unwrap());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load graph"));
}
