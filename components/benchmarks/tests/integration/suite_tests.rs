//! End-to-end suite runs through a POSIX shell standing in for the runtime

use super::write_file;
use benchmarks::manifest::SuiteManifest;
use benchmarks::runner::{format_results, overall_score};
use benchmarks::suite::build_suite;
use std::fs;
use tempfile::TempDir;

/// A shell script whose marker sits at the end of a comment line, so the
/// rewritten comment stays inside that line.
const STARTUP_SCRIPT: &str = "#\n/*ThouShaltNotCache*/\n\ncat \"$JETBENCH_PRELOAD_WORDS\"\n#\n/*ThouShaltNotCache*/\n\necho done\n";

fn write_manifest(dir: &TempDir, json: &str) -> SuiteManifest {
    let path = write_file(dir.path(), "suite.json", json);
    SuiteManifest::load(&path).unwrap()
}

#[tokio::test]
async fn startup_benchmark_runs_through_shell() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "bundle.sh", STARTUP_SCRIPT);
    write_file(dir.path(), "words.txt", "alpha beta gamma\n");

    let manifest = write_manifest(
        &dir,
        r#"{
            "shell": { "program": "sh" },
            "benchmarks": [{
                "name": "shell-startup",
                "kind": "startup",
                "bundle": "bundle.sh",
                "iterations": 4,
                "expected_cache_comment_count": 2,
                "source_code_reuse_count": 2,
                "preload": { "words": "words.txt" },
                "expectations": { "min_result_length": 5, "result_length": 22 }
            }]
        }"#,
    );

    let mut suite = build_suite(&manifest, &[], None).unwrap();
    let results = suite.run().await;

    assert_eq!(results.len(), 1);
    assert!(results[0].success, "{:?}", results[0].error);
    assert_eq!(results[0].iterations, 4);
    assert!(overall_score(&results).is_some());
    assert!(format_results(&results).contains("shell-startup"));
}

#[tokio::test]
async fn worker_benchmark_runs_through_shell() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "ok.sh", "exit 0\n");
    write_file(dir.path(), "also-ok.sh", "true\n");

    let manifest = write_manifest(
        &dir,
        r#"{
            "shell": { "program": "sh" },
            "benchmarks": [{
                "name": "shell-workers",
                "kind": "workers",
                "subtests": ["ok.sh", "also-ok.sh"],
                "iterations": 2,
                "pool": { "startup_concurrency": 2, "run_concurrency": 1 }
            }]
        }"#,
    );

    let mut suite = build_suite(&manifest, &[], None).unwrap();
    let results = suite.run().await;
    assert!(results[0].success, "{:?}", results[0].error);
    assert_eq!(results[0].iterations, 2);
}

#[tokio::test]
async fn failing_benchmark_does_not_stop_the_suite() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "broken.sh", "exit 3\n");
    write_file(dir.path(), "ok.sh", "exit 0\n");

    let manifest = write_manifest(
        &dir,
        r#"{
            "shell": { "program": "sh" },
            "benchmarks": [
                { "name": "broken", "kind": "workers", "subtests": ["broken.sh"], "iterations": 1 },
                { "name": "fine", "kind": "workers", "subtests": ["ok.sh"], "iterations": 1 }
            ]
        }"#,
    );

    let mut suite = build_suite(&manifest, &[], None).unwrap();
    let results = suite.run().await;

    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap().contains("failed"));
    assert!(results[1].success, "{:?}", results[1].error);
}

#[tokio::test]
async fn only_and_iteration_override_apply() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "ok.sh", "exit 0\n");

    let manifest = write_manifest(
        &dir,
        r#"{
            "shell": { "program": "sh" },
            "benchmarks": [
                { "name": "first", "kind": "workers", "subtests": ["ok.sh"] },
                { "name": "second", "kind": "workers", "subtests": ["ok.sh"],
                  "pool": { "startup_concurrency": 1 } }
            ]
        }"#,
    );

    let mut suite = build_suite(&manifest, &["second".to_string()], Some(3)).unwrap();
    let results = suite.run().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "second");
    assert_eq!(results[0].iterations, 3);
}

#[test]
fn manifest_paths_resolve_against_manifest_dir() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    let path = write_file(
        &dir.path().join("nested"),
        "suite.json",
        r#"{ "benchmarks": [ { "name": "a", "kind": "workers", "subtests": ["a.sh"] } ] }"#,
    );

    let manifest = SuiteManifest::load(&path).unwrap();
    assert_eq!(manifest.base_dir(), dir.path().join("nested"));
    assert_eq!(
        manifest.resolve("a.sh".as_ref()),
        dir.path().join("nested").join("a.sh")
    );
}
