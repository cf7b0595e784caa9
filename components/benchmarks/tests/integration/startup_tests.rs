//! Startup driver tests with in-process loaders

use super::{bundle_with_markers, write_file};
use benchmarks::manifest::Expectations;
use benchmarks::preload::{Preloader, Sample};
use benchmarks::runner::run_driver;
use benchmarks::{StartupBenchmark, StartupOptions};
use harness_core::{quick_hash, Driver, HarnessError, HarnessResult, INITIAL_TOTAL_HASH};
use source_prep::{FnLoader, SourceVariant};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn options(iterations: usize, markers: usize, reuse: usize) -> StartupOptions {
    StartupOptions {
        iteration_count: iterations,
        expected_cache_comment_count: markers,
        source_code_reuse_count: reuse,
        expectations: Expectations::default(),
    }
}

fn echo_loader() -> FnLoader<
    impl FnMut(&SourceVariant) -> HarnessResult<SourceVariant> + Send,
    SourceVariant,
> {
    FnLoader::new(|source: &SourceVariant| Ok(source.clone()))
}

fn long_result(source: SourceVariant, _samples: &[Sample]) -> HarnessResult<String> {
    Ok(format!("{:?}:{}", source.group_id, "x".repeat(200)))
}

#[tokio::test]
async fn reuse_window_of_eight_yields_two_variants() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(464));

    let seen = Arc::new(Mutex::new(HashSet::new()));
    let recorder = seen.clone();
    let loader = FnLoader::new(move |source: &SourceVariant| {
        recorder.lock().unwrap().insert(source.text.to_string());
        Ok(source.clone())
    });

    let mut bench =
        StartupBenchmark::new("mobx-startup", &bundle, options(16, 464, 8), loader, long_result);
    let result = run_driver(&mut bench, 16).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.iterations, 16);
    assert_eq!(bench.loader().instances(), 16);
    assert_eq!(seen.lock().unwrap().len(), 2);

    let sources = bench.sources();
    assert_eq!(sources[7].group_id, Some(0));
    assert_eq!(sources[8].group_id, Some(8));
    assert!(sources[0].same_text(&sources[7]));
    assert!(!sources[0].same_text(&sources[8]));
}

#[tokio::test]
async fn marker_count_mismatch_fails_init() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(3));

    let mut bench = StartupBenchmark::new("bad", &bundle, options(4, 4, 1), echo_loader(), long_result);
    let err = bench.init().await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::MarkerCountMismatch {
            expected: 4,
            actual: 3
        }
    ));

    let result = run_driver(&mut bench, 4).await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Invalid cache comment count 3 expected 4.")
    );
}

#[tokio::test]
async fn empty_bundle_fails_init() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", "");

    let mut bench = StartupBenchmark::new("empty", &bundle, options(1, 0, 1), echo_loader(), long_result);
    assert!(matches!(
        bench.init().await,
        Err(HarnessError::EmptyInput(_))
    ));
}

#[tokio::test]
async fn iteration_without_source_is_reported() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(2));

    let mut bench = StartupBenchmark::new("short", &bundle, options(2, 2, 1), echo_loader(), long_result);
    let result = run_driver(&mut bench, 3).await;
    assert!(!result.success);
    assert_eq!(result.iterations, 2);
    assert_eq!(
        result.error.as_deref(),
        Some("Could not find source for iteration 2")
    );
}

#[tokio::test]
async fn short_results_are_rejected() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(1));

    let mut opts = options(1, 1, 1);
    opts.expectations.min_result_length = Some(5);
    let mut bench = StartupBenchmark::new(
        "short-result",
        &bundle,
        opts,
        echo_loader(),
        |_source: SourceVariant, _samples: &[Sample]| Ok("abcde".to_string()),
    );

    bench.init().await.unwrap();
    let err = bench.run_iteration(0).await.unwrap_err();
    assert!(matches!(err, HarnessError::InvalidResultLength(5)));
    assert_eq!(err.to_string(), "Invalid result length: 5");
}

#[tokio::test]
async fn validation_compares_length_and_hash() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(1));
    let output = "é".repeat(50);

    let mut opts = options(2, 1, 1);
    opts.expectations = Expectations {
        min_result_length: Some(10),
        result_length: Some(50),
        result_hash: Some(quick_hash(&output)),
    };
    let expected = output.clone();
    let mut bench = StartupBenchmark::new(
        "validated",
        &bundle,
        opts.clone(),
        echo_loader(),
        move |_source: SourceVariant, _samples: &[Sample]| Ok(expected.clone()),
    );

    let result = run_driver(&mut bench, 2).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(bench.last_result(), Some(output.as_str()));
    assert_eq!(bench.last_hash(), Some(quick_hash(&output)));
    // Two identical results cancel out.
    assert_eq!(bench.total_hash(), INITIAL_TOTAL_HASH);

    opts.expectations.result_hash = Some(quick_hash(&output) ^ 1);
    let mut bench = StartupBenchmark::new(
        "mismatch",
        &bundle,
        opts,
        echo_loader(),
        move |_source: SourceVariant, _samples: &[Sample]| Ok(output.clone()),
    );
    let result = run_driver(&mut bench, 2).await;
    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("Expected result hash to be"));
}

#[tokio::test]
async fn validate_without_iterations_fails() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(1));

    let mut bench = StartupBenchmark::new("idle", &bundle, options(1, 1, 1), echo_loader(), long_result);
    bench.init().await.unwrap();
    assert!(matches!(
        bench.validate().await,
        Err(HarnessError::Validation { .. })
    ));
}

#[tokio::test]
async fn reuse_count_zero_keeps_bundle_text() {
    let dir = TempDir::new().unwrap();
    let text = bundle_with_markers(2);
    let bundle = write_file(dir.path(), "bundle.js", &text);

    let mut bench = StartupBenchmark::new("plain", &bundle, options(3, 2, 0), echo_loader(), long_result);
    bench.init().await.unwrap();

    for source in bench.sources() {
        assert_eq!(source.group_id, None);
        assert_eq!(&*source.text, text.as_str());
    }
}

#[tokio::test]
async fn samples_reach_the_entry_point_in_order() {
    let dir = TempDir::new().unwrap();
    let bundle = write_file(dir.path(), "bundle.js", &bundle_with_markers(1));
    let words = write_file(dir.path(), "words.txt", "alpha beta");
    let numbers = write_file(dir.path(), "numbers.txt", "1 2 3");

    let mut bench = StartupBenchmark::new(
        "samples",
        &bundle,
        options(1, 1, 1),
        echo_loader(),
        |_source: SourceVariant, samples: &[Sample]| {
            Ok(samples
                .iter()
                .map(|s| format!("{}={}", s.name, s.content))
                .collect::<Vec<_>>()
                .join(";"))
        },
    )
    .with_preloader(Preloader::new([("words", words), ("numbers", numbers)]));

    let result = run_driver(&mut bench, 1).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(bench.samples().len(), 2);
    assert_eq!(bench.last_result(), Some("words=alpha beta;numbers=1 2 3"));
}
