//! Builds a runnable suite from a manifest.
//!
//! Both benchmark kinds execute their scripts with the manifest's runtime
//! shell. Startup bundles go through a [`ShellLoader`] and the shell's
//! stdout is the iteration result; preload files are passed to the shell
//! as `JETBENCH_PRELOAD_<NAME>` environment variables.

use crate::manifest::{BenchmarkEntry, BenchmarkKind, ShellConfig, SuiteManifest};
use crate::preload::{Preloader, Sample};
use crate::runner::BenchmarkSuite;
use crate::startup::{StartupBenchmark, StartupOptions};
use crate::worker_group::{shell_subtest, WorkerGroupBenchmark};
use harness_core::{Driver, HarnessError, HarnessResult};
use source_prep::{ShellLoader, ShellOutput};
use tracing::info;

/// Prefix of the environment variables carrying preload paths
pub const PRELOAD_ENV_PREFIX: &str = "JETBENCH_PRELOAD_";

/// Environment variable name for a preload entry
pub fn preload_env_var(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", PRELOAD_ENV_PREFIX, suffix)
}

/// Build the suite for the selected benchmarks.
///
/// `only` restricts the suite to the named benchmarks (all when empty);
/// `iterations_override` replaces every benchmark's iteration count.
pub fn build_suite(
    manifest: &SuiteManifest,
    only: &[String],
    iterations_override: Option<usize>,
) -> HarnessResult<BenchmarkSuite> {
    if iterations_override == Some(0) {
        return Err(HarnessError::Config("iteration count must be positive".to_string()));
    }

    let mut suite = BenchmarkSuite::new("jetbench");
    for entry in manifest.select(only)? {
        let iterations = iterations_override.unwrap_or(entry.iterations);
        let driver = build_driver(manifest, entry, iterations)?;
        suite.add(driver, iterations);
    }
    info!(benchmarks = suite.len(), "suite ready");
    Ok(suite)
}

fn build_driver(
    manifest: &SuiteManifest,
    entry: &BenchmarkEntry,
    iterations: usize,
) -> HarnessResult<Box<dyn Driver>> {
    let shell = shell_for(manifest, entry)?;
    // Bare program names are looked up on PATH.
    let program = if shell.program.components().count() > 1 {
        manifest.resolve(&shell.program)
    } else {
        shell.program.clone()
    };

    match &entry.kind {
        BenchmarkKind::Startup(config) => {
            let mut loader = ShellLoader::new(program, shell.args.clone())?;
            let mut files = Vec::with_capacity(config.preload.len());
            for (name, path) in &config.preload {
                let path = manifest.resolve(path);
                loader = loader.with_env(preload_env_var(name), path.display().to_string());
                files.push((name.clone(), path));
            }

            let options = StartupOptions {
                iteration_count: iterations,
                expected_cache_comment_count: config.expected_cache_comment_count,
                source_code_reuse_count: config.source_code_reuse_count,
                expectations: config.expectations.clone(),
            };
            let driver = StartupBenchmark::new(
                entry.name.clone(),
                manifest.resolve(&config.bundle),
                options,
                loader,
                |output: ShellOutput, _samples: &[Sample]| Ok(output.stdout),
            )
            .with_description(entry.description.clone())
            .with_preloader(Preloader::new(files));
            Ok(Box::new(driver))
        }
        BenchmarkKind::Workers(config) => {
            let subtests = config
                .subtests
                .iter()
                .map(|script| shell_subtest(program.clone(), shell.args.clone(), manifest.resolve(script)))
                .collect();
            Ok(Box::new(WorkerGroupBenchmark::new(
                entry.name.clone(),
                entry.description.clone(),
                subtests,
                config.pool,
            )))
        }
    }
}

fn shell_for<'a>(manifest: &'a SuiteManifest, entry: &BenchmarkEntry) -> HarnessResult<&'a ShellConfig> {
    manifest.shell.as_ref().ok_or_else(|| {
        HarnessError::Config(format!(
            "benchmark '{}' needs a runtime shell but the manifest has none",
            entry.name
        ))
    })
}
