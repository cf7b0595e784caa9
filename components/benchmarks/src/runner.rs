//! Benchmark runner and result types
//!
//! Runs drivers through `init`, the timed iterations and `validate`, and
//! scores them the JetStream way: the first iteration, the average of the
//! worst few later iterations and the average of all later iterations each
//! contribute a sub-score, combined by geometric mean.

use harness_core::{Driver, HarnessResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Later iterations averaged into the worst-case time
pub const WORST_CASE_COUNT: usize = 4;

/// Reference time for sub-scores, in milliseconds
const SCORE_REFERENCE_MS: f64 = 5000.0;

/// Times derived from one benchmark's iteration durations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Duration of iteration 0
    pub first_ms: f64,
    /// Mean of the slowest later iterations
    pub worst_ms: f64,
    /// Mean of all later iterations
    pub average_ms: f64,
}

impl Timings {
    /// Derive timings from per-iteration durations.
    ///
    /// Returns `None` when there are no samples. With a single sample all
    /// three times equal the first one.
    pub fn from_samples(samples_ms: &[f64]) -> Option<Self> {
        let (&first_ms, rest) = samples_ms.split_first()?;
        if rest.is_empty() {
            return Some(Self {
                first_ms,
                worst_ms: first_ms,
                average_ms: first_ms,
            });
        }

        let mut sorted = rest.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let worst = &sorted[..WORST_CASE_COUNT.min(sorted.len())];

        Some(Self {
            first_ms,
            worst_ms: mean(worst),
            average_ms: mean(rest),
        })
    }

    /// Geometric mean of the three sub-scores
    pub fn score(&self) -> f64 {
        geometric_mean(&[
            sub_score(self.first_ms),
            sub_score(self.worst_ms),
            sub_score(self.average_ms),
        ])
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sub_score(ms: f64) -> f64 {
    SCORE_REFERENCE_MS / ms.max(1e-3)
}

fn geometric_mean(values: &[f64]) -> f64 {
    (values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64).exp()
}

/// Result of running a benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark
    pub name: String,
    /// Description of the benchmark
    pub description: String,
    /// Iterations that completed
    pub iterations: usize,
    /// Duration of the first iteration in milliseconds
    pub first_ms: f64,
    /// Mean of the worst later iterations in milliseconds
    pub worst_ms: f64,
    /// Mean of the later iterations in milliseconds
    pub average_ms: f64,
    /// Combined score, higher is better
    pub score: f64,
    /// Whether the benchmark completed and validated
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
}

impl BenchmarkResult {
    fn failed(driver: &dyn Driver, iterations: usize, error: String) -> Self {
        Self {
            name: driver.name().to_string(),
            description: driver.description().to_string(),
            iterations,
            first_ms: 0.0,
            worst_ms: 0.0,
            average_ms: 0.0,
            score: 0.0,
            success: false,
            error: Some(error),
        }
    }
}

/// Run one driver for `iterations` timed iterations.
///
/// The first error ends the benchmark; nothing is retried.
pub async fn run_driver(driver: &mut dyn Driver, iterations: usize) -> BenchmarkResult {
    info!(benchmark = driver.name(), iterations, "running benchmark");

    let mut samples = Vec::with_capacity(iterations);
    let outcome = drive(driver, iterations, &mut samples).await;

    match (outcome, Timings::from_samples(&samples)) {
        (Ok(()), Some(timings)) => BenchmarkResult {
            name: driver.name().to_string(),
            description: driver.description().to_string(),
            iterations: samples.len(),
            first_ms: timings.first_ms,
            worst_ms: timings.worst_ms,
            average_ms: timings.average_ms,
            score: timings.score(),
            success: true,
            error: None,
        },
        (Ok(()), None) => {
            BenchmarkResult::failed(driver, 0, "benchmark ran no iterations".to_string())
        }
        (Err(e), _) => {
            error!(benchmark = driver.name(), error = %e, "benchmark failed");
            BenchmarkResult::failed(driver, samples.len(), e.to_string())
        }
    }
}

async fn drive(
    driver: &mut dyn Driver,
    iterations: usize,
    samples: &mut Vec<f64>,
) -> HarnessResult<()> {
    driver.init().await?;
    for iteration in 0..iterations {
        let start = Instant::now();
        driver.run_iteration(iteration).await?;
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    driver.validate().await
}

/// Suite of benchmarks
pub struct BenchmarkSuite {
    /// Name of the suite
    pub name: String,
    drivers: Vec<(Box<dyn Driver>, usize)>,
}

impl BenchmarkSuite {
    /// Create a new benchmark suite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            drivers: Vec::new(),
        }
    }

    /// Add a driver run for `iterations` iterations
    pub fn add(&mut self, driver: Box<dyn Driver>, iterations: usize) {
        self.drivers.push((driver, iterations));
    }

    /// Number of benchmarks in this suite
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// True if the suite holds no benchmarks
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Names of the benchmarks in run order
    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(d, _)| d.name()).collect()
    }

    /// Run all benchmarks in order.
    ///
    /// A failing benchmark is reported and the suite moves on.
    pub async fn run(&mut self) -> Vec<BenchmarkResult> {
        let mut results = Vec::with_capacity(self.drivers.len());
        for (driver, iterations) in &mut self.drivers {
            results.push(run_driver(driver.as_mut(), *iterations).await);
        }
        results
    }
}

/// Geometric mean of the scores of successful results
pub fn overall_score(results: &[BenchmarkResult]) -> Option<f64> {
    let scores: Vec<f64> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.score)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(geometric_mean(&scores))
    }
}

/// Format benchmark results as a human-readable table
pub fn format_results(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{:<30} {:>10} {:>10} {:>10} {:>9} {:<6}\n",
        "Benchmark", "First", "Worst", "Average", "Score", "Status"
    ));
    output.push_str(&format!("{}\n", "=".repeat(80)));

    for result in results {
        let status = if result.success { "PASS" } else { "FAIL" };
        output.push_str(&format!(
            "{:<30} {:>10.2} {:>10.2} {:>10.2} {:>9.2} {:<6}\n",
            result.name, result.first_ms, result.worst_ms, result.average_ms, result.score, status
        ));

        if let Some(error) = &result.error {
            output.push_str(&format!("  Error: {}\n", error));
        }
    }

    if let Some(score) = overall_score(results) {
        output.push_str(&format!("{}\n", "-".repeat(80)));
        output.push_str(&format!("{:<30} {:>42.2}\n", "Total score", score));
    }

    output
}

/// Format benchmark results as JSON
pub fn format_results_json(results: &[BenchmarkResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}
