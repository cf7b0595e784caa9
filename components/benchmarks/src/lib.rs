//! JetStream-style benchmark harness
//!
//! This crate drives benchmarks against a language runtime under test.
//! It includes:
//!
//! - Suite manifests describing each benchmark
//! - Startup benchmarks that defeat code caching with per-iteration sources
//! - Worker-group benchmarks that fan sub-tests out over worker threads
//! - A runner with JetStream-style first/worst/average scoring
//!
//! # Examples
//!
//! ```rust,no_run
//! use benchmarks::{manifest::SuiteManifest, suite};
//!
//! # async fn run() -> harness_core::HarnessResult<()> {
//! let manifest = SuiteManifest::load("suite.json".as_ref())?;
//! let mut suite = suite::build_suite(&manifest, &[], None)?;
//! for result in suite.run().await {
//!     println!("{}: {:.2}", result.name, result.score);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manifest;
pub mod preload;
pub mod runner;
pub mod startup;
pub mod suite;
pub mod worker_group;

pub use runner::{BenchmarkResult, BenchmarkSuite, Timings};
pub use startup::{StartupBenchmark, StartupOptions};
pub use worker_group::WorkerGroupBenchmark;
