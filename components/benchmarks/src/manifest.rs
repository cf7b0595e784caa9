//! Suite manifest: the JSON file listing every benchmark of a suite.
//!
//! ```json
//! {
//!   "shell": { "program": "d8", "args": ["--no-opt"] },
//!   "benchmarks": [
//!     {
//!       "name": "mobx-startup",
//!       "kind": "startup",
//!       "bundle": "mobx/dist/bundle.es6.js",
//!       "expected_cache_comment_count": 464,
//!       "source_code_reuse_count": 8
//!     },
//!     {
//!       "name": "bomb-workers",
//!       "kind": "workers",
//!       "subtests": ["worker/bomb-subtests/3d-cube.js"],
//!       "iterations": 2
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use harness_core::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use worker_pool::PoolConfig;

/// Default number of timed iterations
pub const DEFAULT_ITERATIONS: usize = 120;

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_reuse_count() -> usize {
    1
}

/// Runtime shell used to execute bundles and sub-tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Shell executable
    pub program: PathBuf,
    /// Arguments placed before the script path
    #[serde(default)]
    pub args: Vec<String>,
}

/// Optional per-runtime output fixtures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectations {
    /// Every result must be strictly longer than this
    pub min_result_length: Option<usize>,
    /// Exact length of the last result, in UTF-16 units
    pub result_length: Option<usize>,
    /// `quick_hash` of the last result
    pub result_hash: Option<i32>,
}

/// Settings of a startup benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupConfig {
    /// Bundle carrying the cache-bust markers
    pub bundle: PathBuf,
    /// Markers the bundle must contain
    pub expected_cache_comment_count: usize,
    /// Iterations sharing one rewritten source; 0 disables rewriting
    #[serde(default = "default_reuse_count")]
    pub source_code_reuse_count: usize,
    /// Input files loaded during `init`, by name
    #[serde(default)]
    pub preload: BTreeMap<String, PathBuf>,
    /// Output fixtures
    #[serde(default)]
    pub expectations: Expectations,
}

/// Settings of a worker-group benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Scripts run by the workers, cycled to fill whole startup batches
    pub subtests: Vec<PathBuf>,
    /// Concurrency caps
    #[serde(default)]
    pub pool: PoolConfig,
}

/// What kind of driver a benchmark uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BenchmarkKind {
    /// Fresh module per iteration from a cache-busted bundle
    Startup(StartupConfig),
    /// Batched worker threads
    Workers(WorkersConfig),
}

/// One benchmark of the suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    /// Unique name, also the anchor id in the in-depth page
    pub name: String,
    /// One-line description
    #[serde(default)]
    pub description: String,
    /// Timed iterations
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Driver kind and its settings
    #[serde(flatten)]
    pub kind: BenchmarkKind,
}

/// A parsed suite manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// Runtime shell under test
    #[serde(default)]
    pub shell: Option<ShellConfig>,
    /// Benchmarks in run order
    pub benchmarks: Vec<BenchmarkEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl SuiteManifest {
    /// Parse a manifest whose relative paths resolve against `base_dir`
    pub fn parse(json: &str, base_dir: impl Into<PathBuf>) -> HarnessResult<Self> {
        let mut manifest: SuiteManifest = serde_json::from_str(json)?;
        manifest.base_dir = base_dir.into();
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&json, base_dir)
    }

    /// Directory relative paths resolve against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a manifest path
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Names of every benchmark, in manifest order
    pub fn names(&self) -> Vec<String> {
        self.benchmarks.iter().map(|b| b.name.clone()).collect()
    }

    /// The named benchmarks, or all of them when `only` is empty
    pub fn select(&self, only: &[String]) -> HarnessResult<Vec<&BenchmarkEntry>> {
        if only.is_empty() {
            return Ok(self.benchmarks.iter().collect());
        }
        only.iter()
            .map(|name| {
                self.benchmarks
                    .iter()
                    .find(|b| &b.name == name)
                    .ok_or_else(|| HarnessError::Config(format!("unknown benchmark '{}'", name)))
            })
            .collect()
    }

    fn validate(&self) -> HarnessResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.benchmarks {
            if entry.name.is_empty() {
                return Err(HarnessError::Config("benchmark with empty name".to_string()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(HarnessError::Config(format!(
                    "benchmark '{}' is defined twice",
                    entry.name
                )));
            }
            if entry.iterations == 0 {
                return Err(HarnessError::Config(format!(
                    "benchmark '{}' needs at least one iteration",
                    entry.name
                )));
            }
            if let BenchmarkKind::Workers(workers) = &entry.kind {
                if workers.subtests.is_empty() {
                    return Err(HarnessError::Config(format!(
                        "benchmark '{}' has no sub-tests",
                        entry.name
                    )));
                }
            }
        }
        Ok(())
    }
}
