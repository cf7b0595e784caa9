//! Startup benchmarks.
//!
//! Measures how long a runtime takes to load and run a bundle from scratch.
//! Each iteration gets a source whose cache-bust markers were rewritten for
//! its reuse group, so the runtime has to compile it again.

use crate::manifest::Expectations;
use crate::preload::{load_string, Preloader, Sample};
use async_trait::async_trait;
use harness_core::{expect, quick_hash, Driver, HarnessError, HarnessResult, INITIAL_TOTAL_HASH};
use source_prep::{CacheBustTemplate, IterationSources, ModuleLoader, SourceVariant};
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings of a startup benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct StartupOptions {
    /// Iterations the sources are prepared for
    pub iteration_count: usize,
    /// Markers the bundle must contain
    pub expected_cache_comment_count: usize,
    /// Iterations sharing one source; 0 disables rewriting
    pub source_code_reuse_count: usize,
    /// Output fixtures
    pub expectations: Expectations,
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            iteration_count: crate::manifest::DEFAULT_ITERATIONS,
            expected_cache_comment_count: 0,
            source_code_reuse_count: 1,
            expectations: Expectations::default(),
        }
    }
}

type EntryPoint<N> = Box<dyn FnMut(N, &[Sample]) -> HarnessResult<String> + Send>;

/// Driver that instantiates a fresh module every iteration and calls its
/// entry point with the preloaded samples.
pub struct StartupBenchmark<L: ModuleLoader> {
    name: String,
    description: String,
    bundle: PathBuf,
    preloader: Preloader,
    options: StartupOptions,
    loader: L,
    entry: EntryPoint<L::Namespace>,
    sources: Vec<SourceVariant>,
    samples: Vec<Sample>,
    total_hash: i32,
    last_result: Option<String>,
    last_hash: Option<i32>,
    iterations_run: usize,
}

impl<L: ModuleLoader> StartupBenchmark<L> {
    /// Create a startup benchmark.
    ///
    /// `entry` receives the module produced by `loader` for the iteration
    /// and returns the string result that is hashed and validated.
    pub fn new<F>(
        name: impl Into<String>,
        bundle: impl Into<PathBuf>,
        options: StartupOptions,
        loader: L,
        entry: F,
    ) -> Self
    where
        F: FnMut(L::Namespace, &[Sample]) -> HarnessResult<String> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            bundle: bundle.into(),
            preloader: Preloader::default(),
            options,
            loader,
            entry: Box::new(entry),
            sources: Vec::new(),
            samples: Vec::new(),
            total_hash: INITIAL_TOTAL_HASH,
            last_result: None,
            last_hash: None,
            iterations_run: 0,
        }
    }

    /// Set the report description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input files loaded during `init`
    pub fn with_preloader(mut self, preloader: Preloader) -> Self {
        self.preloader = preloader;
        self
    }

    /// Settings
    pub fn options(&self) -> &StartupOptions {
        &self.options
    }

    /// The module loader
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Sources prepared by `init`, one per iteration
    pub fn sources(&self) -> &[SourceVariant] {
        &self.sources
    }

    /// Samples loaded by `init`
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// XOR of every result hash folded into `0xdeadbeef`
    pub fn total_hash(&self) -> i32 {
        self.total_hash
    }

    /// Result of the last iteration
    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    /// Hash of the last result
    pub fn last_hash(&self) -> Option<i32> {
        self.last_hash
    }
}

#[async_trait]
impl<L: ModuleLoader> Driver for StartupBenchmark<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn init(&mut self) -> HarnessResult<()> {
        info!(benchmark = %self.name, bundle = %self.bundle.display(), "loading startup bundle");

        let (bundle, samples) =
            tokio::try_join!(load_string(&self.bundle), self.preloader.load_all())?;

        let template = CacheBustTemplate::new(bundle, self.options.expected_cache_comment_count)?;
        let mut sources = IterationSources::new(template, self.options.source_code_reuse_count);
        self.sources = sources.prepare(self.options.iteration_count);
        debug!(
            iterations = self.sources.len(),
            variants = sources.variant_count(),
            samples = samples.len(),
            "prepared iteration sources"
        );

        self.samples = samples;
        self.total_hash = INITIAL_TOTAL_HASH;
        self.last_result = None;
        self.last_hash = None;
        self.iterations_run = 0;
        Ok(())
    }

    async fn run_iteration(&mut self, iteration: usize) -> HarnessResult<()> {
        let source = self
            .sources
            .get(iteration)
            .ok_or(HarnessError::MissingIterationSource(iteration))?;

        let namespace = self.loader.instantiate(source).await?;
        let result = (self.entry)(namespace, &self.samples)?;

        if let Some(min) = self.options.expectations.min_result_length {
            let length = result.encode_utf16().count();
            if length <= min {
                return Err(HarnessError::InvalidResultLength(length));
            }
        }

        let hash = quick_hash(&result);
        self.total_hash ^= hash;
        debug!(iteration, group = ?source.group_id, hash, "iteration finished");

        self.last_result = Some(result);
        self.last_hash = Some(hash);
        self.iterations_run += 1;
        Ok(())
    }

    async fn validate(&mut self) -> HarnessResult<()> {
        let (result, hash) = match (&self.last_result, self.last_hash) {
            (Some(result), Some(hash)) => (result, hash),
            _ => {
                return Err(HarnessError::Validation {
                    name: "iterations run".to_string(),
                    expected: "at least 1".to_string(),
                    actual: "0".to_string(),
                })
            }
        };

        let expectations = &self.options.expectations;
        if let Some(length) = expectations.result_length {
            expect("result.length", result.encode_utf16().count(), length)?;
        }
        if let Some(expected_hash) = expectations.result_hash {
            expect("result hash", hash, expected_hash)?;
        }
        debug!(
            benchmark = %self.name,
            iterations = self.iterations_run,
            total_hash = self.total_hash,
            "validated startup benchmark"
        );
        Ok(())
    }
}
