//! Worker-group benchmarks.
//!
//! Every iteration starts a full set of workers in bounded batches, runs
//! each sub-test once and tears the workers down again.

use async_trait::async_trait;
use harness_core::{expect, Driver, HarnessError, HarnessResult};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};
use worker_pool::{PoolConfig, SubTest, Workload, WorkerPool};

/// Driver wrapping a [`WorkerPool`]
pub struct WorkerGroupBenchmark {
    name: String,
    description: String,
    subtests: Vec<SubTest>,
    config: PoolConfig,
    pool: Option<WorkerPool>,
    iterations_run: usize,
}

impl WorkerGroupBenchmark {
    /// Create a worker-group benchmark over the given sub-tests
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        subtests: Vec<SubTest>,
        config: PoolConfig,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subtests,
            config,
            pool: None,
            iterations_run: 0,
        }
    }

    /// The pool, once `init` has run
    pub fn pool(&self) -> Option<&WorkerPool> {
        self.pool.as_ref()
    }

    /// Completed iterations
    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }
}

#[async_trait]
impl Driver for WorkerGroupBenchmark {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn init(&mut self) -> HarnessResult<()> {
        let pool = WorkerPool::new(self.config, self.subtests.clone())?;
        info!(
            benchmark = %self.name,
            subtests = self.subtests.len(),
            workers = pool.full_batch_worker_count(),
            "created worker pool"
        );
        self.pool = Some(pool);
        self.iterations_run = 0;
        Ok(())
    }

    async fn run_iteration(&mut self, iteration: usize) -> HarnessResult<()> {
        let pool = self
            .pool
            .as_mut()
            .ok_or_else(|| HarnessError::Worker("worker pool is not initialized".to_string()))?;
        pool.run_iteration().await?;
        self.iterations_run += 1;
        debug!(iteration, stats = ?pool.stats(), "worker group iteration done");
        Ok(())
    }

    async fn validate(&mut self) -> HarnessResult<()> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| HarnessError::Worker("worker pool is not initialized".to_string()))?;
        let stats = pool.stats();
        expect(
            "workers started",
            stats.workers_started,
            pool.full_batch_worker_count() * self.iterations_run,
        )?;
        expect("workers run", stats.workers_run, stats.workers_started)
    }
}

/// A sub-test that runs `program args... script` once per start.
///
/// The script is read on the worker thread during setup and must not be
/// empty.
pub fn shell_subtest(program: impl Into<PathBuf>, args: Vec<String>, script: impl Into<PathBuf>) -> SubTest {
    let program = program.into();
    let script = script.into();
    let name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| script.display().to_string());

    SubTest::new(name, move || {
        let text = std::fs::read_to_string(&script).map_err(|e| HarnessError::io(&script, e))?;
        if text.is_empty() {
            return Err(HarnessError::EmptyInput(script.display().to_string()));
        }

        let program = program.clone();
        let args = args.clone();
        let script = script.clone();
        let workload = move || -> HarnessResult<()> {
            let output = Command::new(&program)
                .args(&args)
                .arg(&script)
                .output()
                .map_err(|e| HarnessError::io(&program, e))?;
            if output.status.success() {
                Ok(())
            } else {
                Err(HarnessError::Command {
                    command: format!("{} {}", program.display(), script.display()),
                    detail: format!(
                        "{}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                })
            }
        };
        Ok(Box::new(workload) as Box<dyn Workload>)
    })
}
