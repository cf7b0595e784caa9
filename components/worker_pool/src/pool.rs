use crate::coordinator::PoolCoordinator;
use crate::message::WorkerId;
use crate::worker::BenchmarkWorker;
use crate::workload::SubTest;
use harness_core::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Concurrency caps for the start and run phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Workers started (and awaited ready) per batch
    pub startup_concurrency: usize,
    /// Workers running at the same time
    pub run_concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            startup_concurrency: 8,
            run_concurrency: 16,
        }
    }
}

/// Batch counters accumulated over the pool's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Startup batches completed
    pub startup_batches: usize,
    /// Run batches completed
    pub run_batches: usize,
    /// Workers that reported ready
    pub workers_started: usize,
    /// Workers that reported done
    pub workers_run: usize,
}

/// A pool of sub-test workers started and run in bounded batches.
pub struct WorkerPool {
    config: PoolConfig,
    subtests: Vec<SubTest>,
    workers: Vec<BenchmarkWorker>,
    coordinator: PoolCoordinator,
    next_id: WorkerId,
    stats: PoolStats,
}

impl WorkerPool {
    /// Create an empty pool.
    ///
    /// # Errors
    /// Fails if there are no sub-tests or a concurrency cap is zero.
    pub fn new(config: PoolConfig, subtests: Vec<SubTest>) -> HarnessResult<Self> {
        if subtests.is_empty() {
            return Err(HarnessError::Config("worker pool needs at least one sub-test".to_string()));
        }
        if config.startup_concurrency == 0 || config.run_concurrency == 0 {
            return Err(HarnessError::Config(
                "worker pool concurrency caps must be positive".to_string(),
            ));
        }

        Ok(Self {
            config,
            subtests,
            workers: Vec::new(),
            coordinator: PoolCoordinator::new(),
            next_id: 1,
            stats: PoolStats::default(),
        })
    }

    /// Pool configuration
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Live workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Batch counters
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Sub-test count rounded up to whole startup batches
    pub fn full_batch_worker_count(&self) -> usize {
        self.subtests.len().div_ceil(self.config.startup_concurrency) * self.config.startup_concurrency
    }

    /// Start `total` workers, cycling through the sub-tests.
    ///
    /// Workers are spawned `startup_concurrency` at a time; the next batch
    /// is only spawned once every worker of the current one is ready.
    pub async fn start_workers(&mut self, total: usize) -> HarnessResult<()> {
        let mut test_index = 0;
        while test_index < total {
            let group_size = self.config.startup_concurrency.min(total - test_index);
            for _ in 0..group_size {
                let subtest = &self.subtests[test_index % self.subtests.len()];
                let id = self.next_id;
                self.next_id += 1;

                let worker = BenchmarkWorker::spawn(id, subtest, self.coordinator.sender())?;
                self.coordinator.expect_ready(id);
                self.workers.push(worker);
                test_index += 1;
            }

            self.coordinator.all_ready().await?;
            self.stats.startup_batches += 1;
            self.stats.workers_started += group_size;
            debug!(group_size, started = test_index, "worker batch ready");
        }
        Ok(())
    }

    /// Run every live worker once, `run_concurrency` at a time, taking
    /// batches from the end of the worker list.
    pub async fn run_sub_tests(&mut self) -> HarnessResult<()> {
        let mut remaining: Vec<usize> = (0..self.workers.len()).collect();
        while !remaining.is_empty() {
            let split = remaining.len().saturating_sub(self.config.run_concurrency);
            let group = remaining.split_off(split);

            for &index in &group {
                let worker = &self.workers[index];
                worker.start()?;
                self.coordinator.expect_done(worker.id());
            }

            self.coordinator.all_done().await?;
            self.stats.run_batches += 1;
            self.stats.workers_run += group.len();
            debug!(group_size = group.len(), left = remaining.len(), "worker batch done");
        }
        Ok(())
    }

    /// One full iteration: start whole batches of workers, run them all,
    /// then tear them down.
    ///
    /// # Errors
    /// Fails if workers survived a previous iteration, or if any worker
    /// fails or breaks protocol. The pool is emptied either way.
    pub async fn run_iteration(&mut self) -> HarnessResult<()> {
        if !self.workers.is_empty() {
            return Err(HarnessError::Worker(format!(
                "pool still holds {} workers from a previous iteration",
                self.workers.len()
            )));
        }

        let result = self.run_phases().await;
        self.shutdown().await?;
        result
    }

    async fn run_phases(&mut self) -> HarnessResult<()> {
        let total = self.full_batch_worker_count();
        self.start_workers(total).await?;
        if self.workers.len() % self.config.startup_concurrency != 0 {
            return Err(HarnessError::Worker(format!(
                "Invalid worker count: {}",
                self.workers.len()
            )));
        }
        self.run_sub_tests().await
    }

    /// Terminate and join every worker.
    pub async fn shutdown(&mut self) -> HarnessResult<()> {
        let workers = std::mem::take(&mut self.workers);
        self.coordinator = PoolCoordinator::new();
        tokio::task::spawn_blocking(move || drop(workers))
            .await
            .map_err(|e| HarnessError::Worker(format!("worker shutdown failed: {}", e)))
    }
}
