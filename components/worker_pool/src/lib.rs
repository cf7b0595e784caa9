//! Bounded fan-out worker groups.
//!
//! Sub-tests run on dedicated worker threads. Workers are started in
//! fixed-size batches, each batch waiting for every worker's `Ready`
//! signal, then run in fixed-size batches waiting for every `Done`.
//!
//! - [`BenchmarkWorker`] - one thread owning one sub-test workload
//! - [`PoolCoordinator`] - explicit ready/done bookkeeping
//! - [`WorkerPool`] - batched start and run phases

#![warn(missing_docs)]
#![warn(clippy::all)]

mod coordinator;
mod message;
mod pool;
mod worker;
mod workload;

pub use coordinator::PoolCoordinator;
pub use message::{WorkerCommand, WorkerEvent, WorkerId, WorkerMessage};
pub use pool::{PoolConfig, PoolStats, WorkerPool};
pub use worker::BenchmarkWorker;
pub use workload::{SubTest, Workload};
