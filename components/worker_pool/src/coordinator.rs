use crate::message::{WorkerEvent, WorkerId, WorkerMessage};
use harness_core::{HarnessError, HarnessResult};
use std::collections::HashSet;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Tracks which workers still owe a `Ready` or `Done` signal.
///
/// Workers report on a shared channel; the coordinator only consumes events
/// while one of [`all_ready`](Self::all_ready) or
/// [`all_done`](Self::all_done) is awaited, and any event that does not
/// belong to the awaited phase aborts it.
pub struct PoolCoordinator {
    events_tx: UnboundedSender<WorkerEvent>,
    events_rx: UnboundedReceiver<WorkerEvent>,
    pending_ready: HashSet<WorkerId>,
    pending_done: HashSet<WorkerId>,
}

impl PoolCoordinator {
    /// Create a coordinator with nothing pending
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx,
            pending_ready: HashSet::new(),
            pending_done: HashSet::new(),
        }
    }

    /// Sender handed to workers
    pub fn sender(&self) -> UnboundedSender<WorkerEvent> {
        self.events_tx.clone()
    }

    /// Register a worker whose `Ready` must be awaited
    pub fn expect_ready(&mut self, worker: WorkerId) {
        self.pending_ready.insert(worker);
    }

    /// Register a worker whose `Done` must be awaited
    pub fn expect_done(&mut self, worker: WorkerId) {
        self.pending_done.insert(worker);
    }

    /// Workers that have not reported ready yet
    pub fn pending_ready(&self) -> usize {
        self.pending_ready.len()
    }

    /// Workers that have not reported done yet
    pub fn pending_done(&self) -> usize {
        self.pending_done.len()
    }

    /// Wait until every registered worker has posted `Ready`
    pub async fn all_ready(&mut self) -> HarnessResult<()> {
        while !self.pending_ready.is_empty() {
            let event = self.next_event().await?;
            if event.message == WorkerMessage::Ready && self.pending_ready.remove(&event.worker) {
                continue;
            }
            self.pending_ready.clear();
            return Err(protocol_error(event));
        }
        Ok(())
    }

    /// Wait until every registered worker has posted `Done`
    pub async fn all_done(&mut self) -> HarnessResult<()> {
        while !self.pending_done.is_empty() {
            let event = self.next_event().await?;
            if event.message == WorkerMessage::Done && self.pending_done.remove(&event.worker) {
                continue;
            }
            self.pending_done.clear();
            return Err(protocol_error(event));
        }
        Ok(())
    }

    async fn next_event(&mut self) -> HarnessResult<WorkerEvent> {
        self.events_rx
            .recv()
            .await
            .ok_or_else(|| HarnessError::Worker("worker event channel closed".to_string()))
    }
}

impl Default for PoolCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn protocol_error(event: WorkerEvent) -> HarnessError {
    match event.message {
        WorkerMessage::Failed(reason) => {
            HarnessError::Worker(format!("worker {} failed: {}", event.worker, reason))
        }
        other => HarnessError::Worker(format!(
            "Unknown worker message: {} from worker {}",
            other, event.worker
        )),
    }
}
