use crate::message::{WorkerCommand, WorkerEvent, WorkerId, WorkerMessage};
use crate::workload::SubTest;
use harness_core::{HarnessError, HarnessResult};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// A worker thread running one sub-test.
///
/// The thread builds its workload, posts `Ready`, then answers every
/// `Start` with `Done` (or `Failed`) until told to terminate. Dropping the
/// worker terminates and joins the thread.
pub struct BenchmarkWorker {
    id: WorkerId,
    subtest: String,
    sender: mpsc::Sender<WorkerCommand>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl BenchmarkWorker {
    /// Spawn a worker thread for `subtest`, reporting to `events`
    pub fn spawn(
        id: WorkerId,
        subtest: &SubTest,
        events: UnboundedSender<WorkerEvent>,
    ) -> HarnessResult<Self> {
        let (to_worker_tx, to_worker_rx) = mpsc::channel();

        let task = subtest.clone();
        let handle = thread::Builder::new()
            .name(format!("bench-worker-{}", id))
            .spawn(move || Self::worker_thread_main(id, task, to_worker_rx, events))
            .map_err(|e| HarnessError::Worker(format!("could not spawn worker {}: {}", id, e)))?;

        Ok(Self {
            id,
            subtest: subtest.name().to_string(),
            sender: to_worker_tx,
            thread_handle: Some(handle),
        })
    }

    fn worker_thread_main(
        id: WorkerId,
        subtest: SubTest,
        rx: mpsc::Receiver<WorkerCommand>,
        tx: UnboundedSender<WorkerEvent>,
    ) {
        let post = |message: WorkerMessage| {
            let _ = tx.send(WorkerEvent {
                worker: id,
                message,
            });
        };

        let mut workload = match catch(|| subtest.build()) {
            Ok(workload) => workload,
            Err(reason) => {
                post(WorkerMessage::Failed(reason));
                return;
            }
        };
        post(WorkerMessage::Ready);

        loop {
            match rx.recv() {
                Ok(WorkerCommand::Start) => {
                    trace!(worker = id, subtest = subtest.name(), "running");
                    match catch(|| workload.run()) {
                        Ok(()) => post(WorkerMessage::Done),
                        Err(reason) => post(WorkerMessage::Failed(reason)),
                    }
                }
                Ok(WorkerCommand::Terminate) | Err(_) => break,
            }
        }
    }

    /// Ask the worker to run its workload once
    pub fn start(&self) -> HarnessResult<()> {
        self.sender
            .send(WorkerCommand::Start)
            .map_err(|_| HarnessError::Worker(format!("worker {} has exited", self.id)))
    }

    /// Stop the thread and wait for it to exit
    pub fn terminate(&mut self) {
        let _ = self.sender.send(WorkerCommand::Terminate);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// Worker id
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Name of the sub-test this worker runs
    pub fn subtest(&self) -> &str {
        &self.subtest
    }
}

impl Drop for BenchmarkWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn catch<T>(f: impl FnOnce() -> HarnessResult<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("workload panicked".to_string()),
    }
}
