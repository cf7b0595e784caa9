use std::fmt;

/// Identifier of a worker within a pool
pub type WorkerId = u64;

/// Command sent from the pool to a worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Run the workload once
    Start,
    /// Leave the event loop
    Terminate,
}

/// Message posted by a worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Workload loaded, waiting for `Start`
    Ready,
    /// Workload finished
    Done,
    /// Loading or running the workload failed
    Failed(String),
}

impl fmt::Display for WorkerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerMessage::Ready => write!(f, "ready"),
            WorkerMessage::Done => write!(f, "done"),
            WorkerMessage::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// A worker message tagged with its sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEvent {
    /// Sending worker
    pub worker: WorkerId,
    /// Message body
    pub message: WorkerMessage,
}
