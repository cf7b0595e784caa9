//! Error taxonomy for the benchmark harness.
//!
//! Every failure is fatal for the benchmark it occurs in: there are no
//! retries and no partial results.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing, running or validating a benchmark.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The bundle does not contain the expected number of cache-bust markers
    #[error("Invalid cache comment count {actual} expected {expected}.")]
    MarkerCountMismatch {
        /// Marker count declared for the bundle
        expected: usize,
        /// Marker count found in the bundle
        actual: usize,
    },

    /// A validated value differs from its fixture
    #[error("Expected {name} to be {expected}, but got {actual}")]
    Validation {
        /// What was compared
        name: String,
        /// Fixture value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// `run_iteration` was called for an iteration with no prepared source
    #[error("Could not find source for iteration {0}")]
    MissingIterationSource(usize),

    /// An input file loaded as empty
    #[error("Got empty blob {0}")]
    EmptyInput(String),

    /// The workload produced a result that is too short to be meaningful
    #[error("Invalid result length: {0}")]
    InvalidResultLength(usize),

    /// File I/O error
    #[error("File error for '{}': {source}", path.display())]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A module could not be instantiated from its source
    #[error("Module error: {0}")]
    Module(String),

    /// A worker broke the ready/start/done protocol or failed its workload
    #[error("Worker error: {0}")]
    Worker(String),

    /// A subprocess exited unsuccessfully
    #[error("Command `{command}` failed: {detail}")]
    Command {
        /// Command line that was run
        command: String,
        /// Exit status and captured stderr
        detail: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    /// Wrap an I/O error together with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
