//! Input loader for startup benchmarks.
//!
//! Preload files are read concurrently as tokio tasks and handed to the
//! benchmark's entry point in declaration order.

use harness_core::{quick_hash, HarnessError, HarnessResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A loaded input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Name the file was declared under
    pub name: String,
    /// File contents
    pub content: Arc<str>,
}

/// Read a file as UTF-8, rejecting empty files.
pub async fn load_string(path: &Path) -> HarnessResult<Arc<str>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| HarnessError::io(path, e))?;
    if content.is_empty() {
        return Err(HarnessError::EmptyInput(path.display().to_string()));
    }
    Ok(content.into())
}

/// Concurrent loader for named input files
#[derive(Debug, Clone, Default)]
pub struct Preloader {
    files: Vec<(String, PathBuf)>,
}

impl Preloader {
    /// Create a loader for the given `(name, path)` pairs
    pub fn new<I, S, P>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }

    /// Number of declared files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when nothing is declared
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load every file.
    ///
    /// All reads are spawned before any is awaited; the first failure in
    /// declaration order is returned.
    pub async fn load_all(&self) -> HarnessResult<Vec<Sample>> {
        let handles: Vec<(String, PathBuf, JoinHandle<HarnessResult<Arc<str>>>)> = self
            .files
            .iter()
            .map(|(name, path)| {
                let task_path = path.clone();
                let handle = tokio::spawn(async move { load_string(&task_path).await });
                (name.clone(), path.clone(), handle)
            })
            .collect();

        let mut samples = Vec::with_capacity(handles.len());
        for (name, path, handle) in handles {
            let content = handle
                .await
                .map_err(|e| HarnessError::io(&path, std::io::Error::other(e)))??;
            // Touch the whole sample once so lazy string work happens here.
            let hash = quick_hash(&content);
            debug!(%name, bytes = content.len(), hash, "preloaded sample");
            samples.push(Sample { name, content });
        }
        Ok(samples)
    }
}
