//! Module loaders: turn a prepared source variant into a fresh module
//! instance.
//!
//! Every call to [`ModuleLoader::instantiate`] yields a new namespace; the
//! loader never hands out state left over from an earlier iteration.

use crate::variants::SourceVariant;
use async_trait::async_trait;
use harness_core::{HarnessError, HarnessResult};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// Instantiates modules from iteration sources.
#[async_trait]
pub trait ModuleLoader: Send {
    /// The module namespace produced for one iteration
    type Namespace: Send;

    /// Load `source` into a freshly created module instance
    async fn instantiate(&mut self, source: &SourceVariant) -> HarnessResult<Self::Namespace>;
}

/// Loader backed by an in-process factory closure.
///
/// # Examples
///
/// ```
/// use source_prep::{CacheBustTemplate, FnLoader, IterationSources, ModuleLoader, SourceVariant};
///
/// let template = CacheBustTemplate::new("x\n/*ThouShaltNotCache*/\ny", 1).unwrap();
/// let mut sources = IterationSources::new(template, 1);
/// let mut loader = FnLoader::new(|source: &SourceVariant| Ok(source.text.len()));
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let len = rt.block_on(loader.instantiate(&sources.source_for(0))).unwrap();
/// assert_eq!(len, "x/*0*/y".len());
/// assert_eq!(loader.instances(), 1);
/// ```
pub struct FnLoader<F, N> {
    factory: F,
    instances: usize,
    _namespace: PhantomData<fn() -> N>,
}

impl<F, N> FnLoader<F, N>
where
    F: FnMut(&SourceVariant) -> HarnessResult<N> + Send,
{
    /// Wrap a factory that builds one namespace per call
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            instances: 0,
            _namespace: PhantomData,
        }
    }

    /// Number of namespaces created so far
    pub fn instances(&self) -> usize {
        self.instances
    }
}

#[async_trait]
impl<F, N> ModuleLoader for FnLoader<F, N>
where
    F: FnMut(&SourceVariant) -> HarnessResult<N> + Send,
    N: Send,
{
    type Namespace = N;

    async fn instantiate(&mut self, source: &SourceVariant) -> HarnessResult<N> {
        self.instances += 1;
        (self.factory)(source)
    }
}

/// Captured result of running a variant through a runtime shell.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// Standard output of the shell
    pub stdout: String,
    /// Standard error of the shell
    pub stderr: String,
    /// Wall-clock time of the process
    pub elapsed: Duration,
}

/// Loader that runs each variant in a new process of an external runtime
/// shell (`program args... <script>`).
///
/// Variants are written to a private scratch directory, one file per reuse
/// group, so every iteration of a group executes the same file.
pub struct ShellLoader {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    scratch: TempDir,
    scripts: HashMap<Option<usize>, PathBuf>,
}

impl ShellLoader {
    /// Create a loader for the given shell.
    ///
    /// # Errors
    /// Fails if the scratch directory cannot be created.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> HarnessResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("jetbench-")
            .tempdir()
            .map_err(|e| HarnessError::io(std::env::temp_dir(), e))?;

        Ok(Self {
            program: program.into(),
            args,
            env: Vec::new(),
            scratch,
            scripts: HashMap::new(),
        })
    }

    /// Forward an environment variable to every shell process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Directory holding the written variants
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    async fn script_for(&mut self, source: &SourceVariant) -> HarnessResult<PathBuf> {
        if let Some(path) = self.scripts.get(&source.group_id) {
            return Ok(path.clone());
        }

        let file_name = match source.group_id {
            Some(group_id) => format!("variant-{}.js", group_id),
            None => "bundle.js".to_string(),
        };
        let path = self.scratch.path().join(file_name);
        tokio::fs::write(&path, source.text.as_bytes())
            .await
            .map_err(|e| HarnessError::io(&path, e))?;
        debug!(path = %path.display(), "wrote iteration source");

        self.scripts.insert(source.group_id, path.clone());
        Ok(path)
    }

    fn command_line(&self, script: &Path) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.push(script.display().to_string());
        parts.join(" ")
    }
}

#[async_trait]
impl ModuleLoader for ShellLoader {
    type Namespace = ShellOutput;

    async fn instantiate(&mut self, source: &SourceVariant) -> HarnessResult<ShellOutput> {
        let script = self.script_for(source).await?;

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&script)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HarnessError::io(&self.program, e))?;
        let elapsed = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(status = %output.status, "runtime shell failed");
            return Err(HarnessError::Command {
                command: self.command_line(&script),
                detail: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(ShellOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}
