use harness_core::HarnessResult;
use std::fmt;
use std::sync::Arc;

/// The body a worker runs on every `Start`.
pub trait Workload: Send {
    /// Run the workload once
    fn run(&mut self) -> HarnessResult<()>;
}

impl<F> Workload for F
where
    F: FnMut() -> HarnessResult<()> + Send,
{
    fn run(&mut self) -> HarnessResult<()> {
        self()
    }
}

type Setup = dyn Fn() -> HarnessResult<Box<dyn Workload>> + Send + Sync;

/// A named recipe for building a workload inside a worker thread.
///
/// The setup closure runs on the worker's own thread before it reports
/// ready, so loading cost is part of startup rather than of the run.
#[derive(Clone)]
pub struct SubTest {
    name: Arc<str>,
    setup: Arc<Setup>,
}

impl SubTest {
    /// Create a sub-test from its setup closure
    pub fn new<F>(name: impl Into<Arc<str>>, setup: F) -> Self
    where
        F: Fn() -> HarnessResult<Box<dyn Workload>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            setup: Arc::new(setup),
        }
    }

    /// Sub-test name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn build(&self) -> HarnessResult<Box<dyn Workload>> {
        (self.setup)()
    }
}

impl fmt::Debug for SubTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTest").field("name", &self.name).finish()
    }
}
