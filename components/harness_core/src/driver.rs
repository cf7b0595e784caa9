//! The driver contract shared by every benchmark.

use crate::error::{HarnessError, HarnessResult};
use async_trait::async_trait;
use std::fmt::Display;

/// A benchmark harness object.
///
/// `init` runs once before timing starts, `run_iteration` is the timed body
/// and `validate` checks the final state against fixtures.
#[async_trait]
pub trait Driver: Send {
    /// Benchmark name, unique within a suite
    fn name(&self) -> &str;

    /// One-line description shown in reports
    fn description(&self) -> &str {
        ""
    }

    /// One-time setup: load inputs and prepare sources
    async fn init(&mut self) -> HarnessResult<()>;

    /// Execute one timed iteration
    async fn run_iteration(&mut self, iteration: usize) -> HarnessResult<()>;

    /// Check the state left by the last iteration
    async fn validate(&mut self) -> HarnessResult<()> {
        Ok(())
    }
}

/// Compare a named value against its expected fixture.
pub fn expect<T>(name: &str, actual: T, expected: T) -> HarnessResult<()>
where
    T: PartialEq + Display,
{
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::Validation {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
