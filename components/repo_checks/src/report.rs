//! Named check outcomes collected into a printable report.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Outcome of one named check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckOutcome {
    /// The check found nothing wrong
    Pass,
    /// The check failed with one message per problem
    Fail(Vec<String>),
}

impl CheckOutcome {
    /// Pass when `errors` is empty, fail otherwise
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            CheckOutcome::Pass
        } else {
            CheckOutcome::Fail(errors)
        }
    }

    /// Check if the outcome is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }
}

/// A named check and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEntry {
    /// Check name
    pub name: String,
    /// What the check found
    pub outcome: CheckOutcome,
}

/// Outcomes of a sequence of checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    /// Report heading
    pub title: String,
    /// Checks in the order they ran
    pub checks: Vec<CheckEntry>,
}

impl CheckReport {
    /// Create an empty report
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            checks: Vec::new(),
        }
    }

    /// Record an outcome, logging it as it lands
    pub fn add(&mut self, name: impl Into<String>, outcome: CheckOutcome) -> bool {
        let name = name.into();
        match &outcome {
            CheckOutcome::Pass => info!("{} ... ok", name),
            CheckOutcome::Fail(errors) => {
                error!("{} ... FAILED", name);
                for message in errors {
                    error!("- {}", message);
                }
            }
        }
        let passed = outcome.is_pass();
        self.checks.push(CheckEntry { name, outcome });
        passed
    }

    /// Number of passing checks
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.outcome.is_pass()).count()
    }

    /// Number of failing checks
    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    /// True when no check failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Every error message, in check order
    pub fn errors(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter_map(|c| match &c.outcome {
                CheckOutcome::Fail(errors) => Some(errors.iter().map(String::as_str)),
                CheckOutcome::Pass => None,
            })
            .flatten()
            .collect()
    }

    /// Human-readable summary including failure details
    pub fn summary(&self) -> String {
        let mut output = format!(
            "{}: {} passed, {} failed\n",
            self.title,
            self.passed(),
            self.failed()
        );
        for check in &self.checks {
            match &check.outcome {
                CheckOutcome::Pass => output.push_str(&format!("  ok      {}\n", check.name)),
                CheckOutcome::Fail(errors) => {
                    output.push_str(&format!("  FAILED  {}\n", check.name));
                    for message in errors {
                        output.push_str(&format!("    - {}\n", message));
                    }
                }
            }
        }
        output
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
