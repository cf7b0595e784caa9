//! Subprocess execution behind a trait so callers can substitute a fake.

use harness_core::{HarnessError, HarnessResult};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Runs external commands
pub trait CommandRunner {
    /// Run `program args...` in `dir`, returning its standard output.
    ///
    /// # Errors
    /// Fails if the program cannot start or exits unsuccessfully.
    fn run(&mut self, dir: &Path, program: &str, args: &[&str]) -> HarnessResult<String>;
}

/// Runs commands with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, dir: &Path, program: &str, args: &[&str]) -> HarnessResult<String> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        info!(dir = %dir.display(), "$ {}", command_line);

        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| HarnessError::io(program, e))?;

        if !output.status.success() {
            return Err(HarnessError::Command {
                command: command_line,
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
