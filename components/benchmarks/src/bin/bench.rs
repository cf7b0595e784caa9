//! jetbench CLI
//!
//! Runs benchmark suites and the repository checks that keep a suite
//! consistent.

use benchmarks::manifest::SuiteManifest;
use benchmarks::{runner, suite};
use clap::{Parser, Subcommand};
use harness_core::{HarnessError, HarnessResult};
use repo_checks::{BuildRunner, CheckReport, InDepthChecker, InDepthPage, SystemCommandRunner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jetbench", version, about = "JetStream-style benchmark harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run benchmarks from a suite manifest
    Run {
        /// Suite manifest
        #[arg(long)]
        manifest: PathBuf,
        /// Only run the named benchmark (repeatable)
        #[arg(long)]
        only: Vec<String>,
        /// Override every benchmark's iteration count
        #[arg(long)]
        iterations: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the in-depth page against the suite manifest
    CheckDocs {
        /// Suite manifest
        #[arg(long)]
        manifest: PathBuf,
        /// In-depth HTML page
        #[arg(long)]
        page: PathBuf,
        /// Directory relative links resolve against
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Build the npm packages touched by a change range
    Build {
        /// Repository root
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Git range such as `main...HEAD`; builds everything when omitted
        #[arg(long)]
        diff: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match execute(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> HarnessResult<bool> {
    match command {
        Command::Run {
            manifest,
            only,
            iterations,
            json,
        } => {
            let manifest = SuiteManifest::load(&manifest)?;
            let mut suite = suite::build_suite(&manifest, &only, iterations)?;
            let results = suite.run().await;

            if json {
                println!("{}", runner::format_results_json(&results)?);
            } else {
                println!("{}", runner::format_results(&results));
            }
            Ok(results.iter().all(|r| r.success))
        }
        Command::CheckDocs {
            manifest,
            page,
            root,
        } => {
            let manifest = SuiteManifest::load(&manifest)?;
            let page_name = page
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| page.display().to_string());
            let checker =
                InDepthChecker::new(root, page_name, manifest.names(), InDepthPage::load(&page)?);
            let report = checker.run();
            print!("{}", report.summary());
            Ok(report.is_success())
        }
        Command::Build { root, diff } => {
            let report = tokio::task::spawn_blocking(move || -> HarnessResult<CheckReport> {
                let mut builder = BuildRunner::new(root, SystemCommandRunner);
                let changed = diff
                    .map(|range| builder.changed_dirs_for_range(&range))
                    .transpose()?;
                builder.run(changed.as_ref())
            })
            .await
            .map_err(|e| HarnessError::Command {
                command: "build".to_string(),
                detail: e.to_string(),
            })??;
            print!("{}", report.summary());
            Ok(report.is_success())
        }
    }
}
