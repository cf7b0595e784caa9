//! Rebuild the packages affected by a change range.
//!
//! Every directory holding a `package.json` with a `build` script is a
//! buildable package. With a change range only packages whose directory
//! contains a changed file are rebuilt. The working tree is reset after
//! every build so generated artifacts never leak into the next one.

use crate::command::CommandRunner;
use crate::report::{CheckOutcome, CheckReport};
use harness_core::{HarnessError, HarnessResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

const MANIFEST: &str = "package.json";

/// Every ancestor directory of each changed file, joined to `root`.
///
/// The root itself is never included.
pub fn changed_dirs<S: AsRef<str>>(root: &Path, changed_files: &[S]) -> BTreeSet<PathBuf> {
    let mut dirs = BTreeSet::new();
    for file in changed_files {
        let mut current = Path::new(file.as_ref()).parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || dir == Path::new(".") {
                break;
            }
            dirs.insert(root.join(dir));
            current = dir.parent();
        }
    }
    dirs
}

/// All package manifests under `root`.
///
/// `node_modules`, `.git` and nested git checkouts of third-party code are
/// skipped. Results are sorted by path.
pub fn find_package_manifests(root: &Path) -> HarnessResult<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name();
            name != "node_modules" && name != ".git" && !entry.path().join(".git").exists()
        });

    let mut manifests = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            HarnessError::io(path, std::io::Error::other(e.to_string()))
        })?;
        if entry.file_type().is_file() && entry.file_name() == MANIFEST {
            manifests.push(entry.into_path());
        }
    }
    Ok(manifests)
}

/// The `scripts.build` entry of a package manifest, if any
pub fn build_script(manifest: &Path) -> HarnessResult<Option<String>> {
    let content = std::fs::read_to_string(manifest).map_err(|e| HarnessError::io(manifest, e))?;
    let package: serde_json::Value = serde_json::from_str(&content)?;
    Ok(package
        .get("scripts")
        .and_then(|scripts| scripts.get("build"))
        .and_then(|build| build.as_str())
        .map(str::to_string))
}

/// Builds packages through a [`CommandRunner`]
pub struct BuildRunner<C> {
    root: PathBuf,
    runner: C,
}

impl<C: CommandRunner> BuildRunner<C> {
    /// Create a runner for the repository at `root`
    pub fn new(root: impl Into<PathBuf>, runner: C) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    /// The command runner, for inspection
    pub fn runner(&self) -> &C {
        &self.runner
    }

    /// Directories touched by a git commit range such as `main...HEAD`
    pub fn changed_dirs_for_range(&mut self, range: &str) -> HarnessResult<BTreeSet<PathBuf>> {
        let output = self
            .runner
            .run(&self.root, "git", &["diff", "--name-only", range])?;
        let files: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Ok(changed_dirs(&self.root, &files))
    }

    /// Manifests to build: all of them without a change set, none for an
    /// empty one, otherwise those whose directory changed.
    pub fn select(
        &self,
        manifests: Vec<PathBuf>,
        changed: Option<&BTreeSet<PathBuf>>,
    ) -> Vec<PathBuf> {
        match changed {
            None => manifests,
            Some(dirs) if dirs.is_empty() => {
                info!("No file changes detected, skipping all");
                Vec::new()
            }
            Some(dirs) => {
                let selected: Vec<PathBuf> = manifests
                    .into_iter()
                    .filter(|manifest| manifest.parent().is_some_and(|dir| dirs.contains(dir)))
                    .collect();
                info!("Found {} modified package.json files to build", selected.len());
                selected
            }
        }
    }

    /// Build the selected packages, stopping at the first failure.
    ///
    /// # Errors
    /// Only discovery errors are returned; build failures are recorded in
    /// the report.
    pub fn run(&mut self, changed: Option<&BTreeSet<PathBuf>>) -> HarnessResult<CheckReport> {
        let manifests = find_package_manifests(&self.root)?;
        info!("Found {} package.json files", manifests.len());

        let mut report = CheckReport::new("Builds");
        for manifest in self.select(manifests, changed) {
            if build_script(&manifest)?.is_none() {
                continue;
            }
            let Some(dir) = manifest.parent().map(Path::to_path_buf) else {
                continue;
            };
            let relative = dir.strip_prefix(&self.root).unwrap_or(&dir);
            let name = format!("Building ./{}:", relative.display());

            let mut errors = Vec::new();
            if let Err(e) = self.build_package(&dir) {
                errors.push(e.to_string());
            }
            if let Err(e) = self.runner.run(&self.root, "git", &["reset", "--hard"]) {
                errors.push(e.to_string());
            }

            if !report.add(name, CheckOutcome::from_errors(errors)) {
                break;
            }
        }
        Ok(report)
    }

    fn build_package(&mut self, dir: &Path) -> HarnessResult<()> {
        self.runner.run(dir, "npm", &["ci"])?;
        self.runner.run(dir, "npm", &["run", "build"])?;
        Ok(())
    }
}
