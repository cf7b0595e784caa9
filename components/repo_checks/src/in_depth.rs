//! Consistency between the suite's benchmarks and the in-depth page.
//!
//! The page documents each benchmark under a `<dt id="...">` entry inside
//! the element with id `workload-details`; the `<dd>` that follows may link
//! to files in the repository.

use crate::report::{CheckOutcome, CheckReport};
use harness_core::{HarnessError, HarnessResult};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

const SECTION: &str = "#workload-details";
const ANCHORS: &str = "#workload-details dt[id]";
const DESCRIPTIONS: &str = "#workload-details dd";
const LINKS: &str = "a[href]";

/// Anchors and links extracted from the in-depth page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InDepthPage {
    /// Ids of `<dt>` entries in the workload section
    pub anchors: BTreeSet<String>,
    /// `href` values of links inside `<dd>` blocks of the workload section
    pub links: Vec<String>,
}

impl InDepthPage {
    /// Extract anchors and links from the page markup.
    ///
    /// A page without a workload section yields no anchors.
    pub fn parse(html: &str) -> HarnessResult<Self> {
        let document = Html::parse_document(html);

        if document.select(&selector(SECTION)?).next().is_none() {
            warn!("no {} section found", SECTION);
            return Ok(Self::default());
        }

        let anchors = document
            .select(&selector(ANCHORS)?)
            .filter_map(|dt| dt.value().attr("id"))
            .map(str::to_string)
            .collect();

        let link = selector(LINKS)?;
        let links = document
            .select(&selector(DESCRIPTIONS)?)
            .flat_map(|dd| {
                dd.select(&link)
                    .filter_map(|a| a.value().attr("href"))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Self { anchors, links })
    }

    /// Read and parse a page from disk
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let html = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::parse(&html)
    }
}

/// Compares benchmark names defined by the suite with the documented ones.
pub struct InDepthChecker {
    root: PathBuf,
    page_name: String,
    defined: Vec<String>,
    page: InDepthPage,
}

impl InDepthChecker {
    /// Create a checker.
    ///
    /// `root` is the directory relative links resolve against and
    /// `page_name` is used in messages.
    pub fn new(
        root: impl Into<PathBuf>,
        page_name: impl Into<String>,
        defined: impl IntoIterator<Item = String>,
        page: InDepthPage,
    ) -> Self {
        Self {
            root: root.into(),
            page_name: page_name.into(),
            defined: defined.into_iter().collect(),
            page,
        }
    }

    /// The suite must define at least one benchmark
    pub fn check_has_benchmarks(&self) -> Vec<String> {
        if self.defined.is_empty() {
            vec!["No benchmarks defined".to_string()]
        } else {
            Vec::new()
        }
    }

    /// Every defined benchmark must be documented
    pub fn check_defined_documented(&self) -> Vec<String> {
        self.defined
            .iter()
            .filter(|name| !self.page.anchors.contains(*name))
            .map(|name| {
                format!(
                    "Benchmark '{}' is defined in the suite manifest but missing in {}",
                    name, self.page_name
                )
            })
            .collect()
    }

    /// Every documented benchmark must be defined
    pub fn check_documented_defined(&self) -> Vec<String> {
        self.page
            .anchors
            .iter()
            .filter(|id| !self.defined.contains(id))
            .map(|id| {
                format!(
                    "Benchmark '{}' is listed in {} but not defined in the suite manifest",
                    id, self.page_name
                )
            })
            .collect()
    }

    /// Relative links in the workload descriptions must point at existing files
    pub fn check_relative_links(&self) -> Vec<String> {
        self.page
            .links
            .iter()
            .filter(|href| !is_external(href))
            .filter_map(|href| {
                let relative = href.split('#').next().unwrap_or("");
                let relative = relative.split('?').next().unwrap_or("");
                // Site-absolute links are still rooted at the checkout.
                let resolved = self.root.join(relative.trim_start_matches('/'));
                if resolved.exists() {
                    None
                } else {
                    Some(format!(
                        "Broken link in {}: '{}' (resolved to '{}') does not exist.",
                        self.page_name,
                        href,
                        resolved.display()
                    ))
                }
            })
            .collect()
    }

    /// Run every check; each is reported even when an earlier one failed
    pub fn run(&self) -> CheckReport {
        let mut report = CheckReport::new(format!("In-depth checks for {}", self.page_name));
        report.add(
            "Has benchmarks",
            CheckOutcome::from_errors(self.check_has_benchmarks()),
        );
        report.add(
            format!("Check defined benchmarks are in {}", self.page_name),
            CheckOutcome::from_errors(self.check_defined_documented()),
        );
        report.add(
            format!("Check {} benchmarks are defined", self.page_name),
            CheckOutcome::from_errors(self.check_documented_defined()),
        );
        report.add(
            "Check relative links",
            CheckOutcome::from_errors(self.check_relative_links()),
        );
        report
    }
}

fn is_external(href: &str) -> bool {
    href.starts_with("http") || href.starts_with("mailto:") || href.starts_with('#')
}

fn selector(css: &str) -> HarnessResult<Selector> {
    Selector::parse(css).map_err(|e| HarnessError::Config(format!("invalid selector {}: {}", css, e)))
}
