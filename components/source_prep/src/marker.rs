//! Cache-bust marker verification and rewriting.

use harness_core::{HarnessError, HarnessResult};
use regex::Regex;
use std::sync::Arc;

/// Sentinel comment placed in bundles at every rewrite point.
pub const CACHE_BUST_COMMENT: &str = "/*ThouShaltNotCache*/";

/// A bundle whose cache-bust markers have been counted and verified.
///
/// A marker occurrence is the comment on a line of its own, i.e. surrounded
/// by one newline on each side. Occurrences are matched left to right
/// without overlap, so two markers sharing a newline count once.
#[derive(Debug, Clone)]
pub struct CacheBustTemplate {
    source: Arc<str>,
    marker_count: usize,
    marker_re: Regex,
}

impl CacheBustTemplate {
    /// Build a template, failing if the marker count differs from `expected`.
    ///
    /// # Errors
    /// Returns [`HarnessError::MarkerCountMismatch`] on a count mismatch.
    pub fn new(source: impl Into<Arc<str>>, expected: usize) -> HarnessResult<Self> {
        let source = source.into();
        let marker_re = marker_regex()?;
        let marker_count = marker_re.find_iter(&source).count();

        if marker_count != expected {
            return Err(HarnessError::MarkerCountMismatch {
                expected,
                actual: marker_count,
            });
        }

        Ok(Self {
            source,
            marker_count,
            marker_re,
        })
    }

    /// The unmodified bundle text
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Number of verified markers
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Replace every marker (with its newlines) by `/*{group_id}*/`.
    pub fn rewrite(&self, group_id: usize) -> String {
        let replacement = format!("/*{}*/", group_id);
        self.marker_re
            .replace_all(&self.source, regex::NoExpand(&replacement))
            .into_owned()
    }
}

/// Count marker occurrences in arbitrary text.
pub fn count_markers(text: &str) -> HarnessResult<usize> {
    Ok(marker_regex()?.find_iter(text).count())
}

fn marker_regex() -> HarnessResult<Regex> {
    let pattern = format!("\n{}\n", regex::escape(CACHE_BUST_COMMENT));
    Regex::new(&pattern).map_err(|e| HarnessError::Config(format!("marker pattern: {}", e)))
}
