//! Group-keyed cache of rewritten iteration sources.

use crate::marker::CacheBustTemplate;
use harness_core::quick_hash;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The source text handed to one iteration.
#[derive(Debug, Clone)]
pub struct SourceVariant {
    /// Iteration this variant was requested for
    pub iteration: usize,
    /// Reuse group, or `None` when rewriting is disabled
    pub group_id: Option<usize>,
    /// Source text, shared by every iteration of the group
    pub text: Arc<str>,
    /// `quick_hash` of `text`
    pub hash: i32,
}

impl SourceVariant {
    /// Whether two variants share the same text allocation
    pub fn same_text(&self, other: &SourceVariant) -> bool {
        Arc::ptr_eq(&self.text, &other.text)
    }
}

/// Produces one source per iteration, rewriting once per reuse window.
///
/// With a reuse count `R`, iteration `i` belongs to group
/// `floor(i / R) * R`. The first request for a group rewrites the template;
/// later requests return the cached text unchanged. `R == 0` disables
/// rewriting and every iteration gets the original bundle.
#[derive(Debug)]
pub struct IterationSources {
    template: CacheBustTemplate,
    reuse_count: usize,
    original_hash: i32,
    variants: BTreeMap<usize, (Arc<str>, i32)>,
}

impl IterationSources {
    /// Create an empty cache over `template`
    pub fn new(template: CacheBustTemplate, reuse_count: usize) -> Self {
        let original_hash = quick_hash(template.source());
        Self {
            template,
            reuse_count,
            original_hash,
            variants: BTreeMap::new(),
        }
    }

    /// Iterations sharing one rewritten variant
    pub fn reuse_count(&self) -> usize {
        self.reuse_count
    }

    /// Reuse group of an iteration, `None` if rewriting is disabled
    pub fn group_id(&self, iteration: usize) -> Option<usize> {
        if self.reuse_count == 0 {
            None
        } else {
            Some(iteration / self.reuse_count * self.reuse_count)
        }
    }

    /// Source for `iteration`, rewriting on the first request of its group
    pub fn source_for(&mut self, iteration: usize) -> SourceVariant {
        let Some(group_id) = self.group_id(iteration) else {
            return SourceVariant {
                iteration,
                group_id: None,
                text: Arc::clone(self.template.source()),
                hash: self.original_hash,
            };
        };

        let template = &self.template;
        let (text, hash) = self.variants.entry(group_id).or_insert_with(|| {
            let text: Arc<str> = template.rewrite(group_id).into();
            let hash = quick_hash(&text);
            debug!(group_id, hash, "rewrote cache-bust markers");
            (text, hash)
        });

        SourceVariant {
            iteration,
            group_id: Some(group_id),
            text: Arc::clone(text),
            hash: *hash,
        }
    }

    /// Sources for iterations `0..iteration_count`, in order
    pub fn prepare(&mut self, iteration_count: usize) -> Vec<SourceVariant> {
        (0..iteration_count).map(|i| self.source_for(i)).collect()
    }

    /// Number of distinct rewritten variants produced so far
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}
