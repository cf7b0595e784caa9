//! Per-iteration source preparation for startup benchmarks.
//!
//! A bundle is loaded once and carries a known number of cache-bust marker
//! comments. Before each reuse window of iterations every marker is
//! rewritten with a window-specific comment so a runtime cannot serve the
//! compiled code from a cache, while iterations inside the window see the
//! exact same text.
//!
//! - [`CacheBustTemplate`] - marker verification and rewriting
//! - [`IterationSources`] - group-keyed cache of rewritten variants
//! - [`ModuleLoader`] - turns a variant into a fresh module instance
//!
//! # Examples
//!
//! ```
//! use source_prep::{CacheBustTemplate, IterationSources};
//!
//! let bundle = "a\n/*ThouShaltNotCache*/\nb";
//! let template = CacheBustTemplate::new(bundle, 1).unwrap();
//! let mut sources = IterationSources::new(template, 2);
//!
//! assert_eq!(&*sources.source_for(1).text, "a/*0*/b");
//! assert_eq!(&*sources.source_for(2).text, "a/*2*/b");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod loader;
pub mod marker;
pub mod variants;

pub use loader::{FnLoader, ModuleLoader, ShellLoader, ShellOutput};
pub use marker::{CacheBustTemplate, CACHE_BUST_COMMENT};
pub use variants::{IterationSources, SourceVariant};
