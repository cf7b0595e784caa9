//! Repository consistency checks for a benchmark suite.
//!
//! - [`in_depth`] - compares the suite's benchmark names with the anchors
//!   of the in-depth documentation page and checks its relative links
//! - [`build`] - rebuilds the packages touched by a change range
//! - [`report`] - named check outcomes shared by both

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod build;
pub mod command;
pub mod in_depth;
pub mod report;

pub use build::{changed_dirs, find_package_manifests, BuildRunner};
pub use command::{CommandRunner, SystemCommandRunner};
pub use in_depth::{InDepthChecker, InDepthPage};
pub use report::{CheckEntry, CheckOutcome, CheckReport};
