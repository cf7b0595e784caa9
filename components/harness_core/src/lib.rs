//! Shared building blocks for the benchmark harness.
//!
//! This crate provides the pieces every benchmark component agrees on:
//!
//! - [`HarnessError`] / [`HarnessResult`] - the error taxonomy
//! - [`Driver`] - the `init` / `run_iteration` / `validate` contract
//! - [`quick_hash`] - the cheap sampling hash used for validation
//! - [`expect`] - named equality assertion used by `validate`
//!
//! # Examples
//!
//! ```
//! use harness_core::{expect, quick_hash};
//!
//! let hash = quick_hash("<html></html>");
//! assert!(expect("HTML hash", hash, quick_hash("<html></html>")).is_ok());
//! assert!(expect("HTML length", 13, 14).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod driver;
mod error;
mod hash;

pub use driver::{expect, Driver};
pub use error::{HarnessError, HarnessResult};
pub use hash::{quick_hash, INITIAL_TOTAL_HASH};
