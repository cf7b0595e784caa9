//! Integration tests for the benchmark drivers and suite

mod startup_tests;
mod suite_tests;

use std::fs;
use std::path::{Path, PathBuf};

/// Build a bundle with `markers` cache-bust markers between functions.
pub fn bundle_with_markers(markers: usize) -> String {
    let mut bundle = String::from("var Bench = {};\n");
    for i in 0..markers {
        bundle.push_str(&format!("function f{}() {{ return {}; }}", i, i));
        bundle.push_str("\n/*ThouShaltNotCache*/\n");
    }
    bundle.push_str("Bench.run = f0;\n");
    bundle
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
