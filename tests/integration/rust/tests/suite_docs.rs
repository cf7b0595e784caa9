//! Suite manifests checked against their in-depth page

use benchmarks::manifest::SuiteManifest;
use repo_checks::{InDepthChecker, InDepthPage};
use std::fs;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
    "benchmarks": [
        { "name": "mobx-startup", "kind": "startup", "bundle": "mobx/bundle.js",
          "expected_cache_comment_count": 464, "source_code_reuse_count": 8 },
        { "name": "bomb-workers", "kind": "workers", "subtests": ["worker/a.js"] }
    ]
}"#;

fn page(ids: &[&str]) -> String {
    let mut html = String::from("<html><body><dl id=\"workload-details\">\n");
    for id in ids {
        html.push_str(&format!(
            "<dt id=\"{id}\">{id}</dt>\n<dd><a href=\"{id}/README.md\">source</a></dd>\n"
        ));
    }
    html.push_str("</dl></body></html>\n");
    html
}

fn checked(dir: &TempDir, ids: &[&str]) -> repo_checks::CheckReport {
    let manifest = SuiteManifest::parse(MANIFEST, dir.path()).unwrap();
    let page = InDepthPage::parse(&page(ids)).unwrap();
    InDepthChecker::new(dir.path(), "in-depth.html", manifest.names(), page).run()
}

#[test]
fn documented_suite_passes() {
    let dir = TempDir::new().unwrap();
    for id in ["mobx-startup", "bomb-workers"] {
        fs::create_dir(dir.path().join(id)).unwrap();
        fs::write(dir.path().join(id).join("README.md"), "docs").unwrap();
    }

    let report = checked(&dir, &["mobx-startup", "bomb-workers"]);
    assert!(report.is_success(), "{}", report.summary());
}

#[test]
fn undocumented_benchmark_fails() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("mobx-startup")).unwrap();
    fs::write(dir.path().join("mobx-startup").join("README.md"), "docs").unwrap();

    let report = checked(&dir, &["mobx-startup"]);
    assert!(!report.is_success());
    assert!(report.errors().contains(
        &"Benchmark 'bomb-workers' is defined in the suite manifest but missing in in-depth.html"
    ));
}
