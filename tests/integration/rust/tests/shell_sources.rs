//! Prepared iteration sources executed by an external shell

use harness_core::quick_hash;
use source_prep::{CacheBustTemplate, IterationSources, ModuleLoader, ShellLoader};
use std::fs;

/// Two markers, each closing a comment line.
const SCRIPT: &str = "#\n/*ThouShaltNotCache*/\n\necho first\n#\n/*ThouShaltNotCache*/\n\necho second\n";

#[tokio::test]
async fn each_reuse_group_writes_one_script() {
    let template = CacheBustTemplate::new(SCRIPT, 2).unwrap();
    let mut sources = IterationSources::new(template, 3);
    let variants = sources.prepare(7);

    let mut loader = ShellLoader::new("sh", Vec::new()).unwrap();
    for variant in &variants {
        let output = loader.instantiate(variant).await.unwrap();
        assert_eq!(output.stdout, "first\nsecond\n");
    }

    let mut written: Vec<String> = fs::read_dir(loader.scratch_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["variant-0.js", "variant-3.js", "variant-6.js"]);

    let script = fs::read_to_string(loader.scratch_dir().join("variant-3.js")).unwrap();
    assert_eq!(script, "#/*3*/\necho first\n#/*3*/\necho second\n");
    assert_eq!(quick_hash(&script), variants[3].hash);
}

#[tokio::test]
async fn shell_failure_carries_stderr() {
    let template = CacheBustTemplate::new("echo nope >&2\nexit 7\n", 0).unwrap();
    let mut sources = IterationSources::new(template, 1);

    let mut loader = ShellLoader::new("sh", Vec::new()).unwrap();
    let err = loader.instantiate(&sources.source_for(0)).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("nope"), "{}", message);
}
