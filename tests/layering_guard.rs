//! Layering guardrails for `hulldiff_core`.
//!
//! The core crate holds the comparison semantics and must stay pure: no dependencies, no process handling, no
//! filesystem access. This test scans its manifest and sources.

use std::fs;
use std::path::Path;

#[test]
fn core_has_no_dependencies() {
    let manifest = include_str!("../crates/hulldiff_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        panic!("`hulldiff_core` must not declare dependencies, found: {}", line);
    }
}

#[test]
fn core_does_no_io() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("crates/hulldiff_core/src");
    for entry in fs::read_dir(&src).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().map(|e| e == "rs").unwrap_or(false) {
            let source = fs::read_to_string(&path).unwrap();
            for forbidden in ["std::process", "std::fs", "std::net", "std::thread"] {
                assert!(
                    !source.contains(forbidden),
                    "{} uses {}; keep IO out of hulldiff_core",
                    path.display(),
                    forbidden
                );
            }
        }
    }
}
