//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Run at (0,0,0)→(0,10000,0) with a valve sitting on it
pub const ENGULFED_VALVE: &str = r#"
pipeline: L-100
components:
  - refno: P-1
    kind: pipe
    rows:
      - { role: 1, east: 0, north: 0, up: 0, bore: 400 }
      - { role: 2, east: 0, north: 10000, up: 0, bore: 400 }
  - refno: V-1
    kind: valve
    rows:
      - { role: 1, east: 0, north: 5000, up: 0, bore: 400 }
      - { role: 2, east: 0, north: 5100, up: 0, bore: 400 }
"#;

/// Two connected pipes and one stray far away
pub const STRAY_PIPE: &str = r#"
components:
  - refno: P-1
    kind: pipe
    rows:
      - { role: 1, east: 0, north: 0, up: 0, bore: 200 }
      - { role: 2, east: 0, north: 1000, up: 0, bore: 200 }
  - refno: P-2
    kind: pipe
    rows:
      - { role: 1, east: 0, north: 1000, up: 0, bore: 200 }
      - { role: 2, east: 0, north: 2000, up: 0, bore: 200 }
  - refno: P-9
    kind: pipe
    rows:
      - { role: 1, east: 5000, north: 0, up: 0, bore: 200 }
      - { role: 2, east: 5000, north: 1000, up: 0, bore: 200 }
"#;

/// A single 40 m run
pub const LONG_RUN: &str = r#"
components:
  - refno: P-1
    kind: pipe
    rows:
      - { role: 1, east: 0, north: 0, up: 0, bore: 200 }
      - { role: 2, east: 0, north: 40000, up: 0, bore: 200 }
"#;

/// Helper to get a pcfr command isolated from any user config
pub fn pcfr(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("pcfr"));
    cmd.current_dir(tmp.path())
        .env_remove("PCFR_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .arg("--no-color");
    cmd
}

/// Write a document into the temp directory and return its path
pub fn write_document(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
