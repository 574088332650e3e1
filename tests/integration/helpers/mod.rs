//! Fixture builders for end-to-end tests.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub const HEADER: &str =
    "Script started on 2024-01-01 [TERM=\"xterm\" COLUMNS=\"80\" LINES=\"24\"]\n";

pub struct Recording {
    // Held so the files outlive the test body.
    pub dir: TempDir,
    pub typescript: PathBuf,
    pub timing: PathBuf,
}

/// Write a typescript/timing pair from (delay, output) chunks.
pub fn recording(chunks: &[(f64, &str)]) -> Recording {
    let dir = TempDir::new().expect("create temp dir");
    let typescript = dir.path().join("typescript");
    let timing = dir.path().join("timing");

    let mut data = String::from(HEADER);
    let mut timing_log = String::new();
    for (delay, text) in chunks {
        timing_log.push_str(&format!("{delay} {}\n", text.len()));
        data.push_str(text);
    }
    fs::write(&typescript, data).expect("write typescript");
    fs::write(&timing, timing_log).expect("write timing");

    Recording {
        dir,
        typescript,
        timing,
    }
}

pub fn cmd() -> Command {
    Command::cargo_bin("term2svg").expect("term2svg binary")
}
