//! Animated conversion through the full binary.

use std::fs;

use predicates::prelude::*;

use super::helpers::{cmd, recording};

#[test]
fn animated_svg_goes_to_stdout() {
    let rec = recording(&[(0.5, "hello")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<svg "))
        .stdout(predicate::str::contains(">hello</text>"))
        .stdout(predicate::str::contains("@keyframes"));
}

#[test]
fn output_flag_writes_a_file() {
    let rec = recording(&[(0.1, "file output")]);
    let out = rec.dir.path().join("out.svg");
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let svg = fs::read_to_string(&out).expect("read output");
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains("file output"));
}

#[test]
fn smil_generator_emits_set_elements() {
    let rec = recording(&[(0.5, "smil")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--generator", "smil"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<set attributeName="))
        .stdout(predicate::str::contains("@keyframes").not());
}

#[test]
fn sgr_colors_resolve_through_the_palette() {
    let rec = recording(&[(0.5, "\x1b[31mred")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .assert()
        .success()
        .stdout(predicate::str::contains("fill:#cc0000;"));
}

#[test]
fn theme_file_overrides_appearance() {
    let rec = recording(&[(0.5, "themed")]);
    let theme = rec.dir.path().join("theme.json");
    fs::write(&theme, r##"{"default_bg": "#123456", "font_size": 20}"##).expect("write theme");

    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .arg("--theme")
        .arg(&theme)
        .assert()
        .success()
        .stdout(predicate::str::contains("fill=\"#123456\""))
        .stdout(predicate::str::contains("font-size=\"20\""));
}

#[test]
fn explicit_id_is_used_verbatim() {
    let rec = recording(&[(0.5, "id")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--id", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<svg id=\"demo\""));
}

#[test]
fn missing_input_files_fail_with_context() {
    let rec = recording(&[]);
    cmd()
        .arg(rec.dir.path().join("nope"))
        .arg(&rec.timing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open typescript file"));
}

#[test]
fn invalid_theme_json_fails_with_context() {
    let rec = recording(&[(0.5, "x")]);
    let theme = rec.dir.path().join("theme.json");
    fs::write(&theme, "{not json").expect("write theme");

    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .arg("--theme")
        .arg(&theme)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid theme JSON"));
}
