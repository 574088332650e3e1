//! Static poster frames through the full binary.

use predicates::prelude::*;

use super::helpers::{cmd, recording};

#[test]
fn poster_at_end_shows_the_final_state() {
    let rec = recording(&[(0.5, "old"), (1.0, "\x1b[2K\rnew")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--poster-at", "end"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">new</text>"))
        .stdout(predicate::str::contains(">old</text>").not())
        .stdout(predicate::str::contains("@keyframes").not());
}

#[test]
fn poster_at_seconds_queries_history() {
    let rec = recording(&[(0.5, "old"), (1.0, "\x1b[2K\rnew")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--poster-at", "0.7"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">old</text>"))
        .stdout(predicate::str::contains(">new</text>").not());
}

#[test]
fn poster_includes_the_cursor() {
    let rec = recording(&[(0.5, "cursor here")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--poster-at", "end"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_cursor"));
}

#[test]
fn invalid_poster_time_is_rejected() {
    let rec = recording(&[(0.5, "x")]);
    cmd()
        .arg(&rec.typescript)
        .arg(&rec.timing)
        .args(["--poster-at", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid poster time"));
}
