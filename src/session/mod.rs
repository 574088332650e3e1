//! Recording ingestion for `script(1)` sessions.
//!
//! A recording is a pair of files: the typescript (raw terminal output,
//! prefixed by a `Script started` header line) and the timing log
//! produced by `script -t`, where each line is `<delay> <byte-count>`.
//! Replay walks the timing log, accumulates wall-clock time, pulls the
//! corresponding byte spans out of the typescript and feeds them to the
//! parser as timestamped chunks.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::Config;
use crate::terminal::{AnsiParser, TerminalState};

/// One line of the timing log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEntry {
    /// Seconds elapsed since the previous entry.
    pub delay: f64,
    /// Bytes of typescript output attributed to this instant.
    pub bytes: usize,
}

/// The replayed recording: final terminal state with its full cell and
/// event history, plus the recording's wall-clock length.
#[derive(Debug)]
pub struct Session {
    pub state: TerminalState,
    pub duration: f64,
}

/// Replay a recording from its two files.
pub fn replay_files(
    typescript: &Path,
    timing: &Path,
    config: &Config,
    cols_override: Option<usize>,
    rows_override: Option<usize>,
) -> Result<Session> {
    let typescript_file = File::open(typescript)
        .with_context(|| format!("failed to open typescript file {}", typescript.display()))?;
    let timing_file = File::open(timing)
        .with_context(|| format!("failed to open timing file {}", timing.display()))?;
    replay(
        BufReader::new(typescript_file),
        BufReader::new(timing_file),
        config,
        cols_override,
        rows_override,
    )
}

/// Replay a recording from readers.
///
/// Terminal dimensions resolve in priority order: explicit overrides,
/// then the `COLUMNS`/`LINES` values embedded in the typescript header,
/// then the configured defaults.
pub fn replay(
    mut typescript: impl BufRead,
    timing: impl BufRead,
    config: &Config,
    cols_override: Option<usize>,
    rows_override: Option<usize>,
) -> Result<Session> {
    let mut header = Vec::new();
    typescript
        .read_until(b'\n', &mut header)
        .context("failed to read typescript header")?;
    let header_text = String::from_utf8_lossy(&header);
    if !header_text.contains("Script started") {
        warn!("typescript does not begin with a script(1) header line");
    }

    let cols = cols_override
        .or_else(|| scan_dimension(&header_text, "COLUMNS"))
        .unwrap_or(config.cols);
    let rows = rows_override
        .or_else(|| scan_dimension(&header_text, "LINES"))
        .unwrap_or(config.rows);
    debug!(cols, rows, "replaying recording");

    let mut parser = AnsiParser::new(cols, rows);
    // Anchor the cursor timeline at the recording's start.
    parser.state.record_cursor_state(0.0);

    let mut current_time = 0.0;
    let mut buf = Vec::new();
    for (index, line) in timing.lines().enumerate() {
        let line = line.context("failed to read timing file")?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(entry) = parse_timing_line(&line) else {
            warn!(line = index + 1, "skipping malformed timing entry");
            continue;
        };

        current_time += entry.delay;
        if entry.bytes == 0 {
            continue;
        }

        buf.resize(entry.bytes, 0);
        let got = read_up_to(&mut typescript, &mut buf).context("failed to read typescript")?;
        if got > 0 {
            parser.process_chunk(&buf[..got], current_time);
        }
        if got < entry.bytes {
            warn!(
                line = index + 1,
                expected = entry.bytes,
                got,
                "typescript ended before the timing log; truncating replay"
            );
            break;
        }
    }

    Ok(Session {
        state: parser.into_state(),
        duration: current_time,
    })
}

/// Parse one `<delay> <byte-count>` timing line.
pub fn parse_timing_line(line: &str) -> Option<TimingEntry> {
    let mut parts = line.split_whitespace();
    let delay: f64 = parts.next()?.parse().ok()?;
    let bytes: usize = parts.next()?.parse().ok()?;
    if !(delay >= 0.0 && delay.is_finite()) || parts.next().is_some() {
        return None;
    }
    Some(TimingEntry { delay, bytes })
}

/// Extract a `KEY="value"` numeric field from the script header line.
fn scan_dimension(header: &str, key: &str) -> Option<usize> {
    let start = header.find(&format!("{key}=\""))? + key.len() + 2;
    let rest = &header[start..];
    let end = rest.find('"')?;
    rest[..end].parse().ok()
}

/// Fill `buf` from the reader, tolerating a short final read.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
