//! ANSI escape-sequence state machine.
//!
//! `AnsiParser` consumes timestamped chunks of raw terminal output and
//! interprets control characters, escape sequences, CSI commands, OSC
//! strings and SGR attributes, mutating a [`TerminalState`] as it goes.
//! Because the output of a conversion is an animation rather than a
//! snapshot, every mutation is expressed in terms of cell lifespans:
//! writes close the previous lifespan and open a new one, erases close
//! without replacement.
//!
//! The machine runs indefinitely across the whole byte stream; lexer
//! state, partially accumulated parameters and incomplete UTF-8
//! sequences all persist between `process_chunk` calls.

use tracing::{debug, warn};
use unicode_width::UnicodeWidthChar;

use super::charset;
use super::state::TerminalState;
use super::types::{CellStyle, Color, Row, ScreenSwitch, ScrollEvent};

/// The 16 standard ANSI colors, keyed by foreground SGR code.
pub const ANSI_16_COLORS: [(u8, &str); 16] = [
    (30, "#2e3436"),
    (31, "#cc0000"),
    (32, "#4e9a06"),
    (33, "#c4a000"),
    (34, "#3465a4"),
    (35, "#75507b"),
    (36, "#06989a"),
    (37, "#d3d7cf"),
    (90, "#555753"),
    (91, "#ef2929"),
    (92, "#8ae234"),
    (93, "#fce94f"),
    (94, "#729fcf"),
    (95, "#ad7fa8"),
    (96, "#34e2e2"),
    (97, "#eeeeec"),
];

/// Hex value for a 16-color foreground SGR code, if it is one.
pub fn ansi_16_color(code: u8) -> Option<&'static str> {
    ANSI_16_COLORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, hex)| *hex)
}

/// Recognized-but-deliberately-unimplemented CSI finals (DSR, window ops).
const WONT_IMPLEMENT_CSI: &[char] = &['n', 't'];

/// Recognized-but-deliberately-unimplemented DEC private modes (mouse
/// tracking, bracketed paste, cursor blink, focus reporting).
const WONT_IMPLEMENT_DEC: &[&str] = &[
    "1h", "1l", "12h", "12l", "1000h", "1000l", "1002h", "1002l", "1003h", "1003l", "1004h",
    "1004l", "1005h", "1005l", "1006h", "1006l", "2004h", "2004l",
];

/// OSC commands we recognize but do not apply (titles, notifications,
/// clipboard). These are logged; anything else is ignored silently.
const WONT_IMPLEMENT_OSC: &[u32] = &[0, 1, 2, 9, 52, 777];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    CsiParam,
    OscString,
    CharsetSelect,
}

/// The escape-sequence state machine.
///
/// Constructed once per conversion; exclusively owns and mutates its
/// `TerminalState` for the duration of the pass.
#[derive(Debug)]
pub struct AnsiParser {
    pub state: TerminalState,
    parse_state: ParseState,
    params: String,
    dec_private: bool,
    osc_buffer: String,
    /// Set after an ESC inside an OSC string; the next byte decides
    /// whether it was an ST terminator.
    osc_escape_pending: bool,
    /// Trailing bytes of a UTF-8 sequence split across chunk boundaries.
    pending_utf8: Vec<u8>,
    /// DEC Special Graphics set designated via `ESC ( 0`.
    graphics_charset: bool,
    current_time: f64,
}

impl AnsiParser {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            state: TerminalState::new(cols, rows),
            parse_state: ParseState::Ground,
            params: String::new(),
            dec_private: false,
            osc_buffer: String::new(),
            osc_escape_pending: false,
            pending_utf8: Vec::new(),
            graphics_charset: false,
            current_time: 0.0,
        }
    }

    /// Consume the parser, yielding the finished state for rendering.
    pub fn into_state(self) -> TerminalState {
        self.state
    }

    /// Processes one timestamped chunk of terminal output.
    ///
    /// Callable repeatedly with non-decreasing `time`; lexer state and
    /// incomplete sequences carry over between calls. Invalid UTF-8
    /// units are dropped, an incomplete trailing sequence is buffered
    /// until the next chunk.
    pub fn process_chunk(&mut self, bytes: &[u8], time: f64) {
        self.current_time = time;

        let carried = std::mem::take(&mut self.pending_utf8);
        let owned: Vec<u8>;
        let mut rest: &[u8] = if carried.is_empty() {
            bytes
        } else {
            owned = [carried.as_slice(), bytes].concat();
            &owned
        };

        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    for ch in text.chars() {
                        self.step(ch);
                    }
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        for ch in text.chars() {
                            self.step(ch);
                        }
                    }
                    match err.error_len() {
                        Some(len) => {
                            debug!(bytes = len, "dropping invalid UTF-8");
                            rest = &tail[len..];
                        }
                        None => {
                            // Sequence split across chunks.
                            self.pending_utf8 = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn step(&mut self, ch: char) {
        match self.parse_state {
            ParseState::Ground => {
                if ch == '\x1b' {
                    self.parse_state = ParseState::Escape;
                } else {
                    self.handle_character(ch);
                }
            }
            ParseState::Escape => self.step_escape(ch),
            ParseState::CharsetSelect => {
                self.graphics_charset = ch == '0';
                self.parse_state = ParseState::Ground;
            }
            ParseState::OscString => self.step_osc(ch),
            ParseState::CsiParam => self.step_csi_param(ch),
        }
    }

    fn step_escape(&mut self, ch: char) {
        match ch {
            '[' => {
                self.params.clear();
                self.dec_private = false;
                self.parse_state = ParseState::CsiParam;
            }
            ']' => {
                self.osc_buffer.clear();
                self.osc_escape_pending = false;
                self.parse_state = ParseState::OscString;
            }
            '(' => {
                self.parse_state = ParseState::CharsetSelect;
            }
            'D' => {
                // Index: cursor down, scrolling at the bottom margin.
                self.move_cursor_down_and_scroll();
                self.state.record_cursor_state(self.current_time);
                self.parse_state = ParseState::Ground;
            }
            'M' => {
                // Reverse index: cursor up, scrolling the region down
                // when already at the top margin.
                if self.state.cursor_y == self.state.scroll_top {
                    self.scroll_down(1);
                } else {
                    self.state.cursor_y = self.state.cursor_y.saturating_sub(1);
                }
                self.state.record_cursor_state(self.current_time);
                self.parse_state = ParseState::Ground;
            }
            'E' => {
                // Next line: carriage return + index.
                self.state.cursor_x = 0;
                self.move_cursor_down_and_scroll();
                self.state.record_cursor_state(self.current_time);
                self.parse_state = ParseState::Ground;
            }
            '7' => {
                self.state.saved_cursor_x = self.state.cursor_x;
                self.state.saved_cursor_y = self.state.cursor_y;
                self.state.saved_style = self.state.current_style.clone();
                self.parse_state = ParseState::Ground;
            }
            '8' => {
                self.state.cursor_x = self.state.saved_cursor_x;
                self.state.cursor_y = self.state.saved_cursor_y;
                self.state.current_style = self.state.saved_style.clone();
                self.state.record_cursor_state(self.current_time);
                self.parse_state = ParseState::Ground;
            }
            other => {
                warn!("unsupported escape sequence: ESC {other}");
                self.parse_state = ParseState::Ground;
            }
        }
    }

    fn step_osc(&mut self, ch: char) {
        if self.osc_escape_pending {
            self.osc_escape_pending = false;
            if ch == '\\' {
                let sequence = std::mem::take(&mut self.osc_buffer);
                self.handle_osc_command(&sequence);
                self.parse_state = ParseState::Ground;
                return;
            }
            // The ESC was part of the payload after all.
            self.osc_buffer.push('\x1b');
        }
        if ch == '\x07' {
            let sequence = std::mem::take(&mut self.osc_buffer);
            self.handle_osc_command(&sequence);
            self.parse_state = ParseState::Ground;
        } else if ch == '\x1b' {
            self.osc_escape_pending = true;
        } else {
            self.osc_buffer.push(ch);
        }
    }

    fn step_csi_param(&mut self, ch: char) {
        if self.params.is_empty() && ch == '?' {
            self.dec_private = true;
            return;
        }

        if ch.is_ascii_digit() || ch == ';' {
            self.params.push(ch);
        } else {
            let params = std::mem::take(&mut self.params);
            if self.dec_private {
                self.handle_dec_private_mode(&format!("{params}{ch}"));
            } else {
                let values: Vec<i64> = if params.is_empty() {
                    Vec::new()
                } else {
                    params
                        .split(';')
                        .map(|part| part.parse().unwrap_or(0))
                        .collect()
                };
                self.handle_csi_command(ch, &values);
            }
            self.parse_state = ParseState::Ground;
        }
    }

    /// Non-escape byte handling in the ground state.
    fn handle_character(&mut self, ch: char) {
        let cols = self.state.cols;
        match ch {
            '\r' => self.state.cursor_x = 0,
            '\n' | '\x0b' | '\x0c' => self.move_cursor_down_and_scroll(),
            '\x08' | '\x7f' => self.state.cursor_x = self.state.cursor_x.saturating_sub(1),
            '\t' => {
                self.state.cursor_x = ((self.state.cursor_x / 8 + 1) * 8).min(cols - 1);
            }
            _ => {
                // Zero-width and control units never occupy a cell.
                if !ch.is_control() && UnicodeWidthChar::width(ch).unwrap_or(0) > 0 {
                    if self.state.cursor_x >= cols {
                        if self.state.auto_wrap {
                            self.state.cursor_x = 0;
                            self.move_cursor_down_and_scroll();
                        } else {
                            self.state.cursor_x = cols - 1;
                        }
                    }

                    let glyph = if self.graphics_charset {
                        charset::translate(ch)
                    } else {
                        ch
                    };
                    let style = self.state.current_style.clone();
                    self.write_char_at(self.state.cursor_x, self.state.cursor_y, glyph, style);

                    if self.state.auto_wrap {
                        self.state.cursor_x += 1;
                    } else if self.state.cursor_x < cols - 1 {
                        self.state.cursor_x += 1;
                    }
                }
            }
        }
        self.state.record_cursor_state(self.current_time);
    }

    /// Cursor down one view row, scrolling when at the bottom margin.
    /// A full-screen region at the bottom of the terminal stream-scrolls
    /// (offset bookkeeping); a restricted region shifts its contents.
    fn move_cursor_down_and_scroll(&mut self) {
        if self.state.cursor_y == self.state.scroll_bottom {
            if self.state.scroll_bottom == self.state.rows - 1 && self.state.scroll_top == 0 {
                self.stream_scroll(1);
            } else {
                self.scroll_up(1);
            }
        } else {
            self.state.cursor_y += 1;
        }
    }

    /// Write a glyph at a view position in the active buffer, translating
    /// through the screen's scroll offset to an absolute row.
    fn write_char_at(&mut self, x: usize, y: usize, glyph: char, style: CellStyle) {
        let offset = self.state.active_scroll_offset();
        let time = self.current_time;
        self.state.active_buffer_mut().write(y + offset, x, glyph, style, time);
    }

    fn handle_osc_command(&mut self, sequence: &str) {
        let mut parts = sequence.split(';');
        let command: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        if command == 8 {
            let uri = parts.last().unwrap_or("");
            self.state.current_style.link = if uri.is_empty() {
                None
            } else {
                Some(uri.to_string())
            };
        } else if WONT_IMPLEMENT_OSC.contains(&command) {
            warn!("unsupported OSC command: {command}");
        }
    }

    fn handle_csi_command(&mut self, command: char, params: &[i64]) {
        let p = |index: usize, default: i64| params.get(index).copied().unwrap_or(default);
        let cols = self.state.cols;
        let rows = self.state.rows;
        let mut moved = false;

        match command {
            'm' => self.set_graphics_mode(params),
            'H' | 'f' => {
                self.state.cursor_y = (p(0, 1) - 1).max(0) as usize;
                self.state.cursor_x = (p(1, 1) - 1).max(0) as usize;
                moved = true;
            }
            'A' => {
                self.state.cursor_y = self.state.cursor_y.saturating_sub(p(0, 1).max(0) as usize);
                moved = true;
            }
            'B' => {
                self.state.cursor_y =
                    (self.state.cursor_y + p(0, 1).max(0) as usize).min(rows - 1);
                moved = true;
            }
            'C' => {
                self.state.cursor_x =
                    (self.state.cursor_x + p(0, 1).max(0) as usize).min(cols - 1);
                moved = true;
            }
            'D' => {
                self.state.cursor_x = self.state.cursor_x.saturating_sub(p(0, 1).max(0) as usize);
                moved = true;
            }
            'G' => {
                self.state.cursor_x = (p(0, 1) - 1).max(0) as usize;
                moved = true;
            }
            'd' => {
                self.state.cursor_y = (p(0, 1) - 1).max(0) as usize;
                moved = true;
            }
            'J' => self.erase_in_display(p(0, 0)),
            'K' => self.erase_in_line(p(0, 0)),
            'X' => self.erase_characters(p(0, 1)),
            '@' => self.insert_characters(p(0, 1)),
            'P' => self.delete_characters(p(0, 1)),
            'r' => self.set_scroll_region(params),
            'L' => self.insert_lines(p(0, 1).max(0) as usize),
            'M' => self.delete_lines(p(0, 1).max(0) as usize),
            'S' => self.scroll_up(p(0, 1).max(0) as usize),
            'T' => self.scroll_down(p(0, 1).max(0) as usize),
            's' => {
                self.state.saved_cursor_x = self.state.cursor_x;
                self.state.saved_cursor_y = self.state.cursor_y;
            }
            'u' => {
                self.state.cursor_x = self.state.saved_cursor_x;
                self.state.cursor_y = self.state.saved_cursor_y;
                moved = true;
            }
            other => {
                if !WONT_IMPLEMENT_CSI.contains(&other) {
                    warn!(
                        "unsupported CSI command: '{}{}'",
                        params
                            .iter()
                            .map(|v| v.to_string())
                            .collect::<Vec<_>>()
                            .join(";"),
                        other
                    );
                }
            }
        }

        if moved {
            self.state.record_cursor_state(self.current_time);
        }
    }

    fn handle_dec_private_mode(&mut self, command: &str) {
        match command {
            "1049h" => {
                self.state.saved_cursor_x = self.state.cursor_x;
                self.state.saved_cursor_y = self.state.cursor_y;

                self.state.alt_screen_active = true;
                self.state.screen_switch_events.push(ScreenSwitch {
                    time: self.current_time,
                    to_alt: true,
                });

                self.state.cursor_x = 0;
                self.state.cursor_y = 0;
                self.state.record_cursor_state(self.current_time);
                self.set_scroll_region(&[]);
            }
            "1049l" => {
                self.state.alt_screen_active = false;
                self.state.screen_switch_events.push(ScreenSwitch {
                    time: self.current_time,
                    to_alt: false,
                });

                self.set_scroll_region(&[]);

                self.state.cursor_x = self.state.saved_cursor_x;
                self.state.cursor_y = self.state.saved_cursor_y;
                self.state.record_cursor_state(self.current_time);
            }
            "25l" => self.state.set_cursor_visibility(false, self.current_time),
            "25h" => self.state.set_cursor_visibility(true, self.current_time),
            "7h" => self.state.auto_wrap = true,
            "7l" => self.state.auto_wrap = false,
            other => {
                if !WONT_IMPLEMENT_DEC.contains(&other) {
                    warn!("unsupported DEC private mode command: ?{other}");
                }
            }
        }
    }

    fn set_graphics_mode(&mut self, params: &[i64]) {
        let params: &[i64] = if params.is_empty() { &[0] } else { params };

        let mut i = 0;
        while i < params.len() {
            let p = params[i];
            let mut handled = true;

            match p {
                0 => self.state.reset_style(),
                1 => self.state.current_style.bold = true,
                2 => self.state.current_style.dim = true,
                3 => self.state.current_style.italic = true,
                4 => self.state.current_style.underline = true,
                5 => self.state.current_style.blink = true,
                7 => self.state.current_style.inverse = true,
                8 => self.state.current_style.invisible = true,
                9 => self.state.current_style.strikethrough = true,
                22 => {
                    self.state.current_style.bold = false;
                    self.state.current_style.dim = false;
                }
                23 => self.state.current_style.italic = false,
                24 => self.state.current_style.underline = false,
                25 => self.state.current_style.blink = false,
                27 => self.state.current_style.inverse = false,
                28 => self.state.current_style.invisible = false,
                29 => self.state.current_style.strikethrough = false,
                30..=37 | 90..=97 => self.state.current_style.fg = Color::Ansi(p as u8),
                40..=47 | 100..=107 => self.state.current_style.bg = Color::Ansi(p as u8),
                39 => self.state.current_style.fg = Color::Default,
                49 => self.state.current_style.bg = Color::Default,
                38 | 48 => {
                    let color = match params.get(i + 1) {
                        Some(&5) => {
                            // 256-color palette: consumes two parameters.
                            params.get(i + 2).map(|&code| {
                                i += 2;
                                map_ansi256(code)
                            })
                        }
                        Some(&2) => {
                            // Truecolor: consumes four parameters.
                            if i + 4 < params.len() {
                                let (r, g, b) = (params[i + 2], params[i + 3], params[i + 4]);
                                i += 4;
                                Some(Color::Hex(format!(
                                    "#{:02x}{:02x}{:02x}",
                                    r.clamp(0, 255),
                                    g.clamp(0, 255),
                                    b.clamp(0, 255)
                                )))
                            } else {
                                None
                            }
                        }
                        _ => None,
                    };
                    match color {
                        Some(color) if p == 38 => self.state.current_style.fg = color,
                        Some(color) => self.state.current_style.bg = color,
                        None => handled = false,
                    }
                }
                _ => handled = false,
            }

            if !handled {
                warn!("unsupported SGR parameter: {p}");
            }
            i += 1;
        }
    }

    fn erase_in_display(&mut self, mode: i64) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let (top, bottom) = (self.state.scroll_top, self.state.scroll_bottom);
        let cursor_y = self.state.cursor_y;

        match mode {
            0 => {
                // Cursor to end of screen.
                self.erase_in_line(0);
                let buffer = self.state.active_buffer_mut();
                for y in (cursor_y + 1)..=bottom {
                    buffer.close_line(y + offset, 0, None, cols, time);
                }
            }
            1 => {
                // Start of screen to cursor.
                let buffer = self.state.active_buffer_mut();
                for y in top..cursor_y {
                    buffer.close_line(y + offset, 0, None, cols, time);
                }
                self.erase_in_line(1);
            }
            2 | 3 => {
                let buffer = self.state.active_buffer_mut();
                for y in top..=bottom {
                    buffer.close_line(y + offset, 0, None, cols, time);
                }
            }
            _ => {}
        }
    }

    fn erase_in_line(&mut self, mode: i64) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let y = self.state.cursor_y + offset;
        let cursor_x = self.state.cursor_x;

        let (start_x, count) = match mode {
            0 => (cursor_x, cols - cursor_x),
            1 => (0, cursor_x + 1),
            _ => (0, cols),
        };
        self.state
            .active_buffer_mut()
            .close_line(y, start_x, Some(count), cols, time);
    }

    fn erase_characters(&mut self, n: i64) {
        let n = n.max(1) as usize;
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let y = self.state.cursor_y + offset;
        let x = self.state.cursor_x;
        self.state
            .active_buffer_mut()
            .close_line(y, x, Some(n), cols, time);
    }

    /// Delete N characters at the cursor, shifting the remainder of the
    /// line left. Processes left-to-right: each destination is closed
    /// before its source (`x + n`) has been visited, so the shift reads
    /// ahead of every write.
    fn delete_characters(&mut self, n: i64) {
        let n = n.max(1) as usize;
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let y = self.state.cursor_y + offset;
        let x_start = self.state.cursor_x;

        if self.state.active_buffer().row(y).is_none() {
            return;
        }

        for x in x_start..cols {
            let x_source = x + n;
            let buffer = self.state.active_buffer_mut();
            buffer.close_open(y, x, time);
            if x_source < cols {
                if let Some(cell) = buffer.last_cell(y, x_source).cloned() {
                    if cell.live_at(time) {
                        buffer.write(y, x, cell.char, cell.style, time);
                    }
                }
            }
        }
    }

    /// Insert N blanks at the cursor, shifting the rest of the line
    /// right. Processes right-to-left so a source cell is always read
    /// before the shift overwrites it; characters pushed past the right
    /// edge are discarded.
    fn insert_characters(&mut self, n: i64) {
        let n = n.max(1) as usize;
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let y = self.state.cursor_y + offset;
        let x_start = self.state.cursor_x;

        if self.state.active_buffer().row(y).is_none() {
            return;
        }

        for x in ((x_start + n)..cols).rev() {
            let x_source = x - n;
            let buffer = self.state.active_buffer_mut();
            let source = buffer.last_cell(y, x_source).cloned();
            buffer.close_open(y, x, time);
            if let Some(cell) = source {
                if cell.live_at(time) {
                    buffer.write(y, x, cell.char, cell.style, time);
                }
            }
        }

        // Clear the opened gap.
        self.state
            .active_buffer_mut()
            .close_line(y, x_start, Some(n), cols, time);
    }

    /// Set the scroll region from 1-indexed inclusive bounds. Invalid
    /// bounds reset to the full screen; the cursor always homes.
    fn set_scroll_region(&mut self, params: &[i64]) {
        let top = params
            .first()
            .copied()
            .filter(|&v| v > 0)
            .map_or(0, |v| (v - 1) as usize);
        let bottom = params
            .get(1)
            .copied()
            .filter(|&v| v > 0)
            .map_or(self.state.rows - 1, |v| (v - 1) as usize);

        if top < bottom {
            self.state.scroll_top = top;
            self.state.scroll_bottom = bottom;
        } else {
            self.state.scroll_top = 0;
            self.state.scroll_bottom = self.state.rows - 1;
        }
        self.state.cursor_x = 0;
        self.state.cursor_y = 0;
        self.state.record_cursor_state(self.current_time);
    }

    /// Insert N blank lines at the cursor within the scroll region,
    /// shifting lines below it down. No-op when the cursor is outside
    /// the region.
    fn insert_lines(&mut self, n: usize) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let (top, bottom) = (self.state.scroll_top, self.state.scroll_bottom);
        let cursor_y = self.state.cursor_y;

        if cursor_y < top || cursor_y > bottom {
            return;
        }

        // Lines pushed out of the region end their lifespans.
        for i in 0..n {
            let Some(y_to_kill) = bottom.checked_sub(i) else {
                break;
            };
            if y_to_kill >= cursor_y {
                self.state
                    .active_buffer_mut()
                    .close_line(y_to_kill + offset, 0, None, cols, time);
            }
        }

        // Shift surviving lines down, bottom-up. Each source row is
        // read exactly once before its slot is overwritten or cleared.
        for y in ((cursor_y + n)..=bottom).rev() {
            let buffer = self.state.active_buffer_mut();
            let source = buffer.take_row(y - n + offset);
            buffer.put_row(y + offset, source);
        }

        for y in cursor_y..(cursor_y + n).min(bottom + 1) {
            self.state.active_buffer_mut().put_row(y + offset, Row::new());
        }
    }

    /// Delete N lines at the cursor within the scroll region, shifting
    /// lines below it up and opening blanks at the region's bottom.
    fn delete_lines(&mut self, n: usize) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let (top, bottom) = (self.state.scroll_top, self.state.scroll_bottom);
        let cursor_y = self.state.cursor_y;

        if cursor_y < top || cursor_y > bottom {
            return;
        }

        for i in 0..n {
            self.state
                .active_buffer_mut()
                .close_line(cursor_y + i + offset, 0, None, cols, time);
        }

        for y in cursor_y..=bottom {
            if y + n > bottom {
                break;
            }
            let buffer = self.state.active_buffer_mut();
            let source = buffer.take_row(y + n + offset);
            buffer.put_row(y + offset, source);
        }

        for y in (bottom + 1).saturating_sub(n)..=bottom {
            if y >= cursor_y {
                self.state.active_buffer_mut().put_row(y + offset, Row::new());
            }
        }
    }

    /// Scroll the region up by N lines.
    ///
    /// Each iteration snapshots every row of the region before touching
    /// it: shifting row k+1 into row k while closing lifespans at row k
    /// in the same pass would read rows already mutated. After the
    /// snapshot the whole region is closed at the current time, then
    /// surviving characters are rewritten one row up as new lifespans.
    fn scroll_up(&mut self, n: usize) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let (top, bottom) = (self.state.scroll_top, self.state.scroll_bottom);

        for _ in 0..n {
            let snapshot: Vec<Row> = (top..=bottom)
                .map(|y| self.state.active_buffer().snapshot_row(y + offset))
                .collect();

            let buffer = self.state.active_buffer_mut();
            for y in top..=bottom {
                buffer.close_line(y + offset, 0, None, cols, time);
            }

            for y in top..bottom {
                let source_row = &snapshot[y + 1 - top];
                for (&x, lifespans) in source_row {
                    if let Some(cell) = lifespans.last() {
                        if cell.live_at(time) {
                            buffer.write(y + offset, x, cell.char, cell.style.clone(), time);
                        }
                    }
                }
            }
        }
    }

    /// Scroll the region down by N lines. Only the region's bottom line
    /// needs erasure up front; the top-down shift never re-reads a row
    /// after writing it.
    fn scroll_down(&mut self, n: usize) {
        let offset = self.state.active_scroll_offset();
        let (cols, time) = (self.state.cols, self.current_time);
        let (top, bottom) = (self.state.scroll_top, self.state.scroll_bottom);

        for _ in 0..n {
            let buffer = self.state.active_buffer_mut();
            buffer.close_line(bottom + offset, 0, None, cols, time);

            for y in ((top + 1)..=bottom).rev() {
                let source = buffer.take_row(y - 1 + offset);
                buffer.put_row(y + offset, source);
            }

            buffer.put_row(top + offset, Row::new());
        }
    }

    /// Whole-screen scroll via offset bookkeeping: closes the lifespans
    /// of the row leaving the viewport, records a scroll keyframe and
    /// bumps the offset. No cell data moves; the renderer translates
    /// coordinates instead, keeping scrolled-off history queryable.
    fn stream_scroll(&mut self, n: usize) {
        let (cols, time) = (self.state.cols, self.current_time);
        let screen = self.state.active_screen_mut();

        for _ in 0..n {
            let offset = screen.scroll_offset;
            screen.buffer.close_line(offset, 0, None, cols, time);
            screen.scroll_events.push(ScrollEvent { time, offset });
            screen.scroll_offset += 1;
        }
    }
}

/// Map a 256-color palette index to a color. Indexes 0-15 resolve
/// through the standard 16-color table; 16-231 through the 6x6x6 cube;
/// 232-255 through the grayscale ramp.
fn map_ansi256(code: i64) -> Color {
    match code {
        0..=7 => ansi_16_color(code as u8 + 30)
            .map(|hex| Color::Hex(hex.to_string()))
            .unwrap_or(Color::Default),
        8..=15 => ansi_16_color(code as u8 - 8 + 90)
            .map(|hex| Color::Hex(hex.to_string()))
            .unwrap_or(Color::Default),
        16..=231 => {
            let code = code - 16;
            let levels = [0u8, 95, 135, 175, 215, 255];
            let r = levels[(code / 36) as usize];
            let g = levels[((code % 36) / 6) as usize];
            let b = levels[(code % 6) as usize];
            Color::Hex(format!("#{r:02x}{g:02x}{b:02x}"))
        }
        232..=255 => {
            let level = ((code - 232) * 10 + 8) as u8;
            Color::Hex(format!("#{level:02x}{level:02x}{level:02x}"))
        }
        _ => Color::Default,
    }
}
