//! Parser behavior tests, organized by concern.

mod commands;
mod graphics;

use super::AnsiParser;

fn parser() -> AnsiParser {
    AnsiParser::new(80, 24)
}

fn feed(parser: &mut AnsiParser, text: &str, time: f64) {
    parser.process_chunk(text.as_bytes(), time);
}

/// The characters visible on a view row at `time`, with unset cells as
/// spaces and trailing blanks trimmed.
fn visible_line(parser: &AnsiParser, y: usize, time: f64) -> String {
    let offset = parser.state.active_scroll_offset();
    let buffer = parser.state.active_buffer();
    let mut line = String::new();
    for x in 0..parser.state.cols {
        match buffer.active_cell(y + offset, x, time) {
            Some(cell) => line.push(cell.char),
            None => line.push(' '),
        }
    }
    line.trim_end().to_string()
}

/// The character visible at a view position at `time`, if any.
fn active_char(parser: &AnsiParser, y: usize, x: usize, time: f64) -> Option<char> {
    let offset = parser.state.active_scroll_offset();
    parser
        .state
        .active_buffer()
        .active_cell(y + offset, x, time)
        .map(|cell| cell.char)
}
