//! SGR attribute handling and charset translation.

use super::{active_char, feed, parser};
use crate::terminal::Color;

fn style_at(p: &super::AnsiParser, x: usize) -> crate::terminal::CellStyle {
    p.state
        .active_buffer()
        .last_cell(0, x)
        .map(|cell| cell.style.clone())
        .unwrap_or_default()
}

#[test]
fn bold_and_basic_colors() {
    let mut p = parser();
    feed(&mut p, "\x1b[1;31mA", 0.1);
    let style = style_at(&p, 0);
    assert!(style.bold);
    assert_eq!(style.fg, Color::Ansi(31));
    assert_eq!(style.bg, Color::Default);
}

#[test]
fn sgr_reset_restores_defaults() {
    let mut p = parser();
    feed(&mut p, "\x1b[1;4;33;44mA\x1b[0mB", 0.1);
    let styled = style_at(&p, 0);
    assert!(styled.bold && styled.underline);
    assert_eq!(styled.bg, Color::Ansi(44));

    let reset = style_at(&p, 1);
    assert_eq!(reset, Default::default());
}

#[test]
fn empty_sgr_means_reset() {
    let mut p = parser();
    feed(&mut p, "\x1b[7mA\x1b[mB", 0.1);
    assert!(style_at(&p, 0).inverse);
    assert!(!style_at(&p, 1).inverse);
}

#[test]
fn attribute_pairs_toggle_off() {
    let mut p = parser();
    feed(&mut p, "\x1b[1;2;3;4;5;7;8;9m", 0.1);
    feed(&mut p, "\x1b[22;23;24;25;27;28;29mA", 0.2);
    assert_eq!(style_at(&p, 0), Default::default());
}

#[test]
fn bright_colors_use_high_codes() {
    let mut p = parser();
    feed(&mut p, "\x1b[95;102mA", 0.1);
    let style = style_at(&p, 0);
    assert_eq!(style.fg, Color::Ansi(95));
    assert_eq!(style.bg, Color::Ansi(102));
}

#[test]
fn default_color_codes_reset_channels() {
    let mut p = parser();
    feed(&mut p, "\x1b[31;41m\x1b[39mA\x1b[49mB", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Default);
    assert_eq!(style_at(&p, 0).bg, Color::Ansi(41));
    assert_eq!(style_at(&p, 1).bg, Color::Default);
}

#[test]
fn palette_256_low_codes_map_to_ansi_16() {
    let mut p = parser();
    feed(&mut p, "\x1b[38;5;1mA\x1b[38;5;9mB", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Hex("#cc0000".to_string()));
    assert_eq!(style_at(&p, 1).fg, Color::Hex("#ef2929".to_string()));
}

#[test]
fn palette_256_color_cube() {
    let mut p = parser();
    // 196 is the cube's pure red corner.
    feed(&mut p, "\x1b[38;5;196mA\x1b[48;5;21mB", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Hex("#ff0000".to_string()));
    assert_eq!(style_at(&p, 1).bg, Color::Hex("#0000ff".to_string()));
}

#[test]
fn palette_256_grayscale_ramp() {
    let mut p = parser();
    feed(&mut p, "\x1b[38;5;232mA\x1b[38;5;255mB", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Hex("#080808".to_string()));
    assert_eq!(style_at(&p, 1).fg, Color::Hex("#eeeeee".to_string()));
}

#[test]
fn truecolor_sequences() {
    let mut p = parser();
    feed(&mut p, "\x1b[38;2;10;20;30mA\x1b[48;2;255;0;128mB", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Hex("#0a141e".to_string()));
    assert_eq!(style_at(&p, 1).bg, Color::Hex("#ff0080".to_string()));
}

#[test]
fn truncated_extended_color_is_ignored() {
    let mut p = parser();
    feed(&mut p, "\x1b[38;2;10mA", 0.1);
    assert_eq!(style_at(&p, 0).fg, Color::Default);
}

#[test]
fn blink_set_and_cleared() {
    let mut p = parser();
    feed(&mut p, "\x1b[5mA\x1b[25mB", 0.1);
    assert!(style_at(&p, 0).blink);
    assert!(!style_at(&p, 1).blink);
}

#[test]
fn dec_special_graphics_translates_line_drawing() {
    let mut p = parser();
    feed(&mut p, "\x1b(0lqk\x1b(Blqk", 0.1);
    assert_eq!(active_char(&p, 0, 0, 0.2), Some('┌'));
    assert_eq!(active_char(&p, 0, 1, 0.2), Some('─'));
    assert_eq!(active_char(&p, 0, 2, 0.2), Some('┐'));
    // Back in ASCII the same bytes are literal.
    assert_eq!(active_char(&p, 0, 3, 0.2), Some('l'));
    assert_eq!(active_char(&p, 0, 4, 0.2), Some('q'));
    assert_eq!(active_char(&p, 0, 5, 0.2), Some('k'));
}
