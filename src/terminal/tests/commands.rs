//! Cursor movement, erasure, editing and mode commands.

use super::{active_char, feed, parser, visible_line};
use crate::terminal::{AnsiParser, CursorEvent};

#[test]
fn zero_dimensions_behave_as_a_single_cell() {
    let mut p = AnsiParser::new(0, 0);
    feed(&mut p, "a\tb\r\n", 0.1);
    assert_eq!((p.state.cols, p.state.rows), (1, 1));
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (0, 0));
    // The line feed in the one-row grid stream-scrolls.
    assert_eq!(p.state.active_scroll_offset(), 1);
    assert_eq!(active_char(&p, 0, 0, 0.2), None);
}

#[test]
fn cursor_position_is_one_indexed() {
    let mut p = parser();
    feed(&mut p, "\x1b[5;10H", 0.1);
    assert_eq!(p.state.cursor_y, 4);
    assert_eq!(p.state.cursor_x, 9);

    // Missing parameters default to 1.
    feed(&mut p, "\x1b[H", 0.2);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (0, 0));
}

#[test]
fn relative_cursor_moves_clamp_to_screen() {
    let mut p = parser();
    feed(&mut p, "\x1b[5;10H", 0.1);
    feed(&mut p, "\x1b[2A", 0.2);
    assert_eq!(p.state.cursor_y, 2);
    feed(&mut p, "\x1b[99B", 0.3);
    assert_eq!(p.state.cursor_y, 23);
    feed(&mut p, "\x1b[99C", 0.4);
    assert_eq!(p.state.cursor_x, 79);
    feed(&mut p, "\x1b[200D", 0.5);
    assert_eq!(p.state.cursor_x, 0);
    feed(&mut p, "\x1b[3A\x1b[3A\x1b[99A", 0.6);
    assert_eq!(p.state.cursor_y, 0);
}

#[test]
fn absolute_column_and_row_moves() {
    let mut p = parser();
    feed(&mut p, "\x1b[12G", 0.1);
    assert_eq!(p.state.cursor_x, 11);
    feed(&mut p, "\x1b[7d", 0.2);
    assert_eq!(p.state.cursor_y, 6);
}

#[test]
fn carriage_return_and_line_feed() {
    let mut p = parser();
    feed(&mut p, "abc\r\n", 0.1);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (0, 1));
    assert_eq!(visible_line(&p, 0, 0.2), "abc");
}

#[test]
fn backspace_stops_at_left_edge() {
    let mut p = parser();
    feed(&mut p, "ab\x08\x08\x08", 0.1);
    assert_eq!(p.state.cursor_x, 0);
}

#[test]
fn tab_advances_to_next_stop_and_clamps() {
    let mut p = parser();
    feed(&mut p, "abc\t", 0.1);
    assert_eq!(p.state.cursor_x, 8);
    feed(&mut p, "\t", 0.2);
    assert_eq!(p.state.cursor_x, 16);

    feed(&mut p, "\x1b[1;79H\t", 0.3);
    assert_eq!(p.state.cursor_x, 79);
}

#[test]
fn erase_in_line_from_cursor() {
    let mut p = parser();
    feed(&mut p, "hello world", 0.1);
    feed(&mut p, "\x1b[1;6H\x1b[K", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "hello");
}

#[test]
fn erase_in_line_to_cursor_is_inclusive() {
    let mut p = parser();
    feed(&mut p, "hello world", 0.1);
    feed(&mut p, "\x1b[1;6H\x1b[1K", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "      world");
}

#[test]
fn erase_entire_line() {
    let mut p = parser();
    feed(&mut p, "hello world", 0.1);
    feed(&mut p, "\x1b[2K", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "");
}

#[test]
fn erase_display_from_cursor() {
    let mut p = parser();
    feed(&mut p, "one\r\ntwo\r\nthree", 0.1);
    feed(&mut p, "\x1b[2;2H\x1b[J", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "one");
    assert_eq!(visible_line(&p, 1, 0.3), "t");
    assert_eq!(visible_line(&p, 2, 0.3), "");
}

#[test]
fn erase_entire_display() {
    let mut p = parser();
    feed(&mut p, "one\r\ntwo\r\nthree", 0.1);
    feed(&mut p, "\x1b[2J", 0.2);
    for y in 0..3 {
        assert_eq!(visible_line(&p, y, 0.3), "");
    }
    // History survives the erase.
    assert_eq!(active_char(&p, 0, 0, 0.15), Some('o'));
}

#[test]
fn erase_characters_leaves_the_rest() {
    let mut p = parser();
    feed(&mut p, "abcdef", 0.1);
    feed(&mut p, "\x1b[1;3H\x1b[2X", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "ab  ef");
    assert_eq!(p.state.cursor_x, 2);
}

#[test]
fn delete_characters_shifts_line_left() {
    let mut p = parser();
    feed(&mut p, "abcdef", 0.1);
    feed(&mut p, "\x1b[1;3H\x1b[2P", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "abef");
}

#[test]
fn insert_characters_shifts_line_right() {
    let mut p = parser();
    feed(&mut p, "abcdef", 0.1);
    feed(&mut p, "\x1b[1;3H\x1b[2@", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "ab  cdef");
}

#[test]
fn insert_characters_discards_past_right_edge() {
    let mut p = parser();
    feed(&mut p, "\x1b[1;79Hxy", 0.1);
    feed(&mut p, "\x1b[1;79H\x1b[1@", 0.2);
    assert_eq!(active_char(&p, 0, 79, 0.3), Some('x'));
    assert_eq!(active_char(&p, 0, 78, 0.3), None);
}

#[test]
fn save_and_restore_cursor_csi() {
    let mut p = parser();
    feed(&mut p, "\x1b[5;10H\x1b[s\x1b[H", 0.1);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (0, 0));
    feed(&mut p, "\x1b[u", 0.2);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (9, 4));
}

#[test]
fn save_and_restore_cursor_dec_includes_style() {
    let mut p = parser();
    feed(&mut p, "\x1b[1m\x1b[3;4H\x1b7", 0.1);
    feed(&mut p, "\x1b[0m\x1b[H", 0.2);
    assert!(!p.state.current_style.bold);

    feed(&mut p, "\x1b8", 0.3);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (3, 2));
    assert!(p.state.current_style.bold);
}

#[test]
fn alternate_screen_switching_preserves_main() {
    let mut p = parser();
    feed(&mut p, "main text", 0.1);
    feed(&mut p, "\x1b[?1049h", 0.2);
    assert!(p.state.alt_screen_active);
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (0, 0));
    assert_eq!(visible_line(&p, 0, 0.3), "");

    feed(&mut p, "alt text", 0.3);
    assert_eq!(visible_line(&p, 0, 0.4), "alt text");

    feed(&mut p, "\x1b[?1049l", 0.5);
    assert!(!p.state.alt_screen_active);
    assert_eq!(visible_line(&p, 0, 0.6), "main text");
    // Cursor returns to its pre-switch position.
    assert_eq!((p.state.cursor_x, p.state.cursor_y), (9, 0));

    assert_eq!(p.state.screen_switch_events.len(), 2);
    assert!(p.state.screen_switch_events[0].to_alt);
    assert!(!p.state.screen_switch_events[1].to_alt);
}

#[test]
fn cursor_visibility_mode_records_events() {
    let mut p = parser();
    feed(&mut p, "\x1b[?25l", 0.5);
    feed(&mut p, "\x1b[?25h", 1.0);
    assert!(p.state.cursor_visible);

    let visibility: Vec<_> = p
        .state
        .cursor_events
        .iter()
        .filter_map(|event| match event {
            CursorEvent::Visibility { visible, .. } => Some(*visible),
            _ => None,
        })
        .collect();
    assert_eq!(visibility, vec![false, true]);
}

#[test]
fn autowrap_wraps_at_right_edge() {
    let mut p = parser();
    feed(&mut p, "\x1b[1;80Hab", 0.1);
    assert_eq!(active_char(&p, 0, 79, 0.2), Some('a'));
    assert_eq!(active_char(&p, 1, 0, 0.2), Some('b'));
}

#[test]
fn autowrap_disabled_overwrites_last_column() {
    let mut p = parser();
    feed(&mut p, "\x1b[?7l\x1b[1;80Habc", 0.1);
    assert_eq!(active_char(&p, 0, 79, 0.2), Some('c'));
    assert_eq!(active_char(&p, 1, 0, 0.2), None);
}

#[test]
fn osc_hyperlink_opens_and_closes() {
    let mut p = parser();
    feed(&mut p, "\x1b]8;;https://example.com\x1b\\link", 0.1);
    feed(&mut p, "\x1b]8;;\x07plain", 0.2);

    let linked = p.state.active_buffer().active_cell(0, 0, 0.3);
    assert_eq!(
        linked.and_then(|cell| cell.style.link.clone()),
        Some("https://example.com".to_string())
    );
    let plain = p.state.active_buffer().active_cell(0, 4, 0.3);
    assert_eq!(plain.and_then(|cell| cell.style.link.clone()), None);
}

#[test]
fn unsupported_sequences_are_ignored() {
    let mut p = parser();
    // DSR, window ops, mouse tracking, bracketed paste, OSC title.
    feed(&mut p, "\x1b[6n\x1b[8;24;80t\x1b[?1000h\x1b[?2004h", 0.1);
    feed(&mut p, "\x1b]0;window title\x07ok", 0.2);
    assert_eq!(visible_line(&p, 0, 0.3), "ok");
}
