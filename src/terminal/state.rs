//! Virtual terminal state model.
//!
//! `TerminalState` tracks everything the replay touches: cursor position
//! and styling, the main and alternate screen buffers with their full
//! cell-lifespan histories, the scroll region, and the event timelines
//! (cursor, scroll, screen switches) that later drive the animation.
//!
//! The state is mutated exclusively by [`AnsiParser`](super::AnsiParser)
//! during the single forward pass over a recording; afterwards it is an
//! immutable snapshot consumed by the renderers.

use super::types::{Buffer, CellStyle, CursorEvent, Screen, ScreenSwitch};

#[derive(Debug, Clone)]
pub struct TerminalState {
    /// Terminal width in columns.
    pub cols: usize,
    /// Terminal height in rows.
    pub rows: usize,

    /// Horizontal cursor position (0-indexed view column).
    pub cursor_x: usize,
    /// Vertical cursor position (0-indexed view row).
    pub cursor_y: usize,
    /// Saved cursor position for DECSC / CSI s and alt-screen switches.
    pub saved_cursor_x: usize,
    pub saved_cursor_y: usize,

    /// Attributes applied to subsequently written characters.
    pub current_style: CellStyle,
    /// Style saved by DECSC (`ESC 7`), restored by `ESC 8`.
    pub saved_style: CellStyle,

    pub cursor_visible: bool,
    pub auto_wrap: bool,

    /// Cursor position and visibility keyframes, time-ordered.
    pub cursor_events: Vec<CursorEvent>,

    pub main: Screen,
    pub alt: Screen,
    pub alt_screen_active: bool,
    pub screen_switch_events: Vec<ScreenSwitch>,

    /// Scroll region bounds, inclusive 0-indexed view rows.
    pub scroll_top: usize,
    pub scroll_bottom: usize,
}

impl TerminalState {
    /// Dimensions clamp to at least one cell; cursor arithmetic assumes
    /// a non-empty grid.
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let style = CellStyle::default();
        Self {
            cols,
            rows,
            cursor_x: 0,
            cursor_y: 0,
            saved_cursor_x: 0,
            saved_cursor_y: 0,
            current_style: style.clone(),
            saved_style: style,
            cursor_visible: true,
            auto_wrap: true,
            cursor_events: Vec::new(),
            main: Screen::default(),
            alt: Screen::default(),
            alt_screen_active: false,
            screen_switch_events: Vec::new(),
            scroll_top: 0,
            scroll_bottom: rows.saturating_sub(1),
        }
    }

    /// Restore the all-default style (SGR 0, also the construction state).
    pub fn reset_style(&mut self) {
        self.current_style = CellStyle::default();
    }

    pub fn active_screen(&self) -> &Screen {
        if self.alt_screen_active {
            &self.alt
        } else {
            &self.main
        }
    }

    pub fn active_screen_mut(&mut self) -> &mut Screen {
        if self.alt_screen_active {
            &mut self.alt
        } else {
            &mut self.main
        }
    }

    pub fn active_buffer(&self) -> &Buffer {
        &self.active_screen().buffer
    }

    pub fn active_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.active_screen_mut().buffer
    }

    pub fn active_scroll_offset(&self) -> usize {
        self.active_screen().scroll_offset
    }

    /// Sets cursor visibility, recording a keyframe only on change.
    pub fn set_cursor_visibility(&mut self, visible: bool, time: f64) {
        if self.cursor_visible != visible {
            self.cursor_visible = visible;
            self.cursor_events
                .push(CursorEvent::Visibility { time, visible });
        }
    }

    /// Records the current cursor position as a keyframe.
    ///
    /// Skipped when the position matches the last recorded position
    /// event. When the immediately preceding event is a position event
    /// with the same timestamp it is overwritten in place, collapsing
    /// the intermediate moves of one atomic operation into a single
    /// keyframe.
    pub fn record_cursor_state(&mut self, time: f64) {
        let last_position = self.cursor_events.iter().rev().find_map(|event| match event {
            CursorEvent::Move { x, y, .. } => Some((*x, *y)),
            CursorEvent::Visibility { .. } => None,
        });
        if last_position == Some((self.cursor_x, self.cursor_y)) {
            return;
        }

        let new_event = CursorEvent::Move {
            time,
            x: self.cursor_x,
            y: self.cursor_y,
        };

        if let Some(last) = self.cursor_events.last_mut() {
            if let CursorEvent::Move { time: last_time, .. } = last {
                if *last_time == time {
                    *last = new_event;
                    return;
                }
            }
        }
        self.cursor_events.push(new_event);
    }
}
