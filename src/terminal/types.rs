//! Terminal data types.
//!
//! Contains the core data structures for representing terminal state:
//! - Color: color selectors (default, 16-color ANSI, hex)
//! - CellStyle: text attributes (bold, italic, underline, etc.)
//! - Cell: a single character lifespan with start/end timestamps
//! - Buffer: sparse cell-history grid addressed by absolute row
//! - Event types feeding the animation timelines

use std::collections::BTreeMap;

/// A color selector as carried by a cell style.
///
/// `Ansi` holds the raw SGR code (30-37/90-97 for foreground,
/// 40-47/100-107 for background); resolution to a hex value happens at
/// render time against the configured palette. `Hex` is used for both
/// 256-color palette lookups and truecolor sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    Default,
    Ansi(u8),
    Hex(String),
}

/// An immutable snapshot of the text attributes in effect when a cell
/// was written. Copied by value into every cell lifespan; cells never
/// share style storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
    pub strikethrough: bool,
    pub invisible: bool,
    pub blink: bool,
    /// Active hyperlink URI from OSC 8, if any.
    pub link: Option<String>,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            bold: false,
            dim: false,
            italic: false,
            underline: false,
            inverse: false,
            strikethrough: false,
            invisible: false,
            blink: false,
            link: None,
        }
    }
}

/// One recorded lifespan of a cell: a character and its style, visible
/// from `start` until `end` (or until the end of the recording if `end`
/// is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub char: char,
    pub style: CellStyle,
    pub start: f64,
    pub end: Option<f64>,
}

impl Cell {
    /// Whether this lifespan is visible at the queried instant.
    pub fn active_at(&self, time: f64) -> bool {
        self.start <= time && self.end.map_or(true, |end| end > time)
    }

    /// Whether this lifespan is still live from the parser's point of
    /// view at `time`: open, or closed at a point in the future.
    pub fn live_at(&self, time: f64) -> bool {
        self.end.map_or(true, |end| end > time)
    }
}

/// A sparse row: column index to the full lifespan history of that cell.
pub type Row = BTreeMap<usize, Vec<Cell>>;

/// A sparse screen buffer addressed by absolute row index.
///
/// Rows are never physically shifted by stream scrolling; the screen's
/// scroll offset translates view rows to absolute rows, so content that
/// scrolled off the top stays addressable for poster queries.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    rows: BTreeMap<usize, Row>,
}

impl Buffer {
    /// Iterate rows in ascending absolute order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.rows.iter().map(|(y, row)| (*y, row))
    }

    pub fn row(&self, y: usize) -> Option<&Row> {
        self.rows.get(&y)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The full lifespan history at a position.
    pub fn history(&self, y: usize, x: usize) -> Option<&Vec<Cell>> {
        self.rows.get(&y).and_then(|row| row.get(&x))
    }

    /// The most recent lifespan at a position, open or closed.
    pub fn last_cell(&self, y: usize, x: usize) -> Option<&Cell> {
        self.history(y, x).and_then(|cells| cells.last())
    }

    /// The lifespan visible at `time`, if any. Searches newest-first so
    /// the single active entry wins over older closed ones.
    pub fn active_cell(&self, y: usize, x: usize, time: f64) -> Option<&Cell> {
        self.history(y, x)?
            .iter()
            .rev()
            .find(|cell| cell.active_at(time))
    }

    /// Close the open lifespan at a position, if one exists. Erasing an
    /// already-erased cell is a no-op.
    pub fn close_open(&mut self, y: usize, x: usize, time: f64) {
        if let Some(cells) = self.rows.get_mut(&y).and_then(|row| row.get_mut(&x)) {
            if let Some(last) = cells.last_mut() {
                if last.end.is_none() {
                    last.end = Some(time);
                }
            }
        }
    }

    /// Write a character at a position: closes the previous open
    /// lifespan at the write time, then appends a new open one.
    pub fn write(&mut self, y: usize, x: usize, char: char, style: CellStyle, time: f64) {
        let cells = self.rows.entry(y).or_default().entry(x).or_default();
        if let Some(last) = cells.last_mut() {
            if last.end.is_none() {
                last.end = Some(time);
            }
        }
        cells.push(Cell {
            char,
            style,
            start: time,
            end: None,
        });
    }

    /// Close every open lifespan on row `y` from `start_x` spanning
    /// `count` columns (`None` means through the last column).
    pub fn close_line(
        &mut self,
        y: usize,
        start_x: usize,
        count: Option<usize>,
        cols: usize,
        time: f64,
    ) {
        let Some(row) = self.rows.get_mut(&y) else {
            return;
        };
        let end_x = count.map_or(cols, |n| start_x + n);
        for (_, cells) in row.range_mut(start_x..end_x) {
            if let Some(last) = cells.last_mut() {
                if last.end.is_none() {
                    last.end = Some(time);
                }
            }
        }
    }

    /// Detach a whole row, leaving the slot empty.
    pub fn take_row(&mut self, y: usize) -> Row {
        self.rows.remove(&y).unwrap_or_default()
    }

    /// Replace a whole row.
    pub fn put_row(&mut self, y: usize, row: Row) {
        if row.is_empty() {
            self.rows.remove(&y);
        } else {
            self.rows.insert(y, row);
        }
    }

    /// Clone a row's histories without detaching them.
    pub fn snapshot_row(&self, y: usize) -> Row {
        self.rows.get(&y).cloned().unwrap_or_default()
    }
}

/// A cursor timeline entry: either a position keyframe or a visibility
/// toggle. Both kinds share one ordered vec so the poster query can
/// replay them in recording order.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorEvent {
    Move { time: f64, x: usize, y: usize },
    Visibility { time: f64, visible: bool },
}

impl CursorEvent {
    pub fn time(&self) -> f64 {
        match self {
            CursorEvent::Move { time, .. } | CursorEvent::Visibility { time, .. } => *time,
        }
    }
}

/// A stream-scroll keyframe: at `time` the viewport moved down past
/// absolute row `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub time: f64,
    pub offset: usize,
}

/// A main/alternate screen switch keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSwitch {
    pub time: f64,
    pub to_alt: bool,
}

/// One of the two logical screens: its cell-history buffer, the stream
/// scroll offset, and the scroll keyframes that drive the animation.
#[derive(Debug, Default, Clone)]
pub struct Screen {
    pub buffer: Buffer,
    pub scroll_offset: usize,
    pub scroll_events: Vec<ScrollEvent>,
}
