//! Terminal emulation over a temporal cell model.
//!
//! Unlike a conventional emulator that keeps only the current screen,
//! this one records the full history of every cell as a sequence of
//! timestamped lifespans, which is what lets the renderers replay the
//! recording as an animation or query the screen at an arbitrary
//! instant.

pub mod charset;
mod parser;
mod state;
mod types;

pub use parser::{ansi_16_color, AnsiParser, ANSI_16_COLORS};
pub use state::TerminalState;
pub use types::{
    Buffer, Cell, CellStyle, Color, CursorEvent, Row, Screen, ScreenSwitch, ScrollEvent,
};

#[cfg(test)]
mod tests;
