//! SVG generation from a replayed terminal state.
//!
//! Two dialects share the frame machinery: [`CssRenderer`] animates
//! with CSS keyframes, [`SmilRenderer`] with SMIL timing elements. Both
//! can also emit a static poster frame for an arbitrary instant.

mod css;
mod frame;
mod smil;

pub use css::CssRenderer;
pub use smil::SmilRenderer;

use crate::config::{Config, GeneratorKind};
use crate::terminal::TerminalState;

/// A complete SVG document builder for one replayed recording.
pub trait SvgRenderer {
    /// The animated SVG for the whole recording.
    fn generate(&mut self) -> String;

    /// A static SVG of the terminal as it looked at `time`.
    fn generate_poster(&mut self, time: f64) -> String;
}

/// The renderer selected by the configuration.
pub fn renderer<'a>(
    state: &'a TerminalState,
    config: &'a Config,
    duration: f64,
) -> Box<dyn SvgRenderer + 'a> {
    match config.generator {
        GeneratorKind::Css => Box::new(CssRenderer::new(state, config, duration)),
        GeneratorKind::Smil => Box::new(SmilRenderer::new(state, config, duration)),
    }
}
