//! Convert `script(1)` terminal recordings into animated SVG.
//!
//! The pipeline has three stages: [`session`] reads the typescript and
//! timing files and replays them through the [`terminal`] emulator,
//! which records every cell as timestamped lifespans; [`render`] then
//! turns that temporal state into a self-contained animated SVG (or a
//! static poster frame).

pub mod cli;
pub mod config;
pub mod render;
pub mod session;
pub mod terminal;

pub use config::Config;
