//! Command-line interface.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Config, GeneratorKind, PosterAt};
use crate::{render, session};

#[derive(Parser, Debug)]
#[command(
    name = "term2svg",
    version,
    about = "Convert script(1) terminal recordings into animated SVG"
)]
pub struct Cli {
    /// Typescript file produced by script(1)
    pub typescript: PathBuf,

    /// Timing file produced by script -t
    pub timing: PathBuf,

    /// Output SVG path (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON theme file merged over the default appearance
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Terminal width in columns (overrides the typescript header)
    #[arg(long)]
    pub cols: Option<usize>,

    /// Terminal height in rows (overrides the typescript header)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Base font size in pixels
    #[arg(long)]
    pub font_size: Option<f64>,

    /// Id prefix for generated SVG elements
    #[arg(long)]
    pub id: Option<String>,

    /// Render a static frame at this time instead of an animation
    #[arg(long, value_name = "SECONDS|end")]
    pub poster_at: Option<PosterAt>,

    /// Animation dialect
    #[arg(long, value_enum, default_value_t = GeneratorKind::Css)]
    pub generator: GeneratorKind,

    /// Seconds to hold the final frame before the animation loops
    #[arg(long)]
    pub pause: Option<f64>,
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::default();
    if let Some(theme) = &cli.theme {
        config.apply_theme_file(theme)?;
    }
    if let Some(font_size) = cli.font_size {
        config.font_size = font_size;
    }
    if let Some(pause) = cli.pause {
        config.animation_pause_seconds = pause;
    }
    config.generator = cli.generator;
    config.id = cli.id.clone();
    config.poster_at = cli.poster_at;

    let session = session::replay_files(&cli.typescript, &cli.timing, &config, cli.cols, cli.rows)?;

    let mut renderer = render::renderer(&session.state, &config, session.duration);
    let svg = match config.poster_at {
        Some(PosterAt::End) => renderer.generate_poster(session.duration),
        Some(PosterAt::Seconds(time)) => renderer.generate_poster(time),
        None => renderer.generate(),
    };

    match &cli.output {
        Some(path) => fs::write(path, &svg)
            .with_context(|| format!("failed to write output file {}", path.display()))?,
        None => std::io::stdout()
            .write_all(svg.as_bytes())
            .context("failed to write SVG to stdout")?,
    }
    Ok(())
}
