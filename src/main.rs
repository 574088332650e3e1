use clap::Parser;
use tracing_subscriber::EnvFilter;

use term2svg::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout is reserved for SVG output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(Cli::parse())
}
