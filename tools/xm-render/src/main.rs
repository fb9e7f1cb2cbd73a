//! xm-render: offline renderer and inspector for XM modules
//!
//! Usage:
//!   xm-render render song.xm song.wav [--loops 1] [--bits 32]
//!   xm-render info song.xm [--patterns]
//!
//! Set `RUST_LOG=debug` to follow sequencing events during a render.

mod cli;
mod info;
mod render;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use xm_format::{XmModule, parse_xm};

use cli::{Cli, Commands};
use render::RenderOptions;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            sample_rate,
            max_seconds,
            loops,
            separation,
            bits,
        } => {
            let module = load(&input)?;
            let options = RenderOptions {
                sample_rate,
                max_seconds,
                loops,
                separation,
                bits,
            };
            let summary = render::render_module(module, &options, &output)?;
            println!(
                "Wrote {} ({} frames, {:.1}s)",
                output.display(),
                summary.frames,
                summary.frames as f64 / f64::from(sample_rate)
            );
        }
        Commands::Info { input, patterns } => {
            let module = load(&input)?;
            print!("{}", info::describe(&module, patterns));
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<XmModule> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_xm(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}
