//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xm-render")]
#[command(about = "Render FastTracker II modules to WAV and inspect them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a module to a stereo WAV file
    Render {
        /// Path to the XM file
        input: PathBuf,

        /// Output WAV path
        output: PathBuf,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = 44_100, value_parser = clap::value_parser!(u32).range(8_000..=192_000))]
        sample_rate: u32,

        /// Stop after this many seconds of audio
        #[arg(long, default_value_t = 600)]
        max_seconds: u32,

        /// Extra passes through the song after the first
        #[arg(long, default_value_t = 0)]
        loops: u32,

        /// Stereo separation applied before clipping
        #[arg(long, value_enum, default_value_t = Separation::Standard)]
        separation: Separation,

        /// 16-bit PCM or 32-bit float output
        #[arg(long, value_enum, default_value_t = BitDepth::Int16)]
        bits: BitDepth,
    },

    /// Print header information, instruments and optionally patterns
    Info {
        /// Path to the XM file
        input: PathBuf,

        /// Dump every pattern in order-table order
        #[arg(long)]
        patterns: bool,
    },
}

/// How much of each side bleeds into the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Separation {
    /// Each side gets half of the opposite side
    Standard,
    /// Both sides averaged
    Mono,
    /// Channels left untouched
    Full,
}

/// WAV sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BitDepth {
    #[value(name = "16")]
    Int16,
    #[value(name = "32")]
    Float32,
}
