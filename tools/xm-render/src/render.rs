//! Offline rendering of a module to a WAV file
//!
//! The engine produces raw stereo floats; the classic player's output stage
//! (stereo separation followed by a soft clip) is applied here before the
//! frames reach the file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};
use xm_format::XmModule;
use xm_tracker::XmPlayer;

use crate::cli::{BitDepth, Separation};

/// Frames handed to the player per call
const BLOCK_FRAMES: usize = 1024;

/// Bleed of the opposite side in [`Separation::Standard`]
const STANDARD_BLEED: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub sample_rate: u32,
    pub max_seconds: u32,
    /// Extra passes after the first; 0 plays the song once
    pub loops: u32,
    pub separation: Separation,
    pub bits: BitDepth,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            max_seconds: 600,
            loops: 0,
            separation: Separation::Standard,
            bits: BitDepth::Int16,
        }
    }
}

/// What a render produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: u64,
    /// Number of times the song reached its end
    pub passes: u32,
}

/// Play `module` from the top and write every produced frame to `output`
pub fn render_module(module: XmModule, options: &RenderOptions, output: &Path) -> Result<RenderSummary> {
    let title = module.name.clone();

    let mut player = XmPlayer::new(options.sample_rate);
    player.load_module(module);
    player.set_repeat(options.loops > 0);
    player.play();

    let mut writer = create_writer(output, options)?;

    let max_frames = u64::from(options.max_seconds) * u64::from(options.sample_rate);
    let mut left = vec![0.0f32; BLOCK_FRAMES];
    let mut right = vec![0.0f32; BLOCK_FRAMES];
    let mut summary = RenderSummary { frames: 0, passes: 0 };

    while summary.frames < max_frames {
        let block = BLOCK_FRAMES.min((max_frames - summary.frames) as usize);
        let rendered = player.mix(&mut left[..block], &mut right[..block]);

        for (&l, &r) in left[..rendered].iter().zip(&right[..rendered]) {
            let (l, r) = separate(l, r, options.separation);
            write_frame(&mut writer, soft_clip(l), soft_clip(r), options.bits)?;
        }
        summary.frames += rendered as u64;

        // a short block means the song ended inside it
        if rendered < block {
            summary.passes += 1;
            debug!(passes = summary.passes, frames = summary.frames, "end of song");
            if summary.passes > options.loops || !player.is_playing() {
                break;
            }
        }
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", output.display()))?;

    info!(
        title = %title,
        frames = summary.frames,
        seconds = summary.frames as f64 / f64::from(options.sample_rate),
        passes = summary.passes,
        "render complete"
    );
    Ok(summary)
}

fn create_writer(output: &Path, options: &RenderOptions) -> Result<WavWriter<BufWriter<File>>> {
    let (bits_per_sample, sample_format) = match options.bits {
        BitDepth::Int16 => (16, SampleFormat::Int),
        BitDepth::Float32 => (32, SampleFormat::Float),
    };
    let spec = WavSpec {
        channels: 2,
        sample_rate: options.sample_rate,
        bits_per_sample,
        sample_format,
    };
    WavWriter::create(output, spec).with_context(|| format!("Failed to create {}", output.display()))
}

fn write_frame(writer: &mut WavWriter<BufWriter<File>>, left: f32, right: f32, bits: BitDepth) -> Result<()> {
    match bits {
        BitDepth::Int16 => {
            writer.write_sample(to_i16(left))?;
            writer.write_sample(to_i16(right))?;
        }
        BitDepth::Float32 => {
            writer.write_sample(left)?;
            writer.write_sample(right)?;
        }
    }
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Mix each side with part of the other
pub fn separate(left: f32, right: f32, separation: Separation) -> (f32, f32) {
    match separation {
        Separation::Standard => (left + right * STANDARD_BLEED, right + left * STANDARD_BLEED),
        Separation::Mono => {
            let mid = (left + right) * 0.5;
            (mid, mid)
        }
        Separation::Full => (left, right),
    }
}

/// Cubic soft clip, saturating at ±2/3 outside [-1, 1]
pub fn soft_clip(x: f32) -> f32 {
    if x < -1.0 {
        -2.0 / 3.0
    } else if x > 1.0 {
        2.0 / 3.0
    } else {
        x - x * x * x / 3.0
    }
}
