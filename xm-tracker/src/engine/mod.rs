//! Tracker engine implementation
//!
//! Core playback logic split by concern:
//! - Tick sequencing, pattern flow and song position
//! - Per-channel tick processing (notes, effects, envelopes)
//! - Sample mixing
//! - Buffer rendering

mod mixer;
mod processor;
mod render;
mod sequencer;


use xm_format::XmModule;

use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;
use crate::effects::Effects;

// ============================================================================
// Tracker Audio Constants
// ============================================================================

/// Trigger ramp step per frame (128-frame cross-fade)
pub(crate) const TRIG_RAMP_STEP: f64 = 1.0 / 128.0;

/// Volume ramp step per frame (64-frame cross-fade)
pub(crate) const VOL_RAMP_STEP: f64 = 1.0 / 64.0;

/// Full scale of channel and global volume
pub(crate) const VOLUME_SCALE: f64 = 64.0;

/// Full scale of the fade-out counter
pub(crate) const FADE_OUT_SCALE: f64 = 65536.0;

/// Last valid envelope tick
pub(crate) const ENVELOPE_LAST_TICK: u16 = (xm_format::ENVELOPE_TICKS - 1) as u16;

/// Row count assumed when the order table points past the pattern list
pub(crate) const FALLBACK_PATTERN_ROWS: u16 = 64;

/// XM sequencer: owns the song, the effect tables and the playback context
pub struct Tracker {
    module: XmModule,
    effects: Effects,
    ctx: PlaybackContext,
}

impl Tracker {
    /// Create a tracker positioned at the start of the song
    pub fn new(module: XmModule, sample_rate: u32) -> Self {
        let ctx = PlaybackContext::new(&module, sample_rate);
        Self {
            module,
            effects: Effects::new(),
            ctx,
        }
    }

    /// The loaded song
    #[inline]
    pub fn module(&self) -> &XmModule {
        &self.module
    }

    /// Channel state, if the index is in range
    pub fn channel(&self, index: usize) -> Option<&TrackerChannel> {
        self.ctx.channels.get(index)
    }

    pub fn row(&self) -> u16 {
        self.ctx.row
    }

    pub fn position(&self) -> u16 {
        self.ctx.position
    }

    pub fn tick(&self) -> u16 {
        self.ctx.tick
    }

    pub fn speed(&self) -> u16 {
        self.ctx.speed
    }

    pub fn bpm(&self) -> u16 {
        self.ctx.bpm
    }

    pub fn sample_rate(&self) -> u32 {
        self.ctx.sample_rate
    }

    /// Check if playback ran past the last order entry
    pub fn is_end_of_song(&self) -> bool {
        self.ctx.end_of_song
    }

    /// Pattern index playing at the current position
    pub fn current_pattern_index(&self) -> Option<u8> {
        self.module.pattern_index_at(self.ctx.position)
    }

    /// Row count of the pattern at the current position
    pub(crate) fn current_pattern_rows(&self) -> u16 {
        self.module
            .pattern_at_order(self.ctx.position)
            .map_or(FALLBACK_PATTERN_ROWS, |p| p.num_rows)
    }
}
