//! Playback context
//!
//! All mutable state of one playback session. Only the sequencer and the code
//! it drives (tick processor, effects, mixer) write to it.

use tracing::debug;
use xm_format::{FrequencyMode, XmModule};

use crate::channel::TrackerChannel;
use crate::flags::TrackerFlags;
use crate::utils::samples_per_tick;
use crate::{DEFAULT_BPM, DEFAULT_SPEED, MAX_SPEED, MAX_VOLUME};

/// Mutable session state shared by the sequencer, tick processor and effects
#[derive(Clone, Debug)]
pub struct PlaybackContext {
    // --- Position ---
    /// Tick within the current row
    pub tick: u16,
    /// Row within the current pattern
    pub row: u16,
    /// Index into the order table
    pub position: u16,
    /// Frames left until the next tick
    pub spd: i64,
    /// Song ran past its last order entry
    pub end_of_song: bool,

    // --- Tempo ---
    /// Ticks per row
    pub speed: u16,
    /// Beats per minute
    pub bpm: u16,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Period table in use
    pub frequency_mode: FrequencyMode,

    // --- Volume ---
    /// Global volume (0-64)
    pub global_volume: u8,
    /// Global volume slide memory (Hxy)
    pub global_vol_slide: u8,

    // --- Pattern Flow ---
    /// Row to start on after a pending jump
    pub break_row: u16,
    /// Order position of a pending jump
    pub pattern_jump: u16,
    /// Extra rows to hold (EEx)
    pub pattern_delay: u16,
    /// Ticks already held for the current delay
    pub pattern_wait: u16,
    /// Row an E6x loop returns to
    pub loop_row: u16,
    /// Remaining E6x repetitions
    pub loop_count: u8,
    /// Transition and request bits
    pub flags: TrackerFlags,

    /// One state per voice
    pub channels: Vec<TrackerChannel>,
}

impl PlaybackContext {
    /// Fresh context for a module at the start of the song
    pub fn new(module: &XmModule, sample_rate: u32) -> Self {
        let speed = match module.default_speed {
            0 => DEFAULT_SPEED,
            speed => speed.min(MAX_SPEED),
        };
        let bpm = if module.default_bpm == 0 { DEFAULT_BPM } else { module.default_bpm };

        debug!(
            channels = module.num_channels,
            speed,
            bpm,
            sample_rate,
            "playback context created"
        );

        Self {
            tick: 0,
            row: 0,
            position: 0,
            spd: 0,
            end_of_song: false,

            speed,
            bpm,
            sample_rate,
            frequency_mode: module.frequency_mode,

            global_volume: MAX_VOLUME,
            global_vol_slide: 0,

            break_row: 0,
            pattern_jump: 0,
            pattern_delay: 0,
            pattern_wait: 0,
            loop_row: 0,
            loop_count: 0,
            flags: TrackerFlags::RECALC_SPEED,

            channels: vec![TrackerChannel::new(); module.num_channels as usize],
        }
    }

    /// Frames per tick at the current tempo
    #[inline]
    pub fn samples_per_tick(&self) -> i64 {
        samples_per_tick(self.bpm, self.sample_rate)
    }

    /// Check if the current tick is the first of its row
    #[inline]
    pub fn is_first_tick(&self) -> bool {
        self.tick == 0
    }

    /// Check if this tick started a new row
    #[inline]
    pub fn is_new_row(&self) -> bool {
        self.flags.contains(TrackerFlags::NEW_ROW)
    }
}
