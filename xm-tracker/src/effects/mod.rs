//! Effect dispatch tables
//!
//! Every effect is a plain function over `(channel, context)` that branches on
//! whether the current tick is the first of its row. [`Effects`] holds the
//! three jump tables and the precomputed vibrato waveforms; it carries no
//! per-channel state and is shared by reference across all channels.
//!
//! Table holes (commands with no XM meaning, or MOD-era effects this engine
//! does not reproduce) are explicit [`no_effect`] entries, so every index in
//! range is callable.

mod extended;
mod general;
mod volume;


use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;

/// General (0x00-0x23) and E-sub effect entry point
pub type EffectFn = fn(&Effects, bool, &mut TrackerChannel, &mut PlaybackContext);

/// Volume column effect entry point, taking the column's low nibble
pub type VolumeEffectFn = fn(&Effects, bool, &mut TrackerChannel, &mut PlaybackContext, u8);

/// Number of general effect slots
pub const GENERAL_SLOTS: usize = 0x24;

/// Number of E-sub effect slots
pub const EXTENDED_SLOTS: usize = 0x10;

/// Number of volume column effect slots
pub const VOLUME_SLOTS: usize = 0x0B;

/// Entries per vibrato waveform
pub const VIBRATO_TABLE_LEN: usize = 64;

/// Fixed seed for the random vibrato waveform
const VIBRATO_SEED: u64 = 0x584D_5F56_4942;

/// Stateless effect policy: jump tables plus vibrato waveforms
pub struct Effects {
    /// Sine, ramp down, square and random waveforms
    vibrato_tables: [[f64; VIBRATO_TABLE_LEN]; 4],
    general: [EffectFn; GENERAL_SLOTS],
    extended: [EffectFn; EXTENDED_SLOTS],
    volume: [VolumeEffectFn; VOLUME_SLOTS],
}

impl Default for Effects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects {
    pub fn new() -> Self {
        Self {
            vibrato_tables: vibrato_tables(),
            general: general::TABLE,
            extended: extended::TABLE,
            volume: volume::TABLE,
        }
    }

    /// Run general effect `command`; out-of-range ids do nothing
    #[inline]
    pub fn dispatch(&self, command: u8, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
        if let Some(effect) = self.general.get(command as usize) {
            effect(self, first_tick, ch, ctx);
        }
    }

    /// Run E-sub effect `sub` (the high nibble of an 0x0E parameter)
    #[inline]
    pub fn dispatch_extended(&self, sub: u8, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
        if let Some(effect) = self.extended.get(sub as usize) {
            effect(self, first_tick, ch, ctx);
        }
    }

    /// Run volume column effect `slot` with its nibble parameter
    #[inline]
    pub fn dispatch_volume(
        &self,
        slot: u8,
        param: u8,
        first_tick: bool,
        ch: &mut TrackerChannel,
        ctx: &mut PlaybackContext,
    ) {
        if let Some(effect) = self.volume.get(slot as usize) {
            effect(self, first_tick, ch, ctx, param);
        }
    }

    /// Waveform value at a phase, in -127..=127
    #[inline]
    pub fn vibrato_value(&self, wave: u8, pos: u8) -> f64 {
        self.vibrato_tables[(wave & 3) as usize][pos as usize % VIBRATO_TABLE_LEN]
    }
}

/// Placeholder for table holes
pub fn no_effect(_: &Effects, _: bool, _: &mut TrackerChannel, _: &mut PlaybackContext) {}

/// Placeholder for volume column holes
pub fn no_volume_effect(_: &Effects, _: bool, _: &mut TrackerChannel, _: &mut PlaybackContext, _: u8) {}

fn vibrato_tables() -> [[f64; VIBRATO_TABLE_LEN]; 4] {
    let mut rng = Pcg32::seed_from_u64(VIBRATO_SEED);
    let mut tables = [[0.0; VIBRATO_TABLE_LEN]; 4];

    for i in 0..VIBRATO_TABLE_LEN {
        let x = i as f64;
        tables[0][i] = 127.0 * (2.0 * PI * x / 64.0).sin();
        tables[1][i] = 127.0 - 4.0 * x;
        tables[2][i] = if i < 32 { 127.0 } else { -127.0 };
        tables[3][i] = (1.0 - 2.0 * rng.random::<f64>()) * 127.0;
    }

    tables
}
