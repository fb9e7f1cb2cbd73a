//! Volume column effects (canonical 0x50-0xEF)
//!
//! The slot is `(volume >> 4) - 5`, so slot 0 is the relocated tone
//! portamento column and slots 1-9 are raw 0x60-0xEF.

use super::general::apply_vibrato;
use super::{Effects, VOLUME_SLOTS, VolumeEffectFn, no_volume_effect};
use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;
use crate::MAX_VOLUME;

#[rustfmt::skip]
pub(super) const TABLE: [VolumeEffectFn; VOLUME_SLOTS] = [
    no_volume_effect,  // Fx tone portamento
    slide_down,        // 6x
    slide_up,          // 7x
    fine_slide_down,   // 8x
    fine_slide_up,     // 9x
    vibrato_speed,     // Ax
    vibrato,           // Bx
    set_panning,       // Cx
    no_volume_effect,  // Dx panning slide left
    no_volume_effect,  // Ex panning slide right
    no_volume_effect,
];

fn slide_down(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if !first_tick {
        ch.voice_volume = ch.voice_volume.saturating_sub(param);
    }
}

fn slide_up(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if !first_tick {
        ch.voice_volume = (ch.voice_volume + param).min(MAX_VOLUME);
    }
}

fn fine_slide_down(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if first_tick {
        ch.voice_volume = ch.voice_volume.saturating_sub(param);
    }
}

fn fine_slide_up(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if first_tick {
        ch.voice_volume = (ch.voice_volume + param).min(MAX_VOLUME);
    }
}

fn vibrato_speed(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if first_tick {
        ch.vibrato_speed = param;
    }
}

/// Sets depth on the first tick, then vibrates on every tick
fn vibrato(fx: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext, param: u8) {
    if first_tick && param != 0 {
        ch.vibrato_depth = param;
    }
    apply_vibrato(fx, ch, ctx);
}

/// Pan to `x / 15`
fn set_panning(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext, param: u8) {
    if first_tick {
        ch.pan = (param & 0x0F) as f64 / 15.0;
    }
}
