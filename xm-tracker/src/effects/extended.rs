//! E-sub effects (Exy, dispatched on x)

use super::{EXTENDED_SLOTS, EffectFn, Effects, no_effect};
use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;
use crate::flags::TrackerFlags;
use crate::utils::MAX_PERIOD;
use crate::MAX_VOLUME;

#[rustfmt::skip]
pub(super) const TABLE: [EffectFn; EXTENDED_SLOTS] = [
    no_effect,        // E0 filter (MOD only)
    fine_porta_up,    // E1
    fine_porta_down,  // E2
    no_effect,        // E3 glissando
    vibrato_waveform, // E4
    no_effect,        // E5 fine-tune
    pattern_loop,     // E6
    no_effect,        // E7 tremolo waveform
    no_effect,        // E8
    retrigger,        // E9
    fine_volume_up,   // EA
    fine_volume_down, // EB
    note_cut,         // EC
    no_effect,        // ED note delay, triggered by the tick processor
    pattern_delay,    // EE
    no_effect,        // EF
];

/// E1x
fn fine_porta_up(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        let step = (ch.param & 0x0F) as f64 * 4.0;
        ch.set_voice_period((ch.voice_period - step).max(1.0));
    }
}

/// E2x
fn fine_porta_down(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        let step = (ch.param & 0x0F) as f64 * 4.0;
        ch.set_voice_period((ch.voice_period + step).min(MAX_PERIOD));
    }
}

/// E4x: bits 0-1 pick the waveform, bit 2 keeps the phase on new notes
fn vibrato_waveform(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.vibrato_wave = ch.param & 0x07;
    }
}

/// E6x: E60 marks the loop row, E6x repeats back to it x times
fn pattern_loop(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick {
        return;
    }

    let count = ch.param & 0x0F;
    if count == 0 {
        ctx.loop_row = ctx.row;
    } else if ctx.loop_count == 0 {
        ctx.loop_count = count;
        ctx.flags.insert(TrackerFlags::LOOP_PATTERN);
    } else {
        ctx.loop_count -= 1;
        if ctx.loop_count != 0 {
            ctx.flags.insert(TrackerFlags::LOOP_PATTERN);
        }
    }
}

/// E9x: retrigger every x ticks
fn retrigger(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    let interval = (ch.param & 0x0F) as u16;
    if !first_tick && interval != 0 && ctx.tick % interval == 0 {
        ch.retrigger();
    }
}

/// EAx
fn fine_volume_up(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.voice_volume = (ch.voice_volume + (ch.param & 0x0F)).min(MAX_VOLUME);
    }
}

/// EBx
fn fine_volume_down(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.voice_volume = ch.voice_volume.saturating_sub(ch.param & 0x0F);
    }
}

/// ECx: silence the voice on tick x
fn note_cut(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick && ctx.tick == (ch.param & 0x0F) as u16 {
        ch.voice_volume = 0;
    }
}

/// EEx: hold the row for x extra row durations
fn pattern_delay(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick {
        ctx.pattern_delay = (ch.param & 0x0F) as u16;
        ctx.pattern_wait = 0;
    }
}
