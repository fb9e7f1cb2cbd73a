//! General effect column (commands 0x00-0x23)

use super::{EffectFn, Effects, GENERAL_SLOTS, no_effect};
use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;
use crate::flags::TrackerFlags;
use crate::utils::{MAX_PERIOD, calc_period};
use crate::MAX_VOLUME;

#[rustfmt::skip]
pub(super) const TABLE: [EffectFn; GENERAL_SLOTS] = [
    arpeggio,             // 0
    porta_up,             // 1
    porta_down,           // 2
    tone_porta,           // 3
    vibrato,              // 4
    tone_porta_vol_slide, // 5
    vibrato_vol_slide,    // 6
    no_effect,            // 7 tremolo
    set_panning,          // 8
    sample_offset,        // 9
    volume_slide,         // A
    position_jump,        // B
    set_volume,           // C
    pattern_break,        // D
    extended,             // E
    set_speed_tempo,      // F
    set_global_volume,    // G
    global_volume_slide,  // H
    no_effect,            // I
    no_effect,            // J
    key_off,              // K
    set_envelope_pos,     // L
    no_effect,            // M
    no_effect,            // N
    no_effect,            // O
    no_effect,            // P panning slide
    no_effect,            // Q
    no_effect,            // R multi retrig
    no_effect,            // S
    no_effect,            // T tremor
    no_effect,            // U
    no_effect,            // V
    no_effect,            // W
    no_effect,            // X extra fine porta
    no_effect,            // Y
    no_effect,            // Z
];

/// 0xy: cycle between the note and two semitone offsets
fn arpeggio(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick {
        ch.arpeggio = ch.param;
        return;
    }
    if ch.param == 0 {
        return;
    }

    let offset = match ctx.tick % 3 {
        1 => ch.arpeggio >> 4,
        2 => ch.arpeggio & 0x0F,
        _ => 0,
    };
    let note = ch.note as i32 + offset as i32 + ch.relative_note as i32;
    ch.set_voice_period(calc_period(note, ch.fine_tune, ctx.frequency_mode));
}

/// 1xx: wraps by 65535 when it runs below 1, as FT2 does
pub(super) fn porta_up(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        if ch.param != 0 {
            ch.slide_up_speed = ch.param as f64 * 4.0;
        }
        return;
    }

    let mut period = ch.voice_period - ch.slide_up_speed;
    if period < 1.0 {
        period += 65535.0;
    }
    ch.set_voice_period(period);
}

/// 2xx
pub(super) fn porta_down(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        if ch.param != 0 {
            ch.slide_down_speed = ch.param as f64 * 4.0;
        }
        return;
    }

    ch.set_voice_period((ch.voice_period + ch.slide_down_speed).min(MAX_PERIOD));
}

/// 3xx: glide toward the target without overshooting it
pub(super) fn tone_porta(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        if ch.param != 0 {
            ch.slide_to_speed = ch.param as f64 * 4.0;
        }
        return;
    }

    let mut period = ch.voice_period;
    if period < ch.slide_to {
        period = (period + ch.slide_to_speed).min(ch.slide_to);
    }
    if period > ch.slide_to {
        period = (period - ch.slide_to_speed).max(ch.slide_to);
    }
    ch.set_voice_period(period);
}

/// 4xy: speed x, depth y; both nibbles must be set to replace the memory
pub(super) fn vibrato(fx: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick && ch.param & 0x0F != 0 && ch.param & 0xF0 != 0 {
        ch.vibrato_depth = ch.param & 0x0F;
        ch.vibrato_speed = ch.param >> 4;
    }
    apply_vibrato(fx, ch, ctx);
}

/// Offset the voice period by the current vibrato waveform value
///
/// The offset accumulates into the voice period every tick.
pub(super) fn apply_vibrato(fx: &Effects, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    let wave = fx.vibrato_value(ch.vibrato_wave, ch.vibrato_pos) / 63.0;
    ch.set_voice_period(ch.voice_period + ch.vibrato_depth as f64 * wave);
}

/// 5xy: continue tone portamento, slide volume
fn tone_porta_vol_slide(fx: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick {
        tone_porta(fx, false, ch, ctx);
    }
    volume_slide(fx, first_tick, ch, ctx);
}

/// 6xy: continue vibrato, slide volume
fn vibrato_vol_slide(fx: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick {
        apply_vibrato(fx, ch, ctx);
    }
    volume_slide(fx, first_tick, ch, ctx);
}

/// 8xx
fn set_panning(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.pan = ch.param as f64 / 255.0;
    }
}

/// 9xx: jump to `xx * 256` frames into the sample
fn sample_offset(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.sample_pos = ch.param as f64 * 256.0;
        ch.play_dir = 1.0;
        ch.start_trig_ramp();
    }
}

/// Axy: up by x when y is 0, down by y when x is 0
///
/// A00 keeps sliding with the last non-zero parameter.
pub(super) fn volume_slide(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        if ch.param != 0 {
            ch.volume_slide = ch.param;
        }
        return;
    }

    ch.voice_volume = slide_nibbles(ch.voice_volume, ch.volume_slide);
}

/// Bxx
fn position_jump(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick {
        ctx.break_row = 0;
        ctx.pattern_jump = ch.param as u16;
        ctx.flags.insert(TrackerFlags::PATTERN_JUMP);
    }
}

/// Cxx
fn set_volume(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.voice_volume = ch.param.min(MAX_VOLUME);
    }
}

/// Dxy: break to row `x * 10 + y` of the next position
fn pattern_break(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick {
        return;
    }

    ctx.break_row = (ch.param >> 4) as u16 * 10 + (ch.param & 0x0F) as u16;
    if !ctx.flags.contains(TrackerFlags::PATTERN_JUMP) {
        ctx.pattern_jump = ctx.position + 1;
    }
    ctx.flags.insert(TrackerFlags::PATTERN_JUMP);
}

/// Exy: dispatch on the high nibble
fn extended(fx: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    fx.dispatch_extended(ch.param >> 4, first_tick, ch, ctx);
}

/// Fxx: above 32 sets BPM, otherwise speed
fn set_speed_tempo(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if !first_tick {
        return;
    }
    if ch.param > 32 {
        ctx.bpm = ch.param as u16;
    } else if ch.param != 0 {
        ctx.speed = ch.param as u16;
    }
}

/// Gxx
fn set_global_volume(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick && ch.param <= MAX_VOLUME {
        ctx.global_volume = ch.param;
    }
}

/// Hxy: Axy applied to the global volume
fn global_volume_slide(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, ctx: &mut PlaybackContext) {
    if first_tick {
        if ch.param != 0 {
            ctx.global_vol_slide = ch.param;
        }
        return;
    }

    ctx.global_volume = slide_nibbles(ctx.global_volume, ctx.global_vol_slide);
}

/// Kxx
fn key_off(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        let envelope_on = ch.volume_envelope_on;
        ch.key_off(envelope_on);
    }
}

/// Lxx
fn set_envelope_pos(_: &Effects, first_tick: bool, ch: &mut TrackerChannel, _: &mut PlaybackContext) {
    if first_tick {
        ch.volume_envelope_pos = ch.param as u16;
        ch.panning_envelope_pos = ch.param as u16;
    }
}

/// Apply one step of an xy slide to a 0-64 volume
pub(super) fn slide_nibbles(volume: u8, slide: u8) -> u8 {
    let mut volume = volume;
    if slide & 0x0F == 0 {
        volume = (volume + (slide >> 4)).min(MAX_VOLUME);
    }
    if slide & 0xF0 == 0 {
        volume = volume.saturating_sub(slide & 0x0F);
    }
    volume
}
