//! Per-channel tick processing: note triggers, effects, envelopes and the
//! final volume/panning that the mixer reads

use xm_format::effects::{EXTENDED, TONE_PORTA, TONE_PORTA_VOL_SLIDE};
use xm_format::extended_effects::NOTE_DELAY;
use xm_format::{EnvelopeKind, XmEnvelope, XmInstrument, XmModule, XmNote};

use super::{ENVELOPE_LAST_TICK, FADE_OUT_SCALE, Tracker};
use crate::channel::TrackerChannel;
use crate::context::PlaybackContext;
use crate::effects::Effects;
use crate::flags::TrackerFlags;
use crate::utils::{calc_period, period_to_frequency};

impl Tracker {
    /// Run one tick for every channel
    pub fn process_tick(&mut self) {
        let Self { module, effects, ctx } = self;

        let mut channels = std::mem::take(&mut ctx.channels);
        for (index, ch) in channels.iter_mut().enumerate() {
            process_channel(module, effects, ctx, ch, index);
        }
        ctx.channels = channels;

        ctx.flags.retain(TrackerFlags::PERSISTENT);
    }
}

/// Cell at the current position and row, empty when out of range
fn current_cell(module: &XmModule, ctx: &PlaybackContext, index: usize) -> XmNote {
    module
        .pattern_at_order(ctx.position)
        .and_then(|pattern| pattern.get_note(ctx.row, index as u8))
        .copied()
        .unwrap_or_default()
}

#[inline]
fn is_note_delay(command: u8, param: u8) -> bool {
    command == EXTENDED && param >> 4 == NOTE_DELAY
}

fn process_channel(
    module: &XmModule,
    effects: &Effects,
    ctx: &mut PlaybackContext,
    ch: &mut TrackerChannel,
    index: usize,
) {
    let cell = current_cell(module, ctx, index);
    let old_final_volume = ch.final_volume;

    if ctx.is_new_row() {
        ch.command = cell.effect;
        ch.param = cell.effect_param;
        if !is_note_delay(ch.command, ch.param) {
            process_note(module, ctx, ch, &cell);
        }
    }

    let instrument = ch.instrument.and_then(|i| module.instruments.get(i));
    if ch.note_on && instrument.is_none_or(XmInstrument::is_silent) {
        ch.note_on = false;
    }

    let first_tick = ctx.is_first_tick();

    if let Some((slot, param)) = cell.volume_effect() {
        effects.dispatch_volume(slot, param, first_tick, ch, ctx);
    }

    effects.dispatch(ch.command, first_tick, ch, ctx);

    if is_note_delay(ch.command, ch.param) && ctx.tick == (ch.param & 0x0F) as u16 {
        process_note(module, ctx, ch, &cell);
    }

    if (ch.period_changed || ctx.is_new_row()) && ch.voice_period != 0.0 {
        ch.sample_speed = period_to_frequency(ch.voice_period, ctx.frequency_mode) / ctx.sample_rate as f64;
    }

    ch.vibrato_pos = ch.vibrato_pos.wrapping_add(ch.vibrato_speed) & 0x3F;

    // instrument may have changed in process_note
    let instrument = ch.instrument.and_then(|i| module.instruments.get(i));
    let (volume_env, panning_env) = match instrument {
        Some(instrument) => {
            update_envelopes(ch, instrument);
            (
                instrument.volume_envelope.value_at(ch.volume_envelope_pos as usize) as f64,
                instrument.panning_envelope.value_at(ch.panning_envelope_pos as usize) as f64,
            )
        }
        None => (
            EnvelopeKind::Volume.default_value() as f64,
            EnvelopeKind::Panning.default_value() as f64,
        ),
    };

    ch.final_volume = ch.voice_volume as f64 * volume_env * ch.fade_out_pos as f64 / FADE_OUT_SCALE;
    // the panning envelope swings wider the further the base pan is from centre
    ch.final_pan = ch.pan + (panning_env - 0.5) * (0.5 * (ch.pan - 0.5).abs()) * 2.0;

    if old_final_volume != ch.final_volume {
        ch.vol_ramp_from = old_final_volume;
        ch.vol_ramp = 0.0;
    }

    ch.period_changed = false;
}

/// Advance both envelope positions and the fade-out
fn update_envelopes(ch: &mut TrackerChannel, instrument: &XmInstrument) {
    if instrument.volume_envelope.is_enabled() {
        ch.volume_envelope_pos = advance_envelope(ch.volume_envelope_pos, &instrument.volume_envelope, ch.note_on);
        if !ch.note_on && ch.fade_out_pos > 0 {
            ch.fade_out_pos = ch.fade_out_pos.saturating_sub(instrument.volume_fadeout);
        }
    }

    if instrument.panning_envelope.is_enabled() {
        ch.panning_envelope_pos =
            advance_envelope(ch.panning_envelope_pos, &instrument.panning_envelope, ch.note_on);
    }
}

/// Next envelope tick: hold at sustain while keyed, wrap at loop end,
/// stop at the last point
pub(crate) fn advance_envelope(pos: u16, envelope: &XmEnvelope, note_on: bool) -> u16 {
    let mut pos = pos.saturating_add(1);

    if note_on && envelope.has_sustain() && pos >= envelope.sustain {
        pos = envelope.sustain;
    }
    if envelope.has_loop() && pos >= envelope.loop_end {
        pos = envelope.loop_start;
    }
    if pos >= envelope.length {
        pos = envelope.length;
    }

    pos.min(ENVELOPE_LAST_TICK)
}

/// Apply a pattern cell's note, instrument and volume columns
fn process_note(module: &XmModule, ctx: &PlaybackContext, ch: &mut TrackerChannel, cell: &XmNote) {
    let explicit_instrument = cell.has_instrument();

    if explicit_instrument {
        let index = cell.instrument as usize - 1;
        match module.instruments.get(index) {
            Some(instrument) => {
                ch.instrument = Some(index);
                ch.volume_envelope_on = instrument.volume_envelope.is_enabled();
                if !instrument.is_silent() {
                    // keyed by the note already on the channel
                    select_sample(ch, instrument, ch.note);
                    if let Some(sample) = ch.sample.and_then(|s| instrument.samples.get(s)) {
                        ch.volume = sample.volume;
                        ch.pan = sample.panning as f64 / 255.0;
                    }
                    ch.play_dir = 1.0;
                }
                ch.voice_volume = ch.volume;
            }
            None => {
                ch.instrument = None;
                ch.sample = None;
                ch.volume_envelope_on = false;
                ch.note_on = false;
                ch.voice_volume = 0;
            }
        }
    }

    if cell.is_note_off() {
        let envelope_on = ch.volume_envelope_on;
        ch.key_off(envelope_on);
    } else if cell.has_note() {
        trigger_note(module, ctx, ch, cell.note, explicit_instrument);
    }

    if let Some(volume) = cell.set_volume() {
        ch.volume = volume;
        ch.voice_volume = volume;
    }
}

fn trigger_note(module: &XmModule, ctx: &PlaybackContext, ch: &mut TrackerChannel, note: u8, explicit_instrument: bool) {
    let Some(instrument) = ch.instrument.and_then(|i| module.instruments.get(i)) else {
        return;
    };

    select_sample(ch, instrument, note);
    if ch.sample.is_none() {
        ch.note_on = false;
        ch.voice_volume = 0;
        return;
    }

    let period = calc_period(note as i32 + ch.relative_note as i32, ch.fine_tune, ctx.frequency_mode);
    let snaps = ch.command != TONE_PORTA && ch.command != TONE_PORTA_VOL_SLIDE;

    if snaps {
        ch.note = note;
        ch.period = period;
        ch.set_voice_period(period);
    }

    if (ch.note_on && snaps) || (!ch.note_on && explicit_instrument) {
        if ch.vibrato_wave & 0x04 == 0 {
            ch.vibrato_pos = 0;
        }
        ch.note_on = true;
        ch.retrigger();
    }

    ch.slide_to = period;
}

/// Point the channel at the sample mapped to `note`, caching its tuning
fn select_sample(ch: &mut TrackerChannel, instrument: &XmInstrument, note: u8) {
    ch.sample = instrument.sample_for_note(note);
    if let Some(sample) = ch.sample.and_then(|s| instrument.samples.get(s)) {
        ch.relative_note = sample.relative_note;
        ch.fine_tune = sample.fine_tune;
    }
}
