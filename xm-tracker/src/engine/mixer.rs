//! Sample mixing: one stereo frame across all channels

use xm_format::{LoopType, XmModule, XmSample};

use super::{TRIG_RAMP_STEP, Tracker, VOL_RAMP_STEP, VOLUME_SCALE};
use crate::channel::TrackerChannel;

impl Tracker {
    /// Mix one output frame and advance every voice by one frame
    pub fn mix_frame(&mut self) -> (f32, f32) {
        let Self { module, ctx, .. } = self;

        let mut left = 0.0;
        let mut right = 0.0;

        for ch in ctx.channels.iter_mut() {
            let (l, r) = mix_channel(module, ch);
            left += l;
            right += r;
        }

        let global = ctx.global_volume as f64 / VOLUME_SCALE;
        ((left * global) as f32, (right * global) as f32)
    }
}

/// Voice is audible: keyed, fading out, or still ramping down
#[inline]
fn is_audible(ch: &TrackerChannel) -> bool {
    ch.note_on || (ch.volume_envelope_on && ch.fade_out_pos > 0) || ch.vol_ramp < 1.0
}

fn active_sample<'a>(module: &'a XmModule, ch: &TrackerChannel) -> Option<&'a XmSample> {
    let instrument = module.instruments.get(ch.instrument?)?;
    instrument.samples.get(ch.sample?)
}

fn mix_channel(module: &XmModule, ch: &mut TrackerChannel) -> (f64, f64) {
    let sample = match active_sample(module, ch) {
        Some(sample) if is_audible(ch) => sample,
        _ => {
            ch.current_sample = 0.0;
            return (0.0, 0.0);
        }
    };

    let mut left = 0.0;
    let mut right = 0.0;
    let mut sample_data = 0.0;

    let index = ch.sample_pos.floor();
    if let Some(&data) = sample.data.get(index as usize).filter(|_| ch.sample_pos < sample.length as f64) {
        sample_data = data as f64;

        // interpolate from the last crossed sample towards the current one
        let mut frac = ch.sample_pos - index;
        if ch.play_dir < 0.0 {
            frac = 1.0 - frac;
        }
        let mut out = frac * sample_data + (1.0 - frac) * ch.last_sample;

        out = ch.trig_ramp * out + (1.0 - ch.trig_ramp) * ch.trig_ramp_from;
        ch.trig_ramp = (ch.trig_ramp + TRIG_RAMP_STEP).min(1.0);
        ch.current_sample = out;

        let target = out * (ch.final_volume / VOLUME_SCALE);
        let from = out * (ch.vol_ramp_from / VOLUME_SCALE);
        out = ch.vol_ramp * target + (1.0 - ch.vol_ramp) * from;
        ch.vol_ramp = (ch.vol_ramp + VOL_RAMP_STEP).min(1.0);

        left = out * (1.0 - ch.final_pan);
        right = out * ch.final_pan;
    }

    advance_position(ch, sample, sample_data);
    (left, right)
}

/// Step the playback position and apply the sample's loop policy
fn advance_position(ch: &mut TrackerChannel, sample: &XmSample, sample_data: f64) {
    let old_index = ch.sample_pos.floor();
    ch.sample_pos += ch.play_dir * ch.sample_speed;
    let new_index = ch.sample_pos.floor();

    let crossed = if ch.play_dir > 0.0 {
        new_index > old_index
    } else {
        new_index < old_index
    };
    if crossed {
        ch.last_sample = sample_data;
    }

    if !sample.has_loop() {
        return;
    }

    let loop_start = sample.loop_start as f64;
    let loop_end = sample.loop_end() as f64;

    match sample.loop_type {
        LoopType::PingPong => {
            if ch.play_dir < 0.0 {
                if ch.sample_pos <= loop_start {
                    ch.sample_pos = loop_start;
                    ch.play_dir = 1.0;
                    ch.last_sample = ch.current_sample;
                }
            } else if ch.sample_pos >= loop_end {
                ch.sample_pos = loop_end;
                ch.play_dir = -1.0;
                ch.last_sample = ch.current_sample;
            }
        }
        LoopType::Forward => {
            if ch.sample_pos >= loop_end {
                ch.sample_pos -= sample.loop_length as f64;
                ch.last_sample = ch.current_sample;
            }
        }
        LoopType::None => {}
    }
}
