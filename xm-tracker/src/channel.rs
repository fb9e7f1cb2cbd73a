//! Tracker channel state
//!
//! Per-voice playback state: the latched pattern command, pitch, volume and
//! panning registers, effect memories, envelope positions and the two ramps
//! the mixer uses to smooth discontinuities.

use crate::{FADE_OUT_START, MAX_VOLUME};

/// Per-channel playback state
#[derive(Clone, Debug)]
pub struct TrackerChannel {
    // --- Instrument & Note ---
    /// Active instrument index (0-based), `None` when the voice has none
    pub instrument: Option<usize>,
    /// Active sample index inside the instrument, `None` when unmapped
    pub sample: Option<usize>,
    /// Last triggered canonical note
    pub note: u8,
    /// Command latched from the current row
    pub command: u8,
    /// Parameter latched from the current row
    pub param: u8,
    /// Key is held (cleared by note-off and key-off)
    pub note_on: bool,
    /// Active instrument has its volume envelope enabled
    pub volume_envelope_on: bool,

    // --- Sample Playback ---
    /// Continuous sample position in frames
    pub sample_pos: f64,
    /// Frames advanced per output frame
    pub sample_speed: f64,
    /// Play direction, 1 or -1 for ping-pong loops
    pub play_dir: f64,
    /// Relative note of the active sample
    pub relative_note: i8,
    /// Fine-tune of the active sample
    pub fine_tune: i8,

    // --- Pitch ---
    /// Period of the triggered note
    pub period: f64,
    /// Period actually sounding, moved by slides and vibrato
    pub voice_period: f64,
    /// Voice period was touched this tick
    pub period_changed: bool,
    /// Tone portamento target period
    pub slide_to: f64,
    /// Tone portamento speed
    pub slide_to_speed: f64,
    /// Portamento up speed (1xx memory)
    pub slide_up_speed: f64,
    /// Portamento down speed (2xx memory)
    pub slide_down_speed: f64,
    /// Arpeggio parameter memory
    pub arpeggio: u8,

    // --- Vibrato ---
    /// Vibrato phase (0-63)
    pub vibrato_pos: u8,
    /// Phase step per tick
    pub vibrato_speed: u8,
    /// Vibrato depth
    pub vibrato_depth: u8,
    /// Waveform selector; bit 2 set keeps the phase on retrigger
    pub vibrato_wave: u8,

    // --- Volume ---
    /// Set volume (0-64)
    pub volume: u8,
    /// Volume after slides and cuts (0-64)
    pub voice_volume: u8,
    /// Volume after envelope and fade-out
    pub final_volume: f64,
    /// Volume slide memory (Axy)
    pub volume_slide: u8,
    /// Fade-out counter, 65535 after a trigger
    pub fade_out_pos: u16,

    // --- Panning ---
    /// Set panning (0.0=left, 1.0=right)
    pub pan: f64,
    /// Panning after the envelope
    pub final_pan: f64,

    // --- Envelopes ---
    /// Volume envelope tick
    pub volume_envelope_pos: u16,
    /// Panning envelope tick
    pub panning_envelope_pos: u16,

    // --- Ramps ---
    /// Trigger ramp phase (0.0-1.0, 128 frames)
    pub trig_ramp: f64,
    /// Sample value the trigger ramp fades from
    pub trig_ramp_from: f64,
    /// Volume ramp phase (0.0-1.0, 64 frames)
    pub vol_ramp: f64,
    /// Final volume the volume ramp fades from
    pub vol_ramp_from: f64,
    /// Last rendered output value
    pub current_sample: f64,
    /// Raw sample value last crossed, used for interpolation
    pub last_sample: f64,
}

impl Default for TrackerChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerChannel {
    /// Channel with the power-on defaults
    pub fn new() -> Self {
        Self {
            instrument: Some(0),
            sample: None,
            note: 36,
            command: xm_format::NO_COMMAND,
            param: 0,
            note_on: false,
            volume_envelope_on: false,

            sample_pos: 0.0,
            sample_speed: 0.0,
            play_dir: 1.0,
            relative_note: 0,
            fine_tune: 0,

            period: 640.0,
            voice_period: 0.0,
            period_changed: false,
            slide_to: 0.0,
            slide_to_speed: 0.0,
            slide_up_speed: 0.0,
            slide_down_speed: 0.0,
            arpeggio: 0,

            vibrato_pos: 0,
            vibrato_speed: 0,
            vibrato_depth: 0,
            vibrato_wave: 0,

            volume: MAX_VOLUME,
            voice_volume: 0,
            final_volume: 0.0,
            volume_slide: 0,
            fade_out_pos: 0,

            pan: 0.5,
            final_pan: 0.5,

            volume_envelope_pos: 0,
            panning_envelope_pos: 0,

            trig_ramp: 0.0,
            trig_ramp_from: 0.0,
            vol_ramp: 0.0,
            vol_ramp_from: 0.0,
            current_sample: 0.0,
            last_sample: 0.0,
        }
    }

    /// Restart the sample from the top, cross-fading from the current output
    pub fn restart_sample(&mut self) {
        self.sample_pos = 0.0;
        self.play_dir = 1.0;
        self.start_trig_ramp();
    }

    /// Restart sample, fade-out and envelopes as a fresh key press
    pub fn retrigger(&mut self) {
        self.restart_sample();
        self.fade_out_pos = FADE_OUT_START;
        self.volume_envelope_pos = 0;
        self.panning_envelope_pos = 0;
    }

    /// Begin a 128-frame cross-fade away from the last rendered value
    #[inline]
    pub fn start_trig_ramp(&mut self) {
        self.trig_ramp = 0.0;
        self.trig_ramp_from = self.current_sample;
    }

    /// Change the sounding period and flag it for a speed update
    #[inline]
    pub fn set_voice_period(&mut self, period: f64) {
        self.voice_period = period;
        self.period_changed = true;
    }

    /// Release the key; without a volume envelope the voice stops at once
    pub fn key_off(&mut self, volume_envelope_on: bool) {
        self.note_on = false;
        if !volume_envelope_on {
            self.voice_volume = 0;
        }
    }
}
