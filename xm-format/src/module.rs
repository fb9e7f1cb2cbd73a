//! XM song document
//!
//! Everything here is produced once by the parser and is read-only afterwards.
//! Pattern cells hold canonical values (see [`XmNote`]); the playback engine
//! never sees raw file encodings.

use crate::{ENVELOPE_TICKS, KEYMAP_LEN, MAX_ENVELOPE_POINTS, MAX_VOLUME, NO_COMMAND, NO_NOTE, NO_VOLUME, NOTE_OFF};

/// Parsed XM module
#[derive(Debug, Clone)]
pub struct XmModule {
    /// Module name (max 20 chars)
    pub name: String,
    /// Name of the tracker that saved the file
    pub tracker_name: String,
    /// Format version word
    pub version: u16,
    /// Number of channels (1-32)
    pub num_channels: u8,
    /// Number of patterns, `max(order table) + 1`
    pub num_patterns: u16,
    /// Number of instruments
    pub num_instruments: u16,
    /// Song length in pattern order entries
    pub song_length: u16,
    /// Restart position for looping
    pub restart_position: u16,
    /// Default speed (ticks per row)
    pub default_speed: u16,
    /// Default BPM
    pub default_bpm: u16,
    /// Period table used for pitch
    pub frequency_mode: FrequencyMode,
    /// Pattern order table, all 256 entries as stored
    pub order_table: Vec<u8>,
    /// Pattern data, indexed by pattern number
    pub patterns: Vec<XmPattern>,
    /// Instruments, indexed by instrument number - 1
    pub instruments: Vec<XmInstrument>,
}

impl XmModule {
    /// Get the pattern at the given order position
    pub fn pattern_at_order(&self, order: u16) -> Option<&XmPattern> {
        let pattern_idx = *self.order_table.get(order as usize)? as usize;
        self.patterns.get(pattern_idx)
    }

    /// Pattern index stored at an order position
    pub fn pattern_index_at(&self, order: u16) -> Option<u8> {
        self.order_table.get(order as usize).copied()
    }
}

/// How periods map to pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyMode {
    /// Amiga period table, interpolated by fine-tune
    Amiga,
    /// Linear periods, 64 units per semitone
    #[default]
    Linear,
}

/// XM pattern containing rows of note data
#[derive(Debug, Clone)]
pub struct XmPattern {
    /// Number of rows in this pattern (1-256)
    pub num_rows: u16,
    /// Unpacked note data: [row][channel]
    pub notes: Vec<Vec<XmNote>>,
}

impl XmPattern {
    /// Get note at specific row and channel
    pub fn get_note(&self, row: u16, channel: u8) -> Option<&XmNote> {
        self.notes.get(row as usize)?.get(channel as usize)
    }

    /// Create an empty pattern with the given dimensions
    pub fn empty(num_rows: u16, num_channels: u8) -> Self {
        let notes = (0..num_rows)
            .map(|_| vec![XmNote::default(); num_channels as usize])
            .collect();
        Self { num_rows, notes }
    }
}

/// Single cell in a pattern, in canonical form
///
/// - `note`: 0-95 pitch, [`NOTE_OFF`] (254), [`NO_NOTE`] (255)
/// - `instrument`: 0 keeps the previous instrument, 1..N selects
/// - `volume`: 0-0x40 set volume, 0x50-0xEF volume effect, [`NO_VOLUME`] (255)
/// - `effect`: 0x00-0x23, or [`NO_COMMAND`] (0x2E)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmNote {
    pub note: u8,
    pub instrument: u8,
    pub volume: u8,
    pub effect: u8,
    pub effect_param: u8,
}

impl Default for XmNote {
    fn default() -> Self {
        Self {
            note: NO_NOTE,
            instrument: 0,
            volume: NO_VOLUME,
            effect: NO_COMMAND,
            effect_param: 0,
        }
    }
}

impl XmNote {
    /// Check if this is a note-off
    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.note == NOTE_OFF
    }

    /// Check if this note triggers a pitch
    #[inline]
    pub fn has_note(&self) -> bool {
        self.note < NOTE_OFF
    }

    /// Check if this sets an instrument
    #[inline]
    pub fn has_instrument(&self) -> bool {
        self.instrument > 0
    }

    /// Check if there's an effect command
    #[inline]
    pub fn has_effect(&self) -> bool {
        self.effect != NO_COMMAND
    }

    /// Volume value if the column sets volume
    #[inline]
    pub fn set_volume(&self) -> Option<u8> {
        (self.volume <= MAX_VOLUME).then_some(self.volume)
    }

    /// Volume column effect as (slot, nibble), slot 0 being tone portamento
    pub fn volume_effect(&self) -> Option<(u8, u8)> {
        if (0x50..0xF0).contains(&self.volume) {
            Some(((self.volume >> 4) - 5, self.volume & 0x0F))
        } else {
            None
        }
    }
}

/// XM instrument with its samples
#[derive(Debug, Clone)]
pub struct XmInstrument {
    /// Instrument name
    pub name: String,
    /// Sample count from the header (0 means the instrument is silent)
    pub num_samples: u16,
    /// Note to sample index map
    pub sample_map: [u8; KEYMAP_LEN],
    /// Volume envelope
    pub volume_envelope: XmEnvelope,
    /// Panning envelope
    pub panning_envelope: XmEnvelope,
    /// Auto-vibrato type (0=sine, 1=square, 2=ramp down, 3=ramp up)
    pub vibrato_type: u8,
    /// Auto-vibrato sweep
    pub vibrato_sweep: u8,
    /// Auto-vibrato depth
    pub vibrato_depth: u8,
    /// Auto-vibrato rate
    pub vibrato_rate: u8,
    /// Volume fadeout subtracted from the 65535 fade counter each tick
    pub volume_fadeout: u16,
    /// Samples; never empty, zero-sample instruments carry one default
    pub samples: Vec<XmSample>,
}

impl Default for XmInstrument {
    fn default() -> Self {
        Self {
            name: String::new(),
            num_samples: 0,
            sample_map: [0; KEYMAP_LEN],
            volume_envelope: XmEnvelope::disabled(EnvelopeKind::Volume),
            panning_envelope: XmEnvelope::disabled(EnvelopeKind::Panning),
            vibrato_type: 0,
            vibrato_sweep: 0,
            vibrato_depth: 0,
            vibrato_rate: 0,
            volume_fadeout: 0,
            samples: vec![XmSample::default()],
        }
    }
}

impl XmInstrument {
    /// Sample index for a canonical note, if the keymap points at a real sample
    pub fn sample_for_note(&self, note: u8) -> Option<usize> {
        let index = *self.sample_map.get(note as usize)? as usize;
        (index < self.samples.len()).then_some(index)
    }

    /// Check if the instrument has any real samples
    #[inline]
    pub fn is_silent(&self) -> bool {
        self.num_samples == 0
    }
}

/// Sample loop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopType {
    #[default]
    None,
    Forward,
    PingPong,
}

impl LoopType {
    /// Decode the low two bits of the sample type byte; 3 plays as forward
    pub fn from_type_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::None,
            2 => Self::PingPong,
            _ => Self::Forward,
        }
    }
}

/// Decoded sample
#[derive(Debug, Clone)]
pub struct XmSample {
    /// Sample name
    pub name: String,
    /// Length in frames
    pub length: usize,
    /// Loop start in frames
    pub loop_start: usize,
    /// Loop length in frames
    pub loop_length: usize,
    /// Loop policy
    pub loop_type: LoopType,
    /// Base volume (0-64)
    pub volume: u8,
    /// Fine-tune in 1/128 semitones
    pub fine_tune: i8,
    /// Panning (0=left, 255=right)
    pub panning: u8,
    /// Transpose in semitones relative to C-4
    pub relative_note: i8,
    /// Stored bit depth (8 or 16)
    pub bits: u8,
    /// Normalised waveform in [-1, 1]
    pub data: Vec<f32>,
}

impl Default for XmSample {
    fn default() -> Self {
        Self {
            name: String::new(),
            length: 0,
            loop_start: 0,
            loop_length: 0,
            loop_type: LoopType::None,
            volume: 0,
            fine_tune: 0,
            panning: 128,
            relative_note: 0,
            bits: 8,
            data: Vec::new(),
        }
    }
}

impl XmSample {
    /// Build a sample around already-decoded data
    pub fn from_data(data: Vec<f32>) -> Self {
        Self {
            length: data.len(),
            volume: MAX_VOLUME,
            data,
            ..Self::default()
        }
    }

    /// Loop end position in frames
    #[inline]
    pub fn loop_end(&self) -> usize {
        self.loop_start + self.loop_length
    }

    /// Check if this sample loops
    #[inline]
    pub fn has_loop(&self) -> bool {
        self.loop_type != LoopType::None && self.loop_length > 0
    }
}

/// Envelope behaviour bits (bit 0 on, bit 1 sustain, bit 2 loop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvelopeFlags(u8);

impl EnvelopeFlags {
    /// Envelope is enabled
    pub const ENABLED: Self = Self(0x01);
    /// Sustain point holds while the key is down
    pub const SUSTAIN: Self = Self(0x02);
    /// Loop region repeats
    pub const LOOP: Self = Self(0x04);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x07)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for EnvelopeFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which envelope a table describes; picks the flat default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Volume,
    Panning,
}

impl EnvelopeKind {
    /// Value of a disabled envelope
    pub fn default_value(self) -> f32 {
        match self {
            Self::Volume => 1.0,
            Self::Panning => 0.5,
        }
    }
}

/// Volume/panning envelope, pre-interpolated per tick
#[derive(Debug, Clone)]
pub struct XmEnvelope {
    /// Breakpoints actually in use: (x=tick, y=value 0-64)
    pub points: Vec<(u16, u16)>,
    /// Behaviour bits
    pub flags: EnvelopeFlags,
    /// Tick of the final point
    pub length: u16,
    /// Tick of the sustain point
    pub sustain: u16,
    /// Tick of the loop start point
    pub loop_start: u16,
    /// Tick of the loop end point
    pub loop_end: u16,
    /// Interpolated value per tick, `y / 64`
    pub table: Vec<f32>,
}

impl XmEnvelope {
    /// A disabled envelope with a flat default table
    pub fn disabled(kind: EnvelopeKind) -> Self {
        Self {
            points: Vec::new(),
            flags: EnvelopeFlags::empty(),
            length: 0,
            sustain: 0,
            loop_start: 0,
            loop_end: 0,
            table: vec![kind.default_value(); ENVELOPE_TICKS],
        }
    }

    /// Build an envelope from its raw breakpoints
    ///
    /// Only the first `num_points` points (clamped to 1..=12) shape the curve.
    /// `sustain`, `loop_start` and `loop_end` are point indices and are stored
    /// as the ticks of those points.
    pub fn from_points(
        kind: EnvelopeKind,
        raw_points: &[(u16, u16)],
        num_points: u8,
        sustain: u8,
        loop_start: u8,
        loop_end: u8,
        flags: EnvelopeFlags,
    ) -> Self {
        let count = (num_points as usize).clamp(1, MAX_ENVELOPE_POINTS).min(raw_points.len());
        if count == 0 {
            return Self::disabled(kind);
        }
        let points = raw_points[..count].to_vec();
        let tick_of = |index: u8| points[(index as usize).min(count - 1)].0;

        let table = if flags.contains(EnvelopeFlags::ENABLED) {
            interpolate(&points)
        } else {
            vec![kind.default_value(); ENVELOPE_TICKS]
        };

        Self {
            length: points[count - 1].0,
            sustain: tick_of(sustain),
            loop_start: tick_of(loop_start),
            loop_end: tick_of(loop_end),
            flags,
            points,
            table,
        }
    }

    /// Check if the envelope is enabled
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(EnvelopeFlags::ENABLED)
    }

    /// Check if the sustain point is active
    #[inline]
    pub fn has_sustain(&self) -> bool {
        self.flags.contains(EnvelopeFlags::SUSTAIN)
    }

    /// Check if the loop region is active
    #[inline]
    pub fn has_loop(&self) -> bool {
        self.flags.contains(EnvelopeFlags::LOOP)
    }

    /// Envelope value at a tick, clamped to the table
    #[inline]
    pub fn value_at(&self, tick: usize) -> f32 {
        self.table[tick.min(ENVELOPE_TICKS - 1)]
    }
}

/// Linear interpolation between breakpoints over ticks 0..325
fn interpolate(points: &[(u16, u16)]) -> Vec<f32> {
    let mut table = Vec::with_capacity(ENVELOPE_TICKS);
    let mut segment = 0;

    for tick in 0..ENVELOPE_TICKS {
        while segment + 1 < points.len() && tick >= points[segment + 1].0 as usize {
            segment += 1;
        }

        let (x1, y1) = points[segment];
        let value = match points.get(segment + 1) {
            Some(&(x2, y2)) if tick >= x1 as usize && x2 > x1 => {
                let t = (tick - x1 as usize) as f32 / (x2 - x1) as f32;
                y1 as f32 + (y2 as f32 - y1 as f32) * t
            }
            _ => y1 as f32,
        };
        table.push(value / 64.0);
    }

    table
}
