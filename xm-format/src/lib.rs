//! xm-format: FastTracker II XM module parser
//!
//! Turns the raw bytes of an `.xm` file into an immutable [`XmModule`]
//! document that a playback engine reads from. Everything the engine needs is
//! normalised up front:
//!
//! - pattern cells are unpacked and remapped into canonical ranges
//!   (see [`XmNote`])
//! - sample waveforms are delta-decoded into `f32` in `[-1, 1]`
//! - volume and panning envelopes are pre-interpolated into
//!   [`ENVELOPE_TICKS`]-entry lookup tables
//! - text fields are decoded through the DOS code page 850
//!
//! # Usage
//!
//! ```ignore
//! use xm_format::parse_xm;
//!
//! let bytes = std::fs::read("song.xm")?;
//! let module = parse_xm(&bytes)?;
//!
//! println!("Song: {}", module.name);
//! println!("Channels: {}", module.num_channels);
//! for instrument in &module.instruments {
//!     println!("  {}", instrument.name);
//! }
//! ```
//!
//! # Format Reference
//!
//! - FastTracker 2 XM format specification v0104
//! - <https://github.com/milkytracker/MilkyTracker/blob/master/resources/reference/xm-form.txt>

mod codepage;
mod display;
mod error;
mod module;
mod parser;
mod sample;

pub use codepage::decode_dos_string;
pub use display::{CellView, DisplayNote};
pub use error::XmError;
pub use module::{
    EnvelopeFlags, EnvelopeKind, FrequencyMode, LoopType, XmEnvelope, XmInstrument, XmModule, XmNote, XmPattern,
    XmSample,
};
pub use parser::{get_instrument_names, parse_xm};
pub use sample::{decode_delta_16, decode_delta_8};

// =============================================================================
// Constants
// =============================================================================

/// XM format magic string
pub const XM_MAGIC: &[u8; 17] = b"Extended Module: ";

/// Oldest XM version accepted
pub const MIN_XM_VERSION: u16 = 0x0104;

/// Marker byte that terminates the title field
pub const XM_MARKER: u8 = 0x1A;

/// Maximum number of channels supported
pub const MAX_CHANNELS: u8 = 32;

/// Maximum number of patterns addressable by the order table
pub const MAX_PATTERNS: u16 = 256;

/// Maximum instruments in an XM file
pub const MAX_INSTRUMENTS: u16 = 128;

/// Number of entries in the order table as stored on disk
pub const ORDER_TABLE_LEN: usize = 256;

/// Length of every pre-interpolated envelope table (ticks 0..=324)
pub const ENVELOPE_TICKS: usize = 325;

/// Maximum breakpoints per envelope
pub const MAX_ENVELOPE_POINTS: usize = 12;

/// Entries in an instrument's note to sample map
pub const KEYMAP_LEN: usize = 96;

// =============================================================================
// Canonical Cell Values
// =============================================================================

/// Canonical note value for "note off"
pub const NOTE_OFF: u8 = 254;

/// Canonical note value for an empty note column
pub const NO_NOTE: u8 = 255;

/// Highest playable canonical note (B-7)
pub const NOTE_MAX: u8 = 95;

/// Canonical volume column value for "no volume"
pub const NO_VOLUME: u8 = 255;

/// Highest "set volume" value in the canonical volume column
pub const MAX_VOLUME: u8 = 0x40;

/// Canonical effect command meaning "no command"
pub const NO_COMMAND: u8 = 0x2E;

/// Highest general effect id
pub const MAX_EFFECT: u8 = 0x23;

// =============================================================================
// Effect Constants
// =============================================================================

/// XM effect commands (canonical ids after parsing)
pub mod effects {
    /// 0xy - Arpeggio
    pub const ARPEGGIO: u8 = 0x00;
    /// 1xx - Portamento up
    pub const PORTA_UP: u8 = 0x01;
    /// 2xx - Portamento down
    pub const PORTA_DOWN: u8 = 0x02;
    /// 3xx - Tone portamento
    pub const TONE_PORTA: u8 = 0x03;
    /// 4xy - Vibrato
    pub const VIBRATO: u8 = 0x04;
    /// 5xy - Tone portamento + volume slide
    pub const TONE_PORTA_VOL_SLIDE: u8 = 0x05;
    /// 6xy - Vibrato + volume slide
    pub const VIBRATO_VOL_SLIDE: u8 = 0x06;
    /// 7xy - Tremolo
    pub const TREMOLO: u8 = 0x07;
    /// 8xx - Set panning
    pub const SET_PANNING: u8 = 0x08;
    /// 9xx - Sample offset
    pub const SAMPLE_OFFSET: u8 = 0x09;
    /// Axy - Volume slide
    pub const VOLUME_SLIDE: u8 = 0x0A;
    /// Bxx - Position jump
    pub const POSITION_JUMP: u8 = 0x0B;
    /// Cxx - Set volume
    pub const SET_VOLUME: u8 = 0x0C;
    /// Dxx - Pattern break
    pub const PATTERN_BREAK: u8 = 0x0D;
    /// Exy - Extended effects
    pub const EXTENDED: u8 = 0x0E;
    /// Fxx - Set speed/tempo
    pub const SET_SPEED_TEMPO: u8 = 0x0F;
    /// Gxx - Set global volume
    pub const SET_GLOBAL_VOLUME: u8 = 0x10;
    /// Hxy - Global volume slide
    pub const GLOBAL_VOLUME_SLIDE: u8 = 0x11;
    /// Kxx - Key off
    pub const KEY_OFF: u8 = 0x14;
    /// Lxx - Set envelope position
    pub const SET_ENVELOPE_POS: u8 = 0x15;
    /// Pxy - Panning slide
    pub const PANNING_SLIDE: u8 = 0x19;
    /// Rxy - Multi retrig note
    pub const MULTI_RETRIG: u8 = 0x1B;
    /// Txy - Tremor
    pub const TREMOR: u8 = 0x1D;
    /// Xxx - Extra fine portamento
    pub const EXTRA_FINE_PORTA: u8 = 0x21;
}

/// Extended effect sub-commands (Exy where x is the sub-command)
pub mod extended_effects {
    /// E1x - Fine portamento up
    pub const FINE_PORTA_UP: u8 = 0x1;
    /// E2x - Fine portamento down
    pub const FINE_PORTA_DOWN: u8 = 0x2;
    /// E3x - Glissando control
    pub const GLISSANDO: u8 = 0x3;
    /// E4x - Vibrato waveform
    pub const VIBRATO_WAVEFORM: u8 = 0x4;
    /// E5x - Set finetune
    pub const SET_FINETUNE: u8 = 0x5;
    /// E6x - Pattern loop
    pub const PATTERN_LOOP: u8 = 0x6;
    /// E7x - Tremolo waveform
    pub const TREMOLO_WAVEFORM: u8 = 0x7;
    /// E8x - Set panning (coarse)
    pub const SET_PANNING_COARSE: u8 = 0x8;
    /// E9x - Retrigger note
    pub const RETRIG: u8 = 0x9;
    /// EAx - Fine volume slide up
    pub const FINE_VOLUME_UP: u8 = 0xA;
    /// EBx - Fine volume slide down
    pub const FINE_VOLUME_DOWN: u8 = 0xB;
    /// ECx - Note cut
    pub const NOTE_CUT: u8 = 0xC;
    /// EDx - Note delay
    pub const NOTE_DELAY: u8 = 0xD;
    /// EEx - Pattern delay
    pub const PATTERN_DELAY: u8 = 0xE;
}

// =============================================================================
// Tests
// =============================================================================
