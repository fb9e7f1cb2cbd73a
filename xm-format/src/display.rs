//! Pattern cell conversion for display
//!
//! Canonical cells are convenient for playback but not for showing to a user.
//! [`CellView`] packs notes into octave/semitone form, turns commands into the
//! characters trackers print and restores the raw volume column byte.

use std::fmt;

use crate::module::XmNote;
use crate::{MAX_VOLUME, NO_COMMAND, NO_NOTE, NO_VOLUME, NOTE_OFF};

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Note column for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayNote {
    Empty,
    Off,
    /// Semitone in the low nibble, octave in the high nibble
    Pitch(u8),
}

impl DisplayNote {
    pub fn from_canonical(note: u8) -> Self {
        match note {
            NO_NOTE => Self::Empty,
            NOTE_OFF => Self::Off,
            n if n < 97 => Self::Pitch((n % 12) | ((n / 12) << 4)),
            _ => Self::Empty,
        }
    }

    pub fn semitone(self) -> Option<u8> {
        match self {
            Self::Pitch(packed) => Some(packed & 0x0F),
            _ => None,
        }
    }

    pub fn octave(self) -> Option<u8> {
        match self {
            Self::Pitch(packed) => Some(packed >> 4),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Empty => f.write_str("..."),
            Self::Off => f.write_str("==="),
            Self::Pitch(packed) => write!(
                f,
                "{}{}",
                NOTE_NAMES[(packed & 0x0F) as usize % 12],
                packed >> 4
            ),
        }
    }
}

/// One pattern cell prepared for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub note: DisplayNote,
    /// 0 when the cell has no instrument
    pub instrument: u8,
    /// Raw XM volume column byte, 0 when empty
    pub volume: u8,
    /// Printable command character, `.` when empty
    pub command: char,
    pub param: u8,
}

impl From<&XmNote> for CellView {
    fn from(cell: &XmNote) -> Self {
        Self {
            note: DisplayNote::from_canonical(cell.note),
            instrument: cell.instrument,
            volume: display_volume(cell.volume),
            command: command_char(cell.effect),
            param: cell.effect_param,
        }
    }
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.note)?;
        if self.instrument == 0 {
            f.write_str("..")?;
        } else {
            write!(f, "{:02X}", self.instrument)?;
        }
        if self.volume == 0 {
            f.write_str(" ..")?;
        } else {
            write!(f, " {:02X}", self.volume)?;
        }
        if self.command == '.' && self.param == 0 {
            f.write_str(" ...")
        } else {
            write!(f, " {}{:02X}", self.command, self.param)
        }
    }
}

/// Restore the raw volume column byte
fn display_volume(volume: u8) -> u8 {
    match volume {
        NO_VOLUME => 0,
        v if v <= MAX_VOLUME => v + 0x10,
        v @ 0x50..=0x5F => v + 0xA0,
        v => v,
    }
}

/// Tracker command character: digits, then letters from `A`
fn command_char(command: u8) -> char {
    match command {
        NO_COMMAND => '.',
        c if c < 0x0A => (b'0' + c) as char,
        c => (b'A' + c - 0x0A) as char,
    }
}
