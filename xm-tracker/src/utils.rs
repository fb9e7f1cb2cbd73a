//! Pitch and timing helpers
//!
//! Period tables, period to frequency conversion and the tick clock.

use xm_format::FrequencyMode;

/// Base playback rate of C-4 in Hz
pub(crate) const C4_RATE: f64 = 8287.137;

/// Highest period reached by slides
pub(crate) const MAX_PERIOD: f64 = 7680.0;

/// Amiga period table
///
/// Twelve semitones of eight fine-tune steps each, with a one-semitone guard
/// band on either side so fine-tune -8..7 can be interpolated without
/// bounds checks.
pub const AMIGA_PERIODS: [u16; 105] = [
    907, 900, 894, 887, 881, 875, 868, 862, // guard
    856, 850, 844, 838, 832, 826, 820, 814, // C
    808, 802, 796, 791, 785, 779, 774, 768, // C#
    762, 757, 752, 746, 741, 736, 730, 725, // D
    720, 715, 709, 704, 699, 694, 689, 684, // D#
    678, 675, 670, 665, 660, 655, 651, 646, // E
    640, 636, 632, 628, 623, 619, 614, 610, // F
    604, 601, 597, 592, 588, 584, 580, 575, // F#
    570, 567, 563, 559, 555, 551, 547, 543, // G
    538, 535, 532, 528, 524, 520, 516, 513, // G#
    508, 505, 502, 498, 494, 491, 487, 484, // A
    480, 477, 474, 470, 467, 463, 460, 457, // A#
    453, 450, 447, 445, 442, 439, 436, 433, // B
    428,
];

/// Period of a transposed note (`note + relative_note`) at a fine-tune
pub fn calc_period(note: i32, fine_tune: i8, mode: FrequencyMode) -> f64 {
    match mode {
        FrequencyMode::Linear => MAX_PERIOD - note as f64 * 64.0 - fine_tune as f64 / 2.0,
        FrequencyMode::Amiga => {
            let steps = fine_tune as f64 / 16.0;
            let coarse = steps.floor();
            let frac = steps - coarse;

            let index = (8 + note.rem_euclid(12) * 8 + coarse as i32) as usize;
            let p1 = AMIGA_PERIODS[index] as f64;
            let p2 = AMIGA_PERIODS[index + 1] as f64;

            let octave = note.div_euclid(12);
            ((1.0 - frac) * p1 + frac * p2) * (16.0 / 2f64.powi(octave - 1))
        }
    }
}

/// Playback frequency in Hz for a period
#[inline]
pub fn period_to_frequency(period: f64, mode: FrequencyMode) -> f64 {
    match mode {
        FrequencyMode::Amiga => C4_RATE * 1712.0 / period,
        FrequencyMode::Linear => C4_RATE * 2f64.powf((4608.0 - period) / 768.0),
    }
}

/// Output frames per tick: 50 ticks per second at 125 BPM
#[inline]
pub fn samples_per_tick(bpm: u16, sample_rate: u32) -> i64 {
    let bpm = bpm.max(1) as f64;
    ((125.0 / bpm) * (sample_rate as f64 / 50.0)).floor() as i64
}
