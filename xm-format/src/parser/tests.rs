//! Tests for XM parser

use super::read::*;
use crate::error::XmError;
use crate::module::{FrequencyMode, LoopType};
use crate::{MIN_XM_VERSION, NO_COMMAND, NO_NOTE, NO_VOLUME, NOTE_OFF, XM_MAGIC};

// =============================================================================
// Builders
// =============================================================================

fn write_fixed_str<const N: usize>(out: &mut Vec<u8>, s: &str) {
    let mut buf = [0u8; N];
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(N);
    buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
    out.extend_from_slice(&buf);
}

struct Header {
    song_length: u16,
    channels: u16,
    patterns: u16,
    instruments: u16,
    flags: u16,
    speed: u16,
    bpm: u16,
    order: Vec<u8>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            song_length: 1,
            channels: 2,
            patterns: 1,
            instruments: 0,
            flags: 1,
            speed: 6,
            bpm: 125,
            order: vec![0],
        }
    }
}

fn write_header(out: &mut Vec<u8>, header: &Header) {
    out.extend_from_slice(XM_MAGIC);
    write_fixed_str::<20>(out, "xm-format test");
    out.push(0x1A);
    write_fixed_str::<20>(out, "xm-format tests");
    out.extend_from_slice(&MIN_XM_VERSION.to_le_bytes());
    out.extend_from_slice(&276u32.to_le_bytes());
    out.extend_from_slice(&header.song_length.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // restart position
    out.extend_from_slice(&header.channels.to_le_bytes());
    out.extend_from_slice(&header.patterns.to_le_bytes());
    out.extend_from_slice(&header.instruments.to_le_bytes());
    out.extend_from_slice(&header.flags.to_le_bytes());
    out.extend_from_slice(&header.speed.to_le_bytes());
    out.extend_from_slice(&header.bpm.to_le_bytes());
    for i in 0..256 {
        out.push(header.order.get(i).copied().unwrap_or(0));
    }
}

fn write_pattern(out: &mut Vec<u8>, rows: u16, packed: &[u8]) {
    out.extend_from_slice(&9u32.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&rows.to_le_bytes());
    out.extend_from_slice(&(packed.len() as u16).to_le_bytes());
    out.extend_from_slice(packed);
}

/// Every cell a bare 0x80 byte (all fields absent)
fn empty_packed(rows: u16, channels: u16) -> Vec<u8> {
    vec![0x80; rows as usize * channels as usize]
}

struct Sample {
    name: &'static str,
    /// Raw payload exactly as stored (delta encoded)
    payload: Vec<u8>,
    /// Length field in bytes; defaults to the payload length
    declared_length: Option<u32>,
    loop_start: u32,
    loop_length: u32,
    sample_type: u8,
    volume: u8,
    fine_tune: i8,
    panning: u8,
    relative_note: i8,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: "sample",
            payload: Vec::new(),
            declared_length: None,
            loop_start: 0,
            loop_length: 0,
            sample_type: 0,
            volume: 64,
            fine_tune: 0,
            panning: 128,
            relative_note: 0,
        }
    }
}

struct Instrument {
    name: &'static str,
    sample_map: [u8; 96],
    vol_points: Vec<(u16, u16)>,
    vol_sustain: u8,
    vol_loop: (u8, u8),
    vol_type: u8,
    fadeout: u16,
    samples: Vec<Sample>,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: "instrument",
            sample_map: [0; 96],
            vol_points: Vec::new(),
            vol_sustain: 0,
            vol_loop: (0, 0),
            vol_type: 0,
            fadeout: 0,
            samples: Vec::new(),
        }
    }
}

fn write_instrument(out: &mut Vec<u8>, instrument: &Instrument) {
    if instrument.samples.is_empty() {
        out.extend_from_slice(&29u32.to_le_bytes());
        write_fixed_str::<22>(out, instrument.name);
        out.push(0);
        out.extend_from_slice(&0u16.to_le_bytes());
        return;
    }

    let start = out.len();
    out.extend_from_slice(&243u32.to_le_bytes());
    write_fixed_str::<22>(out, instrument.name);
    out.push(0);
    out.extend_from_slice(&(instrument.samples.len() as u16).to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&instrument.sample_map);

    for i in 0..12 {
        let (x, y) = instrument.vol_points.get(i).copied().unwrap_or((0, 0));
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 48]); // panning points

    out.push(instrument.vol_points.len() as u8);
    out.push(0); // panning point count
    out.push(instrument.vol_sustain);
    out.push(instrument.vol_loop.0);
    out.push(instrument.vol_loop.1);
    out.extend_from_slice(&[0u8; 3]); // panning sustain/loop
    out.push(instrument.vol_type);
    out.push(0); // panning type
    out.extend_from_slice(&[0u8; 4]); // vibrato
    out.extend_from_slice(&instrument.fadeout.to_le_bytes());
    out.resize(start + 243, 0);

    for sample in &instrument.samples {
        let length = sample.declared_length.unwrap_or(sample.payload.len() as u32);
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&sample.loop_start.to_le_bytes());
        out.extend_from_slice(&sample.loop_length.to_le_bytes());
        out.push(sample.volume);
        out.push(sample.fine_tune as u8);
        out.push(sample.sample_type);
        out.push(sample.panning);
        out.push(sample.relative_note as u8);
        out.push(0);
        write_fixed_str::<22>(out, sample.name);
    }
    for sample in &instrument.samples {
        out.extend_from_slice(&sample.payload);
    }
}

fn minimal_module() -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out, &Header::default());
    write_pattern(&mut out, 4, &empty_packed(4, 2));
    out
}

// =============================================================================
// Header
// =============================================================================

#[test]
fn test_parse_header_fields() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            song_length: 2,
            channels: 4,
            patterns: 2,
            instruments: 1,
            flags: 1,
            speed: 3,
            bpm: 140,
            order: vec![1, 0],
        },
    );
    write_pattern(&mut out, 8, &empty_packed(8, 4));
    write_pattern(&mut out, 16, &empty_packed(16, 4));
    write_instrument(
        &mut out,
        &Instrument {
            name: "Lead",
            ..Instrument::default()
        },
    );

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.name, "xm-format test");
    assert_eq!(module.tracker_name, "xm-format tests");
    assert_eq!(module.version, MIN_XM_VERSION);
    assert_eq!(module.num_channels, 4);
    assert_eq!(module.num_patterns, 2);
    assert_eq!(module.num_instruments, 1);
    assert_eq!(module.song_length, 2);
    assert_eq!(module.default_speed, 3);
    assert_eq!(module.default_bpm, 140);
    assert_eq!(module.frequency_mode, FrequencyMode::Linear);
    assert_eq!(module.order_table.len(), 256);
    assert_eq!(module.patterns[0].num_rows, 8);
    assert_eq!(module.patterns[1].num_rows, 16);
    assert_eq!(module.pattern_at_order(0).map(|p| p.num_rows), Some(16));
    assert_eq!(module.instruments[0].name, "Lead");
}

#[test]
fn test_amiga_flag_and_default_tempo() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            flags: 0,
            speed: 0,
            bpm: 0,
            ..Header::default()
        },
    );
    write_pattern(&mut out, 1, &empty_packed(1, 2));

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.frequency_mode, FrequencyMode::Amiga);
    assert_eq!(module.default_speed, 6);
    assert_eq!(module.default_bpm, 125);
}

#[test]
fn test_oversized_default_speed_is_clamped() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            speed: 5000,
            ..Header::default()
        },
    );
    write_pattern(&mut out, 1, &empty_packed(1, 2));

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.default_speed, 31);
}

#[test]
fn test_parse_invalid_magic() {
    let mut data = minimal_module();
    data[0] = b'X';
    assert!(matches!(parse_xm(&data), Err(XmError::InvalidMagic)));
}

#[test]
fn test_parse_too_small() {
    let data = b"Extended Module: test";
    assert!(matches!(parse_xm(data), Err(XmError::TooSmall)));
}

#[test]
fn test_parse_bad_marker() {
    let mut data = minimal_module();
    data[0x25] = 0x20;
    assert_eq!(parse_xm(&data).unwrap_err(), XmError::InvalidMarker(0x20));
}

#[test]
fn test_parse_old_version_rejected() {
    let mut data = minimal_module();
    data[0x3A..0x3C].copy_from_slice(&0x0103u16.to_le_bytes());
    assert_eq!(
        parse_xm(&data).unwrap_err(),
        XmError::UnsupportedVersion(0x0103)
    );
}

#[test]
fn test_parse_newer_version_accepted() {
    let mut data = minimal_module();
    data[0x3A..0x3C].copy_from_slice(&0x0105u16.to_le_bytes());
    assert_eq!(parse_xm(&data).unwrap().version, 0x0105);
}

#[test]
fn test_too_many_channels() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            channels: 33,
            ..Header::default()
        },
    );
    assert_eq!(parse_xm(&out).unwrap_err(), XmError::TooManyChannels(33));
}

#[test]
fn test_truncated_pattern_is_eof() {
    let mut data = minimal_module();
    data.truncate(data.len() - 3);
    assert_eq!(parse_xm(&data).unwrap_err(), XmError::UnexpectedEof);
}

// =============================================================================
// Patterns
// =============================================================================

#[test]
fn test_event_remapping() {
    let packed = [
        // Full tuple: C-4, instrument 1, volume 0x50 (set 0x40), no effect
        0x31, 0x01, 0x50, 0x00, 0x00, //
        // Note off, arpeggio 0x37
        0x80 | 0x01 | 0x10, 0x61, 0x37, //
        // Empty note, tone portamento volume column 0xF4
        0x80 | 0x04, 0xF4, //
        // Raw note 96 (B-7), volume 0x65 (slide down 5)
        0x80 | 0x01 | 0x04, 0x60, 0x65,
    ];
    let cells = unpack_cells(&packed, 4);

    assert_eq!(cells[0].note, 0x30);
    assert_eq!(cells[0].instrument, 1);
    assert_eq!(cells[0].volume, 0x40);
    assert_eq!(cells[0].effect, NO_COMMAND);

    assert_eq!(cells[1].note, NOTE_OFF);
    assert_eq!(cells[1].volume, NO_VOLUME);
    assert_eq!(cells[1].effect, 0x00);
    assert_eq!(cells[1].effect_param, 0x37);

    assert_eq!(cells[2].note, NO_NOTE);
    assert_eq!(cells[2].volume, 0x54);

    assert_eq!(cells[3].note, 95);
    assert_eq!(cells[3].volume, 0x65);
}

#[test]
fn test_unpack_partial_fields() {
    let packed = [0b1000_1001u8, 0x31, 0x0F];
    let cells = unpack_cells(&packed, 1);

    assert_eq!(cells[0].note, 0x30);
    assert_eq!(cells[0].instrument, 0);
    assert_eq!(cells[0].volume, NO_VOLUME);
    // Effect F with absent param: not the "no command" case
    assert_eq!(cells[0].effect, 0x0F);
    assert_eq!(cells[0].effect_param, 0);
}

#[test]
fn test_unpack_short_stream_leaves_rest_empty() {
    let cells = unpack_cells(&[0x80 | 0x01, 0x0D], 3);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0].note, 0x0C);
    assert_eq!(cells[1], Default::default());
    assert_eq!(cells[2], Default::default());
}

#[test]
fn test_remap_tables() {
    assert_eq!(remap_note(0), NO_NOTE);
    assert_eq!(remap_note(1), 0);
    assert_eq!(remap_note(96), 95);
    assert_eq!(remap_note(97), NOTE_OFF);
    assert_eq!(remap_note(0xFF), NOTE_OFF);

    assert_eq!(remap_volume(0x00), NO_VOLUME);
    assert_eq!(remap_volume(0x0F), NO_VOLUME);
    assert_eq!(remap_volume(0x10), 0x00);
    assert_eq!(remap_volume(0x50), 0x40);
    assert_eq!(remap_volume(0x60), 0x60);
    assert_eq!(remap_volume(0xEF), 0xEF);
    assert_eq!(remap_volume(0xF0), 0x50);
    assert_eq!(remap_volume(0xFF), 0x5F);

    assert_eq!(remap_effect(0, 0), NO_COMMAND);
    assert_eq!(remap_effect(0, 1), 0);
    assert_eq!(remap_effect(0x23, 0), 0x23);
    assert_eq!(remap_effect(0x30, 4), NO_COMMAND);
}

#[test]
fn test_pattern_cells_land_in_row_major_order() {
    let mut out = Vec::new();
    write_header(&mut out, &Header::default());
    // 2 rows x 2 channels; only row 1 channel 1 has a note
    write_pattern(&mut out, 2, &[0x80, 0x80, 0x80, 0x81, 0x19]);

    let module = parse_xm(&out).unwrap();
    let pattern = &module.patterns[0];
    assert_eq!(pattern.notes.len(), 2);
    assert_eq!(pattern.get_note(0, 0).map(|n| n.note), Some(NO_NOTE));
    assert_eq!(pattern.get_note(1, 1).map(|n| n.note), Some(0x18));
}

#[test]
fn test_order_table_decides_pattern_count() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            song_length: 2,
            patterns: 1,
            order: vec![0, 2],
            ..Header::default()
        },
    );
    write_pattern(&mut out, 4, &empty_packed(4, 2));

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.num_patterns, 3);
    assert_eq!(module.patterns.len(), 3);
    assert_eq!(module.patterns[2].num_rows, 64);
    assert_eq!(module.patterns[2].notes[63].len(), 2);
}

#[test]
fn test_unreferenced_patterns_are_dropped() {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            patterns: 2,
            ..Header::default()
        },
    );
    write_pattern(&mut out, 4, &empty_packed(4, 2));
    write_pattern(&mut out, 8, &empty_packed(8, 2));

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.num_patterns, 1);
    assert_eq!(module.patterns.len(), 1);
}

#[test]
fn test_empty_packed_pattern() {
    let mut out = Vec::new();
    write_header(&mut out, &Header::default());
    write_pattern(&mut out, 32, &[]);

    let module = parse_xm(&out).unwrap();
    assert_eq!(module.patterns[0].num_rows, 32);
    assert!(
        module.patterns[0]
            .notes
            .iter()
            .flatten()
            .all(|n| n.note == NO_NOTE && n.effect == NO_COMMAND)
    );
}

// =============================================================================
// Instruments and samples
// =============================================================================

fn module_with_instruments(instruments: &[Instrument]) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(
        &mut out,
        &Header {
            instruments: instruments.len() as u16,
            ..Header::default()
        },
    );
    write_pattern(&mut out, 4, &empty_packed(4, 2));
    for instrument in instruments {
        write_instrument(&mut out, instrument);
    }
    out
}

#[test]
fn test_sample_decoding_8bit() {
    let data = module_with_instruments(&[Instrument {
        samples: vec![Sample {
            payload: [10i8, 5, -3].map(|d| d as u8).to_vec(),
            volume: 48,
            fine_tune: -16,
            relative_note: 12,
            panning: 200,
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let sample = &module.instruments[0].samples[0];
    assert_eq!(sample.length, 3);
    assert_eq!(sample.bits, 8);
    assert_eq!(sample.data, vec![10.0 / 128.0, 15.0 / 128.0, 12.0 / 128.0]);
    assert_eq!(sample.volume, 48);
    assert_eq!(sample.fine_tune, -16);
    assert_eq!(sample.relative_note, 12);
    assert_eq!(sample.panning, 200);
    assert_eq!(sample.name, "sample");
}

#[test]
fn test_sample_decoding_16bit_halves_lengths() {
    let mut payload = Vec::new();
    for delta in [100i16, 100, 100, 100, 100, 100] {
        payload.extend_from_slice(&delta.to_le_bytes());
    }
    let data = module_with_instruments(&[Instrument {
        samples: vec![Sample {
            payload,
            sample_type: 0x10 | 0x01,
            loop_start: 4,
            loop_length: 6,
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let sample = &module.instruments[0].samples[0];
    assert_eq!(sample.bits, 16);
    assert_eq!(sample.length, 6);
    assert_eq!(sample.loop_start, 2);
    assert_eq!(sample.loop_length, 3);
    assert_eq!(sample.loop_end(), 5);
    assert_eq!(sample.loop_type, LoopType::Forward);
    assert_eq!(sample.data[5], 600.0 / 32768.0);
}

#[test]
fn test_degenerate_loops() {
    let data = module_with_instruments(&[Instrument {
        samples: vec![
            Sample {
                payload: vec![0; 10],
                sample_type: 0x01,
                loop_start: 2,
                loop_length: 0,
                ..Sample::default()
            },
            Sample {
                payload: vec![0; 10],
                sample_type: 0x02,
                loop_start: 6,
                loop_length: 20,
                ..Sample::default()
            },
        ],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let samples = &module.instruments[0].samples;
    assert_eq!(samples[0].loop_type, LoopType::None);
    assert!(!samples[0].has_loop());
    assert_eq!(samples[1].loop_type, LoopType::PingPong);
    assert_eq!(samples[1].loop_end(), 10);
}

#[test]
fn test_samples_follow_all_headers() {
    let data = module_with_instruments(&[Instrument {
        sample_map: {
            let mut map = [0u8; 96];
            map[48..].fill(1);
            map
        },
        samples: vec![
            Sample {
                name: "low",
                payload: vec![1, 1],
                ..Sample::default()
            },
            Sample {
                name: "high",
                payload: vec![2, 2, 2],
                ..Sample::default()
            },
        ],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let instrument = &module.instruments[0];
    assert_eq!(instrument.num_samples, 2);
    assert_eq!(instrument.samples[0].name, "low");
    assert_eq!(instrument.samples[0].data, vec![1.0 / 128.0, 2.0 / 128.0]);
    assert_eq!(instrument.samples[1].name, "high");
    assert_eq!(instrument.samples[1].data.len(), 3);
    assert_eq!(instrument.sample_for_note(47), Some(0));
    assert_eq!(instrument.sample_for_note(48), Some(1));
}

#[test]
fn test_instrument_envelope_fields() {
    let data = module_with_instruments(&[Instrument {
        vol_points: vec![(0, 0), (10, 64), (20, 0)],
        vol_sustain: 1,
        vol_loop: (0, 2),
        vol_type: 0x07,
        fadeout: 0x400,
        samples: vec![Sample {
            payload: vec![0; 4],
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let instrument = &module.instruments[0];
    let env = &instrument.volume_envelope;
    assert!(env.is_enabled());
    assert!(env.has_sustain());
    assert!(env.has_loop());
    assert_eq!(env.points.len(), 3);
    assert_eq!(env.length, 20);
    assert_eq!(env.sustain, 10);
    assert_eq!(env.loop_start, 0);
    assert_eq!(env.loop_end, 20);
    assert_eq!(env.value_at(5), 0.5);
    assert_eq!(env.value_at(15), 0.5);
    assert_eq!(env.value_at(300), 0.0);
    assert_eq!(instrument.volume_fadeout, 0x400);
    assert!(!instrument.panning_envelope.is_enabled());
    assert!(instrument.panning_envelope.table.iter().all(|&v| v == 0.5));
}

#[test]
fn test_zero_sample_instrument_gets_default_sample() {
    let data = module_with_instruments(&[
        Instrument {
            name: "Empty",
            ..Instrument::default()
        },
        Instrument {
            name: "After",
            samples: vec![Sample {
                payload: vec![5],
                ..Sample::default()
            }],
            ..Instrument::default()
        },
    ]);

    let module = parse_xm(&data).unwrap();
    let empty = &module.instruments[0];
    assert_eq!(empty.name, "Empty");
    assert!(empty.is_silent());
    assert_eq!(empty.samples.len(), 1);
    assert_eq!(empty.samples[0].length, 0);
    assert_eq!(empty.samples[0].panning, 128);

    let after = &module.instruments[1];
    assert_eq!(after.name, "After");
    assert_eq!(after.samples[0].data, vec![5.0 / 128.0]);
}

#[test]
fn test_truncated_sample_data_is_zero_filled() {
    let data = module_with_instruments(&[Instrument {
        samples: vec![Sample {
            payload: vec![8, 8],
            declared_length: Some(6),
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let sample = &module.instruments[0].samples[0];
    assert_eq!(sample.length, 6);
    assert_eq!(
        sample.data,
        vec![8.0 / 128.0, 16.0 / 128.0, 0.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_huge_declared_sample_length_pads_a_bounded_amount() {
    let data = module_with_instruments(&[Instrument {
        samples: vec![Sample {
            payload: vec![8, 8],
            declared_length: Some(0x0400_0000),
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);

    let module = parse_xm(&data).unwrap();
    let sample = &module.instruments[0].samples[0];
    assert_eq!(sample.length, 2 + 0x10000);
    assert_eq!(sample.data.len(), 2 + 0x10000);
    assert_eq!(&sample.data[..3], &[8.0 / 128.0, 16.0 / 128.0, 0.0]);
}

#[test]
fn test_truncated_instrument_header_is_eof() {
    let mut data = module_with_instruments(&[Instrument {
        samples: vec![Sample {
            payload: vec![1],
            ..Sample::default()
        }],
        ..Instrument::default()
    }]);
    // Cut inside the envelope tables
    let pattern_end = 60 + 276 + 9 + 8;
    data.truncate(pattern_end + 150);
    assert_eq!(parse_xm(&data).unwrap_err(), XmError::UnexpectedEof);
}

#[test]
fn test_get_instrument_names() {
    let data = module_with_instruments(&[
        Instrument {
            name: "Kick",
            ..Instrument::default()
        },
        Instrument {
            name: "Snare",
            ..Instrument::default()
        },
    ]);
    assert_eq!(get_instrument_names(&data).unwrap(), vec!["Kick", "Snare"]);
}
