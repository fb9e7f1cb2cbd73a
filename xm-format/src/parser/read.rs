//! XM file parsing and reading functions

use std::io::{Cursor, Read};

use tracing::{debug, warn};

use crate::codepage::decode_dos_string;
use crate::error::XmError;
use crate::module::{
    EnvelopeFlags, EnvelopeKind, FrequencyMode, LoopType, XmEnvelope, XmInstrument, XmModule,
    XmNote, XmPattern, XmSample,
};
use crate::sample::{decode_delta_8, decode_delta_16};
use crate::{
    KEYMAP_LEN, MAX_CHANNELS, MAX_EFFECT, MAX_ENVELOPE_POINTS, MAX_INSTRUMENTS, MAX_VOLUME,
    MIN_XM_VERSION, NO_COMMAND, NO_NOTE, NO_VOLUME, NOTE_OFF, ORDER_TABLE_LEN, XM_MAGIC, XM_MARKER,
};

/// Offset of the variable-length header block
const HEADER_OFFSET: u64 = 0x3C;

/// Fixed header fields up to and including the order table
const MIN_HEADER_SIZE: u32 = 20 + ORDER_TABLE_LEN as u32;

/// Rows assumed for a pattern whose header says 0 or that is missing
const DEFAULT_PATTERN_ROWS: u16 = 64;

/// Maximum pattern length (rows)
const MAX_PATTERN_ROWS: u16 = 256;

/// Bytes of a standard sample header
const SAMPLE_HEADER_SIZE: u32 = 40;

/// Most silent frames appended to a truncated sample payload
const MAX_SAMPLE_PADDING: usize = 0x10000;

/// Highest speed (ticks per row) FT2 accepts
const MAX_SPEED: u16 = 31;

const DEFAULT_SPEED: u16 = 6;
const DEFAULT_BPM: u16 = 125;

/// Parse an XM file into an XmModule
///
/// The whole file is decoded: patterns are unpacked into canonical cells,
/// envelopes are pre-interpolated and sample data is delta-decoded.
///
/// # Arguments
/// * `data` - Raw XM file bytes
///
/// # Returns
/// * `Ok(XmModule)` - Parsed module
/// * `Err(XmError)` - The file is not a supported XM module
///
/// # Example
/// ```ignore
/// let xm_data = std::fs::read("song.xm")?;
/// let module = parse_xm(&xm_data)?;
/// println!("Loaded: {}", module.name);
/// ```
pub fn parse_xm(data: &[u8]) -> Result<XmModule, XmError> {
    if data.len() < HEADER_OFFSET as usize + MIN_HEADER_SIZE as usize {
        return Err(XmError::TooSmall);
    }

    if &data[0..17] != XM_MAGIC {
        return Err(XmError::InvalidMagic);
    }

    let name = decode_dos_string(&data[0x11..0x25]);

    if data[0x25] != XM_MARKER {
        return Err(XmError::InvalidMarker(data[0x25]));
    }

    let tracker_name = decode_dos_string(&data[0x26..0x3A]);

    let mut cursor = Cursor::new(data);
    cursor.set_position(0x3A);

    let version = read_u16(&mut cursor)?;
    if version < MIN_XM_VERSION {
        return Err(XmError::UnsupportedVersion(version));
    }

    // Header size is measured from the position of the field itself
    let header_size = read_u32(&mut cursor)?;
    if header_size < MIN_HEADER_SIZE {
        return Err(XmError::InvalidHeaderSize);
    }

    let mut song_length = read_u16(&mut cursor)?;
    if song_length as usize > ORDER_TABLE_LEN {
        warn!(song_length, "song length exceeds order table, clamping");
        song_length = ORDER_TABLE_LEN as u16;
    }

    let restart_position = read_u16(&mut cursor)?;

    let channels = read_u16(&mut cursor)?;
    if channels > MAX_CHANNELS as u16 {
        return Err(XmError::TooManyChannels(channels));
    }
    let num_channels = channels as u8;

    let header_patterns = read_u16(&mut cursor)?;

    let num_instruments = read_u16(&mut cursor)?;
    if num_instruments > MAX_INSTRUMENTS {
        return Err(XmError::TooManyInstruments(num_instruments));
    }

    let flags = read_u16(&mut cursor)?;
    let frequency_mode = if flags & 1 != 0 {
        FrequencyMode::Linear
    } else {
        FrequencyMode::Amiga
    };

    let default_speed = match read_u16(&mut cursor)? {
        0 => DEFAULT_SPEED,
        speed if speed > MAX_SPEED => {
            warn!(speed, "default speed out of range, clamping to {MAX_SPEED}");
            MAX_SPEED
        }
        speed => speed,
    };
    let default_bpm = match read_u16(&mut cursor)? {
        0 => DEFAULT_BPM,
        bpm => bpm,
    };

    let mut order_table = vec![0u8; ORDER_TABLE_LEN];
    cursor
        .read_exact(&mut order_table)
        .map_err(|_| XmError::UnexpectedEof)?;

    // The order table, not the header, decides how many patterns exist
    let num_patterns = order_table.iter().copied().max().unwrap_or(0) as u16 + 1;

    debug!(
        name = %name,
        version,
        num_channels,
        header_patterns,
        num_patterns,
        num_instruments,
        song_length,
        "parsed XM header"
    );

    cursor.set_position(HEADER_OFFSET + header_size as u64);

    let mut patterns = Vec::with_capacity(header_patterns.max(num_patterns) as usize);
    for pattern_idx in 0..header_patterns {
        let pattern = parse_pattern(&mut cursor, num_channels).map_err(|e| match e {
            XmError::UnexpectedEof => XmError::UnexpectedEof,
            _ => XmError::InvalidPattern(pattern_idx),
        })?;
        patterns.push(pattern);
    }
    if patterns.len() < num_patterns as usize {
        debug!(
            missing = num_patterns as usize - patterns.len(),
            "padding order table references with empty patterns"
        );
    }
    patterns.resize_with(num_patterns as usize, || {
        XmPattern::empty(DEFAULT_PATTERN_ROWS, num_channels)
    });

    let mut instruments = Vec::with_capacity(num_instruments as usize);
    for instr_idx in 0..num_instruments {
        let instrument = parse_instrument(&mut cursor).map_err(|e| match e {
            XmError::UnexpectedEof => XmError::UnexpectedEof,
            _ => XmError::InvalidInstrument(instr_idx),
        })?;
        instruments.push(instrument);
    }

    Ok(XmModule {
        name,
        tracker_name,
        version,
        num_channels,
        num_patterns,
        num_instruments,
        song_length,
        restart_position,
        default_speed,
        default_bpm,
        frequency_mode,
        order_table,
        patterns,
        instruments,
    })
}

/// Parse a single pattern block from the cursor
pub(crate) fn parse_pattern(
    cursor: &mut Cursor<&[u8]>,
    num_channels: u8,
) -> Result<XmPattern, XmError> {
    // Header length includes the 4-byte length field itself
    let header_start = cursor.position();
    let header_length = read_u32(cursor)?;

    let _packing_type = read_u8(cursor)?;

    let num_rows = match read_u16(cursor)? {
        0 => DEFAULT_PATTERN_ROWS,
        rows if rows > MAX_PATTERN_ROWS => return Err(XmError::InvalidPattern(rows)),
        rows => rows,
    };

    let packed_size = read_u16(cursor)?;

    cursor.set_position(header_start + header_length as u64);

    let packed = read_bytes(cursor, packed_size as usize)?;
    let cells = unpack_cells(packed, num_rows as usize * num_channels as usize);

    let notes = if num_channels == 0 {
        vec![Vec::new(); num_rows as usize]
    } else {
        cells
            .chunks(num_channels as usize)
            .map(|row| row.to_vec())
            .collect()
    };

    Ok(XmPattern { num_rows, notes })
}

/// Unpack `count` cells from packed pattern data
///
/// Cells not covered by the stream stay empty. Bytes beyond `count` cells are
/// ignored.
pub(crate) fn unpack_cells(packed: &[u8], count: usize) -> Vec<XmNote> {
    let mut cells = vec![XmNote::default(); count];
    let mut bytes = packed.iter().copied();

    for cell in cells.iter_mut() {
        let Some(raw) = unpack_note(&mut bytes) else {
            break;
        };
        *cell = raw;
    }

    cells
}

/// Unpack a single event and remap it to canonical form
///
/// An event is either a bitmask byte (high bit set, low 5 bits select the
/// fields that follow) or a plain 5-byte tuple.
pub(crate) fn unpack_note(bytes: &mut impl Iterator<Item = u8>) -> Option<XmNote> {
    let first_byte = bytes.next()?;

    let mut raw = [0u8; 5];
    if first_byte & 0x80 != 0 {
        for (bit, field) in raw.iter_mut().enumerate() {
            if first_byte & (1 << bit) != 0 {
                *field = bytes.next().unwrap_or(0);
            }
        }
    } else {
        raw[0] = first_byte;
        for field in raw.iter_mut().skip(1) {
            *field = bytes.next().unwrap_or(0);
        }
    }

    let [note, instrument, volume, effect, effect_param] = raw;
    Some(XmNote {
        note: remap_note(note),
        instrument,
        volume: remap_volume(volume),
        effect: remap_effect(effect, effect_param),
        effect_param,
    })
}

/// Raw note byte to canonical note
#[inline]
pub(crate) fn remap_note(raw: u8) -> u8 {
    match raw {
        0 => NO_NOTE,
        0x61.. => NOTE_OFF,
        n => n - 1,
    }
}

/// Raw volume column byte to canonical volume
///
/// 0x10-0x50 become 0-0x40, tone portamento 0xF0-0xFF moves down to
/// 0x50-0x5F, and anything below 0x10 means no volume.
#[inline]
pub(crate) fn remap_volume(raw: u8) -> u8 {
    match raw {
        0..0x10 => NO_VOLUME,
        0x10..=0x50 => raw - 0x10,
        0xF0.. => raw - 0xA0,
        _ => raw,
    }
}

/// Raw effect command to canonical command
#[inline]
pub(crate) fn remap_effect(raw: u8, param: u8) -> u8 {
    match (raw, param) {
        (0, 0) => NO_COMMAND,
        (cmd, _) if cmd > MAX_EFFECT => {
            warn!(command = cmd, "unknown effect command, ignoring");
            NO_COMMAND
        }
        (cmd, _) => cmd,
    }
}

/// Parse a single instrument and its samples from the cursor
pub(crate) fn parse_instrument(cursor: &mut Cursor<&[u8]>) -> Result<XmInstrument, XmError> {
    let header_start = cursor.position();
    let header_size = read_u32(cursor)?;

    if header_size < 29 {
        return Err(XmError::InvalidInstrument(header_size as u16));
    }

    let name = read_string(cursor, 22)?;
    let _instrument_type = read_u8(cursor)?;
    let num_samples = read_u16(cursor)?;

    if num_samples == 0 {
        cursor.set_position(header_start + header_size as u64);
        return Ok(XmInstrument {
            name,
            ..XmInstrument::default()
        });
    }

    let sample_header_size = read_u32(cursor)?;

    let mut sample_map = [0u8; KEYMAP_LEN];
    cursor
        .read_exact(&mut sample_map)
        .map_err(|_| XmError::UnexpectedEof)?;

    let vol_points = read_envelope_points(cursor)?;
    let pan_points = read_envelope_points(cursor)?;

    let num_vol_points = read_u8(cursor)?;
    let num_pan_points = read_u8(cursor)?;

    let vol_sustain = read_u8(cursor)?;
    let vol_loop_start = read_u8(cursor)?;
    let vol_loop_end = read_u8(cursor)?;

    let pan_sustain = read_u8(cursor)?;
    let pan_loop_start = read_u8(cursor)?;
    let pan_loop_end = read_u8(cursor)?;

    let vol_type = EnvelopeFlags::from_bits(read_u8(cursor)?);
    let pan_type = EnvelopeFlags::from_bits(read_u8(cursor)?);

    let vibrato_type = read_u8(cursor)?;
    let vibrato_sweep = read_u8(cursor)?;
    let vibrato_depth = read_u8(cursor)?;
    let vibrato_rate = read_u8(cursor)?;

    let volume_fadeout = read_u16(cursor)?;

    cursor.set_position(header_start + header_size as u64);

    let volume_envelope = XmEnvelope::from_points(
        EnvelopeKind::Volume,
        &vol_points,
        num_vol_points,
        vol_sustain,
        vol_loop_start,
        vol_loop_end,
        vol_type,
    );
    let panning_envelope = XmEnvelope::from_points(
        EnvelopeKind::Panning,
        &pan_points,
        num_pan_points,
        pan_sustain,
        pan_loop_start,
        pan_loop_end,
        pan_type,
    );

    let mut headers = Vec::with_capacity(num_samples as usize);
    for _ in 0..num_samples {
        let start = cursor.position();
        headers.push(parse_sample_header(cursor)?);
        cursor.set_position(start + sample_header_size.max(SAMPLE_HEADER_SIZE) as u64);
    }

    let mut samples = Vec::with_capacity(headers.len());
    for header in headers {
        samples.push(read_sample_data(cursor, header));
    }

    debug!(
        name = %name,
        num_samples,
        volume_envelope = volume_envelope.is_enabled(),
        panning_envelope = panning_envelope.is_enabled(),
        "parsed instrument"
    );

    Ok(XmInstrument {
        name,
        num_samples,
        sample_map,
        volume_envelope,
        panning_envelope,
        vibrato_type,
        vibrato_sweep,
        vibrato_depth,
        vibrato_rate,
        volume_fadeout,
        samples,
    })
}

/// Sample header fields, lengths still in bytes
struct SampleHeader {
    length: u32,
    loop_start: u32,
    loop_length: u32,
    volume: u8,
    fine_tune: i8,
    sample_type: u8,
    panning: u8,
    relative_note: i8,
    name: String,
}

fn parse_sample_header(cursor: &mut Cursor<&[u8]>) -> Result<SampleHeader, XmError> {
    let length = read_u32(cursor)?;
    let loop_start = read_u32(cursor)?;
    let loop_length = read_u32(cursor)?;
    let volume = read_u8(cursor)?;
    let fine_tune = read_u8(cursor)? as i8;
    let sample_type = read_u8(cursor)?;
    let panning = read_u8(cursor)?;
    let relative_note = read_u8(cursor)? as i8;
    let _reserved = read_u8(cursor)?;
    let name = read_string(cursor, 22)?;

    Ok(SampleHeader {
        length,
        loop_start,
        loop_length,
        volume,
        fine_tune,
        sample_type,
        panning,
        relative_note,
        name,
    })
}

/// Read and decode one sample payload; a truncated payload is zero-filled
fn read_sample_data(cursor: &mut Cursor<&[u8]>, header: SampleHeader) -> XmSample {
    let sixteen_bit = header.sample_type & 0x10 != 0;
    let bytes_per_frame = if sixteen_bit { 2 } else { 1 };

    let data = *cursor.get_ref();
    let start = (cursor.position() as usize).min(data.len());
    let wanted = header.length as usize;
    let available = wanted.min(data.len() - start);
    let raw = &data[start..start + available];
    cursor.set_position((start + wanted) as u64);

    let mut decoded = if sixteen_bit {
        decode_delta_16(raw)
    } else {
        decode_delta_8(raw)
    };
    let mut length = wanted / bytes_per_frame;
    if available < wanted {
        length = length.min(decoded.len() + MAX_SAMPLE_PADDING);
        warn!(
            sample = %header.name,
            expected = wanted,
            available,
            padded_frames = length,
            "sample data truncated, padding with silence"
        );
    }
    decoded.resize(length, 0.0);

    let mut loop_start = header.loop_start as usize / bytes_per_frame;
    let mut loop_length = header.loop_length as usize / bytes_per_frame;
    let mut loop_type = LoopType::from_type_bits(header.sample_type);

    if loop_type != LoopType::None {
        if loop_length == 0 || loop_start >= length {
            loop_type = LoopType::None;
            loop_start = 0;
            loop_length = 0;
        } else if loop_start + loop_length > length {
            warn!(sample = %header.name, "loop end past sample end, clamping");
            loop_length = length - loop_start;
        }
    }

    XmSample {
        name: header.name,
        length,
        loop_start,
        loop_length,
        loop_type,
        volume: header.volume.min(MAX_VOLUME),
        fine_tune: header.fine_tune,
        panning: header.panning,
        relative_note: header.relative_note,
        bits: if sixteen_bit { 16 } else { 8 },
        data: decoded,
    }
}

fn read_envelope_points(cursor: &mut Cursor<&[u8]>) -> Result<Vec<(u16, u16)>, XmError> {
    let mut points = Vec::with_capacity(MAX_ENVELOPE_POINTS);
    for _ in 0..MAX_ENVELOPE_POINTS {
        let x = read_u16(cursor)?;
        let y = read_u16(cursor)?;
        points.push((x, y));
    }
    Ok(points)
}

/// Get list of instrument names from an XM file
pub fn get_instrument_names(data: &[u8]) -> Result<Vec<String>, XmError> {
    let module = parse_xm(data)?;
    Ok(module.instruments.iter().map(|i| i.name.clone()).collect())
}

// =============================================================================
// Helper functions for reading data
// =============================================================================

pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, XmError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(buf[0])
}

pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, XmError> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, XmError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(u32::from_le_bytes(buf))
}

/// Borrow `len` bytes at the cursor and step past them
pub(crate) fn read_bytes<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], XmError> {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start.checked_add(len).ok_or(XmError::UnexpectedEof)?;
    let bytes = data.get(start..end).ok_or(XmError::UnexpectedEof)?;
    cursor.set_position(end as u64);
    Ok(bytes)
}

/// Read a fixed-width code page text field
pub(crate) fn read_string(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<String, XmError> {
    read_bytes(cursor, len).map(decode_dos_string)
}
