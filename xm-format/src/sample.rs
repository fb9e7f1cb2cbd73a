//! Delta-encoded waveform decoding

/// Decode 8-bit delta data into `[-1, 1)`
///
/// Each byte is a signed difference from the previous value; the running sum
/// wraps at the signed 8-bit boundary.
pub fn decode_delta_8(raw: &[u8]) -> Vec<f32> {
    let mut acc: i8 = 0;
    raw.iter()
        .map(|&delta| {
            acc = acc.wrapping_add(delta as i8);
            acc as f32 / 128.0
        })
        .collect()
}

/// Decode 16-bit little-endian delta data into `[-1, 1)`
///
/// A trailing odd byte is ignored.
pub fn decode_delta_16(raw: &[u8]) -> Vec<f32> {
    let mut acc: i16 = 0;
    raw.chunks_exact(2)
        .map(|pair| {
            acc = acc.wrapping_add(i16::from_le_bytes([pair[0], pair[1]]));
            acc as f32 / 32768.0
        })
        .collect()
}
