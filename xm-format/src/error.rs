//! XM parsing error types

/// Reasons an XM file is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmError {
    /// File too small to contain the fixed preamble and header
    #[error("file too small to be an XM module")]
    TooSmall,
    /// Signature is not "Extended Module: "
    #[error("invalid XM signature")]
    InvalidMagic,
    /// Byte at 0x25 is not 0x1A
    #[error("invalid XM marker byte {0:#04x}")]
    InvalidMarker(u8),
    /// Tracker version below the supported minimum
    #[error("unsupported XM version {0:#06x}")]
    UnsupportedVersion(u16),
    /// Header length field too small to hold the order table
    #[error("invalid XM header size")]
    InvalidHeaderSize,
    /// Too many channels (> 32)
    #[error("too many channels: {0}")]
    TooManyChannels(u16),
    /// Too many instruments (> 128)
    #[error("too many instruments: {0}")]
    TooManyInstruments(u16),
    /// Pattern block header is malformed
    #[error("invalid pattern {0}")]
    InvalidPattern(u16),
    /// Instrument block header is malformed
    #[error("invalid instrument {0}")]
    InvalidInstrument(u16),
    /// Data ended in the middle of a structure
    #[error("unexpected end of file")]
    UnexpectedEof,
}
