//! Error types for FRU operations

use alloc::string::String;

/// Errors that can occur while encoding or decoding FRU data
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FruError {
    /// Malformed caller input (bad UUID string, invalid chassis type, ...)
    #[cfg_attr(feature = "std", error("Invalid input: {0}"))]
    InvalidInput(String),

    /// Encoded field payload exceeds the 63-byte tag limit
    #[cfg_attr(feature = "std", error("Encoded payload of {len} bytes exceeds maximum {max}"))]
    TooLong {
        /// Payload length the encoding would have produced.
        len: usize,
        /// The format limit (63 bytes).
        max: usize,
    },

    /// Version nibble or reserved bits do not match the supported format
    #[cfg_attr(feature = "std", error("Unsupported format version byte: {0:#04x}"))]
    UnsupportedVersion(u8),

    /// A declared size exceeds the bytes actually available
    #[cfg_attr(feature = "std", error("Truncated region: expected {expected} bytes, got {actual}"))]
    Truncated {
        /// The number of bytes the structure declares.
        expected: usize,
        /// The number of bytes actually present.
        actual: usize,
    },

    /// A checksummed region does not sum to zero
    #[cfg_attr(feature = "std", error("Checksum mismatch: region sums to {sum:#04x}, expected zero"))]
    ChecksumMismatch {
        /// The residual byte sum of the region (mod 256).
        sum: u8,
    },

    /// The field stream ended without an end-of-fields terminator
    #[cfg_attr(feature = "std", error("End-of-fields terminator not found within the declared area size"))]
    TerminatorNotFound,

    /// Structurally invalid data (bad offsets, bad padding, missing fields)
    #[cfg_attr(feature = "std", error("Invalid structure: {0}"))]
    InvalidStructure(String),

    /// A field payload could not be decoded back to a string
    #[cfg_attr(feature = "std", error("Field decode error: {0}"))]
    DecodeError(String),

    /// Valid per the format but not supported by this implementation
    #[cfg_attr(feature = "std", error("Unsupported feature: {0}"))]
    UnsupportedFeature(String),
}
