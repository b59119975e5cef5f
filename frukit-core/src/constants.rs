//! Constants and limits for the IPMI FRU Information Storage format

/// FRU Information Storage format version (low nibble of every version byte)
pub const FRU_VERSION: u8 = 1;

/// Alignment unit for all area sizes and offsets
pub const BLOCK_SIZE: usize = 8;

/// Maximum encoded payload of a single field (6 length bits in the tag byte)
pub const FIELD_MAX_LEN: usize = 63;

/// Tag byte of an empty field (type = text, length = 0)
pub const EMPTY_FIELD: u8 = 0xC0;

/// End-of-fields terminator tag byte (type = text, length = 1, reserved)
pub const FIELD_TERMINATOR: u8 = 0xC1;

/// Language code "default" (English, 7-bit ASCII + Latin-1)
pub const LANG_DEFAULT: u8 = 0;

/// Language code for English
pub const LANG_ENGLISH: u8 = 25;

/// FRU date/time base, 1996-01-01T00:00:00Z, as seconds since the Unix epoch
///
/// Per the FRU specification a manufacturing date/time of zero designates
/// "unspecified", see [`crate::area::MfgDate`].
pub const FRU_EPOCH_UNIX: i64 = 820_454_400;

/// Size of the top-level FRU container header in bytes (exactly one block)
pub const CONTAINER_HEADER_SIZE: usize = 8;

/// Size of a multirecord record header in bytes
pub const MR_HEADER_SIZE: usize = 5;

/// MultiRecord type id for a Management Access record (Table 16-2)
pub const MR_MGMT_ACCESS: u8 = 0x03;

/// Management Access record subtype for a System UUID (Table 18-6)
pub const MR_MGMT_SYS_UUID: u8 = 0x07;

/// MultiRecord format version, stored in the low 3 bits of the flags byte
pub const MR_VERSION: u8 = 0x02;

/// Mask extracting the record version from the flags byte
pub const MR_VERSION_MASK: u8 = 0x07;

/// End-of-list flag in a multirecord header's flags byte
pub const MR_END_OF_LIST: u8 = 0x80;

/// Size of a binary UUID
pub const UUID_SIZE: usize = 16;

/// Lowest valid SMBIOS chassis type ("Other")
pub const SMBIOS_CHASSIS_MIN: u8 = 0x01;

/// Highest chassis type defined by SMBIOS 3.2 ("Stick PC")
pub const SMBIOS_CHASSIS_MAX: u8 = 0x24;

/// The default chassis type ("Unknown")
pub const SMBIOS_CHASSIS_UNKNOWN: u8 = 0x02;

/// Check that a chassis type byte is within the SMBIOS enumeration range
pub const fn chassis_type_is_valid(chassis_type: u8) -> bool {
    chassis_type >= SMBIOS_CHASSIS_MIN && chassis_type <= SMBIOS_CHASSIS_MAX
}

/// Number of 8-byte blocks needed to hold `bytes` bytes, rounding up
pub const fn blocks(bytes: usize) -> usize {
    (bytes + BLOCK_SIZE - 1) / BLOCK_SIZE
}

/// Number of bytes in `blocks` 8-byte blocks
pub const fn block_bytes(blocks: usize) -> usize {
    blocks * BLOCK_SIZE
}

/// Encoded length of `len` characters packed as 6-bit ASCII
pub const fn six_bit_len(len: usize) -> usize {
    (len * 3 + 3) / 4
}

/// Number of characters recovered from `len6` bytes of packed 6-bit ASCII
pub const fn six_bit_full_len(len6: usize) -> usize {
    len6 * 4 / 3
}

/// Encoded length of `len` characters packed as BCD-plus
pub const fn bcd_plus_len(len: usize) -> usize {
    (len + 1) / 2
}

/// Character-set class stored in the two type bits of a field tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldKind {
    /// Raw binary or OEM-defined data
    Binary = 0b00,
    /// Packed decimal digits plus space, dash and dot
    BcdPlus = 0b01,
    /// Packed 6-bit ASCII, space-based offset
    SixBitAscii = 0b10,
    /// Plain 8-bit text in the area's language
    Text = 0b11,
}

impl FieldKind {
    /// Decode the two type bits (values 0-3)
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => FieldKind::Binary,
            0b01 => FieldKind::BcdPlus,
            0b10 => FieldKind::SixBitAscii,
            _ => FieldKind::Text,
        }
    }
}

/// A field's type/length tag byte: 2 bits of type, 6 bits of payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLen(u8);

impl TypeLen {
    /// Build a tag from a field kind and payload length (truncated to 6 bits)
    pub const fn new(kind: FieldKind, len: usize) -> Self {
        Self(((kind as u8) << 6) | (len as u8 & 0x3F))
    }

    /// Reinterpret a raw tag byte
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Get the raw tag byte
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// The field's character-set class
    pub const fn kind(&self) -> FieldKind {
        FieldKind::from_bits(self.0 >> 6)
    }

    /// Payload length in bytes (0-63)
    pub const fn len(&self) -> usize {
        (self.0 & 0x3F) as usize
    }

    /// True for the zero-length tag (checks the length bits only)
    pub const fn is_empty(&self) -> bool {
        self.0 & 0x3F == 0
    }

    /// Total encoded field size: tag byte plus payload
    pub const fn field_size(&self) -> usize {
        1 + self.len()
    }

    /// True for the reserved end-of-fields terminator tag
    pub const fn is_terminator(&self) -> bool {
        self.0 == FIELD_TERMINATOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bit_layout() {
        assert_eq!(TypeLen::new(FieldKind::Text, 0).raw(), EMPTY_FIELD);
        assert_eq!(TypeLen::new(FieldKind::Text, 1).raw(), FIELD_TERMINATOR);
        assert_eq!(TypeLen::new(FieldKind::Binary, 18).raw(), 0x12);
        assert_eq!(TypeLen::new(FieldKind::BcdPlus, 8).raw(), 0x48);
        assert_eq!(TypeLen::new(FieldKind::SixBitAscii, 3).raw(), 0x83);
    }

    #[test]
    fn test_field_size_arithmetic() {
        for len in 0..=FIELD_MAX_LEN {
            let tag = TypeLen::new(FieldKind::Binary, len);
            assert_eq!(tag.len(), len);
            assert_eq!(tag.field_size(), len + 1);
        }
    }

    #[test]
    fn test_block_rounding() {
        assert_eq!(blocks(0), 0);
        assert_eq!(blocks(1), 1);
        assert_eq!(blocks(8), 1);
        assert_eq!(blocks(9), 2);
        assert_eq!(block_bytes(3), 24);
    }

    #[test]
    fn test_packed_lengths() {
        assert_eq!(six_bit_len(4), 3);
        assert_eq!(six_bit_len(5), 4);
        assert_eq!(six_bit_full_len(3), 4);
        assert_eq!(bcd_plus_len(3), 2);
        assert_eq!(bcd_plus_len(4), 2);
    }
}
