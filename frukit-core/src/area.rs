//! Information area assembly and parsing
//!
//! A FRU information area is a block-aligned buffer: version byte, size in
//! 8-byte blocks, a language or chassis-type byte, an optional 3-byte
//! manufacturing date (board only), the mandatory fields in specification
//! order, any custom fields, the end-of-fields terminator, zero padding and
//! a trailing checksum that closes the area to zero mod 256.
//!
//! The three header shapes differ only in length, so every header access
//! goes through explicit offsets keyed off [`AreaKind`] rather than a shared
//! layout.

use crate::checksum;
use crate::constants::{
    blocks, chassis_type_is_valid, TypeLen, BLOCK_SIZE, FIELD_TERMINATOR, FRU_EPOCH_UNIX,
    FRU_VERSION, LANG_ENGLISH, SMBIOS_CHASSIS_UNKNOWN,
};
use crate::error::FruError;
use crate::field::{decode_field, encode_field, EncodingConfig, FieldEncoding, TypedField};
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

/// The five FRU area types, in container enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    /// Internal use area, raw passthrough
    InternalUse,
    /// Chassis information area
    Chassis,
    /// Board information area (carries the manufacturing date)
    Board,
    /// Product information area
    Product,
    /// MultiRecord area
    MultiRecord,
}

impl AreaKind {
    /// Slot index in the container header, matching enumeration order
    pub const fn index(self) -> usize {
        match self {
            AreaKind::InternalUse => 0,
            AreaKind::Chassis => 1,
            AreaKind::Board => 2,
            AreaKind::Product => 3,
            AreaKind::MultiRecord => 4,
        }
    }

    /// True for areas with the version/blocks/langtype info header
    pub const fn is_info_area(self) -> bool {
        matches!(self, AreaKind::Chassis | AreaKind::Board | AreaKind::Product)
    }

    /// True for the one area kind whose header carries a manufacturing date
    pub const fn has_date(self) -> bool {
        matches!(self, AreaKind::Board)
    }

    /// Header size in bytes for this area kind
    pub const fn header_len(self) -> usize {
        match self {
            AreaKind::Board => 6, // version, blocks, language, 3-byte date
            AreaKind::Chassis | AreaKind::Product => 3,
            AreaKind::InternalUse => 1,
            AreaKind::MultiRecord => 0,
        }
    }
}

/// Board manufacturing date: minutes since 1996-01-01T00:00:00Z
///
/// Stored on the wire as a little-endian 3-byte value; zero is the reserved
/// "unspecified" sentinel, so a board stamped exactly at the epoch is not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MfgDate {
    /// No timestamp, encoded as all-zero
    #[default]
    Unspecified,
    /// Minutes elapsed since the FRU epoch (must fit in 24 bits)
    Minutes(u32),
}

impl MfgDate {
    /// Convert a Unix timestamp (seconds) into FRU minutes
    pub fn from_unix_seconds(secs: i64) -> Result<Self, FruError> {
        if secs < FRU_EPOCH_UNIX {
            return Err(FruError::InvalidInput(
                "manufacturing date predates the 1996-01-01 FRU epoch".to_string(),
            ));
        }
        let minutes = (secs - FRU_EPOCH_UNIX) / 60;
        if minutes > 0xFF_FFFF {
            return Err(FruError::InvalidInput(
                "manufacturing date does not fit in 24 bits of minutes".to_string(),
            ));
        }
        Ok(MfgDate::Minutes(minutes as u32))
    }

    /// Convert back to a Unix timestamp; `None` when unspecified
    pub fn to_unix_seconds(&self) -> Option<i64> {
        match self {
            MfgDate::Unspecified => None,
            MfgDate::Minutes(m) => Some(FRU_EPOCH_UNIX + *m as i64 * 60),
        }
    }

    /// Little-endian 3-byte wire form
    pub fn to_wire(&self) -> [u8; 3] {
        let m = match self {
            MfgDate::Unspecified => 0,
            MfgDate::Minutes(m) => *m,
        };
        [(m & 0xFF) as u8, (m >> 8 & 0xFF) as u8, (m >> 16 & 0xFF) as u8]
    }

    /// Parse the 3-byte wire form; all-zero means unspecified
    pub fn from_wire(wire: [u8; 3]) -> Self {
        let m = wire[0] as u32 | (wire[1] as u32) << 8 | (wire[2] as u32) << 16;
        if m == 0 {
            MfgDate::Unspecified
        } else {
            MfgDate::Minutes(m)
        }
    }
}

/// Exploded chassis information area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChassisInfo {
    /// SMBIOS chassis type byte
    pub chassis_type: u8,
    /// Chassis part number
    pub pn: TypedField,
    /// Chassis serial number
    pub serial: TypedField,
    /// Custom fields, order preserved
    pub custom: Vec<TypedField>,
}

impl Default for ChassisInfo {
    fn default() -> Self {
        Self {
            chassis_type: SMBIOS_CHASSIS_UNKNOWN,
            pn: TypedField::default(),
            serial: TypedField::default(),
            custom: Vec::new(),
        }
    }
}

/// Exploded board information area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInfo {
    /// Language code
    pub lang: u8,
    /// Manufacturing date
    pub date: MfgDate,
    /// Board manufacturer
    pub mfg: TypedField,
    /// Board product name
    pub pname: TypedField,
    /// Board serial number
    pub serial: TypedField,
    /// Board part number
    pub pn: TypedField,
    /// FRU file ID
    pub file: TypedField,
    /// Custom fields, order preserved
    pub custom: Vec<TypedField>,
}

impl Default for BoardInfo {
    fn default() -> Self {
        Self {
            lang: LANG_ENGLISH,
            date: MfgDate::Unspecified,
            mfg: TypedField::default(),
            pname: TypedField::default(),
            serial: TypedField::default(),
            pn: TypedField::default(),
            file: TypedField::default(),
            custom: Vec::new(),
        }
    }
}

/// Exploded product information area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    /// Language code
    pub lang: u8,
    /// Product manufacturer
    pub mfg: TypedField,
    /// Product name
    pub pname: TypedField,
    /// Product model / part number
    pub pn: TypedField,
    /// Product version
    pub ver: TypedField,
    /// Product serial number
    pub serial: TypedField,
    /// Asset tag
    pub atag: TypedField,
    /// FRU file ID
    pub file: TypedField,
    /// Custom fields, order preserved
    pub custom: Vec<TypedField>,
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self {
            lang: LANG_ENGLISH,
            mfg: TypedField::default(),
            pname: TypedField::default(),
            pn: TypedField::default(),
            ver: TypedField::default(),
            serial: TypedField::default(),
            atag: TypedField::default(),
            file: TypedField::default(),
            custom: Vec::new(),
        }
    }
}

/// Build a chassis information area
pub fn build_chassis_area(info: &ChassisInfo, config: &EncodingConfig) -> Result<Bytes, FruError> {
    if !chassis_type_is_valid(info.chassis_type) {
        return Err(FruError::InvalidInput(format!(
            "chassis type {:#04x} is outside the SMBIOS range",
            info.chassis_type
        )));
    }
    build_info_area(
        AreaKind::Chassis,
        info.chassis_type,
        None,
        &[&info.pn, &info.serial],
        &info.custom,
        config,
    )
}

/// Build a board information area
pub fn build_board_area(info: &BoardInfo, config: &EncodingConfig) -> Result<Bytes, FruError> {
    build_info_area(
        AreaKind::Board,
        info.lang,
        Some(info.date),
        &[&info.mfg, &info.pname, &info.serial, &info.pn, &info.file],
        &info.custom,
        config,
    )
}

/// Build a product information area
pub fn build_product_area(info: &ProductInfo, config: &EncodingConfig) -> Result<Bytes, FruError> {
    build_info_area(
        AreaKind::Product,
        info.lang,
        None,
        &[
            &info.mfg,
            &info.pname,
            &info.pn,
            &info.ver,
            &info.serial,
            &info.atag,
            &info.file,
        ],
        &info.custom,
        config,
    )
}

/// Assemble an information area from pre-typed fields
///
/// Mandatory fields come first in specification order, then the custom
/// fields in caller order, then the terminator, zero padding up to the block
/// boundary and the closing checksum byte. Fails without partial output if
/// any single field fails to encode.
fn build_info_area(
    kind: AreaKind,
    langtype: u8,
    date: Option<MfgDate>,
    mandatory: &[&TypedField],
    custom: &[TypedField],
    config: &EncodingConfig,
) -> Result<Bytes, FruError> {
    debug_assert!(kind.is_info_area());

    let mut encoded: Vec<Bytes> = Vec::with_capacity(mandatory.len() + custom.len());
    for field in mandatory {
        if field.encoding == FieldEncoding::Binary {
            // Only custom fields may carry binary data.
            return Err(FruError::UnsupportedFeature(
                "binary-typed mandatory fields are not supported".to_string(),
            ));
        }
        encoded.push(encode_field(field, config)?);
    }
    for field in custom {
        encoded.push(encode_field(field, config)?);
    }

    let header_len = kind.header_len();
    // Header, all fields, terminator byte and checksum byte
    let total = header_len + encoded.iter().map(|f| f.len()).sum::<usize>() + 2;
    let block_count = blocks(total);
    if block_count > u8::MAX as usize {
        return Err(FruError::InvalidStructure(format!(
            "area of {} bytes exceeds the 255-block limit",
            total
        )));
    }
    let size = block_count * BLOCK_SIZE;
    let padding = size - total;

    debug!(
        ?kind,
        total, block_count, padding, "assembling information area"
    );

    let mut buf = BytesMut::with_capacity(size);
    buf.put_u8(FRU_VERSION);
    buf.put_u8(block_count as u8);
    buf.put_u8(langtype);
    if let Some(date) = date {
        buf.put_slice(&date.to_wire());
    }
    debug_assert_eq!(buf.len(), header_len);

    for field in &encoded {
        buf.put_slice(field);
    }
    buf.put_u8(FIELD_TERMINATOR);
    buf.put_bytes(0, padding);
    buf.put_u8(checksum::checksum(&buf));

    debug_assert_eq!(buf.len(), size);
    debug_assert!(checksum::verify(&buf));
    Ok(buf.freeze())
}

/// Walk an information area's field stream
///
/// Validates the version byte and the declared size against the buffer, then
/// decodes fields until the terminator. The checksum is the container
/// lookup's responsibility (see [`crate::container::info_area_slice`]).
fn parse_info_area(
    buf: &[u8],
    kind: AreaKind,
    n_mandatory: usize,
) -> Result<(u8, MfgDate, Vec<TypedField>), FruError> {
    debug_assert!(kind.is_info_area());

    let header_len = kind.header_len();
    if buf.len() < header_len + 2 {
        return Err(FruError::Truncated {
            expected: header_len + 2,
            actual: buf.len(),
        });
    }
    if buf[0] != FRU_VERSION {
        return Err(FruError::UnsupportedVersion(buf[0]));
    }

    let declared = buf[1] as usize * BLOCK_SIZE;
    if declared < header_len + 2 || declared > buf.len() {
        return Err(FruError::Truncated {
            expected: declared,
            actual: buf.len(),
        });
    }

    let langtype = buf[2];
    let date = if kind.has_date() {
        MfgDate::from_wire([buf[3], buf[4], buf[5]])
    } else {
        MfgDate::Unspecified
    };

    // The last byte of the declared region is the checksum, not field data
    let end = declared - 1;
    let mut pos = header_len;
    let mut fields = Vec::new();
    loop {
        if pos >= end {
            return Err(FruError::TerminatorNotFound);
        }
        let tag = TypeLen::from_raw(buf[pos]);
        if tag.is_terminator() {
            break;
        }
        pos += 1;
        let n = tag.len();
        if pos + n > end {
            return Err(FruError::Truncated {
                expected: pos + n,
                actual: end,
            });
        }
        fields.push(decode_field(tag, &buf[pos..pos + n])?);
        pos += n;
    }

    if fields.len() < n_mandatory {
        return Err(FruError::InvalidStructure(format!(
            "area holds {} fields but {} are mandatory",
            fields.len(),
            n_mandatory
        )));
    }

    Ok((langtype, date, fields))
}

/// Parse a chassis information area back into its exploded form
pub fn parse_chassis_area(buf: &[u8]) -> Result<ChassisInfo, FruError> {
    let (chassis_type, _, mut fields) = parse_info_area(buf, AreaKind::Chassis, 2)?;
    let custom = fields.split_off(2);
    let mut it = fields.into_iter();
    Ok(ChassisInfo {
        chassis_type,
        pn: it.next().unwrap_or_default(),
        serial: it.next().unwrap_or_default(),
        custom,
    })
}

/// Parse a board information area back into its exploded form
pub fn parse_board_area(buf: &[u8]) -> Result<BoardInfo, FruError> {
    let (lang, date, mut fields) = parse_info_area(buf, AreaKind::Board, 5)?;
    let custom = fields.split_off(5);
    let mut it = fields.into_iter();
    Ok(BoardInfo {
        lang,
        date,
        mfg: it.next().unwrap_or_default(),
        pname: it.next().unwrap_or_default(),
        serial: it.next().unwrap_or_default(),
        pn: it.next().unwrap_or_default(),
        file: it.next().unwrap_or_default(),
        custom,
    })
}

/// Parse a product information area back into its exploded form
pub fn parse_product_area(buf: &[u8]) -> Result<ProductInfo, FruError> {
    let (lang, _, mut fields) = parse_info_area(buf, AreaKind::Product, 7)?;
    let custom = fields.split_off(7);
    let mut it = fields.into_iter();
    Ok(ProductInfo {
        lang,
        mfg: it.next().unwrap_or_default(),
        pname: it.next().unwrap_or_default(),
        pn: it.next().unwrap_or_default(),
        ver: it.next().unwrap_or_default(),
        serial: it.next().unwrap_or_default(),
        atag: it.next().unwrap_or_default(),
        file: it.next().unwrap_or_default(),
        custom,
    })
}
