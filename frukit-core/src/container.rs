//! Top-level FRU container assembly and parsing
//!
//! The container is an 8-byte header (version, five per-area offsets in
//! 8-byte blocks, a pad byte and a checksum) followed by the areas laid out
//! back to back at their declared offsets, in area enumeration order.

use crate::area::AreaKind;
use crate::checksum;
use crate::constants::{blocks, BLOCK_SIZE, CONTAINER_HEADER_SIZE, FRU_VERSION};
use crate::error::FruError;
use alloc::format;
use alloc::string::ToString;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

/// The five area slots of a FRU container, each optional
///
/// Slot/type agreement is by construction: each field holds only its own
/// area kind's bytes. Internal-use and multirecord payloads may have any
/// length and are zero-padded to the block boundary during assembly; info
/// areas are block-sized already.
#[derive(Debug, Clone, Default)]
pub struct AreaSet {
    /// Internal use area, raw bytes passed through untouched
    pub internal: Option<Bytes>,
    /// Chassis information area
    pub chassis: Option<Bytes>,
    /// Board information area
    pub board: Option<Bytes>,
    /// Product information area
    pub product: Option<Bytes>,
    /// MultiRecord area
    pub multirecord: Option<Bytes>,
}

impl AreaSet {
    fn slots(&self) -> [(AreaKind, Option<&Bytes>); 5] {
        [
            (AreaKind::InternalUse, self.internal.as_ref()),
            (AreaKind::Chassis, self.chassis.as_ref()),
            (AreaKind::Board, self.board.as_ref()),
            (AreaKind::Product, self.product.as_ref()),
            (AreaKind::MultiRecord, self.multirecord.as_ref()),
        ]
    }
}

/// Decoded container header: per-area offsets in 8-byte blocks, 0 = absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FruHeader {
    /// Internal use area offset
    pub internal: u8,
    /// Chassis information area offset
    pub chassis: u8,
    /// Board information area offset
    pub board: u8,
    /// Product information area offset
    pub product: u8,
    /// MultiRecord area offset
    pub multirecord: u8,
}

impl FruHeader {
    /// The offset byte for an area kind
    pub const fn offset_of(&self, kind: AreaKind) -> u8 {
        match kind {
            AreaKind::InternalUse => self.internal,
            AreaKind::Chassis => self.chassis,
            AreaKind::Board => self.board,
            AreaKind::Product => self.product,
            AreaKind::MultiRecord => self.multirecord,
        }
    }

    fn offsets(&self) -> [u8; 5] {
        [
            self.internal,
            self.chassis,
            self.board,
            self.product,
            self.multirecord,
        ]
    }
}

/// Assemble a complete FRU image from up to five areas
///
/// Present areas are placed back to back after the one-block header, in
/// enumeration order; absent slots get offset zero. The header checksum is
/// written last, over all eight header bytes.
pub fn build_container(areas: &AreaSet) -> Result<Bytes, FruError> {
    let mut offsets = [0u8; 5];
    let mut total_blocks = blocks(CONTAINER_HEADER_SIZE); // the header itself

    for (kind, data) in areas.slots() {
        let data = match data {
            Some(d) if !d.is_empty() => d,
            _ => continue, // absent or zero-sized: offset stays 0
        };

        if kind.is_info_area() && data.len() % BLOCK_SIZE != 0 {
            return Err(FruError::InvalidStructure(format!(
                "{:?} area of {} bytes is not block-aligned",
                kind,
                data.len()
            )));
        }

        let area_blocks = blocks(data.len());
        if total_blocks + area_blocks > u8::MAX as usize + 1 {
            return Err(FruError::InvalidStructure(
                "container exceeds the 255-block offset range".to_string(),
            ));
        }
        offsets[kind.index()] = total_blocks as u8;
        total_blocks += area_blocks;
    }

    debug!(total_blocks, ?offsets, "assembling FRU container");

    let mut buf = BytesMut::with_capacity(total_blocks * BLOCK_SIZE);
    buf.put_u8(FRU_VERSION);
    buf.put_slice(&offsets);
    buf.put_u8(0); // pad
    buf.put_u8(checksum::checksum(&buf));
    debug_assert!(checksum::verify(&buf[..CONTAINER_HEADER_SIZE]));

    for (_, data) in areas.slots() {
        if let Some(data) = data {
            if data.is_empty() {
                continue;
            }
            buf.put_slice(data);
            // Zero-fill up to the block boundary (internal use / multirecord)
            let tail = data.len() % BLOCK_SIZE;
            if tail != 0 {
                buf.put_bytes(0, BLOCK_SIZE - tail);
            }
        }
    }

    debug_assert_eq!(buf.len(), total_blocks * BLOCK_SIZE);
    Ok(buf.freeze())
}

/// Validate a container header and expose the area offsets
///
/// Version nibble, reserved nibble, pad byte and header checksum are all
/// checked before any offset is returned.
pub fn parse_container(buf: &[u8]) -> Result<FruHeader, FruError> {
    if buf.len() < CONTAINER_HEADER_SIZE {
        return Err(FruError::Truncated {
            expected: CONTAINER_HEADER_SIZE,
            actual: buf.len(),
        });
    }
    if buf[0] != FRU_VERSION {
        return Err(FruError::UnsupportedVersion(buf[0]));
    }
    if buf[6] != 0 {
        return Err(FruError::InvalidStructure(
            "container header pad byte is not zero".to_string(),
        ));
    }
    if !checksum::verify(&buf[..CONTAINER_HEADER_SIZE]) {
        return Err(FruError::ChecksumMismatch {
            sum: checksum::residue(&buf[..CONTAINER_HEADER_SIZE]),
        });
    }

    Ok(FruHeader {
        internal: buf[1],
        chassis: buf[2],
        board: buf[3],
        product: buf[4],
        multirecord: buf[5],
    })
}

/// Locate and validate an information area inside a container
///
/// Returns `None` when the area is absent. The area's version byte, declared
/// size and checksum are all verified against the surrounding buffer before
/// the sub-slice is handed out.
pub fn info_area_slice<'a>(buf: &'a [u8], kind: AreaKind) -> Result<Option<&'a [u8]>, FruError> {
    if !kind.is_info_area() {
        return Err(FruError::InvalidInput(format!(
            "{:?} is not an information area",
            kind
        )));
    }

    let header = parse_container(buf)?;
    let offset = header.offset_of(kind);
    if offset == 0 {
        return Ok(None);
    }

    let start = offset as usize * BLOCK_SIZE;
    if start + 2 > buf.len() {
        return Err(FruError::Truncated {
            expected: start + 2,
            actual: buf.len(),
        });
    }

    let area = &buf[start..];
    if area[0] != FRU_VERSION {
        return Err(FruError::UnsupportedVersion(area[0]));
    }
    let declared = area[1] as usize * BLOCK_SIZE;
    if declared == 0 || start + declared > buf.len() {
        return Err(FruError::Truncated {
            expected: start + declared,
            actual: buf.len(),
        });
    }

    let area = &area[..declared];
    if !checksum::verify(area) {
        return Err(FruError::ChecksumMismatch {
            sum: checksum::residue(area),
        });
    }

    Ok(Some(area))
}

/// Locate an internal-use or multirecord region inside a container
///
/// These areas carry no size in a common header, so the extent runs from the
/// declared offset up to the next present area or the end of the buffer. The
/// bytes are returned as-is; multirecord callers walk the chain themselves.
pub fn raw_area_slice<'a>(buf: &'a [u8], kind: AreaKind) -> Result<Option<&'a [u8]>, FruError> {
    if kind.is_info_area() {
        return Err(FruError::InvalidInput(format!(
            "{:?} is an information area, use info_area_slice",
            kind
        )));
    }

    let header = parse_container(buf)?;
    let offset = header.offset_of(kind);
    if offset == 0 {
        return Ok(None);
    }

    let start = offset as usize * BLOCK_SIZE;
    if start >= buf.len() {
        return Err(FruError::Truncated {
            expected: start,
            actual: buf.len(),
        });
    }

    // The next present area's offset bounds this one
    let end = header
        .offsets()
        .iter()
        .filter(|&&o| o > offset)
        .map(|&o| o as usize * BLOCK_SIZE)
        .min()
        .unwrap_or(buf.len());
    if end > buf.len() {
        return Err(FruError::Truncated {
            expected: end,
            actual: buf.len(),
        });
    }

    Ok(Some(&buf[start..end]))
}
