//! MultiRecord area assembly and parsing
//!
//! A multirecord area is a chain of records, each a fixed 5-byte header
//! (type id, end-of-list flag and version, payload length, payload checksum,
//! header checksum) followed by the raw payload. The last record in the
//! chain carries the end-of-list bit.

use crate::checksum;
use crate::constants::{
    MR_END_OF_LIST, MR_HEADER_SIZE, MR_MGMT_ACCESS, MR_MGMT_SYS_UUID, MR_VERSION, MR_VERSION_MASK,
    UUID_SIZE,
};
use crate::error::FruError;
use alloc::string::ToString;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};

/// One multirecord: a type id plus its raw payload
///
/// For a Management Access record the first payload byte is the subtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrRecord {
    /// Record type id (Table 16-2)
    pub type_id: u8,
    /// Raw record payload
    pub payload: Vec<u8>,
}

impl MrRecord {
    /// Encoded size of this record including its header
    pub fn encoded_len(&self) -> usize {
        MR_HEADER_SIZE + self.payload.len()
    }
}

/// Build a Management Access / System UUID record from a UUID string
///
/// Accepts the 36-character dashed form or the 32-character plain form; any
/// other length or a non-hex character is rejected. The time-low, time-mid
/// and time-hi-and-version groups are stored little-endian per the SMBIOS
/// binary UUID convention, the remaining 8 bytes verbatim.
pub fn uuid_to_mgmt_record(uuid: &str) -> Result<MrRecord, FruError> {
    const DASHED_LEN: usize = UUID_SIZE * 2 + 4;
    const PLAIN_LEN: usize = UUID_SIZE * 2;

    if uuid.len() != DASHED_LEN && uuid.len() != PLAIN_LEN {
        return Err(FruError::InvalidInput(
            "UUID must be 32 hex digits, with or without the 4 dashes".to_string(),
        ));
    }

    let mut raw = [0u8; UUID_SIZE];
    let mut nibbles = 0usize;
    for ch in uuid.chars() {
        if ch == '-' {
            continue;
        }
        let val = ch
            .to_digit(16)
            .ok_or_else(|| FruError::InvalidInput("UUID contains a non-hex character".to_string()))?
            as u8;
        if nibbles >= UUID_SIZE * 2 {
            return Err(FruError::InvalidInput(
                "UUID contains more than 32 hex digits".to_string(),
            ));
        }
        if nibbles % 2 == 0 {
            raw[nibbles / 2] = val << 4;
        } else {
            raw[nibbles / 2] |= val;
        }
        nibbles += 1;
    }
    if nibbles != UUID_SIZE * 2 {
        return Err(FruError::InvalidInput(
            "UUID contains fewer than 32 hex digits".to_string(),
        ));
    }

    // Textual UUIDs are big-endian; SMBIOS stores the first three groups
    // little-endian.
    raw[0..4].reverse();
    raw[4..6].reverse();
    raw[6..8].reverse();

    let mut payload = Vec::with_capacity(1 + UUID_SIZE);
    payload.push(MR_MGMT_SYS_UUID);
    payload.extend_from_slice(&raw);

    Ok(MrRecord {
        type_id: MR_MGMT_ACCESS,
        payload,
    })
}

/// Assemble a multirecord area from a chain of records
///
/// Records are concatenated in order. The end-of-list flag on the final
/// record is set first and its header checksum computed second: the flag
/// byte is covered by the checksum, so the order of these two steps is a
/// hard invariant.
pub fn build_multirecord_area(records: &[MrRecord]) -> Result<Bytes, FruError> {
    if records.is_empty() {
        return Err(FruError::InvalidInput(
            "a multirecord area needs at least one record".to_string(),
        ));
    }

    let total: usize = records.iter().map(|r| r.encoded_len()).sum();
    let mut buf = BytesMut::with_capacity(total);

    for (i, record) in records.iter().enumerate() {
        if record.payload.len() > u8::MAX as usize {
            return Err(FruError::TooLong {
                len: record.payload.len(),
                max: u8::MAX as usize,
            });
        }

        let mut flags = MR_VERSION;
        if i == records.len() - 1 {
            flags |= MR_END_OF_LIST;
        }

        let header = [
            record.type_id,
            flags,
            record.payload.len() as u8,
            checksum::checksum(&record.payload),
        ];
        buf.put_slice(&header);
        buf.put_u8(checksum::checksum(&header));
        buf.put_slice(&record.payload);
    }

    debug_assert_eq!(buf.len(), total);
    Ok(buf.freeze())
}

/// Walk a multirecord area, validating both checksums of every record
///
/// Stops after the record carrying the end-of-list flag; trailing padding
/// beyond it is ignored.
pub fn parse_multirecord_area(buf: &[u8]) -> Result<Vec<MrRecord>, FruError> {
    let mut records = Vec::new();
    let mut pos = 0;

    loop {
        if pos + MR_HEADER_SIZE > buf.len() {
            return Err(FruError::Truncated {
                expected: pos + MR_HEADER_SIZE,
                actual: buf.len(),
            });
        }
        let header = &buf[pos..pos + MR_HEADER_SIZE];

        if header[1] & MR_VERSION_MASK != MR_VERSION {
            return Err(FruError::UnsupportedVersion(header[1]));
        }
        if !checksum::verify(header) {
            return Err(FruError::ChecksumMismatch {
                sum: checksum::residue(header),
            });
        }

        let len = header[2] as usize;
        let payload_start = pos + MR_HEADER_SIZE;
        if payload_start + len > buf.len() {
            return Err(FruError::Truncated {
                expected: payload_start + len,
                actual: buf.len(),
            });
        }
        let payload = &buf[payload_start..payload_start + len];
        if checksum::checksum(payload) != header[3] {
            return Err(FruError::ChecksumMismatch {
                sum: checksum::residue(payload).wrapping_add(header[3]),
            });
        }

        records.push(MrRecord {
            type_id: header[0],
            payload: payload.to_vec(),
        });

        if header[1] & MR_END_OF_LIST != 0 {
            break;
        }
        pos = payload_start + len;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "01234567-89AB-CDEF-0123-456789ABCDEF";

    #[test]
    fn test_uuid_byte_order() {
        let rec = uuid_to_mgmt_record(UUID).unwrap();
        assert_eq!(rec.type_id, MR_MGMT_ACCESS);
        assert_eq!(rec.payload.len(), 1 + UUID_SIZE);
        assert_eq!(rec.payload[0], MR_MGMT_SYS_UUID);
        // time-low is byte-reversed from the textual form
        assert_eq!(&rec.payload[1..5], &[0x67, 0x45, 0x23, 0x01]);
        // time-mid and time-hi-and-version likewise
        assert_eq!(&rec.payload[5..7], &[0xAB, 0x89]);
        assert_eq!(&rec.payload[7..9], &[0xEF, 0xCD]);
        // the clock-seq and node bytes stay verbatim
        assert_eq!(
            &rec.payload[9..17],
            &[0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF]
        );
    }

    #[test]
    fn test_uuid_without_dashes_accepted() {
        let dashed = uuid_to_mgmt_record(UUID).unwrap();
        let plain = uuid_to_mgmt_record("0123456789ABCDEF0123456789ABCDEF").unwrap();
        assert_eq!(dashed, plain);
    }

    #[test]
    fn test_uuid_lowercase_accepted() {
        let upper = uuid_to_mgmt_record(UUID).unwrap();
        let lower = uuid_to_mgmt_record(&UUID.to_lowercase()).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_uuid_bad_inputs_rejected() {
        for bad in [
            "",
            "0123",
            "0123456789ABCDEF0123456789ABCDE",    // 31 digits
            "0123456789ABCDEF0123456789ABCDEFF",  // 33 digits
            "01234567-89AB-CDEF-0123-456789ABCDEG", // non-hex
            "01234567-89AB-CDEF-0123-456789ABCDE-", // right length, extra dash
        ] {
            assert!(
                matches!(uuid_to_mgmt_record(bad), Err(FruError::InvalidInput(_))),
                "accepted bad uuid {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_single_record_area() {
        let rec = uuid_to_mgmt_record(UUID).unwrap();
        let area = build_multirecord_area(&[rec.clone()]).unwrap();

        assert_eq!(area.len(), MR_HEADER_SIZE + 17);
        assert_eq!(area[0], MR_MGMT_ACCESS);
        // Sole record is also the last one
        assert_eq!(area[1], MR_END_OF_LIST | MR_VERSION);
        assert_eq!(area[2], 17);
        // Header checksum covers the flag byte, so it verifies with the flag set
        assert!(checksum::verify(&area[..MR_HEADER_SIZE]));
        assert_eq!(checksum::checksum(&area[MR_HEADER_SIZE..]), area[3]);

        let parsed = parse_multirecord_area(&area).unwrap();
        assert_eq!(parsed, alloc::vec![rec]);
    }

    #[test]
    fn test_end_of_list_only_on_last_record() {
        let a = MrRecord {
            type_id: 0xC0,
            payload: alloc::vec![1, 2, 3],
        };
        let b = uuid_to_mgmt_record(UUID).unwrap();
        let area = build_multirecord_area(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(area[1], MR_VERSION);
        let second = a.encoded_len();
        assert_eq!(area[second + 1], MR_END_OF_LIST | MR_VERSION);

        let parsed = parse_multirecord_area(&area).unwrap();
        assert_eq!(parsed, alloc::vec![a, b]);
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(matches!(
            build_multirecord_area(&[]),
            Err(FruError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_corrupt_payload_detected() {
        let rec = uuid_to_mgmt_record(UUID).unwrap();
        let mut area = build_multirecord_area(&[rec]).unwrap().to_vec();
        *area.last_mut().unwrap() ^= 0xFF;
        assert!(matches!(
            parse_multirecord_area(&area),
            Err(FruError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupt_header_detected() {
        let rec = uuid_to_mgmt_record(UUID).unwrap();
        let mut area = build_multirecord_area(&[rec]).unwrap().to_vec();
        area[0] = 0xC1; // different type id breaks the header checksum
        assert!(matches!(
            parse_multirecord_area(&area),
            Err(FruError::ChecksumMismatch { .. })
        ));
    }
}
