//! Field codec: encoding detection and the four FRU field encodings
//!
//! A FRU field is a type/length tag byte followed by up to 63 payload bytes.
//! Encoding a string picks the most compact character set that still covers
//! every byte of the input: BCD-plus (two characters per byte), packed 6-bit
//! ASCII (four characters per three bytes), plain text, or raw binary.
//!
//! BCD-plus and 6-bit ASCII are lossy with respect to trailing spaces: a
//! string whose length is not a multiple of the packing group decodes with
//! its padding spaces stripped. This is a property of the format.

use crate::constants::{
    bcd_plus_len, six_bit_full_len, six_bit_len, FieldKind, TypeLen, EMPTY_FIELD, FIELD_MAX_LEN,
};
use crate::error::FruError;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Field encoding as requested by a caller or reported by the decoder
///
/// `Auto` is only meaningful on the encode side; the decoder always reports
/// the concrete encoding found in the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldEncoding {
    /// Detect the best-fit encoding from the content
    #[default]
    Auto,
    /// Raw binary, value carried as an uppercase hex string
    Binary,
    /// Force BCD-plus
    BcdPlus,
    /// Force packed 6-bit ASCII
    #[serde(rename = "6bitascii")]
    SixBitAscii,
    /// Force plain text
    Text,
}

impl From<FieldKind> for FieldEncoding {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Binary => FieldEncoding::Binary,
            FieldKind::BcdPlus => FieldEncoding::BcdPlus,
            FieldKind::SixBitAscii => FieldEncoding::SixBitAscii,
            FieldKind::Text => FieldEncoding::Text,
        }
    }
}

/// A field value together with its requested or detected encoding
///
/// Used both as input to the area builders and as output of the parsers.
/// Binary payloads travel as uppercase hex strings in `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    /// Requested encoding (encode side) or detected encoding (decode side)
    #[serde(default, rename = "type")]
    pub encoding: FieldEncoding,
    /// The field text, or hex digits for a binary field
    #[serde(rename = "data")]
    pub value: String,
}

impl TypedField {
    /// An auto-detected text field
    pub fn auto(value: impl Into<String>) -> Self {
        Self {
            encoding: FieldEncoding::Auto,
            value: value.into(),
        }
    }

    /// A field with an explicit encoding
    pub fn with_encoding(encoding: FieldEncoding, value: impl Into<String>) -> Self {
        Self {
            encoding,
            value: value.into(),
        }
    }

    /// A binary field from raw bytes (stored as uppercase hex)
    pub fn binary(data: &[u8]) -> Self {
        Self {
            encoding: FieldEncoding::Binary,
            value: hex::encode_upper(data),
        }
    }

    /// True when the field carries no data at all
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Default for TypedField {
    fn default() -> Self {
        Self::auto("")
    }
}

/// Field codec configuration
///
/// Threaded by value into every encode entry point; there is no process-wide
/// state, so concurrent and test use stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingConfig {
    /// Detect BCD-plus and 6-bit ASCII automatically; when false, content
    /// inference only distinguishes text from binary
    pub autodetect: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { autodetect: true }
    }
}

/// True for the characters the BCD-plus nibble set can represent
fn is_bcd_plus(b: u8) -> bool {
    b.is_ascii_digit() || b == b' ' || b == b'-' || b == b'.'
}

/// True for control bytes that force a field to binary
fn is_forcing_binary(b: u8) -> bool {
    b < 0x20 && b != b'\t' && b != b'\r' && b != b'\n'
}

/// Detect the best-fit encoding for a string and compute its tag byte
///
/// Starts from the most restrictive class (BCD-plus) and widens monotonically
/// as characters fall outside it: to 6-bit ASCII, to plain text, or straight
/// to binary on any control byte other than tab/CR/LF (which short-circuits
/// the scan). With autodetection disabled only the text/binary distinction is
/// made.
///
/// Returns the `EMPTY_FIELD` tag for an empty string. Fails with
/// [`FruError::TooLong`] when the encoded payload would exceed 63 bytes, and
/// with [`FruError::InvalidInput`] for a 1-character text field, whose tag
/// would collide with the reserved end-of-fields terminator.
pub fn detect_typelen(value: &str, config: &EncodingConfig) -> Result<TypeLen, FruError> {
    let data = value.as_bytes();
    if data.is_empty() {
        return Ok(TypeLen::from_raw(EMPTY_FIELD));
    }

    let mut kind = if config.autodetect {
        FieldKind::BcdPlus
    } else {
        FieldKind::Text
    };

    for &b in data {
        if is_forcing_binary(b) {
            // No use scanning further, binary is the widest class.
            kind = FieldKind::Binary;
            break;
        }

        if config.autodetect {
            if kind != FieldKind::Text && !(0x20..=0x5F).contains(&b) {
                // Outside the packed 6-bit range, widen to plain text.
                kind = FieldKind::Text;
                continue;
            }
            if kind == FieldKind::BcdPlus && !is_bcd_plus(b) {
                kind = FieldKind::SixBitAscii;
            }
        }
    }

    typelen_for(kind, data.len())
}

/// Compute the tag for a known kind and raw length, enforcing the limits
fn typelen_for(kind: FieldKind, raw_len: usize) -> Result<TypeLen, FruError> {
    let encoded_len = match kind {
        FieldKind::BcdPlus => bcd_plus_len(raw_len),
        FieldKind::SixBitAscii => six_bit_len(raw_len),
        FieldKind::Binary | FieldKind::Text => raw_len,
    };

    if encoded_len > FIELD_MAX_LEN {
        return Err(FruError::TooLong {
            len: encoded_len,
            max: FIELD_MAX_LEN,
        });
    }

    let tag = TypeLen::new(kind, encoded_len);
    if tag.is_terminator() {
        // A 1-byte text payload is unrepresentable: its tag is the reserved
        // end-of-fields marker.
        return Err(FruError::InvalidInput(
            "single-character text field collides with the terminator tag".to_string(),
        ));
    }

    Ok(tag)
}

/// Encode a field into its wire form: tag byte followed by the payload
///
/// `Auto` fields go through [`detect_typelen`]; explicit encodings bypass
/// inference but still validate that the content fits the requested character
/// set. An empty value encodes as the single `EMPTY_FIELD` tag byte.
pub fn encode_field(field: &TypedField, config: &EncodingConfig) -> Result<Bytes, FruError> {
    if field.encoding == FieldEncoding::Binary {
        let raw = hex::decode(&field.value)
            .map_err(|e| FruError::InvalidInput(format!("bad hex in binary field: {}", e)))?;
        if raw.is_empty() {
            return Ok(Bytes::from_static(&[EMPTY_FIELD]));
        }
        let tag = typelen_for(FieldKind::Binary, raw.len())?;
        let mut buf = BytesMut::with_capacity(tag.field_size());
        buf.put_u8(tag.raw());
        buf.put_slice(&raw);
        return Ok(buf.freeze());
    }

    let value = &field.value;
    if value.is_empty() {
        return Ok(Bytes::from_static(&[EMPTY_FIELD]));
    }

    let tag = match field.encoding {
        FieldEncoding::Auto => detect_typelen(value, config)?,
        FieldEncoding::BcdPlus => typelen_for(FieldKind::BcdPlus, value.len())?,
        FieldEncoding::SixBitAscii => typelen_for(FieldKind::SixBitAscii, value.len())?,
        FieldEncoding::Text => typelen_for(FieldKind::Text, value.len())?,
        FieldEncoding::Binary => unreachable!(),
    };

    let mut buf = BytesMut::with_capacity(tag.field_size());
    buf.put_u8(tag.raw());
    match tag.kind() {
        FieldKind::BcdPlus => buf.put_slice(&pack_bcd_plus(value.as_bytes())?),
        FieldKind::SixBitAscii => buf.put_slice(&pack_6bit(value.as_bytes())?),
        FieldKind::Text | FieldKind::Binary => buf.put_slice(value.as_bytes()),
    }

    debug_assert_eq!(buf.len(), tag.field_size());
    Ok(buf.freeze())
}

/// Decode a field payload according to its tag
///
/// `payload` must be exactly `tag.len()` bytes; the area walker guarantees
/// this. Binary fields decode to an uppercase hex dump (display form only,
/// not suitable for bit-exact re-encoding as text).
pub fn decode_field(tag: TypeLen, payload: &[u8]) -> Result<TypedField, FruError> {
    debug_assert_eq!(payload.len(), tag.len());

    let value = match tag.kind() {
        FieldKind::Binary => hex::encode_upper(payload),
        FieldKind::BcdPlus => unpack_bcd_plus(payload),
        FieldKind::SixBitAscii => unpack_6bit(payload),
        FieldKind::Text => String::from_utf8(payload.to_vec())
            .map_err(|e| FruError::DecodeError(format!("text field is not valid UTF-8: {}", e)))?,
    };

    Ok(TypedField {
        encoding: tag.kind().into(),
        value,
    })
}

/// Pack characters as BCD-plus, two per byte, high nibble first
///
/// Odd-length input is padded with an encoded space, which decode strips
/// again.
fn pack_bcd_plus(data: &[u8]) -> Result<Vec<u8>, FruError> {
    let out_len = bcd_plus_len(data.len());
    let mut out = Vec::with_capacity(out_len);

    let mut nibbles = [0u8; 2];
    for i in 0..out_len * 2 {
        nibbles[i % 2] = match data.get(i) {
            None | Some(b' ') => 0xA,
            Some(b'-') => 0xB,
            Some(b'.') => 0xC,
            Some(b) if b.is_ascii_digit() => b - b'0',
            Some(b) => {
                return Err(FruError::InvalidInput(format!(
                    "character {:?} is not BCD-plus encodable",
                    *b as char
                )))
            }
        };
        if i % 2 == 1 {
            out.push(nibbles[0] << 4 | nibbles[1]);
        }
    }

    Ok(out)
}

/// Unpack BCD-plus into its display string, trailing pad spaces stripped
fn unpack_bcd_plus(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len() * 2);
    for i in 0..payload.len() * 2 {
        let nibble = (payload[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0F;
        out.push(match nibble {
            0xA => ' ',
            0xB => '-',
            0xC => '.',
            0xD..=0xF => '?',
            d => (d + b'0') as char,
        });
    }
    cut_tail(&mut out);
    out
}

/// Pack characters as 6-bit ASCII: four characters into three bytes
///
/// Each character maps to `(byte - 0x20) & 0x3F`, so space packs to zero and
/// the representable range is 0x20-0x5F.
fn pack_6bit(data: &[u8]) -> Result<Vec<u8>, FruError> {
    for &b in data {
        if !(0x20..=0x5F).contains(&b) {
            return Err(FruError::InvalidInput(format!(
                "byte {:#04x} is outside the packed 6-bit ASCII range",
                b
            )));
        }
    }

    let len6 = six_bit_len(data.len());
    let mut out = alloc::vec![0u8; len6];
    let mut i6 = 0;

    for (i, &b) in data.iter().enumerate() {
        let c = (b - 0x20) & 0x3F;
        match i % 4 {
            0 => out[i6] = c,
            1 => {
                out[i6] |= (c & 0x03) << 6; // low 2 bits go high into byte 0
                i6 += 1;
                out[i6] = c >> 2; // high 4 bits go low into byte 1
            }
            2 => {
                out[i6] |= c << 4; // low 4 bits go high into byte 1
                i6 += 1;
                out[i6] = c >> 4; // high 2 bits go low into byte 2
            }
            _ => {
                out[i6] |= c << 2; // whole character goes high into byte 2
                i6 += 1;
            }
        }
    }

    Ok(out)
}

/// Unpack 6-bit ASCII into its display string, trailing spaces stripped
///
/// A source string whose length was not a multiple of 4 decodes with extra
/// trailing spaces, which are stripped here; round trips are best-effort with
/// respect to trailing whitespace.
fn unpack_6bit(payload: &[u8]) -> String {
    let len = six_bit_full_len(payload.len());
    let mut out = String::with_capacity(len);
    let mut i6 = 0;

    for i in 0..len {
        let c = match i % 4 {
            0 => payload[i6],
            1 => {
                let c = (payload[i6] >> 6) | (payload[i6 + 1] << 2);
                i6 += 1;
                c
            }
            2 => {
                let c = (payload[i6] >> 4) | (payload[i6 + 1] << 4);
                i6 += 1;
                c
            }
            _ => {
                let c = payload[i6] >> 2;
                i6 += 1;
                c
            }
        };
        out.push(((c & 0x3F) + 0x20) as char);
    }

    cut_tail(&mut out);
    out
}

/// Strip trailing spaces in place
fn cut_tail(s: &mut String) {
    while s.ends_with(' ') {
        s.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FIELD_TERMINATOR;

    fn detect(s: &str) -> TypeLen {
        detect_typelen(s, &EncodingConfig::default()).unwrap()
    }

    #[test]
    fn test_detect_bcd_plus() {
        let tag = detect("1234-56-7.89 01");
        assert_eq!(tag.kind(), FieldKind::BcdPlus);
        assert_eq!(tag.len(), 8);
    }

    #[test]
    fn test_detect_6bit() {
        let tag = detect("IPMI");
        assert_eq!(tag.kind(), FieldKind::SixBitAscii);
        assert_eq!(tag.len(), 3);

        let tag = detect("OK!");
        assert_eq!(tag.kind(), FieldKind::SixBitAscii);
    }

    #[test]
    fn test_detect_text() {
        let tag = detect("This is a simple text, with punctuation & other stuff");
        assert_eq!(tag.kind(), FieldKind::Text);
    }

    #[test]
    fn test_detect_binary_short_circuits() {
        let tag = detect("\x01 BINARY");
        assert_eq!(tag.kind(), FieldKind::Binary);
    }

    #[test]
    fn test_tab_cr_lf_widen_to_text_not_binary() {
        let tag = detect("AB\tCD");
        assert_eq!(tag.kind(), FieldKind::Text);
    }

    #[test]
    fn test_detect_without_autodetect() {
        let cfg = EncodingConfig { autodetect: false };
        let tag = detect_typelen("1234", &cfg).unwrap();
        assert_eq!(tag.kind(), FieldKind::Text);

        let tag = detect_typelen("12\x0134", &cfg).unwrap();
        assert_eq!(tag.kind(), FieldKind::Binary);
    }

    #[test]
    fn test_empty_field_tag() {
        assert_eq!(detect("").raw(), EMPTY_FIELD);
    }

    #[test]
    fn test_too_long_is_an_error_not_a_sentinel() {
        // 127 digits of BCD-plus encode to 64 bytes, one over the limit
        let long: String = core::iter::repeat('7').take(127).collect();
        let err = detect_typelen(&long, &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, FruError::TooLong { len: 64, max: 63 }));

        // 126 digits still fit
        let ok: String = core::iter::repeat('7').take(126).collect();
        assert_eq!(detect(&ok).len(), 63);
    }

    #[test]
    fn test_one_char_text_is_rejected() {
        let err = detect_typelen("a", &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, FruError::InvalidInput(_)));
        // An uppercase character fits 6-bit ASCII and is fine
        assert_eq!(detect("A").kind(), FieldKind::SixBitAscii);
    }

    #[test]
    fn test_bcd_round_trip() {
        let field = TypedField::auto("1234-56-7.89 01");
        let encoded = encode_field(&field, &EncodingConfig::default()).unwrap();
        let tag = TypeLen::from_raw(encoded[0]);
        let decoded = decode_field(tag, &encoded[1..]).unwrap();
        assert_eq!(decoded.value, "1234-56-7.89 01");
        assert_eq!(decoded.encoding, FieldEncoding::BcdPlus);
    }

    #[test]
    fn test_bcd_odd_length_pads_with_space() {
        let encoded = encode_field(&TypedField::auto("123"), &EncodingConfig::default()).unwrap();
        // '3' high nibble, space (0xA) low nibble
        assert_eq!(&encoded[..], &[0x42, 0x12, 0x3A]);
        let decoded = decode_field(TypeLen::from_raw(0x42), &encoded[1..]).unwrap();
        assert_eq!(decoded.value, "123");
    }

    #[test]
    fn test_bcd_reserved_nibbles_decode_to_question_marks() {
        let decoded = decode_field(TypeLen::new(FieldKind::BcdPlus, 1), &[0xDF]).unwrap();
        assert_eq!(decoded.value, "??");
    }

    #[test]
    fn test_6bit_round_trip() {
        for s in ["IPMI", "OK!", "HELLO WORLD!", "A-1", "6BIT TEST +/"] {
            let encoded = encode_field(&TypedField::auto(s), &EncodingConfig::default()).unwrap();
            let tag = TypeLen::from_raw(encoded[0]);
            if tag.kind() == FieldKind::SixBitAscii {
                let decoded = decode_field(tag, &encoded[1..]).unwrap();
                assert_eq!(decoded.value, s, "round trip failed for {:?}", s);
            }
        }
    }

    #[test]
    fn test_6bit_known_packing() {
        // "IPMI" = 0x49 0x50 0x4D 0x49 -> 6-bit 0x29 0x30 0x2D 0x29
        // packed: 0x29 | (0x30&3)<<6 = 0x29, 0x30>>2 = 0x0C | (0x2D<<4) = 0xDC,
        // 0x2D>>4 = 0x02 | 0x29<<2 = 0xA4 -> A6
        let encoded = encode_field(&TypedField::auto("IPMI"), &EncodingConfig::default()).unwrap();
        assert_eq!(encoded[0], 0x83);
        assert_eq!(&encoded[1..], &[0x29, 0xDC, 0xA6]);
    }

    #[test]
    fn test_6bit_space_padding_is_lossy() {
        // 5 characters encode into 4 bytes which decode back as 5 characters,
        // but a trailing space in the source is stripped on decode.
        let encoded =
            encode_field(&TypedField::auto("AB12 "), &EncodingConfig::default()).unwrap();
        let tag = TypeLen::from_raw(encoded[0]);
        let decoded = decode_field(tag, &encoded[1..]).unwrap();
        assert_eq!(decoded.value, "AB12");
    }

    #[test]
    fn test_binary_field_hex_round_trip() {
        let field = TypedField::binary(&[0x00, 0x12, 0xDE, 0xAD, 0xBE, 0xAF]);
        let encoded = encode_field(&field, &EncodingConfig::default()).unwrap();
        assert_eq!(encoded[0], 0x06);
        assert_eq!(&encoded[1..], &[0x00, 0x12, 0xDE, 0xAD, 0xBE, 0xAF]);

        let decoded = decode_field(TypeLen::from_raw(encoded[0]), &encoded[1..]).unwrap();
        assert_eq!(decoded.value, "0012DEADBEAF");
        assert_eq!(decoded.encoding, FieldEncoding::Binary);
    }

    #[test]
    fn test_explicit_encoding_override() {
        // Digits would auto-detect as BCD-plus; force plain text instead
        let field = TypedField::with_encoding(FieldEncoding::Text, "1234");
        let encoded = encode_field(&field, &EncodingConfig::default()).unwrap();
        assert_eq!(encoded[0], 0xC4);
        assert_eq!(&encoded[1..], b"1234");
    }

    #[test]
    fn test_explicit_bcd_rejects_foreign_characters() {
        let field = TypedField::with_encoding(FieldEncoding::BcdPlus, "12X4");
        let err = encode_field(&field, &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, FruError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_value_encodes_as_empty_tag() {
        let encoded = encode_field(&TypedField::auto(""), &EncodingConfig::default()).unwrap();
        assert_eq!(&encoded[..], &[EMPTY_FIELD]);
        assert_ne!(EMPTY_FIELD, FIELD_TERMINATOR);
    }
}
