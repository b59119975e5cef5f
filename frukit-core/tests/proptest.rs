//! Property-based tests using proptest

use frukit_core::area::{build_board_area, parse_board_area, AreaKind, BoardInfo};
use frukit_core::constants::TypeLen;
use frukit_core::container::{build_container, info_area_slice, parse_container, AreaSet};
use frukit_core::field::{decode_field, detect_typelen, encode_field};
use frukit_core::multirecord::parse_multirecord_area;
use frukit_core::{EncodingConfig, FieldEncoding, TypedField};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_bcd_strings_round_trip(s in "[0-9.-]{2,126}") {
        let cfg = EncodingConfig::default();
        let encoded = encode_field(&TypedField::auto(&s), &cfg).unwrap();
        let tag = TypeLen::from_raw(encoded[0]);
        let decoded = decode_field(tag, &encoded[1..]).unwrap();

        prop_assert_eq!(decoded.encoding, FieldEncoding::BcdPlus);
        prop_assert_eq!(decoded.value, s);
    }

    #[test]
    fn prop_6bit_strings_round_trip_modulo_tail_spaces(s in "[A-Z0-9 !#$%+/=-]{2,84}") {
        let cfg = EncodingConfig::default();
        let encoded = encode_field(&TypedField::auto(&s), &cfg).unwrap();
        let tag = TypeLen::from_raw(encoded[0]);
        let decoded = decode_field(tag, &encoded[1..]).unwrap();

        prop_assert_eq!(decoded.value.as_str(), s.trim_end_matches(' '));
    }

    #[test]
    fn prop_text_strings_round_trip(s in "[a-zA-Z0-9 ~^_{}]{2,63}") {
        let cfg = EncodingConfig::default();
        let encoded = encode_field(&TypedField::auto(&s), &cfg).unwrap();
        let tag = TypeLen::from_raw(encoded[0]);
        let decoded = decode_field(tag, &encoded[1..]).unwrap();

        if decoded.encoding == FieldEncoding::Text {
            prop_assert_eq!(decoded.value, s);
        }
    }

    #[test]
    fn prop_detection_never_panics(s in "\\PC{0,200}") {
        // Arbitrary printable input either classifies or errors cleanly
        let _ = detect_typelen(&s, &EncodingConfig::default());
        let _ = detect_typelen(&s, &EncodingConfig { autodetect: false });
    }

    #[test]
    fn prop_inference_class_is_consistent(s in "[ -~]{2,63}") {
        let cfg = EncodingConfig::default();
        if let Ok(tag) = detect_typelen(&s, &cfg) {
            let bytes = s.as_bytes();
            match FieldEncoding::from(tag.kind()) {
                FieldEncoding::BcdPlus => prop_assert!(bytes
                    .iter()
                    .all(|b| b.is_ascii_digit() || matches!(b, b' ' | b'-' | b'.'))),
                FieldEncoding::SixBitAscii => {
                    prop_assert!(bytes.iter().all(|b| (0x20..=0x5F).contains(b)))
                }
                FieldEncoding::Text | FieldEncoding::Binary => {}
                FieldEncoding::Auto => prop_assert!(false, "decoder reported Auto"),
            }
        }
    }

    #[test]
    fn prop_container_parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        // Should never panic, even on random data
        let _ = parse_container(&data);
        for kind in [AreaKind::Chassis, AreaKind::Board, AreaKind::Product] {
            let _ = info_area_slice(&data, kind);
        }
        let _ = parse_board_area(&data);
        let _ = parse_multirecord_area(&data);
    }

    #[test]
    fn prop_board_area_round_trips(
        mfg in "[A-Z][A-Z0-9 ]{1,20}",
        serial in "[0-9]{2,12}",
        pn in "[A-Z0-9-]{2,12}",
        minutes in 1u32..0xFF_FFFF,
    ) {
        let cfg = EncodingConfig::default();
        let board = BoardInfo {
            date: frukit_core::area::MfgDate::Minutes(minutes),
            mfg: TypedField::auto(&mfg),
            pname: TypedField::auto("BOARD"),
            serial: TypedField::auto(&serial),
            pn: TypedField::auto(&pn),
            ..BoardInfo::default()
        };

        let area = build_board_area(&board, &cfg).unwrap();
        prop_assert_eq!(area.len() % 8, 0);

        let parsed = parse_board_area(&area).unwrap();
        prop_assert_eq!(parsed.date, board.date);
        prop_assert_eq!(parsed.mfg.value.as_str(), mfg.trim_end_matches(' '));
        prop_assert_eq!(parsed.serial.value, serial);
        prop_assert_eq!(parsed.pn.value, pn);
    }

    #[test]
    fn prop_single_bit_flip_is_detected(
        serial in "[0-9]{4,12}",
        bit in 0usize..8,
        seed in any::<u16>(),
    ) {
        let cfg = EncodingConfig::default();
        let board = BoardInfo {
            serial: TypedField::auto(&serial),
            ..BoardInfo::default()
        };
        let fru = build_container(&AreaSet {
            board: Some(build_board_area(&board, &cfg).unwrap()),
            ..AreaSet::default()
        }).unwrap();

        let mut bad = fru.to_vec();
        let pos = seed as usize % bad.len();
        bad[pos] ^= 1 << bit;

        // The header and the board area checksums cover the whole image, so
        // a flipped bit trips one of the validations; it can never come back
        // as a silently different serial.
        match info_area_slice(&bad, AreaKind::Board) {
            Ok(Some(slice)) => {
                let parsed = parse_board_area(slice);
                prop_assert!(parsed.is_err() || parsed.unwrap().serial.value == serial);
            }
            Ok(None) | Err(_) => {}
        }
    }
}
