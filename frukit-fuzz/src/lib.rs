//! Fuzzing placeholder for the frukit-core parsers
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_container

pub fn fuzz_container(data: &[u8]) {
    use frukit_core::area::AreaKind;
    use frukit_core::container::{info_area_slice, parse_container, raw_area_slice};

    // Try to parse - should never panic
    let _ = parse_container(data);
    for kind in [AreaKind::Chassis, AreaKind::Board, AreaKind::Product] {
        let _ = info_area_slice(data, kind);
    }
    for kind in [AreaKind::InternalUse, AreaKind::MultiRecord] {
        let _ = raw_area_slice(data, kind);
    }
}

pub fn fuzz_area(data: &[u8]) {
    use frukit_core::area::{parse_board_area, parse_chassis_area, parse_product_area};

    // Area walkers over arbitrary bytes - should never panic
    let _ = parse_chassis_area(data);
    let _ = parse_board_area(data);
    let _ = parse_product_area(data);
}

pub fn fuzz_multirecord(data: &[u8]) {
    use frukit_core::multirecord::parse_multirecord_area;

    let _ = parse_multirecord_area(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_container_empty() {
        fuzz_container(&[]);
    }

    #[test]
    fn test_fuzz_container_random() {
        fuzz_container(&[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_fuzz_area_empty() {
        fuzz_area(&[]);
    }

    #[test]
    fn test_fuzz_area_random() {
        fuzz_area(&[0xFF; 1024]);
    }

    #[test]
    fn test_fuzz_multirecord_random() {
        fuzz_multirecord(&[0x01; 64]);
    }
}
