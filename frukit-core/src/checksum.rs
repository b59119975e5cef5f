//! The IPMI 8-bit zero checksum
//!
//! Every checksummed FRU region carries a final byte chosen so that the sum
//! of all bytes in the region, checksum included, is zero mod 256.

/// Compute the checksum byte for a region (two's complement of the byte sum)
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum.wrapping_neg()
}

/// Residual byte sum of a region that includes its checksum byte
///
/// Zero means the region verifies.
pub fn residue(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Verify a region that includes its checksum byte
pub fn verify(data: &[u8]) -> bool {
    residue(data) == 0
}
