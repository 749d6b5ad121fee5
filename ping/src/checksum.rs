//! Internet Checksum (RFC 1071)
//!
//! Words are taken in network byte order. A trailing odd byte is the high
//! half of a zero-padded word.

/// Add `data` to a running one's complement accumulator.
///
/// Pieces summed one after another must each start on an even offset of the
/// full image, so every piece except the last has to be even-length.
pub fn partial_checksum(data: &[u8], initial: u32) -> u32 {
    let mut sum = initial;
    let mut words = data.chunks_exact(2);

    for word in &mut words {
        sum = sum.wrapping_add(u16::from_be_bytes([word[0], word[1]]) as u32);
    }

    if let [last] = words.remainder() {
        sum = sum.wrapping_add((*last as u32) << 8);
    }

    sum
}

/// Fold carries back into the low 16 bits and complement.
pub fn finalize_checksum(sum: u32) -> u16 {
    let mut s = sum;
    while s >> 16 != 0 {
        s = (s & 0xFFFF) + (s >> 16);
    }
    !(s as u16)
}

/// Checksum of a contiguous image whose checksum field is zero.
pub fn calculate_checksum(data: &[u8]) -> u16 {
    finalize_checksum(partial_checksum(data, 0))
}

/// True when `data`, checksum field included, sums to all ones.
pub fn verify_checksum(data: &[u8]) -> bool {
    calculate_checksum(data) == 0
}
