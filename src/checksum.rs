//! Checksum calculation functions.

use crate::types::ChecksumEngine;

/// Words per block between modulo reductions.
///
/// 359 is the largest block for which the running sums cannot overflow a
/// u32 accumulator.
const BLOCK_WORDS: usize = 359;

/// Calculate the Fletcher-32 checksum of a byte span.
///
/// The span is read as little-endian 16-bit words; both running sums are
/// reduced modulo 65535 and combined as `(c1 << 16) | c0`. This matches
/// the sum the PSP loader computes over its directory spans, so embedding
/// the result at the directory checksum offset makes the image validate.
///
/// Directory spans are always even-sized; a trailing odd byte is treated
/// as the low byte of a zero-padded word.
pub fn fletcher32(data: &[u8]) -> u32 {
    let mut c0: u32 = 0;
    let mut c1: u32 = 0;
    let mut pending = 0usize;

    let mut words = data.chunks_exact(2);
    for pair in words.by_ref() {
        c0 += u16::from_le_bytes([pair[0], pair[1]]) as u32;
        c1 += c0;
        pending += 1;
        if pending == BLOCK_WORDS {
            c0 %= 65535;
            c1 %= 65535;
            pending = 0;
        }
    }
    if let [last] = words.remainder() {
        c0 += *last as u32;
        c1 += c0;
    }

    c0 %= 65535;
    c1 %= 65535;
    (c1 << 16) | c0
}

/// The directory checksum engine used by the PSP loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fletcher32;

impl ChecksumEngine for Fletcher32 {
    #[inline]
    fn checksum(&self, data: &[u8]) -> [u8; 4] {
        fletcher32(data).to_le_bytes()
    }
}
