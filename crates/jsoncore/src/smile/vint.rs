//! Variable-length integers, zig-zag mapping and 7-bit packing.
//!
//! A Smile var-int is big-endian: every byte but the last carries 7 bits
//! with the high bit clear, the last byte has the high bit set and carries
//! 6 bits. Payloads that must not contain bytes with the high bit set
//! (floats, big numbers, binary) are split into 7-bit groups.

use crate::error::SyntaxError;

pub(crate) fn write_vint(out: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    groups[n] = 0x80 | (value & 0x3F) as u8;
    n += 1;
    let mut rest = value >> 6;
    while rest != 0 {
        groups[n] = (rest & 0x7F) as u8;
        n += 1;
        rest >>= 7;
    }
    out.extend(groups[..n].iter().rev());
}

/// Accumulates one var-int byte. Returns `Some` with the value on the final
/// byte.
pub(crate) fn vint_step(acc: &mut u64, b: u8) -> Result<Option<u64>, SyntaxError> {
    if b & 0x80 == 0 {
        if *acc > (u64::MAX >> 7) {
            return Err(SyntaxError::VIntOverflow);
        }
        *acc = (*acc << 7) | u64::from(b);
        Ok(None)
    } else {
        if *acc > (u64::MAX >> 6) {
            return Err(SyntaxError::VIntOverflow);
        }
        Ok(Some((*acc << 6) | u64::from(b & 0x3F)))
    }
}

#[allow(clippy::cast_sign_loss)]
pub(crate) fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[allow(clippy::cast_possible_wrap)]
pub(crate) fn unzigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[allow(clippy::cast_sign_loss)]
pub(crate) fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[allow(clippy::cast_possible_wrap)]
pub(crate) fn unzigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

pub(crate) fn write_f32(out: &mut Vec<u8>, value: f32) {
    let bits = value.to_bits();
    for shift in [28, 21, 14, 7, 0] {
        out.push(((bits >> shift) & 0x7F) as u8);
    }
}

pub(crate) fn read_f32(groups: &[u8; 5]) -> f32 {
    let bits = groups
        .iter()
        .fold(0u32, |acc, &g| (acc << 7) | u32::from(g & 0x7F));
    f32::from_bits(bits)
}

pub(crate) fn write_f64(out: &mut Vec<u8>, value: f64) {
    let bits = value.to_bits();
    for shift in [63, 56, 49, 42, 35, 28, 21, 14, 7, 0] {
        out.push(((bits >> shift) & 0x7F) as u8);
    }
}

pub(crate) fn read_f64(groups: &[u8; 10]) -> f64 {
    let bits = groups
        .iter()
        .fold(0u64, |acc, &g| (acc << 7) | u64::from(g & 0x7F));
    f64::from_bits(bits)
}

/// Encoded size of `raw_len` bytes in 7-bit groups: 8 groups per full
/// 7-byte block, `n + 1` groups for a trailing block of `n` bytes.
pub(crate) fn encoded_7bit_len(raw_len: usize) -> Option<usize> {
    let rem = raw_len % 7;
    (raw_len / 7)
        .checked_mul(8)?
        .checked_add(if rem == 0 { 0 } else { rem + 1 })
}

pub(crate) fn encode_7bit(out: &mut Vec<u8>, data: &[u8]) {
    let mut blocks = data.chunks_exact(7);
    for block in &mut blocks {
        let bits = block
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        for i in (0..8).rev() {
            out.push(((bits >> (i * 7)) & 0x7F) as u8);
        }
    }
    let tail = blocks.remainder();
    if !tail.is_empty() {
        let bits = tail
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
        let mut remaining = tail.len() * 8;
        while remaining >= 7 {
            remaining -= 7;
            out.push(((bits >> remaining) & 0x7F) as u8);
        }
        out.push((bits & ((1 << remaining) - 1)) as u8);
    }
}

/// Reverses [`encode_7bit`]. `encoded` must hold exactly
/// `encoded_7bit_len(raw_len)` groups.
pub(crate) fn decode_7bit(
    out: &mut Vec<u8>,
    encoded: &[u8],
    raw_len: usize,
) -> Result<(), SyntaxError> {
    if let Some(&bad) = encoded.iter().find(|&&g| g & 0x80 != 0) {
        return Err(SyntaxError::UnexpectedByte(bad));
    }
    let full = raw_len / 7;
    let (head, tail) = encoded.split_at(full * 8);
    for block in head.chunks_exact(8) {
        let bits = block
            .iter()
            .fold(0u64, |acc, &g| (acc << 7) | u64::from(g));
        out.extend_from_slice(&bits.to_be_bytes()[1..]);
    }
    let rem = raw_len % 7;
    if rem > 0 {
        let (groups, last) = tail.split_at(rem);
        let mut bits = groups
            .iter()
            .fold(0u64, |acc, &g| (acc << 7) | u64::from(g));
        bits = (bits << rem) | u64::from(last[0]);
        out.extend_from_slice(&bits.to_be_bytes()[8 - rem..]);
    }
    Ok(())
}
