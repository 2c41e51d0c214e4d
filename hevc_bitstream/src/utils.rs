use crate::error::{HeaderError, Result};

/// Unescapes a NAL unit payload: drops every `0x03` that follows `00 00`.
/// Allocates a new Vec.
pub fn clear_start_code_emulation_prevention_3_byte(data: &[u8]) -> Vec<u8> {
    let mut unescaped = Vec::with_capacity(data.len());
    let mut zeros = 0;

    for &byte in data {
        if zeros >= 2 && byte == 3 {
            zeros = 0;
            continue;
        }

        zeros = if byte == 0 { zeros + 1 } else { 0 };
        unescaped.push(byte);
    }

    unescaped
}

/// Escapes the vec to annexb to avoid emulating a start code by accident
pub fn add_start_code_emulation_prevention_3_byte(data: &mut Vec<u8>) {
    let escaped = escape_rbsp(data);
    *data = escaped;
}

fn escape_rbsp(rbsp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rbsp.len() + rbsp.len() / 64 + 1);
    let mut zeros = 0;

    for &byte in rbsp {
        if zeros >= 2 && byte <= 3 {
            out.push(3);
            zeros = 0;
        }

        zeros = if byte == 0 { zeros + 1 } else { 0 };
        out.push(byte);
    }

    out
}

/// Appends the escaped `rbsp` to `dst`, which may hold at most `capacity` bytes.
/// Returns the number of bytes appended. `dst` is left untouched on failure.
pub fn pack_rbsp(dst: &mut Vec<u8>, rbsp: &[u8], capacity: usize) -> Result<usize> {
    let escaped = escape_rbsp(rbsp);
    let available = capacity.saturating_sub(dst.len());

    if escaped.len() > available {
        return Err(HeaderError::NotEnoughBuffer {
            needed: escaped.len(),
            available,
        });
    }

    dst.extend_from_slice(&escaped);

    Ok(escaped.len())
}

/// Maps a bit position in `rbsp` to its position after escaping, counting the
/// emulation prevention bytes inserted before that byte.
pub fn escaped_bit_offset(rbsp: &[u8], bit_pos: usize) -> usize {
    let byte_pos = (bit_pos / 8).min(rbsp.len());
    let mut inserted = 0;
    let mut zeros = 0;

    for &byte in &rbsp[..byte_pos] {
        if zeros >= 2 && byte <= 3 {
            inserted += 1;
            zeros = 0;
        }

        zeros = if byte == 0 { zeros + 1 } else { 0 };
    }

    // the byte holding `bit_pos` may itself be escaped
    if byte_pos < rbsp.len() && zeros >= 2 && rbsp[byte_pos] <= 3 {
        inserted += 1;
    }

    bit_pos + inserted * 8
}
