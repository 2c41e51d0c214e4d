use std::fmt;

use thiserror::Error;

use super::unsigned_to_signed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitReadError {
    #[error("end of buffer")]
    EndOfBuffer,
    #[error("Exp-Golomb code longer than 32 bits")]
    ExpGolombOverflow,
}

type Result<T> = std::result::Result<T, BitReadError>;

/// MSB-first reader over a byte slice.
///
/// With emulation handling enabled, an emulation prevention byte (`0x03` after
/// `00 00`, followed by a byte `<= 0x03` or ending the buffer) is skipped
/// transparently when the cursor enters it.
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_offset: u8,
    emulation: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_offset: 0,
            emulation: true,
        }
    }

    pub fn set_emulation(&mut self, enabled: bool) {
        self.emulation = enabled;
    }

    pub fn emulation(&self) -> bool {
        self.emulation
    }

    #[inline(always)]
    pub fn get_bit(&mut self) -> Result<bool> {
        let byte = *self
            .data
            .get(self.byte_pos)
            .ok_or(BitReadError::EndOfBuffer)?;
        let bit = (byte >> (7 - self.bit_offset)) & 1 == 1;

        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_pos += 1;

            if self.emulation && self.at_emulation_prevention_byte() {
                self.byte_pos += 1;
            }
        }

        Ok(bit)
    }

    fn at_emulation_prevention_byte(&self) -> bool {
        let p = self.byte_pos;

        p >= 2
            && p < self.data.len()
            && self.data[p - 2] == 0
            && self.data[p - 1] == 0
            && self.data[p] == 3
            && self.data.get(p + 1).map_or(true, |next| next & 0xFC == 0)
    }

    pub fn get_bits(&mut self, n: usize) -> Result<u32> {
        debug_assert!(n <= 32);

        let mut v = 0u32;
        for _ in 0..n {
            v = (v << 1) | self.get_bit()? as u32;
        }

        Ok(v)
    }

    /// Reads `n` bits into a `u8`, for fields no wider than a byte.
    pub fn get_n(&mut self, n: usize) -> Result<u8> {
        debug_assert!(n <= 8);
        Ok(self.get_bits(n)? as u8)
    }

    pub fn get_ue(&mut self) -> Result<u32> {
        let mut leading_zeroes = 0;

        while !self.get_bit()? {
            leading_zeroes += 1;

            if leading_zeroes > 32 {
                return Err(BitReadError::ExpGolombOverflow);
            }
        }

        if leading_zeroes == 0 {
            return Ok(0);
        }

        let suffix = self.get_bits_u64(leading_zeroes)?;
        let code_num = ((1u64 << leading_zeroes) | suffix) - 1;

        u32::try_from(code_num).map_err(|_| BitReadError::ExpGolombOverflow)
    }

    pub fn get_se(&mut self) -> Result<i32> {
        Ok(unsigned_to_signed(self.get_ue()?))
    }

    fn get_bits_u64(&mut self, n: usize) -> Result<u64> {
        let mut v = 0u64;
        for _ in 0..n {
            v = (v << 1) | self.get_bit()? as u64;
        }

        Ok(v)
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Skips to the next byte boundary.
    pub fn byte_align(&mut self) -> Result<()> {
        while !self.is_aligned() {
            self.get_bit()?;
        }

        Ok(())
    }

    /// Cursor position in bits from the start of the buffer, emulation bytes included.
    pub fn pos(&self) -> usize {
        self.byte_pos * 8 + self.bit_offset as usize
    }

    pub fn available(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos())
    }
}

impl fmt::Debug for BitReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitReader: {{pos: {}, len: {}, emulation: {}}}",
            self.pos(),
            self.data.len() * 8,
            self.emulation
        )
    }
}
