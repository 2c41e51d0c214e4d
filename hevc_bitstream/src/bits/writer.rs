use std::fmt;

use bitvec::prelude::*;

use super::signed_to_unsigned;

/// Arithmetic coder registers, reset by `cabac_init` at the start of every slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CabacState {
    pub low: u32,
    pub range: u32,
    pub bits_outstanding: u32,
    pub first_bit: bool,
    pub bin_count: u32,
}

impl Default for CabacState {
    fn default() -> Self {
        Self {
            low: 0,
            range: 510,
            bits_outstanding: 0,
            first_bit: true,
            bin_count: 0,
        }
    }
}

/// MSB-first bit writer over a growable buffer.
///
/// Besides fixed width and Exp-Golomb fields, the writer carries the CABAC
/// register state so that arithmetic coded slice data can be appended to the
/// same buffer as the slice header (see `crate::cabac`).
#[derive(Default, Clone)]
pub struct BitWriter {
    bs: BitVec<u8, Msb0>,
    pub(crate) cabac: CabacState,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bs: BitVec::with_capacity(bytes * 8),
            cabac: CabacState::default(),
        }
    }

    /// Starts a writer that continues a byte already partially written by
    /// another writer: the top `bit_offset` bits of `byte` are kept, the rest masked.
    pub fn with_partial_byte(byte: u8, bit_offset: u8) -> Self {
        debug_assert!(bit_offset < 8);

        let mut writer = Self::new();
        if bit_offset > 0 {
            writer.put_bits(bit_offset as usize, (byte >> (8 - bit_offset)) as u32);
        }

        writer
    }

    pub fn reset(&mut self) {
        self.bs.clear();
        self.cabac = CabacState::default();
    }

    /// Writes the low `n` bits of `value`, MSB first.
    #[inline(always)]
    pub fn put_bits(&mut self, n: usize, value: u32) {
        debug_assert!(n <= 32, "put_bits: {} bits requested", n);

        if n == 0 {
            return;
        }

        let start = self.bs.len();
        self.bs.resize(start + n, false);
        self.bs[start..].store_be::<u32>(value);
    }

    #[inline(always)]
    pub fn put_bit(&mut self, bit: bool) {
        self.bs.push(bit);
    }

    /// Copies `n` bits starting at bit `offset` of `src`.
    pub fn put_bits_buffer(&mut self, n: usize, src: &[u8], offset: usize) {
        let bits = src.view_bits::<Msb0>();
        debug_assert!(offset + n <= bits.len());

        self.bs.extend_from_bitslice(&bits[offset..offset + n]);
    }

    #[inline(always)]
    pub fn put_ue(&mut self, v: u32) {
        if v == 0 {
            self.bs.push(true);
            return;
        }

        let code = v as u64 + 1;
        let len = (64 - code.leading_zeros()) as usize;

        let start = self.bs.len();
        self.bs.resize(start + 2 * len - 1, false);
        self.bs[start + len - 1..].store_be::<u64>(code);
    }

    #[inline(always)]
    pub fn put_se(&mut self, v: i32) {
        self.put_ue(signed_to_unsigned(v));
    }

    /// rbsp_trailing_bits(). With `check_aligned`, nothing is written when the
    /// cursor already sits on a byte boundary (SEI payload semantics).
    pub fn put_trailing_bits(&mut self, check_aligned: bool) {
        if check_aligned && self.is_aligned() {
            return;
        }

        self.put_bit(true);

        while !self.is_aligned() {
            self.put_bit(false);
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.bs.len() % 8 == 0
    }

    /// Current position, in bits.
    pub fn pos(&self) -> usize {
        self.bs.len()
    }

    /// Number of bytes touched so far, counting a partial last byte.
    pub fn len(&self) -> usize {
        self.bs.len().div_ceil(8)
    }

    pub fn is_empty(&self) -> bool {
        self.bs.is_empty()
    }

    /// Written bytes. Bits of a partial last byte past the cursor are zero.
    pub fn as_slice(&mut self) -> &[u8] {
        self.bs.set_uninitialized(false);
        self.bs.as_raw_slice()
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        self.bs.as_bitslice()
    }
}

impl fmt::Debug for BitWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitWriter: {{pos: {}, range: {}, low: {}}}",
            self.bs.len(),
            self.cabac.range,
            self.cabac.low
        )
    }
}
