//! CABAC arithmetic encoder (H.265 9.3.4.3) and the context bank used by the
//! skip slice generator.
//!
//! The coder registers live on [`BitWriter`], so slice data is appended to the
//! same buffer as the slice segment header.

use tracing::trace;

use crate::bits::{BitWriter, CabacState};
use crate::hevc::{SLICE_TYPE_B, SLICE_TYPE_I, SLICE_TYPE_P};

mod tables;
use tables::*;


const STATE_MASK: u8 = 0x3F;
const MPS_SHIFT: u8 = 6;

impl BitWriter {
    /// Resets the coder registers. Called once per slice before the first bin.
    pub fn cabac_init(&mut self) {
        self.cabac = CabacState::default();
    }

    /// Encodes one context coded bin, updating the context byte in place.
    pub fn encode_bin(&mut self, ctx: &mut u8, bin: bool) {
        let mut state = *ctx & STATE_MASK;
        let mut mps = (*ctx >> MPS_SHIFT) & 1 == 1;

        let q_range_idx = ((self.cabac.range >> 6) & 3) as usize;
        let range_lps = RANGE_TAB_LPS[state as usize][q_range_idx] as u32;

        self.cabac.range -= range_lps;

        if bin != mps {
            self.cabac.low += self.cabac.range;
            self.cabac.range = range_lps;

            if state == 0 {
                mps = !mps;
            }

            state = TRANS_IDX_LPS[state as usize];
        } else {
            state = TRANS_IDX_MPS[state as usize];
        }

        *ctx = state | ((mps as u8) << MPS_SHIFT);
        self.cabac.bin_count += 1;

        self.renorm_e();
    }

    /// Encodes one bypass (equiprobable) bin.
    pub fn encode_bin_ep(&mut self, bin: bool) {
        self.cabac.low <<= 1;
        if bin {
            self.cabac.low += self.cabac.range;
        }

        self.cabac.bin_count += 1;

        if self.cabac.low >= 1024 {
            self.cabac.low -= 1024;
            self.put_bit_c(true);
        } else if self.cabac.low < 512 {
            self.put_bit_c(false);
        } else {
            self.cabac.low -= 512;
            self.cabac.bits_outstanding += 1;
        }
    }

    /// Bypass codes the low `n` bits of `value`, MSB first.
    pub fn encode_bins_ep(&mut self, value: u32, n: usize) {
        for i in (0..n).rev() {
            self.encode_bin_ep((value >> i) & 1 == 1);
        }
    }

    pub fn renorm_e(&mut self) {
        while self.cabac.range < 256 {
            if self.cabac.low < 256 {
                self.put_bit_c(false);
            } else if self.cabac.low >= 512 {
                self.cabac.low -= 512;
                self.put_bit_c(true);
            } else {
                self.cabac.low -= 256;
                self.cabac.bits_outstanding += 1;
            }

            self.cabac.range <<= 1;
            self.cabac.low <<= 1;
        }
    }

    /// Writes `bit` followed by the outstanding bits with the opposite value.
    /// The very first bit after `cabac_init` is dropped.
    pub fn put_bit_c(&mut self, bit: bool) {
        if self.cabac.first_bit {
            self.cabac.first_bit = false;
        } else {
            self.put_bit(bit);
        }

        while self.cabac.bits_outstanding > 0 {
            self.put_bit(!bit);
            self.cabac.bits_outstanding -= 1;
        }
    }

    /// Codes end_of_slice_segment_flag = 1, flushes the coder and writes the
    /// rbsp_slice_segment_trailing_bits.
    pub fn slice_finish(&mut self) {
        self.cabac.range -= 2;
        self.cabac.low += self.cabac.range;
        self.cabac.range = 2;
        self.cabac.bin_count += 1;

        self.renorm_e();

        let low = self.cabac.low;
        self.put_bit_c((low >> 9) & 1 == 1);
        self.put_bit((low >> 8) & 1 == 1);

        self.put_trailing_bits(false);
    }

    /// Number of bins coded since the last `cabac_init`.
    pub fn bin_count(&self) -> u32 {
        self.cabac.bin_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxElement {
    CuTransquantBypassFlag,
    SplitCuFlag,
    CuSkipFlag,
    MergeIdx,
    EndOfSliceSegmentFlag,
}

impl SyntaxElement {
    const ALL: [SyntaxElement; 5] = [
        SyntaxElement::CuTransquantBypassFlag,
        SyntaxElement::SplitCuFlag,
        SyntaxElement::CuSkipFlag,
        SyntaxElement::MergeIdx,
        SyntaxElement::EndOfSliceSegmentFlag,
    ];

    pub const fn num_contexts(self) -> usize {
        match self {
            SyntaxElement::SplitCuFlag | SyntaxElement::CuSkipFlag => 3,
            _ => 1,
        }
    }

    const fn offset(self) -> usize {
        match self {
            SyntaxElement::CuTransquantBypassFlag => 0,
            SyntaxElement::SplitCuFlag => 1,
            SyntaxElement::CuSkipFlag => 4,
            SyntaxElement::MergeIdx => 7,
            SyntaxElement::EndOfSliceSegmentFlag => 8,
        }
    }
}

pub const NUM_CABAC_CONTEXTS: usize = 9;

/// Context bytes of one slice: `pStateIdx` in bits 0..5, `valMps` in bit 6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBank {
    contexts: [u8; NUM_CABAC_CONTEXTS],
}

impl ContextBank {
    /// Initializes every context group for a slice (H.265 9.3.2.2).
    pub fn new(slice_type: u8, cabac_init_flag: bool, slice_qp_y: i32) -> Self {
        let init_type = initialization_type(slice_type, cabac_init_flag);
        let mut bank = Self {
            contexts: [0; NUM_CABAC_CONTEXTS],
        };

        for element in SyntaxElement::ALL {
            let init_values: &[u8] = match element {
                SyntaxElement::CuTransquantBypassFlag => {
                    &INIT_CU_TRANSQUANT_BYPASS_FLAG[init_type]
                }
                SyntaxElement::SplitCuFlag => &INIT_SPLIT_CU_FLAG[init_type],
                SyntaxElement::CuSkipFlag => &INIT_CU_SKIP_FLAG[init_type],
                SyntaxElement::MergeIdx => &INIT_MERGE_IDX[init_type],
                SyntaxElement::EndOfSliceSegmentFlag => {
                    bank.group_mut(element)[0] = END_OF_SLICE_CONTEXT;
                    continue;
                }
            };

            bank.group_mut(element)
                .iter_mut()
                .zip(init_values)
                .for_each(|(ctx, init_value)| *ctx = init_context(*init_value, slice_qp_y));
        }

        trace!(init_type, slice_qp_y, contexts = ?bank.contexts, "CABAC contexts initialized");

        bank
    }

    pub fn group(&self, element: SyntaxElement) -> &[u8] {
        let offset = element.offset();
        &self.contexts[offset..offset + element.num_contexts()]
    }

    pub fn group_mut(&mut self, element: SyntaxElement) -> &mut [u8] {
        let offset = element.offset();
        &mut self.contexts[offset..offset + element.num_contexts()]
    }

    pub fn get_mut(&mut self, element: SyntaxElement, ctx_inc: usize) -> &mut u8 {
        debug_assert!(ctx_inc < element.num_contexts());
        &mut self.group_mut(element)[ctx_inc]
    }
}

/// initType of H.265 Table 9-4 (swap of P/B tables by cabac_init_flag included).
pub fn initialization_type(slice_type: u8, cabac_init_flag: bool) -> usize {
    match slice_type {
        SLICE_TYPE_I => 0,
        SLICE_TYPE_P if cabac_init_flag => 2,
        SLICE_TYPE_P => 1,
        SLICE_TYPE_B if cabac_init_flag => 1,
        _ => 2,
    }
}

/// Packs the initial context byte for `init_value` at the given slice QP.
pub fn init_context(init_value: u8, qp: i32) -> u8 {
    let slope = (init_value >> 4) as i32 * 5 - 45;
    let offset = ((init_value & 15) as i32) * 8 - 16;

    let init_state = (((slope * qp.clamp(0, 51)) >> 4) + offset).clamp(1, 126);

    if init_state >= 64 {
        (init_state - 64) as u8 | (1 << MPS_SHIFT)
    } else {
        (63 - init_state) as u8
    }
}
