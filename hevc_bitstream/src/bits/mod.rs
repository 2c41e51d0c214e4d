mod reader;
mod writer;


pub use reader::{BitReadError, BitReader};
pub use writer::BitWriter;

pub(crate) use writer::CabacState;

/// se(v) to ue(v) code number mapping: positive `v` maps to `2v - 1`, the rest to `-2v`.
pub(crate) fn signed_to_unsigned(v: i32) -> u32 {
    let v = v as i64;
    let u = if v > 0 { 2 * v - 1 } else { -2 * v };

    u as u32
}

pub(crate) fn unsigned_to_signed(code_num: u32) -> i32 {
    let k = code_num as i64;
    let m = (k + 1) / 2;

    if k % 2 == 0 {
        -m as i32
    } else {
        m as i32
    }
}

/// Length in bits of the ue(v) code for `v`.
pub fn ue_bits(v: u32) -> u32 {
    let code = v as u64 + 1;
    let len = 64 - code.leading_zeros();

    2 * len - 1
}

/// Ceil(Log2(n)), the width of u(v) indexes such as short_term_ref_pic_set_idx.
pub fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}
