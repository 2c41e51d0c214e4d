use crate::bits::BitWriter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod hrd_parameters;
pub mod pps;
pub mod profile_tier_level;
pub mod sei;
pub mod short_term_rps;
pub mod slice;
pub mod sps;
pub mod vps;
pub mod vui_parameters;

#[cfg(test)]
mod tests;

pub const NAL_TRAIL_N: u8 = 0;
pub const NAL_TRAIL_R: u8 = 1;
pub const NAL_TSA_N: u8 = 2;
pub const NAL_TSA_R: u8 = 3;
pub const NAL_STSA_N: u8 = 4;
pub const NAL_STSA_R: u8 = 5;
pub const NAL_RADL_N: u8 = 6;
pub const NAL_RADL_R: u8 = 7;
pub const NAL_RASL_N: u8 = 8;
pub const NAL_RASL_R: u8 = 9;
pub const NAL_BLA_W_LP: u8 = 16;
pub const NAL_BLA_W_RADL: u8 = 17;
pub const NAL_BLA_N_LP: u8 = 18;
pub const NAL_IDR_W_RADL: u8 = 19;
pub const NAL_IDR_N_LP: u8 = 20;
pub const NAL_CRA_NUT: u8 = 21;
pub const NAL_IRAP_VCL23: u8 = 23;
pub const NAL_VPS: u8 = 32;
pub const NAL_SPS: u8 = 33;
pub const NAL_PPS: u8 = 34;
pub const NAL_AUD: u8 = 35;
pub const NAL_EOS_NUT: u8 = 36;
pub const NAL_EOB_NUT: u8 = 37;
pub const NAL_FD_NUT: u8 = 38;
pub const NAL_SEI_PREFIX: u8 = 39;
pub const NAL_SEI_SUFFIX: u8 = 40;

pub const SLICE_TYPE_B: u8 = 0;
pub const SLICE_TYPE_P: u8 = 1;
pub const SLICE_TYPE_I: u8 = 2;

/// Maximum number of short-term RPS in an SPS.
pub const MAX_NUM_ST_RPS: usize = 64;

/// NAL unit header plus the start code flavour it is emitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NalUnit {
    pub long_start_code: bool,
    pub nal_unit_type: u8,
    pub nuh_layer_id: u8,
    pub nuh_temporal_id_plus1: u8,
}

impl Default for NalUnit {
    fn default() -> Self {
        Self {
            long_start_code: false,
            nal_unit_type: 0,
            nuh_layer_id: 0,
            nuh_temporal_id_plus1: 1,
        }
    }
}

impl NalUnit {
    pub fn new(nal_unit_type: u8, temporal_id: u8) -> Self {
        Self {
            nal_unit_type,
            nuh_temporal_id_plus1: temporal_id + 1,
            long_start_code: requires_zero_byte(nal_unit_type),
            ..Default::default()
        }
    }

    pub fn with_long_start_code(mut self, long_start_code: bool) -> Self {
        self.long_start_code = long_start_code || requires_zero_byte(self.nal_unit_type);
        self
    }

    pub fn temporal_id(&self) -> u8 {
        self.nuh_temporal_id_plus1.saturating_sub(1)
    }

    /// Start code followed by the 16 bit NAL unit header.
    pub fn write(&self, writer: &mut BitWriter) {
        if self.long_start_code {
            writer.put_bits(8, 0);
        }

        writer.put_bits(24, 1);

        writer.put_bit(false); // forbidden_zero_bit
        writer.put_bits(6, self.nal_unit_type as u32);
        writer.put_bits(6, self.nuh_layer_id as u32);
        writer.put_bits(3, self.nuh_temporal_id_plus1 as u32);
    }

    /// Start code and header size in bytes.
    pub fn header_len(&self) -> usize {
        if self.long_start_code {
            6
        } else {
            5
        }
    }
}

/// zero_byte is mandatory before parameter sets, AUD and the first NAL unit of an AU.
pub fn requires_zero_byte(nal_unit_type: u8) -> bool {
    matches!(
        nal_unit_type,
        NAL_VPS | NAL_SPS | NAL_PPS | NAL_AUD | NAL_SEI_PREFIX
    )
}

pub fn is_irap(nal_unit_type: u8) -> bool {
    (NAL_BLA_W_LP..=NAL_IRAP_VCL23).contains(&nal_unit_type)
}

pub fn is_idr(nal_unit_type: u8) -> bool {
    matches!(nal_unit_type, NAL_IDR_W_RADL | NAL_IDR_N_LP)
}

pub fn is_vcl(nal_unit_type: u8) -> bool {
    nal_unit_type < NAL_VPS
}
