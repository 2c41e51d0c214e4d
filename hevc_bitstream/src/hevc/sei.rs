#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hrd_parameters::HrdParameters;
use super::vui_parameters::VuiParameters;
use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

pub const SEI_BUFFERING_PERIOD: u32 = 0;
pub const SEI_PIC_TIMING: u32 = 1;
pub const SEI_USER_DATA_REGISTERED: u32 = 4;
pub const SEI_USER_DATA_UNREGISTERED: u32 = 5;
pub const SEI_RECOVERY_POINT: u32 = 6;
pub const SEI_DECODED_PICTURE_HASH: u32 = 132;
pub const SEI_ACTIVE_PARAMETER_SETS: u32 = 129;
pub const SEI_DECODING_UNIT_INFO: u32 = 130;

/// Raw sei_message() body supplied by the caller, without the type/size header.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeiPayload {
    pub payload_type: u32,
    pub data: Vec<u8>,
    /// Goes in a suffix SEI NAL unit.
    pub suffix: bool,
}

/// buffering_period() (D.2.2)
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BufferingPeriodSei {
    pub bp_seq_parameter_set_id: u32,
    pub irap_cpb_params_present_flag: bool,
    pub cpb_delay_offset: u32,
    pub dpb_delay_offset: u32,
    pub concatenation_flag: bool,
    pub au_cpb_removal_delay_delta_minus1: u32,

    pub nal: Vec<InitialCpbRemoval>,
    pub vcl: Vec<InitialCpbRemoval>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InitialCpbRemoval {
    pub initial_cpb_removal_delay: u32,
    pub initial_cpb_removal_offset: u32,
    pub initial_alt_cpb_removal_delay: u32,
    pub initial_alt_cpb_removal_offset: u32,
}

/// pic_timing() (D.2.3)
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PicTimingSei {
    pub pic_struct: u8,
    pub source_scan_type: u8,
    pub duplicate_flag: bool,

    pub au_cpb_removal_delay_minus1: u32,
    pub pic_dpb_output_delay: u32,
    pub pic_dpb_output_du_delay: u32,

    pub num_decoding_units_minus1: u32,
    pub du_common_cpb_removal_delay_flag: bool,
    pub du_common_cpb_removal_delay_increment_minus1: u32,
    pub num_nalus_in_du_minus1: Vec<u32>,
    pub du_cpb_removal_delay_increment_minus1: Vec<u32>,
}

impl SeiPayload {
    pub fn new(payload_type: u32, data: Vec<u8>) -> Self {
        Self {
            payload_type,
            data,
            suffix: false,
        }
    }

    /// Whole sei_message(): type and size with 0xFF extension bytes, then the body.
    pub fn write(&self, writer: &mut BitWriter) {
        write_sei_message_header(writer, self.payload_type, self.data.len());
        writer.put_bits_buffer(self.data.len() * 8, &self.data, 0);
    }

    /// Reads every sei_message() of an SEI RBSP.
    pub fn parse_all(rbsp: &[u8]) -> Result<Vec<SeiPayload>> {
        let mut messages = Vec::new();
        let mut pos = 0;

        // more_rbsp_data(): stop at the trailing 0x80
        while pos < rbsp.len() && rbsp[pos..] != [0x80] {
            let payload_type = read_ff_coded(rbsp, &mut pos)?;
            let payload_size = read_ff_coded(rbsp, &mut pos)? as usize;

            let data = rbsp
                .get(pos..pos + payload_size)
                .ok_or(HeaderError::InvalidParam("SEI payload exceeds NAL unit"))?;
            pos += payload_size;

            messages.push(SeiPayload::new(payload_type, data.to_vec()));
        }

        Ok(messages)
    }
}

pub fn write_sei_message_header(writer: &mut BitWriter, payload_type: u32, payload_size: usize) {
    for mut value in [payload_type as usize, payload_size] {
        while value >= 0xFF {
            writer.put_bits(8, 0xFF);
            value -= 0xFF;
        }

        writer.put_bits(8, value as u32);
    }
}

fn read_ff_coded(data: &[u8], pos: &mut usize) -> Result<u32> {
    let mut value = 0u32;

    loop {
        let byte = *data
            .get(*pos)
            .ok_or(HeaderError::InvalidParam("truncated SEI message header"))?;
        *pos += 1;

        value = value
            .checked_add(byte as u32)
            .ok_or(HeaderError::InvalidParam("SEI message header overflow"))?;

        if byte != 0xFF {
            return Ok(value);
        }
    }
}

/// CpbCnt of the highest sub-layer.
fn cpb_cnt(hrd: &HrdParameters) -> usize {
    hrd.sub_layers
        .last()
        .map(|sl| sl.cpb_cnt_minus1 as usize + 1)
        .unwrap_or(1)
}

impl BufferingPeriodSei {
    /// Payload body, ending on a byte boundary.
    pub fn write(&self, writer: &mut BitWriter, hrd: &HrdParameters) {
        let au_delay_len = hrd.au_cpb_removal_delay_length_minus1 as usize + 1;
        let initial_len = hrd.initial_cpb_removal_delay_length_minus1 as usize + 1;

        writer.put_ue(self.bp_seq_parameter_set_id);

        if !hrd.sub_pic_hrd_params_present_flag {
            writer.put_bit(self.irap_cpb_params_present_flag);
        }

        if self.irap_cpb_params_present_flag {
            writer.put_bits(au_delay_len, self.cpb_delay_offset);
            writer.put_bits(hrd.dpb_output_delay_length_minus1 as usize + 1, self.dpb_delay_offset);
        }

        writer.put_bit(self.concatenation_flag);
        writer.put_bits(au_delay_len, self.au_cpb_removal_delay_delta_minus1);

        let alt = hrd.sub_pic_hrd_params_present_flag || self.irap_cpb_params_present_flag;
        let default = InitialCpbRemoval::default();

        for (present, entries) in [
            (hrd.nal_hrd_parameters_present_flag, &self.nal),
            (hrd.vcl_hrd_parameters_present_flag, &self.vcl),
        ] {
            if !present {
                continue;
            }

            for i in 0..cpb_cnt(hrd) {
                let e = entries.get(i).unwrap_or(&default);

                writer.put_bits(initial_len, e.initial_cpb_removal_delay);
                writer.put_bits(initial_len, e.initial_cpb_removal_offset);

                if alt {
                    writer.put_bits(initial_len, e.initial_alt_cpb_removal_delay);
                    writer.put_bits(initial_len, e.initial_alt_cpb_removal_offset);
                }
            }
        }

        writer.put_trailing_bits(true);
    }

    pub fn parse(reader: &mut BitReader, hrd: &HrdParameters) -> Result<Self> {
        let au_delay_len = hrd.au_cpb_removal_delay_length_minus1 as usize + 1;
        let initial_len = hrd.initial_cpb_removal_delay_length_minus1 as usize + 1;

        let mut bp = BufferingPeriodSei {
            bp_seq_parameter_set_id: reader.get_ue()?,
            ..Default::default()
        };

        if !hrd.sub_pic_hrd_params_present_flag {
            bp.irap_cpb_params_present_flag = reader.get_bit()?;
        }

        if bp.irap_cpb_params_present_flag {
            bp.cpb_delay_offset = reader.get_bits(au_delay_len)?;
            bp.dpb_delay_offset = reader.get_bits(hrd.dpb_output_delay_length_minus1 as usize + 1)?;
        }

        bp.concatenation_flag = reader.get_bit()?;
        bp.au_cpb_removal_delay_delta_minus1 = reader.get_bits(au_delay_len)?;

        let alt = hrd.sub_pic_hrd_params_present_flag || bp.irap_cpb_params_present_flag;

        for (present, vcl) in [
            (hrd.nal_hrd_parameters_present_flag, false),
            (hrd.vcl_hrd_parameters_present_flag, true),
        ] {
            if !present {
                continue;
            }

            let mut entries = Vec::with_capacity(cpb_cnt(hrd));

            for _ in 0..cpb_cnt(hrd) {
                let mut e = InitialCpbRemoval {
                    initial_cpb_removal_delay: reader.get_bits(initial_len)?,
                    initial_cpb_removal_offset: reader.get_bits(initial_len)?,
                    ..Default::default()
                };

                if alt {
                    e.initial_alt_cpb_removal_delay = reader.get_bits(initial_len)?;
                    e.initial_alt_cpb_removal_offset = reader.get_bits(initial_len)?;
                }

                entries.push(e);
            }

            if vcl {
                bp.vcl = entries;
            } else {
                bp.nal = entries;
            }
        }

        Ok(bp)
    }
}

impl PicTimingSei {
    /// Payload body, ending on a byte boundary.
    pub fn write(&self, writer: &mut BitWriter, vui: &VuiParameters) {
        let hrd = &vui.hrd_parameters;

        if vui.frame_field_info_present_flag {
            writer.put_bits(4, self.pic_struct as u32);
            writer.put_bits(2, self.source_scan_type as u32);
            writer.put_bit(self.duplicate_flag);
        }

        if vui.hrd_parameters_present_flag && hrd.cpb_dpb_delays_present() {
            writer.put_bits(
                hrd.au_cpb_removal_delay_length_minus1 as usize + 1,
                self.au_cpb_removal_delay_minus1,
            );
            writer.put_bits(
                hrd.dpb_output_delay_length_minus1 as usize + 1,
                self.pic_dpb_output_delay,
            );

            if hrd.sub_pic_hrd_params_present_flag {
                writer.put_bits(
                    hrd.dpb_output_delay_du_length_minus1 as usize + 1,
                    self.pic_dpb_output_du_delay,
                );
            }

            if hrd.sub_pic_hrd_params_present_flag && hrd.sub_pic_cpb_params_in_pic_timing_sei_flag {
                let increment_len = hrd.du_cpb_removal_delay_increment_length_minus1 as usize + 1;

                writer.put_ue(self.num_decoding_units_minus1);
                writer.put_bit(self.du_common_cpb_removal_delay_flag);

                if self.du_common_cpb_removal_delay_flag {
                    writer.put_bits(increment_len, self.du_common_cpb_removal_delay_increment_minus1);
                }

                for i in 0..=self.num_decoding_units_minus1 as usize {
                    writer.put_ue(self.num_nalus_in_du_minus1.get(i).copied().unwrap_or(0));

                    if !self.du_common_cpb_removal_delay_flag && i < self.num_decoding_units_minus1 as usize {
                        writer.put_bits(
                            increment_len,
                            self.du_cpb_removal_delay_increment_minus1
                                .get(i)
                                .copied()
                                .unwrap_or(0),
                        );
                    }
                }
            }
        }

        writer.put_trailing_bits(true);
    }

    pub fn parse(reader: &mut BitReader, vui: &VuiParameters) -> Result<Self> {
        let hrd = &vui.hrd_parameters;
        let mut pt = PicTimingSei::default();

        if vui.frame_field_info_present_flag {
            pt.pic_struct = reader.get_n(4)?;
            pt.source_scan_type = reader.get_n(2)?;
            pt.duplicate_flag = reader.get_bit()?;
        }

        if vui.hrd_parameters_present_flag && hrd.cpb_dpb_delays_present() {
            pt.au_cpb_removal_delay_minus1 =
                reader.get_bits(hrd.au_cpb_removal_delay_length_minus1 as usize + 1)?;
            pt.pic_dpb_output_delay = reader.get_bits(hrd.dpb_output_delay_length_minus1 as usize + 1)?;

            if hrd.sub_pic_hrd_params_present_flag {
                pt.pic_dpb_output_du_delay =
                    reader.get_bits(hrd.dpb_output_delay_du_length_minus1 as usize + 1)?;
            }

            if hrd.sub_pic_hrd_params_present_flag && hrd.sub_pic_cpb_params_in_pic_timing_sei_flag {
                let increment_len = hrd.du_cpb_removal_delay_increment_length_minus1 as usize + 1;

                pt.num_decoding_units_minus1 = reader.get_ue()?;
                if pt.num_decoding_units_minus1 > 0xFFFF {
                    return Err(HeaderError::InvalidParam("num_decoding_units_minus1 out of range"));
                }

                pt.du_common_cpb_removal_delay_flag = reader.get_bit()?;

                if pt.du_common_cpb_removal_delay_flag {
                    pt.du_common_cpb_removal_delay_increment_minus1 = reader.get_bits(increment_len)?;
                }

                for i in 0..=pt.num_decoding_units_minus1 {
                    pt.num_nalus_in_du_minus1.push(reader.get_ue()?);

                    if !pt.du_common_cpb_removal_delay_flag && i < pt.num_decoding_units_minus1 {
                        pt.du_cpb_removal_delay_increment_minus1
                            .push(reader.get_bits(increment_len)?);
                    }
                }
            }
        }

        Ok(pt)
    }
}
