#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HrdParameters {
    pub nal_hrd_parameters_present_flag: bool,
    pub vcl_hrd_parameters_present_flag: bool,
    pub sub_pic_hrd_params_present_flag: bool,

    pub tick_divisor_minus2: u8,
    pub du_cpb_removal_delay_increment_length_minus1: u8,
    pub sub_pic_cpb_params_in_pic_timing_sei_flag: bool,
    pub dpb_output_delay_du_length_minus1: u8,

    pub bit_rate_scale: u8,
    pub cpb_size_scale: u8,
    pub cpb_size_du_scale: u8,
    pub initial_cpb_removal_delay_length_minus1: u8,
    pub au_cpb_removal_delay_length_minus1: u8,
    pub dpb_output_delay_length_minus1: u8,

    /// Indexed by temporal sub-layer, `max_sub_layers_minus1 + 1` entries.
    pub sub_layers: Vec<HrdSubLayer>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HrdSubLayer {
    pub fixed_pic_rate_general_flag: bool,
    pub fixed_pic_rate_within_cvs_flag: bool,
    pub elemental_duration_in_tc_minus1: u32,
    pub low_delay_hrd_flag: bool,
    pub cpb_cnt_minus1: u32,

    pub nal: Vec<CpbSpec>,
    pub vcl: Vec<CpbSpec>,
}

impl HrdSubLayer {
    pub fn normalize(&mut self) {
        if self.fixed_pic_rate_general_flag {
            self.fixed_pic_rate_within_cvs_flag = true;
        }

        if self.fixed_pic_rate_within_cvs_flag {
            // low_delay_hrd_flag is inferred 0 when fixed rate
            self.low_delay_hrd_flag = false;
        } else {
            self.elemental_duration_in_tc_minus1 = 0;
        }

        if self.low_delay_hrd_flag {
            self.cpb_cnt_minus1 = 0;
        }
    }
}

/// One CPB specification of sub_layer_hrd_parameters().
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CpbSpec {
    pub bit_rate_value_minus1: u32,
    pub cpb_size_value_minus1: u32,
    pub cpb_size_du_value_minus1: u32,
    pub bit_rate_du_value_minus1: u32,
    pub cbr_flag: bool,
}

impl HrdParameters {
    /// Applies the sub-layer inferences, so the struct equals what parsing
    /// its written form gives back.
    pub fn normalize(&mut self) {
        self.sub_layers.iter_mut().for_each(HrdSubLayer::normalize);
    }

    pub fn cpb_dpb_delays_present(&self) -> bool {
        self.nal_hrd_parameters_present_flag || self.vcl_hrd_parameters_present_flag
    }

    pub fn write(&self, writer: &mut BitWriter, common_inf_present: bool, max_sub_layers_minus1: u8) {
        if common_inf_present {
            writer.put_bit(self.nal_hrd_parameters_present_flag);
            writer.put_bit(self.vcl_hrd_parameters_present_flag);

            if self.cpb_dpb_delays_present() {
                writer.put_bit(self.sub_pic_hrd_params_present_flag);

                if self.sub_pic_hrd_params_present_flag {
                    writer.put_bits(8, self.tick_divisor_minus2 as u32);
                    writer.put_bits(5, self.du_cpb_removal_delay_increment_length_minus1 as u32);
                    writer.put_bit(self.sub_pic_cpb_params_in_pic_timing_sei_flag);
                    writer.put_bits(5, self.dpb_output_delay_du_length_minus1 as u32);
                }

                writer.put_bits(4, self.bit_rate_scale as u32);
                writer.put_bits(4, self.cpb_size_scale as u32);

                if self.sub_pic_hrd_params_present_flag {
                    writer.put_bits(4, self.cpb_size_du_scale as u32);
                }

                writer.put_bits(5, self.initial_cpb_removal_delay_length_minus1 as u32);
                writer.put_bits(5, self.au_cpb_removal_delay_length_minus1 as u32);
                writer.put_bits(5, self.dpb_output_delay_length_minus1 as u32);
            }
        }

        for i in 0..=max_sub_layers_minus1 as usize {
            let mut sl = self.sub_layers.get(i).cloned().unwrap_or_default();
            sl.normalize();

            writer.put_bit(sl.fixed_pic_rate_general_flag);

            if !sl.fixed_pic_rate_general_flag {
                writer.put_bit(sl.fixed_pic_rate_within_cvs_flag);
            }

            if sl.fixed_pic_rate_within_cvs_flag {
                writer.put_ue(sl.elemental_duration_in_tc_minus1);
            } else {
                writer.put_bit(sl.low_delay_hrd_flag);
            }

            if !sl.low_delay_hrd_flag {
                writer.put_ue(sl.cpb_cnt_minus1);
            }

            if self.nal_hrd_parameters_present_flag {
                self.write_cpb_specs(writer, &sl.nal, sl.cpb_cnt_minus1);
            }

            if self.vcl_hrd_parameters_present_flag {
                self.write_cpb_specs(writer, &sl.vcl, sl.cpb_cnt_minus1);
            }
        }
    }

    fn write_cpb_specs(&self, writer: &mut BitWriter, specs: &[CpbSpec], cpb_cnt_minus1: u32) {
        let default = CpbSpec::default();

        for i in 0..=cpb_cnt_minus1 as usize {
            let cpb = specs.get(i).unwrap_or(&default);

            writer.put_ue(cpb.bit_rate_value_minus1);
            writer.put_ue(cpb.cpb_size_value_minus1);

            if self.sub_pic_hrd_params_present_flag {
                writer.put_ue(cpb.cpb_size_du_value_minus1);
                writer.put_ue(cpb.bit_rate_du_value_minus1);
            }

            writer.put_bit(cpb.cbr_flag);
        }
    }

    pub fn parse(reader: &mut BitReader, common_inf_present: bool, max_sub_layers_minus1: u8) -> Result<Self> {
        let mut hrd = HrdParameters::default();

        if common_inf_present {
            hrd.nal_hrd_parameters_present_flag = reader.get_bit()?;
            hrd.vcl_hrd_parameters_present_flag = reader.get_bit()?;

            if hrd.vcl_hrd_parameters_present_flag {
                return Err(HeaderError::Unsupported("VCL HRD parameters"));
            }

            if hrd.cpb_dpb_delays_present() {
                hrd.sub_pic_hrd_params_present_flag = reader.get_bit()?;

                if hrd.sub_pic_hrd_params_present_flag {
                    hrd.tick_divisor_minus2 = reader.get_n(8)?;
                    hrd.du_cpb_removal_delay_increment_length_minus1 = reader.get_n(5)?;
                    hrd.sub_pic_cpb_params_in_pic_timing_sei_flag = reader.get_bit()?;
                    hrd.dpb_output_delay_du_length_minus1 = reader.get_n(5)?;
                }

                hrd.bit_rate_scale = reader.get_n(4)?;
                hrd.cpb_size_scale = reader.get_n(4)?;

                if hrd.sub_pic_hrd_params_present_flag {
                    hrd.cpb_size_du_scale = reader.get_n(4)?;
                }

                hrd.initial_cpb_removal_delay_length_minus1 = reader.get_n(5)?;
                hrd.au_cpb_removal_delay_length_minus1 = reader.get_n(5)?;
                hrd.dpb_output_delay_length_minus1 = reader.get_n(5)?;
            }
        }

        for _ in 0..=max_sub_layers_minus1 {
            let mut sl = HrdSubLayer {
                fixed_pic_rate_general_flag: reader.get_bit()?,
                ..Default::default()
            };

            sl.fixed_pic_rate_within_cvs_flag = if sl.fixed_pic_rate_general_flag {
                true
            } else {
                reader.get_bit()?
            };

            if sl.fixed_pic_rate_within_cvs_flag {
                sl.elemental_duration_in_tc_minus1 = reader.get_ue()?;
            } else {
                sl.low_delay_hrd_flag = reader.get_bit()?;
            }

            if !sl.low_delay_hrd_flag {
                sl.cpb_cnt_minus1 = reader.get_ue()?;

                if sl.cpb_cnt_minus1 > 31 {
                    return Err(HeaderError::InvalidParam("cpb_cnt_minus1 out of range"));
                }
            }

            if hrd.nal_hrd_parameters_present_flag {
                sl.nal = hrd.parse_cpb_specs(reader, sl.cpb_cnt_minus1)?;
            }

            hrd.sub_layers.push(sl);
        }

        Ok(hrd)
    }

    fn parse_cpb_specs(&self, reader: &mut BitReader, cpb_cnt_minus1: u32) -> Result<Vec<CpbSpec>> {
        (0..=cpb_cnt_minus1)
            .map(|_| {
                let mut cpb = CpbSpec {
                    bit_rate_value_minus1: reader.get_ue()?,
                    cpb_size_value_minus1: reader.get_ue()?,
                    ..Default::default()
                };

                if self.sub_pic_hrd_params_present_flag {
                    cpb.cpb_size_du_value_minus1 = reader.get_ue()?;
                    cpb.bit_rate_du_value_minus1 = reader.get_ue()?;
                }

                cpb.cbr_flag = reader.get_bit()?;

                Ok(cpb)
            })
            .collect()
    }
}
