#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hrd_parameters::HrdParameters;
use super::profile_tier_level::ProfileTierLevel;
use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VpsNal {
    pub vps_video_parameter_set_id: u8,
    pub vps_max_layers_minus1: u8,
    pub vps_max_sub_layers_minus1: u8,
    pub vps_temporal_id_nesting_flag: bool,
    pub ptl: ProfileTierLevel,

    pub vps_sub_layer_ordering_info_present_flag: bool,
    pub sub_layer_ordering: Vec<SubLayerOrdering>,

    pub vps_max_layer_id: u8,
    pub vps_num_layer_sets_minus1: u32,
    /// `layer_id_included_flag[i][j]` for layer sets 1..=vps_num_layer_sets_minus1.
    pub layer_id_included_flags: Vec<Vec<bool>>,

    pub vps_timing_info_present_flag: bool,
    pub vps_num_units_in_tick: u32,
    pub vps_time_scale: u32,
    pub vps_poc_proportional_to_timing_flag: bool,
    pub vps_num_ticks_poc_diff_one_minus1: u32,
    pub hrd: Vec<VpsHrd>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VpsHrd {
    pub hrd_layer_set_idx: u32,
    /// Inferred 1 for the first entry.
    pub cprms_present_flag: bool,
    pub hrd_parameters: HrdParameters,
}

/// sps/vps_max_dec_pic_buffering_minus1, max_num_reorder_pics and max_latency_increase_plus1
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubLayerOrdering {
    pub max_dec_pic_buffering_minus1: u32,
    pub max_num_reorder_pics: u32,
    pub max_latency_increase_plus1: u32,
}

impl SubLayerOrdering {
    /// Writes the entries from 0 (or only the highest when `info_present` is unset).
    pub fn write_all(
        writer: &mut BitWriter,
        entries: &[SubLayerOrdering],
        info_present: bool,
        max_sub_layers_minus1: u8,
    ) {
        let start = if info_present { 0 } else { max_sub_layers_minus1 };
        let default = SubLayerOrdering::default();

        for i in start..=max_sub_layers_minus1 {
            let slo = entries.get(i as usize).unwrap_or(&default);

            writer.put_ue(slo.max_dec_pic_buffering_minus1);
            writer.put_ue(slo.max_num_reorder_pics);
            writer.put_ue(slo.max_latency_increase_plus1);
        }
    }

    /// Always returns `max_sub_layers_minus1 + 1` entries, lower sub-layers
    /// inferred from the highest one when not signalled.
    pub fn parse_all(
        reader: &mut BitReader,
        info_present: bool,
        max_sub_layers_minus1: u8,
    ) -> Result<Vec<SubLayerOrdering>> {
        let start = if info_present { 0 } else { max_sub_layers_minus1 };

        let mut entries = (start..=max_sub_layers_minus1)
            .map(|_| -> Result<SubLayerOrdering> {
                Ok(SubLayerOrdering {
                    max_dec_pic_buffering_minus1: reader.get_ue()?,
                    max_num_reorder_pics: reader.get_ue()?,
                    max_latency_increase_plus1: reader.get_ue()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if !info_present {
            let highest = entries[0];
            entries = vec![highest; max_sub_layers_minus1 as usize + 1];
        }

        Ok(entries)
    }
}

impl VpsNal {
    pub fn write(&self, writer: &mut BitWriter) {
        writer.put_bits(4, self.vps_video_parameter_set_id as u32);

        // vps_base_layer_internal_flag, vps_base_layer_available_flag
        writer.put_bits(2, 3);

        writer.put_bits(6, self.vps_max_layers_minus1 as u32);
        writer.put_bits(3, self.vps_max_sub_layers_minus1 as u32);
        writer.put_bit(self.vps_temporal_id_nesting_flag);
        writer.put_bits(16, 0xFFFF);

        self.ptl.write(writer, self.vps_max_sub_layers_minus1);

        writer.put_bit(self.vps_sub_layer_ordering_info_present_flag);
        SubLayerOrdering::write_all(
            writer,
            &self.sub_layer_ordering,
            self.vps_sub_layer_ordering_info_present_flag,
            self.vps_max_sub_layers_minus1,
        );

        writer.put_bits(6, self.vps_max_layer_id as u32);
        writer.put_ue(self.vps_num_layer_sets_minus1);

        for i in 1..=self.vps_num_layer_sets_minus1 as usize {
            let flags = self.layer_id_included_flags.get(i - 1);

            for j in 0..=self.vps_max_layer_id as usize {
                writer.put_bit(flags.and_then(|f| f.get(j)).copied().unwrap_or(false));
            }
        }

        writer.put_bit(self.vps_timing_info_present_flag);

        if self.vps_timing_info_present_flag {
            writer.put_bits(32, self.vps_num_units_in_tick);
            writer.put_bits(32, self.vps_time_scale);
            writer.put_bit(self.vps_poc_proportional_to_timing_flag);

            if self.vps_poc_proportional_to_timing_flag {
                writer.put_ue(self.vps_num_ticks_poc_diff_one_minus1);
            }

            writer.put_ue(self.hrd.len() as u32);

            for (i, hrd) in self.hrd.iter().enumerate() {
                let cprms_present = i == 0 || hrd.cprms_present_flag;

                writer.put_ue(hrd.hrd_layer_set_idx);

                if i > 0 {
                    writer.put_bit(hrd.cprms_present_flag);
                }

                hrd.hrd_parameters
                    .write(writer, cprms_present, self.vps_max_sub_layers_minus1);
            }
        }

        writer.put_bit(false); // vps_extension_flag
        writer.put_trailing_bits(false);
    }

    pub fn parse(reader: &mut BitReader) -> Result<VpsNal> {
        let mut vps = VpsNal {
            vps_video_parameter_set_id: reader.get_n(4)?,
            ..Default::default()
        };

        if reader.get_n(2)? != 3 {
            return Err(HeaderError::InvalidParam("vps_reserved_three_2bits"));
        }

        vps.vps_max_layers_minus1 = reader.get_n(6)?;
        vps.vps_max_sub_layers_minus1 = reader.get_n(3)?;
        vps.vps_temporal_id_nesting_flag = reader.get_bit()?;

        if reader.get_bits(16)? != 0xFFFF {
            return Err(HeaderError::InvalidParam("vps_reserved_0xffff_16bits"));
        }

        if vps.vps_max_sub_layers_minus1 > 6 {
            return Err(HeaderError::InvalidParam("vps_max_sub_layers_minus1 out of range"));
        }

        vps.ptl = ProfileTierLevel::parse(reader, vps.vps_max_sub_layers_minus1)?;

        vps.vps_sub_layer_ordering_info_present_flag = reader.get_bit()?;
        vps.sub_layer_ordering = SubLayerOrdering::parse_all(
            reader,
            vps.vps_sub_layer_ordering_info_present_flag,
            vps.vps_max_sub_layers_minus1,
        )?;

        vps.vps_max_layer_id = reader.get_n(6)?;
        vps.vps_num_layer_sets_minus1 = reader.get_ue()?;

        if vps.vps_num_layer_sets_minus1 > 1023 {
            return Err(HeaderError::InvalidParam("vps_num_layer_sets_minus1 out of range"));
        }

        for _ in 1..=vps.vps_num_layer_sets_minus1 {
            let flags = (0..=vps.vps_max_layer_id)
                .map(|_| reader.get_bit())
                .collect::<std::result::Result<Vec<_>, _>>()?;

            vps.layer_id_included_flags.push(flags);
        }

        vps.vps_timing_info_present_flag = reader.get_bit()?;

        if vps.vps_timing_info_present_flag {
            vps.vps_num_units_in_tick = reader.get_bits(32)?;
            vps.vps_time_scale = reader.get_bits(32)?;
            vps.vps_poc_proportional_to_timing_flag = reader.get_bit()?;

            if vps.vps_poc_proportional_to_timing_flag {
                vps.vps_num_ticks_poc_diff_one_minus1 = reader.get_ue()?;
            }

            let vps_num_hrd_parameters = reader.get_ue()?;

            if vps_num_hrd_parameters > vps.vps_num_layer_sets_minus1 + 1 {
                return Err(HeaderError::InvalidParam("vps_num_hrd_parameters out of range"));
            }

            for i in 0..vps_num_hrd_parameters {
                let hrd_layer_set_idx = reader.get_ue()?;
                let cprms_present_flag = if i > 0 { reader.get_bit()? } else { true };

                let hrd_parameters = HrdParameters::parse(
                    reader,
                    cprms_present_flag,
                    vps.vps_max_sub_layers_minus1,
                )?;

                vps.hrd.push(VpsHrd {
                    hrd_layer_set_idx,
                    cprms_present_flag,
                    hrd_parameters,
                });
            }
        }

        if reader.get_bit()? {
            return Err(HeaderError::Unsupported("vps_extension_flag"));
        }

        Ok(vps)
    }
}
