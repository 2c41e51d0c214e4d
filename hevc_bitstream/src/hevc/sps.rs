#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::profile_tier_level::ProfileTierLevel;
use super::short_term_rps::ShortTermRps;
use super::vps::SubLayerOrdering;
use super::vui_parameters::VuiParameters;
use super::MAX_NUM_ST_RPS;
use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpsNal {
    pub sps_video_parameter_set_id: u8,
    pub sps_max_sub_layers_minus1: u8,
    pub sps_temporal_id_nesting_flag: bool,
    pub ptl: ProfileTierLevel,

    pub sps_seq_parameter_set_id: u32,
    pub chroma_format_idc: u32,
    pub separate_colour_plane_flag: bool,
    pub pic_width_in_luma_samples: u32,
    pub pic_height_in_luma_samples: u32,

    pub conformance_window_flag: bool,
    pub conf_win_left_offset: u32,
    pub conf_win_right_offset: u32,
    pub conf_win_top_offset: u32,
    pub conf_win_bottom_offset: u32,

    pub bit_depth_luma_minus8: u32,
    pub bit_depth_chroma_minus8: u32,
    pub log2_max_pic_order_cnt_lsb_minus4: u32,

    pub sps_sub_layer_ordering_info_present_flag: bool,
    pub sub_layer_ordering: Vec<SubLayerOrdering>,

    pub log2_min_luma_coding_block_size_minus3: u32,
    pub log2_diff_max_min_luma_coding_block_size: u32,
    pub log2_min_luma_transform_block_size_minus2: u32,
    pub log2_diff_max_min_luma_transform_block_size: u32,
    pub max_transform_hierarchy_depth_inter: u32,
    pub max_transform_hierarchy_depth_intra: u32,

    /// Written with sps_scaling_list_data_present_flag = 0 (default lists), rejected by the reader.
    pub scaling_list_enabled_flag: bool,
    pub amp_enabled_flag: bool,
    pub sample_adaptive_offset_enabled_flag: bool,

    pub pcm_enabled_flag: bool,
    pub pcm_sample_bit_depth_luma_minus1: u8,
    pub pcm_sample_bit_depth_chroma_minus1: u8,
    pub log2_min_pcm_luma_coding_block_size_minus3: u32,
    pub log2_diff_max_min_pcm_luma_coding_block_size: u32,
    pub pcm_loop_filter_disabled_flag: bool,

    pub short_term_ref_pic_sets: Vec<ShortTermRps>,

    pub long_term_ref_pics_present_flag: bool,
    pub long_term_ref_pics: Vec<LongTermRefPicSps>,

    pub sps_temporal_mvp_enabled_flag: bool,
    pub strong_intra_smoothing_enabled_flag: bool,

    pub vui_parameters_present_flag: bool,
    pub vui_parameters: VuiParameters,

    pub sps_extension_present_flag: bool,
    pub sps_range_extension_flag: bool,
    pub range_extension: SpsRangeExtension,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LongTermRefPicSps {
    pub lt_ref_pic_poc_lsb_sps: u32,
    pub used_by_curr_pic_lt_sps_flag: bool,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpsRangeExtension {
    pub transform_skip_rotation_enabled_flag: bool,
    pub transform_skip_context_enabled_flag: bool,
    pub implicit_rdpcm_enabled_flag: bool,
    pub explicit_rdpcm_enabled_flag: bool,
    pub extended_precision_processing_flag: bool,
    pub intra_smoothing_disabled_flag: bool,
    pub high_precision_offsets_enabled_flag: bool,
    pub persistent_rice_adaptation_enabled_flag: bool,
    pub cabac_bypass_alignment_enabled_flag: bool,
}

impl SpsNal {
    pub fn chroma_array_type(&self) -> u32 {
        if self.separate_colour_plane_flag {
            0
        } else {
            self.chroma_format_idc
        }
    }

    pub fn bit_depth_chroma(&self) -> u32 {
        self.bit_depth_chroma_minus8 + 8
    }

    pub fn log2_max_poc_lsb(&self) -> u32 {
        self.log2_max_pic_order_cnt_lsb_minus4 + 4
    }

    pub fn log2_min_cb_size(&self) -> u32 {
        self.log2_min_luma_coding_block_size_minus3 + 3
    }

    pub fn log2_ctb_size(&self) -> u32 {
        self.log2_min_cb_size() + self.log2_diff_max_min_luma_coding_block_size
    }

    pub fn ctb_size(&self) -> u32 {
        1 << self.log2_ctb_size()
    }

    pub fn pic_width_in_ctbs(&self) -> u32 {
        self.pic_width_in_luma_samples.div_ceil(self.ctb_size())
    }

    pub fn pic_height_in_ctbs(&self) -> u32 {
        self.pic_height_in_luma_samples.div_ceil(self.ctb_size())
    }

    pub fn pic_size_in_ctbs(&self) -> u32 {
        self.pic_width_in_ctbs() * self.pic_height_in_ctbs()
    }

    pub fn num_short_term_ref_pic_sets(&self) -> usize {
        self.short_term_ref_pic_sets.len()
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.put_bits(4, self.sps_video_parameter_set_id as u32);
        writer.put_bits(3, self.sps_max_sub_layers_minus1 as u32);
        writer.put_bit(self.sps_temporal_id_nesting_flag);

        self.ptl.write(writer, self.sps_max_sub_layers_minus1);

        writer.put_ue(self.sps_seq_parameter_set_id);
        writer.put_ue(self.chroma_format_idc);

        if self.chroma_format_idc == 3 {
            writer.put_bit(self.separate_colour_plane_flag);
        }

        writer.put_ue(self.pic_width_in_luma_samples);
        writer.put_ue(self.pic_height_in_luma_samples);

        writer.put_bit(self.conformance_window_flag);
        if self.conformance_window_flag {
            writer.put_ue(self.conf_win_left_offset);
            writer.put_ue(self.conf_win_right_offset);
            writer.put_ue(self.conf_win_top_offset);
            writer.put_ue(self.conf_win_bottom_offset);
        }

        writer.put_ue(self.bit_depth_luma_minus8);
        writer.put_ue(self.bit_depth_chroma_minus8);
        writer.put_ue(self.log2_max_pic_order_cnt_lsb_minus4);

        writer.put_bit(self.sps_sub_layer_ordering_info_present_flag);
        SubLayerOrdering::write_all(
            writer,
            &self.sub_layer_ordering,
            self.sps_sub_layer_ordering_info_present_flag,
            self.sps_max_sub_layers_minus1,
        );

        writer.put_ue(self.log2_min_luma_coding_block_size_minus3);
        writer.put_ue(self.log2_diff_max_min_luma_coding_block_size);
        writer.put_ue(self.log2_min_luma_transform_block_size_minus2);
        writer.put_ue(self.log2_diff_max_min_luma_transform_block_size);
        writer.put_ue(self.max_transform_hierarchy_depth_inter);
        writer.put_ue(self.max_transform_hierarchy_depth_intra);

        writer.put_bit(self.scaling_list_enabled_flag);
        if self.scaling_list_enabled_flag {
            writer.put_bit(false); // sps_scaling_list_data_present_flag
        }

        writer.put_bit(self.amp_enabled_flag);
        writer.put_bit(self.sample_adaptive_offset_enabled_flag);

        writer.put_bit(self.pcm_enabled_flag);
        if self.pcm_enabled_flag {
            writer.put_bits(4, self.pcm_sample_bit_depth_luma_minus1 as u32);
            writer.put_bits(4, self.pcm_sample_bit_depth_chroma_minus1 as u32);
            writer.put_ue(self.log2_min_pcm_luma_coding_block_size_minus3);
            writer.put_ue(self.log2_diff_max_min_pcm_luma_coding_block_size);
            writer.put_bit(self.pcm_loop_filter_disabled_flag);
        }

        let num_sets = self.num_short_term_ref_pic_sets();
        writer.put_ue(num_sets as u32);

        for (idx, rps) in self.short_term_ref_pic_sets.iter().enumerate() {
            rps.write(writer, idx, num_sets);
        }

        writer.put_bit(self.long_term_ref_pics_present_flag);
        if self.long_term_ref_pics_present_flag {
            writer.put_ue(self.long_term_ref_pics.len() as u32);

            for lt in &self.long_term_ref_pics {
                writer.put_bits(self.log2_max_poc_lsb() as usize, lt.lt_ref_pic_poc_lsb_sps);
                writer.put_bit(lt.used_by_curr_pic_lt_sps_flag);
            }
        }

        writer.put_bit(self.sps_temporal_mvp_enabled_flag);
        writer.put_bit(self.strong_intra_smoothing_enabled_flag);

        writer.put_bit(self.vui_parameters_present_flag);
        if self.vui_parameters_present_flag {
            self.vui_parameters
                .write(writer, self.sps_max_sub_layers_minus1);
        }

        writer.put_bit(self.sps_extension_present_flag);
        if self.sps_extension_present_flag {
            writer.put_bit(self.sps_range_extension_flag);
            writer.put_bits(7, 0); // sps_extension_7bits
        }

        if self.sps_range_extension_flag {
            let ext = &self.range_extension;

            writer.put_bit(ext.transform_skip_rotation_enabled_flag);
            writer.put_bit(ext.transform_skip_context_enabled_flag);
            writer.put_bit(ext.implicit_rdpcm_enabled_flag);
            writer.put_bit(ext.explicit_rdpcm_enabled_flag);
            writer.put_bit(ext.extended_precision_processing_flag);
            writer.put_bit(ext.intra_smoothing_disabled_flag);
            writer.put_bit(ext.high_precision_offsets_enabled_flag);
            writer.put_bit(ext.persistent_rice_adaptation_enabled_flag);
            writer.put_bit(ext.cabac_bypass_alignment_enabled_flag);
        }

        writer.put_trailing_bits(false);
    }

    pub fn parse(reader: &mut BitReader) -> Result<SpsNal> {
        let mut sps = SpsNal {
            sps_video_parameter_set_id: reader.get_n(4)?,
            sps_max_sub_layers_minus1: reader.get_n(3)?,
            sps_temporal_id_nesting_flag: reader.get_bit()?,
            ..Default::default()
        };

        if sps.sps_max_sub_layers_minus1 > 6 {
            return Err(HeaderError::InvalidParam("sps_max_sub_layers_minus1 out of range"));
        }

        sps.ptl = ProfileTierLevel::parse(reader, sps.sps_max_sub_layers_minus1)?;

        sps.sps_seq_parameter_set_id = reader.get_ue()?;
        if sps.sps_seq_parameter_set_id > 15 {
            return Err(HeaderError::InvalidParam("sps_seq_parameter_set_id out of range"));
        }

        sps.chroma_format_idc = reader.get_ue()?;
        if sps.chroma_format_idc > 3 {
            return Err(HeaderError::InvalidParam("chroma_format_idc out of range"));
        }

        if sps.chroma_format_idc == 3 {
            sps.separate_colour_plane_flag = reader.get_bit()?;
        }

        sps.pic_width_in_luma_samples = reader.get_ue()?;
        sps.pic_height_in_luma_samples = reader.get_ue()?;

        sps.conformance_window_flag = reader.get_bit()?;
        if sps.conformance_window_flag {
            sps.conf_win_left_offset = reader.get_ue()?;
            sps.conf_win_right_offset = reader.get_ue()?;
            sps.conf_win_top_offset = reader.get_ue()?;
            sps.conf_win_bottom_offset = reader.get_ue()?;
        }

        sps.bit_depth_luma_minus8 = reader.get_ue()?;
        sps.bit_depth_chroma_minus8 = reader.get_ue()?;

        sps.log2_max_pic_order_cnt_lsb_minus4 = reader.get_ue()?;
        if sps.log2_max_pic_order_cnt_lsb_minus4 > 12 {
            return Err(HeaderError::InvalidParam("log2_max_pic_order_cnt_lsb_minus4 out of range"));
        }

        sps.sps_sub_layer_ordering_info_present_flag = reader.get_bit()?;
        sps.sub_layer_ordering = SubLayerOrdering::parse_all(
            reader,
            sps.sps_sub_layer_ordering_info_present_flag,
            sps.sps_max_sub_layers_minus1,
        )?;

        sps.log2_min_luma_coding_block_size_minus3 = reader.get_ue()?;
        sps.log2_diff_max_min_luma_coding_block_size = reader.get_ue()?;

        if sps.log2_min_luma_coding_block_size_minus3 > 3
            || sps.log2_diff_max_min_luma_coding_block_size > 3
            || sps.log2_ctb_size() > 6
        {
            return Err(HeaderError::InvalidParam("CTB size out of range"));
        }

        sps.log2_min_luma_transform_block_size_minus2 = reader.get_ue()?;
        sps.log2_diff_max_min_luma_transform_block_size = reader.get_ue()?;
        sps.max_transform_hierarchy_depth_inter = reader.get_ue()?;
        sps.max_transform_hierarchy_depth_intra = reader.get_ue()?;

        sps.scaling_list_enabled_flag = reader.get_bit()?;
        if sps.scaling_list_enabled_flag {
            return Err(HeaderError::Unsupported("scaling_list_enabled_flag"));
        }

        sps.amp_enabled_flag = reader.get_bit()?;
        sps.sample_adaptive_offset_enabled_flag = reader.get_bit()?;

        sps.pcm_enabled_flag = reader.get_bit()?;
        if sps.pcm_enabled_flag {
            sps.pcm_sample_bit_depth_luma_minus1 = reader.get_n(4)?;
            sps.pcm_sample_bit_depth_chroma_minus1 = reader.get_n(4)?;
            sps.log2_min_pcm_luma_coding_block_size_minus3 = reader.get_ue()?;
            sps.log2_diff_max_min_pcm_luma_coding_block_size = reader.get_ue()?;
            sps.pcm_loop_filter_disabled_flag = reader.get_bit()?;
        }

        let num_sets = reader.get_ue()? as usize;
        if num_sets > MAX_NUM_ST_RPS {
            return Err(HeaderError::InvalidParam("num_short_term_ref_pic_sets out of range"));
        }

        for idx in 0..num_sets {
            let rps = ShortTermRps::parse(reader, &sps.short_term_ref_pic_sets, idx, num_sets)?;
            sps.short_term_ref_pic_sets.push(rps);
        }

        sps.long_term_ref_pics_present_flag = reader.get_bit()?;
        if sps.long_term_ref_pics_present_flag {
            let num_long_term_ref_pics_sps = reader.get_ue()?;

            if num_long_term_ref_pics_sps > 32 {
                return Err(HeaderError::InvalidParam("num_long_term_ref_pics_sps out of range"));
            }

            for _ in 0..num_long_term_ref_pics_sps {
                sps.long_term_ref_pics.push(LongTermRefPicSps {
                    lt_ref_pic_poc_lsb_sps: reader.get_bits(sps.log2_max_poc_lsb() as usize)?,
                    used_by_curr_pic_lt_sps_flag: reader.get_bit()?,
                });
            }
        }

        sps.sps_temporal_mvp_enabled_flag = reader.get_bit()?;
        sps.strong_intra_smoothing_enabled_flag = reader.get_bit()?;

        sps.vui_parameters_present_flag = reader.get_bit()?;
        if sps.vui_parameters_present_flag {
            sps.vui_parameters = VuiParameters::parse(reader, sps.sps_max_sub_layers_minus1)?;
        }

        sps.sps_extension_present_flag = reader.get_bit()?;
        if sps.sps_extension_present_flag {
            sps.sps_range_extension_flag = reader.get_bit()?;

            if reader.get_n(7)? != 0 {
                return Err(HeaderError::Unsupported("sps_extension_7bits"));
            }
        }

        if sps.sps_range_extension_flag {
            sps.range_extension = SpsRangeExtension {
                transform_skip_rotation_enabled_flag: reader.get_bit()?,
                transform_skip_context_enabled_flag: reader.get_bit()?,
                implicit_rdpcm_enabled_flag: reader.get_bit()?,
                explicit_rdpcm_enabled_flag: reader.get_bit()?,
                extended_precision_processing_flag: reader.get_bit()?,
                intra_smoothing_disabled_flag: reader.get_bit()?,
                high_precision_offsets_enabled_flag: reader.get_bit()?,
                persistent_rice_adaptation_enabled_flag: reader.get_bit()?,
                cabac_bypass_alignment_enabled_flag: reader.get_bit()?,
            };
        }

        Ok(sps)
    }
}
