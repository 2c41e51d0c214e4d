#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hrd_parameters::HrdParameters;
use crate::bits::{BitReader, BitWriter};
use crate::error::Result;

pub const EXTENDED_SAR: u8 = 255;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VuiParameters {
    pub aspect_ratio_info_present_flag: bool,
    pub aspect_ratio_idc: u8,
    pub sar_width: u16,
    pub sar_height: u16,

    pub overscan_info_present_flag: bool,
    pub overscan_appropriate_flag: bool,

    pub video_signal_type_present_flag: bool,
    pub video_format: u8,
    pub video_full_range_flag: bool,
    pub colour_description_present_flag: bool,
    pub colour_primaries: u8,
    pub transfer_characteristics: u8,
    pub matrix_coeffs: u8,

    pub chroma_loc_info_present_flag: bool,
    pub chroma_sample_loc_type_top_field: u32,
    pub chroma_sample_loc_type_bottom_field: u32,

    pub neutral_chroma_indication_flag: bool,
    pub field_seq_flag: bool,
    pub frame_field_info_present_flag: bool,

    pub default_display_window_flag: bool,
    pub def_disp_win_left_offset: u32,
    pub def_disp_win_right_offset: u32,
    pub def_disp_win_top_offset: u32,
    pub def_disp_win_bottom_offset: u32,

    pub timing_info_present_flag: bool,
    pub num_units_in_tick: u32,
    pub time_scale: u32,
    pub poc_proportional_to_timing_flag: bool,
    pub num_ticks_poc_diff_one_minus1: u32,
    pub hrd_parameters_present_flag: bool,
    pub hrd_parameters: HrdParameters,

    pub bitstream_restriction_flag: bool,
    pub tiles_fixed_structure_flag: bool,
    pub motion_vectors_over_pic_boundaries_flag: bool,
    pub restricted_ref_pic_lists_flag: bool,
    pub min_spatial_segmentation_idc: u32,
    pub max_bytes_per_pic_denom: u32,
    pub max_bits_per_min_cu_denom: u32,
    pub log2_max_mv_length_horizontal: u32,
    pub log2_max_mv_length_vertical: u32,
}

impl VuiParameters {
    pub fn write(&self, writer: &mut BitWriter, max_sub_layers_minus1: u8) {
        writer.put_bit(self.aspect_ratio_info_present_flag);
        if self.aspect_ratio_info_present_flag {
            writer.put_bits(8, self.aspect_ratio_idc as u32);

            if self.aspect_ratio_idc == EXTENDED_SAR {
                writer.put_bits(16, self.sar_width as u32);
                writer.put_bits(16, self.sar_height as u32);
            }
        }

        writer.put_bit(self.overscan_info_present_flag);
        if self.overscan_info_present_flag {
            writer.put_bit(self.overscan_appropriate_flag);
        }

        writer.put_bit(self.video_signal_type_present_flag);
        if self.video_signal_type_present_flag {
            writer.put_bits(3, self.video_format as u32);
            writer.put_bit(self.video_full_range_flag);
            writer.put_bit(self.colour_description_present_flag);

            if self.colour_description_present_flag {
                writer.put_bits(8, self.colour_primaries as u32);
                writer.put_bits(8, self.transfer_characteristics as u32);
                writer.put_bits(8, self.matrix_coeffs as u32);
            }
        }

        writer.put_bit(self.chroma_loc_info_present_flag);
        if self.chroma_loc_info_present_flag {
            writer.put_ue(self.chroma_sample_loc_type_top_field);
            writer.put_ue(self.chroma_sample_loc_type_bottom_field);
        }

        writer.put_bit(self.neutral_chroma_indication_flag);
        writer.put_bit(self.field_seq_flag);
        writer.put_bit(self.frame_field_info_present_flag);

        writer.put_bit(self.default_display_window_flag);
        if self.default_display_window_flag {
            writer.put_ue(self.def_disp_win_left_offset);
            writer.put_ue(self.def_disp_win_right_offset);
            writer.put_ue(self.def_disp_win_top_offset);
            writer.put_ue(self.def_disp_win_bottom_offset);
        }

        writer.put_bit(self.timing_info_present_flag);
        if self.timing_info_present_flag {
            writer.put_bits(32, self.num_units_in_tick);
            writer.put_bits(32, self.time_scale);
            writer.put_bit(self.poc_proportional_to_timing_flag);

            if self.poc_proportional_to_timing_flag {
                writer.put_ue(self.num_ticks_poc_diff_one_minus1);
            }

            writer.put_bit(self.hrd_parameters_present_flag);
            if self.hrd_parameters_present_flag {
                self.hrd_parameters.write(writer, true, max_sub_layers_minus1);
            }
        }

        writer.put_bit(self.bitstream_restriction_flag);
        if self.bitstream_restriction_flag {
            writer.put_bit(self.tiles_fixed_structure_flag);
            writer.put_bit(self.motion_vectors_over_pic_boundaries_flag);
            writer.put_bit(self.restricted_ref_pic_lists_flag);
            writer.put_ue(self.min_spatial_segmentation_idc);
            writer.put_ue(self.max_bytes_per_pic_denom);
            writer.put_ue(self.max_bits_per_min_cu_denom);
            writer.put_ue(self.log2_max_mv_length_horizontal);
            writer.put_ue(self.log2_max_mv_length_vertical);
        }
    }

    pub fn parse(reader: &mut BitReader, max_sub_layers_minus1: u8) -> Result<VuiParameters> {
        let mut vui = VuiParameters {
            aspect_ratio_info_present_flag: reader.get_bit()?,
            ..Default::default()
        };

        if vui.aspect_ratio_info_present_flag {
            vui.aspect_ratio_idc = reader.get_n(8)?;

            if vui.aspect_ratio_idc == EXTENDED_SAR {
                vui.sar_width = reader.get_bits(16)? as u16;
                vui.sar_height = reader.get_bits(16)? as u16;
            }
        }

        vui.overscan_info_present_flag = reader.get_bit()?;
        if vui.overscan_info_present_flag {
            vui.overscan_appropriate_flag = reader.get_bit()?;
        }

        vui.video_signal_type_present_flag = reader.get_bit()?;
        if vui.video_signal_type_present_flag {
            vui.video_format = reader.get_n(3)?;
            vui.video_full_range_flag = reader.get_bit()?;
            vui.colour_description_present_flag = reader.get_bit()?;

            if vui.colour_description_present_flag {
                vui.colour_primaries = reader.get_n(8)?;
                vui.transfer_characteristics = reader.get_n(8)?;
                vui.matrix_coeffs = reader.get_n(8)?;
            }
        }

        vui.chroma_loc_info_present_flag = reader.get_bit()?;
        if vui.chroma_loc_info_present_flag {
            vui.chroma_sample_loc_type_top_field = reader.get_ue()?;
            vui.chroma_sample_loc_type_bottom_field = reader.get_ue()?;
        }

        vui.neutral_chroma_indication_flag = reader.get_bit()?;
        vui.field_seq_flag = reader.get_bit()?;
        vui.frame_field_info_present_flag = reader.get_bit()?;

        vui.default_display_window_flag = reader.get_bit()?;
        if vui.default_display_window_flag {
            vui.def_disp_win_left_offset = reader.get_ue()?;
            vui.def_disp_win_right_offset = reader.get_ue()?;
            vui.def_disp_win_top_offset = reader.get_ue()?;
            vui.def_disp_win_bottom_offset = reader.get_ue()?;
        }

        vui.timing_info_present_flag = reader.get_bit()?;
        if vui.timing_info_present_flag {
            vui.num_units_in_tick = reader.get_bits(32)?;
            vui.time_scale = reader.get_bits(32)?;
            vui.poc_proportional_to_timing_flag = reader.get_bit()?;

            if vui.poc_proportional_to_timing_flag {
                vui.num_ticks_poc_diff_one_minus1 = reader.get_ue()?;
            }

            vui.hrd_parameters_present_flag = reader.get_bit()?;
            if vui.hrd_parameters_present_flag {
                vui.hrd_parameters = HrdParameters::parse(reader, true, max_sub_layers_minus1)?;
            }
        }

        vui.bitstream_restriction_flag = reader.get_bit()?;
        if vui.bitstream_restriction_flag {
            vui.tiles_fixed_structure_flag = reader.get_bit()?;
            vui.motion_vectors_over_pic_boundaries_flag = reader.get_bit()?;
            vui.restricted_ref_pic_lists_flag = reader.get_bit()?;
            vui.min_spatial_segmentation_idc = reader.get_ue()?;
            vui.max_bytes_per_pic_denom = reader.get_ue()?;
            vui.max_bits_per_min_cu_denom = reader.get_ue()?;
            vui.log2_max_mv_length_horizontal = reader.get_ue()?;
            vui.log2_max_mv_length_vertical = reader.get_ue()?;
        }

        Ok(vui)
    }
}
