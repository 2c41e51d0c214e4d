#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PpsNal {
    pub pps_pic_parameter_set_id: u32,
    pub pps_seq_parameter_set_id: u32,
    pub dependent_slice_segments_enabled_flag: bool,
    pub output_flag_present_flag: bool,
    pub num_extra_slice_header_bits: u8,
    pub sign_data_hiding_enabled_flag: bool,
    pub cabac_init_present_flag: bool,
    pub num_ref_idx_l0_default_active_minus1: u32,
    pub num_ref_idx_l1_default_active_minus1: u32,
    pub init_qp_minus26: i32,
    pub constrained_intra_pred_flag: bool,
    pub transform_skip_enabled_flag: bool,

    pub cu_qp_delta_enabled_flag: bool,
    pub diff_cu_qp_delta_depth: u32,

    pub pps_cb_qp_offset: i32,
    pub pps_cr_qp_offset: i32,
    pub pps_slice_chroma_qp_offsets_present_flag: bool,
    pub weighted_pred_flag: bool,
    pub weighted_bipred_flag: bool,
    pub transquant_bypass_enabled_flag: bool,
    pub tiles_enabled_flag: bool,
    pub entropy_coding_sync_enabled_flag: bool,

    pub num_tile_columns_minus1: u32,
    pub num_tile_rows_minus1: u32,
    pub uniform_spacing_flag: bool,
    pub column_width_minus1: Vec<u32>,
    pub row_height_minus1: Vec<u32>,
    pub loop_filter_across_tiles_enabled_flag: bool,

    pub pps_loop_filter_across_slices_enabled_flag: bool,

    pub deblocking_filter_control_present_flag: bool,
    pub deblocking_filter_override_enabled_flag: bool,
    pub pps_deblocking_filter_disabled_flag: bool,
    pub pps_beta_offset_div2: i32,
    pub pps_tc_offset_div2: i32,

    pub lists_modification_present_flag: bool,
    pub log2_parallel_merge_level_minus2: u32,
    pub slice_segment_header_extension_present_flag: bool,

    pub pps_extension_present_flag: bool,
    pub pps_range_extension_flag: bool,
    pub range_extension: PpsRangeExtension,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PpsRangeExtension {
    pub log2_max_transform_skip_block_size_minus2: u32,
    pub cross_component_prediction_enabled_flag: bool,
    pub chroma_qp_offset_list_enabled_flag: bool,
    pub diff_cu_chroma_qp_offset_depth: u32,
    /// cb_qp_offset_list / cr_qp_offset_list pairs, chroma_qp_offset_list_len_minus1 + 1 entries
    pub chroma_qp_offset_list: Vec<(i32, i32)>,
    pub log2_sao_offset_scale_luma: u32,
    pub log2_sao_offset_scale_chroma: u32,
}

impl PpsNal {
    pub fn init_qp(&self) -> i32 {
        26 + self.init_qp_minus26
    }

    /// chroma_qp_offset_list_enabled_flag, zero without the range extension.
    pub fn chroma_qp_offset_list_enabled(&self) -> bool {
        self.pps_range_extension_flag && self.range_extension.chroma_qp_offset_list_enabled_flag
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.put_ue(self.pps_pic_parameter_set_id);
        writer.put_ue(self.pps_seq_parameter_set_id);
        writer.put_bit(self.dependent_slice_segments_enabled_flag);
        writer.put_bit(self.output_flag_present_flag);
        writer.put_bits(3, self.num_extra_slice_header_bits as u32);
        writer.put_bit(self.sign_data_hiding_enabled_flag);
        writer.put_bit(self.cabac_init_present_flag);
        writer.put_ue(self.num_ref_idx_l0_default_active_minus1);
        writer.put_ue(self.num_ref_idx_l1_default_active_minus1);
        writer.put_se(self.init_qp_minus26);
        writer.put_bit(self.constrained_intra_pred_flag);
        writer.put_bit(self.transform_skip_enabled_flag);

        writer.put_bit(self.cu_qp_delta_enabled_flag);
        if self.cu_qp_delta_enabled_flag {
            writer.put_ue(self.diff_cu_qp_delta_depth);
        }

        writer.put_se(self.pps_cb_qp_offset);
        writer.put_se(self.pps_cr_qp_offset);
        writer.put_bit(self.pps_slice_chroma_qp_offsets_present_flag);
        writer.put_bit(self.weighted_pred_flag);
        writer.put_bit(self.weighted_bipred_flag);
        writer.put_bit(self.transquant_bypass_enabled_flag);
        writer.put_bit(self.tiles_enabled_flag);
        writer.put_bit(self.entropy_coding_sync_enabled_flag);

        if self.tiles_enabled_flag {
            writer.put_ue(self.num_tile_columns_minus1);
            writer.put_ue(self.num_tile_rows_minus1);
            writer.put_bit(self.uniform_spacing_flag);

            if !self.uniform_spacing_flag {
                for i in 0..self.num_tile_columns_minus1 as usize {
                    writer.put_ue(self.column_width_minus1.get(i).copied().unwrap_or(0));
                }

                for i in 0..self.num_tile_rows_minus1 as usize {
                    writer.put_ue(self.row_height_minus1.get(i).copied().unwrap_or(0));
                }
            }

            writer.put_bit(self.loop_filter_across_tiles_enabled_flag);
        }

        writer.put_bit(self.pps_loop_filter_across_slices_enabled_flag);

        writer.put_bit(self.deblocking_filter_control_present_flag);
        if self.deblocking_filter_control_present_flag {
            writer.put_bit(self.deblocking_filter_override_enabled_flag);
            writer.put_bit(self.pps_deblocking_filter_disabled_flag);

            if !self.pps_deblocking_filter_disabled_flag {
                writer.put_se(self.pps_beta_offset_div2);
                writer.put_se(self.pps_tc_offset_div2);
            }
        }

        writer.put_bit(false); // pps_scaling_list_data_present_flag
        writer.put_bit(self.lists_modification_present_flag);
        writer.put_ue(self.log2_parallel_merge_level_minus2);
        writer.put_bit(self.slice_segment_header_extension_present_flag);

        writer.put_bit(self.pps_extension_present_flag);
        if self.pps_extension_present_flag {
            writer.put_bit(self.pps_range_extension_flag);
            writer.put_bits(7, 0); // pps_extension_7bits
        }

        if self.pps_range_extension_flag {
            let ext = &self.range_extension;

            if self.transform_skip_enabled_flag {
                writer.put_ue(ext.log2_max_transform_skip_block_size_minus2);
            }

            writer.put_bit(ext.cross_component_prediction_enabled_flag);
            writer.put_bit(ext.chroma_qp_offset_list_enabled_flag);

            if ext.chroma_qp_offset_list_enabled_flag {
                writer.put_ue(ext.diff_cu_chroma_qp_offset_depth);
                writer.put_ue(ext.chroma_qp_offset_list.len().saturating_sub(1) as u32);

                for (cb, cr) in &ext.chroma_qp_offset_list {
                    writer.put_se(*cb);
                    writer.put_se(*cr);
                }
            }

            writer.put_ue(ext.log2_sao_offset_scale_luma);
            writer.put_ue(ext.log2_sao_offset_scale_chroma);
        }

        writer.put_trailing_bits(false);
    }

    pub fn parse(reader: &mut BitReader) -> Result<PpsNal> {
        let mut pps = PpsNal {
            pps_pic_parameter_set_id: reader.get_ue()?,
            pps_seq_parameter_set_id: reader.get_ue()?,
            ..Default::default()
        };

        if pps.pps_pic_parameter_set_id > 63 || pps.pps_seq_parameter_set_id > 15 {
            return Err(HeaderError::InvalidParam("parameter set id out of range"));
        }

        pps.dependent_slice_segments_enabled_flag = reader.get_bit()?;
        pps.output_flag_present_flag = reader.get_bit()?;
        pps.num_extra_slice_header_bits = reader.get_n(3)?;
        pps.sign_data_hiding_enabled_flag = reader.get_bit()?;
        pps.cabac_init_present_flag = reader.get_bit()?;
        pps.num_ref_idx_l0_default_active_minus1 = reader.get_ue()?;
        pps.num_ref_idx_l1_default_active_minus1 = reader.get_ue()?;

        if pps.num_ref_idx_l0_default_active_minus1 > 14
            || pps.num_ref_idx_l1_default_active_minus1 > 14
        {
            return Err(HeaderError::InvalidParam("num_ref_idx_default_active out of range"));
        }

        pps.init_qp_minus26 = reader.get_se()?;
        pps.constrained_intra_pred_flag = reader.get_bit()?;
        pps.transform_skip_enabled_flag = reader.get_bit()?;

        pps.cu_qp_delta_enabled_flag = reader.get_bit()?;
        if pps.cu_qp_delta_enabled_flag {
            pps.diff_cu_qp_delta_depth = reader.get_ue()?;
        }

        pps.pps_cb_qp_offset = reader.get_se()?;
        pps.pps_cr_qp_offset = reader.get_se()?;
        pps.pps_slice_chroma_qp_offsets_present_flag = reader.get_bit()?;
        pps.weighted_pred_flag = reader.get_bit()?;
        pps.weighted_bipred_flag = reader.get_bit()?;
        pps.transquant_bypass_enabled_flag = reader.get_bit()?;
        pps.tiles_enabled_flag = reader.get_bit()?;
        pps.entropy_coding_sync_enabled_flag = reader.get_bit()?;

        if pps.tiles_enabled_flag {
            pps.num_tile_columns_minus1 = reader.get_ue()?;
            pps.num_tile_rows_minus1 = reader.get_ue()?;

            if pps.num_tile_columns_minus1 > 19 || pps.num_tile_rows_minus1 > 21 {
                return Err(HeaderError::InvalidParam("tile count out of range"));
            }

            pps.uniform_spacing_flag = reader.get_bit()?;

            if !pps.uniform_spacing_flag {
                for _ in 0..pps.num_tile_columns_minus1 {
                    pps.column_width_minus1.push(reader.get_ue()?);
                }

                for _ in 0..pps.num_tile_rows_minus1 {
                    pps.row_height_minus1.push(reader.get_ue()?);
                }
            }

            pps.loop_filter_across_tiles_enabled_flag = reader.get_bit()?;
        }

        pps.pps_loop_filter_across_slices_enabled_flag = reader.get_bit()?;

        pps.deblocking_filter_control_present_flag = reader.get_bit()?;
        if pps.deblocking_filter_control_present_flag {
            pps.deblocking_filter_override_enabled_flag = reader.get_bit()?;
            pps.pps_deblocking_filter_disabled_flag = reader.get_bit()?;

            if !pps.pps_deblocking_filter_disabled_flag {
                pps.pps_beta_offset_div2 = reader.get_se()?;
                pps.pps_tc_offset_div2 = reader.get_se()?;
            }
        }

        if reader.get_bit()? {
            return Err(HeaderError::Unsupported("pps_scaling_list_data_present_flag"));
        }

        pps.lists_modification_present_flag = reader.get_bit()?;
        pps.log2_parallel_merge_level_minus2 = reader.get_ue()?;
        pps.slice_segment_header_extension_present_flag = reader.get_bit()?;

        pps.pps_extension_present_flag = reader.get_bit()?;
        if pps.pps_extension_present_flag {
            pps.pps_range_extension_flag = reader.get_bit()?;

            if pps.pps_range_extension_flag {
                return Err(HeaderError::Unsupported("pps_range_extension"));
            }

            if reader.get_n(7)? != 0 {
                return Err(HeaderError::Unsupported("pps_extension_7bits"));
            }
        }

        Ok(pps)
    }
}
