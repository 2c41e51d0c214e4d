#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::pps::PpsNal;
use super::short_term_rps::ShortTermRps;
use super::sps::SpsNal;
use super::{is_idr, is_irap, SLICE_TYPE_B, SLICE_TYPE_I, SLICE_TYPE_P};
use crate::bits::{ceil_log2, BitReader, BitWriter};
use crate::error::{HeaderError, Result};

/// slice_segment_header() fields.
///
/// Fields that are absent from the bitstream hold their inferred values after
/// parsing, so a parsed header compares equal to the one that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slice {
    pub first_slice_segment_in_pic_flag: bool,
    pub no_output_of_prior_pics_flag: bool,
    pub slice_pic_parameter_set_id: u32,
    pub dependent_slice_segment_flag: bool,
    pub segment_address: u32,
    /// slice_reserved_flag[], num_extra_slice_header_bits wide, MSB first
    pub slice_reserved_flags: u8,
    pub slice_type: u8,
    pub pic_output_flag: bool,
    pub colour_plane_id: u8,
    pub pic_order_cnt_lsb: u32,

    pub short_term_ref_pic_set_sps_flag: bool,
    pub short_term_ref_pic_set_idx: u32,
    /// Slice RPS when `short_term_ref_pic_set_sps_flag` is unset.
    pub strps: ShortTermRps,

    pub num_long_term_sps: u32,
    pub long_term_pics: Vec<LongTermRefPic>,

    pub slice_temporal_mvp_enabled_flag: bool,
    pub slice_sao_luma_flag: bool,
    pub slice_sao_chroma_flag: bool,

    pub num_ref_idx_active_override_flag: bool,
    pub num_ref_idx_l0_active_minus1: u32,
    pub num_ref_idx_l1_active_minus1: u32,

    pub ref_pic_list_modification_flag_l0: bool,
    pub list_entry_l0: Vec<u32>,
    pub ref_pic_list_modification_flag_l1: bool,
    pub list_entry_l1: Vec<u32>,

    pub mvd_l1_zero_flag: bool,
    pub cabac_init_flag: bool,
    pub collocated_from_l0_flag: bool,
    pub collocated_ref_idx: u32,

    pub pwt: PredWeightTable,
    pub five_minus_max_num_merge_cand: u32,

    pub slice_qp_delta: i32,
    pub slice_cb_qp_offset: i32,
    pub slice_cr_qp_offset: i32,
    pub cu_chroma_qp_offset_enabled_flag: bool,

    pub deblocking_filter_override_flag: bool,
    pub slice_deblocking_filter_disabled_flag: bool,
    pub slice_beta_offset_div2: i32,
    pub slice_tc_offset_div2: i32,
    pub slice_loop_filter_across_slices_enabled_flag: bool,

    pub offset_len_minus1: u8,
    pub entry_point_offset_minus1: Vec<u32>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LongTermRefPic {
    /// Index into the SPS candidates, for the first `num_long_term_sps` entries.
    pub lt_idx_sps: u32,
    pub poc_lsb_lt: u32,
    pub used_by_curr_pic_lt_flag: bool,
    pub delta_poc_msb_present_flag: bool,
    pub delta_poc_msb_cycle_lt: u32,
}

/// pred_weight_table() with absolute weights and offsets.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PredWeightTable {
    pub luma_log2_weight_denom: u8,
    pub chroma_log2_weight_denom: u8,
    pub l0: Vec<RefWeight>,
    pub l1: Vec<RefWeight>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefWeight {
    pub luma_weight_flag: bool,
    pub luma_weight: i16,
    pub luma_offset: i16,
    pub chroma_weight_flag: bool,
    /// Cb, Cr
    pub chroma_weight: [i16; 2],
    pub chroma_offset: [i16; 2],
}

/// Bit positions inside the header, relative to the writer start.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeaderOffsets {
    pub sao_offset: usize,
    pub qpd_offset: usize,
    pub pwt_offset: usize,
    pub pwt_length: usize,
}

impl Default for Slice {
    fn default() -> Self {
        Self {
            first_slice_segment_in_pic_flag: true,
            no_output_of_prior_pics_flag: false,
            slice_pic_parameter_set_id: 0,
            dependent_slice_segment_flag: false,
            segment_address: 0,
            slice_reserved_flags: 0,
            slice_type: SLICE_TYPE_I,
            pic_output_flag: true,
            colour_plane_id: 0,
            pic_order_cnt_lsb: 0,
            short_term_ref_pic_set_sps_flag: false,
            short_term_ref_pic_set_idx: 0,
            strps: ShortTermRps::default(),
            num_long_term_sps: 0,
            long_term_pics: Vec::new(),
            slice_temporal_mvp_enabled_flag: false,
            slice_sao_luma_flag: false,
            slice_sao_chroma_flag: false,
            num_ref_idx_active_override_flag: false,
            num_ref_idx_l0_active_minus1: 0,
            num_ref_idx_l1_active_minus1: 0,
            ref_pic_list_modification_flag_l0: false,
            list_entry_l0: Vec::new(),
            ref_pic_list_modification_flag_l1: false,
            list_entry_l1: Vec::new(),
            mvd_l1_zero_flag: false,
            cabac_init_flag: false,
            collocated_from_l0_flag: true,
            collocated_ref_idx: 0,
            pwt: PredWeightTable::default(),
            five_minus_max_num_merge_cand: 0,
            slice_qp_delta: 0,
            slice_cb_qp_offset: 0,
            slice_cr_qp_offset: 0,
            cu_chroma_qp_offset_enabled_flag: false,
            deblocking_filter_override_flag: false,
            slice_deblocking_filter_disabled_flag: false,
            slice_beta_offset_div2: 0,
            slice_tc_offset_div2: 0,
            slice_loop_filter_across_slices_enabled_flag: false,
            offset_len_minus1: 0,
            entry_point_offset_minus1: Vec::new(),
        }
    }
}

impl RefWeight {
    /// Weights inferred for a reference without explicit flags.
    pub fn identity(luma_log2_weight_denom: u8, chroma_log2_weight_denom: u8) -> Self {
        let chroma_weight = 1 << chroma_log2_weight_denom;

        Self {
            luma_weight: 1 << luma_log2_weight_denom,
            chroma_weight: [chroma_weight; 2],
            ..Default::default()
        }
    }
}

impl Slice {
    pub fn is_p(&self) -> bool {
        self.slice_type == SLICE_TYPE_P
    }

    pub fn is_b(&self) -> bool {
        self.slice_type == SLICE_TYPE_B
    }

    pub fn is_intra(&self) -> bool {
        self.slice_type == SLICE_TYPE_I
    }

    /// MaxNumMergeCand
    pub fn max_num_merge_cand(&self) -> u32 {
        5u32.saturating_sub(self.five_minus_max_num_merge_cand)
    }

    /// SliceQpY
    pub fn slice_qp_y(&self, pps: &PpsNal) -> i32 {
        pps.init_qp() + self.slice_qp_delta
    }

    /// The short-term RPS in use: the SPS one or the slice one.
    pub fn current_rps<'a>(&'a self, sps: &'a SpsNal) -> &'a ShortTermRps {
        if self.short_term_ref_pic_set_sps_flag {
            sps.short_term_ref_pic_sets
                .get(self.short_term_ref_pic_set_idx as usize)
                .unwrap_or(&self.strps)
        } else {
            &self.strps
        }
    }

    /// NumPicTotalCurr
    pub fn num_pic_total_curr(&self, sps: &SpsNal) -> u32 {
        let lt_used = self
            .long_term_pics
            .iter()
            .enumerate()
            .filter(|(i, lt)| {
                if (*i as u32) < self.num_long_term_sps {
                    sps.long_term_ref_pics
                        .get(lt.lt_idx_sps as usize)
                        .is_some_and(|s| s.used_by_curr_pic_lt_sps_flag)
                } else {
                    lt.used_by_curr_pic_lt_flag
                }
            })
            .count();

        (self.current_rps(sps).num_used() + lt_used) as u32
    }

    fn long_term_ref_pic_sps_bits(sps: &SpsNal) -> usize {
        ceil_log2(sps.long_term_ref_pics.len() as u32) as usize
    }

    /// Writes slice_segment_header() up to, not including, byte_alignment().
    pub fn write(
        &self,
        writer: &mut BitWriter,
        nal_unit_type: u8,
        sps: &SpsNal,
        pps: &PpsNal,
    ) -> SliceHeaderOffsets {
        let mut offsets = SliceHeaderOffsets::default();

        writer.put_bit(self.first_slice_segment_in_pic_flag);

        if is_irap(nal_unit_type) {
            writer.put_bit(self.no_output_of_prior_pics_flag);
        }

        writer.put_ue(self.slice_pic_parameter_set_id);

        if !self.first_slice_segment_in_pic_flag {
            if pps.dependent_slice_segments_enabled_flag {
                writer.put_bit(self.dependent_slice_segment_flag);
            }

            writer.put_bits(
                ceil_log2(sps.pic_size_in_ctbs()) as usize,
                self.segment_address,
            );
        }

        if !self.dependent_slice_segment_flag {
            writer.put_bits(
                pps.num_extra_slice_header_bits as usize,
                self.slice_reserved_flags as u32,
            );

            writer.put_ue(self.slice_type as u32);

            if pps.output_flag_present_flag {
                writer.put_bit(self.pic_output_flag);
            }

            if sps.separate_colour_plane_flag {
                writer.put_bits(2, self.colour_plane_id as u32);
            }

            if !is_idr(nal_unit_type) {
                writer.put_bits(sps.log2_max_poc_lsb() as usize, self.pic_order_cnt_lsb);
                writer.put_bit(self.short_term_ref_pic_set_sps_flag);

                let num_sets = sps.num_short_term_ref_pic_sets();

                if !self.short_term_ref_pic_set_sps_flag {
                    self.strps.write(writer, num_sets, num_sets);
                } else if num_sets > 1 {
                    writer.put_bits(
                        ceil_log2(num_sets as u32) as usize,
                        self.short_term_ref_pic_set_idx,
                    );
                }

                if sps.long_term_ref_pics_present_flag {
                    self.write_long_term_pics(writer, sps);
                }

                if sps.sps_temporal_mvp_enabled_flag {
                    writer.put_bit(self.slice_temporal_mvp_enabled_flag);
                }
            }

            if sps.sample_adaptive_offset_enabled_flag {
                offsets.sao_offset = writer.pos();

                writer.put_bit(self.slice_sao_luma_flag);

                if sps.chroma_array_type() != 0 {
                    writer.put_bit(self.slice_sao_chroma_flag);
                }
            }

            if !self.is_intra() {
                writer.put_bit(self.num_ref_idx_active_override_flag);

                if self.num_ref_idx_active_override_flag {
                    writer.put_ue(self.num_ref_idx_l0_active_minus1);

                    if self.is_b() {
                        writer.put_ue(self.num_ref_idx_l1_active_minus1);
                    }
                }

                let num_pic_total_curr = self.num_pic_total_curr(sps);

                if pps.lists_modification_present_flag && num_pic_total_curr > 1 {
                    self.write_list_modification(writer, num_pic_total_curr);
                }

                if self.is_b() {
                    writer.put_bit(self.mvd_l1_zero_flag);
                }

                if pps.cabac_init_present_flag {
                    writer.put_bit(self.cabac_init_flag);
                }

                if self.slice_temporal_mvp_enabled_flag {
                    if self.is_b() {
                        writer.put_bit(self.collocated_from_l0_flag);
                    }

                    if (self.collocated_from_l0_flag && self.num_ref_idx_l0_active_minus1 > 0)
                        || (!self.collocated_from_l0_flag && self.num_ref_idx_l1_active_minus1 > 0)
                    {
                        writer.put_ue(self.collocated_ref_idx);
                    }
                }

                if (pps.weighted_pred_flag && self.is_p()) || (pps.weighted_bipred_flag && self.is_b()) {
                    offsets.pwt_offset = writer.pos();
                    self.write_pred_weight_table(writer, sps);
                    offsets.pwt_length = writer.pos() - offsets.pwt_offset;
                }

                writer.put_ue(self.five_minus_max_num_merge_cand);
            }

            offsets.qpd_offset = writer.pos();
            writer.put_se(self.slice_qp_delta);

            if pps.pps_slice_chroma_qp_offsets_present_flag {
                writer.put_se(self.slice_cb_qp_offset);
                writer.put_se(self.slice_cr_qp_offset);
            }

            if pps.chroma_qp_offset_list_enabled() {
                writer.put_bit(self.cu_chroma_qp_offset_enabled_flag);
            }

            // Without an override, a decoder takes the PPS deblocking values
            let deblocking_override =
                pps.deblocking_filter_override_enabled_flag && self.deblocking_filter_override_flag;

            if pps.deblocking_filter_override_enabled_flag {
                writer.put_bit(deblocking_override);
            }

            let deblocking_disabled = if deblocking_override {
                writer.put_bit(self.slice_deblocking_filter_disabled_flag);

                if !self.slice_deblocking_filter_disabled_flag {
                    writer.put_se(self.slice_beta_offset_div2);
                    writer.put_se(self.slice_tc_offset_div2);
                }

                self.slice_deblocking_filter_disabled_flag
            } else {
                pps.pps_deblocking_filter_disabled_flag
            };

            let sao = sps.sample_adaptive_offset_enabled_flag
                && (self.slice_sao_luma_flag
                    || (sps.chroma_array_type() != 0 && self.slice_sao_chroma_flag));

            if pps.pps_loop_filter_across_slices_enabled_flag && (sao || !deblocking_disabled) {
                writer.put_bit(self.slice_loop_filter_across_slices_enabled_flag);
            }
        }

        if pps.tiles_enabled_flag || pps.entropy_coding_sync_enabled_flag {
            writer.put_ue(self.entry_point_offset_minus1.len() as u32);

            if !self.entry_point_offset_minus1.is_empty() {
                writer.put_ue(self.offset_len_minus1 as u32);

                for offset in &self.entry_point_offset_minus1 {
                    writer.put_bits(self.offset_len_minus1 as usize + 1, *offset);
                }
            }
        }

        if pps.slice_segment_header_extension_present_flag {
            writer.put_ue(0); // slice_segment_header_extension_length
        }

        offsets
    }

    fn write_long_term_pics(&self, writer: &mut BitWriter, sps: &SpsNal) {
        let num_long_term_pics = self.long_term_pics.len() as u32 - self.num_long_term_sps;

        if !sps.long_term_ref_pics.is_empty() {
            writer.put_ue(self.num_long_term_sps);
        }

        writer.put_ue(num_long_term_pics);

        for (i, lt) in self.long_term_pics.iter().enumerate() {
            if (i as u32) < self.num_long_term_sps {
                if sps.long_term_ref_pics.len() > 1 {
                    writer.put_bits(Self::long_term_ref_pic_sps_bits(sps), lt.lt_idx_sps);
                }
            } else {
                writer.put_bits(sps.log2_max_poc_lsb() as usize, lt.poc_lsb_lt);
                writer.put_bit(lt.used_by_curr_pic_lt_flag);
            }

            writer.put_bit(lt.delta_poc_msb_present_flag);

            if lt.delta_poc_msb_present_flag {
                writer.put_ue(lt.delta_poc_msb_cycle_lt);
            }
        }
    }

    fn write_list_modification(&self, writer: &mut BitWriter, num_pic_total_curr: u32) {
        let entry_bits = ceil_log2(num_pic_total_curr) as usize;

        let lists = [
            (
                self.ref_pic_list_modification_flag_l0,
                &self.list_entry_l0,
                self.num_ref_idx_l0_active_minus1,
            ),
            (
                self.ref_pic_list_modification_flag_l1,
                &self.list_entry_l1,
                self.num_ref_idx_l1_active_minus1,
            ),
        ];
        let num_lists = if self.is_b() { 2 } else { 1 };

        for (flag, entries, num_minus1) in lists.into_iter().take(num_lists) {
            writer.put_bit(flag);

            if flag {
                for i in 0..=num_minus1 as usize {
                    writer.put_bits(entry_bits, entries.get(i).copied().unwrap_or(0));
                }
            }
        }
    }

    fn write_pred_weight_table(&self, writer: &mut BitWriter, sps: &SpsNal) {
        let pwt = &self.pwt;
        let chroma = sps.chroma_array_type() != 0;
        let half = chroma_offset_half_range(sps);
        let identity = RefWeight::identity(pwt.luma_log2_weight_denom, pwt.chroma_log2_weight_denom);

        writer.put_ue(pwt.luma_log2_weight_denom as u32);

        if chroma {
            writer.put_se(pwt.chroma_log2_weight_denom as i32 - pwt.luma_log2_weight_denom as i32);
        }

        let lists = [
            (&pwt.l0, self.num_ref_idx_l0_active_minus1),
            (&pwt.l1, self.num_ref_idx_l1_active_minus1),
        ];
        let num_lists = if self.is_b() { 2 } else { 1 };

        for (weights, num_minus1) in lists.into_iter().take(num_lists) {
            let entries: Vec<&RefWeight> = (0..=num_minus1 as usize)
                .map(|i| weights.get(i).unwrap_or(&identity))
                .collect();

            for w in &entries {
                writer.put_bit(w.luma_weight_flag);
            }

            if chroma {
                for w in &entries {
                    writer.put_bit(w.chroma_weight_flag);
                }
            }

            for w in entries {
                if w.luma_weight_flag {
                    writer.put_se(w.luma_weight as i32 - (1 << pwt.luma_log2_weight_denom));
                    writer.put_se(w.luma_offset as i32);
                }

                if chroma && w.chroma_weight_flag {
                    for j in 0..2 {
                        let weight = w.chroma_weight[j] as i32;
                        let delta_offset = w.chroma_offset[j] as i32 - half
                            + ((half * weight) >> pwt.chroma_log2_weight_denom);

                        writer.put_se(weight - (1 << pwt.chroma_log2_weight_denom));
                        writer.put_se(delta_offset.clamp(-4 * half, 4 * half - 1));
                    }
                }
            }
        }
    }

    /// Parses slice_segment_header() up to, not including, byte_alignment().
    /// Dependent slice segments only carry the fields before slice_reserved_flag.
    pub fn parse(reader: &mut BitReader, nal_unit_type: u8, sps: &SpsNal, pps: &PpsNal) -> Result<Slice> {
        let mut slice = Slice {
            first_slice_segment_in_pic_flag: reader.get_bit()?,
            ..Default::default()
        };

        if is_irap(nal_unit_type) {
            slice.no_output_of_prior_pics_flag = reader.get_bit()?;
        }

        slice.slice_pic_parameter_set_id = reader.get_ue()?;

        if !slice.first_slice_segment_in_pic_flag {
            if pps.dependent_slice_segments_enabled_flag {
                slice.dependent_slice_segment_flag = reader.get_bit()?;
            }

            slice.segment_address = reader.get_bits(ceil_log2(sps.pic_size_in_ctbs()) as usize)?;
        }

        if slice.dependent_slice_segment_flag {
            slice.parse_entry_points(reader, sps, pps)?;
            return Ok(slice);
        }

        slice.slice_reserved_flags = reader.get_n(pps.num_extra_slice_header_bits as usize)?;

        let slice_type = reader.get_ue()?;
        if slice_type > SLICE_TYPE_I as u32 {
            return Err(HeaderError::InvalidParam("slice_type out of range"));
        }
        slice.slice_type = slice_type as u8;

        if pps.output_flag_present_flag {
            slice.pic_output_flag = reader.get_bit()?;
        }

        if sps.separate_colour_plane_flag {
            slice.colour_plane_id = reader.get_n(2)?;
        }

        if !is_idr(nal_unit_type) {
            slice.pic_order_cnt_lsb = reader.get_bits(sps.log2_max_poc_lsb() as usize)?;
            slice.short_term_ref_pic_set_sps_flag = reader.get_bit()?;

            let sets = &sps.short_term_ref_pic_sets;
            let num_sets = sets.len();

            if !slice.short_term_ref_pic_set_sps_flag {
                slice.strps = ShortTermRps::parse(reader, sets, num_sets, num_sets)?;
            } else {
                if num_sets > 1 {
                    slice.short_term_ref_pic_set_idx =
                        reader.get_bits(ceil_log2(num_sets as u32) as usize)?;
                }

                slice.strps = sets
                    .get(slice.short_term_ref_pic_set_idx as usize)
                    .cloned()
                    .ok_or(HeaderError::InvalidParam("short_term_ref_pic_set_idx out of range"))?;
            }

            if sps.long_term_ref_pics_present_flag {
                slice.parse_long_term_pics(reader, sps)?;
            }

            if sps.sps_temporal_mvp_enabled_flag {
                slice.slice_temporal_mvp_enabled_flag = reader.get_bit()?;
            }
        }

        if sps.sample_adaptive_offset_enabled_flag {
            slice.slice_sao_luma_flag = reader.get_bit()?;

            if sps.chroma_array_type() != 0 {
                slice.slice_sao_chroma_flag = reader.get_bit()?;
            }
        }

        if !slice.is_intra() {
            slice.num_ref_idx_active_override_flag = reader.get_bit()?;

            if slice.num_ref_idx_active_override_flag {
                slice.num_ref_idx_l0_active_minus1 = reader.get_ue()?;

                if slice.is_b() {
                    slice.num_ref_idx_l1_active_minus1 = reader.get_ue()?;
                }

                if slice.num_ref_idx_l0_active_minus1 > 14 || slice.num_ref_idx_l1_active_minus1 > 14 {
                    return Err(HeaderError::InvalidParam("num_ref_idx_active out of range"));
                }
            } else {
                slice.num_ref_idx_l0_active_minus1 = pps.num_ref_idx_l0_default_active_minus1;

                if slice.is_b() {
                    slice.num_ref_idx_l1_active_minus1 = pps.num_ref_idx_l1_default_active_minus1;
                }
            }

            let num_pic_total_curr = slice.num_pic_total_curr(sps);

            if pps.lists_modification_present_flag && num_pic_total_curr > 1 {
                let entry_bits = ceil_log2(num_pic_total_curr) as usize;

                slice.ref_pic_list_modification_flag_l0 = reader.get_bit()?;
                if slice.ref_pic_list_modification_flag_l0 {
                    for _ in 0..=slice.num_ref_idx_l0_active_minus1 {
                        slice.list_entry_l0.push(reader.get_bits(entry_bits)?);
                    }
                }

                if slice.is_b() {
                    slice.ref_pic_list_modification_flag_l1 = reader.get_bit()?;
                    if slice.ref_pic_list_modification_flag_l1 {
                        for _ in 0..=slice.num_ref_idx_l1_active_minus1 {
                            slice.list_entry_l1.push(reader.get_bits(entry_bits)?);
                        }
                    }
                }
            }

            if slice.is_b() {
                slice.mvd_l1_zero_flag = reader.get_bit()?;
            }

            if pps.cabac_init_present_flag {
                slice.cabac_init_flag = reader.get_bit()?;
            }

            if slice.slice_temporal_mvp_enabled_flag {
                if slice.is_b() {
                    slice.collocated_from_l0_flag = reader.get_bit()?;
                }

                if (slice.collocated_from_l0_flag && slice.num_ref_idx_l0_active_minus1 > 0)
                    || (!slice.collocated_from_l0_flag && slice.num_ref_idx_l1_active_minus1 > 0)
                {
                    slice.collocated_ref_idx = reader.get_ue()?;
                }
            }

            if (pps.weighted_pred_flag && slice.is_p()) || (pps.weighted_bipred_flag && slice.is_b()) {
                slice.parse_pred_weight_table(reader, sps)?;
            }

            slice.five_minus_max_num_merge_cand = reader.get_ue()?;
            if slice.five_minus_max_num_merge_cand > 4 {
                return Err(HeaderError::InvalidParam("five_minus_max_num_merge_cand out of range"));
            }
        }

        slice.slice_qp_delta = reader.get_se()?;

        if pps.pps_slice_chroma_qp_offsets_present_flag {
            slice.slice_cb_qp_offset = reader.get_se()?;
            slice.slice_cr_qp_offset = reader.get_se()?;
        }

        if pps.chroma_qp_offset_list_enabled() {
            slice.cu_chroma_qp_offset_enabled_flag = reader.get_bit()?;
        }

        if pps.deblocking_filter_override_enabled_flag {
            slice.deblocking_filter_override_flag = reader.get_bit()?;
        }

        if slice.deblocking_filter_override_flag {
            slice.slice_deblocking_filter_disabled_flag = reader.get_bit()?;

            if !slice.slice_deblocking_filter_disabled_flag {
                slice.slice_beta_offset_div2 = reader.get_se()?;
                slice.slice_tc_offset_div2 = reader.get_se()?;
            }
        } else {
            slice.slice_deblocking_filter_disabled_flag = pps.pps_deblocking_filter_disabled_flag;
            slice.slice_beta_offset_div2 = pps.pps_beta_offset_div2;
            slice.slice_tc_offset_div2 = pps.pps_tc_offset_div2;
        }

        slice.slice_loop_filter_across_slices_enabled_flag =
            pps.pps_loop_filter_across_slices_enabled_flag;

        if pps.pps_loop_filter_across_slices_enabled_flag
            && (slice.slice_sao_luma_flag
                || slice.slice_sao_chroma_flag
                || !slice.slice_deblocking_filter_disabled_flag)
        {
            slice.slice_loop_filter_across_slices_enabled_flag = reader.get_bit()?;
        }

        slice.parse_entry_points(reader, sps, pps)?;

        Ok(slice)
    }

    /// num_entry_point_offsets and the slice header extension, present in every segment.
    fn parse_entry_points(&mut self, reader: &mut BitReader, sps: &SpsNal, pps: &PpsNal) -> Result<()> {
        if pps.tiles_enabled_flag || pps.entropy_coding_sync_enabled_flag {
            let num_entry_point_offsets = reader.get_ue()?;

            if num_entry_point_offsets > sps.pic_size_in_ctbs() {
                return Err(HeaderError::InvalidParam("num_entry_point_offsets out of range"));
            }

            if num_entry_point_offsets > 0 {
                let offset_len_minus1 = reader.get_ue()?;
                if offset_len_minus1 > 31 {
                    return Err(HeaderError::InvalidParam("offset_len_minus1 out of range"));
                }
                self.offset_len_minus1 = offset_len_minus1 as u8;

                for _ in 0..num_entry_point_offsets {
                    self.entry_point_offset_minus1
                        .push(reader.get_bits(offset_len_minus1 as usize + 1)?);
                }
            }
        }

        if pps.slice_segment_header_extension_present_flag {
            let extension_length = reader.get_ue()?;

            if extension_length > 256 {
                return Err(HeaderError::InvalidParam("slice_segment_header_extension_length"));
            }

            for _ in 0..extension_length {
                reader.get_bits(8)?;
            }
        }

        Ok(())
    }

    fn parse_long_term_pics(&mut self, reader: &mut BitReader, sps: &SpsNal) -> Result<()> {
        if !sps.long_term_ref_pics.is_empty() {
            self.num_long_term_sps = reader.get_ue()?;

            if self.num_long_term_sps as usize > sps.long_term_ref_pics.len() {
                return Err(HeaderError::InvalidParam("num_long_term_sps out of range"));
            }
        }

        let num_long_term_pics = reader.get_ue()?;
        if num_long_term_pics > 32 {
            return Err(HeaderError::InvalidParam("num_long_term_pics out of range"));
        }

        for i in 0..self.num_long_term_sps + num_long_term_pics {
            let mut lt = LongTermRefPic::default();

            if i < self.num_long_term_sps {
                if sps.long_term_ref_pics.len() > 1 {
                    lt.lt_idx_sps = reader.get_bits(Self::long_term_ref_pic_sps_bits(sps))?;
                }
            } else {
                lt.poc_lsb_lt = reader.get_bits(sps.log2_max_poc_lsb() as usize)?;
                lt.used_by_curr_pic_lt_flag = reader.get_bit()?;
            }

            lt.delta_poc_msb_present_flag = reader.get_bit()?;
            if lt.delta_poc_msb_present_flag {
                lt.delta_poc_msb_cycle_lt = reader.get_ue()?;
            }

            self.long_term_pics.push(lt);
        }

        Ok(())
    }

    fn parse_pred_weight_table(&mut self, reader: &mut BitReader, sps: &SpsNal) -> Result<()> {
        let chroma = sps.chroma_array_type() != 0;
        let half = chroma_offset_half_range(sps);

        let luma_log2_weight_denom = reader.get_ue()?;
        if luma_log2_weight_denom > 7 {
            return Err(HeaderError::InvalidParam("luma_log2_weight_denom out of range"));
        }

        let mut chroma_log2_weight_denom = luma_log2_weight_denom as i32;
        if chroma {
            chroma_log2_weight_denom += reader.get_se()?;

            if !(0..=7).contains(&chroma_log2_weight_denom) {
                return Err(HeaderError::InvalidParam("chroma_log2_weight_denom out of range"));
            }
        }

        let luma_denom = luma_log2_weight_denom as u8;
        let chroma_denom = chroma_log2_weight_denom as u8;

        self.pwt.luma_log2_weight_denom = luma_denom;
        self.pwt.chroma_log2_weight_denom = chroma_denom;

        let num_lists = if self.is_b() { 2 } else { 1 };
        let counts = [
            self.num_ref_idx_l0_active_minus1 as usize + 1,
            self.num_ref_idx_l1_active_minus1 as usize + 1,
        ];

        for (list, count) in counts.into_iter().enumerate().take(num_lists) {
            let mut weights = vec![RefWeight::identity(luma_denom, chroma_denom); count];

            for w in weights.iter_mut() {
                w.luma_weight_flag = reader.get_bit()?;
            }

            if chroma {
                for w in weights.iter_mut() {
                    w.chroma_weight_flag = reader.get_bit()?;
                }
            }

            for w in weights.iter_mut() {
                if w.luma_weight_flag {
                    w.luma_weight = ((1 << luma_denom) + reader.get_se()?) as i16;
                    w.luma_offset = reader.get_se()? as i16;
                }

                if w.chroma_weight_flag {
                    for j in 0..2 {
                        let weight = (1 << chroma_denom) + reader.get_se()?;
                        let delta_offset = reader.get_se()?;
                        let offset = (half + delta_offset - ((half * weight) >> chroma_denom))
                            .clamp(-half, half - 1);

                        w.chroma_weight[j] = weight as i16;
                        w.chroma_offset[j] = offset as i16;
                    }
                }
            }

            if list == 0 {
                self.pwt.l0 = weights;
            } else {
                self.pwt.l1 = weights;
            }
        }

        Ok(())
    }
}

/// WpOffsetHalfRangeC
fn chroma_offset_half_range(sps: &SpsNal) -> i32 {
    if sps.sps_range_extension_flag && sps.range_extension.high_precision_offsets_enabled_flag {
        1 << (sps.bit_depth_chroma() - 1)
    } else {
        1 << 7
    }
}
