#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hevc::hrd_parameters::{CpbSpec, HrdParameters, HrdSubLayer};
use crate::hevc::pps::PpsNal;
use crate::hevc::profile_tier_level::{LayerProfile, ProfileTierLevel};
use crate::hevc::sei::{BufferingPeriodSei, PicTimingSei, SeiPayload};
use crate::hevc::slice::Slice;
use crate::hevc::sps::SpsNal;
use crate::hevc::vps::{SubLayerOrdering, VpsNal};
use crate::hevc::vui_parameters::VuiParameters;
use crate::hevc::{NAL_TRAIL_R, SLICE_TYPE_B, SLICE_TYPE_I, SLICE_TYPE_P};

const PROFILE_MAIN: u8 = 1;

/// (MaxLumaPs, level_idc) from table A.8
const LEVEL_LIMITS: &[(u32, u8)] = &[
    (36_864, 30),
    (122_880, 60),
    (245_760, 63),
    (552_960, 90),
    (983_040, 93),
    (2_228_224, 120),
    (8_912_896, 150),
    (35_651_584, 180),
];

/// Sequence level encoding choices that the parameter sets are derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,

    /// Clamped to 4..=6
    pub log2_ctu_size: u32,
    /// Clamped to 3..=log2_ctu_size
    pub log2_min_cu_size: u32,

    /// Reference pictures kept in the DPB.
    pub num_ref_frames: u32,
    /// Distance between anchor pictures, 1 for P-only streams.
    pub gop_ref_dist: u32,

    pub qp: i32,
    pub frame_rate_num: u32,
    pub frame_rate_den: u32,

    pub hrd: bool,
    pub bitrate_kbps: u32,

    pub sao: bool,
    pub temporal_mvp: bool,
    pub cabac_init_present: bool,
    pub transquant_bypass: bool,
    pub max_num_merge_cand: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            log2_ctu_size: 6,
            log2_min_cu_size: 3,
            num_ref_frames: 2,
            gop_ref_dist: 1,
            qp: 30,
            frame_rate_num: 30,
            frame_rate_den: 1,
            hrd: false,
            bitrate_kbps: 5000,
            sao: true,
            temporal_mvp: true,
            cabac_init_present: false,
            transquant_bypass: false,
            max_num_merge_cand: 5,
        }
    }
}

/// The active parameter sets.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct VideoParam {
    pub vps: VpsNal,
    pub sps: SpsNal,
    pub pps: PpsNal,
}

/// A run of CTUs coded as one slice segment.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct SliceSegment {
    pub segment_address: u32,
    pub num_ctu: u32,
}

/// Per picture decisions made by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Task {
    pub poc: i32,
    pub slice_type: u8,
    pub nal_unit_type: u8,
    pub temporal_id: u8,

    pub insert_aud: bool,
    pub insert_bp_sei: bool,
    pub insert_pt_sei: bool,
    pub bp_sei: BufferingPeriodSei,
    pub pt_sei: PicTimingSei,
    /// Caller supplied SEI messages, prefix and suffix.
    pub payloads: Vec<SeiPayload>,

    /// Header fields shared by every slice segment of the picture.
    pub slice: Slice,
    pub slices: Vec<SliceSegment>,

    /// Leave slice headers open for CABAC data appended by the caller.
    pub dyn_slice_size: bool,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            poc: 0,
            slice_type: SLICE_TYPE_P,
            nal_unit_type: NAL_TRAIL_R,
            temporal_id: 0,
            insert_aud: false,
            insert_bp_sei: false,
            insert_pt_sei: false,
            bp_sei: BufferingPeriodSei::default(),
            pt_sei: PicTimingSei::default(),
            payloads: Vec::new(),
            slice: Slice::default(),
            slices: Vec::new(),
            dyn_slice_size: false,
        }
    }
}

impl Task {
    /// Prefix SEI NAL units are emitted before the first slice of this picture.
    pub fn has_prefix_sei(&self) -> bool {
        self.insert_bp_sei || self.insert_pt_sei || self.payloads.iter().any(|p| !p.suffix)
    }

    pub fn has_suffix_sei(&self) -> bool {
        self.payloads.iter().any(|p| p.suffix)
    }

    /// pic_type of the access unit delimiter.
    pub fn aud_pic_type(&self) -> u8 {
        match self.slice_type {
            SLICE_TYPE_I => 0,
            SLICE_TYPE_P => 1,
            _ => 2,
        }
    }

    pub fn is_b(&self) -> bool {
        self.slice_type == SLICE_TYPE_B
    }
}

impl VideoParam {
    /// Main profile VPS, SPS and PPS for `settings`. The SPS carries no
    /// short-term RPS yet, see `crate::rps::plan_sequence_rps`.
    pub fn new(settings: &StreamSettings) -> Self {
        let ptl = ProfileTierLevel {
            general: LayerProfile {
                profile_idc: PROFILE_MAIN,
                // general_profile_compatibility_flag[1] and [2]
                profile_compatibility_flags: (1 << 30) | (1 << 29),
                progressive_source_flag: true,
                frame_only_constraint_flag: true,
                ..Default::default()
            },
            general_level_idc: level_idc(settings.width * settings.height),
            sub_layers: Vec::new(),
        };

        let sub_layer_ordering = vec![SubLayerOrdering {
            max_dec_pic_buffering_minus1: settings.num_ref_frames.max(1),
            max_num_reorder_pics: u32::from(settings.gop_ref_dist > 1),
            max_latency_increase_plus1: 0,
        }];

        let vps = VpsNal {
            vps_temporal_id_nesting_flag: true,
            ptl: ptl.clone(),
            vps_sub_layer_ordering_info_present_flag: false,
            sub_layer_ordering: sub_layer_ordering.clone(),
            vps_timing_info_present_flag: true,
            vps_num_units_in_tick: settings.frame_rate_den,
            vps_time_scale: settings.frame_rate_num,
            ..Default::default()
        };

        let log2_ctu_size = settings.log2_ctu_size.clamp(4, 6);
        let log2_min_cu_size = settings.log2_min_cu_size.clamp(3, log2_ctu_size);

        let min_cu_size = 1 << log2_min_cu_size;
        let aligned_width = settings.width.next_multiple_of(min_cu_size);
        let aligned_height = settings.height.next_multiple_of(min_cu_size);

        // Offsets are in chroma units for 4:2:0
        let conformance_window_flag = aligned_width != settings.width || aligned_height != settings.height;

        let vui_parameters = VuiParameters {
            aspect_ratio_info_present_flag: true,
            aspect_ratio_idc: 1,
            timing_info_present_flag: true,
            num_units_in_tick: settings.frame_rate_den,
            time_scale: settings.frame_rate_num,
            hrd_parameters_present_flag: settings.hrd,
            hrd_parameters: if settings.hrd {
                hrd_parameters(settings)
            } else {
                HrdParameters::default()
            },
            ..Default::default()
        };

        let sps = SpsNal {
            sps_temporal_id_nesting_flag: true,
            ptl,
            chroma_format_idc: 1,
            pic_width_in_luma_samples: aligned_width,
            pic_height_in_luma_samples: aligned_height,
            conformance_window_flag,
            conf_win_right_offset: (aligned_width - settings.width) / 2,
            conf_win_bottom_offset: (aligned_height - settings.height) / 2,
            log2_max_pic_order_cnt_lsb_minus4: 4,
            sps_sub_layer_ordering_info_present_flag: false,
            sub_layer_ordering,
            log2_min_luma_coding_block_size_minus3: log2_min_cu_size - 3,
            log2_diff_max_min_luma_coding_block_size: log2_ctu_size - log2_min_cu_size,
            log2_min_luma_transform_block_size_minus2: 0,
            log2_diff_max_min_luma_transform_block_size: log2_ctu_size.min(5) - 2,
            max_transform_hierarchy_depth_inter: 2,
            max_transform_hierarchy_depth_intra: 2,
            amp_enabled_flag: true,
            sample_adaptive_offset_enabled_flag: settings.sao,
            sps_temporal_mvp_enabled_flag: settings.temporal_mvp,
            strong_intra_smoothing_enabled_flag: true,
            vui_parameters_present_flag: true,
            vui_parameters,
            ..Default::default()
        };

        let num_ref_idx_default_active_minus1 = settings.num_ref_frames.saturating_sub(1);

        let pps = PpsNal {
            cabac_init_present_flag: settings.cabac_init_present,
            num_ref_idx_l0_default_active_minus1: num_ref_idx_default_active_minus1,
            num_ref_idx_l1_default_active_minus1: num_ref_idx_default_active_minus1,
            init_qp_minus26: settings.qp - 26,
            transquant_bypass_enabled_flag: settings.transquant_bypass,
            pps_loop_filter_across_slices_enabled_flag: true,
            ..Default::default()
        };

        Self { vps, sps, pps }
    }

    /// Slice header fields shared by the segments of a `slice_type` picture.
    pub fn slice_template(&self, settings: &StreamSettings, slice_type: u8) -> Slice {
        Slice {
            slice_type,
            slice_temporal_mvp_enabled_flag: self.sps.sps_temporal_mvp_enabled_flag,
            slice_sao_luma_flag: false,
            slice_sao_chroma_flag: false,
            num_ref_idx_l0_active_minus1: if slice_type == SLICE_TYPE_I {
                0
            } else {
                self.pps.num_ref_idx_l0_default_active_minus1
            },
            num_ref_idx_l1_active_minus1: if slice_type == SLICE_TYPE_B {
                self.pps.num_ref_idx_l1_default_active_minus1
            } else {
                0
            },
            five_minus_max_num_merge_cand: 5 - settings.max_num_merge_cand.clamp(1, 5),
            slice_deblocking_filter_disabled_flag: self.pps.pps_deblocking_filter_disabled_flag,
            slice_loop_filter_across_slices_enabled_flag: self
                .pps
                .pps_loop_filter_across_slices_enabled_flag,
            ..Default::default()
        }
    }

    /// Single slice segment covering the whole picture.
    pub fn full_picture_slice(&self) -> SliceSegment {
        SliceSegment {
            segment_address: 0,
            num_ctu: self.sps.pic_size_in_ctbs(),
        }
    }

    /// `count` slice segments of (nearly) equal CTU counts.
    pub fn split_slices(&self, count: u32) -> Vec<SliceSegment> {
        let total = self.sps.pic_size_in_ctbs();
        let count = count.clamp(1, total.max(1));
        let base = total / count;
        let remainder = total % count;

        let mut address = 0;

        (0..count)
            .map(|i| {
                let num_ctu = base + u32::from(i < remainder);
                let segment = SliceSegment {
                    segment_address: address,
                    num_ctu,
                };

                address += num_ctu;
                segment
            })
            .collect()
    }
}

fn level_idc(luma_ps: u32) -> u8 {
    LEVEL_LIMITS
        .iter()
        .find(|(max_luma_ps, _)| luma_ps <= *max_luma_ps)
        .map(|(_, idc)| *idc)
        .unwrap_or(186)
}

fn hrd_parameters(settings: &StreamSettings) -> HrdParameters {
    const BIT_RATE_SCALE: u8 = 0;
    const CPB_SIZE_SCALE: u8 = 2;

    let bit_rate = settings.bitrate_kbps.max(1) * 1000;
    // One second of CPB
    let cpb_size = bit_rate;

    let mut hrd = HrdParameters {
        nal_hrd_parameters_present_flag: true,
        bit_rate_scale: BIT_RATE_SCALE,
        cpb_size_scale: CPB_SIZE_SCALE,
        initial_cpb_removal_delay_length_minus1: 23,
        au_cpb_removal_delay_length_minus1: 23,
        dpb_output_delay_length_minus1: 23,
        sub_layers: vec![HrdSubLayer {
            fixed_pic_rate_general_flag: true,
            fixed_pic_rate_within_cvs_flag: true,
            elemental_duration_in_tc_minus1: 0,
            low_delay_hrd_flag: false,
            cpb_cnt_minus1: 0,
            nal: vec![CpbSpec {
                bit_rate_value_minus1: (bit_rate >> (6 + BIT_RATE_SCALE)).max(1) - 1,
                cpb_size_value_minus1: (cpb_size >> (4 + CPB_SIZE_SCALE)).max(1) - 1,
                cbr_flag: false,
                ..Default::default()
            }],
            vcl: Vec::new(),
        }],
        ..Default::default()
    };

    hrd.normalize();
    hrd
}
