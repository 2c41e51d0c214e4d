use anyhow::Result;

use super::hrd_parameters::{HrdParameters, HrdSubLayer};
use super::pps::PpsNal;
use super::sei::{BufferingPeriodSei, InitialCpbRemoval, PicTimingSei, SeiPayload};
use super::short_term_rps::ShortTermRps;
use super::slice::{LongTermRefPic, RefWeight, Slice};
use super::sps::{LongTermRefPicSps, SpsNal};
use super::vps::{VpsHrd, VpsNal};
use super::*;
use crate::bits::{ue_bits, BitReader, BitWriter};
use crate::params::{StreamSettings, VideoParam};
use crate::rps::optimize_strps;

fn raw_reader(data: &[u8]) -> BitReader<'_> {
    let mut reader = BitReader::new(data);
    reader.set_emulation(false);
    reader
}

fn hrd_settings() -> StreamSettings {
    StreamSettings {
        hrd: true,
        bitrate_kbps: 8000,
        ..Default::default()
    }
}

fn all_used(delta_pocs: &[i16]) -> ShortTermRps {
    ShortTermRps::from_pictures(delta_pocs.iter().map(|d| (*d, true)))
}

#[test]
fn nal_header_bytes() {
    let mut writer = BitWriter::new();
    NalUnit::new(NAL_SPS, 0).write(&mut writer);
    assert_eq!(writer.as_slice(), &[0, 0, 0, 1, 0x42, 0x01]);

    let mut writer = BitWriter::new();
    let slice = NalUnit::new(NAL_TRAIL_R, 2);
    assert!(!slice.long_start_code);
    assert_eq!(slice.header_len(), 5);

    slice.write(&mut writer);
    assert_eq!(writer.as_slice(), &[0, 0, 1, 0x02, 0x03]);

    let long = slice.with_long_start_code(true);
    assert_eq!(long.header_len(), 6);
    assert_eq!(long.temporal_id(), 2);
}

#[test]
fn sps_1080p() -> Result<()> {
    let par = VideoParam::new(&StreamSettings::default());
    let sps = &par.sps;

    assert_eq!(sps.ctb_size(), 64);
    assert_eq!(sps.pic_width_in_ctbs(), 30);
    assert_eq!(sps.pic_height_in_ctbs(), 17);

    let mut writer = BitWriter::new();
    NalUnit::new(NAL_SPS, 0).write(&mut writer);
    sps.write(&mut writer);

    let data = writer.as_slice().to_vec();
    assert_eq!(&data[1..6], &[0x00, 0x00, 0x01, 0x42, 0x01]);

    let parsed = SpsNal::parse(&mut raw_reader(&data[6..]))?;

    assert_eq!(parsed.chroma_format_idc, 1);
    assert_eq!(parsed.pic_width_in_luma_samples, 1920);
    assert_eq!(parsed.pic_height_in_luma_samples, 1080);
    assert_eq!(parsed.log2_min_luma_coding_block_size_minus3, 0);
    assert_eq!(parsed.log2_diff_max_min_luma_coding_block_size, 3);
    assert_eq!(&parsed, sps);

    Ok(())
}

#[test]
fn sps_block_sizes_are_clamped() -> Result<()> {
    for (log2_ctu_size, log2_min_cu_size, ctb, min_cb) in [(6, 7, 6, 6), (4, 2, 4, 3), (2, 0, 4, 3), (9, 5, 6, 5)] {
        let settings = StreamSettings {
            log2_ctu_size,
            log2_min_cu_size,
            ..Default::default()
        };
        let sps = VideoParam::new(&settings).sps;

        assert_eq!(sps.log2_ctb_size(), ctb);
        assert_eq!(sps.log2_min_cb_size(), min_cb);
        assert_eq!(sps.pic_width_in_luma_samples % (1 << min_cb), 0);

        let mut writer = BitWriter::new();
        sps.write(&mut writer);
        assert_eq!(SpsNal::parse(&mut raw_reader(writer.as_slice()))?, sps);
    }

    Ok(())
}

#[test]
fn sps_conformance_window() -> Result<()> {
    let settings = StreamSettings {
        width: 1366,
        height: 766,
        ..Default::default()
    };
    let sps = VideoParam::new(&settings).sps;

    assert_eq!(sps.pic_width_in_luma_samples, 1368);
    assert_eq!(sps.pic_height_in_luma_samples, 768);
    assert!(sps.conformance_window_flag);
    assert_eq!(sps.conf_win_right_offset, 1);
    assert_eq!(sps.conf_win_bottom_offset, 1);

    let mut writer = BitWriter::new();
    sps.write(&mut writer);
    assert_eq!(SpsNal::parse(&mut raw_reader(writer.as_slice()))?, sps);

    Ok(())
}

#[test]
fn sps_with_rps_lt_and_hrd() -> Result<()> {
    let mut sps = VideoParam::new(&hrd_settings()).sps;

    let mut sets = vec![all_used(&[-1]), all_used(&[-1, -2]), all_used(&[-2, -3, 1])];
    for idx in 1..sets.len() {
        let (done, rest) = sets.split_at_mut(idx);
        optimize_strps(done, 3, &mut rest[0], idx);
    }
    assert!(sets[1].inter_ref_pic_set_prediction_flag);

    sps.short_term_ref_pic_sets = sets;
    sps.long_term_ref_pics_present_flag = true;
    sps.long_term_ref_pics = vec![
        LongTermRefPicSps {
            lt_ref_pic_poc_lsb_sps: 5,
            used_by_curr_pic_lt_sps_flag: true,
        },
        LongTermRefPicSps {
            lt_ref_pic_poc_lsb_sps: 200,
            used_by_curr_pic_lt_sps_flag: false,
        },
    ];
    sps.pcm_enabled_flag = true;
    sps.pcm_sample_bit_depth_luma_minus1 = 7;
    sps.pcm_sample_bit_depth_chroma_minus1 = 7;
    sps.log2_diff_max_min_pcm_luma_coding_block_size = 2;
    sps.sps_extension_present_flag = true;
    sps.sps_range_extension_flag = true;
    sps.range_extension.implicit_rdpcm_enabled_flag = true;

    let mut writer = BitWriter::new();
    sps.write(&mut writer);

    assert_eq!(SpsNal::parse(&mut raw_reader(writer.as_slice()))?, sps);

    Ok(())
}

#[test]
fn sps_rejects_scaling_lists() {
    let mut sps = VideoParam::new(&StreamSettings::default()).sps;
    sps.scaling_list_enabled_flag = true;

    let mut writer = BitWriter::new();
    sps.write(&mut writer);

    assert!(matches!(
        SpsNal::parse(&mut raw_reader(writer.as_slice())),
        Err(crate::error::HeaderError::Unsupported(_))
    ));
}

#[test]
fn truncated_sps_is_invalid() {
    let sps = VideoParam::new(&StreamSettings::default()).sps;

    let mut writer = BitWriter::new();
    sps.write(&mut writer);
    let data = writer.as_slice().to_vec();

    assert!(matches!(
        SpsNal::parse(&mut raw_reader(&data[..data.len() / 2])),
        Err(crate::error::HeaderError::InvalidParam(_))
    ));
}

#[test]
fn pps_roundtrip() -> Result<()> {
    let mut pps = VideoParam::new(&StreamSettings::default()).pps;

    pps.pps_pic_parameter_set_id = 3;
    pps.cu_qp_delta_enabled_flag = true;
    pps.diff_cu_qp_delta_depth = 1;
    pps.pps_cb_qp_offset = -2;
    pps.pps_cr_qp_offset = 3;
    pps.tiles_enabled_flag = true;
    pps.num_tile_columns_minus1 = 2;
    pps.num_tile_rows_minus1 = 1;
    pps.column_width_minus1 = vec![9, 9];
    pps.row_height_minus1 = vec![7];
    pps.deblocking_filter_control_present_flag = true;
    pps.deblocking_filter_override_enabled_flag = true;
    pps.pps_beta_offset_div2 = -2;
    pps.pps_tc_offset_div2 = 1;
    pps.lists_modification_present_flag = true;
    pps.log2_parallel_merge_level_minus2 = 2;

    let mut writer = BitWriter::new();
    pps.write(&mut writer);

    assert_eq!(PpsNal::parse(&mut raw_reader(writer.as_slice()))?, pps);

    Ok(())
}

#[test]
fn pps_rejects_range_extension() {
    let mut pps = PpsNal {
        pps_extension_present_flag: true,
        pps_range_extension_flag: true,
        ..Default::default()
    };
    pps.range_extension.chroma_qp_offset_list_enabled_flag = true;
    pps.range_extension.chroma_qp_offset_list = vec![(1, -1)];

    let mut writer = BitWriter::new();
    pps.write(&mut writer);

    assert!(matches!(
        PpsNal::parse(&mut raw_reader(writer.as_slice())),
        Err(crate::error::HeaderError::Unsupported(_))
    ));
}

#[test]
fn vps_roundtrip() -> Result<()> {
    let settings = hrd_settings();
    let par = VideoParam::new(&settings);
    let mut vps = par.vps.clone();

    vps.vps_poc_proportional_to_timing_flag = true;
    vps.vps_num_ticks_poc_diff_one_minus1 = 1;
    vps.vps_max_layer_id = 2;
    vps.vps_num_layer_sets_minus1 = 1;
    vps.layer_id_included_flags = vec![vec![true, false, true]];
    vps.hrd = vec![VpsHrd {
        hrd_layer_set_idx: 0,
        cprms_present_flag: true,
        hrd_parameters: par.sps.vui_parameters.hrd_parameters.clone(),
    }];

    let mut writer = BitWriter::new();
    vps.write(&mut writer);

    assert_eq!(VpsNal::parse(&mut raw_reader(writer.as_slice()))?, vps);

    Ok(())
}

#[test]
fn intra_slice_header_prefix() -> Result<()> {
    let par = VideoParam::new(&StreamSettings::default());
    let slice = Slice {
        slice_type: SLICE_TYPE_I,
        pic_order_cnt_lsb: 0x5A,
        ..Default::default()
    };

    assert_eq!(par.pps.num_extra_slice_header_bits, 0);
    assert!(!par.pps.output_flag_present_flag);

    let mut writer = BitWriter::new();
    slice.write(&mut writer, NAL_TRAIL_R, &par.sps, &par.pps);
    writer.put_trailing_bits(false);

    let data = writer.as_slice().to_vec();
    let mut reader = raw_reader(&data);

    assert!(reader.get_bit()?);
    assert_eq!(reader.get_ue()?, 0);
    assert_eq!(reader.get_ue()?, SLICE_TYPE_I as u32);
    assert_eq!(reader.pos() as u32, 1 + ue_bits(0) + ue_bits(SLICE_TYPE_I as u32));

    // No reserved flags or pic_output_flag: the POC LSB follows
    assert_eq!(reader.get_bits(par.sps.log2_max_poc_lsb() as usize)?, 0x5A);

    let parsed = Slice::parse(&mut raw_reader(&data), NAL_TRAIL_R, &par.sps, &par.pps)?;
    assert_eq!(parsed, slice);

    Ok(())
}

#[test]
fn idr_slice_roundtrip() -> Result<()> {
    let settings = StreamSettings::default();
    let par = VideoParam::new(&settings);
    let slice = Slice {
        no_output_of_prior_pics_flag: true,
        slice_sao_luma_flag: true,
        slice_sao_chroma_flag: true,
        slice_qp_delta: 4,
        slice_temporal_mvp_enabled_flag: false,
        ..par.slice_template(&settings, SLICE_TYPE_I)
    };

    let mut writer = BitWriter::new();
    slice.write(&mut writer, NAL_IDR_W_RADL, &par.sps, &par.pps);

    let parsed = Slice::parse(&mut raw_reader(writer.as_slice()), NAL_IDR_W_RADL, &par.sps, &par.pps)?;
    assert_eq!(parsed, slice);
    assert_eq!(parsed.slice_qp_y(&par.pps), settings.qp + 4);

    Ok(())
}

fn p_slice_setup() -> (SpsNal, PpsNal, Slice) {
    let par = VideoParam::new(&StreamSettings::default());
    let mut sps = par.sps;
    let mut pps = par.pps;

    sps.short_term_ref_pic_sets = vec![all_used(&[-1]), all_used(&[-1, -2])];
    sps.long_term_ref_pics_present_flag = true;
    sps.long_term_ref_pics = vec![
        LongTermRefPicSps {
            lt_ref_pic_poc_lsb_sps: 5,
            used_by_curr_pic_lt_sps_flag: false,
        },
        LongTermRefPicSps {
            lt_ref_pic_poc_lsb_sps: 9,
            used_by_curr_pic_lt_sps_flag: false,
        },
    ];

    pps.dependent_slice_segments_enabled_flag = true;
    pps.output_flag_present_flag = true;
    pps.num_extra_slice_header_bits = 2;
    pps.cabac_init_present_flag = true;
    pps.pps_slice_chroma_qp_offsets_present_flag = true;
    pps.weighted_pred_flag = true;
    pps.tiles_enabled_flag = true;
    pps.deblocking_filter_control_present_flag = true;
    pps.deblocking_filter_override_enabled_flag = true;
    pps.lists_modification_present_flag = true;
    pps.slice_segment_header_extension_present_flag = true;

    let mut strps = all_used(&[-1, -3]);
    optimize_strps(&sps.short_term_ref_pic_sets, 2, &mut strps, 2);

    let weighted = RefWeight {
        luma_weight_flag: true,
        luma_weight: 70,
        luma_offset: -3,
        chroma_weight_flag: true,
        chroma_weight: [30, 34],
        chroma_offset: [5, -7],
    };

    let mut slice = Slice {
        first_slice_segment_in_pic_flag: false,
        segment_address: 7,
        slice_reserved_flags: 0b10,
        slice_type: SLICE_TYPE_P,
        pic_output_flag: false,
        pic_order_cnt_lsb: 17,
        strps,
        num_long_term_sps: 1,
        long_term_pics: vec![
            LongTermRefPic {
                lt_idx_sps: 1,
                ..Default::default()
            },
            LongTermRefPic {
                poc_lsb_lt: 3,
                used_by_curr_pic_lt_flag: true,
                delta_poc_msb_present_flag: true,
                delta_poc_msb_cycle_lt: 2,
                ..Default::default()
            },
        ],
        slice_temporal_mvp_enabled_flag: true,
        slice_sao_luma_flag: true,
        num_ref_idx_active_override_flag: true,
        num_ref_idx_l0_active_minus1: 1,
        ref_pic_list_modification_flag_l0: true,
        list_entry_l0: vec![2, 0],
        cabac_init_flag: true,
        collocated_ref_idx: 1,
        five_minus_max_num_merge_cand: 2,
        slice_qp_delta: -3,
        slice_cb_qp_offset: 1,
        slice_cr_qp_offset: -1,
        deblocking_filter_override_flag: true,
        slice_beta_offset_div2: 2,
        slice_tc_offset_div2: -1,
        slice_loop_filter_across_slices_enabled_flag: false,
        offset_len_minus1: 8,
        entry_point_offset_minus1: vec![100, 200],
        ..Default::default()
    };

    slice.pwt.luma_log2_weight_denom = 6;
    slice.pwt.chroma_log2_weight_denom = 5;
    slice.pwt.l0 = vec![weighted, RefWeight::identity(6, 5)];

    (sps, pps, slice)
}

#[test]
fn p_slice_roundtrip() -> Result<()> {
    let (sps, pps, slice) = p_slice_setup();

    // two short-term pictures and one long-term picture
    assert_eq!(slice.num_pic_total_curr(&sps), 3);
    assert_eq!(slice.max_num_merge_cand(), 3);

    let mut writer = BitWriter::new();
    let offsets = slice.write(&mut writer, NAL_TRAIL_R, &sps, &pps);
    let data = writer.as_slice().to_vec();

    let parsed = Slice::parse(&mut raw_reader(&data), NAL_TRAIL_R, &sps, &pps)?;
    assert_eq!(parsed, slice);

    assert!(offsets.sao_offset < offsets.pwt_offset);
    assert!(offsets.pwt_offset + offsets.pwt_length < offsets.qpd_offset);

    let mut reader = raw_reader(&data);
    for _ in 0..offsets.sao_offset {
        reader.get_bit()?;
    }
    assert!(reader.get_bit()?);

    let mut reader = raw_reader(&data);
    for _ in 0..offsets.qpd_offset {
        reader.get_bit()?;
    }
    assert_eq!(reader.get_se()?, -3);

    Ok(())
}

#[test]
fn deblocking_follows_pps() -> Result<()> {
    let (mut sps, mut pps, slice) = p_slice_setup();

    sps.sample_adaptive_offset_enabled_flag = false;
    pps.pps_deblocking_filter_disabled_flag = true;
    pps.pps_beta_offset_div2 = 1;
    pps.pps_loop_filter_across_slices_enabled_flag = true;

    for override_enabled in [false, true] {
        pps.deblocking_filter_override_enabled_flag = override_enabled;

        // Slice values only reach the bitstream through an allowed override
        let slice = Slice {
            deblocking_filter_override_flag: !override_enabled,
            slice_deblocking_filter_disabled_flag: false,
            ..slice.clone()
        };

        let mut writer = BitWriter::new();
        slice.write(&mut writer, NAL_TRAIL_R, &sps, &pps);

        let parsed = Slice::parse(&mut raw_reader(writer.as_slice()), NAL_TRAIL_R, &sps, &pps)?;

        assert!(!parsed.deblocking_filter_override_flag);
        assert!(parsed.slice_deblocking_filter_disabled_flag);
        assert_eq!(parsed.slice_beta_offset_div2, 1);
        assert!(parsed.slice_loop_filter_across_slices_enabled_flag);
        assert_eq!(parsed.slice_qp_delta, slice.slice_qp_delta);
        assert_eq!(parsed.entry_point_offset_minus1, vec![100, 200]);
    }

    Ok(())
}

#[test]
fn chroma_offsets_are_clipped() -> Result<()> {
    let (sps, pps, mut slice) = p_slice_setup();

    // delta_chroma_offset would be -768, below -4 * 128
    slice.pwt.l0[0].chroma_weight = [-128, 1 << 5];
    slice.pwt.l0[0].chroma_offset = [-128, 0];

    let mut writer = BitWriter::new();
    slice.write(&mut writer, NAL_TRAIL_R, &sps, &pps);

    let parsed = Slice::parse(&mut raw_reader(writer.as_slice()), NAL_TRAIL_R, &sps, &pps)?;
    let weights = parsed.pwt.l0[0];

    assert_eq!(weights.chroma_weight, [-128, 32]);
    assert_eq!(weights.chroma_offset[1], 0);
    assert!((-128..128).contains(&weights.chroma_offset[0]));

    Ok(())
}

#[test]
fn dependent_slice_segment() -> Result<()> {
    let (sps, pps, _) = p_slice_setup();
    let slice = Slice {
        first_slice_segment_in_pic_flag: false,
        dependent_slice_segment_flag: true,
        segment_address: 300,
        offset_len_minus1: 0,
        ..Default::default()
    };

    let mut writer = BitWriter::new();
    slice.write(&mut writer, NAL_TRAIL_R, &sps, &pps);

    // flag, ue(0), dependent flag, 9 bit address, ue(0) entry points, ue(0) extension
    assert_eq!(writer.pos(), 1 + 1 + 1 + 9 + 1 + 1);

    let parsed = Slice::parse(&mut raw_reader(writer.as_slice()), NAL_TRAIL_R, &sps, &pps)?;
    assert!(parsed.dependent_slice_segment_flag);
    assert_eq!(parsed.segment_address, 300);

    Ok(())
}

#[test]
fn hrd_inferred_flags_roundtrip() -> Result<()> {
    let base = VideoParam::new(&hrd_settings()).sps.vui_parameters.hrd_parameters;
    let nal = base.sub_layers[0].nal.clone();

    // Flags contradicting what a decoder infers for them
    let hrd = HrdParameters {
        sub_layers: vec![
            HrdSubLayer {
                fixed_pic_rate_general_flag: true,
                fixed_pic_rate_within_cvs_flag: false,
                elemental_duration_in_tc_minus1: 1,
                low_delay_hrd_flag: true,
                nal: nal.clone(),
                ..Default::default()
            },
            HrdSubLayer {
                elemental_duration_in_tc_minus1: 7,
                low_delay_hrd_flag: true,
                cpb_cnt_minus1: 2,
                nal,
                ..Default::default()
            },
        ],
        ..base
    };

    let mut writer = BitWriter::new();
    hrd.write(&mut writer, true, 1);

    let parsed = HrdParameters::parse(&mut raw_reader(writer.as_slice()), true, 1)?;
    assert_ne!(parsed, hrd);

    let mut normalized = hrd.clone();
    normalized.normalize();
    assert_eq!(parsed, normalized);

    let sl = &parsed.sub_layers[0];
    assert!(sl.fixed_pic_rate_within_cvs_flag);
    assert!(!sl.low_delay_hrd_flag);
    assert_eq!(sl.elemental_duration_in_tc_minus1, 1);

    let sl = &parsed.sub_layers[1];
    assert!(sl.low_delay_hrd_flag);
    assert_eq!(sl.cpb_cnt_minus1, 0);
    assert_eq!(sl.elemental_duration_in_tc_minus1, 0);

    // Normalized parameters round trip as is
    let mut writer = BitWriter::new();
    normalized.write(&mut writer, true, 1);
    assert_eq!(HrdParameters::parse(&mut raw_reader(writer.as_slice()), true, 1)?, normalized);

    Ok(())
}

#[test]
fn buffering_period_roundtrip() -> Result<()> {
    let hrd = VideoParam::new(&hrd_settings()).sps.vui_parameters.hrd_parameters;

    let bp = BufferingPeriodSei {
        irap_cpb_params_present_flag: true,
        cpb_delay_offset: 3,
        dpb_delay_offset: 1,
        au_cpb_removal_delay_delta_minus1: 0,
        nal: vec![InitialCpbRemoval {
            initial_cpb_removal_delay: 90_000,
            initial_cpb_removal_offset: 0,
            initial_alt_cpb_removal_delay: 45_000,
            initial_alt_cpb_removal_offset: 12,
        }],
        ..Default::default()
    };

    let mut writer = BitWriter::new();
    bp.write(&mut writer, &hrd);
    assert!(writer.is_aligned());

    // ue + flag + 24 + 24 + flag + 24 + 4 * 24, then alignment
    assert_eq!(writer.pos(), (1 + 1 + 24 + 24 + 1 + 24 + 96usize).div_ceil(8) * 8);
    assert_eq!(BufferingPeriodSei::parse(&mut raw_reader(writer.as_slice()), &hrd)?, bp);

    Ok(())
}

#[test]
fn pic_timing_roundtrip() -> Result<()> {
    let mut vui = VideoParam::new(&hrd_settings()).sps.vui_parameters;
    vui.frame_field_info_present_flag = true;

    let pt = PicTimingSei {
        pic_struct: 1,
        source_scan_type: 1,
        au_cpb_removal_delay_minus1: 5,
        pic_dpb_output_delay: 2,
        ..Default::default()
    };

    let mut writer = BitWriter::new();
    pt.write(&mut writer, &vui);
    assert!(writer.is_aligned());
    assert_eq!(writer.pos(), 56);

    assert_eq!(PicTimingSei::parse(&mut raw_reader(writer.as_slice()), &vui)?, pt);

    Ok(())
}

#[test]
fn pic_timing_decoding_units() -> Result<()> {
    let mut vui = VideoParam::new(&hrd_settings()).sps.vui_parameters;
    vui.hrd_parameters = HrdParameters {
        sub_pic_hrd_params_present_flag: true,
        sub_pic_cpb_params_in_pic_timing_sei_flag: true,
        du_cpb_removal_delay_increment_length_minus1: 7,
        dpb_output_delay_du_length_minus1: 7,
        ..vui.hrd_parameters.clone()
    };

    let pt = PicTimingSei {
        au_cpb_removal_delay_minus1: 1,
        pic_dpb_output_delay: 1,
        pic_dpb_output_du_delay: 9,
        num_decoding_units_minus1: 2,
        num_nalus_in_du_minus1: vec![0, 1, 0],
        du_cpb_removal_delay_increment_minus1: vec![4, 6],
        ..Default::default()
    };

    let mut writer = BitWriter::new();
    pt.write(&mut writer, &vui);

    assert_eq!(PicTimingSei::parse(&mut raw_reader(writer.as_slice()), &vui)?, pt);

    Ok(())
}

#[test]
fn sei_message_framing() -> Result<()> {
    let long = SeiPayload::new(5, vec![0xAB; 300]);
    let short = SeiPayload::new(sei::SEI_RECOVERY_POINT, vec![0x84]);

    let mut writer = BitWriter::new();
    long.write(&mut writer);
    short.write(&mut writer);
    writer.put_trailing_bits(false);

    let data = writer.as_slice().to_vec();
    assert_eq!(&data[..3], &[0x05, 0xFF, 0x2D]);
    assert_eq!(data.len(), 3 + 300 + 3 + 1);

    let messages = SeiPayload::parse_all(&data)?;
    assert_eq!(messages, vec![long, short]);

    Ok(())
}
