use std::io::{stdout, Write};

use anyhow::{bail, Result};
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, warn};

use hevc_bitstream::bits::BitReader;
use hevc_bitstream::header_reader::{nal_units, read_pps, read_sps, read_vps, AnnexBNal};
use hevc_bitstream::hevc::pps::PpsNal;
use hevc_bitstream::hevc::sps::SpsNal;
use hevc_bitstream::hevc::vps::VpsNal;
use hevc_bitstream::hevc::*;

use super::{input_from_either, read_annexb_file};
use crate::commands::InfoArgs;

#[derive(Debug, Default, Serialize)]
struct ParameterSets {
    #[serde(skip_serializing_if = "Option::is_none")]
    vps: Option<VpsNal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sps: Option<SpsNal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pps: Option<PpsNal>,
}

pub struct StreamInfo;

impl StreamInfo {
    pub fn info(args: InfoArgs) -> Result<()> {
        let InfoArgs {
            input,
            input_pos,
            summary,
        } = args;

        let input = input_from_either("info", input, input_pos)?;

        println!("Parsing HEVC file...");
        stdout().flush().ok();

        let data = read_annexb_file(&input)?;
        let nals = nal_units(&data);

        if nals.is_empty() {
            bail!("No NALU start codes found in the file. Maybe not a valid HEVC stream?");
        }

        info!(count = nals.len(), "NAL units found");

        print_summary(&nals);

        if summary {
            return Ok(());
        }

        let present = |nal_unit_type: u8| nals.iter().any(|n| n.header.nal_unit_type == nal_unit_type);

        // Parse errors are reported but don't hide the other parameter sets
        let sets = ParameterSets {
            vps: present(NAL_VPS)
                .then(|| read_vps(&mut BitReader::new(&data)))
                .and_then(|res| res.map_err(|e| warn!("VPS: {e}")).ok()),
            sps: present(NAL_SPS)
                .then(|| read_sps(&mut BitReader::new(&data)))
                .and_then(|res| res.map_err(|e| warn!("SPS: {e}")).ok()),
            pps: present(NAL_PPS)
                .then(|| read_pps(&mut BitReader::new(&data)))
                .and_then(|res| res.map_err(|e| warn!("PPS: {e}")).ok()),
        };

        println!("{}", serde_json::to_string_pretty(&sets)?);

        Ok(())
    }
}

fn print_summary(nals: &[AnnexBNal]) {
    // first_slice_segment_in_pic_flag is the first payload bit of a slice
    let pictures = nals
        .iter()
        .filter(|n| is_vcl(n.header.nal_unit_type))
        .filter(|n| n.payload.first().is_some_and(|b| b & 0x80 != 0))
        .count();

    println!("Summary:");
    println!("  NAL units: {}", nals.len());
    println!("  Pictures: {pictures}");

    let counts = nals.iter().map(|n| n.header.nal_unit_type).counts();

    for (nal_unit_type, count) in counts.into_iter().sorted() {
        println!(
            "  {:>2} {:<12} {}",
            nal_unit_type,
            nal_type_name(nal_unit_type),
            count
        );
    }
}

fn nal_type_name(nal_unit_type: u8) -> &'static str {
    match nal_unit_type {
        NAL_TRAIL_N => "TRAIL_N",
        NAL_TRAIL_R => "TRAIL_R",
        NAL_TSA_N => "TSA_N",
        NAL_TSA_R => "TSA_R",
        NAL_STSA_N => "STSA_N",
        NAL_STSA_R => "STSA_R",
        NAL_RADL_N => "RADL_N",
        NAL_RADL_R => "RADL_R",
        NAL_RASL_N => "RASL_N",
        NAL_RASL_R => "RASL_R",
        NAL_BLA_W_LP => "BLA_W_LP",
        NAL_BLA_W_RADL => "BLA_W_RADL",
        NAL_BLA_N_LP => "BLA_N_LP",
        NAL_IDR_W_RADL => "IDR_W_RADL",
        NAL_IDR_N_LP => "IDR_N_LP",
        NAL_CRA_NUT => "CRA_NUT",
        NAL_VPS => "VPS",
        NAL_SPS => "SPS",
        NAL_PPS => "PPS",
        NAL_AUD => "AUD",
        NAL_EOS_NUT => "EOS",
        NAL_EOB_NUT => "EOB",
        NAL_FD_NUT => "FD",
        NAL_SEI_PREFIX => "SEI_PREFIX",
        NAL_SEI_SUFFIX => "SEI_SUFFIX",
        _ => "reserved",
    }
}
