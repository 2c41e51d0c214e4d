//! Annex-B NAL unit scanning and parameter set parsing.
//!
//! The parsers only accept what the packer produces: anything exotic is
//! rejected with `HeaderError::Unsupported`.

use tracing::{debug, trace};

use crate::bits::BitReader;
use crate::error::{HeaderError, Result};
use crate::hevc::pps::PpsNal;
use crate::hevc::sps::SpsNal;
use crate::hevc::vps::VpsNal;
use crate::hevc::{NalUnit, NAL_PPS, NAL_SPS, NAL_VPS};

/// A NAL unit located in an Annex-B buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnexBNal<'a> {
    pub header: NalUnit,
    /// Byte offset of the start code.
    pub offset: usize,
    /// Escaped payload after the 2 byte NAL unit header.
    pub payload: &'a [u8],
}

/// Scans for the next start code and reads the NAL unit header after it.
///
/// The reader is left on the first payload bit with its emulation mode unchanged.
pub fn read_nalu(reader: &mut BitReader) -> Result<NalUnit> {
    let emulation = reader.emulation();
    reader.set_emulation(false);

    let res = scan_nalu(reader);

    reader.set_emulation(emulation);

    res
}

fn scan_nalu(reader: &mut BitReader) -> Result<NalUnit> {
    reader.byte_align()?;

    let mut zeros = 0;

    loop {
        match reader.get_bits(8)? {
            0 => zeros += 1,
            1 if zeros >= 2 => break,
            _ => zeros = 0,
        }
    }

    if reader.get_bit()? {
        return Err(HeaderError::InvalidParam("forbidden_zero_bit set"));
    }

    let nalu = NalUnit {
        long_start_code: zeros >= 3,
        nal_unit_type: reader.get_n(6)?,
        nuh_layer_id: reader.get_n(6)?,
        nuh_temporal_id_plus1: reader.get_n(3)?,
    };

    if nalu.nuh_temporal_id_plus1 == 0 {
        return Err(HeaderError::InvalidParam("nuh_temporal_id_plus1 is 0"));
    }

    trace!(?nalu, pos = reader.pos(), "NAL unit header");

    Ok(nalu)
}

/// Skips NAL units until one of `nal_unit_type` is found.
fn seek_nalu(reader: &mut BitReader, nal_unit_type: u8) -> Result<NalUnit> {
    loop {
        let nalu = read_nalu(reader)?;

        if nalu.nal_unit_type == nal_unit_type {
            return Ok(nalu);
        }
    }
}

pub fn read_vps(reader: &mut BitReader) -> Result<VpsNal> {
    seek_nalu(reader, NAL_VPS)?;

    let vps = VpsNal::parse(reader)?;
    debug!(id = vps.vps_video_parameter_set_id, "VPS parsed");

    Ok(vps)
}

pub fn read_sps(reader: &mut BitReader) -> Result<SpsNal> {
    seek_nalu(reader, NAL_SPS)?;

    let sps = SpsNal::parse(reader)?;
    debug!(
        id = sps.sps_seq_parameter_set_id,
        width = sps.pic_width_in_luma_samples,
        height = sps.pic_height_in_luma_samples,
        "SPS parsed"
    );

    Ok(sps)
}

pub fn read_pps(reader: &mut BitReader) -> Result<PpsNal> {
    seek_nalu(reader, NAL_PPS)?;

    let pps = PpsNal::parse(reader)?;
    debug!(id = pps.pps_pic_parameter_set_id, "PPS parsed");

    Ok(pps)
}

/// Splits an Annex-B buffer into its NAL units.
///
/// Trailing zero bytes before the next start code are not part of a payload.
/// Units with a truncated header are dropped.
pub fn nal_units(data: &[u8]) -> Vec<AnnexBNal<'_>> {
    let starts = start_codes(data);

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &(offset, header_start))| {
            let end = starts.get(i + 1).map(|(next, _)| *next).unwrap_or(data.len());
            let nal = &data[header_start..end];

            if nal.len() < 2 {
                return None;
            }

            let mut reader = BitReader::new(nal);
            reader.set_emulation(false);

            let forbidden_zero_bit = reader.get_bit().ok()?;
            let header = NalUnit {
                long_start_code: header_start - offset == 4,
                nal_unit_type: reader.get_n(6).ok()?,
                nuh_layer_id: reader.get_n(6).ok()?,
                nuh_temporal_id_plus1: reader.get_n(3).ok()?,
            };

            if forbidden_zero_bit {
                debug!(offset, "skipping NAL unit with forbidden_zero_bit set");
                return None;
            }

            let payload = &nal[2..];
            let trailing_zeros = payload.iter().rev().take_while(|b| **b == 0).count();

            Some(AnnexBNal {
                header,
                offset,
                payload: &payload[..payload.len() - trailing_zeros],
            })
        })
        .collect()
}

/// (start code offset, NAL header offset) pairs. A zero byte right before
/// `00 00 01` makes it a 4 byte start code.
fn start_codes(data: &[u8]) -> Vec<(usize, usize)> {
    let mut starts = Vec::new();
    let mut i = 0;

    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            let offset = if i > 0 && data[i - 1] == 0 { i - 1 } else { i };
            starts.push((offset, i + 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    starts
}
