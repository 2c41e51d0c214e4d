//! Access unit level serialization: parameter sets, AUD, SEI, slice segment
//! headers and all-skip slices.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::bits::BitWriter;
use crate::error::{HeaderError, Result};
use crate::hevc::sei::{
    SeiPayload, SEI_ACTIVE_PARAMETER_SETS, SEI_BUFFERING_PERIOD, SEI_DECODING_UNIT_INFO,
    SEI_PIC_TIMING,
};
use crate::hevc::slice::{Slice, SliceHeaderOffsets};
use crate::hevc::{
    NalUnit, NAL_AUD, NAL_PPS, NAL_SEI_PREFIX, NAL_SEI_SUFFIX, NAL_SPS, NAL_VPS, SLICE_TYPE_I,
};
use crate::params::{SliceSegment, Task, VideoParam};
use crate::utils::{add_start_code_emulation_prevention_3_byte, escaped_bit_offset};

mod nal_buffer;
mod skip_slice;

pub use nal_buffer::NalBuffer;
use skip_slice::SkipSliceWalker;


/// Default bound of the access unit buffer, in bytes.
pub const DEFAULT_AU_CAPACITY: usize = 4 << 20;

/// A slice segment NAL unit and the positions a submission layer may patch.
///
/// Offsets are in bits from the first byte of the NAL unit (start code
/// included) and account for emulation prevention bytes. An offset is 0 when
/// the syntax element is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceHeaderNal<'b> {
    pub data: &'b [u8],
    pub qpd_offset: usize,
    pub sao_offset: usize,
    pub pwt_offset: usize,
    pub pwt_length: usize,
    /// Start code and NAL unit header, in bytes.
    pub ssh_start_len: usize,
    /// Slice segment header RBSP length, in bits.
    pub ssh_offset: usize,
}

/// Serializer bound to one set of active parameter sets.
///
/// The VPS/SPS/PPS NAL units are packed once on `reset`. SEI, slice header and
/// skip slice NAL units of the current access unit accumulate in one buffer.
#[derive(Debug)]
pub struct HeaderPacker<'a> {
    par: &'a VideoParam,

    vps: Vec<u8>,
    sps: Vec<u8>,
    pps: Vec<u8>,
    aud: Vec<u8>,

    au: NalBuffer,
    rbsp: BitWriter,
}

impl<'a> HeaderPacker<'a> {
    pub fn new(par: &'a VideoParam) -> Self {
        Self::with_capacity(par, DEFAULT_AU_CAPACITY)
    }

    pub fn with_capacity(par: &'a VideoParam, au_capacity: usize) -> Self {
        let mut packer = Self {
            par,
            vps: Vec::new(),
            sps: Vec::new(),
            pps: Vec::new(),
            aud: Vec::new(),
            au: NalBuffer::with_capacity(au_capacity),
            rbsp: BitWriter::new(),
        };
        packer.reset(par);

        packer
    }

    /// Rebinds the packer to `par` and repacks the parameter sets.
    pub fn reset(&mut self, par: &'a VideoParam) {
        self.par = par;

        self.vps = pack_parameter_set(NAL_VPS, |w| par.vps.write(w));
        self.sps = pack_parameter_set(NAL_SPS, |w| par.sps.write(w));
        self.pps = pack_parameter_set(NAL_PPS, |w| par.pps.write(w));

        self.aud.clear();
        self.au.reset();

        debug!(
            vps = self.vps.len(),
            sps = self.sps.len(),
            pps = self.pps.len(),
            "Parameter sets packed"
        );
    }

    pub fn video_param(&self) -> &'a VideoParam {
        self.par
    }

    pub fn get_vps(&self) -> &[u8] {
        &self.vps
    }

    pub fn get_sps(&self) -> &[u8] {
        &self.sps
    }

    pub fn get_pps(&self) -> &[u8] {
        &self.pps
    }

    /// Every NAL unit of the current access unit emitted so far.
    pub fn au_data(&self) -> &[u8] {
        self.au.data()
    }

    pub fn get_aud(&mut self, task: &Task) -> &[u8] {
        let mut writer = BitWriter::with_capacity(7);

        NalUnit::new(NAL_AUD, task.temporal_id).write(&mut writer);
        writer.put_bits(3, task.aud_pic_type() as u32);
        writer.put_trailing_bits(false);

        // pic_type is never followed by a zero byte, nothing to escape
        self.aud = writer.as_slice().to_vec();

        &self.aud
    }

    /// Starts a new access unit with its prefix SEI NAL units.
    ///
    /// Active parameter sets messages each get their own NAL unit. Buffering
    /// period, picture timing and decoding unit info messages share one, and
    /// the remaining messages go to a last one. On error the access unit
    /// buffer is left empty.
    pub fn get_prefix_sei(&mut self, task: &Task) -> Result<&[u8]> {
        self.au.reset();

        let messages = self.prefix_messages(task)?;

        let (aps, rest): (Vec<_>, Vec<_>) = messages
            .into_iter()
            .partition(|m| m.payload_type == SEI_ACTIVE_PARAMETER_SETS);
        let (timing, other): (Vec<_>, Vec<_>) = rest.into_iter().partition(|m| {
            matches!(
                m.payload_type,
                SEI_BUFFERING_PERIOD | SEI_PIC_TIMING | SEI_DECODING_UNIT_INFO
            )
        });

        let groups = aps
            .into_iter()
            .map(|m| vec![m])
            .chain([timing, other])
            .filter(|group| !group.is_empty())
            .collect_vec();

        let nalu = NalUnit::new(NAL_SEI_PREFIX, task.temporal_id);

        for group in &groups {
            if let Err(e) = self.push_sei_nal(&nalu, group) {
                self.au.reset();
                return Err(e);
            }
        }

        trace!(nal_units = groups.len(), bytes = self.au.len(), "Prefix SEI packed");

        Ok(self.au.data())
    }

    /// Appends one suffix SEI NAL unit with the caller's suffix payloads.
    /// Returns an empty slice when the task has none.
    pub fn get_suffix_sei(&mut self, task: &Task) -> Result<&[u8]> {
        let mark = self.au.mark();

        let messages = task.payloads.iter().filter(|p| p.suffix).cloned().collect_vec();

        if !messages.is_empty() {
            let nalu = NalUnit::new(NAL_SEI_SUFFIX, task.temporal_id);
            self.push_sei_nal(&nalu, &messages)?;
        }

        Ok(self.au.bytes_since(mark))
    }

    /// Packs the header of slice segment `slice_idx` of `task`.
    ///
    /// The first slice of an access unit without prefix SEI starts a new
    /// access unit, later ones are appended after what is already there.
    /// With `dyn_slice_size` the header is left unaligned for slice data to
    /// be appended by the caller.
    pub fn get_ssh(&mut self, task: &Task, slice_idx: usize) -> Result<SliceHeaderNal<'_>> {
        if slice_idx == 0 && !task.has_prefix_sei() {
            self.au.reset();
        }

        let par = self.par;
        let segment = self.segment(task, slice_idx)?;
        let slice = self.slice_header(task, &segment);

        self.rbsp.reset();
        let offsets = slice.write(&mut self.rbsp, task.nal_unit_type, &par.sps, &par.pps);
        let ssh_offset = self.rbsp.pos();

        if !task.dyn_slice_size {
            // byte_alignment()
            self.rbsp.put_trailing_bits(false);
        }

        let nalu = NalUnit::new(task.nal_unit_type, task.temporal_id)
            .with_long_start_code(self.au.is_empty());

        let mark = self.au.mark();
        let rbsp = self.rbsp.as_slice();
        self.au.push_nal(&nalu, rbsp)?;

        let header_bits = nalu.header_len() * 8;
        let to_nal = |bit_pos: usize| {
            if bit_pos == 0 {
                0
            } else {
                header_bits + escaped_bit_offset(rbsp, bit_pos)
            }
        };

        let SliceHeaderOffsets {
            sao_offset,
            qpd_offset,
            pwt_offset,
            pwt_length,
        } = offsets;

        let pwt_length = if pwt_length > 0 {
            to_nal(pwt_offset + pwt_length) - to_nal(pwt_offset)
        } else {
            0
        };

        Ok(SliceHeaderNal {
            data: self.au.bytes_since(mark),
            qpd_offset: to_nal(qpd_offset),
            sao_offset: to_nal(sao_offset),
            pwt_offset: to_nal(pwt_offset),
            pwt_length,
            ssh_start_len: nalu.header_len(),
            ssh_offset,
        })
    }

    /// Packs slice segment `slice_idx` of `task` with every CU skipped.
    ///
    /// SAO is turned off for the slice, it has no residual to correct.
    pub fn get_skip_slice(&mut self, task: &Task, slice_idx: usize) -> Result<&[u8]> {
        let par = self.par;
        let pps = &par.pps;

        if task.slice_type == SLICE_TYPE_I {
            return Err(HeaderError::Unsupported("skip slices need inter prediction"));
        }
        if pps.tiles_enabled_flag || pps.entropy_coding_sync_enabled_flag {
            return Err(HeaderError::Unsupported("skip slices with tiles or WPP"));
        }

        if slice_idx == 0 && !task.has_prefix_sei() {
            self.au.reset();
        }

        let segment = self.segment(task, slice_idx)?;

        let mut slice = self.slice_header(task, &segment);
        slice.dependent_slice_segment_flag = false;
        slice.slice_sao_luma_flag = false;
        slice.slice_sao_chroma_flag = false;

        self.rbsp.reset();
        slice.write(&mut self.rbsp, task.nal_unit_type, &par.sps, pps);
        self.rbsp.put_trailing_bits(false);

        let header_bits = self.rbsp.pos();

        let mut walker = SkipSliceWalker::new(&par.sps, pps, &slice, segment.segment_address);
        walker.write(&mut self.rbsp, &segment);

        let nalu = NalUnit::new(task.nal_unit_type, task.temporal_id)
            .with_long_start_code(self.au.is_empty());

        let mark = self.au.mark();
        let bins = self.rbsp.bin_count();
        let rbsp = self.rbsp.as_slice();
        self.au.push_nal(&nalu, rbsp)?;

        debug!(
            poc = task.poc,
            slice_idx,
            header_bits,
            bins,
            bytes = self.au.len() - mark,
            "Skip slice packed"
        );

        Ok(self.au.bytes_since(mark))
    }

    fn prefix_messages(&self, task: &Task) -> Result<Vec<SeiPayload>> {
        let vui = &self.par.sps.vui_parameters;
        let mut messages = Vec::with_capacity(task.payloads.len() + 2);

        if task.insert_bp_sei {
            if !vui.hrd_parameters_present_flag {
                return Err(HeaderError::InvalidParam(
                    "buffering period SEI without HRD parameters",
                ));
            }

            let mut writer = BitWriter::new();
            task.bp_sei.write(&mut writer, &vui.hrd_parameters);
            messages.push(SeiPayload::new(SEI_BUFFERING_PERIOD, writer.as_slice().to_vec()));
        }

        if task.insert_pt_sei {
            let mut writer = BitWriter::new();
            task.pt_sei.write(&mut writer, vui);
            messages.push(SeiPayload::new(SEI_PIC_TIMING, writer.as_slice().to_vec()));
        }

        messages.extend(task.payloads.iter().filter(|p| !p.suffix).cloned());

        Ok(messages)
    }

    fn push_sei_nal(&mut self, nalu: &NalUnit, messages: &[SeiPayload]) -> Result<usize> {
        let size = messages.iter().map(|m| m.data.len() + 4).sum::<usize>() + 1;
        let mut writer = BitWriter::with_capacity(size);

        messages.iter().for_each(|m| m.write(&mut writer));
        writer.put_trailing_bits(false);

        self.au.push_nal(nalu, writer.as_slice())
    }

    fn segment(&self, task: &Task, slice_idx: usize) -> Result<SliceSegment> {
        let segment = if task.slices.is_empty() && slice_idx == 0 {
            self.par.full_picture_slice()
        } else {
            task.slices
                .get(slice_idx)
                .copied()
                .ok_or(HeaderError::InvalidParam("slice index out of range"))?
        };

        let end = segment.segment_address as u64 + segment.num_ctu as u64;
        if segment.num_ctu == 0 || end > self.par.sps.pic_size_in_ctbs() as u64 {
            return Err(HeaderError::InvalidParam("slice segment outside of the picture"));
        }

        Ok(segment)
    }

    fn slice_header(&self, task: &Task, segment: &SliceSegment) -> Slice {
        let mut slice = task.slice.clone();

        slice.slice_type = task.slice_type;
        slice.first_slice_segment_in_pic_flag = segment.segment_address == 0;
        slice.segment_address = segment.segment_address;
        slice.pic_order_cnt_lsb =
            task.poc.rem_euclid(1 << self.par.sps.log2_max_poc_lsb()) as u32;

        if slice.first_slice_segment_in_pic_flag {
            slice.dependent_slice_segment_flag = false;
        }

        slice
    }
}

fn pack_parameter_set(nal_unit_type: u8, write: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
    let mut rbsp = BitWriter::new();
    write(&mut rbsp);

    let mut payload = rbsp.as_slice().to_vec();
    add_start_code_emulation_prevention_3_byte(&mut payload);

    let nalu = NalUnit::new(nal_unit_type, 0);
    let mut writer = BitWriter::with_capacity(nalu.header_len());
    nalu.write(&mut writer);

    let mut data = writer.as_slice().to_vec();
    data.extend_from_slice(&payload);

    data
}
