//! slice_segment_data() made only of skipped coding units.

use crate::bits::BitWriter;
use crate::cabac::{ContextBank, SyntaxElement};
use crate::hevc::pps::PpsNal;
use crate::hevc::slice::Slice;
use crate::hevc::sps::SpsNal;
use crate::params::SliceSegment;

/// CTU quadtree walker coding every CU as skip with merge_idx 0.
pub(crate) struct SkipSliceWalker<'a> {
    sps: &'a SpsNal,
    pps: &'a PpsNal,
    contexts: ContextBank,
    max_num_merge_cand: u32,

    /// First CTU of the slice, in raster scan.
    slice_addr: u32,
    /// CtDepth per minimum coding block.
    depth: Vec<u8>,
    width_in_min_cbs: usize,
}

impl<'a> SkipSliceWalker<'a> {
    pub fn new(sps: &'a SpsNal, pps: &'a PpsNal, slice: &Slice, slice_addr: u32) -> Self {
        let slice_qp_y = slice.slice_qp_y(pps).max(0);
        let log2_min_cb = sps.log2_min_cb_size();

        let width_in_min_cbs = (sps.pic_width_in_luma_samples >> log2_min_cb) as usize;
        let height_in_min_cbs = (sps.pic_height_in_luma_samples >> log2_min_cb) as usize;

        Self {
            sps,
            pps,
            contexts: ContextBank::new(slice.slice_type, slice.cabac_init_flag, slice_qp_y),
            max_num_merge_cand: slice.max_num_merge_cand(),
            slice_addr,
            depth: vec![0; width_in_min_cbs * height_in_min_cbs],
            width_in_min_cbs,
        }
    }

    /// Codes every CTU of `segment`, the end_of_slice_segment_flag after each
    /// of them and the slice trailing bits.
    pub fn write(&mut self, writer: &mut BitWriter, segment: &SliceSegment) {
        let log2_ctb = self.sps.log2_ctb_size();
        let width_in_ctbs = self.sps.pic_width_in_ctbs();

        writer.cabac_init();

        let first = segment.segment_address;
        let last = first + segment.num_ctu.max(1) - 1;

        for addr in first..=last {
            let x0 = (addr % width_in_ctbs) << log2_ctb;
            let y0 = (addr / width_in_ctbs) << log2_ctb;

            self.coding_tree(writer, x0, y0, log2_ctb, 0);

            if addr == last {
                writer.slice_finish();
            } else {
                let ctx = self.contexts.get_mut(SyntaxElement::EndOfSliceSegmentFlag, 0);
                writer.encode_bin(ctx, false);
            }
        }
    }

    fn coding_tree(&mut self, writer: &mut BitWriter, x0: u32, y0: u32, log2_size: u32, depth: u8) {
        let size = 1 << log2_size;
        let width = self.sps.pic_width_in_luma_samples;
        let height = self.sps.pic_height_in_luma_samples;

        let splittable = log2_size > self.sps.log2_min_cb_size();
        let inside = x0 + size <= width && y0 + size <= height;

        // split_cu_flag is inferred to 1 across the picture boundary
        let split = if inside {
            if splittable {
                let ctx_inc = self.split_ctx_inc(x0, y0, depth);
                let ctx = self.contexts.get_mut(SyntaxElement::SplitCuFlag, ctx_inc);
                writer.encode_bin(ctx, false);
            }

            false
        } else {
            splittable
        };

        if split {
            let half = size / 2;

            for (x, y) in [(x0, y0), (x0 + half, y0), (x0, y0 + half), (x0 + half, y0 + half)] {
                if x < width && y < height {
                    self.coding_tree(writer, x, y, log2_size - 1, depth + 1);
                }
            }
        } else {
            self.coding_unit(writer, x0, y0, log2_size, depth);
        }
    }

    fn coding_unit(&mut self, writer: &mut BitWriter, x0: u32, y0: u32, log2_size: u32, depth: u8) {
        if self.pps.transquant_bypass_enabled_flag {
            let ctx = self.contexts.get_mut(SyntaxElement::CuTransquantBypassFlag, 0);
            writer.encode_bin(ctx, false);
        }

        // Every coded CU is skipped, so condTerm is neighbour availability
        let ctx_inc = usize::from(self.available(x0.wrapping_sub(1), y0))
            + usize::from(self.available(x0, y0.wrapping_sub(1)));
        let ctx = self.contexts.get_mut(SyntaxElement::CuSkipFlag, ctx_inc);
        writer.encode_bin(ctx, true);

        self.merge_idx(writer, 0);

        self.set_depth(x0, y0, log2_size, depth);
    }

    /// Truncated rice with cMax = MaxNumMergeCand - 1, first bin context coded.
    fn merge_idx(&mut self, writer: &mut BitWriter, merge_idx: u32) {
        let c_max = self.max_num_merge_cand.saturating_sub(1);

        for i in 0..c_max {
            let bin = i < merge_idx;

            if i == 0 {
                let ctx = self.contexts.get_mut(SyntaxElement::MergeIdx, 0);
                writer.encode_bin(ctx, bin);
            } else {
                writer.encode_bin_ep(bin);
            }

            if !bin {
                break;
            }
        }
    }

    fn split_ctx_inc(&self, x0: u32, y0: u32, depth: u8) -> usize {
        [(x0.wrapping_sub(1), y0), (x0, y0.wrapping_sub(1))]
            .into_iter()
            .filter(|&(x, y)| self.available(x, y) && self.depth_at(x, y) > depth)
            .count()
    }

    /// zScan availability for a left or above neighbour: inside the picture
    /// and in the current slice. Coordinates wrap for negative positions.
    fn available(&self, x: u32, y: u32) -> bool {
        if x >= self.sps.pic_width_in_luma_samples || y >= self.sps.pic_height_in_luma_samples {
            return false;
        }

        let log2_ctb = self.sps.log2_ctb_size();
        let ctb_addr = (y >> log2_ctb) * self.sps.pic_width_in_ctbs() + (x >> log2_ctb);

        ctb_addr >= self.slice_addr
    }

    fn depth_at(&self, x: u32, y: u32) -> u8 {
        let log2_min_cb = self.sps.log2_min_cb_size();
        let idx = (y >> log2_min_cb) as usize * self.width_in_min_cbs + (x >> log2_min_cb) as usize;

        self.depth.get(idx).copied().unwrap_or(0)
    }

    fn set_depth(&mut self, x0: u32, y0: u32, log2_size: u32, depth: u8) {
        let log2_min_cb = self.sps.log2_min_cb_size();
        let first_col = (x0 >> log2_min_cb) as usize;
        let first_row = (y0 >> log2_min_cb) as usize;
        let n = 1usize << (log2_size - log2_min_cb);

        let rows = self.depth.len() / self.width_in_min_cbs.max(1);
        let last_col = (first_col + n).min(self.width_in_min_cbs);

        for row in first_row..(first_row + n).min(rows) {
            let start = row * self.width_in_min_cbs;
            self.depth[start + first_col..start + last_col].fill(depth);
        }
    }
}
