//! Short-term RPS construction and signalling cost minimisation.

use itertools::Itertools;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{ceil_log2, ue_bits};
use crate::dpb::{DpbFrame, RefLists};
use crate::hevc::short_term_rps::{InterRpsFlags, ShortTermRps};
use crate::hevc::slice::Slice;
use crate::hevc::MAX_NUM_ST_RPS;

pub use crate::hevc::short_term_rps::derive_inter_rps;

#[cfg(test)]
mod tests;

/// abs_delta_rps_minus1 is limited to 2^15 - 1
const MAX_ABS_DELTA_RPS: i32 = 1 << 15;

/// A distinct RPS of a sequence and the number of slices using it.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RpsEntry {
    pub rps: ShortTermRps,
    pub num_slices: u32,
}

/// How one picture signals its RPS.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RpsChoice {
    /// short_term_ref_pic_set_idx into the SPS sets
    Sps(usize),
    /// Coded in the slice header
    Inline(ShortTermRps),
}

/// SPS resident sets and the per picture choice, in input order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SequenceRps {
    pub sps_sets: Vec<ShortTermRps>,
    pub pictures: Vec<RpsChoice>,
    pub total_bits: u32,
}

/// RPS of a picture at `poc`: every short-term picture of the DPB, marked
/// used when one of the active lists references it.
///
/// Pictures whose POC distance does not fit a delta POC are left out.
pub fn construct_strps(dpb: &[DpbFrame], lists: &RefLists, poc: i32) -> ShortTermRps {
    ShortTermRps::from_pictures(dpb.iter().filter(|f| !f.long_term).filter_map(|f| {
        let delta_poc = i16::try_from(i64::from(f.poc) - i64::from(poc)).ok()?;

        Some((delta_poc, lists.contains(f.poc)))
    }))
}

/// Bits spent by st_ref_pic_set(idx) for `rps` as currently signalled.
pub fn nbits(rps: &ShortTermRps, idx: usize, num_sets: usize) -> u32 {
    let mut bits = u32::from(idx != 0);

    if rps.inter_ref_pic_set_prediction_flag {
        if idx == num_sets {
            bits += ue_bits(rps.delta_idx_minus1 as u32);
        }

        bits += 1 + ue_bits(rps.abs_delta_rps_minus1 as u32);
        bits += rps
            .inter
            .iter()
            .map(|f| if f.used_by_curr_pic_flag { 1 } else { 2 })
            .sum::<u32>();
    } else {
        bits += ue_bits(rps.num_negative_pics as u32) + ue_bits(rps.num_positive_pics as u32);
        bits += rps
            .pics
            .iter()
            .map(|p| ue_bits(p.delta_poc_minus1 as u32) + 1)
            .sum::<u32>();
    }

    bits
}

/// Replaces `rps`, coded at position `idx` after `sets[..idx]`, with an inter
/// predicted form when one reproduces its pictures in strictly fewer bits.
///
/// SPS sets (`idx < num_sets`) can only predict from the previous set. The
/// slice header set (`idx == num_sets`) can predict from any SPS set.
pub fn optimize_strps(sets: &[ShortTermRps], num_sets: usize, rps: &mut ShortTermRps, idx: usize) {
    debug_assert!(idx <= sets.len() && idx <= num_sets);

    if idx == 0 {
        return;
    }

    let target = rps.to_explicit();
    let mut best_bits = nbits(rps, idx, num_sets);
    let mut best = None;

    let lowest_ref = if idx == num_sets { 0 } else { idx - 1 };

    for k in (lowest_ref..idx).rev() {
        let Some(candidate) = predict_from(&sets[k], &target, idx - k - 1) else {
            continue;
        };

        let bits = nbits(&candidate, idx, num_sets);
        if bits < best_bits {
            best_bits = bits;
            best = Some(candidate);
        }
    }

    if let Some(candidate) = best {
        *rps = candidate;
    }
}

/// First DeltaRps, by increasing magnitude with negative values first, that
/// reconstructs `target` from `ref_rps`.
fn predict_from(ref_rps: &ShortTermRps, target: &ShortTermRps, delta_idx_minus1: usize) -> Option<ShortTermRps> {
    let ref_pocs: Vec<i32> = ref_rps
        .pics
        .iter()
        .map(|p| p.delta_poc as i32)
        .chain(std::iter::once(0))
        .collect();

    let candidates = target
        .pics
        .iter()
        .cartesian_product(&ref_pocs)
        .map(|(t, r)| t.delta_poc as i32 - r)
        .filter(|d| *d != 0 && d.abs() <= MAX_ABS_DELTA_RPS)
        .unique()
        .sorted_by_key(|d| (d.abs(), *d > 0));

    for delta_rps in candidates {
        let mut hits = 0;

        let flags: Vec<InterRpsFlags> = ref_pocs
            .iter()
            .map(|r| {
                match target.pics.iter().find(|t| t.delta_poc as i32 == r + delta_rps) {
                    Some(t) => {
                        hits += 1;

                        InterRpsFlags {
                            used_by_curr_pic_flag: t.used_by_curr_pic_flag,
                            use_delta_flag: true,
                        }
                    }
                    None => InterRpsFlags::default(),
                }
            })
            .collect();

        if hits != target.pics.len() {
            continue;
        }

        match derive_inter_rps(ref_rps, delta_rps, &flags) {
            Some(derived) if derived.same_pictures(target) => (),
            _ => continue,
        }

        return Some(ShortTermRps {
            inter_ref_pic_set_prediction_flag: true,
            delta_idx_minus1: delta_idx_minus1 as u8,
            delta_rps_sign: delta_rps < 0,
            abs_delta_rps_minus1: (delta_rps.abs() - 1) as u16,
            inter: flags,
            ..target.clone()
        });
    }

    None
}

/// Estimated header bits for the whole sequence when only the first
/// `num_resident` entries of `sets` are SPS resident.
///
/// Counts the SPS sets, then per slice the sps flag and index for resident
/// sets or the inline set for the others.
pub fn sequence_bits(sets: &[RpsEntry], num_resident: usize) -> u32 {
    let num_resident = num_resident.min(sets.len());
    let resident = optimized_sps_sets(sets, num_resident);

    let sps_bits = ue_bits(num_resident as u32)
        + resident
            .iter()
            .enumerate()
            .map(|(idx, rps)| nbits(rps, idx, num_resident))
            .sum::<u32>();

    let index_bits = ceil_log2(num_resident as u32);

    let slice_bits: u32 = sets
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let per_slice = if i < num_resident {
                1 + index_bits
            } else {
                let inline = inline_rps(&resident, &entry.rps);
                1 + nbits(&inline, num_resident, num_resident)
            };

            entry.num_slices * per_slice
        })
        .sum();

    sps_bits + slice_bits
}

/// Drops the least used SPS sets while coding them in slice headers is
/// cheaper. `sets` must be sorted by decreasing `num_slices`; it is truncated
/// to the resident sets. Returns the estimated sequence bits.
pub fn reduce_strps(sets: &mut Vec<RpsEntry>) -> u32 {
    let mut num_resident = sets.len();
    let mut total = sequence_bits(sets, num_resident);

    while num_resident > 0 {
        let without_last = sequence_bits(sets, num_resident - 1);

        if without_last >= total {
            break;
        }

        debug!(
            "Moving RPS {} ({} slices) to slice headers: {} -> {} bits",
            num_resident - 1,
            sets[num_resident - 1].num_slices,
            total,
            without_last
        );

        num_resident -= 1;
        total = without_last;
    }

    sets.truncate(num_resident);

    total
}

/// SPS sets with each one predicted from its predecessor where cheaper.
fn optimized_sps_sets(sets: &[RpsEntry], num_resident: usize) -> Vec<ShortTermRps> {
    let mut resident: Vec<ShortTermRps> = Vec::with_capacity(num_resident);

    for (idx, entry) in sets.iter().take(num_resident).enumerate() {
        let mut rps = entry.rps.to_explicit();
        optimize_strps(&resident, num_resident, &mut rps, idx);

        resident.push(rps);
    }

    resident
}

fn inline_rps(resident: &[ShortTermRps], rps: &ShortTermRps) -> ShortTermRps {
    let mut inline = rps.to_explicit();
    optimize_strps(resident, resident.len(), &mut inline, resident.len());

    inline
}

/// Picks the SPS sets for a sequence of per picture RPS and how each picture
/// signals its own.
pub fn plan_sequence_rps(pictures: &[ShortTermRps]) -> SequenceRps {
    let mut entries: Vec<RpsEntry> = Vec::new();

    for rps in pictures {
        match entries.iter_mut().find(|e| e.rps.same_pictures(rps)) {
            Some(entry) => entry.num_slices += 1,
            None => entries.push(RpsEntry {
                rps: rps.to_explicit(),
                num_slices: 1,
            }),
        }
    }

    // Stable, first seen first among equals
    entries.sort_by(|a, b| b.num_slices.cmp(&a.num_slices));

    let mut resident_entries = entries.clone();
    resident_entries.truncate(MAX_NUM_ST_RPS);

    let total_bits = reduce_strps(&mut resident_entries);
    let sps_sets = optimized_sps_sets(&resident_entries, resident_entries.len());

    debug!(
        "{} distinct RPS, {} in SPS, ~{} bits",
        entries.len(),
        sps_sets.len(),
        total_bits
    );

    let pictures = pictures
        .iter()
        .map(|rps| match sps_sets.iter().position(|s| s.same_pictures(rps)) {
            Some(idx) => RpsChoice::Sps(idx),
            None => RpsChoice::Inline(inline_rps(&sps_sets, rps)),
        })
        .collect();

    SequenceRps {
        sps_sets,
        pictures,
        total_bits,
    }
}

impl SequenceRps {
    /// Sets the RPS fields of a slice header for picture `index`.
    pub fn apply(&self, slice: &mut Slice, index: usize) {
        match self.pictures.get(index) {
            Some(RpsChoice::Sps(idx)) => {
                slice.short_term_ref_pic_set_sps_flag = true;
                slice.short_term_ref_pic_set_idx = *idx as u32;
                slice.strps = self.sps_sets[*idx].clone();
            }
            Some(RpsChoice::Inline(rps)) => {
                slice.short_term_ref_pic_set_sps_flag = false;
                slice.short_term_ref_pic_set_idx = 0;
                slice.strps = rps.clone();
            }
            None => debug_assert!(false, "no RPS planned for picture {index}"),
        }
    }
}
