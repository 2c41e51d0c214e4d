#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

/// Maximum number of pictures in one short-term RPS.
pub const MAX_RPS_PICS: usize = 16;

/// One picture of a short-term RPS, in explicit form.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StRpsPic {
    /// DeltaPocS0 (negative) or DeltaPocS1 (positive)
    pub delta_poc: i16,
    pub used_by_curr_pic_flag: bool,
    /// `|delta_poc - previous| - 1` within its block
    pub delta_poc_minus1: u16,
}

/// used_by_curr_pic_flag / use_delta_flag of an inter predicted RPS, one per
/// picture of the reference RPS plus one for the reference picture itself.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InterRpsFlags {
    pub used_by_curr_pic_flag: bool,
    /// Inferred 1 when `used_by_curr_pic_flag` is set.
    pub use_delta_flag: bool,
}

/// st_ref_pic_set()
///
/// `pics` always holds the explicit pictures (negative block first, closest
/// picture first in each block), also for inter predicted sets. The inter
/// prediction fields only decide how the set is signalled.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShortTermRps {
    pub inter_ref_pic_set_prediction_flag: bool,
    pub delta_idx_minus1: u8,
    pub delta_rps_sign: bool,
    pub abs_delta_rps_minus1: u16,
    pub inter: Vec<InterRpsFlags>,

    pub num_negative_pics: u8,
    pub num_positive_pics: u8,
    pub pics: Vec<StRpsPic>,
}

impl ShortTermRps {
    /// Explicit RPS from `(DeltaPoc, used)` pairs in any order.
    pub fn from_pictures<I>(pictures: I) -> Self
    where
        I: IntoIterator<Item = (i16, bool)>,
    {
        let (mut negative, mut positive): (Vec<_>, Vec<_>) = pictures
            .into_iter()
            .filter(|(delta_poc, _)| *delta_poc != 0)
            .partition(|(delta_poc, _)| *delta_poc < 0);

        negative.sort_by(|a, b| b.0.cmp(&a.0));
        positive.sort_by(|a, b| a.0.cmp(&b.0));

        negative.dedup_by_key(|(delta_poc, _)| *delta_poc);
        positive.dedup_by_key(|(delta_poc, _)| *delta_poc);

        Self::from_blocks(&negative, &positive)
    }

    /// Explicit RPS from already ordered S0 and S1 blocks.
    fn from_blocks(negative: &[(i16, bool)], positive: &[(i16, bool)]) -> Self {
        let mut pics = Vec::with_capacity(negative.len() + positive.len());

        for block in [negative, positive] {
            let mut prev = 0i32;

            for &(delta_poc, used) in block {
                pics.push(StRpsPic {
                    delta_poc,
                    used_by_curr_pic_flag: used,
                    delta_poc_minus1: (delta_poc as i32 - prev).unsigned_abs().saturating_sub(1) as u16,
                });

                prev = delta_poc as i32;
            }
        }

        Self {
            num_negative_pics: negative.len() as u8,
            num_positive_pics: positive.len() as u8,
            pics,
            ..Default::default()
        }
    }

    pub fn num_delta_pocs(&self) -> usize {
        self.num_negative_pics as usize + self.num_positive_pics as usize
    }

    pub fn negative(&self) -> &[StRpsPic] {
        &self.pics[..self.num_negative_pics as usize]
    }

    pub fn positive(&self) -> &[StRpsPic] {
        &self.pics[self.num_negative_pics as usize..]
    }

    /// NumPicTotalCurr contribution of this set.
    pub fn num_used(&self) -> usize {
        self.pics.iter().filter(|p| p.used_by_curr_pic_flag).count()
    }

    /// DeltaRps of an inter predicted set.
    pub fn delta_rps(&self) -> i32 {
        let magnitude = self.abs_delta_rps_minus1 as i32 + 1;

        if self.delta_rps_sign {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Same pictures and usage, regardless of how the sets are signalled.
    pub fn same_pictures(&self, other: &ShortTermRps) -> bool {
        self.num_negative_pics == other.num_negative_pics
            && self.pics.len() == other.pics.len()
            && self.pics.iter().zip(&other.pics).all(|(a, b)| {
                a.delta_poc == b.delta_poc && a.used_by_curr_pic_flag == b.used_by_curr_pic_flag
            })
    }

    /// Drops the inter prediction, keeping the pictures.
    pub fn to_explicit(&self) -> ShortTermRps {
        Self {
            num_negative_pics: self.num_negative_pics,
            num_positive_pics: self.num_positive_pics,
            pics: self.pics.clone(),
            ..Default::default()
        }
    }

    /// st_ref_pic_set(idx) with `num_sets` = num_short_term_ref_pic_sets.
    /// `idx == num_sets` is the slice header form.
    pub fn write(&self, writer: &mut BitWriter, idx: usize, num_sets: usize) {
        debug_assert!(idx != 0 || !self.inter_ref_pic_set_prediction_flag);

        if idx != 0 {
            writer.put_bit(self.inter_ref_pic_set_prediction_flag);
        }

        if self.inter_ref_pic_set_prediction_flag {
            if idx == num_sets {
                writer.put_ue(self.delta_idx_minus1 as u32);
            }

            writer.put_bit(self.delta_rps_sign);
            writer.put_ue(self.abs_delta_rps_minus1 as u32);

            for flags in &self.inter {
                writer.put_bit(flags.used_by_curr_pic_flag);

                if !flags.used_by_curr_pic_flag {
                    writer.put_bit(flags.use_delta_flag);
                }
            }
        } else {
            writer.put_ue(self.num_negative_pics as u32);
            writer.put_ue(self.num_positive_pics as u32);

            for pic in &self.pics {
                writer.put_ue(pic.delta_poc_minus1 as u32);
                writer.put_bit(pic.used_by_curr_pic_flag);
            }
        }
    }

    /// Parses st_ref_pic_set(idx). `sets` holds the SPS sets already parsed.
    pub fn parse(
        reader: &mut BitReader,
        sets: &[ShortTermRps],
        idx: usize,
        num_sets: usize,
    ) -> Result<ShortTermRps> {
        let mut rps = ShortTermRps::default();

        if idx != 0 {
            rps.inter_ref_pic_set_prediction_flag = reader.get_bit()?;
        }

        if rps.inter_ref_pic_set_prediction_flag {
            if idx == num_sets {
                let delta_idx_minus1 = reader.get_ue()?;

                if delta_idx_minus1 as usize >= idx {
                    return Err(HeaderError::InvalidParam("delta_idx_minus1 out of range"));
                }

                rps.delta_idx_minus1 = delta_idx_minus1 as u8;
            }

            rps.delta_rps_sign = reader.get_bit()?;

            let abs_delta_rps_minus1 = reader.get_ue()?;
            if abs_delta_rps_minus1 >= 1 << 15 {
                return Err(HeaderError::InvalidParam("abs_delta_rps_minus1 out of range"));
            }
            rps.abs_delta_rps_minus1 = abs_delta_rps_minus1 as u16;

            let ref_rps = sets
                .get(idx - (rps.delta_idx_minus1 as usize + 1))
                .ok_or(HeaderError::InvalidParam("missing reference RPS"))?;

            for _ in 0..=ref_rps.num_delta_pocs() {
                let used_by_curr_pic_flag = reader.get_bit()?;
                let use_delta_flag = used_by_curr_pic_flag || reader.get_bit()?;

                rps.inter.push(InterRpsFlags {
                    used_by_curr_pic_flag,
                    use_delta_flag,
                });
            }

            let derived = derive_inter_rps(ref_rps, rps.delta_rps(), &rps.inter)
                .ok_or(HeaderError::InvalidParam("inter RPS derivation out of range"))?;

            rps.num_negative_pics = derived.num_negative_pics;
            rps.num_positive_pics = derived.num_positive_pics;
            rps.pics = derived.pics;
        } else {
            let num_negative_pics = reader.get_ue()? as usize;
            let num_positive_pics = reader.get_ue()? as usize;

            if num_negative_pics + num_positive_pics > MAX_RPS_PICS {
                return Err(HeaderError::InvalidParam("too many pictures in RPS"));
            }

            let mut negative = Vec::with_capacity(num_negative_pics);
            let mut positive = Vec::with_capacity(num_positive_pics);

            for (count, sign, block) in [
                (num_negative_pics, -1, &mut negative),
                (num_positive_pics, 1, &mut positive),
            ] {
                let mut prev = 0i32;

                for _ in 0..count {
                    let delta_poc_minus1 = reader.get_ue()?;
                    if delta_poc_minus1 >= 1 << 15 {
                        return Err(HeaderError::InvalidParam("delta_poc_minus1 out of range"));
                    }

                    let delta_poc = prev + sign * (delta_poc_minus1 as i32 + 1);
                    let delta_poc = i16::try_from(delta_poc)
                        .map_err(|_| HeaderError::InvalidParam("DeltaPoc out of range"))?;

                    block.push((delta_poc, reader.get_bit()?));
                    prev = delta_poc as i32;
                }
            }

            rps = ShortTermRps::from_blocks(&negative, &positive);
        }

        Ok(rps)
    }
}

/// Explicit pictures of a set predicted from `ref_rps` with `delta_rps`
/// (H.265 7.4.8, equations 7-61 and 7-62).
///
/// `flags` needs `ref_rps.num_delta_pocs() + 1` entries. Returns `None` when a
/// derived DeltaPoc leaves the i16 range or the set grows too large.
pub fn derive_inter_rps(
    ref_rps: &ShortTermRps,
    delta_rps: i32,
    flags: &[InterRpsFlags],
) -> Option<ShortTermRps> {
    let num_neg = ref_rps.num_negative_pics as usize;
    let num_delta_pocs = ref_rps.num_delta_pocs();

    if flags.len() != num_delta_pocs + 1 {
        return None;
    }

    let ref_neg = ref_rps.negative();
    let ref_pos = ref_rps.positive();

    let mut negative = Vec::new();
    let mut positive = Vec::new();

    let push = |block: &mut Vec<(i16, bool)>, d_poc: i32, j: usize| -> Option<()> {
        block.push((i16::try_from(d_poc).ok()?, flags[j].used_by_curr_pic_flag));
        Some(())
    };

    for (j, pic) in ref_pos.iter().enumerate().rev() {
        let d_poc = pic.delta_poc as i32 + delta_rps;
        if d_poc < 0 && flags[num_neg + j].use_delta_flag {
            push(&mut negative, d_poc, num_neg + j)?;
        }
    }

    if delta_rps < 0 && flags[num_delta_pocs].use_delta_flag {
        push(&mut negative, delta_rps, num_delta_pocs)?;
    }

    for (j, pic) in ref_neg.iter().enumerate() {
        let d_poc = pic.delta_poc as i32 + delta_rps;
        if d_poc < 0 && flags[j].use_delta_flag {
            push(&mut negative, d_poc, j)?;
        }
    }

    for (j, pic) in ref_neg.iter().enumerate().rev() {
        let d_poc = pic.delta_poc as i32 + delta_rps;
        if d_poc > 0 && flags[j].use_delta_flag {
            push(&mut positive, d_poc, j)?;
        }
    }

    if delta_rps > 0 && flags[num_delta_pocs].use_delta_flag {
        push(&mut positive, delta_rps, num_delta_pocs)?;
    }

    for (j, pic) in ref_pos.iter().enumerate() {
        let d_poc = pic.delta_poc as i32 + delta_rps;
        if d_poc > 0 && flags[num_neg + j].use_delta_flag {
            push(&mut positive, d_poc, num_neg + j)?;
        }
    }

    if negative.len() + positive.len() > MAX_RPS_PICS {
        return None;
    }

    Some(ShortTermRps::from_blocks(&negative, &positive))
}
