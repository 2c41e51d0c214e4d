#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reference picture metadata. The picture data itself lives elsewhere.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DpbFrame {
    pub poc: i32,
    pub long_term: bool,
    pub tid: u8,
    pub second_field: bool,
}

/// POCs of the active reference pictures.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RefLists {
    pub l0: Vec<i32>,
    pub l1: Vec<i32>,
}

/// Sliding window DPB in decoding order.
#[derive(Debug, Clone)]
pub struct Dpb {
    frames: Vec<DpbFrame>,
    max_refs: usize,
}

impl RefLists {
    pub fn contains(&self, poc: i32) -> bool {
        self.l0.contains(&poc) || self.l1.contains(&poc)
    }
}

impl Dpb {
    pub fn new(max_refs: usize) -> Self {
        Self {
            frames: Vec::with_capacity(max_refs),
            max_refs: max_refs.max(1),
        }
    }

    pub fn frames(&self) -> &[DpbFrame] {
        &self.frames
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Stores a reference picture, evicting the oldest short-term one when full.
    pub fn push(&mut self, frame: DpbFrame) {
        if self.frames.len() >= self.max_refs {
            let oldest = self
                .frames
                .iter()
                .position(|f| !f.long_term)
                .unwrap_or(0);

            self.frames.remove(oldest);
        }

        self.frames.push(frame);
    }

    /// Default lists for a picture at `poc`: L0 starts with the preceding
    /// pictures, L1 with the following ones, each closest first.
    pub fn ref_lists(&self, poc: i32, num_l0: usize, num_l1: usize) -> RefLists {
        let mut before: Vec<i32> = self.short_term_pocs().filter(|p| *p < poc).collect();
        let mut after: Vec<i32> = self.short_term_pocs().filter(|p| *p > poc).collect();

        before.sort_unstable_by(|a, b| b.cmp(a));
        after.sort_unstable();

        let l0 = before.iter().chain(&after).copied().take(num_l0).collect();
        let l1 = after.iter().chain(&before).copied().take(num_l1).collect();

        RefLists { l0, l1 }
    }

    fn short_term_pocs(&self) -> impl Iterator<Item = i32> + '_ {
        self.frames.iter().filter(|f| !f.long_term).map(|f| f.poc)
    }
}
