use crate::bits::BitWriter;
use crate::error::{HeaderError, Result};
use crate::hevc::NalUnit;
use crate::utils::pack_rbsp;

/// Annex-B output of one access unit, bounded to `capacity` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl NalBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
        }
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Position to come back to with `bytes_since` or `truncate`.
    pub fn mark(&self) -> usize {
        self.data.len()
    }

    pub fn bytes_since(&self, mark: usize) -> &[u8] {
        self.data.get(mark..).unwrap_or_default()
    }

    pub fn truncate(&mut self, mark: usize) {
        self.data.truncate(mark);
    }

    /// Appends start code, NAL unit header and the escaped `rbsp`.
    /// Nothing is appended when the unit does not fit.
    pub fn push_nal(&mut self, nalu: &NalUnit, rbsp: &[u8]) -> Result<usize> {
        let mark = self.mark();

        let mut header = BitWriter::with_capacity(nalu.header_len());
        nalu.write(&mut header);
        let header = header.as_slice();

        let available = self.capacity.saturating_sub(mark);
        if header.len() > available {
            return Err(HeaderError::NotEnoughBuffer {
                needed: header.len() + rbsp.len(),
                available,
            });
        }

        self.data.extend_from_slice(header);

        match pack_rbsp(&mut self.data, rbsp, self.capacity) {
            Ok(written) => Ok(header.len() + written),
            Err(e) => {
                self.truncate(mark);
                Err(e)
            }
        }
    }
}
