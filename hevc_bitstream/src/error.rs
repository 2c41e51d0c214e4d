use thiserror::Error;

use crate::bits::BitReadError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error("not enough buffer: {needed} bytes needed, {available} available")]
    NotEnoughBuffer { needed: usize, available: usize },
}

impl From<BitReadError> for HeaderError {
    fn from(err: BitReadError) -> Self {
        match err {
            BitReadError::EndOfBuffer => HeaderError::InvalidParam("unexpected end of buffer"),
            BitReadError::ExpGolombOverflow => {
                HeaderError::InvalidParam("Exp-Golomb code out of range")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HeaderError>;
