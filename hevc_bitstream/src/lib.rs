/// Bit writer and reader with Exp-Golomb codes
pub mod bits;

/// CABAC arithmetic encoder and context initialization
pub mod cabac;

/// Decoded picture buffer bookkeeping and default reference lists
pub mod dpb;

pub mod error;

/// Parameter set, slice segment header and SEI syntax
pub mod hevc;

/// Access unit serialization, including all-skip slices
pub mod header_packer;

/// Annex-B scanning and parameter set parsing
pub mod header_reader;

/// Encoder settings, derived parameter sets and per picture tasks
pub mod params;

/// Short-term reference picture set optimization
pub mod rps;

/// Emulation prevention helpers
pub mod utils;

pub use error::{HeaderError, Result};
pub use header_packer::{HeaderPacker, SliceHeaderNal};
pub use params::{StreamSettings, Task, VideoParam};
