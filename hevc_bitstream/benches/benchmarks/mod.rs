pub mod packing;
pub mod skip_slice;
