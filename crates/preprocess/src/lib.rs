//! Blob construction: turns RGB frames into batched, normalized NCHW tensors.

pub mod blob;
pub mod params;

pub use blob::{Blob, BlobBuilder};
pub use params::{BlobParams, ChannelOrder};
