//! Utility functions and supporting infrastructure.
//!
//! Provides sample access for every pixel format, payload bit packing,
//! payload checksums, error types and rendering of test signals.

pub mod bitstream_io;
pub mod crc;
pub mod errors;
pub(crate) mod sample;
pub mod synth;
