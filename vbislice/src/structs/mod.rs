//! Data structures describing sampled VBI lines and the services they carry.
//!
//! Contains the sample formats, video standards, the table of known data
//! services with their signal parameters, sampling parameters and the
//! sliced records produced by the decoder.

pub mod pixel_format;
pub mod sampling;
pub mod service;
pub mod sliced;
pub mod videostd;
