#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder for data services transmitted in the vertical blanking interval
//! of analog 525 and 625 line video, working on digitized VBI lines.
//!
//! ### Signal Organization
//!
//! **Clock Run-In**: An alternating bit pattern to synchronize on.
//! **Framing Code**: A fixed pattern identifying the service.
//! **Payload**: NRZ or biphase coded data bits.
//!
//! ### Services
//!
//! - Teletext System A, B, C and D
//! - Video Programming System
//! - Wide Screen Signalling, 625 line and CPR-1204
//! - Closed Caption, 525 and 625 line
//!
//! ### Line Scanning
//!
//! Lines are searched by a bit slicer per service. Each line remembers the
//! slicer which last matched it, and lines without data are only probed
//! every 16 field pairs.
//!
//! ## Quick Start
//!
//! Steps for decoding raw VBI:
//!
//! 1. Describe the sampled lines with [`structs::sampling::SamplingParams`]
//! 2. Request services from a [`process::raw_decoder::RawDecoder`]
//! 3. Decode each field pair into [`structs::sliced::Sliced`] records
//!
//! ```rust,no_run
//! use vbislice::process::raw_decoder::RawDecoder;
//! use vbislice::structs::sampling::{SamplingParams, Strictness};
//! use vbislice::structs::service::{Service, ServiceSet};
//! use vbislice::structs::sliced::Sliced;
//!
//! let sampling = SamplingParams::preset_625();
//! let mut decoder = RawDecoder::new(sampling.clone())?;
//!
//! // Request services, rejected ones are logged
//! let requested = ServiceSet::TELETEXT_B_625 | Service::Wss625;
//! let accepted = decoder.add_services(requested, Strictness::Reliable);
//! assert!(!accepted.is_empty());
//!
//! // One field pair of raw samples
//! let raw = vec![0u8; sampling.frame_size()];
//! let mut sliced = [Sliced::EMPTY; 64];
//!
//! let n = decoder.decode(&mut sliced, &raw)?;
//! for record in &sliced[..n] {
//!     println!("line {}: {}", record.line, record.id);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing functionality for sampled VBI lines.
///
/// 1. **Bit Slicing** ([`process::bit_slicer`]): Finds one service on one
///    line and recovers its payload.
///
/// 2. **Line Patterns** ([`process::pattern`]): Remembers which slicers to
///    try on each line.
///
/// 3. **Raw Decoding** ([`process::raw_decoder`]): Decodes whole field
///    pairs for a set of services.
pub mod process;

/// Data structures describing sampled lines and services.
///
/// - **Pixel Formats** ([`structs::pixel_format`]): Sample layouts
/// - **Video Standards** ([`structs::videostd`]): 525 and 625 line systems
/// - **Services** ([`structs::service`]): Signal parameters of each service
/// - **Sampling** ([`structs::sampling`]): Sampling parameters and service checks
/// - **Sliced Data** ([`structs::sliced`]): Decoder output records
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Payload bit packing
/// - **CRC Validation** ([`utils::crc`]): Payload checks
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **Synthesis** ([`utils::synth`]): Rendering sliced data into raw lines
pub mod utils;
