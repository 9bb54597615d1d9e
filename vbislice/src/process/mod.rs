/// Recovery of one data service from one sampled line.
///
/// Provides the [`BitSlicer`](bit_slicer::BitSlicer), configured through
/// [`SlicerParams`](bit_slicer::SlicerParams).
pub mod bit_slicer;

/// Per-line trial order of bit slicers.
pub mod pattern;

/// Decoding of whole field pairs.
///
/// Provides the [`RawDecoder`](raw_decoder::RawDecoder) which manages the
/// bit slicers of all requested services and writes
/// [`Sliced`](crate::structs::sliced::Sliced) records.
pub mod raw_decoder;
