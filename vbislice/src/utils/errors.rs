use crate::structs::pixel_format::PixelFormat;
use crate::structs::videostd::VideoStandardSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlicerError {
    #[error("Sampling rate must not be zero")]
    ZeroSamplingRate,

    #[error("{what} rate {rate} Hz exceeds the sampling rate {sampling_rate} Hz")]
    RateTooHigh {
        what: &'static str,
        rate: u32,
        sampling_rate: u32,
    },

    #[error("{what} rate must not be zero")]
    ZeroRate { what: &'static str },

    #[error("{what} must not exceed 32 bits, got {bits}")]
    TooManyBits { what: &'static str, bits: u32 },

    #[error("Payload of {bits} bits exceeds the {max} byte sliced buffer")]
    PayloadTooLarge { bits: u32, max: usize },

    #[error(
        "{samples_per_line} samples per line too small for sample offset {sample_offset} + {cri_bits} CRI bits ({cri_samples} samples) + {data_bits} FRC and payload bits ({data_samples} samples)"
    )]
    SignalTooLong {
        samples_per_line: usize,
        sample_offset: usize,
        cri_bits: u32,
        cri_samples: usize,
        data_bits: u32,
        data_samples: usize,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("Output buffer too small: {available} bytes, payload needs {needed}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Sample row too short: {available} bytes, line needs {needed}")]
    RowTooShort { needed: usize, available: usize },

    #[error("Point buffer too small: {available} entries, slicer records up to {needed}")]
    PointsTooSmall { needed: usize, available: usize },

    #[error("Point recording is only available for yuv420, slicer is configured for {0}")]
    PointsUnsupported(PixelFormat),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    #[error("Unknown pixel format: {0}")]
    UnknownPixelFormat(String),

    #[error("Sampling rate must not be zero")]
    ZeroSamplingRate,

    #[error("Samples per line must not be zero")]
    ZeroSamplesPerLine,

    #[error("No lines to sample, both field counts are zero")]
    NoLines,

    #[error("Video standard set {0} is empty or mixes 525 and 625 line standards")]
    AmbiguousVideoStandard(VideoStandardSet),

    #[error("Field {field} lines {start}..{end} out of range for {scanning} line scanning")]
    FieldRange {
        field: usize,
        start: u32,
        end: u32,
        scanning: u32,
    },

    #[error("Interlaced sampling requires equal non-zero field counts, got {0} and {1}")]
    InterlacedCountMismatch(u32, u32),

    #[error("None of the requested services can be sampled")]
    NoServices,
}

/// Reasons a service cannot be decoded under some sampling parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PermitError {
    #[error("Service {service} requires video standard set {required}, have {have}")]
    WrongVideoStandard {
        service: &'static str,
        required: VideoStandardSet,
        have: VideoStandardSet,
    },

    #[error("Service {0} requires known line numbers")]
    UnknownLineNumbers(&'static str),

    #[error("Service {0} requires synchronous field order")]
    Unsynchronized(&'static str),

    #[error("Sampling rate {sampling_rate} Hz too low for service {service}, needs {required} Hz")]
    SamplingRateTooLow {
        service: &'static str,
        sampling_rate: u32,
        required: u32,
    },

    #[error("Service {service} signal length {signal_us:.2} us exceeds {sampling_us:.2} us sampling length")]
    SignalTooLong {
        service: &'static str,
        signal_us: f64,
        sampling_us: f64,
    },

    #[error("Sampling starts at 0H + {start_us:.2} us, too late for service {service} at {service_us:.2} us")]
    SamplingStartsTooLate {
        service: &'static str,
        start_us: f64,
        service_us: f64,
    },

    #[error("Sampling ends at 0H + {end_us:.2} us, too early for service {service} which ends at {service_us:.2} us")]
    SamplingEndsTooEarly {
        service: &'static str,
        end_us: f64,
        service_us: f64,
    },

    #[error("Service {service} requires data from field {field}")]
    MissingField { service: &'static str, field: usize },

    #[error("Service {service} requires lines {first}-{last}, have {start}-{end}")]
    LinesNotCovered {
        service: &'static str,
        first: u32,
        last: u32,
        start: u32,
        end: u32,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Raw buffer too small: {available} bytes, sampling needs {needed}")]
    RawTooShort { needed: usize, available: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown service name: {0}")]
pub struct ServiceParseError(pub String);

/// Why [`RawDecoder::add_service`](crate::process::raw_decoder::RawDecoder::add_service)
/// rejected a service.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Permit(#[from] PermitError),

    #[error("Cannot configure bit slicer for service {service}: {source}")]
    Slicer {
        service: &'static str,
        source: SlicerError,
    },

    #[error("No more jobs available, service {0} rejected")]
    TooManyJobs(&'static str),

    #[error("No free pattern slot on line {line} for service {service}")]
    LineFull { service: &'static str, line: usize },

    #[error("Out of memory for the line pattern, service {service} rejected: {source}")]
    OutOfMemory {
        service: &'static str,
        source: std::collections::TryReserveError,
    },
}

impl ServiceError {
    /// Severity to log the rejection at. Capacity problems are warnings,
    /// services which simply do not fit the sampling are informational.
    pub fn level(&self) -> log::Level {
        match self {
            ServiceError::TooManyJobs(_) | ServiceError::OutOfMemory { .. } => log::Level::Warn,
            _ => log::Level::Info,
        }
    }
}
