use std::fmt::Display;

use log::info;

use crate::structs::pixel_format::PixelFormat;
use crate::structs::service::{SERVICE_TABLE, Service, ServiceParams, ServiceSet};
use crate::structs::videostd::VideoStandardSet;
use crate::utils::errors::{PermitError, SamplingError};

/// How sure the decoder must be that a service can be found in the
/// sampled lines before accepting it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strictness {
    /// Accept services even if the line numbers of the sampled lines are
    /// unknown.
    Loose = 0,
    /// Require known line numbers overlapping the lines of the service.
    #[default]
    Reliable = 1,
    /// Require the sampled lines to cover every line of the service.
    Strict = 2,
}

impl Strictness {
    /// Maps 0, 1, 2 to the levels above. Larger values are strict.
    pub const fn from_level(level: u32) -> Self {
        match level {
            0 => Self::Loose,
            1 => Self::Reliable,
            _ => Self::Strict,
        }
    }
}

impl Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

/// Describes how a raw VBI field pair was sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingParams {
    pub videostd_set: VideoStandardSet,
    pub pixel_format: PixelFormat,
    /// Samples per second.
    pub sampling_rate: u32,
    /// Samples from 0H to the first sample of a line, 0 if unknown.
    pub offset: u32,
    pub samples_per_line: u32,
    /// First ITU-R line of each field, 0 if unknown.
    pub start: [u32; 2],
    /// Number of lines of each field.
    pub count: [u32; 2],
    /// Lines of both fields alternate in the buffer, first field first.
    /// Otherwise all first field lines come first.
    pub interlaced: bool,
    /// Fields are delivered in temporal order, the first field of the
    /// buffer is always the first field of a frame.
    pub synchronous: bool,
}

const SAMPLING_HEADROOM: f64 = 1e-6;
const OFFSET_MARGIN: f64 = 0.5e-6;

impl SamplingParams {
    /// 625/50 sampling at 27 MHz covering Teletext, VPS, WSS and captions.
    pub fn preset_625() -> Self {
        Self {
            videostd_set: VideoStandardSet::SET_625_50,
            pixel_format: PixelFormat::Yuv420,
            sampling_rate: 27_000_000,
            offset: 256,
            samples_per_line: 1440,
            start: [6, 318],
            count: [18, 18],
            interlaced: false,
            synchronous: true,
        }
    }

    /// 525/60 sampling at 27 MHz covering Teletext, captions and CPR-1204.
    pub fn preset_525() -> Self {
        Self {
            videostd_set: VideoStandardSet::SET_525_60,
            pixel_format: PixelFormat::Yuv420,
            sampling_rate: 27_000_000,
            offset: 256,
            samples_per_line: 1440,
            start: [10, 272],
            count: [12, 13],
            interlaced: false,
            synchronous: true,
        }
    }

    pub fn bytes_per_line(&self) -> usize {
        self.samples_per_line as usize * self.pixel_format.bytes_per_sample()
    }

    /// Lines of both fields.
    pub fn total_lines(&self) -> usize {
        (self.count[0] + self.count[1]) as usize
    }

    /// Size of one field pair in bytes.
    pub fn frame_size(&self) -> usize {
        self.bytes_per_line() * self.total_lines()
    }

    /// Number of lines per frame of the video standard.
    pub fn scanning(&self) -> Option<u32> {
        self.videostd_set.scanning()
    }

    /// Index of the buffer row holding line `index` of `field`.
    pub fn row(&self, field: usize, index: usize) -> usize {
        if self.interlaced {
            index * 2 + field
        } else {
            field * self.count[0] as usize + index
        }
    }

    /// ITU-R line number of line `index` of `field`, 0 if unknown.
    pub fn line_number(&self, field: usize, index: usize) -> u32 {
        if self.synchronous && self.start[field] > 0 {
            self.start[field] + index as u32
        } else {
            0
        }
    }

    /// Checks the parameters are self-consistent.
    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.sampling_rate == 0 {
            return Err(SamplingError::ZeroSamplingRate);
        }

        if self.samples_per_line == 0 {
            return Err(SamplingError::ZeroSamplesPerLine);
        }

        if self.count[0] == 0 && self.count[1] == 0 {
            return Err(SamplingError::NoLines);
        }

        let scanning = self
            .scanning()
            .ok_or(SamplingError::AmbiguousVideoStandard(self.videostd_set))?;

        let field_lines: [(u32, u32); 2] = match scanning {
            525 => [(1, 262), (263, 525)],
            _ => [(1, 311), (312, 625)],
        };

        for (field, (min, max)) in field_lines.into_iter().enumerate() {
            let (start, count) = (self.start[field], self.count[field]);
            if start == 0 || count == 0 {
                continue;
            }

            let end = start + count - 1;
            if start < min || end > max {
                return Err(SamplingError::FieldRange {
                    field,
                    start,
                    end,
                    scanning,
                });
            }
        }

        if self.interlaced && (self.count[0] != self.count[1] || self.count[0] == 0) {
            return Err(SamplingError::InterlacedCountMismatch(
                self.count[0],
                self.count[1],
            ));
        }

        Ok(())
    }

    /// Decides whether `par` can be decoded from lines sampled with these
    /// parameters.
    pub fn permit_service(
        &self,
        par: &ServiceParams,
        strictness: Strictness,
    ) -> Result<(), PermitError> {
        let service = par.label;

        if !par.videostd_set.intersects(self.videostd_set) {
            return Err(PermitError::WrongVideoStandard {
                service,
                required: par.videostd_set,
                have: self.videostd_set,
            });
        }

        if par.needs_line_numbers() {
            let unknown = (0..2).any(|field| par.on_field(field) && self.start[field] == 0);
            if unknown {
                return Err(PermitError::UnknownLineNumbers(service));
            }
        }

        // WSS 625 transmits elements at a third of the clock run-in rate, so
        // sampling at the run-in rate suffices. Others want 1.5 x headroom.
        let max_rate = par.cri_rate.max(par.bit_rate);
        let required = if par.service == Service::Wss625 {
            max_rate
        } else {
            max_rate + (max_rate >> 1)
        };
        if required > self.sampling_rate {
            return Err(PermitError::SamplingRateTooLow {
                service,
                sampling_rate: self.sampling_rate,
                required,
            });
        }

        let signal = par.signal_duration();
        let rate = self.sampling_rate as f64;
        let mut sampling = self.samples_per_line as f64 / rate;
        if strictness > Strictness::Loose {
            sampling -= SAMPLING_HEADROOM;
        }
        if sampling < signal {
            return Err(PermitError::SignalTooLong {
                service,
                signal_us: signal * 1e6,
                sampling_us: sampling * 1e6,
            });
        }

        if self.offset > 0 && strictness > Strictness::Loose {
            let start = self.offset as f64 / rate;
            let end = (self.offset + self.samples_per_line) as f64 / rate;
            let service_start = par.offset as f64 * 1e-9;
            let service_end = service_start + signal;

            if start > service_start - OFFSET_MARGIN {
                return Err(PermitError::SamplingStartsTooLate {
                    service,
                    start_us: start * 1e6,
                    service_us: service_start * 1e6,
                });
            }

            if end < service_end + OFFSET_MARGIN {
                return Err(PermitError::SamplingEndsTooEarly {
                    service,
                    end_us: end * 1e6,
                    service_us: service_end * 1e6,
                });
            }
        }

        if (par.needs_field_parity() || par.needs_line_numbers()) && !self.synchronous {
            return Err(PermitError::Unsynchronized(service));
        }

        for field in 0..2 {
            if !par.on_field(field) {
                continue;
            }

            if self.count[field] == 0 {
                return Err(PermitError::MissingField { service, field });
            }

            let start = self.start[field];
            if start == 0 {
                if strictness > Strictness::Loose {
                    return Err(PermitError::UnknownLineNumbers(service));
                }
                continue;
            }

            let end = start + self.count[field] - 1;
            let (first, last) = (par.first[field], par.last[field]);
            let covered = match strictness {
                Strictness::Loose => true,
                Strictness::Reliable => first <= end && last >= start,
                Strictness::Strict => first >= start && last <= end,
            };

            if !covered {
                return Err(PermitError::LinesNotCovered {
                    service,
                    first,
                    last,
                    start,
                    end,
                });
            }
        }

        Ok(())
    }

    /// The subset of `services` which can be decoded, reasons for rejection
    /// are logged.
    pub fn check_services(&self, services: ServiceSet, strictness: Strictness) -> ServiceSet {
        services
            .iter()
            .filter(|service| match self.permit_service(service.params(), strictness) {
                Ok(()) => true,
                Err(err) => {
                    info!("{err}");
                    false
                }
            })
            .collect()
    }

    /// Sampling parameters able to capture `services`.
    ///
    /// Services of the other scanning than `videostd_req` are dropped. With
    /// an empty request the scanning of the first service in table order
    /// wins. Returns the parameters, the services they cover and the
    /// highest data rate among them.
    pub fn from_services(
        services: ServiceSet,
        videostd_req: VideoStandardSet,
    ) -> Result<(SamplingParams, ServiceSet, u32), SamplingError> {
        let mut scanning_set = if videostd_req.is_empty() {
            VideoStandardSet::EMPTY
        } else {
            let scanning = videostd_req
                .scanning()
                .ok_or(SamplingError::AmbiguousVideoStandard(videostd_req))?;
            VideoStandardSet::from_scanning(scanning)
        };

        let mut videostd_set = VideoStandardSet::EMPTY;
        let mut covered = ServiceSet::EMPTY;
        let mut max_rate = 0;
        let mut start_ns = u32::MAX;
        let mut end_s: f64 = 0.0;
        let mut first = [u32::MAX; 2];
        let mut last = [0u32; 2];

        for par in SERVICE_TABLE.iter().filter(|par| services.contains(par.service)) {
            if scanning_set.is_empty() {
                if let Some(scanning) = par.videostd_set.scanning() {
                    scanning_set = VideoStandardSet::from_scanning(scanning);
                }
            }

            let wanted = if videostd_req.is_empty() {
                par.videostd_set & scanning_set
            } else {
                par.videostd_set & videostd_req
            };
            if wanted.is_empty() {
                info!("Service {} does not match video standard set {scanning_set}", par.label);
                continue;
            }

            videostd_set |= wanted;
            covered.insert(par.service);
            max_rate = max_rate.max(par.cri_rate).max(par.bit_rate);
            start_ns = start_ns.min(par.offset);
            end_s = end_s.max(par.offset as f64 * 1e-9 + par.signal_duration());

            for field in 0..2 {
                if par.on_field(field) {
                    first[field] = first[field].min(par.first[field]);
                    last[field] = last[field].max(par.last[field]);
                }
            }
        }

        if covered.is_empty() {
            return Err(SamplingError::NoServices);
        }

        let sampling_rate = 27_000_000u32;
        let rate = sampling_rate as f64;
        let start_s = (start_ns as f64 * 1e-9 - SAMPLING_HEADROOM).max(0.0);
        let offset = (start_s * rate).floor() as u32;
        let needed = ((end_s - offset as f64 / rate + SAMPLING_HEADROOM) * rate).ceil() as u32;

        let mut sampling = SamplingParams {
            videostd_set,
            pixel_format: PixelFormat::Yuv420,
            sampling_rate,
            offset,
            samples_per_line: needed.max(1440),
            start: [0; 2],
            count: [0; 2],
            interlaced: false,
            synchronous: true,
        };

        for field in 0..2 {
            if last[field] > 0 {
                sampling.start[field] = first[field];
                sampling.count[field] = last[field] - first[field] + 1;
            }
        }

        Ok((sampling, covered, max_rate))
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::preset_625()
    }
}
