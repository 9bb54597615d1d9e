use log::warn;

use crate::structs::pixel_format::{PixelFormat, SampleLayout};
use crate::structs::sampling::{SamplingParams, Strictness};
use crate::structs::service::{Modulation, ServiceParams, low_mask};
use crate::structs::sliced::SLICED_DATA_SIZE;
use crate::utils::errors::{SliceError, SlicerError};
use crate::utils::sample::{SampleReader, SampleVisitor, dispatch};

/// Lead-in before the expected clock run-in when the sampling offset is
/// known.
const CRI_LEAD: f64 = 1e-6;

/// Slack after the expected end of the clock run-in.
const CRI_TRAIL: f64 = 1e-6;

/// Everything [`BitSlicer::configure`] needs to know about a line and the
/// signal to find on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicerParams {
    pub pixel_format: PixelFormat,
    pub sampling_rate: u32,
    /// First sample to examine.
    pub sample_offset: usize,
    pub samples_per_line: usize,
    /// Clock run-in pattern and mask, last transmitted bit in bit 0.
    pub cri: u32,
    pub cri_mask: u32,
    pub cri_bits: u32,
    pub cri_rate: u32,
    /// Stop searching for the clock run-in at this sample.
    pub cri_end: usize,
    /// Framing code, last transmitted bit in bit 0.
    pub frc: u32,
    pub frc_bits: u32,
    pub payload_bits: u32,
    pub payload_rate: u32,
    pub modulation: Modulation,
}

impl SlicerParams {
    /// Parameters to find `par` on lines sampled as `sampling`.
    ///
    /// The clock run-in search is narrowed to the expected position when
    /// the sampling offset is known and `strictness` is above loose.
    pub fn for_service(par: &ServiceParams, sampling: &SamplingParams, strictness: Strictness) -> Self {
        let samples_per_line = sampling.samples_per_line as usize;
        let rate = sampling.sampling_rate as f64;

        let (sample_offset, cri_end) = if sampling.offset > 0 && strictness > Strictness::Loose {
            let start = par.offset as f64 * 1e-9 - sampling.offset as f64 / rate;
            let cri_length = par.cri_bits as f64 / par.cri_rate as f64;
            let first = ((start - CRI_LEAD) * rate).floor().max(0.0) as usize;
            let end = ((start + cri_length + CRI_TRAIL) * rate).ceil().max(0.0) as usize;
            (first, end.min(samples_per_line))
        } else {
            (0, samples_per_line)
        };

        Self {
            pixel_format: sampling.pixel_format,
            sampling_rate: sampling.sampling_rate,
            sample_offset,
            samples_per_line,
            cri: par.cri(),
            cri_mask: par.cri_mask(),
            cri_bits: par.cri_bits,
            cri_rate: par.cri_rate,
            cri_end,
            frc: par.frc(),
            frc_bits: par.frc_bits,
            payload_bits: par.payload,
            payload_rate: par.bit_rate,
            modulation: par.modulation,
        }
    }
}

/// Which part of the transmission a [`BitSlicerPoint`] belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointKind {
    #[default]
    Cri,
    Frc,
    Payload,
}

/// One bit decision of the slicer, for visualisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitSlicerPoint {
    pub kind: PointKind,
    /// Position in the line in 1/256 samples.
    pub index: u32,
    /// Signal level, times 256.
    pub level: i32,
    /// Threshold the level was compared against, times 256.
    pub thresh: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packing {
    OctetLsb,
    OctetMsb,
    BitwiseLsb,
    BitwiseMsb,
}

#[derive(Debug, Clone)]
struct Config {
    pixel_format: PixelFormat,
    layout: SampleLayout,
    samples_per_line: usize,
    sample_offset: usize,
    cri_end: usize,
    cri: u32,
    cri_mask: u32,
    cri_bits: u32,
    frc: u32,
    frc_bits: u32,
    payload_bits: u32,
    payload_bytes: usize,
    packing: Packing,
    cri_rate: u64,
    oversampling_rate: u64,
    /// From the center of the last clock run-in bit to the sampling point
    /// of the first framing code bit, in 1/256 samples.
    phase_shift: u32,
    /// Framing code and payload bit period in 1/256 samples.
    step: u32,
}

impl Config {
    fn new(params: &SlicerParams) -> Result<Self, SlicerError> {
        let sampling_rate = params.sampling_rate;
        if sampling_rate == 0 {
            return Err(SlicerError::ZeroSamplingRate);
        }

        for (what, rate) in [("CRI", params.cri_rate), ("Payload", params.payload_rate)] {
            if rate == 0 {
                return Err(SlicerError::ZeroRate { what });
            }
            if rate > sampling_rate {
                return Err(SlicerError::RateTooHigh {
                    what,
                    rate,
                    sampling_rate,
                });
            }
        }

        for (what, bits) in [("CRI", params.cri_bits), ("FRC", params.frc_bits)] {
            if bits > 32 {
                return Err(SlicerError::TooManyBits { what, bits });
            }
        }

        let payload_bytes = params.payload_bits.div_ceil(8) as usize;
        if payload_bytes > SLICED_DATA_SIZE {
            return Err(SlicerError::PayloadTooLarge {
                bits: params.payload_bits,
                max: SLICED_DATA_SIZE,
            });
        }

        let rate = sampling_rate as u64;
        let cri_samples = (rate * params.cri_bits as u64 / params.cri_rate as u64) as usize;
        let data_bits = params.frc_bits + params.payload_bits;
        let data_samples = (rate * data_bits as u64 / params.payload_rate as u64) as usize;
        let samples_per_line = params.samples_per_line;

        if params.sample_offset > samples_per_line
            || cri_samples + data_samples > samples_per_line - params.sample_offset
        {
            return Err(SlicerError::SignalTooLong {
                samples_per_line,
                sample_offset: params.sample_offset,
                cri_bits: params.cri_bits,
                cri_samples,
                data_bits,
                data_samples,
            });
        }

        // Stop where framing code and payload cannot fit anymore, so the
        // search loop needs no bounds check.
        let cri_end = params
            .cri_end
            .min(samples_per_line - data_samples)
            .min(samples_per_line.saturating_sub(1));

        let layout = params.pixel_format.layout();
        let samples_per_cri_bit = sampling_rate as f64 * 256.0 / params.cri_rate as f64;
        let samples_per_bit = sampling_rate as f64 * 256.0 / params.payload_rate as f64;
        let phase_shift = if params.modulation.is_biphase() {
            samples_per_cri_bit * 0.5 + samples_per_bit * 0.25
        } else {
            samples_per_cri_bit * 0.5 + samples_per_bit * 0.5
        };

        let packing = match (params.payload_bits % 8 == 0, params.modulation.is_msb_first()) {
            (true, false) => Packing::OctetLsb,
            (true, true) => Packing::OctetMsb,
            (false, false) => Packing::BitwiseLsb,
            (false, true) => Packing::BitwiseMsb,
        };

        let cri_mask = params.cri_mask & low_mask(params.cri_bits);

        Ok(Self {
            pixel_format: params.pixel_format,
            layout,
            samples_per_line,
            sample_offset: params.sample_offset,
            cri_end,
            cri: params.cri & cri_mask,
            cri_mask,
            cri_bits: params.cri_bits,
            frc: params.frc & low_mask(params.frc_bits),
            frc_bits: params.frc_bits,
            payload_bits: params.payload_bits,
            payload_bytes,
            packing,
            cri_rate: params.cri_rate as u64,
            oversampling_rate: rate * layout.oversampling as u64,
            phase_shift: phase_shift.round() as u32,
            step: samples_per_bit.round() as u32,
        })
    }

    fn max_points(&self) -> usize {
        (self.cri_bits + self.frc_bits + self.payload_bits) as usize
    }
}

/// Demodulates one data service from single scan lines.
///
/// The slicer tracks the DC level of its source with a decision feedback
/// threshold which persists between calls. Use one slicer per physical
/// source.
#[derive(Debug, Clone, Default)]
pub struct BitSlicer {
    config: Option<Config>,
    thresh: i32,
    warned: bool,
}

impl BitSlicer {
    pub fn new(params: &SlicerParams) -> Result<Self, SlicerError> {
        let mut slicer = Self::default();
        slicer.configure(params)?;
        Ok(slicer)
    }

    /// Prepares the slicer for a new service. On failure the slicer is left
    /// unconfigured and never matches.
    pub fn configure(&mut self, params: &SlicerParams) -> Result<(), SlicerError> {
        self.config = None;
        self.warned = false;

        let config = Config::new(params)?;
        self.thresh = config.layout.thresh;
        self.config = Some(config);

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Bytes [`slice`](Self::slice) writes on success.
    pub fn payload_bytes(&self) -> usize {
        self.config.as_ref().map_or(0, |config| config.payload_bytes)
    }

    /// Current slicing level in sample units.
    pub fn threshold(&self) -> i32 {
        self.config
            .as_ref()
            .map_or(0, |config| self.thresh >> config.layout.thresh_frac)
    }

    /// Searches `raw` for the configured signal and decodes its payload
    /// into `buffer`.
    ///
    /// Returns `Ok(false)` when the line does not carry the signal. The
    /// threshold is only kept if the line matched.
    pub fn slice(&mut self, buffer: &mut [u8], raw: &[u8]) -> Result<bool, SliceError> {
        let Self {
            config,
            thresh,
            warned,
        } = self;

        let Some(config) = config.as_ref() else {
            warn_unconfigured(warned);
            return Ok(false);
        };

        check_buffers(config, buffer, raw)?;

        let saved = *thresh;
        let found = dispatch(
            &config.layout,
            SliceLine {
                config,
                thresh,
                buffer,
                raw,
                points: &mut NoPoints,
            },
        );

        if !found {
            *thresh = saved;
        }

        Ok(found)
    }

    /// Like [`slice`](Self::slice), additionally recording every bit
    /// decision of the matched transmission into `points`.
    ///
    /// Returns the number of points recorded, or `None` if the line did not
    /// match. Only available for [`PixelFormat::Yuv420`].
    pub fn slice_with_points(
        &mut self,
        buffer: &mut [u8],
        points: &mut [BitSlicerPoint],
        raw: &[u8],
    ) -> Result<Option<usize>, SliceError> {
        let Self {
            config,
            thresh,
            warned,
        } = self;

        let Some(config) = config.as_ref() else {
            warn_unconfigured(warned);
            return Ok(None);
        };

        if config.pixel_format != PixelFormat::Yuv420 {
            return Err(SliceError::PointsUnsupported(config.pixel_format));
        }

        if points.len() < config.max_points() {
            return Err(SliceError::PointsTooSmall {
                needed: config.max_points(),
                available: points.len(),
            });
        }

        check_buffers(config, buffer, raw)?;

        let saved = *thresh;
        let mut recorder = PointRecorder::new(points);
        let found = dispatch(
            &config.layout,
            SliceLine {
                config,
                thresh,
                buffer,
                raw,
                points: &mut recorder,
            },
        );

        if found {
            Ok(Some(recorder.len))
        } else {
            *thresh = saved;
            Ok(None)
        }
    }
}

fn warn_unconfigured(warned: &mut bool) {
    if !*warned {
        warn!("Bit slicer is not configured, no line will match");
        *warned = true;
    }
}

fn check_buffers(config: &Config, buffer: &[u8], raw: &[u8]) -> Result<(), SliceError> {
    if buffer.len() < config.payload_bytes {
        return Err(SliceError::BufferTooSmall {
            needed: config.payload_bytes,
            available: buffer.len(),
        });
    }

    let row = config.samples_per_line * config.layout.bytes_per_sample;
    if raw.len() < row {
        return Err(SliceError::RowTooShort {
            needed: row,
            available: raw.len(),
        });
    }

    Ok(())
}

trait PointSink {
    fn cri_bit(&mut self, point: BitSlicerPoint);
    fn cri_matched(&mut self, cri_bits: u32);
    fn data_bit(&mut self, point: BitSlicerPoint);
}

struct NoPoints;

impl PointSink for NoPoints {
    #[inline(always)]
    fn cri_bit(&mut self, _: BitSlicerPoint) {}

    #[inline(always)]
    fn cri_matched(&mut self, _: u32) {}

    #[inline(always)]
    fn data_bit(&mut self, _: BitSlicerPoint) {}
}

/// Keeps the most recent clock run-in decisions in a ring until the
/// run-in matches, then appends framing code and payload decisions.
struct PointRecorder<'a> {
    out: &'a mut [BitSlicerPoint],
    ring: [BitSlicerPoint; 32],
    seen: usize,
    len: usize,
}

impl<'a> PointRecorder<'a> {
    fn new(out: &'a mut [BitSlicerPoint]) -> Self {
        Self {
            out,
            ring: [BitSlicerPoint::default(); 32],
            seen: 0,
            len: 0,
        }
    }
}

impl PointSink for PointRecorder<'_> {
    fn cri_bit(&mut self, point: BitSlicerPoint) {
        self.ring[self.seen % 32] = point;
        self.seen += 1;
    }

    fn cri_matched(&mut self, cri_bits: u32) {
        let count = (cri_bits as usize).min(self.seen);
        for i in 0..count {
            self.out[i] = self.ring[(self.seen - count + i) % 32];
        }
        self.len = count;
    }

    fn data_bit(&mut self, point: BitSlicerPoint) {
        if let Some(slot) = self.out.get_mut(self.len) {
            *slot = point;
            self.len += 1;
        }
    }
}

struct SliceLine<'a, P: PointSink> {
    config: &'a Config,
    thresh: &'a mut i32,
    buffer: &'a mut [u8],
    raw: &'a [u8],
    points: &'a mut P,
}

impl<P: PointSink> SampleVisitor for SliceLine<'_, P> {
    type Output = bool;

    fn visit<R: SampleReader>(self, reader: R) -> bool {
        let cfg = self.config;
        let raw = self.raw;
        let os = cfg.layout.oversampling as i32;
        let frac = cfg.layout.thresh_frac;

        let mut cl: u64 = 0;
        let mut c: u32 = 0;
        let mut b1 = false;

        for index in cfg.sample_offset..cfg.cri_end {
            let tr = *self.thresh >> frac;
            let raw0 = reader.read(raw, index);
            let delta = reader.read(raw, index + 1) - raw0;
            *self.thresh += (raw0 - tr) * delta.abs();

            let mut t = raw0 * os;
            for k in 0..os {
                let b = (t + os / 2) / os >= tr;

                if b != b1 {
                    cl = cfg.oversampling_rate >> 1;
                } else {
                    cl += cfg.cri_rate;
                    if cl >= cfg.oversampling_rate {
                        cl -= cfg.oversampling_rate;
                        c = (c << 1) | b as u32;

                        let position = (index as u32) * 256 + (k * 256 / os) as u32;
                        self.points.cri_bit(BitSlicerPoint {
                            kind: PointKind::Cri,
                            index: position,
                            level: t * 256 / os,
                            thresh: tr * 256,
                        });

                        if c & cfg.cri_mask == cfg.cri {
                            self.points.cri_matched(cfg.cri_bits);
                            return decode_data(cfg, tr, position, self.buffer, raw, self.points, reader);
                        }
                    }
                }

                b1 = b;
                t += delta;
            }
        }

        false
    }
}

/// Samples framing code and payload at the payload rate, starting from the
/// center of the last clock run-in bit at `position`.
fn decode_data<R: SampleReader, P: PointSink>(
    cfg: &Config,
    tr: i32,
    position: u32,
    buffer: &mut [u8],
    raw: &[u8],
    points: &mut P,
    reader: R,
) -> bool {
    let tr = tr * 256;
    let first = position + cfg.phase_shift;

    let data_bits = cfg.frc_bits + cfg.payload_bits;
    if data_bits > 0 {
        let last = ((first + (data_bits - 1) * cfg.step) >> 8) as usize;
        if last + 1 >= cfg.samples_per_line {
            return false;
        }
    }

    let mut i = first;
    let mut next_bit = |kind: PointKind| -> bool {
        let index = (i >> 8) as usize;
        let fraction = (i & 255) as i32;
        let raw0 = reader.read(raw, index);
        let raw1 = reader.read(raw, index + 1);
        let level = raw0 * 256 + (raw1 - raw0) * fraction;

        points.data_bit(BitSlicerPoint {
            kind,
            index: i,
            level,
            thresh: tr,
        });

        i += cfg.step;
        level >= tr
    };

    let mut c: u32 = 0;
    for _ in 0..cfg.frc_bits {
        c = (c << 1) | next_bit(PointKind::Frc) as u32;
    }
    if c != cfg.frc {
        return false;
    }

    let payload = cfg.payload_bits as usize;
    match cfg.packing {
        Packing::OctetLsb => {
            for byte in &mut buffer[..cfg.payload_bytes] {
                let mut c = 0u8;
                for k in 0..8 {
                    c |= (next_bit(PointKind::Payload) as u8) << k;
                }
                *byte = c;
            }
        }
        Packing::OctetMsb => {
            for byte in &mut buffer[..cfg.payload_bytes] {
                let mut c = 0u8;
                for _ in 0..8 {
                    c = (c << 1) | next_bit(PointKind::Payload) as u8;
                }
                *byte = c;
            }
        }
        Packing::BitwiseLsb => {
            let mut c = 0u32;
            for j in 0..payload {
                c = (c >> 1) | ((next_bit(PointKind::Payload) as u32) << 7);
                if j & 7 == 7 {
                    buffer[j >> 3] = c as u8;
                }
            }
            buffer[payload >> 3] = (c >> (8 - (payload & 7))) as u8;
        }
        Packing::BitwiseMsb => {
            let mut c = 0u32;
            for j in 0..payload {
                c = (c << 1) | next_bit(PointKind::Payload) as u32;
                if j & 7 == 7 {
                    buffer[j >> 3] = c as u8;
                }
            }
            buffer[payload >> 3] = (c & low_mask((payload & 7) as u32)) as u8;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::service::Service;
    use crate::utils::synth::render_line;

    const BLANK: u8 = 40;
    const WHITE: u8 = 200;

    fn line_for(
        sampling: &SamplingParams,
        service: Service,
        payload: &[u8],
    ) -> anyhow::Result<Vec<u8>> {
        let mut row = vec![0u8; sampling.bytes_per_line()];
        for index in 0..sampling.samples_per_line as usize {
            crate::utils::sample::write_sample(&sampling.pixel_format.layout(), &mut row, index, BLANK);
        }
        render_line(&mut row, sampling, service.params(), payload, BLANK, WHITE)?;
        Ok(row)
    }

    fn test_payload(service: Service) -> Vec<u8> {
        let par = service.params();
        let mut payload: Vec<u8> = (0..par.payload_bytes())
            .map(|i| (i as u8).wrapping_mul(37).wrapping_add(0x5A))
            .collect();
        if par.payload % 8 != 0 {
            let last = payload.len() - 1;
            payload[last] &= low_mask(par.payload % 8) as u8;
        }
        payload
    }

    #[test]
    fn teletext_b_at_27_mhz() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let packet: Vec<u8> = (0..42u8).map(|i| i.wrapping_mul(71) ^ 0xA5).collect();
        let row = line_for(&sampling, Service::TeletextBL25_625, &packet)?;

        let params = SlicerParams::for_service(
            Service::TeletextBL25_625.params(),
            &sampling,
            Strictness::Reliable,
        );
        let mut slicer = BitSlicer::new(&params)?;
        let mut buffer = [0u8; SLICED_DATA_SIZE];

        assert!(slicer.slice(&mut buffer, &row)?);
        assert_eq!(&buffer[..42], &packet[..]);
        Ok(())
    }

    #[test]
    fn round_trip_every_service() -> anyhow::Result<()> {
        for service in Service::ALL {
            let par = service.params();
            let (sampling, _, _) =
                SamplingParams::from_services(service.into(), Default::default())?;
            let payload = test_payload(service);
            let row = line_for(&sampling, service, &payload)?;

            for strictness in [Strictness::Loose, Strictness::Strict] {
                let params = SlicerParams::for_service(par, &sampling, strictness);
                let mut slicer = BitSlicer::new(&params)?;
                let mut buffer = [0u8; SLICED_DATA_SIZE];

                assert!(slicer.slice(&mut buffer, &row)?, "{service} {strictness}");
                assert_eq!(&buffer[..payload.len()], &payload[..], "{service} {strictness}");
            }
        }
        Ok(())
    }

    #[test]
    fn round_trip_every_pixel_format() -> anyhow::Result<()> {
        for format in PixelFormat::ALL {
            let mut sampling = SamplingParams::preset_625();
            sampling.pixel_format = format;

            for service in [Service::TeletextBL25_625, Service::Wss625, Service::Vps] {
                let payload = test_payload(service);
                let row = line_for(&sampling, service, &payload)?;
                let params =
                    SlicerParams::for_service(service.params(), &sampling, Strictness::Reliable);
                let mut slicer = BitSlicer::new(&params)?;
                let mut buffer = [0u8; SLICED_DATA_SIZE];

                assert!(slicer.slice(&mut buffer, &row)?, "{format} {service}");
                assert_eq!(&buffer[..payload.len()], &payload[..], "{format} {service}");
            }
        }
        Ok(())
    }

    #[test]
    fn constant_line_never_matches() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let params =
            SlicerParams::for_service(Service::TeletextBL25_625.params(), &sampling, Strictness::Loose);
        let mut slicer = BitSlicer::new(&params)?;
        let threshold = slicer.threshold();
        let mut buffer = [0u8; SLICED_DATA_SIZE];

        for level in [0u8, 105, 128, 255] {
            let row = vec![level; sampling.bytes_per_line()];
            assert!(!slicer.slice(&mut buffer, &row)?);
        }
        assert_eq!(slicer.threshold(), threshold);
        assert_eq!(buffer, [0u8; SLICED_DATA_SIZE]);
        Ok(())
    }

    #[test]
    fn wrong_framing_code() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let row = line_for(&sampling, Service::TeletextBL25_625, &[0x55; 42])?;

        // Same run-in, different framing code.
        let mut params = SlicerParams::for_service(
            Service::TeletextBL25_625.params(),
            &sampling,
            Strictness::Reliable,
        );
        params.frc = 0x27;
        let mut slicer = BitSlicer::new(&params)?;
        let mut buffer = [0u8; SLICED_DATA_SIZE];
        assert!(!slicer.slice(&mut buffer, &row)?);
        Ok(())
    }

    #[test]
    fn configure_rejects_impossible_signals() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let base = SlicerParams::for_service(
            Service::TeletextBL25_625.params(),
            &sampling,
            Strictness::Loose,
        );

        let mut params = base.clone();
        params.cri_rate = 30_000_000;
        assert!(matches!(
            BitSlicer::new(&params),
            Err(SlicerError::RateTooHigh { what: "CRI", .. })
        ));

        let mut params = base.clone();
        params.frc_bits = 33;
        assert!(matches!(
            BitSlicer::new(&params),
            Err(SlicerError::TooManyBits { what: "FRC", .. })
        ));

        let mut params = base.clone();
        params.payload_bits = 57 * 8;
        assert!(matches!(
            BitSlicer::new(&params),
            Err(SlicerError::PayloadTooLarge { .. })
        ));

        let mut params = base.clone();
        params.sample_offset = 100;
        params.samples_per_line = 1450;
        assert!(matches!(
            BitSlicer::new(&params),
            Err(SlicerError::SignalTooLong { .. })
        ));

        // A failed configure leaves nothing behind.
        let mut slicer = BitSlicer::new(&base)?;
        assert!(slicer.configure(&params).is_err());
        assert!(!slicer.is_configured());
        let mut buffer = [0u8; SLICED_DATA_SIZE];
        let row = vec![0u8; sampling.bytes_per_line()];
        assert_eq!(slicer.slice(&mut buffer, &row), Ok(false));
        Ok(())
    }

    #[test]
    fn buffer_and_row_preconditions() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let params =
            SlicerParams::for_service(Service::TeletextBL25_625.params(), &sampling, Strictness::Loose);
        let mut slicer = BitSlicer::new(&params)?;
        let row = vec![0u8; sampling.bytes_per_line()];

        let mut small = [0xEEu8; 41];
        assert_eq!(
            slicer.slice(&mut small, &row),
            Err(SliceError::BufferTooSmall {
                needed: 42,
                available: 41
            })
        );
        assert!(small.iter().all(|&b| b == 0xEE));

        let mut buffer = [0u8; 42];
        assert!(matches!(
            slicer.slice(&mut buffer, &row[..100]),
            Err(SliceError::RowTooShort { .. })
        ));
        Ok(())
    }

    #[test]
    fn points_cover_the_transmission() -> anyhow::Result<()> {
        let sampling = SamplingParams::preset_625();
        let service = Service::Caption625F1;
        let row = line_for(&sampling, service, &[0x8F, 0x20])?;
        let params = SlicerParams::for_service(service.params(), &sampling, Strictness::Reliable);
        let mut slicer = BitSlicer::new(&params)?;

        let mut buffer = [0u8; SLICED_DATA_SIZE];
        let mut points = [BitSlicerPoint::default(); 14 + 2 + 16];
        let count = slicer.slice_with_points(&mut buffer, &mut points, &row)?;

        assert_eq!(count, Some(32));
        assert_eq!(&buffer[..2], &[0x8F, 0x20]);
        assert!(points[..14].iter().all(|p| p.kind == PointKind::Cri));
        assert!(points[14..16].iter().all(|p| p.kind == PointKind::Frc));
        assert!(points[16..].iter().all(|p| p.kind == PointKind::Payload));
        assert!(points.windows(2).all(|w| w[0].index < w[1].index));

        let mut sampling = sampling;
        sampling.pixel_format = PixelFormat::Yuyv;
        let params = SlicerParams::for_service(service.params(), &sampling, Strictness::Reliable);
        let mut slicer = BitSlicer::new(&params)?;
        let row = vec![0u8; sampling.bytes_per_line()];
        assert_eq!(
            slicer.slice_with_points(&mut buffer, &mut points, &row),
            Err(SliceError::PointsUnsupported(PixelFormat::Yuyv))
        );
        Ok(())
    }

    #[test]
    fn unconfigured_slicer_never_matches() {
        let mut slicer = BitSlicer::default();
        let mut buffer = [0u8; SLICED_DATA_SIZE];
        assert_eq!(slicer.slice(&mut buffer, &[0u8; 16]), Ok(false));
        assert_eq!(slicer.slice(&mut buffer, &[0u8; 16]), Ok(false));
        assert_eq!(slicer.payload_bytes(), 0);
    }
}
