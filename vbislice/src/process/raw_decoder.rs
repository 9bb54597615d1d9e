use std::ops::Range;

use log::{debug, log, trace};

use crate::process::bit_slicer::{BitSlicer, SlicerParams};
use crate::process::pattern::{JOB_WAYS, LinePattern};
use crate::structs::sampling::{SamplingParams, Strictness};
use crate::structs::service::{Service, ServiceParams, ServiceSet};
use crate::structs::sliced::{SLICED_DATA_SIZE, Sliced};
use crate::utils::crc::{cpr1204_crc_ok, wss625_parity_ok};
use crate::utils::errors::{DecodeError, SamplingError, ServiceError};

/// Bit slicers a decoder runs at most.
pub const MAX_JOBS: usize = 8;

/// Every this many calls to [`RawDecoder::decode`] blank lines are probed
/// again.
pub const READJUST_PERIOD: u32 = 16;

/// One bit slicer and the services it decodes.
#[derive(Debug, Clone)]
struct Job {
    services: ServiceSet,
    slicer: BitSlicer,
}

impl Job {
    /// The service a match on `line` of `field` belongs to, after the
    /// payload checks of services whose framing alone is weak. With an
    /// unknown line number only the field decides.
    fn identify(&self, field: usize, line: u32, data: &[u8]) -> Option<Service> {
        let covers = |service: &Service| {
            let par = service.params();
            par.on_field(field) && (par.first[field]..=par.last[field]).contains(&line)
        };

        let service = if line == 0 {
            self.services.iter().find(|service| service.params().on_field(field))
        } else {
            self.services.iter().find(covers)
        }
        .or_else(|| self.services.iter().next())?;

        let intact = match service {
            Service::Wss625 => wss625_parity_ok(data),
            Service::WssCpr1204 => cpr1204_crc_ok(data),
            _ => true,
        };

        intact.then_some(service)
    }
}

/// Decodes all lines of a raw VBI field pair into [`Sliced`] records.
///
/// Services are decoded by up to [`MAX_JOBS`] bit slicers. Services which
/// differ only in their lines share a slicer. Each sampled line remembers
/// which slicers to try in most recently successful order, and lines where
/// nothing matched for a long time are only probed every
/// [`READJUST_PERIOD`] calls.
#[derive(Debug, Clone)]
pub struct RawDecoder {
    sampling: SamplingParams,
    services: ServiceSet,
    jobs: Vec<Job>,
    /// One entry per sampled line, first field lines first. Empty until a
    /// service is accepted.
    pattern: Vec<LinePattern>,
    readjust: u32,
}

impl RawDecoder {
    pub fn new(sampling: SamplingParams) -> Result<Self, SamplingError> {
        sampling.validate()?;

        Ok(Self {
            sampling,
            services: ServiceSet::EMPTY,
            jobs: Vec::new(),
            pattern: Vec::new(),
            readjust: 0,
        })
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    /// Services currently decoded.
    pub fn services(&self) -> ServiceSet {
        self.services
    }

    /// Number of bit slicers in use.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Adds `services` to the decoded ones.
    ///
    /// Each service is checked against the sampling parameters at
    /// `strictness` and rejected if it cannot be found in the sampled lines
    /// or the decoder ran out of slicers. Reasons are logged. Returns the
    /// requested services which are now decoded, including ones accepted
    /// by earlier calls.
    pub fn add_services(&mut self, services: ServiceSet, strictness: Strictness) -> ServiceSet {
        for service in (services - self.services).iter() {
            if let Err(err) = self.add_service(service, strictness) {
                log!(err.level(), "{err}");
            }
        }

        self.services & services
    }

    /// Adds a single service, returning why it was rejected.
    pub fn add_service(
        &mut self,
        service: Service,
        strictness: Strictness,
    ) -> Result<(), ServiceError> {
        if self.services.contains(service) {
            return Ok(());
        }

        let par = service.params();
        self.sampling.permit_service(par, strictness)?;

        let merge = self
            .jobs
            .iter()
            .position(|job| (job.services | service).is_mergeable());

        let slicer = match merge {
            Some(_) => None,
            None if self.jobs.len() >= MAX_JOBS => {
                return Err(ServiceError::TooManyJobs(par.label));
            }
            None => {
                let params = SlicerParams::for_service(par, &self.sampling, strictness);
                let slicer = BitSlicer::new(&params).map_err(|source| ServiceError::Slicer {
                    service: par.label,
                    source,
                })?;
                Some(slicer)
            }
        };

        self.allocate_pattern()
            .map_err(|source| ServiceError::OutOfMemory {
                service: par.label,
                source,
            })?;

        let job_index = merge.unwrap_or(self.jobs.len());
        let ranges = self.line_ranges(par);
        let job = job_index as u8;

        for index in ranges.iter().cloned().flatten() {
            let pattern = &self.pattern[index];
            if !pattern.contains(job) && !pattern.has_room() {
                return Err(ServiceError::LineFull {
                    service: par.label,
                    line: index,
                });
            }
        }

        if let Some(slicer) = slicer {
            self.jobs.push(Job {
                services: ServiceSet::EMPTY,
                slicer,
            });
        }

        for index in ranges.into_iter().flatten() {
            self.pattern[index].add(job);
        }

        self.jobs[job_index].services.insert(service);
        self.services.insert(service);
        debug!("Decoding {service} with bit slicer {job_index}");

        Ok(())
    }

    /// Stops decoding `services`. Returns the services still decoded.
    pub fn remove_services(&mut self, services: ServiceSet) -> ServiceSet {
        let removed = self.services & services;
        if removed.is_empty() {
            return self.services;
        }

        let mut index = 0;
        while index < self.jobs.len() {
            let job = &mut self.jobs[index];
            if !job.services.intersects(removed) {
                index += 1;
                continue;
            }

            job.services = job.services - removed;
            let remaining = job.services;
            let id = index as u8;

            if remaining.is_empty() {
                self.jobs.remove(index);
                for pattern in &mut self.pattern {
                    pattern.remove_and_compact(id);
                }
                continue;
            }

            for pattern in &mut self.pattern {
                pattern.remove(id);
            }
            for service in remaining.iter() {
                for line in self.line_ranges(service.params()).into_iter().flatten() {
                    self.pattern[line].add(id);
                }
            }
            index += 1;
        }

        self.services = self.services - removed;
        debug!("Stopped decoding {removed}");

        self.services
    }

    /// Removes all services and frees the line pattern.
    pub fn reset(&mut self) {
        self.services = ServiceSet::EMPTY;
        self.jobs.clear();
        self.pattern = Vec::new();
        self.readjust = 0;
    }

    /// Switches to `sampling` and adds back the services decoded so far,
    /// checked at `strictness`. Returns the services still decoded.
    ///
    /// Invalid parameters leave the decoder unchanged.
    pub fn set_sampling_params(
        &mut self,
        sampling: SamplingParams,
        strictness: Strictness,
    ) -> Result<ServiceSet, SamplingError> {
        sampling.validate()?;

        let services = self.services;
        self.reset();
        self.sampling = sampling;

        Ok(self.add_services(services, strictness))
    }

    /// Decodes the field pair `raw` into `sliced`.
    ///
    /// Records are written in ascending line order, one per line at most,
    /// until `sliced` is full. Returns the number of records written.
    pub fn decode(&mut self, sliced: &mut [Sliced], raw: &[u8]) -> Result<usize, DecodeError> {
        let needed = self.sampling.frame_size();
        if raw.len() < needed {
            return Err(DecodeError::RawTooShort {
                needed,
                available: raw.len(),
            });
        }

        let probe_blank = self.readjust == 0;
        self.readjust = (self.readjust + 1) % READJUST_PERIOD;

        if self.pattern.is_empty() {
            return Ok(0);
        }

        let Self {
            sampling,
            jobs,
            pattern,
            ..
        } = self;

        let bytes_per_line = sampling.bytes_per_line();
        let mut written = 0;

        'fields: for field in 0..2 {
            let base = field * sampling.count[0] as usize;

            for index in 0..sampling.count[field] as usize {
                if written == sliced.len() {
                    break 'fields;
                }

                let line_pattern = &mut pattern[base + index];
                if line_pattern.is_empty() || (line_pattern.is_blank() && !probe_blank) {
                    continue;
                }

                let start = sampling.row(field, index) * bytes_per_line;
                let row = &raw[start..start + bytes_per_line];
                let line = sampling.line_number(field, index);

                let mut matched = None;
                for way in 0..JOB_WAYS {
                    let Some(job) = line_pattern.job_at(way) else {
                        break;
                    };
                    let job = &mut jobs[job as usize];

                    let mut data = [0u8; SLICED_DATA_SIZE];
                    if !matches!(job.slicer.slice(&mut data, row), Ok(true)) {
                        continue;
                    }

                    if let Some(service) = job.identify(field, line, &data) {
                        matched = Some((way, service, data));
                        break;
                    }
                }

                match matched {
                    Some((way, service, data)) => {
                        trace!("Line {line}: {service}");
                        line_pattern.promote(way);
                        sliced[written] = Sliced {
                            id: service.into(),
                            line,
                            data,
                        };
                        written += 1;
                    }
                    None => line_pattern.miss(),
                }
            }
        }

        Ok(written)
    }

    fn allocate_pattern(&mut self) -> Result<(), std::collections::TryReserveError> {
        if !self.pattern.is_empty() {
            return Ok(());
        }

        let lines = self.sampling.total_lines();
        let mut pattern = Vec::new();
        pattern.try_reserve_exact(lines)?;
        pattern.resize(lines, LinePattern::default());

        let mut jobs = Vec::new();
        jobs.try_reserve_exact(MAX_JOBS)?;

        self.pattern = pattern;
        self.jobs = jobs;
        Ok(())
    }

    /// Indices into the line pattern of the lines `par` may be found on,
    /// per field.
    ///
    /// Without field synchronization any line may carry any service. With
    /// unknown line numbers every line of the fields the service uses is a
    /// candidate.
    fn line_ranges(&self, par: &ServiceParams) -> [Range<usize>; 2] {
        let count = self.sampling.count.map(|count| count as usize);
        let base = [0, count[0]];

        if !self.sampling.synchronous {
            return [0..count[0], count[0]..count[0] + count[1]];
        }

        let mut ranges = [0..0, 0..0];
        for field in 0..2 {
            if !par.on_field(field) || count[field] == 0 {
                continue;
            }

            let start = self.sampling.start[field];
            if start == 0 {
                ranges[field] = base[field]..base[field] + count[field];
                continue;
            }

            let end = start + count[field] as u32 - 1;
            let first = par.first[field].max(start);
            let last = par.last[field].min(end);
            if first <= last {
                ranges[field] = base[field] + (first - start) as usize
                    ..base[field] + (last - start) as usize + 1;
            }
        }

        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::pixel_format::PixelFormat;
    use crate::utils::crc::cpr1204_encode;
    use crate::utils::synth::render_raw_vbi;
    use anyhow::Result;

    const BLANK: u8 = 40;
    const WHITE: u8 = 200;

    fn teletext_payload(seed: u8) -> Vec<u8> {
        (0..42).map(|i: u8| i.wrapping_mul(37) ^ seed).collect()
    }

    fn frame(sampling: &SamplingParams, records: &[Sliced]) -> Result<Vec<u8>> {
        let mut raw = vec![0u8; sampling.frame_size()];
        render_raw_vbi(&mut raw, sampling, BLANK, WHITE, records)?;
        Ok(raw)
    }

    fn decode_all(decoder: &mut RawDecoder, raw: &[u8]) -> Result<Vec<Sliced>> {
        let mut sliced = vec![Sliced::EMPTY; 64];
        let n = decoder.decode(&mut sliced, raw)?;
        sliced.truncate(n);
        Ok(sliced)
    }

    fn services_625() -> ServiceSet {
        ServiceSet::TELETEXT_B_625 | Service::Vps | Service::Wss625 | ServiceSet::CAPTION_625
    }

    fn records_625() -> Vec<Sliced> {
        vec![
            Sliced::new(Service::TeletextBL10_625, 7, &teletext_payload(0x15)),
            Sliced::new(Service::Vps, 16, &[0x5A; 13]),
            Sliced::new(Service::Caption625F1, 22, &[0x94, 0x2C]),
            Sliced::new(Service::Wss625, 23, &[0x08, 0x06]),
            Sliced::new(Service::TeletextBL10_625, 320, &teletext_payload(0xA7)),
            Sliced::new(Service::Caption625F2, 335, &[0x80, 0x01]),
        ]
    }

    fn assert_records(decoded: &[Sliced], expected: &[Sliced]) {
        assert_eq!(decoded.len(), expected.len(), "{decoded:?}");
        for (got, want) in decoded.iter().zip(expected) {
            assert_eq!(got.id, want.id, "line {}", want.line);
            assert_eq!(got.line, want.line);
            assert_eq!(got.payload(), want.payload(), "line {}", want.line);
        }
    }

    #[test]
    fn decodes_625_frame() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;

        let accepted = decoder.add_services(services_625(), Strictness::Reliable);
        assert_eq!(accepted, services_625());
        // Teletext levels and the caption fields share slicers.
        assert_eq!(decoder.job_count(), 4);

        let records = records_625();
        let raw = frame(&sampling, &records)?;

        let first = decode_all(&mut decoder, &raw)?;
        assert_records(&first, &records);
        assert!(first.iter().all(|s| s.id.is_subset(accepted)));
        assert!(first.windows(2).all(|w| w[0].line < w[1].line));

        // Learning the line pattern does not change the result.
        let second = decode_all(&mut decoder, &raw)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn successful_job_moves_to_front() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(ServiceSet::TELETEXT_B_625 | Service::Vps, Strictness::Reliable);

        let vps_line = 16 - 6;
        assert_eq!(decoder.pattern[vps_line].jobs().collect::<Vec<_>>(), [0, 1]);

        let raw = frame(&sampling, &[Sliced::new(Service::Vps, 16, &[0x33; 13])])?;
        let decoded = decode_all(&mut decoder, &raw)?;
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].service(), Some(Service::Vps));
        assert_eq!(decoder.pattern[vps_line].jobs().collect::<Vec<_>>(), [1, 0]);
        assert_eq!(decoder.pattern[vps_line].cooldown(), 0);
        assert_eq!(decoder.pattern[0].cooldown(), 1);
        Ok(())
    }

    #[test]
    fn blank_lines_are_probed_periodically() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(ServiceSet::TELETEXT_B_625, Strictness::Reliable);

        let blank = frame(&sampling, &[])?;
        for _ in 0..130 {
            assert_eq!(decode_all(&mut decoder, &blank)?.len(), 0);
        }
        assert!(decoder.pattern[1].is_blank());

        let records = [Sliced::new(Service::TeletextBL10_625, 7, &teletext_payload(1))];
        let raw = frame(&sampling, &records)?;

        // 130 calls leave the counter at 2, the next probing call is the
        // 15th from here.
        for _ in 0..14 {
            assert_eq!(decode_all(&mut decoder, &raw)?.len(), 0);
        }
        assert_records(&decode_all(&mut decoder, &raw)?, &records);
        assert!(!decoder.pattern[1].is_blank());
        assert_records(&decode_all(&mut decoder, &raw)?, &records);
        Ok(())
    }

    #[test]
    fn constant_image_yields_nothing() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        let accepted = decoder.add_services(ServiceSet::ALL, Strictness::Loose);
        assert!(!accepted.is_empty());

        for level in [0u8, 128, 255] {
            let raw = vec![level; sampling.frame_size()];
            assert_eq!(decode_all(&mut decoder, &raw)?.len(), 0);
        }
        Ok(())
    }

    #[test]
    fn unknown_start_lines_fail_reliable_checks() -> Result<()> {
        let sampling = SamplingParams {
            start: [0, 0],
            ..SamplingParams::preset_625()
        };
        let mut decoder = RawDecoder::new(sampling)?;

        let accepted = decoder.add_services(ServiceSet::CAPTION_625, Strictness::Reliable);
        assert_eq!(accepted, ServiceSet::EMPTY);
        assert!(decoder.pattern.is_empty());
        assert!(matches!(
            decoder.add_service(Service::Caption625F1, Strictness::Reliable),
            Err(ServiceError::Permit(_))
        ));
        Ok(())
    }

    #[test]
    fn unknown_line_numbers_keep_the_field() -> Result<()> {
        let known = SamplingParams::preset_625();
        let sampling = SamplingParams {
            start: [0, 0],
            ..known.clone()
        };
        let mut decoder = RawDecoder::new(sampling)?;

        let accepted = decoder.add_services(ServiceSet::CAPTION_625, Strictness::Loose);
        assert_eq!(accepted, ServiceSet::CAPTION_625);
        assert_eq!(decoder.job_count(), 1);

        // Rows are laid out alike, so the known numbering places the signals.
        let records = [
            Sliced::new(Service::Caption625F1, 22, &[0x94, 0x2C]),
            Sliced::new(Service::Caption625F2, 335, &[0x80, 0x01]),
        ];
        let raw = frame(&known, &records)?;

        let decoded = decode_all(&mut decoder, &raw)?;
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].service(), Some(Service::Caption625F1));
        assert_eq!(decoded[1].service(), Some(Service::Caption625F2));
        for (got, want) in decoded.iter().zip(&records) {
            assert_eq!(got.line, 0);
            assert_eq!(got.payload(), want.payload());
        }
        Ok(())
    }

    #[test]
    fn accepted_services_depend_on_strictness() -> Result<()> {
        // Field 1 only covers lines 318 to 327.
        let sampling = SamplingParams {
            count: [18, 10],
            ..SamplingParams::preset_625()
        };

        for (strictness, teletext) in [
            (Strictness::Loose, true),
            (Strictness::Reliable, true),
            (Strictness::Strict, false),
        ] {
            let mut decoder = RawDecoder::new(sampling.clone())?;
            let accepted = decoder.add_services(ServiceSet::TELETEXT_B_625, strictness);
            assert_eq!(accepted == ServiceSet::TELETEXT_B_625, teletext, "{strictness}");
            assert!(accepted.is_subset(ServiceSet::TELETEXT_B_625));
        }

        // Services of the other scanning are rejected at any strictness.
        for level in 0..3 {
            let mut decoder = RawDecoder::new(sampling.clone())?;
            let strictness = Strictness::from_level(level);
            assert!(decoder.add_services(ServiceSet::CAPTION_525, strictness).is_empty());
        }
        Ok(())
    }

    #[test]
    fn removal_keeps_other_services() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(services_625(), Strictness::Reliable);

        let records = records_625();
        let raw = frame(&sampling, &records)?;

        let remaining = decoder.remove_services(Service::Vps.into());
        assert_eq!(remaining, services_625() - Service::Vps.into());
        assert_eq!(decoder.job_count(), 3);
        assert!(decoder.pattern.iter().all(|p| p.jobs().all(|j| j < 3)));

        let decoded = decode_all(&mut decoder, &raw)?;
        let expected: Vec<Sliced> = records
            .iter()
            .filter(|s| s.service() != Some(Service::Vps))
            .cloned()
            .collect();
        assert_records(&decoded, &expected);

        // Level 2.5 takes over lines of the shared slicer.
        decoder.remove_services(Service::TeletextBL10_625.into());
        assert_eq!(decoder.job_count(), 3);
        let decoded = decode_all(&mut decoder, &raw)?;
        assert_eq!(decoded[0].service(), Some(Service::TeletextBL25_625));
        assert_eq!(decoded[0].line, 7);

        assert_eq!(decoder.remove_services(ServiceSet::ALL), ServiceSet::EMPTY);
        assert_eq!(decoder.job_count(), 0);
        assert_eq!(decode_all(&mut decoder, &raw)?.len(), 0);
        Ok(())
    }

    #[test]
    fn rejections_leave_accepted_services_intact() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(services_625(), Strictness::Reliable);
        assert_eq!(decoder.job_count(), 4);

        // Idle slicers take the rest of the job table and every free slot
        // of line 329.
        let vps_f2_line = 18 + (329 - 318);
        let idle = Job {
            services: ServiceSet::EMPTY,
            slicer: decoder.jobs[0].slicer.clone(),
        };
        while decoder.job_count() < MAX_JOBS {
            decoder.jobs.push(idle.clone());
        }
        for job in 2..MAX_JOBS as u8 {
            assert!(decoder.pattern[vps_f2_line].add(job));
        }
        assert!(!decoder.pattern[vps_f2_line].has_room());
        let patterns = decoder.pattern.clone();

        assert!(matches!(
            decoder.add_service(Service::TeletextA, Strictness::Reliable),
            Err(ServiceError::TooManyJobs(_))
        ));
        // Merges into the VPS slicer, which has no slot left on line 329.
        assert!(matches!(
            decoder.add_service(Service::VpsF2, Strictness::Reliable),
            Err(ServiceError::LineFull { line, .. }) if line == vps_f2_line
        ));

        assert_eq!(decoder.services(), services_625());
        assert_eq!(decoder.job_count(), MAX_JOBS);
        assert_eq!(decoder.jobs[1].services, ServiceSet::from(Service::Vps));
        assert_eq!(decoder.pattern, patterns);

        let records = records_625();
        let raw = frame(&sampling, &records)?;
        assert_records(&decode_all(&mut decoder, &raw)?, &records);
        Ok(())
    }

    #[test]
    fn reset_and_new_sampling() -> Result<()> {
        let mut decoder = RawDecoder::new(SamplingParams::preset_625())?;
        decoder.add_services(ServiceSet::TELETEXT_B_625, Strictness::Reliable);

        decoder.reset();
        assert_eq!(decoder.services(), ServiceSet::EMPTY);
        assert!(decoder.pattern.is_empty());

        decoder.add_services(ServiceSet::TELETEXT_B_625, Strictness::Reliable);
        let kept = decoder.set_sampling_params(SamplingParams::preset_525(), Strictness::Reliable)?;
        assert_eq!(kept, ServiceSet::EMPTY);
        assert_eq!(decoder.job_count(), 0);

        let sampling = decoder.sampling().clone();
        let accepted =
            decoder.add_services(ServiceSet::CAPTION_525 | Service::WssCpr1204, Strictness::Reliable);
        assert_eq!(accepted, ServiceSet::CAPTION_525 | Service::WssCpr1204);

        let records = [
            Sliced::new(Service::WssCpr1204, 20, &cpr1204_encode(0x1234)),
            Sliced::new(Service::Caption525F1, 21, &[0x14, 0x20]),
            Sliced::new(Service::WssCpr1204, 283, &cpr1204_encode(0x0ABC)),
            Sliced::new(Service::Caption525F2, 284, &[0x15, 0x2F]),
        ];
        let raw = frame(&sampling, &records)?;
        assert_records(&decode_all(&mut decoder, &raw)?, &records);

        let invalid = SamplingParams {
            sampling_rate: 0,
            ..sampling.clone()
        };
        assert!(decoder.set_sampling_params(invalid, Strictness::Reliable).is_err());
        assert_eq!(decoder.sampling(), &sampling);
        assert_eq!(decoder.services(), accepted);
        Ok(())
    }

    #[test]
    fn payload_checks_reject_corrupt_data() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(Service::Wss625.into(), Strictness::Reliable);

        // Aspect ratio group with even parity.
        let raw = frame(&sampling, &[Sliced::new(Service::Wss625, 23, &[0x09, 0x00])])?;
        assert_eq!(decode_all(&mut decoder, &raw)?.len(), 0);

        let sampling = SamplingParams::preset_525();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(Service::WssCpr1204.into(), Strictness::Reliable);

        let mut corrupt = cpr1204_encode(0x2222);
        corrupt[2] ^= 0x01;
        let raw = frame(&sampling, &[Sliced::new(Service::WssCpr1204, 20, &corrupt)])?;
        assert_eq!(decode_all(&mut decoder, &raw)?.len(), 0);
        Ok(())
    }

    #[test]
    fn interlaced_rows() -> Result<()> {
        let sampling = SamplingParams {
            interlaced: true,
            pixel_format: PixelFormat::Yuyv,
            ..SamplingParams::preset_625()
        };
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(services_625(), Strictness::Reliable);

        let records = records_625();
        let raw = frame(&sampling, &records)?;
        assert_records(&decode_all(&mut decoder, &raw)?, &records);
        Ok(())
    }

    #[test]
    fn unsynchronized_fields() -> Result<()> {
        let sampling = SamplingParams {
            synchronous: false,
            ..SamplingParams::preset_625()
        };
        let mut decoder = RawDecoder::new(sampling.clone())?;

        let accepted = decoder.add_services(services_625(), Strictness::Loose);
        assert_eq!(accepted, ServiceSet::TELETEXT_B_625);

        let records = [
            Sliced::new(Service::TeletextBL10_625, 9, &teletext_payload(3)),
            Sliced::new(Service::TeletextBL10_625, 330, &teletext_payload(4)),
        ];
        let raw = frame(&sampling, &records)?;
        let decoded = decode_all(&mut decoder, &raw)?;
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|s| s.line == 0));
        assert_eq!(decoded[1].payload(), records[1].payload());
        Ok(())
    }

    #[test]
    fn output_and_input_sizes() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut decoder = RawDecoder::new(sampling.clone())?;
        decoder.add_services(services_625(), Strictness::Reliable);

        let raw = frame(&sampling, &records_625())?;
        let mut sliced = [Sliced::EMPTY; 2];
        assert_eq!(decoder.decode(&mut sliced, &raw)?, 2);
        assert_eq!(sliced[1].line, 16);

        assert!(matches!(
            decoder.decode(&mut sliced, &raw[..raw.len() - 1]),
            Err(DecodeError::RawTooShort { .. })
        ));
        Ok(())
    }
}
