use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use vbislice::structs::sampling::{SamplingParams, Strictness};
use vbislice::structs::service::{Service, ServiceSet};
use vbislice::structs::sliced::Sliced;
use vbislice::utils::crc::cpr1204_encode;
use vbislice::utils::synth::render_raw_vbi;

use super::command::{Cli, SynthArgs};
use super::services::select_services;

const BLANK_LEVEL: u8 = 16;
const WHITE_LEVEL: u8 = 200;

/// Aspect ratio groups with odd parity.
const WSS_GROUPS: [u8; 6] = [0x08, 0x0E, 0x01, 0x07, 0x0B, 0x0D];

pub fn cmd_synth(args: &SynthArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let sampling = args.sampling.sampling_config()?.to_sampling()?;
    let strictness = Strictness::from_level(args.sampling.strictness);
    let requested: ServiceSet = args.services.parse()?;
    let services = select_services(&sampling, requested, strictness, cli.strict)?;

    let lines = assign_lines(&sampling, services);
    log::info!(
        "Writing {} field pairs to {}: {}",
        args.frames,
        args.output.display(),
        lines
            .iter()
            .map(|(service, line)| format!("{} on {line}", service.short_name()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut out: Box<dyn Write> = if args.output.to_string_lossy() == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        Box::new(BufWriter::new(File::create(&args.output)?))
    };

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(args.frames));
            pb.set_style(ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} field pairs ({percent}%)",
            )?);
            Some(pb)
        }
        None => None,
    };

    let mut raw = vec![0u8; sampling.frame_size()];
    for frame in 0..args.frames {
        let records: Vec<Sliced> = lines
            .iter()
            .map(|&(service, line)| Sliced::new(service, line, &test_payload(service, frame)))
            .collect();

        render_raw_vbi(&mut raw, &sampling, BLANK_LEVEL, WHITE_LEVEL, &records)?;
        out.write_all(&raw)?;

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    out.flush()?;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    Ok(())
}

/// One line per field for each service, the first sampled line of its
/// range not taken by an earlier service.
fn assign_lines(sampling: &SamplingParams, services: ServiceSet) -> Vec<(Service, u32)> {
    let mut lines: Vec<(Service, u32)> = Vec::new();

    for service in services.iter() {
        let par = service.params();

        for field in 0..2 {
            let start = sampling.start[field];
            let count = sampling.count[field];
            if !par.on_field(field) || count == 0 {
                continue;
            }

            if start == 0 {
                log::warn!("Line numbers of field {} unknown, skipping {service}", field + 1);
                continue;
            }

            let first = par.first[field].max(start);
            let last = par.last[field].min(start + count - 1);
            match (first..=last).find(|line| lines.iter().all(|(_, l)| l != line)) {
                Some(line) => lines.push((service, line)),
                None => log::warn!("No free line for {service} in field {}", field + 1),
            }
        }
    }

    lines.sort_by_key(|&(_, line)| line);
    lines
}

/// Payload of `service` for field pair `frame`, valid for the payload
/// checks the decoder applies.
fn test_payload(service: Service, frame: u64) -> Vec<u8> {
    let par = service.params();

    match service {
        Service::Wss625 => vec![
            WSS_GROUPS[(frame % WSS_GROUPS.len() as u64) as usize],
            (frame & 0x3F) as u8,
        ],
        Service::WssCpr1204 => cpr1204_encode(frame as u16).to_vec(),
        _ => {
            let mut payload: Vec<u8> = (0..par.payload_bytes())
                .map(|i| (frame as usize * 31 + i * 7) as u8)
                .collect();

            let tail = par.payload % 8;
            if let Some(last) = payload.last_mut().filter(|_| tail != 0) {
                *last &= (1u8 << tail) - 1;
            }
            payload
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbislice::process::raw_decoder::RawDecoder;

    #[test]
    fn lines_do_not_collide() {
        let sampling = SamplingParams::preset_625();
        let services = ServiceSet::TELETEXT_B_625 | Service::Vps | Service::Wss625;
        let lines = assign_lines(&sampling, services);

        assert_eq!(
            lines,
            [
                (Service::TeletextBL25_625, 6),
                (Service::TeletextBL10_625, 7),
                (Service::Vps, 16),
                (Service::Wss625, 23),
                (Service::TeletextBL25_625, 318),
                (Service::TeletextBL10_625, 320),
            ]
        );
    }

    #[test]
    fn synthesized_frames_decode() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let services =
            ServiceSet::TELETEXT_B_625 | Service::Vps | Service::Wss625 | ServiceSet::CAPTION_625;
        let lines = assign_lines(&sampling, services);

        let mut decoder = RawDecoder::new(sampling.clone())?;
        assert_eq!(decoder.add_services(services, Strictness::Reliable), services);

        let mut raw = vec![0u8; sampling.frame_size()];
        let mut sliced = [Sliced::EMPTY; 36];
        for frame in 0..3 {
            let records: Vec<Sliced> = lines
                .iter()
                .map(|&(service, line)| Sliced::new(service, line, &test_payload(service, frame)))
                .collect();
            render_raw_vbi(&mut raw, &sampling, BLANK_LEVEL, WHITE_LEVEL, &records)?;

            let n = decoder.decode(&mut sliced, &raw)?;
            assert_eq!(n, records.len());
            for (got, want) in sliced[..n].iter().zip(&records) {
                assert_eq!(got.line, want.line);
                assert_eq!(got.payload(), want.payload());
            }
        }
        Ok(())
    }
}
