use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use vbislice::process::raw_decoder::RawDecoder;
use vbislice::structs::sampling::Strictness;
use vbislice::structs::service::{Service, ServiceSet};
use vbislice::structs::sliced::Sliced;

use super::command::{Cli, DecodeArgs};
use super::services::select_services;
use crate::input::InputReader;
use crate::output::SlicedWriter;
use crate::timestamp::frame_time;

/// Field pair index and the records decoded from it.
type DecodedFrame = (u64, Vec<Sliced>);

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let sampling = args.sampling.sampling_config()?.to_sampling()?;
    let strictness = Strictness::from_level(args.sampling.strictness);
    let requested: ServiceSet = args.services.parse()?;
    let services = select_services(&sampling, requested, strictness, cli.strict)?;

    let mut decoder = RawDecoder::new(sampling.clone())?;
    let accepted = decoder.add_services(services, strictness);
    if accepted != services && cli.strict {
        return Err(anyhow!("Decoder rejected services: {}", services - accepted));
    }

    let frame_size = sampling.frame_size();
    let scanning = sampling.scanning().unwrap_or(625);
    log::info!(
        "Decoding raw VBI: {} ({frame_size} bytes per field pair, strictness {strictness})",
        args.input.display()
    );
    log::info!("Services: {accepted}");

    let is_pipe = args.input.to_string_lossy() == "-";
    let total_frames = if is_pipe {
        log::debug!("Skipping progress estimation for pipe input");
        None
    } else {
        Some(fs::metadata(&args.input)?.len() / frame_size as u64)
    };

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, total_frames)?),
        None => None,
    };

    let (tx, rx) = mpsc::channel();
    let decode_thread = spawn_decoder_thread(DecoderThreadConfig {
        input_path: args.input.clone(),
        decoder,
        frame_size,
        tx,
        pb: pb.clone(),
    });

    let mut writer = SlicedWriter::create(args.output.as_deref(), args.format, scanning)?;
    let mut stats = ServiceStats::default();
    let start_time = Instant::now();

    while let Ok((frame, sliced)) = rx.recv() {
        stats.count(&sliced);
        if let Err(e) = writer.write_frame(frame, &sliced) {
            if let Some(pb) = &pb {
                pb.finish_with_message("write failed");
            }
            return Err(e);
        }
    }

    writer.finish()?;

    let frames = match decode_thread.join() {
        Ok(Ok(frames)) => frames,
        Ok(Err(e)) => {
            if let Some(pb) = &pb {
                pb.finish_with_message("decode failed");
            }
            return Err(e);
        }
        Err(_) => {
            if let Some(pb) = &pb {
                pb.finish_with_message("decode thread panicked");
            }
            return Err(anyhow!("Decode thread panicked"));
        }
    };

    if let Some(pb) = &pb {
        let elapsed = start_time.elapsed().as_secs_f64();
        pb.finish_with_message(format!(
            "decoded {frames} field pairs in {elapsed:.1}s | timestamp: {}",
            frame_time(frames, scanning)
        ));
    }

    log::info!(
        "Decoding completed: {frames} field pairs, {}",
        frame_time(frames, scanning)
    );
    stats.log();

    Ok(())
}

struct DecoderThreadConfig {
    input_path: PathBuf,
    decoder: RawDecoder,
    frame_size: usize,
    tx: mpsc::Sender<DecodedFrame>,
    pb: Option<ProgressBar>,
}

fn spawn_decoder_thread(config: DecoderThreadConfig) -> thread::JoinHandle<Result<u64>> {
    thread::spawn(move || -> Result<u64> {
        let DecoderThreadConfig {
            input_path,
            mut decoder,
            frame_size,
            tx,
            pb,
        } = config;

        let mut input = InputReader::new(&input_path)?;
        let mut sliced = vec![Sliced::EMPTY; decoder.sampling().total_lines()];

        let frames = input.process_frames(frame_size, |frame, raw| {
            let n = decoder.decode(&mut sliced, raw)?;

            if let Some(pb) = &pb {
                pb.set_position(frame + 1);
            }

            // The receiver is gone once writing failed.
            Ok(tx.send((frame, sliced[..n].to_vec())).is_ok())
        })?;

        log::debug!("Read {frames} field pairs");
        Ok(frames)
    })
}

fn create_progress_bar(multi: &MultiProgress, total_frames: Option<u64>) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_frames {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} field pairs ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} field pairs\n{msg} | elapsed: {elapsed_precise}",
        )?);
        pb
    };

    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("decoding");
    Ok(pb)
}

/// Records decoded per service.
#[derive(Default)]
struct ServiceStats {
    counts: [u64; Service::ALL.len()],
}

impl ServiceStats {
    fn count(&mut self, sliced: &[Sliced]) {
        for record in sliced {
            if let Some(index) = record
                .service()
                .and_then(|service| Service::ALL.iter().position(|&s| s == service))
            {
                self.counts[index] += 1;
            }
        }
    }

    fn log(&self) {
        for (service, count) in Service::ALL.iter().zip(self.counts) {
            if count > 0 {
                log::info!("  {:24} {count} lines", service.short_name());
            }
        }
    }
}
