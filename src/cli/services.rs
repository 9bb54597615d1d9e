use anyhow::{Result, bail};
use vbislice::structs::sampling::{SamplingParams, Strictness};
use vbislice::structs::service::{SERVICE_TABLE, ServiceParams, ServiceSet};

use super::command::{Cli, ServicesArgs};

pub fn cmd_services(args: &ServicesArgs, _cli: &Cli) -> Result<()> {
    let sampling = args.sampling.sampling_config()?.to_sampling()?;
    let strictness = Strictness::from_level(args.sampling.strictness);

    display_sampling(&sampling, strictness);

    println!("Services");
    println!(
        "  {:22}  {:15}  {:>8}  {:>16}  {:>7}  Status",
        "Name", "Lines", "Offset", "Rates (CRI/bit)", "Payload"
    );

    for par in SERVICE_TABLE {
        let status = match sampling.permit_service(par, strictness) {
            Ok(()) => "ok".to_string(),
            Err(e) => e.to_string(),
        };

        println!(
            "  {:22}  {:15}  {:>5.2} us  {:>7}/{:<8}  {:>4} b  {status}",
            par.service.short_name(),
            line_ranges(par),
            par.offset as f64 / 1000.0,
            par.cri_rate,
            par.bit_rate,
            par.payload,
        );
    }
    println!();

    Ok(())
}

/// Narrows `requested` to the services of the sampled video standard and
/// the ones feasible at `strictness`.
///
/// Services of the other standard are dropped quietly. With `strict` any
/// other rejection is an error, otherwise it is logged.
pub fn select_services(
    sampling: &SamplingParams,
    requested: ServiceSet,
    strictness: Strictness,
    strict: bool,
) -> Result<ServiceSet> {
    let same_standard: ServiceSet = requested
        .iter()
        .filter(|service| service.params().videostd_set.intersects(sampling.videostd_set))
        .collect();

    let dropped = requested - same_standard;
    if !dropped.is_empty() {
        log::debug!("Ignoring services of another video standard: {dropped}");
    }

    let feasible = sampling.check_services(same_standard, strictness);
    let rejected = same_standard - feasible;
    if !rejected.is_empty() {
        if strict {
            bail!("Services rejected for this sampling: {rejected}");
        }
        log::warn!("Services rejected for this sampling: {rejected}");
    }

    if feasible.is_empty() {
        bail!("None of the requested services can be decoded from this sampling");
    }

    Ok(feasible)
}

fn display_sampling(sampling: &SamplingParams, strictness: Strictness) {
    println!();
    println!("Sampling");
    println!("  Video standard            {}", sampling.videostd_set);
    println!("  Pixel format              {}", sampling.pixel_format);
    println!("  Sampling rate             {} Hz", sampling.sampling_rate);
    println!("  Offset                    {} samples", sampling.offset);
    println!("  Samples per line          {}", sampling.samples_per_line);
    for field in 0..2 {
        let start = sampling.start[field];
        let count = sampling.count[field];
        let lines = match (start, count) {
            (_, 0) => "none".to_string(),
            (0, _) => format!("{count} lines, numbers unknown"),
            _ => format!("{start}-{}", start + count - 1),
        };
        println!("  Field {}                   {lines}", field + 1);
    }
    println!("  Interlaced                {}", sampling.interlaced);
    println!("  Synchronous               {}", sampling.synchronous);
    println!("  Strictness                {strictness}");
    println!();
}

fn line_ranges(par: &ServiceParams) -> String {
    (0..2)
        .filter(|&field| par.on_field(field))
        .map(|field| format!("{}-{}", par.first[field], par.last[field]))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbislice::structs::service::Service;

    #[test]
    fn other_standard_is_dropped_quietly() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let selected = select_services(&sampling, ServiceSet::ALL, Strictness::Reliable, false)?;

        assert!(selected.contains(Service::TeletextBL10_625));
        assert!(selected.contains(Service::Wss625));
        assert!(!selected.intersects(ServiceSet::CAPTION_525));
        // Teletext D does not fit into 1440 samples at 27 MHz.
        assert!(!selected.contains(Service::TeletextD625));
        assert!(select_services(&sampling, ServiceSet::ALL, Strictness::Reliable, true).is_err());
        Ok(())
    }

    #[test]
    fn strict_mode_fails_on_rejection() {
        let sampling = SamplingParams {
            start: [0, 0],
            ..SamplingParams::preset_625()
        };

        let captions = ServiceSet::CAPTION_625;
        assert!(select_services(&sampling, captions, Strictness::Reliable, true).is_err());
        assert!(select_services(&sampling, captions, Strictness::Reliable, false).is_err());
        assert_eq!(
            select_services(&sampling, ServiceSet::TELETEXT_B_625, Strictness::Loose, true).ok(),
            Some(ServiceSet::TELETEXT_B_625)
        );
    }
}
