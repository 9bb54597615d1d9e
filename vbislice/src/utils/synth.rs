//! Rendering of sliced data back into raw VBI samples.
//!
//! The waveform is an ideal two-level signal, box filtered over each sample
//! period so edges falling between samples produce intermediate levels.

use anyhow::{Result, bail, ensure};

use crate::structs::pixel_format::SampleLayout;
use crate::structs::sampling::SamplingParams;
use crate::structs::service::ServiceParams;
use crate::structs::sliced::Sliced;
use crate::utils::bitstream_io::payload_to_bits;
use crate::utils::sample::write_sample;

/// Sub-samples per sample for the box filter.
const SUPERSAMPLING: u32 = 8;

/// Renders `sliced` into the field pair `raw` sampled as `sampling`.
///
/// Every line is first set to `blank_level`, then each record is drawn onto
/// the line its number maps to. Records need known line numbers.
pub fn render_raw_vbi(
    raw: &mut [u8],
    sampling: &SamplingParams,
    blank_level: u8,
    white_level: u8,
    sliced: &[Sliced],
) -> Result<()> {
    sampling.validate()?;

    let bytes_per_line = sampling.bytes_per_line();
    let frame_size = sampling.frame_size();
    ensure!(
        raw.len() >= frame_size,
        "raw buffer of {} bytes too small for {frame_size} byte field pair",
        raw.len()
    );

    let layout = sampling.pixel_format.layout();
    for row in raw[..frame_size].chunks_exact_mut(bytes_per_line) {
        fill_row(&layout, row, sampling.samples_per_line as usize, blank_level);
    }

    for record in sliced {
        let Some(service) = record.service() else {
            bail!("sliced record id {:#x} is not a single service", record.id.0);
        };

        let Some((field, index)) = field_index(sampling, record.line) else {
            bail!("line {} of {service} is not sampled", record.line);
        };

        let start = sampling.row(field, index) * bytes_per_line;
        render_line(
            &mut raw[start..start + bytes_per_line],
            sampling,
            service.params(),
            &record.data,
            blank_level,
            white_level,
        )?;
    }

    Ok(())
}

/// Draws one transmission of `par` carrying `payload` onto `row`.
///
/// The clock run-in starts at `par.offset` after 0H. Samples outside the
/// transmission keep their value.
pub fn render_line(
    row: &mut [u8],
    sampling: &SamplingParams,
    par: &ServiceParams,
    payload: &[u8],
    blank_level: u8,
    white_level: u8,
) -> Result<()> {
    let layout = sampling.pixel_format.layout();
    let samples_per_line = sampling.samples_per_line as usize;
    ensure!(
        row.len() >= samples_per_line * layout.bytes_per_sample,
        "row of {} bytes too short for {samples_per_line} samples",
        row.len()
    );

    let signal = Signal::new(par, payload)?;
    let rate = sampling.sampling_rate as f64;
    let cri_start = par.offset as f64 * 1e-9 - sampling.offset as f64 / rate;
    let range = white_level as f64 - blank_level as f64;

    for index in 0..samples_per_line {
        let center = index as f64 / rate - cri_start;
        if center < -1.0 / rate || center > signal.duration + 1.0 / rate {
            continue;
        }

        let high = (0..SUPERSAMPLING)
            .filter(|&k| {
                let t = center + ((k as f64 + 0.5) / SUPERSAMPLING as f64 - 0.5) / rate;
                signal.level(t)
            })
            .count();

        let level = blank_level as f64 + range * high as f64 / SUPERSAMPLING as f64;
        write_sample(&layout, row, index, level.round() as u8);
    }

    Ok(())
}

fn fill_row(layout: &SampleLayout, row: &mut [u8], samples: usize, level: u8) {
    for index in 0..samples {
        write_sample(layout, row, index, level);
    }
}

/// Field and line index within the field of ITU-R line `line`.
fn field_index(sampling: &SamplingParams, line: u32) -> Option<(usize, usize)> {
    (0..2).find_map(|field| {
        let start = sampling.start[field];
        let count = sampling.count[field];
        (start > 0 && line >= start && line < start + count)
            .then(|| (field, (line - start) as usize))
    })
}

/// The bit sequence of one transmission.
struct Signal {
    cri: u32,
    cri_bits: u32,
    cri_period: f64,
    bit_period: f64,
    /// Framing code followed by payload.
    data: Vec<bool>,
    biphase: bool,
    duration: f64,
}

impl Signal {
    fn new(par: &ServiceParams, payload: &[u8]) -> Result<Self> {
        let mut data: Vec<bool> = (0..par.frc_bits)
            .rev()
            .map(|bit| par.frc() >> bit & 1 != 0)
            .collect();
        data.extend(payload_to_bits(payload, par.payload, par.modulation)?);

        Ok(Self {
            cri: par.cri(),
            cri_bits: par.cri_bits,
            cri_period: 1.0 / par.cri_rate as f64,
            bit_period: 1.0 / par.bit_rate as f64,
            data,
            biphase: par.modulation.is_biphase(),
            duration: par.signal_duration(),
        })
    }

    /// Whether the signal is at the white level `t` seconds after the
    /// start of the clock run-in.
    fn level(&self, t: f64) -> bool {
        if t < 0.0 {
            return false;
        }

        let cri_length = self.cri_bits as f64 * self.cri_period;
        if t < cri_length {
            let bit = (t / self.cri_period) as u32;
            return self.cri >> (self.cri_bits - 1 - bit) & 1 != 0;
        }

        let position = (t - cri_length) / self.bit_period;
        let Some(&bit) = self.data.get(position as usize) else {
            return false;
        };

        if self.biphase && position.fract() >= 0.5 {
            !bit
        } else {
            bit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::service::Service;

    #[test]
    fn render_needs_known_lines() -> Result<()> {
        let sampling = SamplingParams::preset_625();
        let mut raw = vec![0u8; sampling.frame_size()];

        let ok = [Sliced::new(Service::Wss625, 23, &[0x08, 0x00])];
        render_raw_vbi(&mut raw, &sampling, 40, 200, &ok)?;

        // Only line 23 carries a signal.
        let bytes_per_line = sampling.bytes_per_line();
        let row = sampling.row(0, 23 - 6);
        assert!(raw[..row * bytes_per_line].iter().all(|&b| b == 40));
        assert!(raw[row * bytes_per_line..(row + 1) * bytes_per_line].contains(&200));

        let unknown = [Sliced::new(Service::Wss625, 0, &[0x08, 0x00])];
        assert!(render_raw_vbi(&mut raw, &sampling, 40, 200, &unknown).is_err());
        Ok(())
    }

    #[test]
    fn biphase_halves_are_complementary() -> Result<()> {
        let signal = Signal::new(Service::Vps.params(), &[0xFF; 13])?;
        let cri_length = 32.0 * signal.cri_period;
        let quarter = signal.bit_period / 4.0;

        assert!(signal.level(cri_length + quarter));
        assert!(!signal.level(cri_length + 3.0 * quarter));
        assert!(!signal.level(signal.duration + quarter));
        Ok(())
    }
}
