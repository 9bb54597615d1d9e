use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use vbislice::structs::pixel_format::PixelFormat;
use vbislice::structs::sampling::SamplingParams;

/// Sampling parameters of a raw VBI dump as read from a YAML file.
///
/// Every field is optional. Missing fields are taken from the 625 or 525
/// line preset selected by `standard`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingConfig {
    /// 625 or 525 lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_per_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interlaced: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronous: Option<bool>,
}

impl SamplingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read sampling config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid sampling config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: SamplingConfig) -> Self {
        Self {
            standard: overrides.standard.or(self.standard),
            pixel_format: overrides.pixel_format.or(self.pixel_format),
            sampling_rate: overrides.sampling_rate.or(self.sampling_rate),
            offset: overrides.offset.or(self.offset),
            samples_per_line: overrides.samples_per_line.or(self.samples_per_line),
            start: overrides.start.or(self.start),
            count: overrides.count.or(self.count),
            interlaced: overrides.interlaced.or(self.interlaced),
            synchronous: overrides.synchronous.or(self.synchronous),
        }
    }

    pub fn to_sampling(&self) -> Result<SamplingParams> {
        let preset = match self.standard.unwrap_or(625) {
            625 => SamplingParams::preset_625(),
            525 => SamplingParams::preset_525(),
            other => bail!("Unsupported standard {other}, expected 625 or 525"),
        };

        let pixel_format = match &self.pixel_format {
            Some(name) => name.parse::<PixelFormat>()?,
            None => preset.pixel_format,
        };

        let sampling = SamplingParams {
            pixel_format,
            sampling_rate: self.sampling_rate.unwrap_or(preset.sampling_rate),
            offset: self.offset.unwrap_or(preset.offset),
            samples_per_line: self.samples_per_line.unwrap_or(preset.samples_per_line),
            start: self.start.unwrap_or(preset.start),
            count: self.count.unwrap_or(preset.count),
            interlaced: self.interlaced.unwrap_or(preset.interlaced),
            synchronous: self.synchronous.unwrap_or(preset.synchronous),
            ..preset
        };

        sampling.validate()?;
        Ok(sampling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_preset() -> Result<()> {
        let config = SamplingConfig::parse(
            r#"
standard: 525
pixel_format: yuyv
start: [10, 273]
interlaced: false
"#,
        )?;

        let sampling = config.to_sampling()?;
        assert_eq!(sampling.pixel_format, PixelFormat::Yuyv);
        assert_eq!(sampling.start, [10, 273]);
        assert_eq!(sampling.count, SamplingParams::preset_525().count);
        assert_eq!(sampling.videostd_set, SamplingParams::preset_525().videostd_set);
        Ok(())
    }

    #[test]
    fn command_line_wins() -> Result<()> {
        let file = SamplingConfig {
            standard: Some(525),
            offset: Some(200),
            ..Default::default()
        };
        let flags = SamplingConfig {
            standard: Some(625),
            ..Default::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.standard, Some(625));
        assert_eq!(merged.offset, Some(200));
        assert_eq!(merged.to_sampling()?.offset, 200);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(SamplingConfig::parse("lines: 3").is_err());
        assert!(SamplingConfig::parse("pixel_format: mpeg").and_then(|c| c.to_sampling()).is_err());
        assert!(SamplingConfig::parse("standard: 819").and_then(|c| c.to_sampling()).is_err());
        assert!(SamplingConfig::parse("count: [0, 0]").and_then(|c| c.to_sampling()).is_err());
    }
}
