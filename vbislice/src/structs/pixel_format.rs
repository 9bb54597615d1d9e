use std::fmt::Display;
use std::str::FromStr;

use crate::utils::errors::SamplingError;

/// Memory layout of one raw VBI sample.
///
/// Only the luma channel of YUV formats and the green channel of RGB formats
/// carry the VBI signal. Packed 16-bit names list the components from the
/// least significant bit up, `Le`/`Be` give the byte order of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, only the 8-bit luma plane is read.
    Yuv420,
    Yuyv,
    Yvyu,
    Uyvy,
    Vyuy,
    Rgba32Le,
    Rgba32Be,
    Bgra32Le,
    Bgra32Be,
    Rgb24,
    Bgr24,
    Rgb16Le,
    Rgb16Be,
    Bgr16Le,
    Bgr16Be,
    Rgba15Le,
    Rgba15Be,
    Bgra15Le,
    Bgra15Be,
    Argb15Le,
    Argb15Be,
    Abgr15Le,
    Abgr15Be,
    Rgba12Le,
    Rgba12Be,
    Argb12Le,
    Argb12Be,
    /// 3-3-2 bit packed, green in bits 3..6.
    Rgb8,
    /// 2-3-3 bit packed, green in bits 2..5.
    Bgr8,
}

/// Specialised sample reader a bit slicer compiles its loops for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleRoutine {
    Y8,
    Yuyv,
    Rgb24,
    Rgba32,
    Rgb16Le,
    Rgb16Be,
    Rgb8,
}

/// Everything a bit slicer derives from the pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SampleLayout {
    pub routine: SampleRoutine,
    pub bytes_per_sample: usize,
    /// Byte offset of the signal component within a sample.
    pub skip: usize,
    pub green_mask: u32,
    /// Initial threshold, fixed point with `thresh_frac` fraction bits.
    pub thresh: i32,
    pub thresh_frac: u32,
    pub oversampling: u32,
}

const DEF_THR_FRAC: u32 = 9;

/// Slicing level for an 8-bit channel before the AGC has adapted.
const DEF_THR_LEVEL: i32 = 105;

impl PixelFormat {
    pub const ALL: [PixelFormat; 29] = [
        Self::Yuv420,
        Self::Yuyv,
        Self::Yvyu,
        Self::Uyvy,
        Self::Vyuy,
        Self::Rgba32Le,
        Self::Rgba32Be,
        Self::Bgra32Le,
        Self::Bgra32Be,
        Self::Rgb24,
        Self::Bgr24,
        Self::Rgb16Le,
        Self::Rgb16Be,
        Self::Bgr16Le,
        Self::Bgr16Be,
        Self::Rgba15Le,
        Self::Rgba15Be,
        Self::Bgra15Le,
        Self::Bgra15Be,
        Self::Argb15Le,
        Self::Argb15Be,
        Self::Abgr15Le,
        Self::Abgr15Be,
        Self::Rgba12Le,
        Self::Rgba12Be,
        Self::Argb12Le,
        Self::Argb12Be,
        Self::Rgb8,
        Self::Bgr8,
    ];

    pub const fn bytes_per_sample(self) -> usize {
        use PixelFormat::*;

        match self {
            Yuv420 | Rgb8 | Bgr8 => 1,
            Rgba32Le | Rgba32Be | Bgra32Le | Bgra32Be => 4,
            Rgb24 | Bgr24 => 3,
            _ => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        use PixelFormat::*;

        match self {
            Yuv420 => "yuv420",
            Yuyv => "yuyv",
            Yvyu => "yvyu",
            Uyvy => "uyvy",
            Vyuy => "vyuy",
            Rgba32Le => "rgba32le",
            Rgba32Be => "rgba32be",
            Bgra32Le => "bgra32le",
            Bgra32Be => "bgra32be",
            Rgb24 => "rgb24",
            Bgr24 => "bgr24",
            Rgb16Le => "rgb16le",
            Rgb16Be => "rgb16be",
            Bgr16Le => "bgr16le",
            Bgr16Be => "bgr16be",
            Rgba15Le => "rgba15le",
            Rgba15Be => "rgba15be",
            Bgra15Le => "bgra15le",
            Bgra15Be => "bgra15be",
            Argb15Le => "argb15le",
            Argb15Be => "argb15be",
            Abgr15Le => "abgr15le",
            Abgr15Be => "abgr15be",
            Rgba12Le => "rgba12le",
            Rgba12Be => "rgba12be",
            Argb12Le => "argb12le",
            Argb12Be => "argb12be",
            Rgb8 => "rgb8",
            Bgr8 => "bgr8",
        }
    }

    /// Bit mask of the signal component within a little or big endian word,
    /// or `0xFF` for formats storing it in a whole byte.
    pub const fn green_mask(self) -> u32 {
        use PixelFormat::*;

        match self {
            Rgb16Le | Rgb16Be | Bgr16Le | Bgr16Be => 0x07E0,
            Rgba15Le | Rgba15Be | Bgra15Le | Bgra15Be => 0x03E0,
            Argb15Le | Argb15Be | Abgr15Le | Abgr15Be => 0x07C0,
            Rgba12Le | Rgba12Be => 0x00F0,
            Argb12Le | Argb12Be => 0x0F00,
            Rgb8 => 0x38,
            Bgr8 => 0x1C,
            _ => 0xFF,
        }
    }

    pub(crate) fn layout(self) -> SampleLayout {
        use PixelFormat::*;

        let byte = |routine: SampleRoutine, bytes_per_sample: usize, skip: usize| SampleLayout {
            routine,
            bytes_per_sample,
            skip,
            green_mask: 0xFF,
            thresh: DEF_THR_LEVEL << DEF_THR_FRAC,
            thresh_frac: DEF_THR_FRAC,
            oversampling: 4,
        };

        // The seed keeps the 8-bit level scaled to the position and width of
        // the green field: `level << (lsb + width - 8 + frac)`.
        let word = |routine: SampleRoutine, green_mask: u32, seed_shift: u32, thresh_frac: u32| {
            SampleLayout {
                routine,
                bytes_per_sample: 2,
                skip: 0,
                green_mask,
                thresh: DEF_THR_LEVEL << seed_shift,
                thresh_frac,
                oversampling: 4,
            }
        };

        match self {
            Yuv420 => byte(SampleRoutine::Y8, 1, 0),
            Yuyv | Yvyu => byte(SampleRoutine::Yuyv, 2, 0),
            Uyvy | Vyuy => byte(SampleRoutine::Yuyv, 2, 1),
            Rgba32Le | Bgra32Le => byte(SampleRoutine::Rgba32, 4, 1),
            Rgba32Be | Bgra32Be => byte(SampleRoutine::Rgba32, 4, 2),
            Rgb24 | Bgr24 => byte(SampleRoutine::Rgb24, 3, 1),

            Rgb16Le | Bgr16Le => word(SampleRoutine::Rgb16Le, 0x07E0, 5 + 6 - 8 + 12, 12),
            Rgb16Be | Bgr16Be => word(SampleRoutine::Rgb16Be, 0x07E0, 5 + 6 - 8 + 12, 12),
            Rgba15Le | Bgra15Le => word(SampleRoutine::Rgb16Le, 0x03E0, 5 + 5 - 8 + 12, 12),
            Rgba15Be | Bgra15Be => word(SampleRoutine::Rgb16Be, 0x03E0, 5 + 5 - 8 + 12, 12),
            Argb15Le | Abgr15Le => word(SampleRoutine::Rgb16Le, 0x07C0, 6 + 5 - 8 + 12, 12),
            Argb15Be | Abgr15Be => word(SampleRoutine::Rgb16Be, 0x07C0, 6 + 5 - 8 + 12, 12),
            Rgba12Le => word(SampleRoutine::Rgb16Le, 0x00F0, 4 + 4 - 8 + 9, 9),
            Rgba12Be => word(SampleRoutine::Rgb16Be, 0x00F0, 4 + 4 - 8 + 9, 9),
            Argb12Le => word(SampleRoutine::Rgb16Le, 0x0F00, 8 + 4 - 8 + 13, 13),
            Argb12Be => word(SampleRoutine::Rgb16Be, 0x0F00, 8 + 4 - 8 + 13, 13),

            // Few green levels, so sample the clock run-in twice as finely.
            Rgb8 => SampleLayout {
                routine: SampleRoutine::Rgb8,
                bytes_per_sample: 1,
                skip: 0,
                green_mask: 0x38,
                thresh: DEF_THR_LEVEL << (3 + 3 - 8 + 7),
                thresh_frac: 7,
                oversampling: 8,
            },
            Bgr8 => SampleLayout {
                routine: SampleRoutine::Rgb8,
                bytes_per_sample: 1,
                skip: 0,
                green_mask: 0x1C,
                thresh: DEF_THR_LEVEL << (2 + 3 - 8 + 7),
                thresh_frac: 7,
                oversampling: 8,
            },
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.name() == lower)
            .ok_or_else(|| SamplingError::UnknownPixelFormat(s.to_string()))
    }
}
