//! Per-format access to the signal component of raw VBI samples.
//!
//! Readers are zero-sized or near zero-sized types. Code generic over
//! [`SampleReader`] is instantiated once per [`SampleRoutine`] and
//! [`dispatch`] picks the instance, so inner loops never branch on the
//! pixel format.

use crate::structs::pixel_format::{SampleLayout, SampleRoutine};

pub(crate) trait SampleReader: Copy {
    /// Signal level of sample `index` of `row`.
    fn read(self, row: &[u8], index: usize) -> i32;
}

/// Reads one byte out of every `BPS` byte sample.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteReader<const BPS: usize> {
    skip: usize,
}

impl<const BPS: usize> SampleReader for ByteReader<BPS> {
    #[inline(always)]
    fn read(self, row: &[u8], index: usize) -> i32 {
        row[index * BPS + self.skip] as i32
    }
}

/// Masks the signal field out of a 16-bit word.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WordReader<const BIG_ENDIAN: bool> {
    mask: u32,
}

impl<const BIG_ENDIAN: bool> SampleReader for WordReader<BIG_ENDIAN> {
    #[inline(always)]
    fn read(self, row: &[u8], index: usize) -> i32 {
        let bytes = [row[index * 2], row[index * 2 + 1]];
        let word = if BIG_ENDIAN {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        };

        (word as u32 & self.mask) as i32
    }
}

/// Masks the signal field out of a packed 8-bit sample.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackedByteReader {
    mask: u32,
}

impl SampleReader for PackedByteReader {
    #[inline(always)]
    fn read(self, row: &[u8], index: usize) -> i32 {
        (row[index] as u32 & self.mask) as i32
    }
}

/// Something generic over the sample reader, run by [`dispatch`].
pub(crate) trait SampleVisitor {
    type Output;

    fn visit<R: SampleReader>(self, reader: R) -> Self::Output;
}

pub(crate) fn dispatch<V: SampleVisitor>(layout: &SampleLayout, visitor: V) -> V::Output {
    let (skip, mask) = (layout.skip, layout.green_mask);

    match layout.routine {
        SampleRoutine::Y8 => visitor.visit(ByteReader::<1> { skip }),
        SampleRoutine::Yuyv => visitor.visit(ByteReader::<2> { skip }),
        SampleRoutine::Rgb24 => visitor.visit(ByteReader::<3> { skip }),
        SampleRoutine::Rgba32 => visitor.visit(ByteReader::<4> { skip }),
        SampleRoutine::Rgb16Le => visitor.visit(WordReader::<false> { mask }),
        SampleRoutine::Rgb16Be => visitor.visit(WordReader::<true> { mask }),
        SampleRoutine::Rgb8 => visitor.visit(PackedByteReader { mask }),
    }
}

/// Stores an 8-bit `level` as sample `index` of `row`, scaled into the
/// signal field. Other components are set to their neutral value.
pub(crate) fn write_sample(layout: &SampleLayout, row: &mut [u8], index: usize, level: u8) {
    let bps = layout.bytes_per_sample;
    let sample = &mut row[index * bps..(index + 1) * bps];
    let mask = layout.green_mask;

    match layout.routine {
        SampleRoutine::Y8 | SampleRoutine::Yuyv => {
            // Neutral chroma for packed YUV.
            sample.fill(0x80);
            sample[layout.skip] = level;
        }
        SampleRoutine::Rgb24 | SampleRoutine::Rgba32 => {
            sample.fill(0);
            sample[layout.skip] = level;
        }
        SampleRoutine::Rgb16Le | SampleRoutine::Rgb16Be => {
            let word = scale(level, mask) as u16;
            let bytes = if layout.routine == SampleRoutine::Rgb16Be {
                word.to_be_bytes()
            } else {
                word.to_le_bytes()
            };
            sample.copy_from_slice(&bytes);
        }
        SampleRoutine::Rgb8 => sample[0] = scale(level, mask) as u8,
    }
}

/// Scales an 8-bit level to the field selected by `mask`.
fn scale(level: u8, mask: u32) -> u32 {
    let lsb = mask & mask.wrapping_neg();
    let full_scale = mask + lsb;
    ((level as u32 * full_scale) >> 8) & mask
}
