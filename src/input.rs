use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use anyhow::Result;

/// Reads raw VBI field pairs from a file or from stdin.
pub struct InputReader {
    reader: Box<dyn Read>,
}

impl InputReader {
    /// Use "-" for stdin.
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let reader: Box<dyn Read> = if input_path.as_ref().to_string_lossy() == "-" {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(File::open(input_path)?))
        };

        Ok(Self { reader })
    }

    /// Fills `frame` completely.
    ///
    /// Returns the number of bytes read, which is less than the frame size
    /// only at the end of input.
    pub fn read_frame(&mut self, frame: &mut [u8]) -> Result<usize> {
        let mut filled = 0;

        while filled < frame.len() {
            match self.reader.read(&mut frame[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(filled)
    }

    /// Calls `callback` with every complete frame of `frame_size` bytes and
    /// its index. The callback returns Ok(false) to stop early.
    ///
    /// Returns the number of frames read. A trailing partial frame is
    /// reported and dropped.
    pub fn process_frames<F>(&mut self, frame_size: usize, mut callback: F) -> Result<u64>
    where
        F: FnMut(u64, &[u8]) -> Result<bool>,
    {
        let mut frame = vec![0u8; frame_size];
        let mut index = 0;

        loop {
            let read = self.read_frame(&mut frame)?;
            if read == 0 {
                break;
            }

            if read < frame_size {
                log::warn!("Dropping {read} trailing bytes, a field pair is {frame_size} bytes");
                break;
            }

            let proceed = callback(index, &frame)?;
            index += 1;
            if !proceed {
                break;
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_trailing_bytes() -> Result<()> {
        let data: Vec<u8> = (0..25).collect();
        let mut reader = InputReader {
            reader: Box::new(io::Cursor::new(data)),
        };

        let mut firsts = Vec::new();
        let count = reader.process_frames(10, |index, frame| {
            assert_eq!(frame.len(), 10);
            firsts.push((index, frame[0]));
            Ok(true)
        })?;

        assert_eq!(count, 2);
        assert_eq!(firsts, [(0, 0), (1, 10)]);
        Ok(())
    }
}
