use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use vbislice::structs::sliced::{SLICED_DATA_SIZE, Sliced};
use vbisliced_macros::ToBytes;

use crate::byteorder::WriteBytesLe;
use crate::cli::command::OutputFormat;
use crate::join_bytes_le;
use crate::timestamp::frame_time;

pub const BINARY_MAGIC: [u8; 4] = *b"VBIS";
pub const BINARY_VERSION: u16 = 1;

/// Leads the records of one field pair in the binary stream.
#[derive(ToBytes)]
struct FrameHeader {
    frame: u64,
    count: u32,
}

#[derive(ToBytes)]
struct BinaryRecord {
    id: u32,
    line: u32,
    data: [u8; SLICED_DATA_SIZE],
}

#[derive(Serialize)]
struct FrameDocument<'a> {
    frame: u64,
    time: String,
    lines: Vec<LineDocument<'a>>,
}

#[derive(Serialize)]
struct LineDocument<'a> {
    line: u32,
    service: &'a str,
    data: String,
}

/// Writes sliced records of consecutive field pairs.
///
/// YAML output is one document per field pair that carried data. Binary
/// output starts with a header of magic, version and scanning, followed by
/// a frame header and the fixed size records of every field pair, all
/// little endian.
pub struct SlicedWriter<W: Write> {
    out: W,
    format: OutputFormat,
    scanning: u32,
    header_written: bool,
}

impl SlicedWriter<Box<dyn Write>> {
    /// Writes to `path`, or to stdout for `None` and "-".
    pub fn create(path: Option<&Path>, format: OutputFormat, scanning: u32) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(path) if path.to_string_lossy() != "-" => {
                Box::new(BufWriter::new(File::create(path)?))
            }
            _ => Box::new(BufWriter::new(io::stdout().lock())),
        };

        Ok(Self::new(out, format, scanning))
    }
}

impl<W: Write> SlicedWriter<W> {
    pub fn new(out: W, format: OutputFormat, scanning: u32) -> Self {
        Self {
            out,
            format,
            scanning,
            header_written: false,
        }
    }

    pub fn write_frame(&mut self, frame: u64, sliced: &[Sliced]) -> Result<()> {
        match self.format {
            OutputFormat::Yaml => self.write_yaml(frame, sliced),
            OutputFormat::Binary => self.write_binary(frame, sliced),
        }
    }

    pub fn finish(mut self) -> Result<W> {
        if self.format == OutputFormat::Binary && !self.header_written {
            self.write_binary_header()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_yaml(&mut self, frame: u64, sliced: &[Sliced]) -> Result<()> {
        if sliced.is_empty() {
            return Ok(());
        }

        let lines = sliced
            .iter()
            .map(|record| LineDocument {
                line: record.line,
                service: record.service().map_or("unknown", |s| s.short_name()),
                data: record.payload().iter().map(|b| format!("{b:02x}")).collect(),
            })
            .collect();

        let document = FrameDocument {
            frame,
            time: frame_time(frame, self.scanning),
            lines,
        };

        writeln!(self.out, "---")?;
        self.out
            .write_all(serde_yaml_ng::to_string(&document)?.as_bytes())?;
        Ok(())
    }

    fn write_binary_header(&mut self) -> Result<()> {
        let header = join_bytes_le!(BINARY_MAGIC, BINARY_VERSION, self.scanning as u16);
        self.out.write_all(&header)?;
        self.header_written = true;
        Ok(())
    }

    fn write_binary(&mut self, frame: u64, sliced: &[Sliced]) -> Result<()> {
        if !self.header_written {
            self.write_binary_header()?;
        }

        let mut bytes = Vec::with_capacity(12 + sliced.len() * (8 + SLICED_DATA_SIZE));
        FrameHeader {
            frame,
            count: sliced.len() as u32,
        }
        .write_le(&mut bytes);

        for record in sliced {
            BinaryRecord {
                id: record.id.0,
                line: record.line,
                data: record.data,
            }
            .write_le(&mut bytes);
        }

        self.out.write_all(&bytes)?;
        Ok(())
    }
}
