use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

use crate::config::SamplingConfig;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = concat!(env!("CARGO_PKG_VERSION"), " (vbislice ", env!("VBISLICE_VERSION"), ", ", env!("BUILD_TIMESTAMP"), ")"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for decoding data services from raw VBI captures",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat rejected services as fatal errors.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode sliced data from a raw VBI dump.
    Decode(DecodeArgs),

    /// List known services and whether the sampling can carry them.
    Services(ServicesArgs),

    /// Write a raw VBI dump with test data for the given services.
    Synth(SynthArgs),
}

#[derive(Debug, Args)]
pub struct SamplingArgs {
    /// YAML file with sampling parameters.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Video standard by number of lines, 625 or 525.
    #[arg(long, value_name = "LINES")]
    pub standard: Option<u32>,

    /// Sample format of the raw lines, e.g. yuv420 or rgba32-le.
    #[arg(long, value_name = "FORMAT")]
    pub pixel_format: Option<String>,

    /// Lines of both fields alternate in the dump.
    #[arg(long)]
    pub interlaced: bool,

    /// How sure the decoder must be that a service fits the sampling (0-2).
    #[arg(long, value_name = "LEVEL", default_value_t = 1)]
    pub strictness: u32,
}

impl SamplingArgs {
    /// Sampling configuration with command-line flags applied on top of
    /// the configuration file.
    pub fn sampling_config(&self) -> anyhow::Result<SamplingConfig> {
        let file = match &self.config {
            Some(path) => SamplingConfig::load(path)?,
            None => SamplingConfig::default(),
        };

        Ok(file.merge(SamplingConfig {
            standard: self.standard,
            pixel_format: self.pixel_format.clone(),
            interlaced: self.interlaced.then_some(true),
            ..Default::default()
        }))
    }
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Raw VBI dump (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Comma separated services to decode.
    #[arg(long, value_name = "LIST", default_value = "all")]
    pub services: String,

    /// Output format of sliced records.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Output file, stdout if omitted.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ServicesArgs {
    #[command(flatten)]
    pub sampling: SamplingArgs,
}

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Raw VBI dump to write (use "-" for stdout).
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Comma separated services to render.
    #[arg(long, value_name = "LIST", default_value = "all")]
    pub services: String,

    /// Number of field pairs.
    #[arg(long, value_name = "N", default_value_t = 25)]
    pub frames: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// One YAML document per field pair with data.
    Yaml,
    /// Fixed size little-endian records.
    Binary,
}
