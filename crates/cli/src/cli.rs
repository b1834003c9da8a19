//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Skyfall - RedVox smartphone recording processing pipeline
#[derive(Parser, Debug)]
#[command(
    name = "skyfall",
    author,
    version,
    about = "Skyfall RedVox processing pipeline",
    long_about = "Turns a RedVox smartphone recording into plot-ready products.\n\n\
                  Computes time-frequency meshes for every waveform channel, barometric \n\
                  height, a local-tangent-plane trajectory and the merged clock \n\
                  synchronization series. A failing channel never aborts the run."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SKYFALL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SKYFALL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a dataset into a run bundle
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and dataset information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "run.toml", env = "SKYFALL_CONFIG")]
    pub config: PathBuf,

    /// Path to the dataset (JSON)
    #[arg(short, long, env = "SKYFALL_DATASET")]
    pub dataset: PathBuf,

    /// Write the run bundle as JSON to this path
    #[arg(short, long, env = "SKYFALL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Process channels in parallel
    #[arg(long, env = "SKYFALL_CONCURRENT")]
    pub concurrent: bool,

    /// Override the transform kind from configuration
    #[arg(long, value_enum)]
    pub transform: Option<TransformArg>,

    /// Override the 1/N-octave order from configuration
    #[arg(long)]
    pub order: Option<u32>,

    /// Validate configuration and dataset, then exit without processing
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SKYFALL_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "run.toml", env = "SKYFALL_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "run.toml", env = "SKYFALL_CONFIG")]
    pub config: PathBuf,

    /// Also summarize the channels of this dataset
    #[arg(short, long, env = "SKYFALL_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Transform kind override
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TransformArg {
    /// Constant-Q Gabor wavelet
    Wavelet,
    /// Short-time Fourier transform
    Stft,
}

impl From<TransformArg> for contracts::TransformType {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Wavelet => Self::Wavelet,
            TransformArg::Stft => Self::Stft,
        }
    }
}
