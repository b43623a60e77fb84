use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bayesian segmentation of long numeric signals.
#[derive(Parser)]
#[command(
    name = "wavehmm",
    version,
    about = "Bayesian HMM segmentation on wavelet-compressed blocks"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Sample state sequences and write the requested records.
    Segment(SegmentArgs),
    /// Report the block structure the wavelet compression produces.
    Compress(CompressArgs),
}

/// Arguments for the `segment` subcommand.
#[derive(clap::Args)]
pub struct SegmentArgs {
    /// Path to TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override input path from config (whitespace-separated numbers).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override output file prefix from config.
    #[arg(short, long)]
    pub output_prefix: Option<String>,

    /// Override RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Allow existing output files to be overwritten.
    #[arg(short = 'w', long)]
    pub overwrite: bool,
}

/// Arguments for the `compress` subcommand.
#[derive(clap::Args)]
pub struct CompressArgs {
    /// Path to input file (whitespace-separated numbers); stdin if omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Number of interleaved data dimensions.
    #[arg(short, long, default_value_t = 1)]
    pub dimensions: usize,

    /// Breakpoint weight threshold.
    #[arg(short, long, conflicts_with = "variance")]
    pub threshold: Option<f64>,

    /// Noise variance for the universal threshold; estimated from the
    /// finest wavelet coefficients when neither this nor `--threshold` is
    /// given.
    #[arg(long)]
    pub variance: Option<f64>,

    /// Factor applied to all breakpoint weights.
    #[arg(short = 'm', long, default_value_t = 1.0)]
    pub weight_multiplier: f64,
}
