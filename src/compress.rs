//! Compress command: report how strongly the wavelet blocks compress the input.

use std::fmt;

use anyhow::{Context, Result, bail};
use tracing::info_span;

use wavehmm_blocks::{BlockStructure, BreakpointArray, collect_blocks, universal_threshold};
use wavehmm_wavelet::{MaxletOutput, haar_breakpoint_weights, noise_std_estimate, scale_weights};

use crate::cli::CompressArgs;
use crate::input::read_signal;

/// Block statistics at one threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub positions: usize,
    pub avg_weight: f64,
    pub noise_sd: Option<f64>,
    pub threshold: f64,
    pub blocks: usize,
    pub max_block: usize,
}

impl CompressionReport {
    /// Positions per block.
    pub fn ratio(&self) -> f64 {
        self.positions as f64 / self.blocks as f64
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "positions\t{}", self.positions)?;
        writeln!(f, "avg_weight\t{}", self.avg_weight)?;
        match self.noise_sd {
            Some(sd) => writeln!(f, "noise_sd\t{sd}")?,
            None => writeln!(f, "noise_sd\tNA")?,
        }
        writeln!(f, "threshold\t{}", self.threshold)?;
        writeln!(f, "blocks\t{}", self.blocks)?;
        writeln!(f, "max_block\t{}", self.max_block)?;
        writeln!(f, "compression\t{}", self.ratio())
    }
}

/// Run the compression report and print it to stdout.
pub fn run(args: CompressArgs) -> Result<()> {
    let _cmd = info_span!("compress").entered();
    let signal = read_signal(args.input.as_deref(), args.dimensions, 0)?;
    let report = report(signal, &args)?;
    print!("{report}");
    Ok(())
}

/// Builds breakpoint blocks and measures them at the requested threshold.
///
/// Without an explicit threshold the universal threshold is used, with the
/// given variance or the squared noise estimate.
pub fn report(signal: MaxletOutput, args: &CompressArgs) -> Result<CompressionReport> {
    let noise_sd = noise_std_estimate(signal.coeffs()).ok();
    let (mut weights, _) = signal.into_parts();
    let positions = weights.len();
    haar_breakpoint_weights(&mut weights)?;
    scale_weights(&mut weights, args.weight_multiplier).context("invalid weight multiplier")?;

    let threshold = match (args.threshold, args.variance, noise_sd) {
        (Some(t), _, _) => t,
        (None, Some(var), _) => universal_threshold(positions, var)?,
        (None, None, Some(sd)) if sd > 0.0 => universal_threshold(positions, sd * sd)?,
        _ => bail!("cannot estimate the noise level, pass --variance or --threshold"),
    };

    let mut blocks: BreakpointArray<u32> = BreakpointArray::new(weights)?;
    blocks.set_threshold(threshold)?;
    let ranges = collect_blocks(&mut blocks);
    Ok(CompressionReport {
        positions,
        avg_weight: blocks.avg_weight().unwrap_or(0.0),
        noise_sd,
        threshold,
        blocks: ranges.len(),
        max_block: ranges.iter().map(|r| r.len()).max().unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavehmm_wavelet::maxlet_from_reader;

    fn args(threshold: Option<f64>, variance: Option<f64>) -> CompressArgs {
        CompressArgs {
            input: None,
            dimensions: 1,
            threshold,
            variance,
            weight_multiplier: 1.0,
        }
    }

    fn signal(text: &str) -> MaxletOutput {
        maxlet_from_reader(text.as_bytes(), 1, 0).unwrap()
    }

    #[test]
    fn constant_signal_is_one_block() {
        let r = report(signal("3 3 3 3 3 3 3 3"), &args(Some(0.5), None)).unwrap();
        assert_eq!(r.positions, 8);
        assert_eq!(r.blocks, 1);
        assert_eq!(r.max_block, 8);
        assert_eq!(r.ratio(), 8.0);
    }

    #[test]
    fn step_is_split() {
        let r = report(signal("0 0 0 0 9 9 9 9"), &args(Some(1.0), None)).unwrap();
        assert_eq!(r.blocks, 2);
        assert_eq!(r.max_block, 4);
    }

    #[test]
    fn constant_signal_needs_a_variance() {
        let err = report(signal("1 1 1 1"), &args(None, None)).unwrap_err();
        assert!(err.to_string().contains("--variance"));
        let r = report(signal("1 1 1 1"), &args(None, Some(0.1))).unwrap();
        assert_eq!(r.blocks, 1);
    }

    #[test]
    fn report_lists_fields() {
        let r = report(signal("0 0 0 0 9 9 9 9"), &args(Some(1.0), None)).unwrap();
        let text = r.to_string();
        assert!(text.starts_with("positions\t8\n"));
        assert!(text.contains("blocks\t2\n"));
        assert!(text.ends_with("compression\t4\n"));
    }
}
