//! Segment command: compress the input, sample, and write the records.

use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, info_span};

use wavehmm_blocks::{BlockStructure, BreakpointArray, FixedBlocks};
use wavehmm_hmm::{Emissions, HmmConfig, HmmModel, RecordKinds, Records, Schedule, run_schedule};
use wavehmm_stats::IntegralArray;
use wavehmm_wavelet::{haar_breakpoint_weights, noise_std_estimate, scale_weights};

use crate::cli::SegmentArgs;
use crate::config::{ModelToml, WavehmmConfig};
use crate::convert::{self, BlockLayout, PointerWidth};
use crate::input::read_signal;
use crate::output::OutputFiles;

/// Settings shared by every block layout.
struct Plan<'a> {
    hmm: HmmConfig,
    model: &'a ModelToml,
    schedule: Schedule,
    kinds: RecordKinds,
    noise_var: f64,
}

/// Run the segmentation pipeline.
pub fn run(args: SegmentArgs) -> Result<()> {
    let _cmd = info_span!("segment").entered();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(input) = args.input {
        config.io.input = Some(input);
    }
    if let Some(prefix) = args.output_prefix {
        config.io.output_prefix = prefix;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.overwrite {
        config.io.overwrite = true;
    }

    // Validate everything before reading data.
    let hmm = convert::build_hmm_config(&config.model)?;
    let layout = convert::parse_block_layout(&config.compression)?;
    let kinds = convert::parse_record_kinds(&config.io.records)?;
    let schedule = convert::build_schedule(&config.sampling)?;
    let outputs = OutputFiles::new(
        config.io.output_prefix.clone(),
        config.io.output_suffix.clone(),
        config.io.overwrite,
    );
    outputs.check(kinds)?;

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let signal = read_signal(
        config.io.input.as_deref(),
        config.io.dimensions,
        config.io.size_hint,
    )?;
    let noise_var = match config.model.noise_variance {
        Some(v) => v,
        None => {
            let sd = noise_std_estimate(signal.coeffs())
                .context("cannot estimate noise, set [model].noise_variance")?;
            sd * sd
        }
    };
    info!(noise_var, "noise variance");

    let (mut weights, raw) = signal.into_parts();
    let stats = IntegralArray::new(raw).context("failed to build integral statistics")?;
    let len = stats.len();

    let plan = Plan {
        hmm,
        model: &config.model,
        schedule,
        kinds,
        noise_var,
    };
    let records = match layout {
        BlockLayout::Breakpoint(width) => {
            haar_breakpoint_weights(&mut weights)?;
            scale_weights(&mut weights, config.compression.weight_multiplier)
                .context("invalid [compression].weight_multiplier")?;
            match width {
                PointerWidth::U8 => {
                    let blocks: BreakpointArray<u8> = BreakpointArray::new(weights)?;
                    sample(Emissions::new(stats, blocks)?, &plan, &mut rng)?
                }
                PointerWidth::U16 => {
                    let blocks: BreakpointArray<u16> = BreakpointArray::new(weights)?;
                    sample(Emissions::new(stats, blocks)?, &plan, &mut rng)?
                }
                PointerWidth::U32 => {
                    let blocks: BreakpointArray<u32> = BreakpointArray::new(weights)?;
                    sample(Emissions::new(stats, blocks)?, &plan, &mut rng)?
                }
            }
        }
        BlockLayout::Uncompressed => {
            let blocks = FixedBlocks::uniform(len, 1)?;
            sample(Emissions::new(stats, blocks)?, &plan, &mut rng)?
        }
    };

    if kinds.marginals {
        let segmentation = records.max_margin_segmentation()?;
        info!(segments = segmentation.len(), "maximum marginal segmentation");
    }
    let written = outputs.write(&records)?;
    info!(files = written.len(), "segmentation complete");
    Ok(())
}

/// Reads the TOML configuration, or returns defaults without a path.
fn load_config(path: Option<&Path>) -> Result<WavehmmConfig> {
    let Some(path) = path else {
        return Ok(WavehmmConfig::default());
    };
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

/// Builds the model from automatic priors and runs the schedule.
fn sample<B: BlockStructure>(
    mut y: Emissions<B>,
    plan: &Plan<'_>,
    rng: &mut StdRng,
) -> Result<Records> {
    let prior = y
        .auto_prior(
            plan.model.prior_variance,
            plan.model.prior_probability,
            plan.noise_var,
        )
        .context("failed to derive automatic priors")?;
    info!(
        alpha = prior.alpha(),
        beta = prior.beta(),
        mu0 = prior.mu0(),
        nu = prior.nu(),
        "automatic prior"
    );

    let priors = vec![prior; plan.hmm.components()];
    let mut model = HmmModel::new(plan.hmm.clone(), y.nr_dim(), priors, rng)?;
    info!(
        positions = y.len(),
        dimensions = y.nr_dim(),
        states = model.nr_states(),
        schedule = %plan.schedule,
        "sampling"
    );

    let mut records = Records::new(y.len(), model.nr_states(), plan.kinds);
    run_schedule(&plan.schedule, &mut y, &mut model, &mut records, rng)
        .context("sampling failed")?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    /// Two levels, 300 positions each, with a small deterministic jitter.
    fn write_signal(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let mut text = String::new();
        for t in 0..600 {
            let level = if t < 300 { 0.0 } else { 8.0 };
            let jitter = ((t * 37) % 11) as f64 / 10.0 - 0.5;
            writeln!(text, "{}", level + jitter).unwrap();
        }
        let path = dir.path().join("signal.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn write_config(dir: &tempfile::TempDir, structure: &str) -> std::path::PathBuf {
        let text = format!(
            "seed = 3\n\n[io]\nrecords = [\"M\", \"S\", \"C\"]\n\n[model]\ncomponents = 2\n\n\
             [compression]\nstructure = \"{structure}\"\n\n[sampling]\nschedule = \"M 10 0 F 10 1\"\n"
        );
        let path = dir.path().join("wavehmm.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn args(dir: &tempfile::TempDir, config: std::path::PathBuf) -> SegmentArgs {
        SegmentArgs {
            config: Some(config),
            input: Some(write_signal(dir)),
            output_prefix: Some(format!("{}/out-", dir.path().display())),
            seed: None,
            overwrite: false,
        }
    }

    #[test]
    fn writes_requested_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "breakpoint");
        run(args(&dir, config)).unwrap();

        let marginals = std::fs::read_to_string(dir.path().join("out-marginals.csv")).unwrap();
        let mut covered = 0;
        for line in marginals.lines() {
            let fields: Vec<u64> = line.split('\t').map(|f| f.parse().unwrap()).collect();
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[1] + fields[2], 10);
            covered += fields[0];
        }
        assert_eq!(covered, 600);

        let sequences = std::fs::read_to_string(dir.path().join("out-sequences.csv")).unwrap();
        assert_eq!(sequences.lines().count(), 10);
        let compression =
            std::fs::read_to_string(dir.path().join("out-compression.csv")).unwrap();
        assert_eq!(compression.lines().count(), 10);
        assert!(!dir.path().join("out-blocks.csv").exists());
    }

    #[test]
    fn same_seed_same_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "breakpoint");
        run(args(&dir, config.clone())).unwrap();
        let first = std::fs::read_to_string(dir.path().join("out-sequences.csv")).unwrap();

        let mut again = args(&dir, config);
        again.overwrite = true;
        run(again).unwrap();
        let second = std::fs::read_to_string(dir.path().join("out-sequences.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn existing_output_aborts_before_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "none");
        std::fs::write(dir.path().join("out-compression.csv"), "keep").unwrap();
        let err = run(args(&dir, config)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!dir.path().join("out-marginals.csv").exists());
    }

    #[test]
    fn uncompressed_layout_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "none");
        run(args(&dir, config)).unwrap();
        let compression =
            std::fs::read_to_string(dir.path().join("out-compression.csv")).unwrap();
        assert!(compression.lines().all(|l| l == "1"));
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(args(&dir, dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
