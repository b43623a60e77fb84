//! Reading the input signal through the streaming maxlet transform.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use wavehmm_wavelet::{MaxletOutput, maxlet_from_reader};

/// Reads whitespace-separated values from `path`, or stdin when `None`,
/// interleaved across `nr_dim` dimensions.
pub fn read_signal(path: Option<&Path>, nr_dim: usize, size_hint: usize) -> Result<MaxletOutput> {
    let output = match path {
        Some(path) => {
            info!(path = %path.display(), "reading input");
            let file = File::open(path)
                .with_context(|| format!("cannot read input file: {}", path.display()))?;
            maxlet_from_reader(BufReader::new(file), nr_dim, size_hint)
                .with_context(|| format!("failed to parse input: {}", path.display()))?
        }
        None => {
            info!("reading input from stdin");
            maxlet_from_reader(io::stdin().lock(), nr_dim, size_hint)
                .context("failed to parse input from stdin")?
        }
    };
    info!(
        positions = output.len(),
        dimensions = nr_dim,
        "input transformed"
    );
    Ok(output)
}
