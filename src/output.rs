//! Writing [`Records`] to `<prefix><kind><suffix>` text files.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::info;

use wavehmm_hmm::{RecordKinds, Records};

/// Output file naming and overwrite policy.
#[derive(Debug, Clone)]
pub struct OutputFiles {
    prefix: String,
    suffix: String,
    overwrite: bool,
}

impl OutputFiles {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, overwrite: bool) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            overwrite,
        }
    }

    /// Path of the file for record `kind`.
    pub fn path(&self, kind: &str) -> PathBuf {
        PathBuf::from(format!("{}{kind}{}", self.prefix, self.suffix))
    }

    /// Fails if an enabled record would overwrite an existing file while
    /// overwriting is not allowed. Run before sampling.
    pub fn check(&self, kinds: RecordKinds) -> Result<()> {
        if self.overwrite {
            return Ok(());
        }
        for kind in enabled(kinds) {
            let path = self.path(kind);
            if path.exists() {
                bail!(
                    "output file {} already exists, set overwrite to replace it",
                    path.display()
                );
            }
        }
        Ok(())
    }

    /// Writes every enabled record and returns the written paths.
    pub fn write(&self, records: &Records) -> Result<Vec<PathBuf>> {
        self.check(records.kinds())?;
        let kinds = records.kinds();
        let mut written = Vec::new();

        if kinds.marginals {
            let rows = records
                .marginals()
                .rows()
                .context("marginals are incomplete")?;
            let lines = rows.iter().map(|(size, counts)| {
                let mut line = size.to_string();
                for c in counts {
                    line.push('\t');
                    line.push_str(&c.to_string());
                }
                line
            });
            written.push(self.write_lines("marginals", lines)?);
        }
        if kinds.sequences {
            let lines = records.sequences().iter().map(|seq| join(seq, " "));
            written.push(self.write_lines("sequences", lines)?);
        }
        if kinds.parameters {
            let lines = records.parameters().iter().map(|theta| join(theta, "\t"));
            written.push(self.write_lines("parameters", lines)?);
        }
        if kinds.blocks {
            let lines = records.blocks().iter().map(|sizes| join(sizes, " "));
            written.push(self.write_lines("blocks", lines)?);
        }
        if kinds.compression {
            let lines = records.compression().iter().map(|ratio| ratio.to_string());
            written.push(self.write_lines("compression", lines)?);
        }
        if kinds.segments {
            let lines = records
                .segment_stats()
                .iter()
                .map(|(segments, size)| format!("{segments}\t{size}"));
            written.push(self.write_lines("segments", lines)?);
        }
        Ok(written)
    }

    fn write_lines(&self, kind: &str, lines: impl Iterator<Item = String>) -> Result<PathBuf> {
        let path = self.path(kind);
        let file = File::create(&path)
            .with_context(|| format!("cannot write to file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for line in lines {
            writeln!(out, "{line}")
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        out.flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), kind, "record written");
        Ok(path)
    }
}

fn enabled(kinds: RecordKinds) -> impl Iterator<Item = &'static str> {
    [
        (kinds.marginals, "marginals"),
        (kinds.sequences, "sequences"),
        (kinds.parameters, "parameters"),
        (kinds.blocks, "blocks"),
        (kinds.compression, "compression"),
        (kinds.segments, "segments"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
}

fn join<T: Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
