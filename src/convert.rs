//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use wavehmm_hmm::{HmmConfig, RecordKinds, Schedule};

use crate::config::{CompressionToml, ModelToml, SamplingToml};

/// Integer width of the jump pointers in a breakpoint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerWidth {
    U8,
    U16,
    U32,
}

/// How positions are grouped into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
    /// Wavelet breakpoint blocks with the given pointer width.
    Breakpoint(PointerWidth),
    /// One block per position.
    Uncompressed,
}

/// Parses a pointer width name into the corresponding enum variant.
pub fn parse_pointer_width(s: &str) -> Result<PointerWidth> {
    match s.to_lowercase().as_str() {
        "u8" => Ok(PointerWidth::U8),
        "u16" => Ok(PointerWidth::U16),
        "u32" => Ok(PointerWidth::U32),
        other => bail!("unknown pointer width: {other:?}"),
    }
}

/// Builds the [`BlockLayout`] from the TOML compression configuration.
pub fn parse_block_layout(compression: &CompressionToml) -> Result<BlockLayout> {
    match compression.structure.to_lowercase().as_str() {
        "breakpoint" | "b" => Ok(BlockLayout::Breakpoint(parse_pointer_width(
            &compression.pointer_width,
        )?)),
        "none" => Ok(BlockLayout::Uncompressed),
        other => bail!("unknown block structure: {other:?}"),
    }
}

/// Parses record kind names (or their single-letter forms) into
/// [`RecordKinds`]. An empty list records nothing.
pub fn parse_record_kinds(names: &[String]) -> Result<RecordKinds> {
    let mut kinds = RecordKinds {
        marginals: false,
        sequences: false,
        parameters: false,
        blocks: false,
        compression: false,
        segments: false,
    };
    for name in names {
        match name.as_str() {
            "M" | "marginals" => kinds.marginals = true,
            "S" | "sequences" => kinds.sequences = true,
            "P" | "parameters" => kinds.parameters = true,
            "B" | "blocks" => kinds.blocks = true,
            "C" | "compression" => kinds.compression = true,
            "G" | "segments" => kinds.segments = true,
            other => bail!("unknown record kind: {other:?}"),
        }
    }
    Ok(kinds)
}

/// Builds a validated [`HmmConfig`] from the TOML model configuration.
pub fn build_hmm_config(model: &ModelToml) -> Result<HmmConfig> {
    let cfg = HmmConfig::new()
        .with_components(model.components)
        .with_self_transitions(model.self_transitions)
        .with_transition_alpha(model.transition_alpha)
        .with_self_transition_alpha(model.self_transition_alpha)
        .with_initial_alpha(model.initial_alpha)
        .with_min_block_size(model.min_block_size);
    cfg.validate().context("invalid [model] configuration")?;
    Ok(cfg)
}

/// Parses the sampling schedule.
pub fn build_schedule(sampling: &SamplingToml) -> Result<Schedule> {
    sampling
        .schedule
        .parse()
        .with_context(|| format!("invalid sampling schedule {:?}", sampling.schedule))
}
