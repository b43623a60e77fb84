use std::path::PathBuf;

use serde::Deserialize;

/// Top-level wavehmm configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WavehmmConfig {
    /// Global RNG seed; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Input and output settings.
    #[serde(default)]
    pub io: IoToml,

    /// HMM and prior settings.
    #[serde(default)]
    pub model: ModelToml,

    /// Block structure settings.
    #[serde(default)]
    pub compression: CompressionToml,

    /// Sampling schedule.
    #[serde(default)]
    pub sampling: SamplingToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    /// Input file; stdin when absent.
    pub input: Option<PathBuf>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Expected number of positions, only used to pre-size buffers.
    #[serde(default)]
    pub size_hint: usize,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    /// Record kinds to write, by name or single letter.
    #[serde(default = "default_records")]
    pub records: Vec<String>,
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            input: None,
            dimensions: default_dimensions(),
            size_hint: 0,
            output_prefix: default_output_prefix(),
            output_suffix: default_output_suffix(),
            records: default_records(),
            overwrite: false,
        }
    }
}

fn default_dimensions() -> usize {
    1
}
fn default_output_prefix() -> String {
    "wavehmm-".to_string()
}
fn default_output_suffix() -> String {
    ".csv".to_string()
}
fn default_records() -> Vec<String> {
    vec!["marginals".to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    /// Emission components per dimension.
    #[serde(default = "default_components")]
    pub components: usize,
    #[serde(default = "default_true")]
    pub self_transitions: bool,
    #[serde(default = "default_alpha")]
    pub transition_alpha: f64,
    #[serde(default = "default_alpha")]
    pub self_transition_alpha: f64,
    #[serde(default = "default_alpha")]
    pub initial_alpha: f64,
    #[serde(default)]
    pub min_block_size: usize,
    /// Automatic prior: variance scale of the emission means.
    #[serde(default = "default_prior_variance")]
    pub prior_variance: f64,
    /// Automatic prior: probability mass within `prior_variance`.
    #[serde(default = "default_prior_probability")]
    pub prior_probability: f64,
    /// Fallback noise variance; estimated from the data when absent.
    #[serde(default)]
    pub noise_variance: Option<f64>,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            components: default_components(),
            self_transitions: true,
            transition_alpha: default_alpha(),
            self_transition_alpha: default_alpha(),
            initial_alpha: default_alpha(),
            min_block_size: 0,
            prior_variance: default_prior_variance(),
            prior_probability: default_prior_probability(),
            noise_variance: None,
        }
    }
}

fn default_components() -> usize {
    3
}
fn default_true() -> bool {
    true
}
fn default_alpha() -> f64 {
    0.5
}
fn default_prior_variance() -> f64 {
    0.2
}
fn default_prior_probability() -> f64 {
    0.9
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressionToml {
    /// `"breakpoint"` for wavelet blocks, `"none"` for one block per position.
    #[serde(default = "default_structure")]
    pub structure: String,
    /// Jump pointer width: `"u8"`, `"u16"` or `"u32"`.
    #[serde(default = "default_pointer_width")]
    pub pointer_width: String,
    #[serde(default = "default_weight_multiplier")]
    pub weight_multiplier: f64,
}

impl Default for CompressionToml {
    fn default() -> Self {
        Self {
            structure: default_structure(),
            pointer_width: default_pointer_width(),
            weight_multiplier: default_weight_multiplier(),
        }
    }
}

fn default_structure() -> String {
    "breakpoint".to_string()
}
fn default_pointer_width() -> String {
    "u16".to_string()
}
fn default_weight_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingToml {
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for SamplingToml {
    fn default() -> Self {
        Self {
            schedule: default_schedule(),
        }
    }
}

fn default_schedule() -> String {
    wavehmm_hmm::DEFAULT_SCHEDULE.to_string()
}
