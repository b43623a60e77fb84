//! Gibbs sampling loop.

use tracing::{debug, warn};
use wavehmm_blocks::BlockStructure;

use crate::emissions::Emissions;
use crate::error::HmmError;
use crate::model::HmmModel;
use crate::records::Recorder;
use crate::sampler::{SamplingMethod, StateSequence};

/// Settings of one run of Gibbs iterations.
///
/// # Example
///
/// ```
/// use wavehmm_hmm::{SamplingConfig, SamplingMethod};
///
/// let run = SamplingConfig::new(SamplingMethod::ForwardBackward, 300, 3)
///     .with_dynamic(false);
/// assert!(!run.records_nothing());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingConfig {
    method: SamplingMethod,
    iterations: usize,
    thinning: usize,
    dynamic: bool,
}

impl SamplingConfig {
    /// Runs `iterations` iterations with `method`, recording every
    /// `thinning`-th one (never if `thinning == 0`). Blocks are dynamic by
    /// default.
    pub fn new(method: SamplingMethod, iterations: usize, thinning: usize) -> Self {
        Self {
            method,
            iterations,
            thinning,
            dynamic: true,
        }
    }

    /// Whether blocks are recomputed from the current emission parameters
    /// before every iteration.
    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    // --- Accessors ---

    /// State sampling method.
    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    /// Number of iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Recording interval.
    pub fn thinning(&self) -> usize {
        self.thinning
    }

    /// Whether blocks are recomputed each iteration.
    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    /// Returns `true` if no iteration of this run will be recorded.
    pub fn records_nothing(&self) -> bool {
        self.thinning == 0 || self.thinning > self.iterations
    }

    /// Whether the zero-based iteration `i` is recorded.
    pub fn is_recorded(&self, i: usize) -> bool {
        self.thinning > 0 && (i + 1) % self.thinning == 0
    }
}

/// Runs Gibbs iterations and returns the last sampled state sequence.
///
/// Each iteration optionally recomputes the blocks from the current emission
/// variances, samples the states (which fills the posteriors), then redraws
/// emissions, initial distribution and transitions and resets the
/// posteriors. Recorded iterations pass their blocks and the new emission
/// parameters to `recorder`.
///
/// # Errors
///
/// Any error aborts the run.
#[tracing::instrument(skip_all, fields(method = ?sampling.method(), iterations = sampling.iterations()))]
pub fn sample_hmm<B, R>(
    y: &mut Emissions<B>,
    model: &mut HmmModel,
    sampling: &SamplingConfig,
    recorder: &mut R,
    rng: &mut impl rand::Rng,
) -> Result<StateSequence, HmmError>
where
    B: BlockStructure,
    R: Recorder + ?Sized,
{
    if sampling.records_nothing() {
        warn!(
            thinning = sampling.thinning(),
            iterations = sampling.iterations(),
            "no output will be recorded for this run"
        );
    }

    let mut q = StateSequence::new();
    for i in 0..sampling.iterations() {
        if sampling.dynamic() {
            y.create_blocks_for(model.theta())?;
        }
        let record = sampling.is_recorded(i);
        q.sample(sampling.method(), y, model, recorder, record, rng)?;
        model.sample_parameters(rng)?;
        if record {
            recorder.record_theta(model.theta());
        }
        debug!(
            iteration = i,
            blocks = q.len(),
            min_variance = model.theta().threshold_value(),
            "iteration complete"
        );
    }
    Ok(q)
}
