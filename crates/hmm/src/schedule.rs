//! Sampling schedules such as `"M 500 0 S P F 200 0 F 300 3"`.
//!
//! | Token | Effect |
//! |-------|--------|
//! | `M n t` | `n` mixture iterations, record every `t`-th (never if 0) |
//! | `F n t` | `n` forward-backward iterations, record every `t`-th |
//! | `S` | fix the blocks at the current emission variances |
//! | `D` | recompute blocks every iteration (the initial mode) |
//! | `P` | redraw all parameters from their priors before the next step |
//!
//! Parameters are drawn from their priors before the first step.

use std::fmt;
use std::str::FromStr;

use tracing::info;
use wavehmm_blocks::BlockStructure;

use crate::driver::{SamplingConfig, sample_hmm};
use crate::emissions::Emissions;
use crate::error::HmmError;
use crate::model::HmmModel;
use crate::records::Recorder;
use crate::sampler::{SamplingMethod, StateSequence};

/// Default schedule: mixture burn-in, then forward-backward on static
/// blocks, then recorded forward-backward iterations.
pub const DEFAULT_SCHEDULE: &str = "M 500 0 S P F 200 0 F 300 3";

/// One step of a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStep {
    /// A run of Gibbs iterations.
    Run {
        /// State sampling method.
        method: SamplingMethod,
        /// Number of iterations.
        iterations: usize,
        /// Recording interval, 0 for none.
        thinning: usize,
    },
    /// Freeze the block structure.
    Static,
    /// Recompute blocks every iteration.
    Dynamic,
    /// Redraw parameters from the priors.
    SamplePrior,
}

/// Parsed sequence of sampling steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    steps: Vec<ScheduleStep>,
}

impl Schedule {
    /// Builds a schedule from explicit steps.
    pub fn new(steps: Vec<ScheduleStep>) -> Self {
        Self { steps }
    }

    /// The steps in order.
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    /// Total number of Gibbs iterations.
    pub fn total_iterations(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s {
                ScheduleStep::Run { iterations, .. } => *iterations,
                _ => 0,
            })
            .sum()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(vec![
            ScheduleStep::Run {
                method: SamplingMethod::Mixture,
                iterations: 500,
                thinning: 0,
            },
            ScheduleStep::Static,
            ScheduleStep::SamplePrior,
            ScheduleStep::Run {
                method: SamplingMethod::ForwardBackward,
                iterations: 200,
                thinning: 0,
            },
            ScheduleStep::Run {
                method: SamplingMethod::ForwardBackward,
                iterations: 300,
                thinning: 3,
            },
        ])
    }
}

impl FromStr for Schedule {
    type Err = HmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(HmmError::InvalidSchedule {
                position: 0,
                token: String::new(),
                reason: "schedule is empty",
            });
        }
        let count = |i: usize, reason: &'static str| -> Result<usize, HmmError> {
            let token = tokens.get(i).copied().unwrap_or_default();
            token.parse().map_err(|_| HmmError::InvalidSchedule {
                position: i,
                token: token.to_string(),
                reason,
            })
        };

        let mut steps = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let step = match tokens[i] {
                "S" => ScheduleStep::Static,
                "D" => ScheduleStep::Dynamic,
                "P" => ScheduleStep::SamplePrior,
                token => {
                    let method = token.parse::<SamplingMethod>().map_err(|_| {
                        HmmError::InvalidSchedule {
                            position: i,
                            token: token.to_string(),
                            reason: "expected M, F, S, D or P",
                        }
                    })?;
                    let iterations = count(i + 1, "expected an iteration count")?;
                    let thinning = count(i + 2, "expected a thinning interval")?;
                    i += 2;
                    ScheduleStep::Run {
                        method,
                        iterations,
                        thinning,
                    }
                }
            };
            steps.push(step);
            i += 1;
        }
        Ok(Self { steps })
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match step {
                ScheduleStep::Run {
                    method,
                    iterations,
                    thinning,
                } => {
                    let m = match method {
                        SamplingMethod::Mixture => "M",
                        SamplingMethod::ForwardBackward => "F",
                    };
                    write!(f, "{m} {iterations} {thinning}")?;
                }
                ScheduleStep::Static => f.write_str("S")?,
                ScheduleStep::Dynamic => f.write_str("D")?,
                ScheduleStep::SamplePrior => f.write_str("P")?,
            }
        }
        Ok(())
    }
}

/// Executes `schedule` and returns the state sequence of the last run.
///
/// # Errors
///
/// Any error aborts the schedule.
#[tracing::instrument(skip_all, fields(schedule = %schedule))]
pub fn run_schedule<B, R>(
    schedule: &Schedule,
    y: &mut Emissions<B>,
    model: &mut HmmModel,
    recorder: &mut R,
    rng: &mut impl rand::Rng,
) -> Result<StateSequence, HmmError>
where
    B: BlockStructure,
    R: Recorder + ?Sized,
{
    let mut sample_prior = true;
    let mut dynamic = true;
    let mut last = StateSequence::new();

    for step in schedule.steps() {
        if sample_prior {
            info!("sampling parameters from the prior");
            model.sample_prior(rng)?;
            sample_prior = false;
        }
        match *step {
            ScheduleStep::SamplePrior => sample_prior = true,
            ScheduleStep::Static => {
                y.create_blocks_for(model.theta())?;
                dynamic = false;
                info!("block structure is static");
            }
            ScheduleStep::Dynamic => {
                dynamic = true;
                info!("block structure is dynamic");
            }
            ScheduleStep::Run {
                method,
                iterations,
                thinning,
            } => {
                info!(?method, iterations, thinning, "sampling");
                let run = SamplingConfig::new(method, iterations, thinning).with_dynamic(dynamic);
                last = sample_hmm(y, model, &run, recorder, rng)?;
            }
        }
    }
    Ok(last)
}
