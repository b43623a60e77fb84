//! # wavehmm-hmm
//!
//! Bayesian hidden Markov model segmentation on wavelet-compressed blocks.
//!
//! Positions are grouped into blocks by a [`BlockStructure`](wavehmm_blocks::BlockStructure);
//! every block is scored from its sufficient statistics alone, so one Gibbs
//! iteration costs time proportional to the number of blocks.
//!
//! ## Gibbs iteration
//!
//! ```mermaid
//! graph TD
//!     A["Theta (emissions)"] -->|"min variance"| B["Emissions::create_blocks_for"]
//!     B --> C["StateSequence::sample (mixture or forward-backward)"]
//!     C -->|"statistics, counts"| D["posteriors"]
//!     D -->|"sample_parameters"| A
//!     C -->|"record_block"| E["Recorder"]
//! ```
//!
//! A [`Schedule`] strings runs of iterations together, e.g. mixture burn-in
//! on dynamic blocks followed by forward-backward sampling on static blocks.
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use wavehmm_blocks::BreakpointArray;
//! use wavehmm_hmm::{
//!     Emissions, HmmConfig, HmmModel, RecordKinds, Records, Schedule, run_schedule,
//! };
//! use wavehmm_stats::IntegralArray;
//! use wavehmm_wavelet::{haar_breakpoint_weights, maxlet_from_reader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let input = "0 0.1 -0.1 0 5 5.1 4.9 5\n".repeat(4);
//! let (mut weights, raw) = maxlet_from_reader(input.as_bytes(), 1, 32)?.into_parts();
//! haar_breakpoint_weights(&mut weights)?;
//!
//! let blocks: BreakpointArray = BreakpointArray::new(weights)?;
//! let mut y = Emissions::new(IntegralArray::new(raw)?, blocks)?;
//! let prior = y.auto_prior(0.2, 0.9, 0.01)?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let config = HmmConfig::new().with_components(2);
//! let mut model = HmmModel::new(config, 1, vec![prior; 2], &mut rng)?;
//!
//! let schedule: Schedule = "M 20 0 F 20 1".parse()?;
//! let mut records = Records::new(y.len(), model.nr_states(), RecordKinds::default());
//! run_schedule(&schedule, &mut y, &mut model, &mut records, &mut rng)?;
//! assert_eq!(records.marginals().iterations(), 20);
//! # Ok(())
//! # }
//! ```

mod categorical;
mod config;
mod conjugate;
mod driver;
mod emissions;
mod error;
mod initial;
mod mapping;
mod marginals;
mod model;
mod normal;
mod records;
mod sampler;
mod schedule;
mod theta;
mod transitions;
mod trellis;

pub use categorical::sample_categorical;
pub use config::HmmConfig;
pub use conjugate::{Conjugate, Dirichlet, NormalInverseGamma};
pub use driver::{SamplingConfig, sample_hmm};
pub use emissions::Emissions;
pub use error::HmmError;
pub use initial::{Initial, InitialHyperParam};
pub use mapping::Mapping;
pub use marginals::{Segment, StateMarginals};
pub use model::HmmModel;
pub use normal::NormalParam;
pub use records::{NoopRecorder, RecordKinds, Recorder, Records};
pub use sampler::{SamplingMethod, StateSequence};
pub use schedule::{DEFAULT_SCHEDULE, Schedule, ScheduleStep, run_schedule};
pub use theta::{Theta, ThetaHyperParam};
pub use transitions::{Transitions, TransitionsHyperParam};
