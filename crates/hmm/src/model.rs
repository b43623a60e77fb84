//! Parameters and hyperparameters of one hidden Markov model.

use crate::config::HmmConfig;
use crate::conjugate::NormalInverseGamma;
use crate::error::HmmError;
use crate::initial::{Initial, InitialHyperParam};
use crate::mapping::Mapping;
use crate::theta::{Theta, ThetaHyperParam};
use crate::transitions::{Transitions, TransitionsHyperParam};

/// Current parameter draw together with the posteriors that the samplers
/// fill during an iteration.
#[derive(Debug, Clone)]
pub struct HmmModel {
    pub(crate) config: HmmConfig,
    pub(crate) theta: Theta,
    pub(crate) tau_theta: ThetaHyperParam,
    pub(crate) transitions: Transitions,
    pub(crate) tau_transitions: TransitionsHyperParam,
    pub(crate) initial: Initial,
    pub(crate) tau_initial: InitialHyperParam,
}

impl HmmModel {
    /// Builds the model for `nr_dim` data dimensions with one prior per
    /// emission component, and draws all parameters from their priors.
    ///
    /// # Errors
    ///
    /// Returns configuration errors, [`HmmError::DimensionMismatch`] if the
    /// number of priors differs from `config.components()`, and mapping or
    /// sampling errors.
    pub fn new(
        config: HmmConfig,
        nr_dim: usize,
        emission_priors: Vec<NormalInverseGamma>,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, HmmError> {
        config.validate()?;
        if emission_priors.len() != config.components() {
            return Err(HmmError::DimensionMismatch {
                expected: config.components(),
                got: emission_priors.len(),
            });
        }
        let mapping = Mapping::combinations(config.components(), nr_dim)?;
        let nr_states = mapping.nr_states();

        let mut tau_theta = ThetaHyperParam::new(emission_priors)?;
        let mut tau_transitions = TransitionsHyperParam::new(
            nr_states,
            config.transition_alpha(),
            config.self_transition_alpha(),
        )?;
        let mut tau_initial = InitialHyperParam::new(nr_states, config.initial_alpha())?;

        let theta = Theta::from_prior(&mut tau_theta, mapping, rng)?;
        let initial = Initial::from_prior(&mut tau_initial, rng)?;
        let transitions = Transitions::from_prior(&mut tau_transitions, rng)?;

        Ok(Self {
            config,
            theta,
            tau_theta,
            transitions,
            tau_transitions,
            initial,
            tau_initial,
        })
    }

    /// Discards accumulated observations and redraws every parameter from
    /// its prior.
    ///
    /// # Errors
    ///
    /// Propagates sampling errors.
    pub fn sample_prior(&mut self, rng: &mut impl rand::Rng) -> Result<(), HmmError> {
        self.tau_theta.reset();
        self.tau_initial.reset();
        self.tau_transitions.reset();
        self.sample_parameters(rng)
    }

    /// Draws every parameter from its current posterior and resets the
    /// posteriors.
    ///
    /// # Errors
    ///
    /// Propagates sampling errors.
    pub fn sample_parameters(&mut self, rng: &mut impl rand::Rng) -> Result<(), HmmError> {
        self.theta.sample(&mut self.tau_theta, rng)?;
        self.initial.sample(&mut self.tau_initial, rng)?;
        self.transitions.sample(&mut self.tau_transitions, rng)?;
        Ok(())
    }

    /// Model configuration.
    pub fn config(&self) -> &HmmConfig {
        &self.config
    }

    /// Emission parameters.
    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    /// Emission hyperparameters.
    pub fn tau_theta(&self) -> &ThetaHyperParam {
        &self.tau_theta
    }

    /// Transition matrix.
    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    /// Initial state distribution.
    pub fn initial(&self) -> &Initial {
        &self.initial
    }

    /// State mapping.
    pub fn mapping(&self) -> &Mapping {
        self.theta.mapping()
    }

    /// Number of hidden states.
    pub fn nr_states(&self) -> usize {
        self.theta.nr_states()
    }
}
