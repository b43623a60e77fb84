//! Initial state distribution with a symmetric Dirichlet prior.

use std::fmt;

use crate::conjugate::{Conjugate, Dirichlet};
use crate::error::HmmError;

/// Dirichlet prior/posterior pair for the initial distribution.
#[derive(Debug, Clone)]
pub struct InitialHyperParam {
    param: Conjugate<Dirichlet>,
}

impl InitialHyperParam {
    /// Symmetric prior with concentration `alpha` over `nr_states` states.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] if `alpha` is not finite and
    /// positive and [`HmmError::DegenerateWeights`] if `nr_states == 0`.
    pub fn new(nr_states: usize, alpha: f64) -> Result<Self, HmmError> {
        Ok(Self {
            param: Conjugate::new(Dirichlet::symmetric(nr_states, alpha)?),
        })
    }

    /// Number of states.
    pub fn nr_states(&self) -> usize {
        self.param.prior().len()
    }

    /// Current posterior.
    pub fn posterior(&self) -> &Dirichlet {
        self.param.posterior()
    }

    /// Adds per-state occupancy counts.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DimensionMismatch`] if `counts` has the wrong
    /// length.
    pub fn add_counts(&mut self, counts: &[f64]) -> Result<(), HmmError> {
        self.param.posterior_mut().add_counts(counts)
    }

    /// Resets the posterior to the prior.
    pub fn reset(&mut self) {
        self.param.reset();
    }
}

/// Probability of each state at the first block.
#[derive(Debug, Clone, PartialEq)]
pub struct Initial {
    probs: Vec<f64>,
}

impl Initial {
    /// Draws the distribution from the (reset) hyperparameters.
    ///
    /// # Errors
    ///
    /// Propagates Dirichlet sampling errors.
    pub fn from_prior(
        tau: &mut InitialHyperParam,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, HmmError> {
        tau.reset();
        let mut pi = Self { probs: Vec::new() };
        pi.sample(tau, rng)?;
        Ok(pi)
    }

    /// Replaces the distribution by a posterior draw, then resets the
    /// posterior.
    ///
    /// # Errors
    ///
    /// Propagates Dirichlet sampling errors.
    pub fn sample(
        &mut self,
        tau: &mut InitialHyperParam,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError> {
        self.probs = tau.posterior().sample(rng)?;
        tau.reset();
        Ok(())
    }

    /// State probabilities.
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Number of states.
    pub fn nr_states(&self) -> usize {
        self.probs.len()
    }
}

impl fmt::Display for Initial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.probs.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}
