//! Transition matrix with row-wise Dirichlet priors.

use std::fmt;

use crate::conjugate::{Conjugate, Dirichlet};
use crate::error::HmmError;

/// One Dirichlet prior/posterior pair per row of the transition matrix.
///
/// The prior puts `self_alpha` on the diagonal and `alpha` elsewhere.
#[derive(Debug, Clone)]
pub struct TransitionsHyperParam {
    rows: Vec<Conjugate<Dirichlet>>,
}

impl TransitionsHyperParam {
    /// Creates the row priors for `nr_states` states.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] if either concentration is not
    /// finite and positive or `nr_states < 2`.
    pub fn new(nr_states: usize, alpha: f64, self_alpha: f64) -> Result<Self, HmmError> {
        if nr_states < 2 {
            return Err(HmmError::InvalidParameter {
                name: "states",
                value: nr_states as f64,
                reason: "need at least 2",
            });
        }
        let rows = (0..nr_states)
            .map(|i| {
                let alphas = (0..nr_states)
                    .map(|j| if i == j { self_alpha } else { alpha })
                    .collect();
                Dirichlet::new(alphas).map(Conjugate::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    /// Number of states.
    pub fn nr_states(&self) -> usize {
        self.rows.len()
    }

    /// Posterior of row `from`.
    pub fn posterior(&self, from: usize) -> Option<&Dirichlet> {
        self.rows.get(from).map(Conjugate::posterior)
    }

    /// Adds a row-major `nr_states x nr_states` count matrix.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DimensionMismatch`] if `counts` has the wrong
    /// length.
    pub fn add_counts(&mut self, counts: &[f64]) -> Result<(), HmmError> {
        let k = self.rows.len();
        if counts.len() != k * k {
            return Err(HmmError::DimensionMismatch {
                expected: k * k,
                got: counts.len(),
            });
        }
        for (row, chunk) in self.rows.iter_mut().zip(counts.chunks_exact(k)) {
            row.posterior_mut().add_counts(chunk)?;
        }
        Ok(())
    }

    /// Resets every row posterior to its prior.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.reset();
        }
    }
}

/// Row-stochastic transition matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transitions {
    nr_states: usize,
    probs: Vec<f64>,
}

impl Transitions {
    /// Draws a matrix from the (reset) hyperparameters.
    ///
    /// # Errors
    ///
    /// Propagates Dirichlet sampling errors.
    pub fn from_prior(
        tau: &mut TransitionsHyperParam,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, HmmError> {
        tau.reset();
        let k = tau.nr_states();
        let mut a = Self {
            nr_states: k,
            probs: vec![1.0 / k as f64; k * k],
        };
        a.sample(tau, rng)?;
        Ok(a)
    }

    /// Replaces each row by a draw from its posterior, then resets the
    /// posteriors.
    ///
    /// # Errors
    ///
    /// Propagates Dirichlet sampling errors.
    pub fn sample(
        &mut self,
        tau: &mut TransitionsHyperParam,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError> {
        let mut probs = Vec::with_capacity(self.probs.len());
        for row in &tau.rows {
            probs.extend(row.posterior().sample(rng)?);
        }
        self.probs = probs;
        tau.reset();
        Ok(())
    }

    /// Number of states.
    pub fn nr_states(&self) -> usize {
        self.nr_states
    }

    /// Probability of moving from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.probs[from * self.nr_states + to]
    }

    /// Outgoing probabilities of `from`.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.probs[from * self.nr_states..(from + 1) * self.nr_states]
    }
}

impl fmt::Display for Transitions {
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
