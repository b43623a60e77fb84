//! Emission parameters and their Normal-inverse-gamma priors.

use std::fmt;

use wavehmm_stats::NormalStats;

use crate::conjugate::{Conjugate, NormalInverseGamma};
use crate::error::HmmError;
use crate::mapping::Mapping;
use crate::normal::NormalParam;

/// One Normal-inverse-gamma prior/posterior pair per emission component.
#[derive(Debug, Clone)]
pub struct ThetaHyperParam {
    params: Vec<Conjugate<NormalInverseGamma>>,
}

impl ThetaHyperParam {
    /// Creates one conjugate pair per prior.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] if `priors` is empty.
    pub fn new(priors: Vec<NormalInverseGamma>) -> Result<Self, HmmError> {
        if priors.is_empty() {
            return Err(HmmError::InvalidParameter {
                name: "emission priors",
                value: 0.0,
                reason: "need at least one",
            });
        }
        Ok(Self {
            params: priors.into_iter().map(Conjugate::new).collect(),
        })
    }

    /// Uses the same prior for `nr_components` components.
    ///
    /// # Errors
    ///
    /// See [`ThetaHyperParam::new`].
    pub fn shared(prior: NormalInverseGamma, nr_components: usize) -> Result<Self, HmmError> {
        Self::new(vec![prior; nr_components])
    }

    /// Number of emission components.
    pub fn nr_params(&self) -> usize {
        self.params.len()
    }

    /// Prior of `component`.
    pub fn prior(&self, component: usize) -> Option<&NormalInverseGamma> {
        self.params.get(component).map(Conjugate::prior)
    }

    /// Posterior of `component`.
    pub fn posterior(&self, component: usize) -> Option<&NormalInverseGamma> {
        self.params.get(component).map(Conjugate::posterior)
    }

    /// Adds `n` observations with statistics `stats` to `component`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::IndexOutOfBounds`] for an unknown component and
    /// propagates update errors.
    pub fn add_observation(
        &mut self,
        stats: &NormalStats,
        n: usize,
        component: usize,
    ) -> Result<(), HmmError> {
        let len = self.params.len();
        let param = self
            .params
            .get_mut(component)
            .ok_or(HmmError::IndexOutOfBounds {
                index: component,
                len,
            })?;
        param.posterior_mut().update(stats, n)
    }

    /// Resets every posterior to its prior.
    pub fn reset(&mut self) {
        for p in &mut self.params {
            p.reset();
        }
    }
}

/// Current emission parameters and the state mapping that selects them.
#[derive(Debug, Clone)]
pub struct Theta {
    params: Vec<NormalParam>,
    mapping: Mapping,
}

impl Theta {
    /// Draws initial parameters from the (reset) hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DimensionMismatch`] if the mapping expects a
    /// different number of components than `tau` provides, and propagates
    /// sampling errors.
    pub fn from_prior(
        tau: &mut ThetaHyperParam,
        mapping: Mapping,
        rng: &mut impl rand::Rng,
    ) -> Result<Self, HmmError> {
        if mapping.nr_components() != tau.nr_params() {
            return Err(HmmError::DimensionMismatch {
                expected: mapping.nr_components(),
                got: tau.nr_params(),
            });
        }
        tau.reset();
        let mut theta = Self {
            params: Vec::with_capacity(tau.nr_params()),
            mapping,
        };
        theta.sample(tau, rng)?;
        Ok(theta)
    }

    /// Replaces every component by a draw from its posterior, then resets
    /// the posteriors.
    ///
    /// # Errors
    ///
    /// Propagates sampling errors; the posteriors are left untouched then.
    pub fn sample(
        &mut self,
        tau: &mut ThetaHyperParam,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError> {
        let params = tau
            .params
            .iter()
            .map(|p| p.posterior().sample(rng))
            .collect::<Result<Vec<_>, _>>()?;
        self.params = params;
        tau.reset();
        Ok(())
    }

    /// Emission components.
    pub fn params(&self) -> &[NormalParam] {
        &self.params
    }

    /// State mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Number of hidden states.
    pub fn nr_states(&self) -> usize {
        self.mapping.nr_states()
    }

    /// Sum of the log normalizers of the components used by `state`.
    pub fn log_normalizer(&self, state: usize) -> f64 {
        self.mapping
            .components(state)
            .iter()
            .map(|&c| self.params[c].log_normalizer())
            .sum()
    }

    /// Sum over dimensions of the inner product of `stats[d]` with the
    /// component `state` uses for dimension `d`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DimensionMismatch`] if `stats` does not have one
    /// entry per dimension and propagates [`HmmError::NonFiniteInnerProduct`].
    pub fn inner_product(&self, state: usize, stats: &[NormalStats]) -> Result<f64, HmmError> {
        let components = self.mapping.components(state);
        if stats.len() != components.len() {
            return Err(HmmError::DimensionMismatch {
                expected: components.len(),
                got: stats.len(),
            });
        }
        let mut result = 0.0;
        for (s, &c) in stats.iter().zip(components) {
            result += self.params[c].inner_product(s)?;
        }
        Ok(result)
    }

    /// Smallest component variance, used to derive the block threshold.
    pub fn threshold_value(&self) -> f64 {
        self.params
            .iter()
            .map(NormalParam::var)
            .fold(f64::INFINITY, f64::min)
    }
}

impl fmt::Display for Theta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}
