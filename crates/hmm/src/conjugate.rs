//! Conjugate priors and their posterior bookkeeping.
//!
//! Emission components use a Normal-inverse-gamma prior, transition rows and
//! the initial distribution use Dirichlet priors. A [`Conjugate`] holds a
//! fixed prior and a posterior that accumulates observations until it is
//! reset.

use rand_distr::{Distribution, Gamma, Normal};
use tracing::warn;
use wavehmm_stats::NormalStats;

use crate::error::HmmError;
use crate::normal::NormalParam;

// Closed-form approximation constants for the variance quantile of an
// inverse-gamma with shape 2.
const AUTO_PRIOR_M1: f64 = 0.3361;
const AUTO_PRIOR_M2: f64 = -0.0042;
const AUTO_PRIOR_M3: f64 = -0.0201;

/// Normal-inverse-gamma hyperparameters `(alpha, beta, mu0, nu)`.
///
/// The variance is inverse-gamma distributed with shape `alpha` and scale
/// `beta`; given the variance, the mean is Normal with location `mu0` and
/// variance `var / nu`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalInverseGamma {
    alpha: f64,
    beta: f64,
    mu0: f64,
    nu: f64,
}

impl NormalInverseGamma {
    /// Creates a hyperparameter set.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] unless `alpha`, `beta` and `nu`
    /// are finite and positive and `mu0` is finite.
    pub fn new(alpha: f64, beta: f64, mu0: f64, nu: f64) -> Result<Self, HmmError> {
        check_positive("alpha", alpha)?;
        check_positive("beta", beta)?;
        check_positive("nu", nu)?;
        if !mu0.is_finite() {
            return Err(HmmError::InvalidParameter {
                name: "mu0",
                value: mu0,
                reason: "must be finite",
            });
        }
        Ok(Self {
            alpha,
            beta,
            mu0,
            nu,
        })
    }

    /// Automatic prior such that a variance below `s2` is drawn with
    /// probability about `p`, centred on the data.
    ///
    /// `alpha` is fixed at 2, `beta` follows from a closed-form approximation
    /// of the inverse-gamma quantile, `mu0 = data_mean` and
    /// `nu = beta / data_var`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] if `p` is outside `[0, 1]`,
    /// `s2` or `data_var` is not positive, or the resulting hyperparameters
    /// are not finite and positive.
    pub fn auto_prior(s2: f64, p: f64, data_mean: f64, data_var: f64) -> Result<Self, HmmError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(HmmError::InvalidParameter {
                name: "p",
                value: p,
                reason: "must be a probability in [0, 1]",
            });
        }
        if !(s2 > 0.0) {
            return Err(HmmError::InvalidParameter {
                name: "s2",
                value: s2,
                reason: "must be a positive variance",
            });
        }
        if !(data_var > 0.0) {
            return Err(HmmError::InvalidParameter {
                name: "data variance",
                value: data_var,
                reason: "must be positive",
            });
        }

        let b = -p.ln();
        let sqrt_b = b.sqrt();
        let alpha = 2.0;
        let denom = AUTO_PRIOR_M1 * sqrt_b
            + std::f64::consts::SQRT_2 * (AUTO_PRIOR_M2 * b * (AUTO_PRIOR_M3 * sqrt_b).exp() + 1.0);
        let beta = s2 * ((2.0 * sqrt_b) / denom + b);
        let nu = beta / data_var;
        Self::new(alpha, beta, data_mean, nu)
    }

    /// Shape of the variance distribution.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Scale of the variance distribution.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Location of the mean.
    pub fn mu0(&self) -> f64 {
        self.mu0
    }

    /// Pseudo-count of the mean.
    pub fn nu(&self) -> f64 {
        self.nu
    }

    /// Conjugate update with `n` observations summarised by `stats`.
    ///
    /// An update with `n == 0` and no scatter is a no-op that logs a warning.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::EmptyObservation`] if `n == 0` but the sum of
    /// squares is positive.
    pub fn update(&mut self, stats: &NormalStats, n: usize) -> Result<(), HmmError> {
        if n == 0 {
            if stats.sum_sq() > 0.0 {
                return Err(HmmError::EmptyObservation {
                    sum_sq: stats.sum_sq(),
                });
            }
            warn!("posterior update without observations");
            return Ok(());
        }

        let n = n as f64;
        let sum = stats.sum();
        let xbar = sum / n;
        let dev = xbar - self.mu0;

        self.beta += 0.5 * (n * xbar * xbar + stats.sum_sq() - 2.0 * xbar * sum)
            + (n * self.nu / (n + self.nu)) * (dev * dev / 2.0);
        self.mu0 = (self.nu * self.mu0 + n * xbar) / (self.nu + n);
        self.alpha += n / 2.0;
        self.nu += n;
        Ok(())
    }

    /// Draws a `(mean, var)` pair: `var = 1 / Gamma(alpha, 1 / beta)`,
    /// `mean ~ Normal(mu0, sqrt(var / nu))`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::Distribution`] if a distribution cannot be built
    /// and [`HmmError::InvalidParameter`] if the draw degenerates.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Result<NormalParam, HmmError> {
        let scale = 1.0 / self.beta;
        let gamma = Gamma::new(self.alpha, scale)
            .map_err(|e| HmmError::Distribution(format!("gamma({}, {scale}): {e}", self.alpha)))?;
        let var = 1.0 / gamma.sample(rng);
        let sd = (var / self.nu).sqrt();
        let normal = Normal::new(self.mu0, sd)
            .map_err(|e| HmmError::Distribution(format!("normal({}, {sd}): {e}", self.mu0)))?;
        let mean = normal.sample(rng);
        NormalParam::new(mean, var)
    }
}

/// Dirichlet concentration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Dirichlet {
    alpha: Vec<f64>,
}

impl Dirichlet {
    /// Creates a Dirichlet from its concentration vector.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DegenerateWeights`] if `alpha` is empty and
    /// [`HmmError::InvalidParameter`] for any entry that is not finite and
    /// positive.
    pub fn new(alpha: Vec<f64>) -> Result<Self, HmmError> {
        if alpha.is_empty() {
            return Err(HmmError::DegenerateWeights(
                "Dirichlet needs at least one category".into(),
            ));
        }
        for &a in &alpha {
            check_positive("Dirichlet alpha", a)?;
        }
        Ok(Self { alpha })
    }

    /// Symmetric Dirichlet with `k` categories of concentration `alpha`.
    ///
    /// # Errors
    ///
    /// See [`Dirichlet::new`].
    pub fn symmetric(k: usize, alpha: f64) -> Result<Self, HmmError> {
        Self::new(vec![alpha; k])
    }

    /// Concentration parameters.
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    /// Always `false`; a Dirichlet has at least one category.
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Adds category counts to the concentration parameters.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::DimensionMismatch`] if `counts` has the wrong
    /// length.
    pub fn add_counts(&mut self, counts: &[f64]) -> Result<(), HmmError> {
        if counts.len() != self.alpha.len() {
            return Err(HmmError::DimensionMismatch {
                expected: self.alpha.len(),
                got: counts.len(),
            });
        }
        for (a, &c) in self.alpha.iter_mut().zip(counts) {
            *a += c;
        }
        Ok(())
    }

    /// Draws a probability vector by normalising independent
    /// `Gamma(alpha_i, 1)` draws.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::Distribution`] if a Gamma cannot be built and
    /// [`HmmError::DegenerateWeights`] if every draw underflows to zero.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Result<Vec<f64>, HmmError> {
        let mut probs = Vec::with_capacity(self.alpha.len());
        for &a in &self.alpha {
            let gamma = Gamma::new(a, 1.0)
                .map_err(|e| HmmError::Distribution(format!("gamma({a}, 1): {e}")))?;
            probs.push(gamma.sample(rng));
        }
        let total: f64 = probs.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(HmmError::DegenerateWeights(format!(
                "Dirichlet draw sums to {total}"
            )));
        }
        for p in &mut probs {
            *p /= total;
        }
        Ok(probs)
    }
}

/// A prior together with the posterior accumulated since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Conjugate<P> {
    prior: P,
    posterior: P,
}

impl<P: Clone> Conjugate<P> {
    /// Starts with the posterior equal to `prior`.
    pub fn new(prior: P) -> Self {
        Self {
            posterior: prior.clone(),
            prior,
        }
    }

    /// The prior.
    pub fn prior(&self) -> &P {
        &self.prior
    }

    /// The current posterior.
    pub fn posterior(&self) -> &P {
        &self.posterior
    }

    /// Mutable access to the posterior for updates.
    pub fn posterior_mut(&mut self) -> &mut P {
        &mut self.posterior
    }

    /// Discards all observations.
    pub fn reset(&mut self) {
        self.posterior = self.prior.clone();
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), HmmError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HmmError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}
