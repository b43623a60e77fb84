//! Normal emission parameters in exponential-family form.

use std::fmt;

use wavehmm_stats::NormalStats;

use crate::error::HmmError;

/// Mean and variance of one Normal emission component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalParam {
    mean: f64,
    var: f64,
}

impl NormalParam {
    /// Creates a parameter pair.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::InvalidParameter`] if `mean` is not finite or
    /// `var` is not finite and positive.
    pub fn new(mean: f64, var: f64) -> Result<Self, HmmError> {
        if !mean.is_finite() {
            return Err(HmmError::InvalidParameter {
                name: "mean",
                value: mean,
                reason: "must be finite",
            });
        }
        if !(var.is_finite() && var > 0.0) {
            return Err(HmmError::InvalidParameter {
                name: "variance",
                value: var,
                reason: "must be finite and positive",
            });
        }
        Ok(Self { mean, var })
    }

    /// Mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Variance.
    pub fn var(&self) -> f64 {
        self.var
    }

    /// Standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.var.sqrt()
    }

    /// Inner product of a block's sufficient statistics with the natural
    /// parameters, `(2 mean sum - sum_sq) / (2 var)`.
    ///
    /// Together with [`log_normalizer`](Self::log_normalizer) this gives the
    /// block log-likelihood up to the carrier measure:
    /// `inner_product - n * log_normalizer`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::NonFiniteInnerProduct`] on overflow.
    pub fn inner_product(&self, stats: &NormalStats) -> Result<f64, HmmError> {
        let result = (2.0 * self.mean * stats.sum() - stats.sum_sq()) / (2.0 * self.var);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(HmmError::NonFiniteInnerProduct)
        }
    }

    /// Per-observation log normalizer, `ln(sd) + mean^2 / (2 var)`.
    pub fn log_normalizer(&self) -> f64 {
        self.std_dev().ln() + self.mean * self.mean / (2.0 * self.var)
    }
}

impl fmt::Display for NormalParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.mean, self.var)
    }
}
