//! Sufficient statistics of the Normal distribution.

use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::StatsError;

/// Sum and sum of squares of a set of observations.
///
/// Together with the observation count these are sufficient for the Normal
/// likelihood. The type is additive so that range statistics can be built from
/// cumulative sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalStats {
    sum: f64,
    sum_sq: f64,
}

impl NormalStats {
    /// Creates statistics from a precomputed sum and sum of squares.
    pub fn new(sum: f64, sum_sq: f64) -> Self {
        Self { sum, sum_sq }
    }

    /// Statistics of a single observation.
    pub fn from_value(x: f64) -> Self {
        Self { sum: x, sum_sq: x * x }
    }

    /// Returns the sum of observations.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the sum of squared observations.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Adds a single observation.
    pub fn add_value(&mut self, x: f64) {
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Sample mean of `n` observations summarised by these statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NoObservations`] if `n == 0`.
    pub fn mean(&self, n: usize) -> Result<f64, StatsError> {
        if n == 0 {
            return Err(StatsError::NoObservations);
        }
        Ok(self.sum / n as f64)
    }

    /// Population variance (N denominator) of `n` observations.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NoObservations`] if `n == 0`.
    pub fn variance(&self, n: usize) -> Result<f64, StatsError> {
        let avg = self.mean(n)?;
        Ok(self.sum_sq / n as f64 - avg * avg)
    }
}

impl Add for NormalStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            sum: self.sum + rhs.sum,
            sum_sq: self.sum_sq + rhs.sum_sq,
        }
    }
}

impl Sub for NormalStats {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            sum: self.sum - rhs.sum,
            sum_sq: self.sum_sq - rhs.sum_sq,
        }
    }
}

impl AddAssign for NormalStats {
    fn add_assign(&mut self, rhs: Self) {
        self.sum += rhs.sum;
        self.sum_sq += rhs.sum_sq;
    }
}

impl SubAssign for NormalStats {
    fn sub_assign(&mut self, rhs: Self) {
        self.sum -= rhs.sum;
        self.sum_sq -= rhs.sum_sq;
    }
}
