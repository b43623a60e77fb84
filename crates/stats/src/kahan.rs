//! Compensated (Kahan) summation.

use std::ops::{Add, Sub};

use crate::error::StatsError;

/// Values that can be accumulated with compensated summation.
///
/// Implemented for every additive type with a zero default, so both `f64` and
/// [`NormalStats`](crate::NormalStats) qualify.
pub trait KahanValue: Copy + Default + Add<Output = Self> + Sub<Output = Self> {}

impl<T> KahanValue for T where T: Copy + Default + Add<Output = T> + Sub<Output = T> {}

/// Accumulates positive and negative contributions separately, each with its
/// own Kahan compensation term.
///
/// Splitting the two streams keeps `add(a); subtract(b)` from cancelling
/// digits inside a single running compensation.
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanAggregator<T> {
    pos_sum: T,
    neg_sum: T,
    pos_err: T,
    neg_err: T,
    n: usize,
}

impl<T: KahanValue> KahanAggregator<T> {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `x`, counting it as `n` terms.
    pub fn add(&mut self, x: T, n: usize) {
        compensated_step(&mut self.pos_sum, &mut self.pos_err, x);
        self.n += n;
    }

    /// Subtracts `x`, counting it as `n` terms.
    pub fn subtract(&mut self, x: T, n: usize) {
        compensated_step(&mut self.neg_sum, &mut self.neg_err, x);
        self.n += n;
    }

    /// Net sum of all added minus all subtracted values.
    pub fn sum(&self) -> T {
        self.pos_sum - self.neg_sum
    }

    /// Combined outstanding compensation of both streams.
    pub fn error(&self) -> T {
        self.pos_err + self.neg_err
    }

    /// Number of terms represented by the sum.
    pub fn nr_terms(&self) -> usize {
        self.n
    }

    /// Overrides the term count.
    pub fn set_nr_terms(&mut self, n: usize) {
        self.n = n;
    }

    /// Clears both sums and the term count.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn compensated_step<T: KahanValue>(sum: &mut T, err: &mut T, x: T) {
    let y = x - *err;
    let t = *sum + y;
    *err = (t - *sum) - y;
    *sum = t;
}

/// Replaces `values[start..end]` (every `step`-th entry, beginning at `start`)
/// with compensated suffix sums, so that each visited entry holds the sum of
/// itself and all later visited entries in the range.
///
/// An empty range is a no-op.
///
/// # Errors
///
/// Returns [`StatsError::ZeroStep`] if `step == 0`, or
/// [`StatsError::InvalidRange`] if `end` exceeds the slice.
pub fn kahan_suffix_sums<T: KahanValue>(
    values: &mut [T],
    start: usize,
    end: usize,
    step: usize,
) -> Result<(), StatsError> {
    if step == 0 {
        return Err(StatsError::ZeroStep);
    }
    if end > values.len() {
        return Err(StatsError::InvalidRange {
            start,
            end,
            len: values.len(),
        });
    }
    if start >= end {
        return Ok(());
    }

    let last = start + ((end - 1 - start) / step) * step;
    let mut s = values[last];
    let mut c = T::default();
    let mut i = last;
    while i >= start + step {
        i -= step;
        let y = values[i] - c;
        let t = s + y;
        c = (t - s) - y;
        s = t;
        values[i] = s;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NormalStats;
    use approx::assert_relative_eq;

    #[test]
    fn aggregator_tracks_terms() {
        let mut agg = KahanAggregator::<f64>::new();
        agg.add(10.0, 3);
        agg.subtract(4.0, 1);
        assert_relative_eq!(agg.sum(), 6.0);
        assert_eq!(agg.nr_terms(), 4);

        agg.set_nr_terms(2);
        assert_eq!(agg.nr_terms(), 2);

        agg.reset();
        assert_eq!(agg.sum(), 0.0);
        assert_eq!(agg.nr_terms(), 0);
    }

    #[test]
    fn aggregator_compensates() {
        // 1.0 followed by many tiny values that naive summation drops.
        let mut agg = KahanAggregator::<f64>::new();
        let mut naive = 1.0_f64;
        agg.add(1.0, 1);
        for _ in 0..10_000 {
            agg.add(1e-16, 1);
            naive += 1e-16;
        }
        assert_eq!(naive, 1.0);
        assert_relative_eq!(agg.sum(), 1.0 + 1e-12, epsilon = 1e-15);
    }

    #[test]
    fn aggregator_works_on_normal_stats() {
        let mut agg = KahanAggregator::<NormalStats>::new();
        agg.add(NormalStats::new(3.0, 5.0), 2);
        agg.subtract(NormalStats::new(1.0, 1.0), 1);
        assert_eq!(agg.sum(), NormalStats::new(2.0, 4.0));
    }

    #[test]
    fn suffix_sums_contiguous() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        kahan_suffix_sums(&mut v, 0, 4, 1).unwrap();
        assert_eq!(v, vec![10.0, 9.0, 7.0, 4.0]);
    }

    #[test]
    fn suffix_sums_strided() {
        // Two interleaved dimensions, only the second is summed.
        let mut v = vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        kahan_suffix_sums(&mut v, 1, 6, 2).unwrap();
        assert_eq!(v, vec![1.0, 60.0, 2.0, 50.0, 3.0, 30.0]);
    }

    #[test]
    fn suffix_sums_subrange() {
        let mut v = vec![1.0, 1.0, 1.0, 1.0, 1.0];
        kahan_suffix_sums(&mut v, 1, 3, 1).unwrap();
        assert_eq!(v, vec![1.0, 2.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn suffix_sums_rejects_bad_input() {
        let mut v = vec![1.0, 2.0];
        assert!(matches!(
            kahan_suffix_sums(&mut v, 0, 2, 0),
            Err(StatsError::ZeroStep)
        ));
        assert!(matches!(
            kahan_suffix_sums(&mut v, 0, 3, 1),
            Err(StatsError::InvalidRange { .. })
        ));
        kahan_suffix_sums(&mut v, 1, 1, 1).unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
    }
}
