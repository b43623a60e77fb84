//! Range-sum storage for per-position sufficient statistics.

use crate::error::StatsError;
use crate::kahan::{KahanAggregator, kahan_suffix_sums};
use crate::suffstat::NormalStats;

/// Default number of positions per summation cell.
///
/// Suffix sums never run across more than this many positions, which bounds
/// the accumulated rounding error for long series.
pub const CELL_SIZE: usize = 65_535;

/// Per-position statistics of a (possibly multivariate) series, stored
/// position-major: all dimensions of position 0, then position 1, and so on.
///
/// This is the only form in which individual raw values are accessible.
/// Converting into an [`IntegralArray`] consumes it.
#[derive(Debug, Clone)]
pub struct RawStatistics {
    values: Vec<NormalStats>,
    nr_dim: usize,
}

impl RawStatistics {
    /// Creates an empty container for `nr_dim`-dimensional data.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::ZeroDimensions`] if `nr_dim == 0`.
    pub fn new(nr_dim: usize) -> Result<Self, StatsError> {
        Self::with_capacity(nr_dim, 0)
    }

    /// Like [`RawStatistics::new`], reserving room for `positions` positions.
    pub fn with_capacity(nr_dim: usize, positions: usize) -> Result<Self, StatsError> {
        if nr_dim == 0 {
            return Err(StatsError::ZeroDimensions);
        }
        Ok(Self {
            values: Vec::with_capacity(positions * nr_dim),
            nr_dim,
        })
    }

    /// Builds statistics from position-major observations.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::ZeroDimensions`] or
    /// [`StatsError::DimensionMismatch`] if `values.len()` is not a multiple
    /// of `nr_dim`.
    pub fn from_values(values: &[f64], nr_dim: usize) -> Result<Self, StatsError> {
        let stats = values.iter().map(|&x| NormalStats::from_value(x)).collect();
        Self::from_stats(stats, nr_dim)
    }

    /// Wraps already computed per-position statistics.
    pub fn from_stats(values: Vec<NormalStats>, nr_dim: usize) -> Result<Self, StatsError> {
        if nr_dim == 0 {
            return Err(StatsError::ZeroDimensions);
        }
        if values.len() % nr_dim != 0 {
            return Err(StatsError::DimensionMismatch {
                len: values.len(),
                nr_dim,
            });
        }
        Ok(Self { values, nr_dim })
    }

    /// Appends the statistics of the next value in position-major order.
    pub fn push(&mut self, stat: NormalStats) {
        self.values.push(stat);
    }

    /// Number of complete positions stored.
    pub fn len(&self) -> usize {
        self.values.len() / self.nr_dim
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of data dimensions.
    pub fn nr_dim(&self) -> usize {
        self.nr_dim
    }

    /// Returns `true` if every position has all dimensions filled.
    pub fn is_complete(&self) -> bool {
        self.values.len() % self.nr_dim == 0
    }

    /// Statistics of a single position and dimension.
    pub fn get(&self, pos: usize, dim: usize) -> Option<&NormalStats> {
        if dim >= self.nr_dim {
            return None;
        }
        self.values.get(pos * self.nr_dim + dim)
    }
}

/// Answers sufficient-statistics queries over arbitrary position ranges.
///
/// Built from [`RawStatistics`] by replacing each entry with the suffix sum
/// up to the end of its cell. A range `[start, end)` is then the suffix at
/// `start`, plus one suffix for every cell boundary in `(start, end)`, minus
/// the suffix at `end` when `end` falls inside a cell. All accumulation uses
/// [`KahanAggregator`].
#[derive(Debug, Clone)]
pub struct IntegralArray {
    cumulative: Vec<NormalStats>,
    len: usize,
    nr_dim: usize,
    cell_size: usize,
    current: Vec<NormalStats>,
}

impl IntegralArray {
    /// Converts raw statistics using the default [`CELL_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EmptyData`] if there are no positions, or
    /// [`StatsError::DimensionMismatch`] if the last position is incomplete.
    pub fn new(raw: RawStatistics) -> Result<Self, StatsError> {
        Self::with_cell_size(raw, CELL_SIZE)
    }

    /// Converts raw statistics using `cell_size` positions per cell.
    pub fn with_cell_size(raw: RawStatistics, cell_size: usize) -> Result<Self, StatsError> {
        if cell_size == 0 {
            return Err(StatsError::ZeroCellSize);
        }
        if !raw.is_complete() {
            return Err(StatsError::DimensionMismatch {
                len: raw.values.len(),
                nr_dim: raw.nr_dim,
            });
        }
        if raw.is_empty() {
            return Err(StatsError::EmptyData);
        }

        let nr_dim = raw.nr_dim;
        let len = raw.len();
        let mut cumulative = raw.values;
        // One zero position past the end so a range ending at `len` can subtract it.
        cumulative.extend(std::iter::repeat_n(NormalStats::default(), nr_dim));

        let total = cumulative.len();
        let cell_span = nr_dim * cell_size;
        for cell_start in (0..total).step_by(cell_span) {
            let cell_end = (cell_start + cell_span).min(total);
            for d in 0..nr_dim {
                kahan_suffix_sums(&mut cumulative, cell_start + d, cell_end, nr_dim)?;
            }
        }

        Ok(Self {
            cumulative,
            len,
            nr_dim,
            cell_size,
            current: vec![NormalStats::default(); nr_dim],
        })
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no positions. Construction rejects empty data.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of data dimensions.
    pub fn nr_dim(&self) -> usize {
        self.nr_dim
    }

    /// Returns the number of positions per summation cell.
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Sufficient statistics of dimension `dim` over `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidRange`] unless `start < end <= len`, or
    /// [`StatsError::DimensionOutOfBounds`] if `dim >= nr_dim`.
    pub fn block_stats(
        &self,
        start: usize,
        end: usize,
        dim: usize,
    ) -> Result<NormalStats, StatsError> {
        let mut agg = KahanAggregator::new();
        self.add_block_stats(start, end, dim, &mut agg)?;
        Ok(agg.sum())
    }

    /// Adds the statistics of `[start, end)` in dimension `dim` to `agg`,
    /// increasing its term count by the block length.
    pub fn add_block_stats(
        &self,
        start: usize,
        end: usize,
        dim: usize,
        agg: &mut KahanAggregator<NormalStats>,
    ) -> Result<(), StatsError> {
        if start >= end || end > self.len {
            return Err(StatsError::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }
        if dim >= self.nr_dim {
            return Err(StatsError::DimensionOutOfBounds {
                dim,
                nr_dim: self.nr_dim,
            });
        }

        let n = agg.nr_terms() + (end - start);
        agg.add(self.at(start, dim), 1);
        let mut boundary = higher_multiple(start, self.cell_size);
        while boundary < end {
            agg.add(self.at(boundary, dim), 1);
            boundary += self.cell_size;
        }
        if end % self.cell_size != 0 {
            agg.subtract(self.at(end, dim), 1);
        }
        agg.set_nr_terms(n);
        Ok(())
    }

    /// Computes and caches the statistics of `[start, end)` for every
    /// dimension, retrievable through [`IntegralArray::suff_stat`].
    pub fn set_stats(&mut self, start: usize, end: usize) -> Result<(), StatsError> {
        for d in 0..self.nr_dim {
            let stat = self.block_stats(start, end, d)?;
            self.current[d] = stat;
        }
        Ok(())
    }

    /// Cached statistics of dimension `dim` from the last
    /// [`IntegralArray::set_stats`] call.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= nr_dim`.
    pub fn suff_stat(&self, dim: usize) -> NormalStats {
        self.current[dim]
    }

    /// Cached statistics of all dimensions.
    pub fn suff_stats(&self) -> &[NormalStats] {
        &self.current
    }

    fn at(&self, pos: usize, dim: usize) -> NormalStats {
        self.cumulative[pos * self.nr_dim + dim]
    }
}

/// Smallest multiple of `m` strictly greater than `n`.
fn higher_multiple(n: usize, m: usize) -> usize {
    (n + m) / m * m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn naive(values: &[f64], nr_dim: usize, start: usize, end: usize, dim: usize) -> NormalStats {
        let mut s = NormalStats::default();
        for pos in start..end {
            s.add_value(values[pos * nr_dim + dim]);
        }
        s
    }

    #[test]
    fn higher_multiple_is_strict() {
        assert_eq!(higher_multiple(0, 4), 4);
        assert_eq!(higher_multiple(3, 4), 4);
        assert_eq!(higher_multiple(4, 4), 8);
    }

    #[test]
    fn raw_rejects_bad_shape() {
        assert!(matches!(
            RawStatistics::new(0),
            Err(StatsError::ZeroDimensions)
        ));
        assert!(matches!(
            RawStatistics::from_values(&[1.0, 2.0, 3.0], 2),
            Err(StatsError::DimensionMismatch { len: 3, nr_dim: 2 })
        ));
    }

    #[test]
    fn raw_access() {
        let raw = RawStatistics::from_values(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get(1, 0).unwrap().sum(), 3.0);
        assert!(raw.get(0, 2).is_none());
        assert!(raw.get(2, 0).is_none());
    }

    #[test]
    fn empty_and_incomplete_are_rejected() {
        let raw = RawStatistics::new(1).unwrap();
        assert!(matches!(IntegralArray::new(raw), Err(StatsError::EmptyData)));

        let mut raw = RawStatistics::new(2).unwrap();
        raw.push(NormalStats::from_value(1.0));
        assert!(matches!(
            IntegralArray::new(raw),
            Err(StatsError::DimensionMismatch { .. })
        ));

        let raw = RawStatistics::from_values(&[1.0], 1).unwrap();
        assert!(matches!(
            IntegralArray::with_cell_size(raw, 0),
            Err(StatsError::ZeroCellSize)
        ));
    }

    #[test]
    fn single_position() {
        let raw = RawStatistics::from_values(&[2.5], 1).unwrap();
        let ia = IntegralArray::new(raw).unwrap();
        assert_eq!(ia.len(), 1);
        assert_eq!(ia.block_stats(0, 1, 0).unwrap(), NormalStats::new(2.5, 6.25));
    }

    #[test]
    fn all_ranges_match_naive_with_small_cells() {
        let values: Vec<f64> = (0..23).map(|i| (i as f64 * 0.7).sin() * 3.0 + 1.0).collect();
        for cell in [1, 2, 3, 5, 7, 64] {
            let raw = RawStatistics::from_values(&values, 1).unwrap();
            let ia = IntegralArray::with_cell_size(raw, cell).unwrap();
            for start in 0..values.len() {
                for end in (start + 1)..=values.len() {
                    let got = ia.block_stats(start, end, 0).unwrap();
                    let want = naive(&values, 1, start, end, 0);
                    assert_relative_eq!(got.sum(), want.sum(), epsilon = 1e-9);
                    assert_relative_eq!(got.sum_sq(), want.sum_sq(), epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn multivariate_dimensions_are_independent() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let raw = RawStatistics::from_values(&values, 3).unwrap();
        let ia = IntegralArray::with_cell_size(raw, 4).unwrap();
        assert_eq!(ia.len(), 10);
        for dim in 0..3 {
            for start in 0..10 {
                for end in (start + 1)..=10 {
                    let got = ia.block_stats(start, end, dim).unwrap();
                    let want = naive(&values, 3, start, end, dim);
                    assert_relative_eq!(got.sum(), want.sum(), epsilon = 1e-9);
                    assert_relative_eq!(got.sum_sq(), want.sum_sq(), epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn invalid_queries() {
        let raw = RawStatistics::from_values(&[1.0, 2.0, 3.0], 1).unwrap();
        let ia = IntegralArray::new(raw).unwrap();
        assert!(matches!(
            ia.block_stats(2, 2, 0),
            Err(StatsError::InvalidRange { start: 2, end: 2, len: 3 })
        ));
        assert!(matches!(
            ia.block_stats(0, 4, 0),
            Err(StatsError::InvalidRange { .. })
        ));
        assert!(matches!(
            ia.block_stats(0, 1, 1),
            Err(StatsError::DimensionOutOfBounds { dim: 1, nr_dim: 1 })
        ));
    }

    #[test]
    fn set_stats_caches_all_dimensions() {
        let raw = RawStatistics::from_values(&[1.0, 10.0, 2.0, 20.0, 3.0, 30.0], 2).unwrap();
        let mut ia = IntegralArray::new(raw).unwrap();
        ia.set_stats(1, 3).unwrap();
        assert_eq!(ia.suff_stat(0).sum(), 5.0);
        assert_eq!(ia.suff_stat(1).sum(), 50.0);
        assert_eq!(ia.suff_stats().len(), 2);
    }

    #[test]
    fn aggregator_counts_terms() {
        let raw = RawStatistics::from_values(&[1.0; 10], 1).unwrap();
        let ia = IntegralArray::with_cell_size(raw, 3).unwrap();
        let mut agg = KahanAggregator::new();
        ia.add_block_stats(0, 4, 0, &mut agg).unwrap();
        ia.add_block_stats(6, 10, 0, &mut agg).unwrap();
        assert_eq!(agg.nr_terms(), 8);
        assert_relative_eq!(agg.sum().sum(), 8.0);
    }
}
