//! Streaming maxlet transform.

use std::f64::consts::FRAC_1_SQRT_2;
use std::io::BufRead;

use tracing::debug;
use wavehmm_stats::{NormalStats, RawStatistics};

use crate::error::WaveletError;

/// One-pass Haar transform over a stream of position-major values.
///
/// For every position the transform records the largest absolute detail
/// coefficient (across scales and dimensions) of the wavelets whose
/// discontinuity lies at that position. Only a stack of `nr_dim * log2(T)`
/// partial sums is kept; the per-position sufficient statistics are collected
/// alongside for the integral array.
///
/// ```rust
/// use wavehmm_wavelet::MaxletTransform;
///
/// let mut maxlet = MaxletTransform::new(1).unwrap();
/// for x in [1.0, 1.0, 3.0, 3.0] {
///     maxlet.push(x).unwrap();
/// }
/// let out = maxlet.finish().unwrap();
/// assert!(out.coeffs()[0].is_infinite());
/// assert_eq!(out.coeffs()[2], 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct MaxletTransform {
    nr_dim: usize,
    stack: Vec<f64>,
    coeffs: Vec<f64>,
    stats: RawStatistics,
    filled: usize,
}

impl MaxletTransform {
    /// Creates a transform for `nr_dim` interleaved dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::ZeroDimensions`] if `nr_dim == 0`.
    pub fn new(nr_dim: usize) -> Result<Self, WaveletError> {
        Self::with_capacity(nr_dim, 0)
    }

    /// Like [`MaxletTransform::new`], pre-sizing buffers for an estimated
    /// number of positions. A wrong estimate only costs reallocation.
    pub fn with_capacity(nr_dim: usize, positions: usize) -> Result<Self, WaveletError> {
        if nr_dim == 0 {
            return Err(WaveletError::ZeroDimensions);
        }
        // Room for the zero position the integral array appends.
        let stats = RawStatistics::with_capacity(nr_dim, positions + 1)?;
        Ok(Self {
            nr_dim,
            stack: Vec::with_capacity(nr_dim * (usize::BITS as usize + 1)),
            coeffs: Vec::with_capacity(positions),
            stats,
            filled: 0,
        })
    }

    /// Returns the number of data dimensions.
    pub fn nr_dim(&self) -> usize {
        self.nr_dim
    }

    /// Number of complete positions consumed so far.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Returns `true` if no complete position has been consumed.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Consumes the next value.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::NonFiniteData`] for NaN or infinite input.
    pub fn push(&mut self, x: f64) -> Result<(), WaveletError> {
        if !x.is_finite() {
            return Err(WaveletError::NonFiniteData);
        }
        self.stack.push(x);
        self.stats.push(NormalStats::from_value(x));
        self.filled += 1;
        if self.filled == self.nr_dim {
            self.filled = 0;
            self.complete_position();
        }
        Ok(())
    }

    fn complete_position(&mut self) {
        let i = self.coeffs.len();
        self.coeffs.push(f64::INFINITY);

        let nr_dim = self.nr_dim;
        let mut j = i;
        let mut mask = 1;
        let mut normalizer = FRAC_1_SQRT_2;
        // Binary-counter walk: every trailing one bit of `i` closes a sibling pair.
        while j & mask != 0 {
            let left = self.stack.len() - 2 * nr_dim;
            let right = left + nr_dim;
            let mut max_coeff = 0.0_f64;
            for d in 0..nr_dim {
                let (l, r) = (self.stack[left + d], self.stack[right + d]);
                max_coeff = max_coeff.max(normalizer * (l - r).abs());
                self.stack[left + d] = l + r;
            }
            self.coeffs[j] = max_coeff;
            self.stack.truncate(right);

            j -= mask;
            mask *= 2;
            normalizer *= FRAC_1_SQRT_2;
        }
    }

    /// Ends the stream.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::IncompleteDimensions`] | the last position is missing dimensions |
    /// | [`WaveletError::EmptyData`] | no position was completed |
    pub fn finish(mut self) -> Result<MaxletOutput, WaveletError> {
        if self.filled != 0 {
            return Err(WaveletError::IncompleteDimensions {
                position: self.coeffs.len(),
                filled: self.filled,
                nr_dim: self.nr_dim,
            });
        }
        if self.coeffs.is_empty() {
            return Err(WaveletError::EmptyData);
        }
        self.coeffs[0] = f64::INFINITY;
        debug!(positions = self.coeffs.len(), nr_dim = self.nr_dim, "maxlet transform done");
        Ok(MaxletOutput {
            coeffs: self.coeffs,
            stats: self.stats,
        })
    }
}

/// Result of a maxlet transform: one coefficient per position plus the raw
/// sufficient statistics of every value.
#[derive(Debug, Clone)]
pub struct MaxletOutput {
    coeffs: Vec<f64>,
    stats: RawStatistics,
}

impl MaxletOutput {
    /// Maximal absolute detail coefficient per position; `coeffs()[0]` is infinite.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Per-position sufficient statistics.
    pub fn stats(&self) -> &RawStatistics {
        &self.stats
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Always `false` for a finished transform.
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Splits into coefficients and statistics.
    pub fn into_parts(self) -> (Vec<f64>, RawStatistics) {
        (self.coeffs, self.stats)
    }
}

/// Runs the maxlet transform over whitespace or newline separated reals.
///
/// `size_hint` is an estimate of the number of positions and only affects
/// buffer pre-allocation.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::Io`] | the reader fails |
/// | [`WaveletError::Parse`] | a token is not a number |
/// | [`WaveletError::NonFiniteData`] | a value is NaN or infinite |
/// | [`WaveletError::IncompleteDimensions`] | the value count is not a multiple of `nr_dim` |
/// | [`WaveletError::EmptyData`] | the input holds no values |
pub fn maxlet_from_reader<R: BufRead>(
    mut reader: R,
    nr_dim: usize,
    size_hint: usize,
) -> Result<MaxletOutput, WaveletError> {
    let mut maxlet = MaxletTransform::with_capacity(nr_dim, size_hint)?;
    let mut line = String::new();
    let mut line_no = 0;
    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| WaveletError::Io(e.to_string()))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        for token in line.split_whitespace() {
            let x: f64 = token.parse().map_err(|_| WaveletError::Parse {
                line: line_no,
                token: token.to_string(),
            })?;
            maxlet.push(x)?;
        }
    }
    maxlet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haar::maxlet_coeffs;
    use approx::assert_relative_eq;

    fn stream(values: &[f64], nr_dim: usize) -> MaxletOutput {
        let mut m = MaxletTransform::new(nr_dim).unwrap();
        for &x in values {
            m.push(x).unwrap();
        }
        m.finish().unwrap()
    }

    #[test]
    fn constant_signal_has_zero_details() {
        let out = stream(&[4.0; 8], 1);
        assert!(out.coeffs()[0].is_infinite());
        for &c in &out.coeffs()[1..] {
            assert_eq!(c, 0.0);
        }
        assert_eq!(out.stats().len(), 8);
    }

    #[test]
    fn streaming_matches_batch_for_all_lengths() {
        let values: Vec<f64> = (0..37).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        for t in 1..=values.len() {
            let out = stream(&values[..t], 1);
            let batch = maxlet_coeffs(&values[..t], 1).unwrap();
            assert_eq!(out.len(), t);
            for (a, b) in out.coeffs().iter().zip(&batch) {
                if b.is_infinite() {
                    assert!(a.is_infinite(), "length {t}");
                } else {
                    assert_relative_eq!(*a, *b, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn streaming_matches_batch_multivariate() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 5) % 7) as f64).collect();
        let out = stream(&values, 3);
        let batch = maxlet_coeffs(&values, 3).unwrap();
        assert_eq!(out.len(), 10);
        for (a, b) in out.coeffs().iter().zip(&batch) {
            if b.is_infinite() {
                assert!(a.is_infinite());
            } else {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn incomplete_position_is_an_error() {
        let mut m = MaxletTransform::new(2).unwrap();
        for x in [1.0, 2.0, 3.0] {
            m.push(x).unwrap();
        }
        assert!(matches!(
            m.finish(),
            Err(WaveletError::IncompleteDimensions {
                position: 1,
                filled: 1,
                nr_dim: 2
            })
        ));
    }

    #[test]
    fn empty_stream_is_an_error() {
        let m = MaxletTransform::new(1).unwrap();
        assert!(matches!(m.finish(), Err(WaveletError::EmptyData)));
        assert!(matches!(
            MaxletTransform::new(0),
            Err(WaveletError::ZeroDimensions)
        ));
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut m = MaxletTransform::new(1).unwrap();
        assert!(matches!(
            m.push(f64::INFINITY),
            Err(WaveletError::NonFiniteData)
        ));
    }

    #[test]
    fn reader_parses_mixed_whitespace() {
        let input = "1.0 1.0\n\n3.0\t3.0\n";
        let out = maxlet_from_reader(input.as_bytes(), 1, 0).unwrap();
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out.coeffs()[2], 2.0);
        let (coeffs, stats) = out.into_parts();
        assert_eq!(coeffs.len(), 4);
        assert_eq!(stats.get(3, 0).map(|s| s.sum()), Some(3.0));
    }

    #[test]
    fn reader_reports_line_of_bad_token() {
        let input = "1.0\n2.0\nabc\n";
        match maxlet_from_reader(input.as_bytes(), 1, 3) {
            Err(WaveletError::Parse { line, token }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "abc");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn reader_rejects_nan_token() {
        assert!(matches!(
            maxlet_from_reader("1.0 NaN\n".as_bytes(), 1, 0),
            Err(WaveletError::NonFiniteData)
        ));
    }
}
