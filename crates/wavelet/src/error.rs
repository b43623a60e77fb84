//! Error types for the wavehmm-wavelet crate.

use wavehmm_stats::StatsError;

/// Error type for all fallible operations in the wavehmm-wavelet crate.
///
/// Covers input validation, stream parsing, and shape mismatches between
/// values and data dimensions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaveletError {
    /// Returned when a transform receives no values.
    #[error("input contains no values")]
    EmptyData,

    /// Returned when the number of data dimensions is zero.
    #[error("number of dimensions must be positive")]
    ZeroDimensions,

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when the number of values is not a multiple of the dimension count.
    #[error("array size {len} is not a multiple of {nr_dim} dimensions")]
    DimensionMismatch {
        /// Number of values provided.
        len: usize,
        /// Number of data dimensions.
        nr_dim: usize,
    },

    /// Returned when a stream ends before the last position has all dimensions.
    #[error("input ended after {filled} of {nr_dim} dimensions at position {position}")]
    IncompleteDimensions {
        /// Index of the incomplete position.
        position: usize,
        /// Number of dimensions read for that position.
        filled: usize,
        /// Number of data dimensions.
        nr_dim: usize,
    },

    /// Returned when the orthonormal transform gets a length that is not a power of two.
    #[error("length {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// Returned when the input series is shorter than the minimum required length.
    #[error("series too short: got {len} observations, need at least {min}")]
    SeriesTooShort {
        /// Number of observations provided.
        len: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when a token in a text stream is not a real number.
    #[error("cannot parse {token:?} as a number on line {line}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// Returned when reading the input stream fails.
    #[error("failed to read input: {0}")]
    Io(String),

    /// Returned when the breakpoint weight multiplier is not finite and positive.
    #[error("weight multiplier must be finite and positive, got {0}")]
    InvalidMultiplier(f64),

    /// Propagated from the statistics store.
    #[error(transparent)]
    Stats(#[from] StatsError),
}
