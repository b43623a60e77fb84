//! Error types for the wavehmm-stats crate.

/// Error type for all fallible operations in the wavehmm-stats crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatsError {
    /// Returned when a statistics array holds no positions.
    #[error("statistics array is empty")]
    EmptyData,

    /// Returned when the number of data dimensions is zero.
    #[error("number of dimensions must be positive")]
    ZeroDimensions,

    /// Returned when the number of values is not a multiple of the dimension count.
    #[error("statistics length {len} is not a multiple of {nr_dim} dimensions")]
    DimensionMismatch {
        /// Number of stored values.
        len: usize,
        /// Number of data dimensions.
        nr_dim: usize,
    },

    /// Returned when a cell size of zero is requested.
    #[error("cell size must be positive")]
    ZeroCellSize,

    /// Returned when a half-open range is empty or exceeds the data.
    #[error("invalid range [{start}, {end}) for {len} positions")]
    InvalidRange {
        /// Inclusive start position.
        start: usize,
        /// Exclusive end position.
        end: usize,
        /// Number of positions available.
        len: usize,
    },

    /// Returned when a dimension index is out of bounds.
    #[error("dimension {dim} out of bounds for {nr_dim} dimensions")]
    DimensionOutOfBounds {
        /// Requested dimension.
        dim: usize,
        /// Number of data dimensions.
        nr_dim: usize,
    },

    /// Returned when moments are requested from zero observations.
    #[error("cannot compute moments from zero observations")]
    NoObservations,

    /// Returned when a Kahan scan receives a zero step size.
    #[error("step size for Kahan summation must be positive")]
    ZeroStep,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_data() {
        assert_eq!(StatsError::EmptyData.to_string(), "statistics array is empty");
    }

    #[test]
    fn error_dimension_mismatch() {
        let e = StatsError::DimensionMismatch { len: 7, nr_dim: 2 };
        assert_eq!(
            e.to_string(),
            "statistics length 7 is not a multiple of 2 dimensions"
        );
    }

    #[test]
    fn error_invalid_range() {
        let e = StatsError::InvalidRange {
            start: 4,
            end: 2,
            len: 10,
        };
        assert_eq!(e.to_string(), "invalid range [4, 2) for 10 positions");
    }

    #[test]
    fn error_dimension_out_of_bounds() {
        let e = StatsError::DimensionOutOfBounds { dim: 3, nr_dim: 1 };
        assert_eq!(e.to_string(), "dimension 3 out of bounds for 1 dimensions");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<StatsError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<StatsError>();
    }
}
