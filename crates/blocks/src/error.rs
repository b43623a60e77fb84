//! Error types for the wavehmm-blocks crate.

/// Error type for all fallible operations in the wavehmm-blocks crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BlocksError {
    /// Returned when a block structure is built from no weights or sizes.
    #[error("block structure input is empty")]
    EmptyInput,

    /// Returned when a breakpoint weight is NaN or negative.
    #[error("invalid breakpoint weight {value} at position {index}")]
    InvalidWeight {
        /// Position of the weight.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when a fixed block size is zero.
    #[error("block {index} has size zero")]
    ZeroBlockSize {
        /// Index of the block.
        index: usize,
    },

    /// Returned when a threshold is not finite and positive.
    #[error("threshold must be finite and positive, got {0}")]
    InvalidThreshold(f64),

    /// Returned when a variance used to derive a threshold is not finite and positive.
    #[error("variance must be finite and positive, got {0}")]
    InvalidVariance(f64),

    /// Returned when the block count is requested before a full pass.
    #[error("number of blocks is only known after a complete pass over all blocks")]
    IterationIncomplete,

    /// Returned when the current block index is requested before the first block.
    #[error("no block has been visited yet")]
    NoCurrentBlock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_weight() {
        let e = BlocksError::InvalidWeight {
            index: 3,
            value: -1.5,
        };
        assert_eq!(e.to_string(), "invalid breakpoint weight -1.5 at position 3");
    }

    #[test]
    fn error_invalid_threshold() {
        assert_eq!(
            BlocksError::InvalidThreshold(0.0).to_string(),
            "threshold must be finite and positive, got 0"
        );
    }

    #[test]
    fn error_iteration_incomplete() {
        assert_eq!(
            BlocksError::IterationIncomplete.to_string(),
            "number of blocks is only known after a complete pass over all blocks"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<BlocksError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<BlocksError>();
    }
}
