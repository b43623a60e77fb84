//! Error types for the wavehmm-hmm crate.

use wavehmm_blocks::BlocksError;
use wavehmm_stats::StatsError;
use wavehmm_wavelet::WaveletError;

/// Error type for all fallible operations in the wavehmm-hmm crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HmmError {
    /// Propagated from the statistics store.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Propagated from the wavelet transform.
    #[error(transparent)]
    Wavelet(#[from] WaveletError),

    /// Propagated from the block structure.
    #[error(transparent)]
    Blocks(#[from] BlocksError),

    /// Returned when a prior or configuration value is out of range.
    #[error("invalid {name}: {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Accepted range.
        reason: &'static str,
    },

    /// Returned when a state mapping would produce fewer than two states.
    #[error("{components} components over {nr_dim} dimensions yield {states} states, need at least 2")]
    TooFewStates {
        /// Emission components per dimension.
        components: usize,
        /// Data dimensions.
        nr_dim: usize,
        /// Resulting number of states.
        states: usize,
    },

    /// Returned when the number of hidden states overflows.
    #[error("{components}^{nr_dim} states overflow")]
    TooManyStates {
        /// Emission components per dimension.
        components: usize,
        /// Data dimensions.
        nr_dim: usize,
    },

    /// Returned when statistics and block structure cover different lengths.
    #[error("statistics cover {stats} positions but blocks cover {blocks}")]
    LengthMismatch {
        /// Positions in the statistics store.
        stats: usize,
        /// Positions in the block structure.
        blocks: usize,
    },

    /// Returned when two components disagree on the number of dimensions.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected number of dimensions.
        expected: usize,
        /// Provided number of dimensions.
        got: usize,
    },

    /// Returned when a state sequence does not have one state per block.
    #[error("state sequence has {states} entries for {blocks} blocks")]
    StateSequenceMismatch {
        /// Length of the state sequence.
        states: usize,
        /// Number of blocks.
        blocks: usize,
    },

    /// Returned when a state or parameter index exceeds its range.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Valid length.
        len: usize,
    },

    /// Returned when a block log-likelihood is NaN or infinite.
    #[error("emission inner product is not finite")]
    NonFiniteInnerProduct,

    /// Returned when a backward variable turns negative, indicating numerical corruption.
    #[error("negative backward variable {value} at block {block}, state {state}")]
    NegativeBackwardVariable {
        /// Zero-based block index.
        block: usize,
        /// State index.
        state: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when a categorical distribution has no valid probability mass.
    #[error("cannot sample from categorical weights: {0}")]
    DegenerateWeights(String),

    /// Returned when a Normal-inverse-gamma posterior receives scatter without observations.
    #[error("cannot add a sum of squares of {sum_sq} from zero observations")]
    EmptyObservation {
        /// Sum of squares that was passed.
        sum_sq: f64,
    },

    /// Returned when a random distribution cannot be constructed.
    #[error("invalid distribution: {0}")]
    Distribution(String),

    /// Returned when a sampling schedule cannot be parsed.
    #[error("invalid schedule at token {position} ({token:?}): {reason}")]
    InvalidSchedule {
        /// Zero-based token position.
        position: usize,
        /// Offending token, empty at end of input.
        token: String,
        /// What was expected.
        reason: &'static str,
    },

    /// Returned when recorded blocks exceed the length of the data.
    #[error("recorded {observed} positions but the data has {len}")]
    RecordOverflow {
        /// Positions recorded in the current iteration.
        observed: usize,
        /// Number of data positions.
        len: usize,
    },

    /// Returned when marginals are read before the current iteration is complete.
    #[error("marginals are incomplete: current iteration has covered {covered} of {len} positions")]
    IncompleteRecord {
        /// Positions recorded in the current iteration.
        covered: usize,
        /// Number of data positions.
        len: usize,
    },
}
