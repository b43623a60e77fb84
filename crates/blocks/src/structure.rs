//! The block-structure interface shared by all partition kinds.

use std::ops::Range;

use crate::error::BlocksError;

/// Progress of a pull-based pass over the blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterState {
    /// No block has been produced since the last reset.
    #[default]
    NotStarted,
    /// At least one block has been produced and more may follow.
    Iterating,
    /// The last block has been passed; the block count is known.
    Finished,
}

/// A partition of positions `0..len()` into consecutive blocks, enumerated
/// with a stateful forward iterator.
///
/// ```text
/// init_forward()
/// while next_block() {
///     use start()..end(), block_size(), pos()
/// }
/// nr_blocks()   // valid now
/// ```
pub trait BlockStructure {
    /// Number of positions covered by all blocks.
    fn len(&self) -> usize;

    /// Returns `true` if the structure covers no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resets the iterator to before the first block.
    fn init_forward(&mut self);

    /// Advances to the next block. Returns `false` once all positions have
    /// been covered.
    fn next_block(&mut self) -> bool;

    /// Inclusive start of the current block.
    fn start(&self) -> usize;

    /// Exclusive end of the current block.
    fn end(&self) -> usize;

    /// Length of the current block.
    fn block_size(&self) -> usize {
        self.end() - self.start()
    }

    /// One-based number of the current block.
    fn pos(&self) -> Result<usize, BlocksError>;

    /// Number of blocks, known only after a complete pass.
    fn nr_blocks(&self) -> Result<usize, BlocksError>;

    /// Progress of the current pass.
    fn state(&self) -> IterState;

    /// Sets the breakpoint threshold. Structures that ignore thresholds accept
    /// any valid value without effect.
    fn set_threshold(&mut self, threshold: f64) -> Result<(), BlocksError>;

    /// Sets the universal threshold for noise variance `min_variance`, see
    /// [`universal_threshold`].
    fn set_variance_threshold(&mut self, min_variance: f64) -> Result<(), BlocksError> {
        let threshold = universal_threshold(self.len(), min_variance)?;
        self.set_threshold(threshold)
    }

    /// Average breakpoint weight, if the structure is weight based.
    fn avg_weight(&self) -> Option<f64> {
        None
    }
}

/// Universal wavelet threshold `sqrt(2 ln(T) var)`.
///
/// Smaller variances give lower thresholds and therefore finer blocks. For
/// `len <= 1` the smallest positive threshold is returned.
///
/// # Errors
///
/// Returns [`BlocksError::InvalidVariance`] unless `variance` is finite and
/// positive.
pub fn universal_threshold(len: usize, variance: f64) -> Result<f64, BlocksError> {
    if !(variance.is_finite() && variance > 0.0) {
        return Err(BlocksError::InvalidVariance(variance));
    }
    let t = (2.0 * (len.max(1) as f64).ln() * variance).sqrt();
    Ok(t.max(f64::MIN_POSITIVE))
}

/// Runs a full pass and returns every block as a half-open range.
///
/// Leaves the structure in the [`IterState::Finished`] state.
pub fn collect_blocks<B: BlockStructure + ?Sized>(blocks: &mut B) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    blocks.init_forward();
    while blocks.next_block() {
        out.push(blocks.start()..blocks.end());
    }
    out
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), BlocksError> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(BlocksError::InvalidThreshold(threshold))
    }
}
