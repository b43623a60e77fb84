//! Block structure with predetermined block sizes.

use crate::error::BlocksError;
use crate::structure::{BlockStructure, IterState, validate_threshold};

/// Consecutive blocks of fixed sizes, independent of any threshold.
///
/// With a block size of 1 every position is its own block, which turns the
/// compressed sampler into a plain position-wise HMM.
#[derive(Debug, Clone)]
pub struct FixedBlocks {
    sizes: Vec<usize>,
    len: usize,
    state: IterState,
    counter: usize,
    start: usize,
    end: usize,
}

impl FixedBlocks {
    /// Creates blocks with the given sizes, in order.
    ///
    /// # Errors
    ///
    /// Returns [`BlocksError::EmptyInput`] for no sizes, or
    /// [`BlocksError::ZeroBlockSize`] if any size is zero.
    pub fn new(sizes: Vec<usize>) -> Result<Self, BlocksError> {
        if sizes.is_empty() {
            return Err(BlocksError::EmptyInput);
        }
        if let Some(index) = sizes.iter().position(|&s| s == 0) {
            return Err(BlocksError::ZeroBlockSize { index });
        }
        let len = sizes.iter().sum();
        Ok(Self {
            sizes,
            len,
            state: IterState::NotStarted,
            counter: 0,
            start: 0,
            end: 0,
        })
    }

    /// Covers `len` positions with blocks of `size`; the last block may be shorter.
    pub fn uniform(len: usize, size: usize) -> Result<Self, BlocksError> {
        if len == 0 {
            return Err(BlocksError::EmptyInput);
        }
        if size == 0 {
            return Err(BlocksError::ZeroBlockSize { index: 0 });
        }
        let mut sizes = vec![size; len / size];
        if len % size != 0 {
            sizes.push(len % size);
        }
        Self::new(sizes)
    }

    /// Block sizes in order.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }
}

impl BlockStructure for FixedBlocks {
    fn len(&self) -> usize {
        self.len
    }

    fn init_forward(&mut self) {
        self.state = IterState::NotStarted;
        self.counter = 0;
        self.start = 0;
        self.end = 0;
    }

    fn next_block(&mut self) -> bool {
        if self.end >= self.len {
            self.state = IterState::Finished;
            return false;
        }
        self.state = IterState::Iterating;
        self.start = self.end;
        self.end = self.start + self.sizes[self.counter];
        self.counter += 1;
        true
    }

    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }

    fn pos(&self) -> Result<usize, BlocksError> {
        if self.counter == 0 {
            return Err(BlocksError::NoCurrentBlock);
        }
        Ok(self.counter)
    }

    fn nr_blocks(&self) -> Result<usize, BlocksError> {
        Ok(self.sizes.len())
    }

    fn state(&self) -> IterState {
        self.state
    }

    fn set_threshold(&mut self, threshold: f64) -> Result<(), BlocksError> {
        validate_threshold(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::collect_blocks;

    #[test]
    fn explicit_sizes() {
        let mut b = FixedBlocks::new(vec![2, 1, 3]).unwrap();
        assert_eq!(b.len(), 6);
        assert_eq!(b.nr_blocks().unwrap(), 3);
        assert_eq!(collect_blocks(&mut b), vec![0..2, 2..3, 3..6]);
        assert_eq!(b.state(), IterState::Finished);
    }

    #[test]
    fn uniform_with_remainder() {
        let mut b = FixedBlocks::uniform(7, 3).unwrap();
        assert_eq!(b.sizes(), &[3, 3, 1]);
        assert_eq!(collect_blocks(&mut b), vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn unit_blocks() {
        let mut b = FixedBlocks::uniform(4, 1).unwrap();
        b.set_threshold(2.0).unwrap();
        assert_eq!(collect_blocks(&mut b).len(), 4);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(
            FixedBlocks::new(vec![]),
            Err(BlocksError::EmptyInput)
        ));
        assert!(matches!(
            FixedBlocks::new(vec![1, 0]),
            Err(BlocksError::ZeroBlockSize { index: 1 })
        ));
        assert!(matches!(
            FixedBlocks::uniform(0, 1),
            Err(BlocksError::EmptyInput)
        ));
    }
}
