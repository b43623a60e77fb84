//! Jump-pointer index over breakpoint weights.

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::error::BlocksError;
use crate::pointer::JumpPointer;
use crate::structure::{BlockStructure, IterState, validate_threshold};

/// Block structure induced by thresholding breakpoint weights.
///
/// A new block starts at 0 and at every position whose weight is at least
/// the current threshold. For every position `i` the index stores a jump
/// pointer: the length of the longest run after `i` whose weights are all
/// strictly below `weights[i]`. Whenever the iterator reaches a position
/// below the threshold it can skip that whole run, so a pass costs time
/// proportional to the number of blocks rather than to the length.
///
/// Pointers are stored as `P`, which caps the longest single jump at
/// `min(len, P::MAX)`.
///
/// ```rust
/// use wavehmm_blocks::{BlockStructure, BreakpointArray, collect_blocks};
///
/// let weights = vec![f64::INFINITY, 5.0, 1.0, 1.0, 5.0, 1.0];
/// let mut blocks: BreakpointArray = BreakpointArray::new(weights).unwrap();
/// blocks.set_threshold(3.0).unwrap();
/// assert_eq!(collect_blocks(&mut blocks), vec![0..1, 1..4, 4..6]);
/// assert_eq!(blocks.nr_blocks().unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct BreakpointArray<P: JumpPointer = u16> {
    weights: Vec<f64>,
    pointers: Vec<P>,
    max_jump: usize,
    threshold: f64,
    state: IterState,
    counter: usize,
    start: usize,
    end: usize,
    _pointer: PhantomData<P>,
}

impl<P: JumpPointer> BreakpointArray<P> {
    /// Builds the index, taking ownership of `weights`.
    ///
    /// `weights[i]` is the weight of the boundary between positions `i - 1`
    /// and `i`; `weights[0]` is ignored for block boundaries. Infinite
    /// weights are allowed and always break.
    ///
    /// Until a threshold is set only infinite weights start blocks.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`BlocksError::EmptyInput`] | `weights` is empty |
    /// | [`BlocksError::InvalidWeight`] | a weight is NaN or negative |
    pub fn new(weights: Vec<f64>) -> Result<Self, BlocksError> {
        if weights.is_empty() {
            return Err(BlocksError::EmptyInput);
        }
        if let Some((index, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.is_nan() || **w < 0.0)
        {
            return Err(BlocksError::InvalidWeight { index, value });
        }

        let size = weights.len();
        let max_jump = size.min(P::MAX);
        let pointers = build_pointers::<P>(&weights, max_jump);

        Ok(Self {
            weights,
            pointers,
            max_jump,
            threshold: f64::INFINITY,
            state: IterState::NotStarted,
            counter: 0,
            start: 0,
            end: 0,
            _pointer: PhantomData,
        })
    }

    /// Breakpoint weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Jump pointer of position `i`.
    pub fn jump(&self, i: usize) -> Option<usize> {
        self.pointers.get(i).map(|p| p.to_usize())
    }

    /// Longest jump the index can take in one step.
    pub fn max_jump(&self) -> usize {
        self.max_jump
    }

    /// Current threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sum of the finite weights divided by the `len - 1` positions after
    /// the sentinel. Infinite weights count as positions but add nothing.
    pub fn mean_weight(&self) -> f64 {
        let size = self.weights.len();
        if size < 2 {
            return 0.0;
        }
        let sum: f64 = self.weights[1..].iter().filter(|w| w.is_finite()).sum();
        sum / (size - 1) as f64
    }
}

/// Single left-to-right pass with a monotonically decreasing stack of
/// indices. Each index is closed when a later weight is at least as large,
/// when it reaches the maximum jump width, or at the end of the array.
fn build_pointers<P: JumpPointer>(weights: &[f64], max_jump: usize) -> Vec<P> {
    let size = weights.len();
    let mut pointers = vec![P::from_usize(max_jump); size];
    let mut stack: VecDeque<usize> = VecDeque::with_capacity(64);
    stack.push_back(0);

    for right in 1..size {
        if stack.front().is_some_and(|&front| right - front == max_jump) {
            stack.pop_front();
        }
        while let Some(&left) = stack.back() {
            if weights[left] <= weights[right] {
                pointers[left] = P::from_usize(right - left);
                stack.pop_back();
            } else {
                break;
            }
        }
        stack.push_back(right);
    }
    while let Some(left) = stack.pop_back() {
        pointers[left] = P::from_usize(size - left);
    }
    pointers
}

impl<P: JumpPointer> BlockStructure for BreakpointArray<P> {
    fn len(&self) -> usize {
        self.weights.len()
    }

    fn init_forward(&mut self) {
        self.state = IterState::NotStarted;
        self.counter = 0;
        self.start = 0;
        self.end = 0;
    }

    fn next_block(&mut self) -> bool {
        let size = self.weights.len();
        if self.end >= size {
            self.state = IterState::Finished;
            return false;
        }
        self.state = IterState::Iterating;
        self.counter += 1;
        self.start = self.end;
        let mut end = self.start + 1;
        while end < size && self.weights[end] < self.threshold {
            end += self.pointers[end].to_usize();
        }
        self.end = end;
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
        if self.state != IterState::Finished {
            return Err(BlocksError::IterationIncomplete);
        }
        Ok(self.counter)
    }

    fn state(&self) -> IterState {
        self.state
    }

    fn set_threshold(&mut self, threshold: f64) -> Result<(), BlocksError> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        self.init_forward();
        Ok(())
    }

    fn avg_weight(&self) -> Option<f64> {
        Some(self.mean_weight())
    }
}
