//! Per-iteration output of the samplers.

use crate::error::HmmError;
use crate::marginals::{Segment, StateMarginals};
use crate::normal::NormalParam;
use crate::theta::Theta;

/// Receives the sampled blocks and parameters of recorded iterations.
///
/// `record_block` is called once per block in order; the blocks of one
/// iteration cover every data position exactly once.
pub trait Recorder {
    /// Records one block of `size` positions in `state`.
    ///
    /// # Errors
    ///
    /// Implementations report inconsistent block sequences.
    fn record_block(&mut self, state: usize, size: usize) -> Result<(), HmmError>;

    /// Records the emission parameters after an iteration.
    fn record_theta(&mut self, theta: &Theta);
}

/// Recorder that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn record_block(&mut self, _state: usize, _size: usize) -> Result<(), HmmError> {
        Ok(())
    }

    fn record_theta(&mut self, _theta: &Theta) {}
}

/// Which outputs [`Records`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKinds {
    /// Posterior state marginals per position.
    pub marginals: bool,
    /// State segments (`size:state`) per iteration.
    pub sequences: bool,
    /// Emission parameters per iteration.
    pub parameters: bool,
    /// Block sizes per iteration.
    pub blocks: bool,
    /// Compression ratio per iteration.
    pub compression: bool,
    /// Number of marginal segments and stored values per iteration.
    pub segments: bool,
}

impl Default for RecordKinds {
    /// Marginals only.
    fn default() -> Self {
        Self {
            marginals: true,
            sequences: false,
            parameters: false,
            blocks: false,
            compression: false,
            segments: false,
        }
    }
}

/// In-memory recorder for all output kinds.
#[derive(Debug, Clone)]
pub struct Records {
    kinds: RecordKinds,
    len: usize,
    marginals: StateMarginals,
    sequences: Vec<Vec<Segment>>,
    blocks: Vec<Vec<usize>>,
    compression: Vec<f64>,
    segment_stats: Vec<(usize, usize)>,
    parameters: Vec<Vec<NormalParam>>,

    observed: usize,
    nr_blocks: usize,
    segment: Option<Segment>,
    current_segments: Vec<Segment>,
    current_blocks: Vec<usize>,
}

impl Records {
    /// Creates a recorder for `len` positions and `nr_states` states.
    pub fn new(len: usize, nr_states: usize, kinds: RecordKinds) -> Self {
        Self {
            kinds,
            len,
            marginals: StateMarginals::new(len, nr_states),
            sequences: Vec::new(),
            blocks: Vec::new(),
            compression: Vec::new(),
            segment_stats: Vec::new(),
            parameters: Vec::new(),
            observed: 0,
            nr_blocks: 0,
            segment: None,
            current_segments: Vec::new(),
            current_blocks: Vec::new(),
        }
    }

    /// Enabled outputs.
    pub fn kinds(&self) -> RecordKinds {
        self.kinds
    }

    /// Posterior state marginals.
    pub fn marginals(&self) -> &StateMarginals {
        &self.marginals
    }

    /// State segments of each recorded iteration.
    pub fn sequences(&self) -> &[Vec<Segment>] {
        &self.sequences
    }

    /// Block sizes of each recorded iteration.
    pub fn blocks(&self) -> &[Vec<usize>] {
        &self.blocks
    }

    /// Positions per block of each recorded iteration.
    pub fn compression(&self) -> &[f64] {
        &self.compression
    }

    /// Marginal segment count and stored values after each recorded
    /// iteration.
    pub fn segment_stats(&self) -> &[(usize, usize)] {
        &self.segment_stats
    }

    /// Emission parameters of each recorded iteration.
    pub fn parameters(&self) -> &[Vec<NormalParam>] {
        &self.parameters
    }

    /// Returns `true` unless an iteration is partially recorded.
    pub fn is_complete(&self) -> bool {
        self.observed == 0
    }

    /// Segmentation by most frequent state per position.
    ///
    /// # Errors
    ///
    /// See [`StateMarginals::max_margin_segmentation`].
    pub fn max_margin_segmentation(&self) -> Result<Vec<Segment>, HmmError> {
        self.marginals.max_margin_segmentation()
    }

    fn close_segment(&mut self, segment: Segment) -> Result<(), HmmError> {
        if self.kinds.marginals {
            self.marginals.add_record(segment.state, segment.size)?;
        }
        if self.kinds.sequences {
            self.current_segments.push(segment);
        }
        Ok(())
    }

    fn finish_iteration(&mut self) -> Result<(), HmmError> {
        if let Some(last) = self.segment.take() {
            self.close_segment(last)?;
        }
        if self.kinds.compression && self.nr_blocks > 0 {
            self.compression
                .push(self.len as f64 / self.nr_blocks as f64);
        }
        if self.kinds.segments {
            self.segment_stats
                .push((self.marginals.nr_segments(), self.marginals.internal_size()));
        }
        if self.kinds.sequences {
            self.sequences
                .push(std::mem::take(&mut self.current_segments));
        }
        if self.kinds.blocks {
            self.blocks.push(std::mem::take(&mut self.current_blocks));
        }
        self.observed = 0;
        self.nr_blocks = 0;
        Ok(())
    }
}

impl Recorder for Records {
    fn record_block(&mut self, state: usize, size: usize) -> Result<(), HmmError> {
        if self.observed + size > self.len {
            return Err(HmmError::RecordOverflow {
                observed: self.observed + size,
                len: self.len,
            });
        }
        let extends = self.segment.is_some_and(|seg| seg.state == state);
        if extends {
            if let Some(seg) = self.segment.as_mut() {
                seg.size += size;
            }
        } else if let Some(prev) = self.segment.replace(Segment { size, state }) {
            self.close_segment(prev)?;
        }
        if self.kinds.blocks {
            self.current_blocks.push(size);
        }
        self.nr_blocks += 1;
        self.observed += size;
        if self.observed == self.len {
            self.finish_iteration()?;
        }
        Ok(())
    }

    fn record_theta(&mut self, theta: &Theta) {
        if self.kinds.parameters {
            self.parameters.push(theta.params().to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> RecordKinds {
        RecordKinds {
            marginals: true,
            sequences: true,
            parameters: true,
            blocks: true,
            compression: true,
            segments: true,
        }
    }

    #[test]
    fn merges_blocks_into_segments() {
        let mut r = Records::new(10, 2, all());
        for (state, size) in [(0, 2), (0, 3), (1, 1), (1, 4)] {
            r.record_block(state, size).unwrap();
        }
        assert!(r.is_complete());
        assert_eq!(
            r.sequences(),
            &[vec![Segment { size: 5, state: 0 }, Segment { size: 5, state: 1 }]]
        );
        assert_eq!(r.blocks(), &[vec![2, 3, 1, 4]]);
        assert_eq!(r.compression(), &[2.5]);
        assert_eq!(r.segment_stats(), &[(2, 2 + 3)]);
        assert_eq!(
            r.marginals().rows().unwrap(),
            vec![(5, vec![1, 0]), (5, vec![0, 1])]
        );
    }

    #[test]
    fn consecutive_iterations() {
        let mut r = Records::new(4, 2, all());
        r.record_block(1, 4).unwrap();
        r.record_block(0, 1).unwrap();
        r.record_block(1, 3).unwrap();
        assert_eq!(r.sequences().len(), 2);
        assert_eq!(
            r.sequences()[1],
            vec![Segment { size: 1, state: 0 }, Segment { size: 3, state: 1 }]
        );
        assert_eq!(r.marginals().iterations(), 2);
        // position 0 is tied and resolves to the lower state
        assert_eq!(
            r.max_margin_segmentation().unwrap(),
            vec![Segment { size: 1, state: 0 }, Segment { size: 3, state: 1 }]
        );
    }

    #[test]
    fn overflow_is_rejected() {
        let mut r = Records::new(4, 2, RecordKinds::default());
        r.record_block(0, 3).unwrap();
        assert!(!r.is_complete());
        assert!(matches!(
            r.record_block(0, 2),
            Err(HmmError::RecordOverflow { observed: 5, len: 4 })
        ));
    }

    #[test]
    fn disabled_kinds_stay_empty() {
        let mut r = Records::new(3, 2, RecordKinds::default());
        r.record_block(0, 3).unwrap();
        assert!(r.sequences().is_empty());
        assert!(r.blocks().is_empty());
        assert!(r.compression().is_empty());
        assert_eq!(r.marginals().iterations(), 1);
    }
}
