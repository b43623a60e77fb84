//! Run-length encoded posterior state marginals.

use std::collections::VecDeque;
use std::fmt;

use crate::error::HmmError;

/// A run of positions sharing one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Number of positions.
    pub size: usize,
    /// State label.
    pub state: usize,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.size, self.state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MarginalSegment {
    size: usize,
    // trimmed after the highest state with a non-zero count
    counts: Vec<u64>,
}

impl MarginalSegment {
    fn increment(&mut self, state: usize) {
        if self.counts.len() <= state {
            self.counts.resize(state + 1, 0);
        }
        self.counts[state] += 1;
    }
}

/// Per-position state counts over recorded iterations, stored as segments
/// of positions whose counts are identical.
///
/// Each iteration records its segmentation left to right. The store is a
/// ring: the front segment is consumed, its count updated, and the result
/// appended at the back, splitting it where the new segmentation has a
/// boundary inside it. After a complete iteration every position has been
/// rotated exactly once and the order is restored.
///
/// ```rust
/// use wavehmm_hmm::StateMarginals;
///
/// let mut m = StateMarginals::new(5, 2);
/// m.add_record(0, 3).unwrap();
/// m.add_record(1, 2).unwrap();
/// m.add_record(0, 5).unwrap();
/// let rows = m.rows().unwrap();
/// assert_eq!(rows, vec![(3, vec![2, 0]), (2, vec![1, 1])]);
/// ```
#[derive(Debug, Clone)]
pub struct StateMarginals {
    segments: VecDeque<MarginalSegment>,
    len: usize,
    nr_states: usize,
    covered: usize,
    iterations: usize,
}

impl StateMarginals {
    /// Creates empty marginals for `len` positions and at least `nr_states`
    /// output columns.
    pub fn new(len: usize, nr_states: usize) -> Self {
        let mut segments = VecDeque::new();
        segments.push_back(MarginalSegment {
            size: len,
            counts: Vec::new(),
        });
        Self {
            segments,
            len,
            nr_states,
            covered: 0,
            iterations: 0,
        }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no positions.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of complete iterations recorded.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of distinct segments.
    pub fn nr_segments(&self) -> usize {
        self.segments.len()
    }

    /// Number of stored values: one size plus the count vector per segment.
    pub fn internal_size(&self) -> usize {
        self.segments.iter().map(|s| 1 + s.counts.len()).sum()
    }

    /// Returns `true` unless an iteration is partially recorded.
    pub fn is_complete(&self) -> bool {
        self.covered == 0
    }

    /// Counts `state` for the next `size` positions of the current
    /// iteration.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::RecordOverflow`] if the iteration would exceed
    /// the number of positions.
    pub fn add_record(&mut self, state: usize, size: usize) -> Result<(), HmmError> {
        if self.covered + size > self.len {
            return Err(HmmError::RecordOverflow {
                observed: self.covered + size,
                len: self.len,
            });
        }
        let mut remaining = size;
        while remaining > 0 {
            let Some(mut front) = self.segments.pop_front() else {
                break;
            };
            if remaining < front.size {
                let mut piece = MarginalSegment {
                    size: remaining,
                    counts: front.counts.clone(),
                };
                piece.increment(state);
                front.size -= remaining;
                self.segments.push_front(front);
                self.segments.push_back(piece);
                remaining = 0;
            } else {
                remaining -= front.size;
                front.increment(state);
                self.segments.push_back(front);
            }
        }
        self.covered += size;
        if self.covered == self.len {
            self.covered = 0;
            self.iterations += 1;
        }
        Ok(())
    }

    /// Segment sizes with their per-state counts, padded to at least
    /// `nr_states` columns.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::IncompleteRecord`] while an iteration is partially
    /// recorded.
    pub fn rows(&self) -> Result<Vec<(usize, Vec<u64>)>, HmmError> {
        self.check_complete()?;
        let width = self
            .segments
            .iter()
            .map(|s| s.counts.len())
            .max()
            .unwrap_or(0)
            .max(self.nr_states);
        Ok(self
            .segments
            .iter()
            .map(|s| {
                let mut counts = s.counts.clone();
                counts.resize(width, 0);
                debug_assert_eq!(counts.iter().sum::<u64>(), self.iterations as u64);
                (s.size, counts)
            })
            .collect())
    }

    /// Segmentation that assigns every position its most frequent state,
    /// the lowest state on ties, with adjacent equal states merged.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::IncompleteRecord`] while an iteration is partially
    /// recorded.
    pub fn max_margin_segmentation(&self) -> Result<Vec<Segment>, HmmError> {
        self.check_complete()?;
        let mut out: Vec<Segment> = Vec::new();
        for s in &self.segments {
            let mut best = 0;
            let mut best_count = 0;
            for (state, &c) in s.counts.iter().enumerate() {
                if c > best_count {
                    best = state;
                    best_count = c;
                }
            }
            match out.last_mut() {
                Some(last) if last.state == best => last.size += s.size,
                _ => out.push(Segment {
                    size: s.size,
                    state: best,
                }),
            }
        }
        Ok(out)
    }

    fn check_complete(&self) -> Result<(), HmmError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(HmmError::IncompleteRecord {
                covered: self.covered,
                len: self.len,
            })
        }
    }
}
