//! Block iteration bound to block sufficient statistics.

use tracing::warn;
use wavehmm_blocks::BlockStructure;
use wavehmm_stats::{IntegralArray, KahanAggregator, NormalStats};

use crate::conjugate::NormalInverseGamma;
use crate::error::HmmError;
use crate::mapping::Mapping;
use crate::theta::{Theta, ThetaHyperParam};

/// Observed data as seen by the samplers: a block structure together with
/// the statistics needed to score each block.
///
/// Iterating with [`next_block`](Self::next_block) keeps
/// [`suff_stats`](Self::suff_stats) in sync with the current block.
#[derive(Debug, Clone)]
pub struct Emissions<B> {
    stats: IntegralArray,
    blocks: B,
}

impl<B: BlockStructure> Emissions<B> {
    /// Binds `stats` and `blocks`.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::LengthMismatch`] if they cover different lengths.
    pub fn new(stats: IntegralArray, blocks: B) -> Result<Self, HmmError> {
        if stats.len() != blocks.len() {
            return Err(HmmError::LengthMismatch {
                stats: stats.len(),
                blocks: blocks.len(),
            });
        }
        Ok(Self { stats, blocks })
    }

    /// Number of data positions.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there is no data.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of data dimensions.
    pub fn nr_dim(&self) -> usize {
        self.stats.nr_dim()
    }

    /// The block structure.
    pub fn blocks(&self) -> &B {
        &self.blocks
    }

    /// The statistics store.
    pub fn stats(&self) -> &IntegralArray {
        &self.stats
    }

    /// Restarts block iteration.
    pub fn init_forward(&mut self) {
        self.blocks.init_forward();
    }

    /// Advances to the next block and loads its statistics.
    ///
    /// # Errors
    ///
    /// Propagates statistics range errors.
    pub fn next_block(&mut self) -> Result<bool, HmmError> {
        if !self.blocks.next_block() {
            return Ok(false);
        }
        self.stats
            .set_stats(self.blocks.start(), self.blocks.end())?;
        Ok(true)
    }

    /// Size of the current block.
    pub fn block_size(&self) -> usize {
        self.blocks.block_size()
    }

    /// Number of blocks, available after a complete pass.
    ///
    /// # Errors
    ///
    /// Returns [`HmmError::Blocks`] before the pass is complete.
    pub fn nr_blocks(&self) -> Result<usize, HmmError> {
        Ok(self.blocks.nr_blocks()?)
    }

    /// Statistics of the current block in dimension `dim`.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= nr_dim()`.
    pub fn suff_stat(&self, dim: usize) -> NormalStats {
        self.stats.suff_stat(dim)
    }

    /// Statistics of the current block for all dimensions.
    pub fn suff_stats(&self) -> &[NormalStats] {
        self.stats.suff_stats()
    }

    /// Average breakpoint weight of the block structure, if any.
    pub fn avg_weight(&self) -> Option<f64> {
        self.blocks.avg_weight()
    }

    /// Sets the breakpoint threshold.
    ///
    /// # Errors
    ///
    /// Propagates threshold validation errors.
    pub fn create_blocks(&mut self, threshold: f64) -> Result<(), HmmError> {
        self.blocks.set_threshold(threshold)?;
        Ok(())
    }

    /// Sets the universal threshold for the smallest emission variance of
    /// `theta`.
    ///
    /// # Errors
    ///
    /// Propagates threshold validation errors.
    pub fn create_blocks_for(&mut self, theta: &Theta) -> Result<(), HmmError> {
        self.blocks
            .set_variance_threshold(theta.threshold_value())?;
        Ok(())
    }

    /// Routes the statistics of every block into the posterior of the
    /// component its state maps to, one dimension at a time.
    ///
    /// Blocks of size at most `min_block_size` are left out of the emission
    /// statistics but still passed to `visit` together with their state.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`HmmError::StateSequenceMismatch`] | `states` does not have one entry per block |
    /// | [`HmmError::IndexOutOfBounds`] | a state is outside the mapping |
    /// | [`HmmError::DimensionMismatch`] | mapping and data dimensions differ |
    ///
    /// Errors returned by `visit` are propagated.
    pub fn aggregate_statistics<F>(
        &mut self,
        states: &[usize],
        mapping: &Mapping,
        tau_theta: &mut ThetaHyperParam,
        min_block_size: usize,
        mut visit: F,
    ) -> Result<(), HmmError>
    where
        F: FnMut(usize, usize) -> Result<(), HmmError>,
    {
        if mapping.nr_dim() != self.nr_dim() {
            return Err(HmmError::DimensionMismatch {
                expected: self.nr_dim(),
                got: mapping.nr_dim(),
            });
        }
        let mut aggregators = vec![KahanAggregator::<NormalStats>::new(); tau_theta.nr_params()];

        let mut t = 0;
        self.init_forward();
        while self.next_block()? {
            let state = *states.get(t).ok_or(HmmError::StateSequenceMismatch {
                states: states.len(),
                blocks: t + 1,
            })?;
            if state >= mapping.nr_states() {
                return Err(HmmError::IndexOutOfBounds {
                    index: state,
                    len: mapping.nr_states(),
                });
            }
            let n = self.block_size();
            if n > min_block_size {
                for (d, &component) in mapping.components(state).iter().enumerate() {
                    let len = aggregators.len();
                    aggregators
                        .get_mut(component)
                        .ok_or(HmmError::IndexOutOfBounds {
                            index: component,
                            len,
                        })?
                        .add(self.stats.suff_stat(d), n);
                }
            }
            visit(state, n)?;
            t += 1;
        }
        if t != states.len() {
            return Err(HmmError::StateSequenceMismatch {
                states: states.len(),
                blocks: t,
            });
        }

        for (component, agg) in aggregators.iter().enumerate() {
            if agg.nr_terms() > 0 {
                tau_theta.add_observation(&agg.sum(), agg.nr_terms(), component)?;
            }
        }
        Ok(())
    }

    /// Automatic emission prior from the data.
    ///
    /// Blocks are created at the average breakpoint weight; the mean and
    /// variance of the block means then centre the prior (see
    /// [`NormalInverseGamma::auto_prior`]). If the block means do not vary,
    /// `noise_var` is used as the data variance instead.
    ///
    /// Leaves the threshold at the average weight.
    ///
    /// # Errors
    ///
    /// Propagates threshold and prior errors; fails if neither the block
    /// means nor `noise_var` provide a positive variance.
    pub fn auto_prior(
        &mut self,
        s2: f64,
        p: f64,
        noise_var: f64,
    ) -> Result<NormalInverseGamma, HmmError> {
        let threshold = match self.avg_weight() {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => f64::MAX,
        };
        self.create_blocks(threshold)?;

        let mut means = NormalStats::default();
        let mut count = 0;
        self.init_forward();
        while self.next_block()? {
            let n = self.block_size() as f64;
            for s in self.suff_stats() {
                means.add_value(s.sum() / n);
                count += 1;
            }
        }
        let mean = means.mean(count)?;
        let mut var = means.variance(count)?;
        if !(var.is_finite() && var > 0.0) {
            warn!(
                block_variance = var,
                noise_var, "block means do not vary, using the noise variance for the prior"
            );
            var = noise_var;
        }
        NormalInverseGamma::auto_prior(s2, p, mean, var)
    }
}
