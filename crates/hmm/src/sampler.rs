//! Hidden state sampling over compressed blocks.
//!
//! Both samplers score a block of `n` positions with statistics `s` in
//! state `k` by
//!
//! ```text
//! E(k) = <s, theta_k> - n * logZ(theta_k) [+ (n - 1) * ln A(k, k)]
//! ```
//!
//! so a block costs the same regardless of its length. After drawing the
//! states, a second sweep over the blocks feeds the emission statistics,
//! transition counts and state occupancy into the posteriors.

use std::str::FromStr;

use tracing::warn;
use wavehmm_blocks::BlockStructure;

use crate::categorical::sample_categorical;
use crate::emissions::Emissions;
use crate::error::HmmError;
use crate::model::HmmModel;
use crate::records::Recorder;
use crate::transitions::Transitions;
use crate::trellis::Trellis;

/// How hidden states are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Independent draws per block, ignoring transitions.
    Mixture,
    /// Forward filtering, backward sampling.
    ForwardBackward,
}

impl FromStr for SamplingMethod {
    type Err = HmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" | "mixture" => Ok(Self::Mixture),
            "F" | "forward-backward" => Ok(Self::ForwardBackward),
            _ => Err(HmmError::InvalidSchedule {
                position: 0,
                token: s.to_string(),
                reason: "unknown sampling method",
            }),
        }
    }
}

/// One state per block, reused across iterations.
#[derive(Debug, Clone, Default)]
pub struct StateSequence {
    states: Vec<usize>,
    trellis: Trellis,
    // block sizes of the last forward pass
    block_sizes: Vec<f64>,
}

impl StateSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampled states, one per block.
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Number of blocks in the last draw.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` before the first draw.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Draws states with `method` and updates the posteriors of `model`.
    ///
    /// When `record` is set every block is passed to `recorder`.
    ///
    /// # Errors
    ///
    /// Propagates errors of the chosen sampler.
    pub fn sample<B, R>(
        &mut self,
        method: SamplingMethod,
        y: &mut Emissions<B>,
        model: &mut HmmModel,
        recorder: &mut R,
        record: bool,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError>
    where
        B: BlockStructure,
        R: Recorder + ?Sized,
    {
        match method {
            SamplingMethod::Mixture => self.sample_mixture(y, model, recorder, record, rng),
            SamplingMethod::ForwardBackward => {
                self.sample_forward_backward(y, model, recorder, record, rng)
            }
        }
    }

    /// Forward filtering over blocks followed by backward sampling.
    ///
    /// Backward weights include the self-transition slack of their block and
    /// are rescaled in log space, so long blocks cannot underflow a row. A
    /// forward or backward row whose weights vanish is replaced by the
    /// uniform distribution with a warning. A negative backward weight aborts
    /// with [`HmmError::NegativeBackwardVariable`].
    ///
    /// # Errors
    ///
    /// Returns emission, sampling and posterior update errors.
    pub fn sample_forward_backward<B, R>(
        &mut self,
        y: &mut Emissions<B>,
        model: &mut HmmModel,
        recorder: &mut R,
        record: bool,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError>
    where
        B: BlockStructure,
        R: Recorder + ?Sized,
    {
        self.forward_filter(y, model)?;

        let a = &model.transitions;
        let k = a.nr_states();
        let use_self = model.config.use_self_transitions();
        let log_a: Vec<f64> = (0..k).map(|s| a.get(s, s).ln()).collect();
        let mut log_slack = vec![0.0; k];

        // row 0 holds the initial distribution, row t block t - 1
        let nr_blocks = self.block_sizes.len();
        self.states.clear();
        self.states.resize(nr_blocks, 0);
        if nr_blocks > 0 {
            let mut j = sample_categorical(self.trellis.row(nr_blocks), rng)?;
            self.states[nr_blocks - 1] = j;
            for tt in (1..nr_blocks).rev() {
                if use_self {
                    let n = self.block_sizes[tt - 1];
                    for (slack, &la) in log_slack.iter_mut().zip(&log_a) {
                        *slack = self_transition_term(n, la);
                    }
                }
                if backward_weights(self.trellis.row_mut(tt), tt - 1, j, a, &log_slack)? {
                    warn!(block = tt - 1, "backward weights vanish, using uniform weights");
                }
                j = sample_categorical(self.trellis.row(tt), rng)?;
                self.states[tt - 1] = j;
            }
        }
        self.trellis.clear();

        self.update_posteriors(y, model, recorder, record)
    }

    /// Draws each block's state independently from its emission likelihood.
    ///
    /// # Errors
    ///
    /// Returns emission, sampling and posterior update errors.
    pub fn sample_mixture<B, R>(
        &mut self,
        y: &mut Emissions<B>,
        model: &mut HmmModel,
        recorder: &mut R,
        record: bool,
        rng: &mut impl rand::Rng,
    ) -> Result<(), HmmError>
    where
        B: BlockStructure,
        R: Recorder + ?Sized,
    {
        let theta = &model.theta;
        let k = theta.nr_states();
        let log_norm: Vec<f64> = (0..k).map(|s| theta.log_normalizer(s)).collect();
        let mut weights = vec![0.0; k];

        self.states.clear();
        y.init_forward();
        while y.next_block()? {
            let n = y.block_size() as f64;
            let mut max_e = f64::NEG_INFINITY;
            for (s, w) in weights.iter_mut().enumerate() {
                let e = theta.inner_product(s, y.suff_stats())? - n * log_norm[s];
                *w = e;
                max_e = max_e.max(e);
            }
            for w in &mut weights {
                *w = (*w - max_e).exp();
            }
            self.states.push(sample_categorical(&weights, rng)?);
        }

        self.update_posteriors(y, model, recorder, record)
    }

    /// Fills the trellis with normalised forward variables, row 0 being the
    /// initial distribution.
    fn forward_filter<B: BlockStructure>(
        &mut self,
        y: &mut Emissions<B>,
        model: &HmmModel,
    ) -> Result<(), HmmError> {
        let theta = &model.theta;
        let a = &model.transitions;
        let k = theta.nr_states();
        let use_self = model.config.use_self_transitions();

        let log_a: Vec<f64> = (0..k).map(|s| a.get(s, s).ln()).collect();
        let log_norm: Vec<f64> = (0..k).map(|s| theta.log_normalizer(s)).collect();

        self.trellis.reset(k);
        self.trellis.push_row(model.initial.probs());
        self.block_sizes.clear();

        let mut forward = vec![0.0; k];
        y.init_forward();
        while y.next_block()? {
            let n = y.block_size() as f64;
            for (s, f) in forward.iter_mut().enumerate() {
                let mut e = theta.inner_product(s, y.suff_stats())? - n * log_norm[s];
                if use_self {
                    e += self_transition_term(n, log_a[s]);
                }
                *f = e;
            }

            let block = self.block_sizes.len();
            if forward_step(&mut forward, self.trellis.row(block), a) {
                warn!(block, "forward variables vanish, using uniform weights");
            }
            self.trellis.push_row(&forward);
            self.block_sizes.push(n);
        }
        Ok(())
    }

    /// Second sweep: emission statistics, transition counts and occupancy.
    fn update_posteriors<B, R>(
        &self,
        y: &mut Emissions<B>,
        model: &mut HmmModel,
        recorder: &mut R,
        record: bool,
    ) -> Result<(), HmmError>
    where
        B: BlockStructure,
        R: Recorder + ?Sized,
    {
        let k = model.theta.nr_states();
        let mut transitions = vec![0.0; k * k];
        let mut occupancy = vec![0.0; k];
        let mut prev: Option<usize> = None;

        y.aggregate_statistics(
            &self.states,
            model.theta.mapping(),
            &mut model.tau_theta,
            model.config.min_block_size(),
            |state, size| {
                let n = size as f64;
                transitions[state * k + state] += n - 1.0;
                if let Some(p) = prev {
                    transitions[p * k + state] += 1.0;
                }
                occupancy[state] += n;
                if record {
                    recorder.record_block(state, size)?;
                }
                prev = Some(state);
                Ok(())
            },
        )?;

        model.tau_transitions.add_counts(&transitions)?;
        model.tau_initial.add_counts(&occupancy)?;
        Ok(())
    }
}

/// Turns the log emission weights in `forward` into normalised forward
/// variables given the previous row. Returns `true` if the weights vanished
/// and `forward` was set to the uniform distribution.
fn forward_step(forward: &mut [f64], prev: &[f64], a: &Transitions) -> bool {
    let max_e = forward.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    if max_e.is_finite() {
        for (j, f) in forward.iter_mut().enumerate() {
            let transition: f64 = prev.iter().enumerate().map(|(i, p)| p * a.get(i, j)).sum();
            *f = (*f - max_e).exp() * transition;
            sum += *f;
        }
    }
    if sum > 0.0 && sum.is_finite() {
        for f in forward.iter_mut() {
            *f /= sum;
        }
        false
    } else {
        forward.fill(1.0 / forward.len() as f64);
        true
    }
}

/// Replaces the forward variables of `block` by its backward sampling
/// weights given that the following block is in state `next`:
/// `row[i] * A(i, next) * exp(log_slack[i])`, scaled so the largest is 1.
/// Returns `true` if every weight vanished and the row was set to the
/// uniform distribution.
fn backward_weights(
    row: &mut [f64],
    block: usize,
    next: usize,
    a: &Transitions,
    log_slack: &[f64],
) -> Result<bool, HmmError> {
    let mut max_w = f64::NEG_INFINITY;
    for (i, v) in row.iter_mut().enumerate() {
        let p = *v * a.get(i, next);
        if p < 0.0 {
            return Err(HmmError::NegativeBackwardVariable { block, state: i, value: p });
        }
        *v = p.ln() + log_slack[i];
        max_w = max_w.max(*v);
    }
    if max_w.is_finite() {
        for v in row.iter_mut() {
            *v = (*v - max_w).exp();
        }
        Ok(false)
    } else {
        row.fill(1.0 / row.len() as f64);
        Ok(true)
    }
}

/// `(n - 1) ln a`, zero for single-position blocks even when `a == 0`.
fn self_transition_term(n: f64, log_a: f64) -> f64 {
    if n > 1.0 { (n - 1.0) * log_a } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HmmConfig;
    use crate::conjugate::NormalInverseGamma;
    use crate::records::{NoopRecorder, RecordKinds, Records};
    use crate::transitions::TransitionsHyperParam;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};
    use wavehmm_blocks::FixedBlocks;
    use wavehmm_stats::{IntegralArray, RawStatistics};

    fn two_level_data(rng: &mut StdRng) -> Vec<f64> {
        let noise = Normal::new(0.0, 0.3).unwrap();
        (0..400)
            .map(|i| {
                let level = if (i / 100) % 2 == 0 { 0.0 } else { 5.0 };
                level + noise.sample(rng)
            })
            .collect()
    }

    fn setup(values: &[f64], config: HmmConfig, rng: &mut StdRng) -> (Emissions<FixedBlocks>, HmmModel) {
        let raw = RawStatistics::from_values(values, 1).unwrap();
        let ia = IntegralArray::new(raw).unwrap();
        let blocks = FixedBlocks::uniform(values.len(), 10).unwrap();
        let y = Emissions::new(ia, blocks).unwrap();
        let prior = NormalInverseGamma::auto_prior(0.2, 0.9, 2.5, 6.25).unwrap();
        let priors = vec![prior; config.components()];
        let model = HmmModel::new(config, 1, priors, rng).unwrap();
        (y, model)
    }

    #[test]
    fn forward_rows_are_normalised() {
        let mut rng = StdRng::seed_from_u64(42);
        let values = two_level_data(&mut rng);
        let (mut y, model) = setup(&values, HmmConfig::new(), &mut rng);
        let mut q = StateSequence::new();
        q.forward_filter(&mut y, &model).unwrap();
        assert_eq!(q.trellis.nr_rows(), 41);
        assert_eq!(q.block_sizes, vec![10.0; 40]);
        for t in 1..q.trellis.nr_rows() {
            assert_relative_eq!(q.trellis.row(t).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn forward_rows_normalised_without_self_transitions() {
        let mut rng = StdRng::seed_from_u64(7);
        let values = two_level_data(&mut rng);
        let (mut y, model) = setup(&values, HmmConfig::new().with_self_transitions(false), &mut rng);
        let mut q = StateSequence::new();
        q.forward_filter(&mut y, &model).unwrap();
        for t in 1..q.trellis.nr_rows() {
            assert_relative_eq!(q.trellis.row(t).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    fn prior_transitions(k: usize, rng: &mut StdRng) -> Transitions {
        let mut tau = TransitionsHyperParam::new(k, 0.5, 0.5).unwrap();
        Transitions::from_prior(&mut tau, rng).unwrap()
    }

    #[test]
    fn forward_step_normalises() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = prior_transitions(2, &mut rng);
        let mut forward = [-1.0e6, -1.0e6 - 2.0];
        assert!(!forward_step(&mut forward, &[0.5, 0.5], &a));
        assert_relative_eq!(forward.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(forward[0] > 0.0);
    }

    #[test]
    fn vanishing_forward_weights_become_uniform() {
        let mut rng = StdRng::seed_from_u64(4);
        let a = prior_transitions(3, &mut rng);

        let mut forward = [f64::NEG_INFINITY; 3];
        assert!(forward_step(&mut forward, &[0.2, 0.3, 0.5], &a));
        assert_eq!(forward, [1.0 / 3.0; 3]);

        // no mass reaches any state from the previous row
        let mut forward = [0.0, -1.0, -2.0];
        assert!(forward_step(&mut forward, &[0.0; 3], &a));
        assert_eq!(forward, [1.0 / 3.0; 3]);
    }

    #[test]
    fn negative_backward_weight_aborts() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = prior_transitions(2, &mut rng);
        let mut row = [0.4, -0.1];
        let err = backward_weights(&mut row, 6, 0, &a, &[0.0, 0.0]).unwrap_err();
        match err {
            HmmError::NegativeBackwardVariable { block, state, value } => {
                assert_eq!(block, 6);
                assert_eq!(state, 1);
                assert!(value < 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn backward_weights_survive_long_blocks() {
        let mut rng = StdRng::seed_from_u64(6);
        let a = prior_transitions(3, &mut rng);
        // slack of a 5000-position block underflows exp() for every state
        let slack: Vec<f64> = [0.3_f64, 0.5, 0.2].iter().map(|p| 4999.0 * p.ln()).collect();
        let mut row = [0.2, 0.5, 0.3];
        assert!(!backward_weights(&mut row, 0, 1, &a, &slack).unwrap());
        assert_relative_eq!(row[1], 1.0);
        assert!(row[0] < 1e-100 && row[2] < 1e-100);
        assert!(sample_categorical(&row, &mut rng).is_ok());

        let mut row = [0.0, 1.0, 0.0];
        let impossible = [0.0, f64::NEG_INFINITY, 0.0];
        assert!(backward_weights(&mut row, 0, 1, &a, &impossible).unwrap());
        assert_eq!(row, [1.0 / 3.0; 3]);
    }

    #[test]
    fn forward_backward_on_long_blocks() {
        let noise = Normal::new(0.0, 1.0).unwrap();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let values: Vec<f64> = (0..20_000).map(|_| noise.sample(&mut rng)).collect();
            let raw = RawStatistics::from_values(&values, 1).unwrap();
            let blocks = FixedBlocks::uniform(values.len(), 5_000).unwrap();
            let mut y = Emissions::new(IntegralArray::new(raw).unwrap(), blocks).unwrap();
            let prior = NormalInverseGamma::auto_prior(0.2, 0.9, 0.0, 1.0).unwrap();
            let config = HmmConfig::new().with_components(3);
            let mut model = HmmModel::new(config, 1, vec![prior; 3], &mut rng).unwrap();
            let mut q = StateSequence::new();
            for _ in 0..3 {
                q.sample_forward_backward(&mut y, &mut model, &mut NoopRecorder, false, &mut rng)
                    .unwrap();
                assert_eq!(q.len(), 4);
                model.sample_parameters(&mut rng).unwrap();
            }
        }
    }

    #[test]
    fn one_state_per_block() {
        let mut rng = StdRng::seed_from_u64(1);
        let values = two_level_data(&mut rng);
        let (mut y, mut model) = setup(&values, HmmConfig::new(), &mut rng);
        let mut q = StateSequence::new();
        for method in [SamplingMethod::Mixture, SamplingMethod::ForwardBackward] {
            q.sample(method, &mut y, &mut model, &mut NoopRecorder, false, &mut rng)
                .unwrap();
            assert_eq!(q.len(), 40);
            assert!(q.states().iter().all(|&s| s < 3));
            model.sample_parameters(&mut rng).unwrap();
        }
    }

    #[test]
    fn separates_two_levels() {
        let mut rng = StdRng::seed_from_u64(2024);
        let values = two_level_data(&mut rng);
        let config = HmmConfig::new().with_components(2);
        let (mut y, mut model) = setup(&values, config, &mut rng);
        let mut q = StateSequence::new();
        for i in 0..200 {
            let method = if i < 100 {
                SamplingMethod::Mixture
            } else {
                SamplingMethod::ForwardBackward
            };
            q.sample(method, &mut y, &mut model, &mut NoopRecorder, false, &mut rng)
                .unwrap();
            model.sample_parameters(&mut rng).unwrap();
        }
        let s = q.states();
        // blocks 0..10 and 20..30 are low, 10..20 and 30..40 high
        assert!(s[..10].iter().all(|&x| x == s[0]));
        assert!(s[10..20].iter().all(|&x| x == s[10]));
        assert_ne!(s[0], s[10]);
        assert!(s[20..30].iter().all(|&x| x == s[0]));
        assert!(s[30..].iter().all(|&x| x == s[10]));
    }

    #[test]
    fn records_cover_every_position() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = two_level_data(&mut rng);
        let (mut y, mut model) = setup(&values, HmmConfig::new(), &mut rng);
        let mut records = Records::new(values.len(), 3, RecordKinds::default());
        let mut q = StateSequence::new();
        q.sample(
            SamplingMethod::ForwardBackward,
            &mut y,
            &mut model,
            &mut records,
            true,
            &mut rng,
        )
        .unwrap();
        assert!(records.is_complete());
        assert_eq!(records.marginals().iterations(), 1);
    }

    #[test]
    fn posterior_counts_follow_states() {
        let mut rng = StdRng::seed_from_u64(11);
        let values = two_level_data(&mut rng);
        let (mut y, mut model) = setup(&values, HmmConfig::new(), &mut rng);
        let mut q = StateSequence::new();
        q.sample_mixture(&mut y, &mut model, &mut NoopRecorder, false, &mut rng)
            .unwrap();

        let mut occupancy = [0.0; 3];
        for &s in q.states() {
            occupancy[s] += 10.0;
        }
        let post = model.tau_initial.posterior().alpha().to_vec();
        for s in 0..3 {
            assert_relative_eq!(post[s], 0.5 + occupancy[s]);
        }
        // 40 blocks: 9 positions of self-transition each plus 39 block boundaries
        let total: f64 = (0..3)
            .map(|i| model.tau_transitions.posterior(i).unwrap().alpha().iter().sum::<f64>())
            .sum();
        assert_relative_eq!(total, 9.0 * 0.5 + 40.0 * 9.0 + 39.0);
    }

    #[test]
    fn method_from_str() {
        assert_eq!("M".parse::<SamplingMethod>().unwrap(), SamplingMethod::Mixture);
        assert_eq!(
            "forward-backward".parse::<SamplingMethod>().unwrap(),
            SamplingMethod::ForwardBackward
        );
        assert!("G".parse::<SamplingMethod>().is_err());
    }

    #[test]
    fn self_transition_term_guards_single_positions() {
        assert_eq!(self_transition_term(1.0, f64::NEG_INFINITY), 0.0);
        assert_relative_eq!(self_transition_term(3.0, -0.5), -1.0);
    }
}
