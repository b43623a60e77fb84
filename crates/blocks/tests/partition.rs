use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wavehmm_blocks::{
    BlockStructure, BreakpointArray, IterState, JumpPointer, collect_blocks,
};

/// Random weights with frequent ties and occasional infinities.
fn random_weights(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut w: Vec<f64> = (0..n)
        .map(|_| {
            if rng.random_bool(0.01) {
                f64::INFINITY
            } else {
                (rng.random_range(0.0..10.0_f64) * 2.0).round() / 2.0
            }
        })
        .collect();
    w[0] = f64::INFINITY;
    w
}

fn brute_force(weights: &[f64], threshold: f64) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    for t in 1..weights.len() {
        if weights[t] >= threshold {
            out.push(start..t);
            start = t;
        }
    }
    out.push(start..weights.len());
    out
}

fn check_pointer_invariants<P: JumpPointer>(b: &BreakpointArray<P>) {
    let w = b.weights();
    let size = w.len();
    for i in 0..size {
        let jump = b.jump(i).expect("pointer");
        assert!(jump >= 1, "pointer at {i} is zero");
        assert!(jump <= b.max_jump(), "pointer at {i} exceeds max jump");
        let end = i + jump;
        assert!(end <= size);
        for j in (i + 1)..end {
            assert!(w[j] < w[i], "weight at {j} not below weight at {i}");
        }
        let capped = jump == b.max_jump();
        assert!(
            end == size || w[end] >= w[i] || capped,
            "run from {i} ends at {end} without a larger weight"
        );
    }
}

// ---------------------------------------------------------------------------
// 1. jump_pointer_invariants
// ---------------------------------------------------------------------------
#[test]
fn jump_pointer_invariants() {
    for seed in 0..5 {
        let b: BreakpointArray = BreakpointArray::new(random_weights(2000, seed)).expect("index");
        check_pointer_invariants(&b);
    }
}

// ---------------------------------------------------------------------------
// 2. jump_pointer_invariants_with_cap
// ---------------------------------------------------------------------------
#[test]
fn jump_pointer_invariants_with_cap() {
    let mut w = vec![0.0; 3000];
    w[0] = f64::INFINITY;
    w[1] = 100.0;
    w[1500] = 50.0;
    let b: BreakpointArray<u8> = BreakpointArray::new(w).expect("index");
    assert_eq!(b.max_jump(), 255);
    check_pointer_invariants(&b);
    assert_eq!(b.jump(1), Some(255));
}

// ---------------------------------------------------------------------------
// 3. partition_matches_brute_force
// ---------------------------------------------------------------------------
#[test]
fn partition_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for seed in 0..5 {
        let weights = random_weights(1500, 100 + seed);
        let mut b: BreakpointArray = BreakpointArray::new(weights.clone()).expect("index");
        let mut narrow: BreakpointArray<u8> = BreakpointArray::new(weights.clone()).expect("index");
        for threshold in [0.25, 0.5, 1.0, 4.5, 9.5, 10.0, 1e6] {
            let expected = brute_force(&weights, threshold);
            b.set_threshold(threshold).expect("threshold");
            assert_eq!(collect_blocks(&mut b), expected, "threshold {threshold}");
            assert_eq!(b.nr_blocks().expect("count"), expected.len());
            narrow.set_threshold(threshold).expect("threshold");
            assert_eq!(collect_blocks(&mut narrow), expected);
        }
        for _ in 0..20 {
            let threshold = rng.random_range(0.01..11.0);
            b.set_threshold(threshold).expect("threshold");
            assert_eq!(collect_blocks(&mut b), brute_force(&weights, threshold));
        }
    }
}

// ---------------------------------------------------------------------------
// 4. documented_scenario
// ---------------------------------------------------------------------------
#[test]
fn documented_scenario() {
    let mut b: BreakpointArray =
        BreakpointArray::new(vec![f64::INFINITY, 5.0, 1.0, 1.0, 5.0, 1.0]).expect("index");
    b.set_threshold(3.0).expect("threshold");
    b.init_forward();
    let mut seen = Vec::new();
    while b.next_block() {
        seen.push((b.pos().expect("pos"), b.start(), b.end(), b.block_size()));
    }
    assert_eq!(seen, vec![(1, 0, 1, 1), (2, 1, 4, 3), (3, 4, 6, 2)]);
    assert_eq!(b.state(), IterState::Finished);
}

// ---------------------------------------------------------------------------
// 5. flat_weights_single_block
// ---------------------------------------------------------------------------
#[test]
fn flat_weights_single_block() {
    let mut w = vec![0.0; 8];
    w[0] = f64::INFINITY;
    let mut b: BreakpointArray = BreakpointArray::new(w).expect("index");
    for threshold in [1e-9, 0.1, 1.0, 100.0] {
        b.set_threshold(threshold).expect("threshold");
        assert_eq!(collect_blocks(&mut b), vec![0..8]);
    }
}
