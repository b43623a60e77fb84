//! Sampling from unnormalised categorical weights.

use crate::error::HmmError;

/// Draws an index with probability proportional to `weights[i]`.
///
/// Uses a single uniform draw and walks the cumulative sum until it reaches
/// `u * total`. Rounding at the upper end falls back to the last index with
/// positive weight.
///
/// # Errors
///
/// Returns [`HmmError::DegenerateWeights`] if `weights` is empty, contains a
/// negative or non-finite entry, or sums to zero.
pub fn sample_categorical(weights: &[f64], rng: &mut impl rand::Rng) -> Result<usize, HmmError> {
    if weights.is_empty() {
        return Err(HmmError::DegenerateWeights("no categories".into()));
    }
    let mut total = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        if !(w.is_finite() && w >= 0.0) {
            return Err(HmmError::DegenerateWeights(format!(
                "weight {w} at index {i}"
            )));
        }
        total += w;
    }
    if !(total.is_finite() && total > 0.0) {
        return Err(HmmError::DegenerateWeights(format!(
            "weights sum to {total}"
        )));
    }

    let u = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            cumulative += w;
            last_positive = i;
            if cumulative > u {
                return Ok(i);
            }
        }
    }
    Ok(last_positive)
}
