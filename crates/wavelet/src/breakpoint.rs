//! Breakpoint weights and coefficient-derived summaries.

use crate::error::WaveletError;

/// sqrt(2 / pi): mean absolute value of a standard normal variate.
const MEAN_ABS_STD_NORMAL: f64 = 0.797_884_560_802_865_4;

/// Turns maxlet coefficients into breakpoint weights, in place.
///
/// Afterwards `weights[t]` is the largest coefficient of any wavelet with a
/// boundary of its support at `t`. Each wavelet coefficient, stored at its
/// midpoint, is propagated outward to its left and right support boundaries,
/// from the coarsest scale down. A right boundary equal to the length is the
/// end of the data and receives nothing; a wavelet reaching past it marks
/// both its midpoint and its left boundary infinite.
///
/// # Errors
///
/// Returns [`WaveletError::EmptyData`] if `weights` is empty.
pub fn haar_breakpoint_weights(weights: &mut [f64]) -> Result<(), WaveletError> {
    let size = weights.len();
    if size == 0 {
        return Err(WaveletError::EmptyData);
    }

    let mut interval = size.next_power_of_two() / 2;
    while interval >= 1 {
        let shift = 2 * interval;
        let mut index = interval;
        while index < size {
            let left = index - interval;
            let right = index + interval;
            if right < size {
                weights[right] = weights[right].max(weights[index]);
            } else if right > size {
                weights[left] = f64::INFINITY;
                weights[index] = f64::INFINITY;
            }
            weights[left] = weights[left].max(weights[index]);
            index += shift;
        }
        interval /= 2;
    }
    Ok(())
}

/// Multiplies all breakpoint weights by `multiplier`.
///
/// Values above 1 make breakpoints easier to keep (finer blocks), values
/// below 1 coarsen the block structure.
///
/// # Errors
///
/// Returns [`WaveletError::InvalidMultiplier`] unless `multiplier` is finite
/// and positive.
pub fn scale_weights(weights: &mut [f64], multiplier: f64) -> Result<(), WaveletError> {
    if !(multiplier.is_finite() && multiplier > 0.0) {
        return Err(WaveletError::InvalidMultiplier(multiplier));
    }
    if multiplier != 1.0 {
        for w in weights.iter_mut() {
            *w *= multiplier;
        }
    }
    Ok(())
}

/// Robust estimate of the noise standard deviation from maxlet coefficients.
///
/// Averages the finest-scale coefficients (odd positions) and rescales the
/// mean absolute deviation to a normal standard deviation.
///
/// # Errors
///
/// Returns [`WaveletError::SeriesTooShort`] if there is no odd position.
pub fn noise_std_estimate(coeffs: &[f64]) -> Result<f64, WaveletError> {
    let finest: Vec<f64> = coeffs.iter().skip(1).step_by(2).copied().collect();
    if finest.is_empty() {
        return Err(WaveletError::SeriesTooShort {
            len: coeffs.len(),
            min: 2,
        });
    }
    let mad = finest.iter().sum::<f64>() / finest.len() as f64;
    Ok(mad / MEAN_ABS_STD_NORMAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_of_two_propagation() {
        // Coefficient 3 at position 2 belongs to the wavelet over [0, 4).
        let mut w = [f64::INFINITY, 1.0, 3.0, 2.0];
        haar_breakpoint_weights(&mut w).unwrap();
        assert!(w[0].is_infinite());
        assert_eq!(w[1], 1.0);
        assert_eq!(w[2], 3.0);
        assert_eq!(w[3], 2.0);
    }

    #[test]
    fn boundary_receives_neighbour_maximum() {
        // Wavelets over [0, 2) and [2, 4) put their right boundaries at 2 and 4.
        let mut w = [f64::INFINITY, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        haar_breakpoint_weights(&mut w).unwrap();
        assert_eq!(w[2], 5.0);
        assert_eq!(w[4], 1.0);
        assert_eq!(w[6], 0.0);
    }

    #[test]
    fn zero_coefficients_stay_zero() {
        let mut w = [f64::INFINITY, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        haar_breakpoint_weights(&mut w).unwrap();
        assert!(w[0].is_infinite());
        assert!(w[1..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn ragged_length_forces_breakpoints() {
        let mut w = [f64::INFINITY, 0.0, 0.0, 0.0, f64::INFINITY, 0.0];
        haar_breakpoint_weights(&mut w).unwrap();
        assert!(w[0].is_infinite());
        assert!(w[4].is_infinite());
        assert_eq!(w[1], 0.0);
        assert_eq!(w[5], 0.0);
    }

    #[test]
    fn empty_weights_are_rejected() {
        let mut w: [f64; 0] = [];
        assert!(matches!(
            haar_breakpoint_weights(&mut w),
            Err(WaveletError::EmptyData)
        ));
    }

    #[test]
    fn scaling() {
        let mut w = [f64::INFINITY, 1.0, 2.0];
        scale_weights(&mut w, 2.0).unwrap();
        assert!(w[0].is_infinite());
        assert_eq!(&w[1..], &[2.0, 4.0]);
        assert!(matches!(
            scale_weights(&mut w, 0.0),
            Err(WaveletError::InvalidMultiplier(_))
        ));
        assert!(matches!(
            scale_weights(&mut w, f64::NAN),
            Err(WaveletError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn noise_estimate_uses_odd_positions() {
        let coeffs = [f64::INFINITY, 0.5, 100.0, 1.5];
        let sd = noise_std_estimate(&coeffs).unwrap();
        assert_relative_eq!(sd, 1.0 / MEAN_ABS_STD_NORMAL);
        assert!(matches!(
            noise_std_estimate(&[f64::INFINITY]),
            Err(WaveletError::SeriesTooShort { len: 1, min: 2 })
        ));
    }
}
