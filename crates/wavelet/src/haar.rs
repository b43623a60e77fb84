//! Batch Haar transforms over fully materialised arrays.
//!
//! All transforms store coefficients in dyadic in-order layout: the detail
//! coefficient of the wavelet with support `[L, L + N)` lives at its
//! discontinuity `R = L + N/2`, and position 0 is reserved for the scale.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::WaveletError;

/// Orthonormal Haar transform of a power-of-two length signal, in place.
///
/// Afterwards `data[0]` holds `sum / sqrt(T)` and every other position the
/// signed detail coefficient whose discontinuity is at that position. The
/// transform preserves the sum of squares.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::EmptyData`] | `data` is empty |
/// | [`WaveletError::NotPowerOfTwo`] | length is not a power of two |
pub fn haar_transform(data: &mut [f64]) -> Result<(), WaveletError> {
    check_power_of_two(data.len())?;
    let t = data.len();
    let mut n = 2;
    while n <= t {
        let half = n / 2;
        for left in (0..t).step_by(n) {
            let a = data[left];
            let b = data[left + half];
            data[left] = FRAC_1_SQRT_2 * (a + b);
            data[left + half] = FRAC_1_SQRT_2 * (a - b);
        }
        n *= 2;
    }
    Ok(())
}

/// Inverse of [`haar_transform`].
pub fn inverse_haar_transform(data: &mut [f64]) -> Result<(), WaveletError> {
    check_power_of_two(data.len())?;
    let t = data.len();
    let mut n = t;
    while n >= 2 {
        let half = n / 2;
        for left in (0..t).step_by(n) {
            let s = data[left];
            let d = data[left + half];
            data[left] = FRAC_1_SQRT_2 * (s + d);
            data[left + half] = FRAC_1_SQRT_2 * (s - d);
        }
        n /= 2;
    }
    Ok(())
}

fn check_power_of_two(len: usize) -> Result<(), WaveletError> {
    if len == 0 {
        return Err(WaveletError::EmptyData);
    }
    if !len.is_power_of_two() {
        return Err(WaveletError::NotPowerOfTwo(len));
    }
    Ok(())
}

/// Haar detail coefficients for arbitrary lengths, in place.
///
/// `data` is position-major with `nr_dim` interleaved dimensions. A length
/// that is not a power of two is treated as a greedy concatenation of
/// power-of-two blocks: wavelets reaching past the end get an infinite
/// coefficient, so their boundaries are always breakpoints. The scale
/// position 0 is set to infinity in every dimension.
///
/// # Errors
///
/// Returns [`WaveletError::ZeroDimensions`] or
/// [`WaveletError::DimensionMismatch`] for a malformed shape.
pub fn haar_detail_coeffs(data: &mut [f64], nr_dim: usize) -> Result<(), WaveletError> {
    check_shape(data.len(), nr_dim)?;
    let t = data.len() / nr_dim;
    if t == 0 {
        return Ok(());
    }

    let upper = t.next_power_of_two();
    let mut n = 2;
    while n <= upper {
        let s = 1.0 / (n as f64).sqrt();
        let mut left = 0;
        let mut right = n / 2;
        while left < t {
            if right < t {
                for d in 0..nr_dim {
                    let l = left * nr_dim + d;
                    let r = right * nr_dim + d;
                    let (yl, yr) = (data[l], data[r]);
                    if yl.is_finite() && yr.is_finite() {
                        data[l] = yl + yr;
                        data[r] = s * (yl - yr);
                    } else {
                        data[l] = f64::INFINITY;
                        data[r] = f64::INFINITY;
                    }
                }
            } else {
                for d in 0..nr_dim {
                    data[left * nr_dim + d] = f64::INFINITY;
                }
            }
            left += n;
            right += n;
        }
        n *= 2;
    }

    for v in data.iter_mut().take(nr_dim) {
        *v = f64::INFINITY;
    }
    Ok(())
}

/// Reduces position-major coefficients to one value per position: the
/// maximum absolute value across dimensions.
pub fn merge_dimensions(data: &[f64], nr_dim: usize) -> Result<Vec<f64>, WaveletError> {
    check_shape(data.len(), nr_dim)?;
    Ok(data
        .chunks_exact(nr_dim)
        .map(|pos| pos.iter().fold(0.0_f64, |m, &v| m.max(v.abs())))
        .collect())
}

/// Maximal absolute Haar detail coefficients ("maxlet" transform) of a fully
/// materialised signal.
///
/// Equivalent to the streaming [`MaxletTransform`](crate::MaxletTransform)
/// but keeps the whole input in memory.
pub fn maxlet_coeffs(values: &[f64], nr_dim: usize) -> Result<Vec<f64>, WaveletError> {
    check_shape(values.len(), nr_dim)?;
    if values.is_empty() {
        return Err(WaveletError::EmptyData);
    }
    if !values.iter().all(|v| v.is_finite()) {
        return Err(WaveletError::NonFiniteData);
    }
    let mut data = values.to_vec();
    haar_detail_coeffs(&mut data, nr_dim)?;
    merge_dimensions(&data, nr_dim)
}

pub(crate) fn check_shape(len: usize, nr_dim: usize) -> Result<(), WaveletError> {
    if nr_dim == 0 {
        return Err(WaveletError::ZeroDimensions);
    }
    if len % nr_dim != 0 {
        return Err(WaveletError::DimensionMismatch { len, nr_dim });
    }
    Ok(())
}
