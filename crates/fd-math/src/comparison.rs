//! Comparison utilities.

use num_traits::Float;

/// Default epsilon for close-enough comparisons.
pub const EPSILON: f64 = 1e-10;

/// Return `true` if `|a - b| <= epsilon`.
#[inline]
pub fn close<T: Float>(a: T, b: T, epsilon: T) -> bool {
    (a - b).abs() <= epsilon
}

/// Return `true` if `|a - b| <= n * epsilon` where `epsilon` is the
/// machine-epsilon relative to `max(|a|, |b|)`.
#[inline]
pub fn close_enough<T: Float>(a: T, b: T, n: u32) -> bool {
    if a == b {
        return true;
    }
    let scale = T::from(n).unwrap_or_else(T::one);
    let eps = a.abs().max(b.abs()) * T::epsilon() * scale;
    (a - b).abs() <= eps
}
