//! Normal (Gaussian) distribution.
//!
//! The cumulative distribution delegates to `statrs`' complementary error
//! function. Absolute accuracy is about 1e-10; tails keep their relative
//! accuracy since `erfc` is not formed as `1 - erf`.

use fd_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution function Φ(x).
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x / SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn cdf_known_values() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-10);
        assert_abs_diff_eq!(normal_cdf(-1.96), 0.024_997_895_148_220_435, epsilon = 1e-10);
    }

    #[test]
    fn cdf_is_symmetric() {
        for &x in &[0.1, 0.7, 2.5, 6.0] {
            assert_abs_diff_eq!(normal_cdf(x) + normal_cdf(-x), 1.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn pdf_peak() {
        assert_abs_diff_eq!(normal_pdf(0.0), 0.398_942_280_401_432_7, epsilon = 1e-15);
    }

    proptest! {
        #[test]
        fn cdf_is_a_distribution(a in -8.0f64..8.0, b in -8.0f64..8.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!((0.0..=1.0).contains(&normal_cdf(lo)));
            prop_assert!(normal_cdf(lo) <= normal_cdf(hi) + 1e-10);
            prop_assert!(normal_pdf(lo) > 0.0);
        }
    }
}
