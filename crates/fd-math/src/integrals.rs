//! Numerical integration.
//!
//! Composite Simpson rule with successive interval halving.

use fd_core::{
    errors::{Error, Result},
    Real,
};

/// A numerical integrator.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real>;
}

// ── Simpson ───────────────────────────────────────────────────────────────────

/// Simpson's rule (composite), refined until two successive estimates agree
/// to `absolute_accuracy`.
#[derive(Debug, Clone)]
pub struct SimpsonIntegral {
    max_evaluations: usize,
    absolute_accuracy: Real,
}

impl SimpsonIntegral {
    /// Create a new Simpson integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            absolute_accuracy,
        }
    }
}

impl Integrator for SimpsonIntegral {
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real> {
        if a == b {
            return Ok(0.0);
        }
        let fa = f(a);
        let fb = f(b);
        let mut n = 1usize;
        let mut old_value = f64::MAX;
        let mut evals = 2usize;

        loop {
            let h = (b - a) / (2.0 * n as Real);
            // S = h/3 * [f(a) + 4*Σf(odd) + 2*Σf(even) + f(b)]
            let mut sum_odd = 0.0;
            let mut sum_even = 0.0;
            for i in 1..2 * n {
                let x = a + i as Real * h;
                if i % 2 == 1 {
                    sum_odd += f(x);
                } else {
                    sum_even += f(x);
                }
            }
            evals += 2 * n - 1;
            let value = h / 3.0 * (fa + 4.0 * sum_odd + 2.0 * sum_even + fb);

            if n > 2 && (value - old_value).abs() < self.absolute_accuracy {
                return Ok(value);
            }
            if evals >= self.max_evaluations {
                return Err(Error::Runtime(format!(
                    "SimpsonIntegral: max evaluations ({}) exceeded",
                    self.max_evaluations
                )));
            }
            old_value = value;
            n *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn simpson_polynomial_is_exact() {
        let s = SimpsonIntegral::new(1e-12, 10_000);
        let v = s.integrate(|x| x * x * x - 2.0 * x, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn simpson_oscillatory() {
        let s = SimpsonIntegral::new(1e-10, 1_000_000);
        let v = s.integrate(|x| x.sin(), 0.0, std::f64::consts::PI).unwrap();
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let s = SimpsonIntegral::new(0.0, 64);
        assert!(s.integrate(|x| x.sqrt(), 0.0, 1.0).is_err());
    }
}
