//! Bounded 1D minimisers.
//!
//! Both routines are deterministic: given the same function, bracket and
//! tolerance they visit the same abscissae in the same order, so anything
//! built on top of them (grid axes in particular) is reproducible.

use fd_core::{
    errors::{Error, Result},
    Real,
};
use tracing::trace;

/// `(3 - √5) / 2`, the golden-section fraction.
const GOLDEN: Real = 0.381_966_011_250_105_1;

/// Result of a bounded minimisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    /// Abscissa of the minimum.
    pub x: Real,
    /// Function value at `x`.
    pub value: Real,
    /// Number of iterations used.
    pub iterations: usize,
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's bounded minimiser on `[lo, hi]`.
///
/// Combines golden-section steps with successive parabolic interpolation.
/// Terminates when the bracket around the current best point is within
/// `x_tolerance` (plus a relative term of `√ε·|x|`).
pub fn brent_minimize<F>(
    f: F,
    lo: Real,
    hi: Real,
    x_tolerance: Real,
    max_iterations: usize,
) -> Result<Minimum>
where
    F: Fn(Real) -> Real,
{
    if !(lo < hi) {
        return Err(Error::Precondition(format!(
            "Brent minimiser: empty bracket [{lo}, {hi}]"
        )));
    }
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut a = lo;
    let mut b = hi;

    let mut x = a + GOLDEN * (b - a);
    let mut w = x;
    let mut v = x;
    let mut fx = f(x);
    let mut fw = fx;
    let mut fv = fx;
    let mut d: Real = 0.0;
    let mut e: Real = 0.0;

    for iteration in 0..max_iterations {
        let xm = 0.5 * (a + b);
        let tol1 = sqrt_eps * x.abs() + x_tolerance / 3.0;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            trace!(x, value = fx, iteration, "Brent minimiser converged");
            return Ok(Minimum {
                x,
                value: fx,
                iterations: iteration,
            });
        }

        let mut golden_step = true;
        if e.abs() > tol1 {
            // Trial parabolic fit through (v, w, x).
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            e = d;
            if p.abs() < (0.5 * q * e_prev).abs() && p > q * (a - x) && p < q * (b - x) {
                d = p / q;
                let u = x + d;
                if (u - a) < tol2 || (b - u) < tol2 {
                    d = tol1.copysign(xm - x);
                }
                golden_step = false;
            }
        }
        if golden_step {
            e = if x >= xm { a - x } else { b - x };
            d = GOLDEN * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = f(u);

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    Err(Error::Runtime(format!(
        "Brent minimiser: maximum iterations ({max_iterations}) reached on [{lo}, {hi}]"
    )))
}

// ── Golden section ────────────────────────────────────────────────────────────

/// Plain golden-section search on `[lo, hi]`.
///
/// Slower than [`brent_minimize`] but makes no smoothness assumption at all;
/// each iteration shrinks the bracket by the golden ratio.
pub fn golden_section<F>(
    f: F,
    lo: Real,
    hi: Real,
    x_tolerance: Real,
    max_iterations: usize,
) -> Result<Minimum>
where
    F: Fn(Real) -> Real,
{
    if !(lo < hi) {
        return Err(Error::Precondition(format!(
            "golden section: empty bracket [{lo}, {hi}]"
        )));
    }
    let mut a = lo;
    let mut b = hi;
    let mut c = a + GOLDEN * (b - a);
    let mut d = b - GOLDEN * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    for iteration in 0..max_iterations {
        if (b - a).abs() <= x_tolerance {
            let (x, value) = if fc <= fd { (c, fc) } else { (d, fd) };
            return Ok(Minimum {
                x,
                value,
                iterations: iteration,
            });
        }
        if fc <= fd {
            b = d;
            d = c;
            fd = fc;
            c = a + GOLDEN * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = b - GOLDEN * (b - a);
            fd = f(d);
        }
    }

    Err(Error::Runtime(format!(
        "golden section: maximum iterations ({max_iterations}) reached on [{lo}, {hi}]"
    )))
}
