//! First- and second-derivative weights on a non-uniform axis.
//!
//! Spacings follow `h[i] = x[i+1] - x[i]`. Every generator fills the
//! interior rows of two [`Diagonals`] (one per derivative order) and leaves
//! rows `0` and `n-1` zero for the caller's boundary treatment.
//!
//! | scheme    | rows          | first derivative          | second derivative |
//! |-----------|---------------|---------------------------|-------------------|
//! | centered  | `1..=n-2`     | 3-point, second order     | 3-point           |
//! | forward   | `1..=n-3`     | 3-point on `i, i+1, i+2`  | 3-point one-sided |
//! | backward  | `2..=n-2`     | 3-point on `i, i-1, i-2`  | 3-point one-sided |
//!
//! A one-sided stencil has no room on the last interior row next to the
//! boundary it points at; that row falls back to a two-point first
//! derivative and the centered second derivative.

use fd_core::{
    errors::{Error, Result},
    Real,
};

use super::diagonals::Diagonals;

/// Which stencil produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stencil {
    /// Boundary row, left for the caller.
    Boundary,
    /// Three-point centered.
    Centered,
    /// One-sided toward `+x`.
    Forward,
    /// One-sided toward `-x`.
    Backward,
}

/// Where, if anywhere, the first derivative switches to a one-sided stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindPolicy {
    /// Centered everywhere.
    #[default]
    Centered,
    /// Forward differences on rows `flip..=n-2`.
    Upwind(usize),
    /// Backward differences on rows `1..=flip`.
    Downwind(usize),
}

/// Derivative weights for one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeCoefficients {
    /// First-derivative weights.
    pub first: Diagonals,
    /// Second-derivative weights.
    pub second: Diagonals,
    /// Stencil used on each row.
    pub stencils: Vec<Stencil>,
}

/// Spacings `h[i] = x[i+1] - x[i]` of an axis.
pub fn deltas(axis: &[Real]) -> Vec<Real> {
    axis.windows(2).map(|w| w[1] - w[0]).collect()
}

// ── Row stencils ──────────────────────────────────────────────────────────────

/// Centered first derivative at a row with spacings `hm` below and `hp` above.
pub fn centered_first(hm: Real, hp: Real) -> [(isize, Real); 3] {
    [
        (-1, -hp / (hm * (hm + hp))),
        (0, (hp - hm) / (hm * hp)),
        (1, hm / (hp * (hm + hp))),
    ]
}

/// Centered second derivative at a row with spacings `hm` below and `hp` above.
pub fn centered_second(hm: Real, hp: Real) -> [(isize, Real); 3] {
    [
        (-1, 2.0 / (hm * (hm + hp))),
        (0, -2.0 / (hm * hp)),
        (1, 2.0 / (hp * (hm + hp))),
    ]
}

/// Three-point forward first derivative; `h1` is the nearer spacing.
pub fn forward_first(h1: Real, h2: Real) -> [(isize, Real); 3] {
    [
        (0, -(2.0 * h1 + h2) / (h1 * (h1 + h2))),
        (1, (h1 + h2) / (h1 * h2)),
        (2, -h1 / (h2 * (h1 + h2))),
    ]
}

/// Three-point forward second derivative.
pub fn forward_second(h1: Real, h2: Real) -> [(isize, Real); 3] {
    [
        (0, 2.0 / (h1 * (h1 + h2))),
        (1, -2.0 / (h1 * h2)),
        (2, 2.0 / (h2 * (h1 + h2))),
    ]
}

/// Three-point backward first derivative; `h1` is the nearer spacing.
pub fn backward_first(h1: Real, h2: Real) -> [(isize, Real); 3] {
    [
        (-2, h1 / (h2 * (h1 + h2))),
        (-1, -(h1 + h2) / (h1 * h2)),
        (0, (2.0 * h1 + h2) / (h1 * (h1 + h2))),
    ]
}

/// Three-point backward second derivative.
pub fn backward_second(h1: Real, h2: Real) -> [(isize, Real); 3] {
    [
        (-2, 2.0 / (h2 * (h1 + h2))),
        (-1, -2.0 / (h1 * h2)),
        (0, 2.0 / (h1 * (h1 + h2))),
    ]
}

/// Two-point forward first derivative over spacing `h`.
pub fn forward_first_two_point(h: Real) -> [(isize, Real); 2] {
    [(0, -1.0 / h), (1, 1.0 / h)]
}

/// Two-point backward first derivative over spacing `h`.
pub fn backward_first_two_point(h: Real) -> [(isize, Real); 2] {
    [(-1, -1.0 / h), (0, 1.0 / h)]
}

// ── Generators ────────────────────────────────────────────────────────────────

fn check_len(deltas: &[Real]) -> Result<usize> {
    let n = deltas.len() + 1;
    if n < 3 {
        return Err(Error::Precondition(format!(
            "derivative weights need at least 3 points, got {n}"
        )));
    }
    Ok(n)
}

fn empty(n: usize) -> DerivativeCoefficients {
    let mut stencils = vec![Stencil::Boundary; n];
    for s in stencils.iter_mut().take(n - 1).skip(1) {
        *s = Stencil::Centered;
    }
    DerivativeCoefficients {
        first: Diagonals::zeros(n, &[-2, -1, 0, 1, 2]),
        second: Diagonals::zeros(n, &[-2, -1, 0, 1, 2]),
        stencils,
    }
}

fn fill_centered(c: &mut DerivativeCoefficients, deltas: &[Real], row: usize) {
    let (hm, hp) = (deltas[row - 1], deltas[row]);
    c.first.set_row(row, &centered_first(hm, hp));
    c.second.set_row(row, &centered_second(hm, hp));
    c.stencils[row] = Stencil::Centered;
}

fn fill_forward(c: &mut DerivativeCoefficients, deltas: &[Real], row: usize) {
    let n = deltas.len() + 1;
    if row + 2 < n {
        let (h1, h2) = (deltas[row], deltas[row + 1]);
        c.first.set_row(row, &forward_first(h1, h2));
        c.second.set_row(row, &forward_second(h1, h2));
    } else {
        c.first.set_row(row, &forward_first_two_point(deltas[row]));
        c.second
            .set_row(row, &centered_second(deltas[row - 1], deltas[row]));
    }
    c.stencils[row] = Stencil::Forward;
}

fn fill_backward(c: &mut DerivativeCoefficients, deltas: &[Real], row: usize) {
    if row >= 2 {
        let (h1, h2) = (deltas[row - 1], deltas[row - 2]);
        c.first.set_row(row, &backward_first(h1, h2));
        c.second.set_row(row, &backward_second(h1, h2));
    } else {
        c.first.set_row(row, &backward_first_two_point(deltas[row - 1]));
        c.second
            .set_row(row, &centered_second(deltas[row - 1], deltas[row]));
    }
    c.stencils[row] = Stencil::Backward;
}

fn finish(c: DerivativeCoefficients) -> DerivativeCoefficients {
    DerivativeCoefficients {
        first: c.first.trimmed(&[-1, 0, 1]),
        second: c.second.trimmed(&[-1, 0, 1]),
        stencils: c.stencils,
    }
}

/// Centered weights on every interior row.
pub fn centered(deltas: &[Real]) -> Result<DerivativeCoefficients> {
    let n = check_len(deltas)?;
    let mut c = empty(n);
    for row in 1..n - 1 {
        fill_centered(&mut c, deltas, row);
    }
    Ok(finish(c))
}

/// Forward weights on every interior row.
pub fn forward(deltas: &[Real]) -> Result<DerivativeCoefficients> {
    let n = check_len(deltas)?;
    let mut c = empty(n);
    for row in 1..n - 1 {
        fill_forward(&mut c, deltas, row);
    }
    Ok(finish(c))
}

/// Backward weights on every interior row.
pub fn backward(deltas: &[Real]) -> Result<DerivativeCoefficients> {
    let n = check_len(deltas)?;
    let mut c = empty(n);
    for row in 1..n - 1 {
        fill_backward(&mut c, deltas, row);
    }
    Ok(finish(c))
}

/// Centered weights, switching to forward differences from row `upwind` on
/// or to backward differences up to row `downwind`.
///
/// Requesting both switches, or a switch row outside `1..=n-2`, is a
/// [`Error::Configuration`].
pub fn composite(
    deltas: &[Real],
    upwind: Option<usize>,
    downwind: Option<usize>,
) -> Result<DerivativeCoefficients> {
    let n = check_len(deltas)?;
    let check = |flip: usize, which: &str| {
        if flip == 0 || flip > n - 2 {
            Err(Error::Configuration(format!(
                "{which} switch at row {flip} is outside the interior rows 1..={}",
                n - 2
            )))
        } else {
            Ok(())
        }
    };
    let mut c = empty(n);
    match (upwind, downwind) {
        (Some(up), Some(down)) => {
            return Err(Error::Configuration(format!(
                "upwind ({up}) and downwind ({down}) requested together"
            )));
        }
        (Some(flip), None) => {
            check(flip, "upwind")?;
            for row in 1..flip {
                fill_centered(&mut c, deltas, row);
            }
            for row in flip..n - 1 {
                fill_forward(&mut c, deltas, row);
            }
        }
        (None, Some(flip)) => {
            check(flip, "downwind")?;
            for row in 1..=flip {
                fill_backward(&mut c, deltas, row);
            }
            for row in flip + 1..n - 1 {
                fill_centered(&mut c, deltas, row);
            }
        }
        (None, None) => {
            for row in 1..n - 1 {
                fill_centered(&mut c, deltas, row);
            }
        }
    }
    Ok(finish(c))
}

/// [`composite`] driven by a [`WindPolicy`].
pub fn with_policy(deltas: &[Real], policy: WindPolicy) -> Result<DerivativeCoefficients> {
    match policy {
        WindPolicy::Centered => composite(deltas, None, None),
        WindPolicy::Upwind(flip) => composite(deltas, Some(flip), None),
        WindPolicy::Downwind(flip) => composite(deltas, None, Some(flip)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn axis_from(steps: &[Real]) -> Vec<Real> {
        let mut x = vec![0.0];
        for h in steps {
            let last = *x.last().unwrap();
            x.push(last + h);
        }
        x
    }

    fn exact_on_quadratic(c: &DerivativeCoefficients, x: &[Real]) {
        // f = 1 + 2x + 3x²  ⇒  f' = 2 + 6x, f'' = 6
        let f: Vec<Real> = x.iter().map(|x| 1.0 + 2.0 * x + 3.0 * x * x).collect();
        let d1 = c.first.apply(&f);
        let d2 = c.second.apply(&f);
        for i in 1..x.len() - 1 {
            let two_point = matches!(
                (c.stencils[i], i),
                (Stencil::Forward, r) if r + 2 == x.len()
            ) || matches!((c.stencils[i], i), (Stencil::Backward, 1));
            if !two_point {
                assert_abs_diff_eq!(d1[i], 2.0 + 6.0 * x[i], epsilon = 1e-7);
            }
            assert_abs_diff_eq!(d2[i], 6.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn uniform_centered_weights() {
        let h = 0.5;
        let c = centered(&[h; 4]).unwrap();
        assert_abs_diff_eq!(c.first.get(2, -1), -1.0 / (2.0 * h), epsilon = 1e-14);
        assert_abs_diff_eq!(c.first.get(2, 0), 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(c.first.get(2, 1), 1.0 / (2.0 * h), epsilon = 1e-14);
        assert_abs_diff_eq!(c.second.get(2, -1), 1.0 / (h * h), epsilon = 1e-14);
        assert_abs_diff_eq!(c.second.get(2, 0), -2.0 / (h * h), epsilon = 1e-14);
        assert_abs_diff_eq!(c.second.get(2, 1), 1.0 / (h * h), epsilon = 1e-14);
        assert_eq!(c.first.offsets(), &[-1, 0, 1]);
    }

    #[test]
    fn boundary_rows_are_left_empty() {
        let c = forward(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        for (_, d) in c.first.iter().chain(c.second.iter()) {
            assert_eq!(d[0], 0.0);
            assert_eq!(d[4], 0.0);
        }
        assert_eq!(c.stencils[0], Stencil::Boundary);
        assert_eq!(c.stencils[4], Stencil::Boundary);
    }

    #[test]
    fn one_sided_fallback_rows() {
        let d = [0.1, 0.2, 0.3, 0.4];
        let f = forward(&d).unwrap();
        assert_abs_diff_eq!(f.first.get(3, 0), -1.0 / 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(f.first.get(3, 1), 1.0 / 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(f.second.get(3, -1), centered_second(0.3, 0.4)[0].1, epsilon = 1e-12);
        let b = backward(&d).unwrap();
        assert_abs_diff_eq!(b.first.get(1, -1), -1.0 / 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(b.first.get(1, 0), 1.0 / 0.1, epsilon = 1e-12);
    }

    #[test]
    fn one_sided_weights_are_exact_on_quadratics() {
        let x = axis_from(&[0.1, 0.25, 0.05, 0.3, 0.2, 0.15]);
        let d = deltas(&x);
        exact_on_quadratic(&centered(&d).unwrap(), &x);
        exact_on_quadratic(&forward(&d).unwrap(), &x);
        exact_on_quadratic(&backward(&d).unwrap(), &x);
    }

    #[test]
    fn upwind_switch_stitches_rows() {
        let d = [1.0; 7];
        let c = composite(&d, Some(3), None).unwrap();
        assert_eq!(
            c.stencils,
            vec![
                Stencil::Boundary,
                Stencil::Centered,
                Stencil::Centered,
                Stencil::Forward,
                Stencil::Forward,
                Stencil::Forward,
                Stencil::Forward,
                Stencil::Boundary,
            ]
        );
        assert_abs_diff_eq!(c.first.get(3, 2), -0.5, epsilon = 1e-14);
        assert_eq!(c.first.get(2, 2), 0.0);
        assert!(c.first.offsets().contains(&2));
        assert!(!c.first.offsets().contains(&-2));
    }

    #[test]
    fn downwind_switch_stitches_rows() {
        let c = composite(&[1.0; 7], None, Some(3)).unwrap();
        assert_eq!(&c.stencils[1..=3], &[Stencil::Backward; 3]);
        assert_eq!(&c.stencils[4..=6], &[Stencil::Centered; 3]);
        assert_abs_diff_eq!(c.first.get(3, -2), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn conflicting_switches_are_rejected() {
        let d = [1.0; 5];
        assert!(matches!(
            composite(&d, Some(2), Some(3)),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            composite(&d, Some(0), None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            composite(&d, None, Some(5)),
            Err(Error::Configuration(_))
        ));
        assert!(with_policy(&d, WindPolicy::Downwind(4)).is_ok());
    }

    proptest! {
        #[test]
        fn rows_annihilate_constants(
            steps in proptest::collection::vec(0.01f64..2.0, 2..20),
            which in 0usize..5,
            flip_seed in 0usize..1_000,
        ) {
            let n = steps.len() + 1;
            let flip = 1 + flip_seed % (n - 2);
            let c = match which {
                0 => centered(&steps).unwrap(),
                1 => forward(&steps).unwrap(),
                2 => backward(&steps).unwrap(),
                3 => composite(&steps, Some(flip), None).unwrap(),
                _ => with_policy(&steps, WindPolicy::Downwind(flip)).unwrap(),
            };
            for row in 0..n {
                prop_assert!(c.first.row_sum(row).abs() <= 1e-10);
                prop_assert!(c.second.row_sum(row).abs() <= 1e-10);
            }
        }
    }
}
