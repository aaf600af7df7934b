//! One-dimensional axes and the tensor-product grid.
//!
//! Axis constructors return strictly increasing knot vectors. The
//! concentrated ones (`sinh`, `exponential`, `cubic sigmoid`) place more
//! knots near a point of interest, and can snap a knot exactly onto it so
//! that the solution there is read without interpolation error.

use fd_core::{
    errors::{Error, Result},
    Real,
};
use fd_math::{brent_minimize, close_enough, golden_section};
use tracing::{debug, warn};

use super::coefficients::deltas;

// ── Axes ──────────────────────────────────────────────────────────────────────

/// `n` equally spaced knots on `[low, high]`.
pub fn uniform_axis(low: Real, high: Real, n: usize) -> Result<Vec<Real>> {
    let params = format!("uniform(low={low}, high={high}, n={n})");
    if n == 0 || !(low.is_finite() && high.is_finite()) || (n > 1 && low >= high) {
        return Err(Error::Construction {
            params,
            reason: "need n >= 1 and low < high".into(),
        });
    }
    if n == 1 {
        return Ok(vec![low]);
    }
    let step = (high - low) / (n - 1) as Real;
    let mut axis: Vec<Real> = (0..n).map(|i| low + i as Real * step).collect();
    axis[n - 1] = high;
    Ok(axis)
}

/// `n` knots on `[0, ≈high]`, concentrated around `exact` via a sinh map
/// with density parameter `density` (smaller means tighter).
///
/// The upper end is searched within ±5% of `high` for the placement that
/// puts a knot nearest to `exact`; with `force_exact` that knot is then
/// moved onto `exact`.
pub fn sinh_axis(
    exact: Real,
    high: Real,
    density: Real,
    n: usize,
    force_exact: bool,
) -> Result<Vec<Real>> {
    let params = format!("sinh(exact={exact}, high={high}, density={density}, n={n})");
    if n == 1 {
        return Ok(vec![exact]);
    }
    if n == 0 || !(density > 0.0) || !(high > 0.0) || !exact.is_finite() {
        return Err(Error::Construction {
            params,
            reason: "need n >= 1, density > 0 and high > 0".into(),
        });
    }

    let knots = |top: Real| -> Vec<Real> {
        let start = (-exact / density).asinh();
        let step = (((top - exact) / density).asinh() - start) / n as Real;
        let raw: Vec<Real> = (0..n)
            .map(|i| exact + density * (start + i as Real * step).sinh())
            .collect();
        let floor = raw[0];
        raw.into_iter().map(|x| x - floor).collect()
    };
    let miss = |top: Real| {
        let axis = knots(top);
        (axis[nearest_index(&axis, exact)] - exact).abs()
    };

    let (lo, hi) = (0.95 * high, 1.05 * high);
    let tolerance = 1e-8 * high;
    let best = match brent_minimize(miss, lo, hi, tolerance, 500) {
        Ok(m) => m,
        Err(e) => {
            warn!(%params, error = %e, "Brent search failed, retrying with golden section");
            golden_section(miss, lo, hi, tolerance, 2_000).map_err(|e| Error::Construction {
                params: params.clone(),
                reason: e.to_string(),
            })?
        }
    };

    let mut axis = knots(best.x);
    if force_exact {
        let j = nearest_index(&axis, exact);
        axis[j] = exact;
    }
    check_increasing(&axis, &params)?;
    debug!(%params, top = best.x, miss = best.value, "sinh axis built");
    Ok(axis)
}

/// `n` knots `x_i = (l + i·dv)^power` on `[low, high]` with `l = low^(1/power)`.
///
/// With `force_exact` the spacing `dv` is stretched so that the last knot at
/// or below `exact` lands on it; the top of the axis then moves slightly past
/// `high`.
pub fn exponential_axis(
    low: Real,
    exact: Real,
    high: Real,
    power: Real,
    n: usize,
    force_exact: bool,
) -> Result<Vec<Real>> {
    let params =
        format!("exponential(low={low}, exact={exact}, high={high}, power={power}, n={n})");
    if n == 1 {
        return Ok(vec![exact]);
    }
    let fail = |reason: &str| Error::Construction {
        params: params.clone(),
        reason: reason.to_string(),
    };
    if n == 0 || !(power > 0.0) || !(low >= 0.0) || !(low < high) {
        return Err(fail("need n >= 1, power > 0 and 0 <= low < high"));
    }
    if force_exact && !(low < exact && exact < high) {
        return Err(fail("exact must lie strictly inside (low, high)"));
    }

    let l = low.powf(1.0 / power);
    let h = high.powf(1.0 / power);
    let mut dv = (h - l) / (n - 1) as Real;
    let mut snapped = None;
    if force_exact {
        let x = exact.powf(1.0 / power);
        let above = (1..n)
            .find(|&i| l + i as Real * dv > x)
            .ok_or_else(|| fail("no knot lies above exact"))?;
        let j = above - 1;
        if j == 0 {
            return Err(fail("exact lies below the first interior knot"));
        }
        dv = (x - l) / j as Real;
        snapped = Some(j);
    }

    let mut axis: Vec<Real> = (0..n)
        .map(|i| (l + i as Real * dv).powf(power))
        .collect();
    if let Some(j) = snapped {
        axis[j] = exact;
    }
    check_increasing(&axis, &params)?;
    debug!(%params, "exponential axis built");
    Ok(axis)
}

/// `n` knots on `[2·exact - high, high]`, concentrated around `exact` by a
/// cubic map; `density = 0` gives a uniform axis.
pub fn cubic_sigmoid_axis(exact: Real, high: Real, density: Real, n: usize) -> Result<Vec<Real>> {
    let params = format!("cubic_sigmoid(exact={exact}, high={high}, density={density}, n={n})");
    if n == 1 {
        return Ok(vec![exact]);
    }
    if n == 0 || !(high > exact) || !(density >= 0.0) {
        return Err(Error::Construction {
            params,
            reason: "need n >= 1, high > exact and density >= 0".into(),
        });
    }
    if density == 0.0 {
        return uniform_axis(2.0 * exact - high, high, n);
    }
    let scale = (high - exact) / (density.powi(3) + density);
    let dx = 1.0 / (n - 1) as Real;
    let axis: Vec<Real> = (0..n)
        .map(|i| {
            let x = (2.0 * i as Real * dx - 1.0) * density;
            exact + (x.powi(3) + x) * scale
        })
        .collect();
    check_increasing(&axis, &params)?;
    Ok(axis)
}

fn check_increasing(axis: &[Real], params: &str) -> Result<()> {
    if axis.iter().any(|x| !x.is_finite()) || axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::Construction {
            params: params.to_string(),
            reason: "knots are not strictly increasing".into(),
        });
    }
    Ok(())
}

/// Index of the knot nearest to `x` (ties go to the lower knot).
pub fn nearest_index(axis: &[Real], x: Real) -> usize {
    let upper = axis.partition_point(|k| *k < x);
    if upper == 0 {
        return 0;
    }
    if upper == axis.len() {
        return axis.len() - 1;
    }
    if x - axis[upper - 1] <= axis[upper] - x {
        upper - 1
    } else {
        upper
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Tensor product of axes with the initial condition and the live solution.
///
/// Values are flattened row-major: for shape `(n0, n1)` point `(i, j)` sits at
/// `i·n1 + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    axes: Vec<Vec<Real>>,
    shape: Vec<usize>,
    initial: Vec<Real>,
    domain: Vec<Real>,
}

impl Grid {
    /// Build a grid from `axes`, evaluating `payoff` at every point for the
    /// initial condition.
    pub fn new<F>(axes: Vec<Vec<Real>>, payoff: F) -> Result<Self>
    where
        F: Fn(&[Real]) -> Real,
    {
        if axes.is_empty() {
            return Err(Error::InvalidArgument("grid needs at least one axis".into()));
        }
        for (d, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(Error::InvalidArgument(format!("grid axis {d} has no knots")));
            }
            check_increasing(axis, &format!("grid axis {d}"))?;
        }
        let shape: Vec<usize> = axes.iter().map(Vec::len).collect();
        let len = shape.iter().product();
        let mut point = vec![0.0; axes.len()];
        let mut initial = Vec::with_capacity(len);
        for flat in 0..len {
            let mut rest = flat;
            for d in (0..axes.len()).rev() {
                point[d] = axes[d][rest % shape[d]];
                rest /= shape[d];
            }
            initial.push(payoff(&point));
        }
        let domain = initial.clone();
        Ok(Self {
            axes,
            shape,
            initial,
            domain,
        })
    }

    /// Points per axis.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Total number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.initial.len()
    }

    /// Whether the grid has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }

    /// Knots of axis `d`.
    pub fn axis(&self, d: usize) -> &[Real] {
        &self.axes[d]
    }

    /// All axes.
    pub fn axes(&self) -> &[Vec<Real>] {
        &self.axes
    }

    /// Spacings of axis `d`.
    pub fn deltas(&self, d: usize) -> Vec<Real> {
        deltas(&self.axes[d])
    }

    /// The initial condition (payoff).
    pub fn initial(&self) -> &[Real] {
        &self.initial
    }

    /// The current solution.
    pub fn domain(&self) -> &[Real] {
        &self.domain
    }

    /// Mutable access to the current solution.
    pub fn domain_mut(&mut self) -> &mut [Real] {
        &mut self.domain
    }

    /// Reset the solution to the initial condition.
    pub fn reset(&mut self) {
        self.domain.copy_from_slice(&self.initial);
    }

    /// Index along axis `d` of the knot nearest to `x`.
    pub fn nearest_index(&self, d: usize, x: Real) -> usize {
        nearest_index(&self.axes[d], x)
    }

    /// Flattened position of the multi-index `index`.
    pub fn flat_index(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(&self.shape)
            .fold(0, |flat, (i, n)| flat * n + i)
    }

    /// Coordinates of the flattened point `flat`.
    pub fn point(&self, flat: usize) -> Vec<Real> {
        let mut point = vec![0.0; self.ndim()];
        let mut rest = flat;
        for d in (0..self.ndim()).rev() {
            point[d] = self.axes[d][rest % self.shape[d]];
            rest /= self.shape[d];
        }
        point
    }

    /// Multilinear interpolation of `values` at `at`.
    pub fn interpolate(&self, values: &[Real], at: &[Real]) -> Result<Real> {
        if values.len() != self.len() || at.len() != self.ndim() {
            return Err(Error::InvalidArgument(format!(
                "interpolate: {} values at a {}-d point on a grid of {} points in {} dimensions",
                values.len(),
                at.len(),
                self.len(),
                self.ndim()
            )));
        }
        let mut cells = Vec::with_capacity(self.ndim());
        for (d, &x) in at.iter().enumerate() {
            let axis = &self.axes[d];
            if axis.len() == 1 {
                cells.push((0, 0.0));
                continue;
            }
            let (first, last) = (axis[0], axis[axis.len() - 1]);
            // Points rebuilt from a knot (exp then ln) may land a few ulps outside.
            let x = if close_enough(x, first, 42) {
                first
            } else if close_enough(x, last, 42) {
                last
            } else {
                x
            };
            if !(x >= first && x <= last) {
                return Err(Error::InvalidArgument(format!(
                    "interpolate: {x} lies outside axis {d} [{first}, {last}]"
                )));
            }
            let upper = axis.partition_point(|k| *k <= x).clamp(1, axis.len() - 1);
            let lower = upper - 1;
            let weight = (x - axis[lower]) / (axis[upper] - axis[lower]);
            cells.push((lower, weight));
        }

        let mut value = 0.0;
        let mut index = vec![0usize; self.ndim()];
        for corner in 0..(1usize << self.ndim()) {
            let mut weight = 1.0;
            for (d, &(lower, w)) in cells.iter().enumerate() {
                let up = (corner >> d) & 1 == 1;
                if up && self.shape[d] == 1 {
                    weight = 0.0;
                    break;
                }
                index[d] = lower + usize::from(up);
                weight *= if up { w } else { 1.0 - w };
            }
            if weight != 0.0 {
                value += weight * values[self.flat_index(&index)];
            }
        }
        Ok(value)
    }
}
