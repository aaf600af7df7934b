//! The finite-difference engine: a grid plus one operator per dimension.
//!
//! The engine is generic over the representation of its mixed-derivative
//! terms. It starts out with [`CoupledOperator`]s; [`diagonalize`] consumes
//! it and returns an engine over [`DiagonalizedOperator`]s, which is the
//! only kind the Hundsdorfer–Verwer scheme accepts.
//!
//! [`diagonalize`]: FiniteDifferenceEngine::diagonalize

use fd_core::{
    errors::{Error, Result},
    Real, Timer,
};
use tracing::{info, info_span, trace, warn};

use super::banded_operator::{BandedOperator, Combine};
use super::cross::{CoupledOperator, DiagonalizedOperator, MixedOperator};
use super::grid::Grid;
use super::schemes::{Douglas, HundsdorferVerwer, Implicit, Scheme};

/// A dimension of the PDE operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    /// Derivatives along a single axis.
    Axis(usize),
    /// The mixed derivative between two axes.
    CrossAxis(usize, usize),
}

/// Borrowed operator of a given [`Dimension`].
#[derive(Debug, Clone, Copy)]
pub enum OperatorRef<'a, C> {
    /// Per-axis banded operator.
    Axis(&'a BandedOperator),
    /// Mixed-derivative operator.
    Cross(&'a C),
}

/// Number of steps of size at most `dt` covering `tenor`.
pub fn steps_for(tenor: Real, dt: Real) -> usize {
    if !(tenor > 0.0 && dt > 0.0) {
        return 0;
    }
    (tenor / dt - 1e-9).ceil().max(0.0) as usize
}

/// A grid and its operators, advanced in time by a [`Scheme`].
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteDifferenceEngine<C = CoupledOperator> {
    grid: Grid,
    axes: Vec<BandedOperator>,
    cross: Vec<((usize, usize), C)>,
}

impl FiniteDifferenceEngine<CoupledOperator> {
    /// An engine with one operator per grid axis and no mixed terms.
    pub fn new(grid: Grid, axes: Vec<BandedOperator>) -> Result<Self> {
        if axes.len() != grid.ndim() {
            return Err(Error::InvalidArgument(format!(
                "{} axis operators for a {}-dimensional grid",
                axes.len(),
                grid.ndim()
            )));
        }
        for (d, op) in axes.iter().enumerate() {
            if op.size() != grid.len() {
                return Err(Error::InvalidArgument(format!(
                    "operator for axis {d} acts on {} points, grid has {}",
                    op.size(),
                    grid.len()
                )));
            }
        }
        Ok(Self {
            grid,
            axes,
            cross: Vec::new(),
        })
    }

    /// Add the mixed term between axes `i < j`.
    pub fn with_cross(mut self, i: usize, j: usize, op: CoupledOperator) -> Result<Self> {
        if !(i < j && j < self.grid.ndim()) {
            return Err(Error::InvalidArgument(format!(
                "cross term ({i}, {j}) on a {}-dimensional grid",
                self.grid.ndim()
            )));
        }
        if op.size() != self.grid.len() {
            return Err(Error::InvalidArgument(format!(
                "cross operator acts on {} points, grid has {}",
                op.size(),
                self.grid.len()
            )));
        }
        self.cross.retain(|(key, _)| *key != (i, j));
        self.cross.push(((i, j), op));
        Ok(self)
    }

    /// Replace every mixed term by its factored form.
    pub fn diagonalize(self) -> FiniteDifferenceEngine<DiagonalizedOperator> {
        FiniteDifferenceEngine {
            grid: self.grid,
            axes: self.axes,
            cross: self
                .cross
                .into_iter()
                .map(|(key, op)| (key, op.diagonalize()))
                .collect(),
        }
    }
}

impl FiniteDifferenceEngine<DiagonalizedOperator> {
    /// Already diagonalized; returns `self` unchanged.
    pub fn diagonalize(self) -> Self {
        self
    }

    /// Run `steps` Hundsdorfer–Verwer steps with weight `theta`.
    pub fn solve_hundsdorfer_verwer(
        &mut self,
        steps: usize,
        dt: Real,
        initial: &[Real],
        theta: Real,
    ) -> Result<Vec<Real>> {
        self.run(&HundsdorferVerwer::new(theta), steps, dt, initial)
    }
}

impl<C: MixedOperator> FiniteDifferenceEngine<C> {
    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access to the grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Per-axis operators, indexed by axis.
    pub fn axis_operators(&self) -> &[BandedOperator] {
        &self.axes
    }

    /// Mixed terms with the axes they couple.
    pub fn cross_operators(&self) -> impl Iterator<Item = ((usize, usize), &C)> + '_ {
        self.cross.iter().map(|(key, op)| (*key, op))
    }

    /// Every dimension with an operator, axes first.
    pub fn dimensions(&self) -> Vec<Dimension> {
        (0..self.axes.len())
            .map(Dimension::Axis)
            .chain(self.cross.iter().map(|((i, j), _)| Dimension::CrossAxis(*i, *j)))
            .collect()
    }

    /// The operator of `dim`, if present.
    pub fn operator(&self, dim: Dimension) -> Option<OperatorRef<'_, C>> {
        match dim {
            Dimension::Axis(d) => self.axes.get(d).map(OperatorRef::Axis),
            Dimension::CrossAxis(i, j) => self
                .cross
                .iter()
                .find(|(key, _)| *key == (i, j))
                .map(|(_, op)| OperatorRef::Cross(op)),
        }
    }

    /// `L·v`: the sum of every operator applied to `v`.
    pub fn apply(&self, values: &[Real]) -> Vec<Real> {
        let mut out = vec![0.0; values.len()];
        let parts = self
            .axes
            .iter()
            .map(|a| a.apply(values))
            .chain(self.cross.iter().map(|(_, c)| c.apply(values)));
        for part in parts {
            for (o, p) in out.iter_mut().zip(part) {
                *o += p;
            }
        }
        out
    }

    /// The whole operator `L` as one banded matrix.
    pub fn total_operator(&self) -> Result<BandedOperator> {
        let mut total = self
            .axes
            .first()
            .cloned()
            .ok_or_else(|| Error::Precondition("engine has no operators".into()))?;
        for a in &self.axes[1..] {
            total = total.combine(a, Combine::Add)?;
        }
        for (_, c) in &self.cross {
            total = total.combine(&c.to_banded()?, Combine::Add)?;
        }
        Ok(total)
    }

    /// Run `steps` steps of `scheme` from `initial`; the result is also
    /// stored as the grid's current solution.
    pub fn run<S: Scheme<C> + ?Sized>(
        &mut self,
        scheme: &S,
        steps: usize,
        dt: Real,
        initial: &[Real],
    ) -> Result<Vec<Real>> {
        let _span = info_span!("fd_run", scheme = scheme.name(), steps, dt).entered();
        let timer = Timer::start("fd run");
        let values = self.advance(scheme, steps, dt, initial.to_vec(), 0)?;
        let elapsed = timer.stop();
        info!(?elapsed, "run finished");
        self.grid.domain_mut().copy_from_slice(&values);
        Ok(values)
    }

    /// `θ`-weighted implicit steps on the full operator.
    pub fn solve_implicit(
        &mut self,
        steps: usize,
        dt: Real,
        initial: &[Real],
        theta: Real,
    ) -> Result<Vec<Real>> {
        self.run(&Implicit::new(theta), steps, dt, initial)
    }

    /// Douglas ADI steps with weight `theta`.
    pub fn solve_douglas(
        &mut self,
        steps: usize,
        dt: Real,
        initial: &[Real],
        theta: Real,
    ) -> Result<Vec<Real>> {
        self.run(&Douglas::new(theta), steps, dt, initial)
    }

    /// `2·smoothing_steps` fully implicit half steps, then
    /// `steps - smoothing_steps` steps of `scheme`.
    pub fn solve_smooth<S: Scheme<C> + ?Sized>(
        &mut self,
        steps: usize,
        dt: Real,
        initial: &[Real],
        smoothing_steps: usize,
        scheme: &S,
    ) -> Result<Vec<Real>> {
        if smoothing_steps > steps {
            return Err(Error::InvalidArgument(format!(
                "{smoothing_steps} smoothing steps exceed the {steps} steps requested"
            )));
        }
        let _span = info_span!(
            "fd_run_smoothed",
            scheme = scheme.name(),
            steps,
            smoothing_steps,
            dt
        )
        .entered();
        let timer = Timer::start("fd smoothed run");
        let smoothed = self.advance(
            &Implicit::default(),
            2 * smoothing_steps,
            0.5 * dt,
            initial.to_vec(),
            0,
        )?;
        let values = self.advance(
            scheme,
            steps - smoothing_steps,
            dt,
            smoothed,
            2 * smoothing_steps,
        )?;
        let elapsed = timer.stop();
        info!(?elapsed, "smoothed run finished");
        self.grid.domain_mut().copy_from_slice(&values);
        Ok(values)
    }

    fn advance<S: Scheme<C> + ?Sized>(
        &self,
        scheme: &S,
        steps: usize,
        dt: Real,
        mut values: Vec<Real>,
        first_step: usize,
    ) -> Result<Vec<Real>> {
        let name = scheme.name();
        if values.len() != self.grid.len() {
            return Err(Error::InvalidArgument(format!(
                "initial condition has {} values, grid has {}",
                values.len(),
                self.grid.len()
            )));
        }
        if !(dt > 0.0) {
            return Err(Error::InvalidArgument(format!("time step must be positive, got {dt}")));
        }
        if steps == 0 {
            return Ok(values);
        }
        let mut stepper = scheme
            .prepare(self, dt)
            .map_err(|e| e.at_step(name, first_step))?;
        for step in first_step..first_step + steps {
            values = stepper.step(&values).map_err(|e| {
                warn!(scheme = name, step, error = %e, "step failed");
                e.at_step(name, step)
            })?;
            if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
                warn!(scheme = name, step, point = bad, "non-finite value");
                return Err(Error::Solver {
                    scheme: name.to_string(),
                    step,
                    reason: format!("non-finite value at point {bad}"),
                });
            }
            trace!(scheme = name, step, "step done");
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::coefficients::centered;
    use crate::finite_differences::grid::uniform_axis;
    use approx::assert_abs_diff_eq;

    /// Heat equation `u_t = u_xx + u_yy` on the unit square with zero
    /// Dirichlet boundaries.
    fn heat(n: usize) -> FiniteDifferenceEngine {
        let x = uniform_axis(0.0, 1.0, n).unwrap();
        let h = x[1] - x[0];
        let mut d2 = BandedOperator::new(centered(&vec![h; n - 1]).unwrap().second);
        d2.set_row(0, &[]);
        d2.set_row(n - 1, &[]);
        let grid = Grid::new(vec![x.clone(), x], |p| {
            (std::f64::consts::PI * p[0]).sin() * (std::f64::consts::PI * p[1]).sin()
        })
        .unwrap();
        let shape = grid.shape().to_vec();
        let axes = vec![
            d2.for_axis(&shape, 0).unwrap(),
            d2.for_axis(&shape, 1).unwrap(),
        ];
        FiniteDifferenceEngine::new(grid, axes).unwrap()
    }

    fn mixed_engine(n: usize) -> FiniteDifferenceEngine {
        let engine = heat(n);
        let x = engine.grid().axis(0).to_vec();
        let d1 = BandedOperator::new(centered(&vec![x[1] - x[0]; n - 1]).unwrap().first);
        let shape = engine.grid().shape().to_vec();
        let cross = CoupledOperator::new(
            d1.for_axis(&shape, 0).unwrap(),
            d1.for_axis(&shape, 1).unwrap(),
            vec![0.2; n * n],
        )
        .unwrap();
        engine.with_cross(0, 1, cross).unwrap()
    }

    fn decay(n: usize, t: Real) -> Real {
        let x = uniform_axis(0.0, 1.0, n).unwrap();
        let i = n / 2;
        let s = (std::f64::consts::PI * x[i]).sin();
        (-2.0 * std::f64::consts::PI.powi(2) * t).exp() * s * s
    }

    #[test]
    fn steps_cover_tenor() {
        assert_eq!(steps_for(1.0, 1.0 / 150.0), 150);
        assert_eq!(steps_for(1.0, 0.3), 4);
        assert_eq!(steps_for(0.0, 0.1), 0);
    }

    #[test]
    fn dimensions_and_lookup() {
        let e = mixed_engine(9);
        assert_eq!(
            e.dimensions(),
            vec![Dimension::Axis(0), Dimension::Axis(1), Dimension::CrossAxis(0, 1)]
        );
        assert!(matches!(e.operator(Dimension::Axis(1)), Some(OperatorRef::Axis(_))));
        assert!(matches!(
            e.operator(Dimension::CrossAxis(0, 1)),
            Some(OperatorRef::Cross(_))
        ));
        assert!(e.operator(Dimension::Axis(2)).is_none());
    }

    #[test]
    fn total_operator_matches_apply() {
        let e = mixed_engine(7);
        let v: Vec<Real> = (0..49).map(|p| (p as Real * 0.3).cos()).collect();
        let total = e.total_operator().unwrap();
        for (a, b) in total.apply(&v).iter().zip(e.apply(&v)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn schemes_reproduce_heat_decay() {
        let n = 21;
        let (t, steps) = (0.05, 50);
        let dt = t / steps as Real;
        let centre = (n / 2) * n + n / 2;
        let expected = decay(n, t);

        let mut e = heat(n);
        let initial = e.grid().initial().to_vec();
        let implicit = e.solve_implicit(steps, dt, &initial, 0.5).unwrap();
        let douglas = e.solve_douglas(steps, dt, &initial, 0.5).unwrap();
        assert_eq!(e.grid().domain(), douglas.as_slice());
        let mut d = e.diagonalize();
        let hv = d
            .solve_hundsdorfer_verwer(steps, dt, &initial, HundsdorferVerwer::default().theta)
            .unwrap();
        for v in [implicit[centre], douglas[centre], hv[centre]] {
            assert_abs_diff_eq!(v, expected, epsilon = 5e-3);
        }
    }

    #[test]
    fn diagonalized_engine_agrees_with_coupled() {
        let coupled = mixed_engine(9);
        let v: Vec<Real> = (0..81).map(|p| (p as Real * 0.17).sin()).collect();
        let lv = coupled.apply(&v);
        let diag = coupled.diagonalize().diagonalize();
        for (a, b) in lv.iter().zip(diag.apply(&v)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn smoothing_runs_implicit_half_steps_first() {
        let n = 11;
        let mut a = heat(n);
        let initial = a.grid().initial().to_vec();
        let smooth = a
            .solve_smooth(10, 0.01, &initial, 2, &Douglas::default())
            .unwrap();
        let mut b = heat(n);
        let half = b.solve_implicit(4, 0.005, &initial, 1.0).unwrap();
        let rest = b.solve_douglas(8, 0.01, &half, 0.5).unwrap();
        assert_eq!(smooth, rest);
        assert!(a.solve_smooth(3, 0.01, &initial, 4, &Douglas::default()).is_err());
    }

    #[test]
    fn divergence_names_the_step() {
        let mut e = heat(11);
        let initial = e.grid().initial().to_vec();
        // θ = 0 makes Douglas fully explicit, far beyond its stability limit
        let err = e.solve_douglas(1000, 0.5, &initial, 0.0).unwrap_err();
        match err {
            Error::Solver { scheme, step, .. } => {
                assert_eq!(scheme, "Douglas");
                assert!(step > 0 && step < 1000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_initial_condition_is_rejected() {
        let mut e = heat(5);
        assert!(matches!(
            e.solve_implicit(1, 0.1, &[0.0; 3], 1.0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
