//! Heston on a sinh spot axis × exponential variance axis.
//!
//! The pricing PDE splits as `u_τ = A1 u + A2 u + A0 u` with
//!
//! ```text
//! A1 = ½ v s² ∂ss + (r - q) s ∂s - ½ r
//! A2 = ½ σ² v ∂vv + κ(θ - v) ∂v - ½ r
//! A0 = ρ σ s v ∂sv
//! ```
//!
//! Boundaries:
//!
//! * `s = 0`: every spot coefficient vanishes.
//! * `s = S_max`: `u_ss = 0` and `u_s` equals the far slope of the payoff,
//!   carried by the residual of `A1`.
//! * `v = 0`: the PDE degenerates to `κθ u_v` with a two-point forward
//!   difference, keeping `A2` tridiagonal. The three-point forward
//!   difference is available through
//!   [`HestonGridConfig::second_order_variance_floor`].
//! * `v = V_max`: `u_v = 0`, mirrored into the second derivative.
//!
//! The engine starts with a coupled mixed term; [`diagonalize`] switches it
//! to the factored form needed by Hundsdorfer–Verwer.
//!
//! [`diagonalize`]: HestonFiniteDifferenceEngine::diagonalize

use fd_core::{
    errors::{Error, Result},
    Real, Time,
};
use fd_methods::finite_differences::coefficients::{
    centered, deltas, forward_first, forward_first_two_point, with_policy,
};
use fd_methods::{
    exponential_axis, sinh_axis, steps_for, BandedOperator, Combine, CoupledOperator,
    DiagonalizedOperator, FiniteDifferenceEngine, Grid, MixedOperator, Scheme, Stencil,
};
use tracing::debug;

use crate::config::HestonGridConfig;
use crate::option::HestonOption;

/// `f(s, v)` at every grid point.
fn on_grid(points: &[(Real, Real)], f: impl Fn(Real, Real) -> Real) -> Vec<Real> {
    points.iter().map(|&(s, v)| f(s, v)).collect()
}

/// Finite-difference pricer for a [`HestonOption`].
#[derive(Debug, Clone)]
pub struct HestonFiniteDifferenceEngine<C = CoupledOperator> {
    option: HestonOption,
    config: HestonGridConfig,
    engine: FiniteDifferenceEngine<C>,
}

impl HestonFiniteDifferenceEngine<CoupledOperator> {
    /// Build the grid, the per-axis operators and the mixed term.
    pub fn new(option: HestonOption, config: HestonGridConfig) -> Result<Self> {
        option.validate()?;
        if config.nspots < 3 || config.nvols < 3 {
            return Err(Error::Configuration(format!(
                "Heston grid needs at least 3 knots per axis, got {}x{}",
                config.nspots, config.nvols
            )));
        }
        let k = option.strike;
        let spots = sinh_axis(
            option.spot,
            config.spot_max_factor * k,
            config.spot_density_factor * k,
            config.nspots,
            config.force_exact,
        )?;
        let vars = exponential_axis(
            0.0,
            option.variance,
            config.variance_max,
            config.variance_power,
            config.nvols,
            config.force_exact,
        )?;
        let grid = Grid::new(vec![spots.clone(), vars.clone()], |p| option.payoff(p[0]))?;
        let shape = grid.shape().to_vec();
        let (ns, nv) = (shape[0], shape[1]);
        let points: Vec<(Real, Real)> = (0..grid.len())
            .map(|p| (spots[p / nv], vars[p % nv]))
            .collect();

        let HestonOption {
            interest_rate: r,
            dividend_yield: q,
            mean_reversion: kappa,
            mean_variance: theta,
            vol_of_variance: sigma,
            correlation: rho,
            ..
        } = option;

        // ── A1: spot ──
        let ds = deltas(&spots);
        let spot = with_policy(&ds, config.spot_wind)?;
        let d2s = BandedOperator::new(spot.second)
            .with_stencils(spot.stencils.clone())
            .for_axis(&shape, 0)?;
        let d1s = BandedOperator::new(spot.first)
            .with_stencils(spot.stencils)
            .for_axis(&shape, 0)?;
        let mut a1 = d2s
            .scale_rows(&on_grid(&points, |s, v| 0.5 * v * s * s))?
            .combine(&d1s.scale_rows(&on_grid(&points, |s, _| (r - q) * s))?, Combine::Add)?
            .add_to_diagonal(-0.5 * r);
        let far = (r - q) * spots[ns - 1] * option.option_type.far_slope();
        for j in 0..nv {
            a1.residual_mut()[(ns - 1) * nv + j] = far;
        }

        // ── A2: variance ──
        let dv = deltas(&vars);
        let variance = with_policy(&dv, config.variance_wind)?;
        let mut stencils = variance.stencils;
        stencils[0] = Stencil::Forward;
        let mut d1v = BandedOperator::new(variance.first).with_stencils(stencils.clone());
        let mut d2v = BandedOperator::new(variance.second).with_stencils(stencils);
        if config.second_order_variance_floor {
            d1v.set_row(0, &forward_first(dv[0], dv[1]));
        } else {
            d1v.set_row(0, &forward_first_two_point(dv[0]));
        }
        let top = dv[nv - 2];
        d2v.set_row(nv - 1, &[(-1, 2.0 / (top * top)), (0, -2.0 / (top * top))]);
        let a2 = d2v
            .for_axis(&shape, 1)?
            .scale_rows(&on_grid(&points, |_, v| 0.5 * sigma * sigma * v))?
            .combine(
                &d1v.for_axis(&shape, 1)?
                    .scale_rows(&on_grid(&points, |_, v| kappa * (theta - v)))?,
                Combine::Add,
            )?
            .add_to_diagonal(-0.5 * r);

        // ── A0: mixed ──
        let cross = CoupledOperator::new(
            BandedOperator::new(centered(&ds)?.first).for_axis(&shape, 0)?,
            BandedOperator::new(centered(&dv)?.first).for_axis(&shape, 1)?,
            on_grid(&points, |s, v| rho * sigma * s * v),
        )?;

        debug!(
            ns,
            nv,
            spot_max = spots[ns - 1],
            variance_max = vars[nv - 1],
            a1_offsets = ?a1.offsets(),
            a2_offsets = ?a2.offsets(),
            "Heston operators built"
        );
        let engine = FiniteDifferenceEngine::new(grid, vec![a1, a2])?.with_cross(0, 1, cross)?;
        Ok(Self {
            option,
            config,
            engine,
        })
    }

    /// Switch the mixed term to its factored form.
    pub fn diagonalize(self) -> HestonFiniteDifferenceEngine<DiagonalizedOperator> {
        HestonFiniteDifferenceEngine {
            option: self.option,
            config: self.config,
            engine: self.engine.diagonalize(),
        }
    }
}

impl HestonFiniteDifferenceEngine<DiagonalizedOperator> {
    /// Already diagonalized; returns `self` unchanged.
    pub fn diagonalize(self) -> Self {
        self
    }
}

impl<C: MixedOperator> HestonFiniteDifferenceEngine<C> {
    /// The contract.
    pub fn option(&self) -> &HestonOption {
        &self.option
    }

    /// The grid configuration.
    pub fn config(&self) -> &HestonGridConfig {
        &self.config
    }

    /// The underlying engine.
    pub fn engine(&self) -> &FiniteDifferenceEngine<C> {
        &self.engine
    }

    /// Mutable access to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut FiniteDifferenceEngine<C> {
        &mut self.engine
    }

    /// The spot × variance grid.
    pub fn grid(&self) -> &Grid {
        self.engine.grid()
    }

    /// Steps of size `dt` covering the tenor.
    pub fn steps(&self, dt: Time) -> usize {
        steps_for(self.option.tenor, dt)
    }

    /// March the payoff to today with `scheme`.
    pub fn run<S: Scheme<C> + ?Sized>(&mut self, scheme: &S, dt: Time) -> Result<Vec<Real>> {
        let steps = self.steps(dt);
        let initial = self.engine.grid().initial().to_vec();
        self.engine.run(scheme, steps, dt, &initial)
    }

    /// As [`run`](Self::run), after `smoothing_steps` pairs of implicit
    /// half steps.
    pub fn run_smooth<S: Scheme<C> + ?Sized>(
        &mut self,
        scheme: &S,
        dt: Time,
        smoothing_steps: usize,
    ) -> Result<Vec<Real>> {
        let steps = self.steps(dt);
        let initial = self.engine.grid().initial().to_vec();
        self.engine
            .solve_smooth(steps, dt, &initial, smoothing_steps, scheme)
    }

    /// The solution read at today's spot and variance.
    pub fn price(&self, values: &[Real]) -> Result<Real> {
        self.grid()
            .interpolate(values, &[self.option.spot, self.option.variance])
    }

    /// Semi-analytical price of the contract.
    pub fn analytical(&self) -> Result<Real> {
        self.option.analytical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_methods::{Dimension, OperatorRef, WindPolicy};

    fn small() -> HestonFiniteDifferenceEngine {
        HestonFiniteDifferenceEngine::new(
            HestonOption::default(),
            HestonGridConfig::default().with_size(30, 20),
        )
        .unwrap()
    }

    #[test]
    fn coordinates_are_knots() {
        let e = small();
        let (s, v) = (e.grid().axis(0), e.grid().axis(1));
        assert!(s.contains(&100.0));
        assert!(v.contains(&0.04));
        assert_eq!(s[0], 0.0);
        assert_eq!(v[0], 0.0);
        assert_eq!(e.grid().shape(), &[30, 20]);
    }

    #[test]
    fn operator_bands() {
        let e = small();
        let ops = e.engine().axis_operators();
        assert!(ops.iter().all(|op| op.is_tridiagonal()));
        assert_eq!(
            e.engine().dimensions(),
            vec![Dimension::Axis(0), Dimension::Axis(1), Dimension::CrossAxis(0, 1)]
        );
        match e.engine().operator(Dimension::CrossAxis(0, 1)) {
            Some(OperatorRef::Cross(c)) => {
                assert_eq!(c.banded().offsets(), &[-21, -20, -19, -1, 0, 1, 19, 20, 21]);
            }
            _ => panic!("missing cross term"),
        }
    }

    #[test]
    fn second_order_variance_floor_widens_a2() {
        let e = HestonFiniteDifferenceEngine::new(
            HestonOption::default(),
            HestonGridConfig::default()
                .with_size(30, 20)
                .with_second_order_variance_floor(true),
        )
        .unwrap();
        let ops = e.engine().axis_operators();
        assert!(ops[0].is_tridiagonal());
        assert_eq!(ops[1].logical_offsets(), vec![-1, 0, 1, 2]);
    }

    #[test]
    fn axis_operators_record_their_stencils() {
        let e = HestonFiniteDifferenceEngine::new(
            HestonOption::default(),
            HestonGridConfig::default()
                .with_size(30, 20)
                .with_spot_wind(WindPolicy::Upwind(20))
                .with_variance_wind(WindPolicy::Downwind(5)),
        )
        .unwrap();
        let ops = e.engine().axis_operators();

        let a1 = ops[0].stencils();
        assert_eq!(a1.len(), 30);
        assert_eq!(a1[0], Stencil::Boundary);
        assert_eq!(a1[10], Stencil::Centered);
        assert!(a1[20..29].iter().all(|s| *s == Stencil::Forward));
        assert_eq!(a1[29], Stencil::Boundary);

        let a2 = ops[1].stencils();
        assert_eq!(a2.len(), 20);
        assert_eq!(a2[0], Stencil::Forward);
        assert!(a2[1..=5].iter().all(|s| *s == Stencil::Backward));
        assert_eq!(a2[6], Stencil::Centered);
        assert_eq!(a2[19], Stencil::Boundary);

        let centered = small();
        let a2 = centered.engine().axis_operators()[1].stencils();
        assert_eq!(a2[0], Stencil::Forward);
        assert!(a2[1..19].iter().all(|s| *s == Stencil::Centered));
    }

    #[test]
    fn far_spot_residual() {
        let e = small();
        let a1 = &e.engine().axis_operators()[0];
        let s_max = e.grid().axis(0)[29];
        assert!((a1.residual()[29 * 20 + 5] - 0.03 * s_max).abs() < 1e-12);
        assert_eq!(a1.residual()[28 * 20 + 5], 0.0);

        let put = HestonFiniteDifferenceEngine::new(
            HestonOption {
                option_type: crate::OptionType::Put,
                ..HestonOption::default()
            },
            HestonGridConfig::default().with_size(30, 20),
        )
        .unwrap();
        assert!(put.engine().axis_operators()[0]
            .residual()
            .iter()
            .all(|r| *r == 0.0));
    }

    #[test]
    fn diagonalize_keeps_the_operator() {
        let coupled = small();
        let v: Vec<Real> = coupled.grid().initial().to_vec();
        let lv = coupled.engine().apply(&v);
        let diag = coupled.diagonalize().diagonalize();
        for (a, b) in lv.iter().zip(diag.engine().apply(&v)) {
            assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
        }
    }

    #[test]
    fn rejects_tiny_grids() {
        assert!(matches!(
            HestonFiniteDifferenceEngine::new(
                HestonOption::default(),
                HestonGridConfig::default().with_size(2, 20)
            ),
            Err(Error::Configuration(_))
        ));
    }
}
