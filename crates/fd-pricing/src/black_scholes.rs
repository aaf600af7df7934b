//! Black–Scholes on a uniform log-spot axis.
//!
//! With `x = ln S` and `τ` the time to expiry the price solves
//!
//! ```text
//! u_τ = ½σ² u_xx + (r - q - ½σ²) u_x - r u
//! ```
//!
//! Both ends of the axis assume the price is linear in `S` (`u_xx = u_x`),
//! which reduces the PDE there to `u_τ = (r - q) u_x - r u` with a
//! one-sided two-point `u_x`. The operator stays tridiagonal under the
//! centered policy. There are no mixed terms, so the engine is diagonalized
//! straight away and every scheme applies.

use fd_core::{
    errors::{Error, Result},
    Real, Time,
};
use fd_methods::finite_differences::coefficients::with_policy;
use fd_methods::{
    steps_for, uniform_axis, BandedOperator, Combine, DiagonalizedOperator,
    FiniteDifferenceEngine, Grid, Implicit, Scheme,
};
use tracing::debug;

use crate::config::BlackScholesGridConfig;
use crate::option::BlackScholesOption;

/// Finite-difference pricer for a [`BlackScholesOption`].
#[derive(Debug, Clone)]
pub struct BlackScholesFiniteDifferenceEngine {
    option: BlackScholesOption,
    config: BlackScholesGridConfig,
    engine: FiniteDifferenceEngine<DiagonalizedOperator>,
    spot_index: usize,
}

impl BlackScholesFiniteDifferenceEngine {
    /// Build the grid and operator.
    pub fn new(option: BlackScholesOption, config: BlackScholesGridConfig) -> Result<Self> {
        option.validate()?;
        let n = config.nspots;
        if n < 3 || !(config.std_devs > 0.0) {
            return Err(Error::Configuration(format!(
                "Black-Scholes grid needs at least 3 spots and a positive width, got {n} spots over {} std devs",
                config.std_devs
            )));
        }
        let BlackScholesOption {
            interest_rate: r,
            dividend_yield: q,
            variance,
            ..
        } = option;

        let width = config.std_devs * option.volatility() * option.tenor.sqrt();
        let dx = 2.0 * width / (n - 1) as Real;
        let spot_index = (n - 1) / 2;
        let low = option.spot.ln() - spot_index as Real * dx;
        let axis = uniform_axis(low, low + (n - 1) as Real * dx, n)?;
        let grid = Grid::new(vec![axis], |p| option.payoff(p[0].exp()))?;
        let deltas = grid.deltas(0);

        let coefficients = with_policy(&deltas, config.spot_wind)?;
        let mut op = BandedOperator::new(coefficients.second)
            .scale(0.5 * variance)
            .combine(
                &BandedOperator::new(coefficients.first).scale(r - q - 0.5 * variance),
                Combine::Add,
            )?
            .add_to_diagonal(-r)
            .with_stencils(coefficients.stencils);

        let drift = r - q;
        let (first, last) = (deltas[0], deltas[n - 2]);
        op.set_row(0, &[(0, -drift / first - r), (1, drift / first)]);
        op.set_row(n - 1, &[(-1, -drift / last), (0, drift / last - r)]);
        debug!(
            n,
            dx,
            offsets = ?op.offsets(),
            tridiagonal = op.is_tridiagonal(),
            "Black-Scholes operator built"
        );

        let engine = FiniteDifferenceEngine::new(grid, vec![op])?.diagonalize();
        Ok(Self {
            option,
            config,
            engine,
            spot_index,
        })
    }

    /// The contract.
    pub fn option(&self) -> &BlackScholesOption {
        &self.option
    }

    /// The grid configuration.
    pub fn config(&self) -> &BlackScholesGridConfig {
        &self.config
    }

    /// The underlying engine.
    pub fn engine(&self) -> &FiniteDifferenceEngine<DiagonalizedOperator> {
        &self.engine
    }

    /// Mutable access to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut FiniteDifferenceEngine<DiagonalizedOperator> {
        &mut self.engine
    }

    /// The grid (axis in `ln S`).
    pub fn grid(&self) -> &Grid {
        self.engine.grid()
    }

    /// The spatial operator.
    pub fn operator(&self) -> &BandedOperator {
        &self.engine.axis_operators()[0]
    }

    /// Index of the knot at `ln(spot)`.
    pub fn spot_index(&self) -> usize {
        self.spot_index
    }

    /// Steps of size `dt` covering the tenor.
    pub fn steps(&self, dt: Time) -> usize {
        steps_for(self.option.tenor, dt)
    }

    /// March the payoff to today with `scheme`.
    pub fn run<S: Scheme<DiagonalizedOperator> + ?Sized>(
        &mut self,
        scheme: &S,
        dt: Time,
    ) -> Result<Vec<Real>> {
        let steps = self.steps(dt);
        let initial = self.engine.grid().initial().to_vec();
        self.engine.run(scheme, steps, dt, &initial)
    }

    /// As [`run`](Self::run), after `smoothing_steps` pairs of implicit
    /// half steps.
    pub fn run_smooth<S: Scheme<DiagonalizedOperator> + ?Sized>(
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

    /// Fully implicit run; the price today.
    pub fn price_implicit(&mut self, dt: Time) -> Result<Real> {
        let values = self.run(&Implicit::default(), dt)?;
        self.price(&values)
    }

    /// The solution read at today's spot.
    pub fn price(&self, values: &[Real]) -> Result<Real> {
        self.grid().interpolate(values, &[self.option.spot.ln()])
    }

    /// `(∂V/∂S, ∂²V/∂S²)` at the spot knot from centered log-space
    /// differences.
    pub fn delta_gamma(&self, values: &[Real]) -> Result<(Real, Real)> {
        if values.len() != self.grid().len() {
            return Err(Error::InvalidArgument(format!(
                "{} values on a grid of {} points",
                values.len(),
                self.grid().len()
            )));
        }
        let i = self.spot_index;
        let axis = self.grid().axis(0);
        let (hm, hp) = (axis[i] - axis[i - 1], axis[i + 1] - axis[i]);
        let (vm, v, vp) = (values[i - 1], values[i], values[i + 1]);
        let ux = (vp - vm) / (hm + hp);
        let uxx = 2.0 * (hm * vp - (hm + hp) * v + hp * vm) / (hm * hp * (hm + hp));
        let s = axis[i].exp();
        Ok((ux / s, (uxx - ux) / (s * s)))
    }

    /// Closed-form price of the contract.
    pub fn analytical(&self) -> Real {
        self.option.analytical()
    }
}
