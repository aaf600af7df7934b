//! Grid sizing for the model engines.

use fd_core::{Real, Size};
use fd_methods::WindPolicy;

/// Grid for the one-dimensional Black–Scholes engine.
///
/// The log-spot axis is uniform, centered on `ln(spot)` and spans
/// `std_devs` standard deviations `σ√T` on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlackScholesGridConfig {
    /// Number of log-spot knots.
    pub nspots: Size,
    /// Half-width of the axis in standard deviations.
    pub std_devs: Real,
    /// First-derivative stencil policy along the axis.
    pub spot_wind: WindPolicy,
}

impl Default for BlackScholesGridConfig {
    fn default() -> Self {
        Self {
            nspots: 150,
            std_devs: 5.0,
            spot_wind: WindPolicy::Centered,
        }
    }
}

impl BlackScholesGridConfig {
    /// Set the number of knots.
    pub fn with_nspots(mut self, nspots: Size) -> Self {
        self.nspots = nspots;
        self
    }

    /// Set the half-width in standard deviations.
    pub fn with_std_devs(mut self, std_devs: Real) -> Self {
        self.std_devs = std_devs;
        self
    }

    /// Set the first-derivative stencil policy.
    pub fn with_spot_wind(mut self, policy: WindPolicy) -> Self {
        self.spot_wind = policy;
        self
    }
}

/// Grid for the two-dimensional Heston engine.
///
/// The spot axis is a sinh axis on `[0, spot_max_factor·K]` concentrated
/// around the spot with density `spot_density_factor·K`; the variance axis
/// is an exponential axis on `[0, variance_max]` with exponent
/// `variance_power`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonGridConfig {
    /// Number of spot knots.
    pub nspots: Size,
    /// Number of variance knots.
    pub nvols: Size,
    /// Upper end of the spot axis as a multiple of the strike.
    pub spot_max_factor: Real,
    /// Sinh density as a multiple of the strike.
    pub spot_density_factor: Real,
    /// Upper end of the variance axis.
    pub variance_max: Real,
    /// Exponent of the variance axis.
    pub variance_power: Real,
    /// First-derivative stencil policy along the spot axis.
    pub spot_wind: WindPolicy,
    /// First-derivative stencil policy along the variance axis.
    pub variance_wind: WindPolicy,
    /// Snap a knot onto the spot and onto the initial variance.
    pub force_exact: bool,
    /// Use the three-point forward `∂v` on the `v = 0` row instead of the
    /// two-point one. More accurate there, but `A2` is then no longer
    /// tridiagonal.
    pub second_order_variance_floor: bool,
}

impl Default for HestonGridConfig {
    fn default() -> Self {
        Self {
            nspots: 150,
            nvols: 80,
            spot_max_factor: 8.0,
            spot_density_factor: 0.2,
            variance_max: 1.0,
            variance_power: 2.0,
            spot_wind: WindPolicy::Centered,
            variance_wind: WindPolicy::Centered,
            force_exact: true,
            second_order_variance_floor: false,
        }
    }
}

impl HestonGridConfig {
    /// Set the number of spot and variance knots.
    pub fn with_size(mut self, nspots: Size, nvols: Size) -> Self {
        self.nspots = nspots;
        self.nvols = nvols;
        self
    }

    /// Set the spot axis extent and concentration, both relative to the
    /// strike.
    pub fn with_spot_axis(mut self, max_factor: Real, density_factor: Real) -> Self {
        self.spot_max_factor = max_factor;
        self.spot_density_factor = density_factor;
        self
    }

    /// Set the variance axis extent and exponent.
    pub fn with_variance_axis(mut self, max: Real, power: Real) -> Self {
        self.variance_max = max;
        self.variance_power = power;
        self
    }

    /// Set the spot first-derivative stencil policy.
    pub fn with_spot_wind(mut self, policy: WindPolicy) -> Self {
        self.spot_wind = policy;
        self
    }

    /// Set the variance first-derivative stencil policy.
    pub fn with_variance_wind(mut self, policy: WindPolicy) -> Self {
        self.variance_wind = policy;
        self
    }

    /// Toggle snapping knots onto the contract's coordinates.
    pub fn with_force_exact(mut self, force_exact: bool) -> Self {
        self.force_exact = force_exact;
        self
    }

    /// Choose the order of `∂v` on the `v = 0` row.
    pub fn with_second_order_variance_floor(mut self, second_order: bool) -> Self {
        self.second_order_variance_floor = second_order;
        self
    }
}
