//! Plain vanilla contracts and the market parameters of each model.

use std::fmt;

use fd_core::{ensure, errors::Result, Price, Rate, Real, Time, Volatility};

use crate::analytic_european_engine::black_scholes_merton;
use crate::analytic_heston_engine::heston_price;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    /// A call option (right to buy).
    #[default]
    Call,
    /// A put option (right to sell).
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Terminal payoff `max(φ(S - K), 0)`.
    #[inline]
    pub fn payoff(self, spot: Price, strike: Price) -> Real {
        (self.sign() * (spot - strike)).max(0.0)
    }

    /// `∂V/∂S` of a deep in-the-money contract far from the strike: 1 for a
    /// call at large spot, 0 for a put.
    pub fn far_slope(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => 0.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

// ─── Black–Scholes ────────────────────────────────────────────────────────────

/// A European option under constant-volatility Black–Scholes dynamics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlackScholesOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Spot price today.
    pub spot: Price,
    /// Strike.
    pub strike: Price,
    /// Continuously compounded risk-free rate.
    pub interest_rate: Rate,
    /// Continuous dividend yield.
    pub dividend_yield: Rate,
    /// Variance `σ²`.
    pub variance: Real,
    /// Time to expiry in years.
    pub tenor: Time,
}

impl BlackScholesOption {
    /// A call with no dividend yield.
    pub fn call(spot: Price, strike: Price, interest_rate: Rate, variance: Real, tenor: Time) -> Self {
        Self {
            option_type: OptionType::Call,
            spot,
            strike,
            interest_rate,
            dividend_yield: 0.0,
            variance,
            tenor,
        }
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.spot > 0.0, "spot must be positive");
        ensure!(self.strike > 0.0, "strike must be positive");
        ensure!(self.variance > 0.0, "variance must be positive");
        ensure!(self.tenor > 0.0, "tenor must be positive, got {}", self.tenor);
        Ok(())
    }

    /// `σ = √variance`.
    pub fn volatility(&self) -> Volatility {
        self.variance.sqrt()
    }

    /// Terminal payoff at spot `s`.
    pub fn payoff(&self, s: Price) -> Real {
        self.option_type.payoff(s, self.strike)
    }

    /// Closed-form price.
    pub fn analytical(&self) -> Real {
        black_scholes_merton(
            self.option_type,
            self.spot,
            self.strike,
            self.interest_rate,
            self.dividend_yield,
            self.volatility(),
            self.tenor,
        )
        .npv
    }
}

// ─── Heston ───────────────────────────────────────────────────────────────────

/// A European option under Heston stochastic-variance dynamics:
///
/// ```text
/// dS = (r - q) S dt + √v S dW₁
/// dv = κ(θ - v) dt + σ √v dW₂,     dW₁ dW₂ = ρ dt
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Spot price today.
    pub spot: Price,
    /// Strike.
    pub strike: Price,
    /// Continuously compounded risk-free rate.
    pub interest_rate: Rate,
    /// Continuous dividend yield.
    pub dividend_yield: Rate,
    /// Initial variance `v₀`.
    pub variance: Real,
    /// Time to expiry in years.
    pub tenor: Time,
    /// Mean-reversion speed `κ`.
    pub mean_reversion: Real,
    /// Long-run variance `θ`.
    pub mean_variance: Real,
    /// Volatility of variance `σ`.
    pub vol_of_variance: Real,
    /// Spot/variance correlation `ρ`.
    pub correlation: Real,
}

impl Default for HestonOption {
    fn default() -> Self {
        Self {
            option_type: OptionType::Call,
            spot: 100.0,
            strike: 100.0,
            interest_rate: 0.03,
            dividend_yield: 0.0,
            variance: 0.04,
            tenor: 1.0,
            mean_reversion: 1.0,
            mean_variance: 0.12,
            vol_of_variance: 0.3,
            correlation: 0.4,
        }
    }
}

impl HestonOption {
    /// Set the initial variance from a volatility.
    pub fn with_volatility(mut self, volatility: Volatility) -> Self {
        self.variance = volatility * volatility;
        self
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.spot > 0.0, "spot must be positive");
        ensure!(self.strike > 0.0, "strike must be positive");
        ensure!(self.variance > 0.0, "initial variance must be positive");
        ensure!(self.tenor > 0.0, "tenor must be positive");
        ensure!(self.mean_reversion >= 0.0, "mean reversion must be non-negative");
        ensure!(self.mean_variance >= 0.0, "mean variance must be non-negative");
        ensure!(self.vol_of_variance > 0.0, "vol of variance must be positive");
        ensure!(
            (-1.0..=1.0).contains(&self.correlation),
            "correlation must lie in [-1, 1], got {}",
            self.correlation
        );
        Ok(())
    }

    /// Terminal payoff at spot `s` (independent of variance).
    pub fn payoff(&self, s: Price) -> Real {
        self.option_type.payoff(s, self.strike)
    }

    /// Semi-analytical price from the characteristic function.
    pub fn analytical(&self) -> Result<Real> {
        heston_price(
            self.option_type,
            self.spot,
            self.strike,
            self.interest_rate,
            self.dividend_yield,
            self.tenor,
            self.variance,
            self.mean_reversion,
            self.mean_variance,
            self.vol_of_variance,
            self.correlation,
        )
    }
}
