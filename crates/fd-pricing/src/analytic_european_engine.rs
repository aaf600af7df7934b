//! Closed-form Black–Scholes–Merton prices and Greeks.
//!
//! Used as the reference the Black–Scholes finite-difference engine is
//! checked against.

use fd_core::Real;
use fd_math::distributions::{normal_cdf, normal_pdf};

use crate::option::OptionType;

/// Closed-form price and sensitivities of a European option.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlackScholesResults {
    /// Present value.
    pub npv: Real,
    /// `∂V/∂S`.
    pub delta: Real,
    /// `∂²V/∂S²`.
    pub gamma: Real,
    /// `∂V/∂σ`, per unit of volatility.
    pub vega: Real,
    /// `∂V/∂t`, per year.
    pub theta: Real,
    /// `∂V/∂r`, per unit of rate.
    pub rho: Real,
}

/// Black–Scholes–Merton price and Greeks:
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
///
/// where $d_{1,2} = \frac{\ln(S/K) + (r - q \pm \sigma^2/2)T}{\sigma\sqrt{T}}$.
pub fn black_scholes_merton(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    volatility: Real,
    time_to_expiry: Real,
) -> BlackScholesResults {
    let phi = option_type.sign();
    let t = time_to_expiry;

    if t <= 0.0 {
        return BlackScholesResults {
            npv: option_type.payoff(spot, strike),
            ..Default::default()
        };
    }

    let r = risk_free_rate;
    let q = dividend_yield;
    let sigma = volatility;
    let sqrt_t = t.sqrt();
    let std_dev = sigma * sqrt_t;
    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();
    let fwd = spot * ((r - q) * t).exp();

    let (d1, d2) = if std_dev > 1e-15 {
        let d1 = ((spot / strike).ln() + (r - q + 0.5 * sigma * sigma) * t) / std_dev;
        (d1, d1 - std_dev)
    } else {
        let big = if fwd > strike { 1e15 } else { -1e15 };
        (big, big)
    };

    let nd1 = normal_cdf(phi * d1);
    let nd2 = normal_cdf(phi * d2);
    let npd1 = normal_pdf(d1);

    let npv = phi * (spot * df_q * nd1 - strike * df_r * nd2);
    let delta = phi * df_q * nd1;
    let gamma = if std_dev > 1e-15 {
        df_q * npd1 / (spot * std_dev)
    } else {
        0.0
    };
    let vega = spot * df_q * npd1 * sqrt_t;
    let theta = -(spot * df_q * npd1 * sigma) / (2.0 * sqrt_t) - phi * r * strike * df_r * nd2
        + phi * q * spot * df_q * nd1;
    let rho = phi * strike * t * df_r * nd2;

    BlackScholesResults {
        npv,
        delta,
        gamma,
        vega,
        theta,
        rho,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn known_call_value() {
        // Hull, 10th ed. example 15.6: 4.76
        let res = black_scholes_merton(OptionType::Call, 42.0, 40.0, 0.1, 0.0, 0.2, 0.5);
        assert_abs_diff_eq!(res.npv, 4.759, epsilon = 1e-3);
        assert!(res.delta > 0.0 && res.delta < 1.0);
    }

    #[test]
    fn put_call_parity() {
        let (s, k, r, q, v, t) = (100.0, 99.0, 0.06, 0.01, 0.2, 1.0);
        let c = black_scholes_merton(OptionType::Call, s, k, r, q, v, t).npv;
        let p = black_scholes_merton(OptionType::Put, s, k, r, q, v, t).npv;
        assert_abs_diff_eq!(
            c - p,
            s * (-q * t).exp() - k * (-r * t).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn expired_is_intrinsic() {
        let res = black_scholes_merton(OptionType::Put, 90.0, 100.0, 0.05, 0.0, 0.2, 0.0);
        assert_eq!(res.npv, 10.0);
        assert_eq!(res.gamma, 0.0);
    }
}
