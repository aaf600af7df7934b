//! Semi-analytical Heston prices from the characteristic function.
//!
//! The call price is `C = S e^{-qT} P₁ - K e^{-rT} P₂` with
//!
//! $$P_j = \frac{1}{2} + \frac{1}{\pi} \int_0^\infty
//! \frac{\mathrm{Im}\left[f_j(\phi)\, e^{i\phi x}\right]}{\phi}\, d\phi,
//! \qquad x = \ln S + (r - q)T - \ln K.$$
//!
//! `f_j` uses the "little trap" form (`g = (c - d)/(c + d)`, `e^{-dT}`),
//! which stays on the principal branch of the logarithm for long tenors.
//! Puts follow from parity.

use std::f64::consts::PI;

use fd_core::{errors::Result, fail, Real};
use fd_math::integrals::{Integrator, SimpsonIntegral};
use num_complex::Complex64;
use tracing::debug;

use crate::option::OptionType;

const LOWER_LIMIT: Real = 1e-8;
const UPPER_LIMIT: Real = 500.0;

/// Model parameters shared by both probabilities.
#[derive(Debug, Clone, Copy)]
struct HestonParams {
    t: Real,
    v0: Real,
    kappa: Real,
    theta: Real,
    sigma: Real,
    rho: Real,
}

/// `f_j(φ)` for `j ∈ {1, 2}`.
fn characteristic(phi: Real, p: &HestonParams, j: usize) -> Complex64 {
    let (u, b) = if j == 1 {
        (0.5, p.kappa - p.rho * p.sigma)
    } else {
        (-0.5, p.kappa)
    };
    let i = Complex64::i();
    let sigma2 = p.sigma * p.sigma;

    let c = b - i * (p.rho * p.sigma * phi);
    let mut d = (c * c - sigma2 * (2.0 * u * i * phi - phi * phi)).sqrt();
    if d.re < 0.0 {
        d = -d;
    }
    let g = (c - d) / (c + d);
    let e = (-d * p.t).exp();

    let big_d = (c - d) / sigma2 * (1.0 - e) / (1.0 - g * e);
    let big_c = p.kappa * p.theta / sigma2
        * ((c - d) * p.t - 2.0 * ((1.0 - g * e) / (1.0 - g)).ln());
    (big_c + big_d * p.v0).exp()
}

fn probability(j: usize, x: Real, p: &HestonParams) -> Result<Real> {
    let integrand = |phi: Real| -> Real {
        let rotation = Complex64::new(0.0, phi * x).exp();
        (characteristic(phi, p, j) * rotation).im / phi
    };
    let integral =
        SimpsonIntegral::new(1e-10, 1_000_000).integrate(integrand, LOWER_LIMIT, UPPER_LIMIT)?;
    Ok(0.5 + integral / PI)
}

/// Price a European option under the Heston model.
#[allow(clippy::too_many_arguments)]
pub fn heston_price(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    time_to_expiry: Real,
    v0: Real,
    kappa: Real,
    theta: Real,
    sigma: Real,
    rho: Real,
) -> Result<Real> {
    let (r, q, t) = (risk_free_rate, dividend_yield, time_to_expiry);
    if t <= 0.0 {
        return Ok(option_type.payoff(spot, strike));
    }
    let params = HestonParams {
        t,
        v0,
        kappa,
        theta,
        sigma,
        rho,
    };
    let x = spot.ln() + (r - q) * t - strike.ln();
    let p1 = probability(1, x, &params)?;
    let p2 = probability(2, x, &params)?;

    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();
    let call = spot * df_q * p1 - strike * df_r * p2;
    debug!(p1, p2, call, "heston reference price");
    if !call.is_finite() {
        fail!("Heston integral is not finite (P1 = {p1}, P2 = {p2})");
    }
    Ok(match option_type {
        OptionType::Call => call,
        OptionType::Put => call - spot * df_q + strike * df_r,
    })
}
