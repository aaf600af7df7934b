//! # fd-math
//!
//! Mathematical utilities: bounded 1-D minimisation, numerical integration,
//! the normal distribution (via statrs), and floating-point comparison.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// Bounded 1D minimisers.
pub mod minimizers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::{close, close_enough};
pub use distributions::{normal_cdf, normal_pdf};
pub use integrals::{Integrator, SimpsonIntegral};
pub use minimizers1d::{brent_minimize, golden_section, Minimum};
