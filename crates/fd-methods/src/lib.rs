//! # fd-methods
//!
//! Numerical methods for parabolic pricing PDEs: non-uniform grid
//! construction, banded finite-difference operators with upwind/downwind
//! switching, and the ADI family of time-stepping schemes.
//!
//! # Modules
//!
//! * [`finite_differences`] — axes and grids, coefficient generation, banded
//!   operators, the engine, and its schemes

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: grids, banded operators, ADI schemes.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    coefficients::{DerivativeCoefficients, Stencil, WindPolicy},
    cross::{CoupledOperator, DiagonalizedOperator, MixedOperator},
    engine::{steps_for, Dimension, FiniteDifferenceEngine, OperatorRef},
    grid::{cubic_sigmoid_axis, exponential_axis, sinh_axis, uniform_axis, Grid},
    schemes::{Douglas, HundsdorferVerwer, Implicit, Scheme, Stepper},
    BandedLu, BandedOperator, Combine, Diagonals, Layout,
};
