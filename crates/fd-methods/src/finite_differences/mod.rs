//! Finite difference methods for multi-dimensional parabolic PDEs.
//!
//! The building blocks are layered bottom-up:
//!
//! - [`grid`] builds one-dimensional axes (uniform, sinh-concentrated,
//!   exponential, cubic sigmoid) and the tensor-product [`Grid`](grid::Grid)
//!   holding the initial condition and the live solution.
//! - [`coefficients`] produces centered, forward and backward
//!   first/second-derivative weights on a non-uniform axis and stitches them
//!   together around an upwind or downwind switch point.
//! - [`BandedOperator`] stores a linear operator `A·x + R` as a handful of
//!   diagonals over the flattened grid and solves `A·x = b - R` by
//!   per-line Thomas/pentadiagonal elimination or a banded LU.
//! - [`cross`] holds the mixed-derivative operator in its coupled and
//!   diagonalized (factored) forms.
//! - [`engine`] owns the grid plus one operator per dimension, and
//!   [`schemes`] advances it in time.
//!
//! Grids are stored row-major: the last axis is contiguous in memory.

/// Banded linear operators over flattened grids.
pub mod banded_operator;
/// Derivative weights on non-uniform axes.
pub mod coefficients;
/// Mixed-derivative operators.
pub mod cross;
/// Row-aligned diagonal storage.
pub mod diagonals;
/// The time-stepping engine.
pub mod engine;
/// Axes and tensor-product grids.
pub mod grid;
/// Implicit, Douglas and Hundsdorfer–Verwer schemes.
pub mod schemes;

pub use banded_operator::{BandedLu, BandedOperator, Combine, Layout};
pub use diagonals::Diagonals;
