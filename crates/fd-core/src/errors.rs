//! Error types for adi-fd.
//!
//! A single `thiserror`-derived enum covers every failure the engine can
//! report: infeasible grid parameters, conflicting differencing switches,
//! singular banded systems and diverging time steps. The `ensure!` and
//! `fail!` macros give terse precondition checks.

use thiserror::Error;

/// The top-level error type used throughout adi-fd.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A grid axis could not be built from the given parameters.
    #[error("cannot construct axis {params}: {reason}")]
    Construction {
        /// The offending constructor parameters, formatted for diagnosis.
        params: String,
        /// What went wrong.
        reason: String,
    },

    /// Conflicting or out-of-range upwind/downwind switches.
    #[error("invalid differencing configuration: {0}")]
    Configuration(String),

    /// A banded solve hit a zero (or numerically zero) pivot.
    #[error("singular operator: pivot {pivot:e} at row {row}")]
    SingularOperator {
        /// Row of the failing pivot.
        row: usize,
        /// The pivot value.
        pivot: f64,
    },

    /// A time step failed; the remaining steps of the run were abandoned.
    #[error("{scheme} step {step} failed: {reason}")]
    Solver {
        /// Name of the time-stepping scheme.
        scheme: String,
        /// Zero-based index of the failing step.
        step: usize,
        /// What went wrong.
        reason: String,
    },

    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Wrap `self` as the cause of a failed time step.
    pub fn at_step(self, scheme: &str, step: usize) -> Self {
        match self {
            already @ Error::Solver { .. } => already,
            other => Error::Solver {
                scheme: scheme.to_string(),
                step,
                reason: other.to_string(),
            },
        }
    }
}

/// Shorthand `Result` type used throughout adi-fd.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use fd_core::{ensure, errors::Error};
/// fn positive(x: f64) -> fd_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use fd_core::{fail, errors::Error};
/// fn always_err() -> fd_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
