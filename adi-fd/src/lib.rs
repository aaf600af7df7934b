//! # adi-fd
//!
//! Finite-difference pricing of parabolic option PDEs on non-uniform grids,
//! advanced in time with the ADI family of schemes.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `fd-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! adi-fd = "0.1"
//! ```
//!
//! ```rust
//! use adi_fd::methods::Douglas;
//! use adi_fd::pricing::{
//!     BlackScholesFiniteDifferenceEngine, BlackScholesGridConfig, BlackScholesOption,
//! };
//!
//! let option = BlackScholesOption::call(100.0, 99.0, 0.06, 0.04, 1.0);
//! let mut engine =
//!     BlackScholesFiniteDifferenceEngine::new(option, BlackScholesGridConfig::default())?;
//! let values = engine.run(&Douglas::default(), 1.0 / 150.0)?;
//! let price = engine.price(&values)?;
//! assert!((price - engine.analytical()).abs() < 1e-2);
//! # Ok::<(), adi_fd::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use fd_core as core;

/// Mathematical utilities: minimisation, integration, distributions.
pub use fd_math as math;

/// Grids, banded operators, and ADI schemes.
pub use fd_methods as methods;

/// Model engines, reference prices, and barrier masking.
pub use fd_pricing as pricing;
