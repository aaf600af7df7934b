//! # fd-pricing
//!
//! Model engines built on `fd-methods`, with the reference prices they are
//! validated against.
//!
//! ## Engines
//!
//! - [`BlackScholesFiniteDifferenceEngine`] — 1-D Black–Scholes on a log-spot axis
//! - [`HestonFiniteDifferenceEngine`] — 2-D Heston on spot × variance with a mixed term
//! - [`black_scholes_merton`] — closed-form Black–Scholes–Merton price and Greeks
//! - [`heston_price`] — semi-analytical Heston price (characteristic function)
//!
//! [`Barrier`] masks simulated paths that touch a knock-out level.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod analytic_heston_engine;
pub mod barrier;
pub mod black_scholes;
pub mod config;
pub mod heston;
pub mod option;

pub use analytic_european_engine::{black_scholes_merton, BlackScholesResults};
pub use analytic_heston_engine::heston_price;
pub use barrier::Barrier;
pub use black_scholes::BlackScholesFiniteDifferenceEngine;
pub use config::{BlackScholesGridConfig, HestonGridConfig};
pub use heston::HestonFiniteDifferenceEngine;
pub use option::{BlackScholesOption, HestonOption, OptionType};
