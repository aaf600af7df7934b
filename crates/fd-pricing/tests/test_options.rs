//! End-to-end pricing checks against closed-form and semi-analytical prices.
//!
//! These integration tests exercise the `BlackScholesFiniteDifferenceEngine`,
//! `HestonFiniteDifferenceEngine` and `Barrier` types.

use approx::assert_relative_eq;
use fd_methods::{Douglas, HundsdorferVerwer, Implicit};
use fd_pricing::{
    Barrier, BlackScholesFiniteDifferenceEngine, BlackScholesGridConfig, BlackScholesOption,
    HestonFiniteDifferenceEngine, HestonGridConfig, HestonOption,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route engine logs to the test output; `RUST_LOG=fd_methods=debug` shows
/// grid construction and per-run timings.
fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

// ───────────────────────── Barrier knock-out ─────────────────────────

const SAMPLES: [f64; 10] = [4.5, 0.2, 5.5, 0.0, 3.0, 5.3, 0.001, 24.0, 1.3, 2.5];

fn knocked(barrier: Barrier, samples: &[f64], alive: &mut [bool]) {
    barrier.knock_out(samples, alive).unwrap();
}

fn mask(bits: [u8; 10]) -> [bool; 10] {
    bits.map(|b| b == 1)
}

#[test]
fn knockout_impossible() {
    let mut alive = [true; 10];
    knocked(Barrier::up_and_out(f64::INFINITY), &SAMPLES, &mut alive);
    assert_eq!(alive, [true; 10]);
}

#[test]
fn knockout_inevitable() {
    let mut alive = [true; 10];
    knocked(Barrier::up_and_out(0.0), &SAMPLES, &mut alive);
    assert_eq!(alive, [false; 10]);
}

#[test]
fn knockout_partial() {
    let mut alive = [true; 10];
    knocked(Barrier::up_and_out(3.0), &SAMPLES, &mut alive);
    assert_eq!(alive, mask([0, 1, 0, 1, 0, 0, 1, 0, 1, 1]));
}

#[test]
fn knockout_permanent() {
    let barrier = Barrier::up_and_out(3.0);
    let mut alive = [true; 10];
    knocked(barrier, &SAMPLES, &mut alive);
    knocked(barrier, &[0.0; 10], &mut alive);
    assert_eq!(alive, mask([0, 1, 0, 1, 0, 0, 1, 0, 1, 1]));
}

#[test]
fn knockout_double() {
    let mut alive = [true; 10];
    knocked(
        Barrier::up_and_out(3.0).with_bottom(1.0),
        &SAMPLES,
        &mut alive,
    );
    assert_eq!(alive, mask([0, 0, 0, 0, 0, 0, 0, 0, 1, 1]));
}

// ───────────────────────── Black–Scholes ─────────────────────────

const BS_DT: f64 = 1.0 / 150.0;

fn black_scholes() -> BlackScholesFiniteDifferenceEngine {
    init_logging();
    let option = BlackScholesOption::call(100.0, 99.0, 0.06, 0.04, 1.0);
    BlackScholesFiniteDifferenceEngine::new(option, BlackScholesGridConfig::default()).unwrap()
}

#[test]
fn black_scholes_implicit() {
    let mut engine = black_scholes();
    assert!(engine.operator().is_tridiagonal());
    let values = engine.run(&Implicit::default(), BS_DT).unwrap();
    let price = engine.price(&values).unwrap();
    assert_relative_eq!(price, engine.analytical(), max_relative = 1e-3);
    assert_eq!(engine.grid().domain(), values.as_slice());
}

#[test]
fn black_scholes_douglas() {
    let mut engine = black_scholes();
    let values = engine.run(&Douglas::default(), BS_DT).unwrap();
    let price = engine.price(&values).unwrap();
    assert_relative_eq!(price, engine.analytical(), max_relative = 1e-3);
}

#[test]
fn black_scholes_smooth() {
    let mut engine = black_scholes();
    assert!(engine
        .engine()
        .axis_operators()
        .iter()
        .all(|op| op.is_tridiagonal()));
    let values = engine.run_smooth(&Douglas::default(), BS_DT, 2).unwrap();
    let price = engine.price(&values).unwrap();
    assert_relative_eq!(price, engine.analytical(), max_relative = 1e-3);
}

#[test]
fn black_scholes_hundsdorfer_verwer() {
    let mut engine = black_scholes();
    let values = engine.run(&HundsdorferVerwer::default(), BS_DT).unwrap();
    let price = engine.price(&values).unwrap();
    assert_relative_eq!(price, engine.analytical(), max_relative = 1e-3);
}

#[test]
fn black_scholes_put() {
    let option = BlackScholesOption {
        option_type: fd_pricing::OptionType::Put,
        ..BlackScholesOption::call(100.0, 99.0, 0.06, 0.04, 1.0)
    };
    let mut engine =
        BlackScholesFiniteDifferenceEngine::new(option, BlackScholesGridConfig::default()).unwrap();
    let price = engine.price_implicit(BS_DT).unwrap();
    assert_relative_eq!(price, engine.analytical(), max_relative = 5e-3);
}

// ───────────────────────── Heston ─────────────────────────

const HESTON_DT: f64 = 1.0 / 150.0;

fn heston_option() -> HestonOption {
    HestonOption {
        spot: 100.0,
        strike: 100.0,
        interest_rate: 0.03,
        tenor: 1.0,
        mean_reversion: 1.0,
        mean_variance: 0.12,
        vol_of_variance: 0.3,
        correlation: 0.4,
        ..HestonOption::default()
    }
    .with_volatility(0.2)
}

fn heston() -> HestonFiniteDifferenceEngine {
    init_logging();
    HestonFiniteDifferenceEngine::new(heston_option(), HestonGridConfig::default()).unwrap()
}

#[test]
fn heston_douglas() {
    let mut engine = heston();
    assert!(engine
        .engine()
        .axis_operators()
        .iter()
        .all(|op| op.is_tridiagonal()));
    let values = engine.run(&Douglas::default(), HESTON_DT).unwrap();
    let price = engine.price(&values).unwrap();
    let reference = engine.analytical().unwrap();
    assert_relative_eq!(price, reference, max_relative = 1e-3);
}

#[test]
fn heston_hundsdorfer_verwer() {
    let mut engine = heston().diagonalize();
    let values = engine
        .run(&HundsdorferVerwer::default(), HESTON_DT)
        .unwrap();
    let price = engine.price(&values).unwrap();
    let reference = engine.analytical().unwrap();
    assert_relative_eq!(price, reference, max_relative = 1e-3);
}

#[test]
fn heston_smooth() {
    let mut engine = heston().diagonalize();
    let values = engine
        .run_smooth(&Douglas::default(), HESTON_DT, 2)
        .unwrap();
    let price = engine.price(&values).unwrap();
    let reference = engine.analytical().unwrap();
    assert_relative_eq!(price, reference, max_relative = 1e-3);
}

#[test]
fn heston_implicit() {
    let mut engine = heston();
    let values = engine.run(&Implicit::default(), 1.0 / 600.0).unwrap();
    let price = engine.price(&values).unwrap();
    let reference = engine.analytical().unwrap();
    assert_relative_eq!(price, reference, max_relative = 1e-3);
}
