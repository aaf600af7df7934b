//! Time-stepping schemes for `∂u/∂τ = L(u)` with `L = Σᵢ Aᵢ + A₀`.
//!
//! `Aᵢ` are the per-axis operators and `A₀` the mixed terms. Every scheme
//! treats `A₀` explicitly except [`Implicit`], which factors the whole `L`.
//!
//! | scheme               | per step                                              |
//! |----------------------|-------------------------------------------------------|
//! | [`Implicit`]         | `(I - θΔt L) V' = V + (1-θ)Δt L V`                     |
//! | [`Douglas`]          | explicit predictor, one implicit correction per axis  |
//! | [`HundsdorferVerwer`]| Douglas, then a second sweep on `½Δt (L Y - L V)`     |
//!
//! A scheme is turned into a [`Stepper`] once per run so that matrices
//! depending only on `Δt` are built a single time.

use fd_core::{errors::Result, Real};

use super::banded_operator::{BandedLu, BandedOperator};
use super::cross::{DiagonalizedOperator, MixedOperator};
use super::engine::FiniteDifferenceEngine;

/// Advances the solution by one time step.
pub trait Stepper {
    /// `V(τ) → V(τ + Δt)`.
    fn step(&mut self, values: &[Real]) -> Result<Vec<Real>>;
}

/// A time-stepping scheme for engines whose mixed terms have type `C`.
pub trait Scheme<C> {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Precompute whatever depends on `dt` and return a stepper bound to
    /// `engine`.
    fn prepare<'a>(
        &self,
        engine: &'a FiniteDifferenceEngine<C>,
        dt: Real,
    ) -> Result<Box<dyn Stepper + 'a>>;
}

// ─── Implicit ─────────────────────────────────────────────────────────────────

/// θ-scheme on the full operator; `θ = 1` is backward Euler, `θ = ½`
/// Crank–Nicolson.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Implicit {
    /// Implicitness weight.
    pub theta: Real,
}

impl Implicit {
    /// A θ-scheme with the given weight.
    pub fn new(theta: Real) -> Self {
        Self { theta }
    }
}

impl Default for Implicit {
    fn default() -> Self {
        Self { theta: 1.0 }
    }
}

/// `I - θΔt L`, solved per line when possible and otherwise factored once.
enum LinearSolve {
    Lines(BandedOperator),
    Factored(BandedLu),
}

impl LinearSolve {
    fn new(lhs: BandedOperator) -> Result<Self> {
        Ok(match lhs.layout() {
            Some(_) => LinearSolve::Lines(lhs),
            None => LinearSolve::Factored(lhs.factorize()?),
        })
    }

    fn solve(&self, b: &[Real]) -> Result<Vec<Real>> {
        match self {
            LinearSolve::Lines(op) => op.solve(b),
            LinearSolve::Factored(lu) => lu.solve(b),
        }
    }
}

struct ImplicitStepper {
    explicit: Option<(BandedOperator, Real)>,
    lhs: LinearSolve,
}

impl Stepper for ImplicitStepper {
    fn step(&mut self, values: &[Real]) -> Result<Vec<Real>> {
        match &self.explicit {
            Some((l, weight)) => {
                let rhs: Vec<Real> = values
                    .iter()
                    .zip(l.apply(values))
                    .map(|(v, lv)| v + weight * lv)
                    .collect();
                self.lhs.solve(&rhs)
            }
            None => self.lhs.solve(values),
        }
    }
}

impl<C: MixedOperator> Scheme<C> for Implicit {
    fn name(&self) -> &'static str {
        "Implicit"
    }

    fn prepare<'a>(
        &self,
        engine: &'a FiniteDifferenceEngine<C>,
        dt: Real,
    ) -> Result<Box<dyn Stepper + 'a>> {
        let total = engine.total_operator()?;
        let lhs = LinearSolve::new(total.as_identity_plus_scale(dt, -self.theta))?;
        let explicit = (self.theta < 1.0).then(|| (total, (1.0 - self.theta) * dt));
        Ok(Box::new(ImplicitStepper { explicit, lhs }))
    }
}

// ─── Douglas ──────────────────────────────────────────────────────────────────

/// Douglas ADI:
///
/// ```text
/// Y₀ = V + Δt L(V)
/// Yᵢ = Yᵢ₋₁ + θΔt (Aᵢ Yᵢ - Aᵢ V)      i = 1..d
/// V' = Y_d
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Douglas {
    /// Implicitness weight of the per-axis corrections.
    pub theta: Real,
}

impl Douglas {
    /// A Douglas scheme with the given weight.
    pub fn new(theta: Real) -> Self {
        Self { theta }
    }
}

impl Default for Douglas {
    fn default() -> Self {
        Self { theta: 0.5 }
    }
}

/// The per-axis implicit sweeps shared by Douglas and Hundsdorfer–Verwer.
struct AxisSweeps<'a, C> {
    engine: &'a FiniteDifferenceEngine<C>,
    implicit: Vec<BandedOperator>,
    dt: Real,
    theta: Real,
}

impl<'a, C: MixedOperator> AxisSweeps<'a, C> {
    fn new(engine: &'a FiniteDifferenceEngine<C>, dt: Real, theta: Real) -> Self {
        let implicit = engine
            .axis_operators()
            .iter()
            .map(|a| a.as_identity_plus_scale(dt, -theta))
            .collect();
        Self {
            engine,
            implicit,
            dt,
            theta,
        }
    }

    /// `Y₀ = V + Δt·L(V)`.
    fn explicit(&self, values: &[Real], lv: &[Real]) -> Vec<Real> {
        values
            .iter()
            .zip(lv)
            .map(|(v, l)| v + self.dt * l)
            .collect()
    }

    /// Solve `(I - θΔt Aᵢ) Yᵢ = Yᵢ₋₁ - θΔt Aᵢ(anchor)` for every axis.
    fn sweep(&self, mut y: Vec<Real>, anchor: &[Real]) -> Result<Vec<Real>> {
        let weight = self.theta * self.dt;
        for (a, m) in self.engine.axis_operators().iter().zip(&self.implicit) {
            let rhs: Vec<Real> = y
                .iter()
                .zip(a.apply(anchor))
                .map(|(y, av)| y - weight * av)
                .collect();
            y = m.solve(&rhs)?;
        }
        Ok(y)
    }
}

struct DouglasStepper<'a, C> {
    sweeps: AxisSweeps<'a, C>,
}

impl<C: MixedOperator> Stepper for DouglasStepper<'_, C> {
    fn step(&mut self, values: &[Real]) -> Result<Vec<Real>> {
        let lv = self.sweeps.engine.apply(values);
        let y0 = self.sweeps.explicit(values, &lv);
        self.sweeps.sweep(y0, values)
    }
}

impl<C: MixedOperator> Scheme<C> for Douglas {
    fn name(&self) -> &'static str {
        "Douglas"
    }

    fn prepare<'a>(
        &self,
        engine: &'a FiniteDifferenceEngine<C>,
        dt: Real,
    ) -> Result<Box<dyn Stepper + 'a>> {
        Ok(Box::new(DouglasStepper {
            sweeps: AxisSweeps::new(engine, dt, self.theta),
        }))
    }
}

// ─── Hundsdorfer–Verwer ───────────────────────────────────────────────────────

/// Hundsdorfer–Verwer ADI: a Douglas predictor `Y` followed by
///
/// ```text
/// Z₀ = Y₀ + ½Δt (L(Y) - L(V))
/// Zᵢ = Zᵢ₋₁ + θΔt (Aᵢ Zᵢ - Aᵢ Y)      i = 1..d
/// V' = Z_d
/// ```
///
/// Second order in time with mixed terms present. Only available once the
/// engine has been diagonalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HundsdorferVerwer {
    /// Implicitness weight of both sweeps.
    pub theta: Real,
}

impl HundsdorferVerwer {
    /// A Hundsdorfer–Verwer scheme with the given weight.
    pub fn new(theta: Real) -> Self {
        Self { theta }
    }
}

impl Default for HundsdorferVerwer {
    fn default() -> Self {
        Self {
            theta: 0.5 + 3.0_f64.sqrt() / 6.0,
        }
    }
}

struct HundsdorferVerwerStepper<'a> {
    sweeps: AxisSweeps<'a, DiagonalizedOperator>,
}

impl Stepper for HundsdorferVerwerStepper<'_> {
    fn step(&mut self, values: &[Real]) -> Result<Vec<Real>> {
        let s = &self.sweeps;
        let lv = s.engine.apply(values);
        let y0 = s.explicit(values, &lv);
        let y = s.sweep(y0.clone(), values)?;
        let ly = s.engine.apply(&y);
        let half = 0.5 * s.dt;
        let z0: Vec<Real> = y0
            .iter()
            .zip(ly.iter().zip(&lv))
            .map(|(y0, (ly, lv))| y0 + half * (ly - lv))
            .collect();
        s.sweep(z0, &y)
    }
}

impl Scheme<DiagonalizedOperator> for HundsdorferVerwer {
    fn name(&self) -> &'static str {
        "HundsdorferVerwer"
    }

    fn prepare<'a>(
        &self,
        engine: &'a FiniteDifferenceEngine<DiagonalizedOperator>,
        dt: Real,
    ) -> Result<Box<dyn Stepper + 'a>> {
        Ok(Box::new(HundsdorferVerwerStepper {
            sweeps: AxisSweeps::new(engine, dt, self.theta),
        }))
    }
}
