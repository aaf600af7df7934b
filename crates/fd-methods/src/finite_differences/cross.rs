//! Mixed-derivative operators `w(x)·∂²/∂xᵢ∂xⱼ`.
//!
//! A mixed term is built from two first-derivative operators lifted onto
//! their axes and a per-point weight. [`CoupledOperator`] multiplies them out
//! into a single nine-point banded operator; [`DiagonalizedOperator`] keeps
//! the factors and evaluates `w ⊙ Dᵢ(Dⱼ x)` as two sweeps of per-line
//! tridiagonal products. Both give the same result; the factored form is the
//! one the Hundsdorfer–Verwer scheme requires.

use fd_core::{errors::Result, Real};

use super::banded_operator::BandedOperator;

/// Explicit evaluation of a mixed-derivative term.
pub trait MixedOperator: Clone + Send + Sync {
    /// Number of grid points.
    fn size(&self) -> usize;

    /// Evaluate the operator on `values`.
    fn apply(&self, values: &[Real]) -> Vec<Real>;

    /// The operator as a single banded matrix.
    fn to_banded(&self) -> Result<BandedOperator>;
}

/// The factors of a mixed term: `weights ⊙ outer(inner(x))`.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossFactors {
    /// Derivative applied last, lifted onto its axis.
    pub outer: BandedOperator,
    /// Derivative applied first, lifted onto its axis.
    pub inner: BandedOperator,
    /// Per-point weight.
    pub weights: Vec<Real>,
}

impl CrossFactors {
    fn product(&self) -> Result<BandedOperator> {
        self.outer.compose(&self.inner)?.scale_rows(&self.weights)
    }
}

/// A mixed term in coupled nine-point banded form.
#[derive(Debug, Clone, PartialEq)]
pub struct CoupledOperator {
    banded: BandedOperator,
    factors: CrossFactors,
}

impl CoupledOperator {
    /// `weights ⊙ outer(inner(x))`, with `outer` and `inner` already lifted
    /// onto the full grid.
    pub fn new(outer: BandedOperator, inner: BandedOperator, weights: Vec<Real>) -> Result<Self> {
        let factors = CrossFactors {
            outer,
            inner,
            weights,
        };
        let banded = factors.product()?;
        Ok(Self { banded, factors })
    }

    /// The coupled banded form.
    pub fn banded(&self) -> &BandedOperator {
        &self.banded
    }

    /// The factors the operator was built from.
    pub fn factors(&self) -> &CrossFactors {
        &self.factors
    }

    /// Switch to the factored representation.
    pub fn diagonalize(self) -> DiagonalizedOperator {
        DiagonalizedOperator {
            factors: self.factors,
        }
    }
}

impl MixedOperator for CoupledOperator {
    fn size(&self) -> usize {
        self.banded.size()
    }

    fn apply(&self, values: &[Real]) -> Vec<Real> {
        self.banded.apply(values)
    }

    fn to_banded(&self) -> Result<BandedOperator> {
        Ok(self.banded.clone())
    }
}

/// A mixed term kept as a product of per-axis factors.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalizedOperator {
    factors: CrossFactors,
}

impl DiagonalizedOperator {
    /// The factors.
    pub fn factors(&self) -> &CrossFactors {
        &self.factors
    }

    /// Already factored; returns `self` unchanged.
    pub fn diagonalize(self) -> Self {
        self
    }
}

impl MixedOperator for DiagonalizedOperator {
    fn size(&self) -> usize {
        self.factors.weights.len()
    }

    fn apply(&self, values: &[Real]) -> Vec<Real> {
        let inner = self.factors.inner.apply(values);
        let mut out = self.factors.outer.apply(&inner);
        for (o, w) in out.iter_mut().zip(&self.factors.weights) {
            *o *= w;
        }
        out
    }

    fn to_banded(&self) -> Result<BandedOperator> {
        self.factors.product()
    }
}
