//! Banded linear operators `A·x + R` over a flattened grid.
//!
//! An operator acting along a single axis couples only points on the same
//! grid line. Its [`Layout`] records how those lines sit in the flattened
//! vector, which lets [`BandedOperator::solve`] run one small tridiagonal or
//! pentadiagonal elimination per line (in parallel) instead of factoring the
//! whole matrix. Operators without a layout (sums across axes, products) fall
//! back to a banded LU without pivoting.

use fd_core::{
    errors::{Error, Result},
    Real,
};
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use super::coefficients::Stencil;
use super::diagonals::Diagonals;

/// Pivots smaller than this fraction of the largest entry count as zero.
const PIVOT_TOLERANCE: Real = 1e-13;

// ─── Layout ───────────────────────────────────────────────────────────────────

/// Position of the grid lines an axis operator acts on.
///
/// Line `(o, s)` for `o < outer`, `s < stride` holds the flattened indices
/// `o·len·stride + s + k·stride` for `k < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Number of outer repetitions.
    pub outer: usize,
    /// Points per line.
    pub len: usize,
    /// Distance between neighbouring points of a line.
    pub stride: usize,
}

impl Layout {
    /// A single contiguous line of `len` points.
    pub fn line(len: usize) -> Self {
        Self {
            outer: 1,
            len,
            stride: 1,
        }
    }

    /// Total number of points covered.
    #[inline]
    pub fn size(&self) -> usize {
        self.outer * self.len * self.stride
    }

    /// Number of lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.outer * self.stride
    }

    /// Flattened index of the first point of line `line`.
    #[inline]
    pub fn line_start(&self, line: usize) -> usize {
        let (o, s) = (line / self.stride, line % self.stride);
        o * self.len * self.stride + s
    }
}

/// How [`BandedOperator::combine`] merges two operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// `A + B`
    Add,
    /// `A - B`
    Subtract,
}

// ─── Operator ─────────────────────────────────────────────────────────────────

/// A linear operator `x ↦ D·x + R` with `D` stored as diagonals.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedOperator {
    diagonals: Diagonals,
    residual: Vec<Real>,
    layout: Option<Layout>,
    blocks: usize,
    stencils: Vec<Stencil>,
}

impl BandedOperator {
    /// An operator along a single contiguous line, with zero residual.
    pub fn new(diagonals: Diagonals) -> Self {
        let n = diagonals.size();
        Self {
            diagonals,
            residual: vec![0.0; n],
            layout: Some(Layout::line(n)),
            blocks: 1,
            stencils: Vec::new(),
        }
    }

    /// An operator with no line structure; solves go through a banded LU.
    pub fn general(diagonals: Diagonals, residual: Vec<Real>) -> Result<Self> {
        let n = diagonals.size();
        check_len("residual", residual.len(), n)?;
        Ok(Self {
            diagonals,
            residual,
            layout: None,
            blocks: 1,
            stencils: Vec::new(),
        })
    }

    /// The identity on `n` points.
    pub fn identity(n: usize) -> Self {
        let mut d = Diagonals::zeros(n, &[0]);
        for row in 0..n {
            d.set(row, 0, 1.0);
        }
        Self::new(d)
    }

    /// Replace the residual.
    pub fn with_residual(mut self, residual: Vec<Real>) -> Result<Self> {
        check_len("residual", residual.len(), self.size())?;
        self.residual = residual;
        Ok(self)
    }

    /// Record the stencil used on each point of the line.
    pub fn with_stencils(mut self, stencils: Vec<Stencil>) -> Self {
        self.stencils = stencils;
        self
    }

    // ── Accessors ──

    /// Number of points the operator acts on.
    #[inline]
    pub fn size(&self) -> usize {
        self.diagonals.size()
    }

    /// Stored offsets in the flattened vector, ascending.
    pub fn offsets(&self) -> &[isize] {
        self.diagonals.offsets()
    }

    /// Offsets along the operator's axis: flattened offsets divided by the
    /// line stride.
    pub fn logical_offsets(&self) -> Vec<isize> {
        let stride = self.layout.map_or(1, |l| l.stride) as isize;
        self.offsets().iter().map(|o| o / stride).collect()
    }

    /// The diagonals.
    pub fn diagonals(&self) -> &Diagonals {
        &self.diagonals
    }

    /// The residual `R`.
    pub fn residual(&self) -> &[Real] {
        &self.residual
    }

    /// Mutable access to the residual.
    pub fn residual_mut(&mut self) -> &mut [Real] {
        &mut self.residual
    }

    /// Line layout, if the operator only couples points on the same line.
    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    /// Number of identical blocks the operator was tiled into.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Stencil used at each point along the axis; empty when unknown.
    pub fn stencils(&self) -> &[Stencil] {
        &self.stencils
    }

    /// Whether the offsets are exactly `{-1, 0, 1}`: along the line for
    /// line-structured operators, in the flattened vector otherwise.
    pub fn is_tridiagonal(&self) -> bool {
        self.logical_offsets() == [-1, 0, 1]
    }

    /// Overwrite row `row` with `(offset, value)` entries.
    pub fn set_row(&mut self, row: usize, entries: &[(isize, Real)]) {
        self.diagonals.set_row(row, entries);
    }

    // ── Application ──

    /// `D·x + R`.
    pub fn apply(&self, x: &[Real]) -> Vec<Real> {
        let mut y = self.diagonals.apply(x);
        for (y, r) in y.iter_mut().zip(&self.residual) {
            *y += r;
        }
        y
    }

    /// Dense copy of `D`.
    pub fn to_dense(&self) -> DMatrix<Real> {
        let n = self.size();
        let mut m = DMatrix::zeros(n, n);
        for (offset, d) in self.diagonals.iter() {
            let (lo, hi) = self.diagonals.row_range(offset);
            for row in lo..hi {
                m[(row, (row as isize + offset) as usize)] = d[row];
            }
        }
        m
    }

    // ── Algebra ──

    /// `factor·A` (residual included).
    pub fn scale(&self, factor: Real) -> Self {
        let mut out = self.clone();
        out.diagonals.scale(factor);
        out.residual.iter_mut().for_each(|r| *r *= factor);
        out
    }

    /// Multiply row `i` (and `R[i]`) by `weights[i]`.
    pub fn scale_rows(&self, weights: &[Real]) -> Result<Self> {
        check_len("row weights", weights.len(), self.size())?;
        let mut out = self.clone();
        out.diagonals.scale_rows(weights);
        for (r, w) in out.residual.iter_mut().zip(weights) {
            *r *= w;
        }
        Ok(out)
    }

    /// `A + value·I`.
    pub fn add_to_diagonal(&self, value: Real) -> Self {
        let mut out = self.clone();
        for row in 0..out.size() {
            out.diagonals.add(row, 0, value);
        }
        out
    }

    /// `I + θ·dt·A`, with residual `θ·dt·R`.
    pub fn as_identity_plus_scale(&self, dt: Real, theta: Real) -> Self {
        self.scale(theta * dt).add_to_diagonal(1.0)
    }

    /// `A ± B` over the union of both offset sets.
    pub fn combine(&self, other: &BandedOperator, op: Combine) -> Result<Self> {
        check_len("operand", other.size(), self.size())?;
        let sign = match op {
            Combine::Add => 1.0,
            Combine::Subtract => -1.0,
        };
        let diagonals = self.diagonals.axpy(sign, &other.diagonals);
        let residual = self
            .residual
            .iter()
            .zip(&other.residual)
            .map(|(a, b)| a + sign * b)
            .collect();
        let same_lines = self.layout == other.layout && self.blocks == other.blocks;
        Ok(Self {
            diagonals,
            residual,
            layout: if same_lines { self.layout } else { None },
            blocks: if same_lines { self.blocks } else { 1 },
            stencils: if same_lines {
                merge_stencils(&self.stencils, &other.stencils)
            } else {
                Vec::new()
            },
        })
    }

    /// The product `A·B`, so that `(A·B).apply(x) == A.apply(B.apply(x))`.
    pub fn compose(&self, other: &BandedOperator) -> Result<Self> {
        check_len("operand", other.size(), self.size())?;
        let offsets: Vec<isize> = self
            .offsets()
            .iter()
            .flat_map(|a| other.offsets().iter().map(move |b| a + b))
            .collect();
        let mut product = Diagonals::zeros(self.size(), &offsets);
        for (oa, a) in self.diagonals.iter() {
            let (lo, hi) = self.diagonals.row_range(oa);
            for row in lo..hi {
                if a[row] == 0.0 {
                    continue;
                }
                let mid = (row as isize + oa) as usize;
                for (ob, b) in other.diagonals.iter() {
                    if other.diagonals.in_range(mid, ob) && b[mid] != 0.0 {
                        product.add(row, oa + ob, a[row] * b[mid]);
                    }
                }
            }
        }
        let mut residual = self.diagonals.apply(&other.residual);
        for (r, own) in residual.iter_mut().zip(&self.residual) {
            *r += own;
        }
        let same_lines = self.layout == other.layout && self.blocks == other.blocks;
        Ok(Self {
            diagonals: product,
            residual,
            layout: if same_lines { self.layout } else { None },
            blocks: if same_lines { self.blocks } else { 1 },
            stencils: Vec::new(),
        })
    }

    // ── Lifting onto a grid ──

    /// Interleave the operator onto a strided axis: point `p` becomes points
    /// `p·stride + s` for every `s < stride`.
    pub fn spread(&self, stride: usize) -> Result<Self> {
        let layout = match self.layout {
            Some(l) if l.stride == 1 => l,
            _ => {
                return Err(Error::Precondition(
                    "only contiguous line operators can be spread".into(),
                ))
            }
        };
        if stride == 0 {
            return Err(Error::InvalidArgument("stride must be positive".into()));
        }
        let n = self.size();
        let spread_vec = |v: &[Real]| -> Vec<Real> {
            v.iter()
                .flat_map(|x| std::iter::repeat(*x).take(stride))
                .collect()
        };
        let offsets = self
            .offsets()
            .iter()
            .map(|o| o * stride as isize)
            .collect();
        let data = self.diagonals.data().iter().map(|d| spread_vec(d)).collect();
        Ok(Self {
            diagonals: Diagonals::from_parts(n * stride, offsets, data),
            residual: spread_vec(&self.residual),
            layout: Some(Layout { stride, ..layout }),
            blocks: self.blocks,
            stencils: self.stencils.clone(),
        })
    }

    /// Tile the operator `n` times along the flattened vector.
    pub fn block_repeat(&self, n: usize) -> Self {
        let tile = |v: &[Real]| -> Vec<Real> { v.repeat(n) };
        let data = self.diagonals.data().iter().map(|d| tile(d)).collect();
        Self {
            diagonals: Diagonals::from_parts(
                self.size() * n,
                self.offsets().to_vec(),
                data,
            ),
            residual: tile(&self.residual),
            layout: self.layout.map(|l| Layout {
                outer: l.outer * n,
                ..l
            }),
            blocks: self.blocks * n,
            stencils: self.stencils.clone(),
        }
    }

    /// Restrict to tile `k` of [`blocks`](Self::blocks).
    pub fn block(&self, k: usize) -> Result<Self> {
        if k >= self.blocks {
            return Err(Error::InvalidArgument(format!(
                "block {k} requested from an operator of {} blocks",
                self.blocks
            )));
        }
        let size = self.size() / self.blocks;
        let range = k * size..(k + 1) * size;
        let data = self
            .diagonals
            .data()
            .iter()
            .map(|d| d[range.clone()].to_vec())
            .collect();
        Ok(Self {
            diagonals: Diagonals::from_parts(size, self.offsets().to_vec(), data),
            residual: self.residual[range].to_vec(),
            layout: self.layout.map(|l| Layout {
                outer: l.outer / self.blocks,
                ..l
            }),
            blocks: 1,
            stencils: self.stencils.clone(),
        })
    }

    /// Lift a one-dimensional operator onto axis `axis` of a row-major grid
    /// of the given `shape`.
    pub fn for_axis(&self, shape: &[usize], axis: usize) -> Result<Self> {
        if axis >= shape.len() || shape[axis] != self.size() {
            return Err(Error::InvalidArgument(format!(
                "operator of size {} does not match axis {axis} of shape {shape:?}",
                self.size()
            )));
        }
        let stride = shape[axis + 1..].iter().product();
        let repeats = shape[..axis].iter().product();
        Ok(self.spread(stride)?.block_repeat(repeats))
    }

    // ── Solving ──

    /// Solve `D·x = b - R`, so that `apply(x) == b`.
    pub fn solve(&self, b: &[Real]) -> Result<Vec<Real>> {
        check_len("right-hand side", b.len(), self.size())?;
        let rhs: Vec<Real> = b.iter().zip(&self.residual).map(|(b, r)| b - r).collect();
        match self.line_band() {
            Some((layout, band)) => self.solve_lines(layout, band, &rhs),
            None => self.factorize()?.solve_linear(&rhs),
        }
    }

    /// Banded LU of `D`, reusable across right-hand sides.
    pub fn factorize(&self) -> Result<BandedLu> {
        let n = self.size();
        let kl = self.offsets().first().map_or(0, |o| (-o).max(0) as usize);
        let ku = self.offsets().last().map_or(0, |o| (*o).max(0) as usize);
        let mut band = Band::zeros(n, kl, ku);
        for (offset, d) in self.diagonals.iter() {
            let (lo, hi) = self.diagonals.row_range(offset);
            for row in lo..hi {
                band.set(row, (row as isize + offset) as usize, d[row]);
            }
        }
        band.factorize()
            .map_err(|(row, pivot)| Error::SingularOperator { row, pivot })?;
        debug!(n, kl, ku, "banded LU factorised");
        Ok(BandedLu {
            band,
            residual: self.residual.clone(),
        })
    }

    /// Layout and half-bandwidth when a per-line solve applies.
    fn line_band(&self) -> Option<(Layout, usize)> {
        let layout = self.layout?;
        let band = self
            .logical_offsets()
            .iter()
            .map(|o| o.unsigned_abs())
            .max()
            .unwrap_or(0);
        (band <= 2).then_some((layout, band))
    }

    fn solve_lines(&self, layout: Layout, band: usize, rhs: &[Real]) -> Result<Vec<Real>> {
        let stride = layout.stride as isize;
        let solved = (0..layout.line_count())
            .into_par_iter()
            .map(|line| {
                let start = layout.line_start(line);
                let point = |k: usize| start + k * layout.stride;
                let b: Vec<Real> = (0..layout.len).map(|k| rhs[point(k)]).collect();
                let local = if band <= 1 {
                    let lower: Vec<Real> = (0..layout.len)
                        .map(|k| self.diagonals.get(point(k), -stride))
                        .collect();
                    let diag: Vec<Real> =
                        (0..layout.len).map(|k| self.diagonals.get(point(k), 0)).collect();
                    let upper: Vec<Real> = (0..layout.len)
                        .map(|k| self.diagonals.get(point(k), stride))
                        .collect();
                    thomas(&lower, &diag, &upper, &b)
                } else {
                    let mut m = Band::zeros(layout.len, band, band);
                    for k in 0..layout.len {
                        for o in -(band as isize)..=band as isize {
                            let col = k as isize + o;
                            if col >= 0 && (col as usize) < layout.len {
                                m.set(k, col as usize, self.diagonals.get(point(k), o * stride));
                            }
                        }
                    }
                    m.factorize().map(|_| m.substitute(&b))
                };
                local.map_err(|(k, pivot)| Error::SingularOperator {
                    row: point(k),
                    pivot,
                })
            })
            .collect::<Result<Vec<Vec<Real>>>>()?;

        let mut x = vec![0.0; self.size()];
        for (line, values) in solved.into_iter().enumerate() {
            let start = layout.line_start(line);
            for (k, v) in values.into_iter().enumerate() {
                x[start + k * layout.stride] = v;
            }
        }
        Ok(x)
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::InvalidArgument(format!(
            "{what} has {got} entries, expected {expected}"
        )));
    }
    Ok(())
}

// ─── Thomas ───────────────────────────────────────────────────────────────────

/// Thomas elimination; `lower[i] = A[i, i-1]`, `upper[i] = A[i, i+1]`.
/// Fails with the local row and value of a vanishing pivot.
fn thomas(
    lower: &[Real],
    diag: &[Real],
    upper: &[Real],
    rhs: &[Real],
) -> std::result::Result<Vec<Real>, (usize, Real)> {
    let n = diag.len();
    let scale = lower
        .iter()
        .chain(diag)
        .chain(upper)
        .fold(0.0, |m: Real, v| m.max(v.abs()));
    let singular = |beta: Real| !(beta.abs() > PIVOT_TOLERANCE * scale);

    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut beta = diag[0];
    if singular(beta) {
        return Err((0, beta));
    }
    c[0] = upper[0] / beta;
    d[0] = rhs[0] / beta;
    for i in 1..n {
        beta = diag[i] - lower[i] * c[i - 1];
        if singular(beta) {
            return Err((i, beta));
        }
        c[i] = upper[i] / beta;
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / beta;
    }
    let mut x = d;
    for i in (0..n.saturating_sub(1)).rev() {
        x[i] -= c[i] * x[i + 1];
    }
    Ok(x)
}

// ─── Banded LU ────────────────────────────────────────────────────────────────

/// Band storage with `kl` sub- and `ku` super-diagonals, row-major.
#[derive(Debug, Clone)]
struct Band {
    n: usize,
    kl: usize,
    ku: usize,
    data: Vec<Real>,
}

impl Band {
    fn zeros(n: usize, kl: usize, ku: usize) -> Self {
        Self {
            n,
            kl,
            ku,
            data: vec![0.0; n * (kl + ku + 1)],
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * (self.kl + self.ku + 1) + (col + self.kl - row)
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> Real {
        self.data[self.index(row, col)]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: Real) {
        let i = self.index(row, col);
        self.data[i] = value;
    }

    /// In-place Doolittle factorisation without pivoting.
    fn factorize(&mut self) -> std::result::Result<(), (usize, Real)> {
        let scale = self.data.iter().fold(0.0, |m: Real, v| m.max(v.abs()));
        for k in 0..self.n {
            let pivot = self.get(k, k);
            if !(pivot.abs() > PIVOT_TOLERANCE * scale) {
                return Err((k, pivot));
            }
            let last_row = (k + self.kl).min(self.n - 1);
            let last_col = (k + self.ku).min(self.n - 1);
            for i in k + 1..=last_row {
                let l = self.get(i, k) / pivot;
                if l == 0.0 {
                    continue;
                }
                self.set(i, k, l);
                for j in k + 1..=last_col {
                    let v = self.get(i, j) - l * self.get(k, j);
                    self.set(i, j, v);
                }
            }
        }
        Ok(())
    }

    /// Forward and back substitution with the factors.
    fn substitute(&self, rhs: &[Real]) -> Vec<Real> {
        let mut y = rhs.to_vec();
        for i in 0..self.n {
            let first = i.saturating_sub(self.kl);
            let mut acc = y[i];
            for k in first..i {
                acc -= self.get(i, k) * y[k];
            }
            y[i] = acc;
        }
        for i in (0..self.n).rev() {
            let last = (i + self.ku).min(self.n - 1);
            let mut acc = y[i];
            for j in i + 1..=last {
                acc -= self.get(i, j) * y[j];
            }
            y[i] = acc / self.get(i, i);
        }
        y
    }
}

/// Stencil record of a sum of two operators on the same axis. An empty
/// record adopts the other; otherwise a one-sided row wins over a centered
/// one, and a centered row over a boundary row.
fn merge_stencils(a: &[Stencil], b: &[Stencil]) -> Vec<Stencil> {
    fn rank(s: Stencil) -> u8 {
        match s {
            Stencil::Boundary => 0,
            Stencil::Centered => 1,
            Stencil::Forward | Stencil::Backward => 2,
        }
    }
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_vec(),
        (_, true) => a.to_vec(),
        _ if a.len() != b.len() => Vec::new(),
        _ => a
            .iter()
            .zip(b)
            .map(|(&x, &y)| if rank(y) > rank(x) { y } else { x })
            .collect(),
    }
}

/// A factorised [`BandedOperator`].
#[derive(Debug, Clone)]
pub struct BandedLu {
    band: Band,
    residual: Vec<Real>,
}

impl BandedLu {
    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.band.n
    }

    /// Solve `D·x = b - R`.
    pub fn solve(&self, b: &[Real]) -> Result<Vec<Real>> {
        check_len("right-hand side", b.len(), self.size())?;
        let rhs: Vec<Real> = b.iter().zip(&self.residual).map(|(b, r)| b - r).collect();
        self.solve_linear(&rhs)
    }

    fn solve_linear(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        Ok(self.band.substitute(rhs))
    }
}
