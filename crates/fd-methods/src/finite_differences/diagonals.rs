//! Row-aligned storage for a sparse band of diagonals.
//!
//! `data[k][row]` holds `A[row, row + offsets[k]]`. Entries whose column
//! would fall outside `0..size` are kept at zero, so a diagonal can be tiled
//! or restricted without leaking couplings across block edges.

use fd_core::{
    errors::{Error, Result},
    Real,
};

/// A square matrix stored as a sorted set of diagonals.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagonals {
    size: usize,
    offsets: Vec<isize>,
    data: Vec<Vec<Real>>,
}

impl Diagonals {
    /// All-zero diagonals at the given offsets.
    pub fn zeros(size: usize, offsets: &[isize]) -> Self {
        let mut offsets = offsets.to_vec();
        offsets.sort_unstable();
        offsets.dedup();
        let data = vec![vec![0.0; size]; offsets.len()];
        Self {
            size,
            offsets,
            data,
        }
    }

    /// Build from `(offset, diagonal)` pairs. Repeated offsets are summed and
    /// out-of-range entries are dropped.
    pub fn from_pairs(size: usize, pairs: Vec<(isize, Vec<Real>)>) -> Result<Self> {
        let offsets: Vec<isize> = pairs.iter().map(|(o, _)| *o).collect();
        let mut out = Self::zeros(size, &offsets);
        for (offset, values) in pairs {
            if values.len() != size {
                return Err(Error::InvalidArgument(format!(
                    "diagonal {offset} has {} entries, expected {size}",
                    values.len()
                )));
            }
            for (row, v) in values.into_iter().enumerate() {
                if out.in_range(row, offset) {
                    out.add(row, offset, v);
                }
            }
        }
        Ok(out)
    }

    /// Number of rows (and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Stored offsets, ascending.
    #[inline]
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// Iterate over `(offset, row-aligned values)`.
    pub fn iter(&self) -> impl Iterator<Item = (isize, &[Real])> + '_ {
        self.offsets
            .iter()
            .zip(self.data.iter())
            .map(|(o, d)| (*o, d.as_slice()))
    }

    /// The diagonal at `offset`, if stored.
    pub fn diagonal(&self, offset: isize) -> Option<&[Real]> {
        self.index_of(offset).map(|k| self.data[k].as_slice())
    }

    /// Whether `(row, row + offset)` lies inside the matrix.
    #[inline]
    pub fn in_range(&self, row: usize, offset: isize) -> bool {
        let col = row as isize + offset;
        row < self.size && col >= 0 && (col as usize) < self.size
    }

    /// `A[row, row + offset]`, zero when not stored.
    pub fn get(&self, row: usize, offset: isize) -> Real {
        match self.index_of(offset) {
            Some(k) if row < self.size => self.data[k][row],
            _ => 0.0,
        }
    }

    /// Set `A[row, row + offset]`, adding the diagonal if needed.
    ///
    /// # Panics
    /// If the column falls outside the matrix.
    pub fn set(&mut self, row: usize, offset: isize, value: Real) {
        assert!(
            self.in_range(row, offset),
            "entry ({row}, {offset}) outside a {}x{} matrix",
            self.size,
            self.size
        );
        let k = self.insert(offset);
        self.data[k][row] = value;
    }

    /// Add to `A[row, row + offset]`.
    ///
    /// # Panics
    /// If the column falls outside the matrix.
    pub fn add(&mut self, row: usize, offset: isize, value: Real) {
        assert!(
            self.in_range(row, offset),
            "entry ({row}, {offset}) outside a {}x{} matrix",
            self.size,
            self.size
        );
        let k = self.insert(offset);
        self.data[k][row] += value;
    }

    /// Zero every entry of `row`.
    pub fn clear_row(&mut self, row: usize) {
        for d in &mut self.data {
            d[row] = 0.0;
        }
    }

    /// Replace `row` with the given `(offset, value)` entries.
    pub fn set_row(&mut self, row: usize, entries: &[(isize, Real)]) {
        self.clear_row(row);
        for &(offset, value) in entries {
            self.add(row, offset, value);
        }
    }

    /// Sum of the entries of `row`.
    pub fn row_sum(&self, row: usize) -> Real {
        self.data.iter().map(|d| d[row]).sum()
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> Real {
        self.data
            .iter()
            .flat_map(|d| d.iter())
            .fold(0.0, |m: Real, v| m.max(v.abs()))
    }

    /// `A·x`.
    pub fn apply(&self, x: &[Real]) -> Vec<Real> {
        assert_eq!(x.len(), self.size, "size mismatch in Diagonals::apply");
        let mut y = vec![0.0; self.size];
        for (offset, d) in self.iter() {
            let (lo, hi) = self.row_range(offset);
            for row in lo..hi {
                y[row] += d[row] * x[(row as isize + offset) as usize];
            }
        }
        y
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: Real) {
        for d in &mut self.data {
            for v in d.iter_mut() {
                *v *= factor;
            }
        }
    }

    /// Multiply row `i` by `weights[i]`.
    pub fn scale_rows(&mut self, weights: &[Real]) {
        for d in &mut self.data {
            for (v, w) in d.iter_mut().zip(weights) {
                *v *= w;
            }
        }
    }

    /// `self + factor·other`, over the union of both offset sets.
    pub fn axpy(&self, factor: Real, other: &Diagonals) -> Diagonals {
        let mut offsets = self.offsets.clone();
        offsets.extend_from_slice(&other.offsets);
        let mut out = Diagonals::zeros(self.size, &offsets);
        for (offset, d) in self.iter() {
            let k = out.insert(offset);
            out.data[k].copy_from_slice(d);
        }
        for (offset, d) in other.iter() {
            let k = out.insert(offset);
            for (o, v) in out.data[k].iter_mut().zip(d) {
                *o += factor * v;
            }
        }
        out
    }

    /// Drop all-zero diagonals whose offset is not in `keep`.
    pub fn trimmed(mut self, keep: &[isize]) -> Self {
        let mut k = 0;
        while k < self.offsets.len() {
            if !keep.contains(&self.offsets[k]) && self.data[k].iter().all(|v| *v == 0.0) {
                self.offsets.remove(k);
                self.data.remove(k);
            } else {
                k += 1;
            }
        }
        self
    }

    /// Rows `lo..hi` for which `offset` points inside the matrix.
    pub(crate) fn row_range(&self, offset: isize) -> (usize, usize) {
        let n = self.size as isize;
        let lo = (-offset).clamp(0, n) as usize;
        let hi = (n - offset).clamp(0, n) as usize;
        (lo, hi.max(lo))
    }

    pub(crate) fn index_of(&self, offset: isize) -> Option<usize> {
        self.offsets.binary_search(&offset).ok()
    }

    pub(crate) fn insert(&mut self, offset: isize) -> usize {
        match self.offsets.binary_search(&offset) {
            Ok(k) => k,
            Err(k) => {
                self.offsets.insert(k, offset);
                self.data.insert(k, vec![0.0; self.size]);
                k
            }
        }
    }

    pub(crate) fn data(&self) -> &[Vec<Real>] {
        &self.data
    }

    pub(crate) fn from_parts(size: usize, offsets: Vec<isize>, data: Vec<Vec<Real>>) -> Self {
        Self {
            size,
            offsets,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_entries_are_dropped() {
        let d = Diagonals::from_pairs(3, vec![(-1, vec![9.0, 1.0, 2.0]), (1, vec![3.0, 4.0, 9.0])])
            .unwrap();
        assert_eq!(d.diagonal(-1).unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(d.diagonal(1).unwrap(), &[3.0, 4.0, 0.0]);
    }

    #[test]
    fn apply_matches_hand_product() {
        let mut d = Diagonals::zeros(3, &[-1, 0, 1]);
        d.set_row(0, &[(0, 2.0), (1, -1.0)]);
        d.set_row(1, &[(-1, -1.0), (0, 2.0), (1, -1.0)]);
        d.set_row(2, &[(-1, -1.0), (0, 2.0)]);
        assert_eq!(d.apply(&[1.0, 2.0, 3.0]), vec![0.0, 0.0, 4.0]);
        assert_eq!(d.row_sum(1), 0.0);
    }

    #[test]
    fn trimmed_keeps_the_core_band() {
        let mut d = Diagonals::zeros(4, &[-2, -1, 0, 1, 2]);
        d.set(1, 2, 1.0);
        let t = d.trimmed(&[-1, 0, 1]);
        assert_eq!(t.offsets(), &[-1, 0, 1, 2]);
    }

    #[test]
    fn axpy_unions_offsets() {
        let a = Diagonals::from_pairs(2, vec![(0, vec![1.0, 1.0])]).unwrap();
        let b = Diagonals::from_pairs(2, vec![(1, vec![5.0, 0.0])]).unwrap();
        let c = a.axpy(-2.0, &b);
        assert_eq!(c.offsets(), &[0, 1]);
        assert_eq!(c.get(0, 1), -10.0);
        assert_eq!(c.get(1, 0), 1.0);
    }
}
