//! Dense linear least-squares.
//!
//! The surface fitter only talks to [`LeastSquaresSolver`], so the
//! factorization behind it can be swapped without touching equation assembly.

mod normal_equations;

pub use normal_equations::NormalEquations;

use crate::error::Result;

/// Dense row-major matrix. Rows are equations, columns are unknowns.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Allocate a zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows; all rows must have the same length.
    ///
    /// # Panics
    ///
    /// Panics if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut m = Self::zeros(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), cols, "ragged matrix row {}", i);
            m.row_mut(i).copy_from_slice(row);
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// `A * v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len()` is not the column count.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.cols, "vector length must match column count");
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// `Aᵗ * v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len()` is not the row count.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.rows, "vector length must match row count");
        let mut out = vec![0.0; self.cols];
        for (r, &vr) in v.iter().enumerate() {
            if vr == 0.0 {
                continue;
            }
            for (o, a) in out.iter_mut().zip(self.row(r)) {
                *o += a * vr;
            }
        }
        out
    }

    /// The Gram matrix `AᵗA` (symmetric, `cols x cols`).
    pub fn gram(&self) -> Matrix {
        let n = self.cols;
        let mut g = Matrix::zeros(n, n);
        for r in 0..self.rows {
            let row = self.row(r);
            for i in 0..n {
                let ri = row[i];
                if ri == 0.0 {
                    continue;
                }
                for j in i..n {
                    g.data[i * n + j] += ri * row[j];
                }
            }
        }
        for i in 0..n {
            for j in 0..i {
                g.data[i * n + j] = g.data[j * n + i];
            }
        }
        g
    }

    /// Euclidean norm of each column.
    pub fn column_norms(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (s, a) in sums.iter_mut().zip(self.row(r)) {
                *s += a * a;
            }
        }
        sums.into_iter().map(f64::sqrt).collect()
    }
}

/// Solve `min |A c - b|²` for `c`.
pub trait LeastSquaresSolver {
    fn solve(&self, a: &Matrix, b: &[f64]) -> Result<Vec<f64>>;
}

/// Sum of squared residuals `|A c - b|²`.
///
/// # Panics
///
/// Panics if `c.len()` is not the column count of `a`.
pub fn residual_norm_sq(a: &Matrix, c: &[f64], b: &[f64]) -> f64 {
    a.mul_vec(c)
        .iter()
        .zip(b)
        .map(|(p, q)| (p - q) * (p - q))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gram_is_symmetric() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let g = a.gram();
        assert_eq!(g.rows(), 2);
        assert_eq!(g.get(0, 0), 35.0);
        assert_eq!(g.get(0, 1), 44.0);
        assert_eq!(g.get(1, 0), 44.0);
        assert_eq!(g.get(1, 1), 56.0);
    }

    #[test]
    fn test_products() {
        let a = Matrix::from_rows(&[vec![1.0, 0.0, 2.0], vec![0.0, 3.0, 1.0]]);
        assert_eq!(a.mul_vec(&[1.0, 1.0, 1.0]), vec![3.0, 4.0]);
        assert_eq!(a.transpose_mul_vec(&[1.0, 2.0]), vec![1.0, 6.0, 4.0]);
        let norms = a.column_norms();
        assert_eq!(norms[1], 3.0);
        assert!((norms[2] - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "vector length must match column count")]
    fn test_mul_vec_shape_mismatch_panics() {
        Matrix::zeros(2, 3).mul_vec(&[1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "ragged matrix row 1")]
    fn test_ragged_rows_panic() {
        Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
    }

    #[test]
    fn test_residual() {
        let a = Matrix::from_rows(&[vec![1.0], vec![1.0]]);
        assert_eq!(residual_norm_sq(&a, &[1.0], &[0.0, 2.0]), 2.0);
    }
}
