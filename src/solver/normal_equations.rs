//! Normal-equations least squares with a Cholesky factorization.

use super::{LeastSquaresSolver, Matrix};
use crate::error::{ReliefError, Result};

/// Solves `AᵗA c = Aᵗb`.
///
/// Columns are equilibrated to unit norm before forming the Gram matrix and a
/// small ridge term is added to its diagonal. Polynomial slope systems always
/// have at least one null direction (a product of per-axis polynomials that
/// vanish at every sample); with the ridge the solve returns the small-norm
/// member of the solution set instead of failing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalEquations {
    /// Diagonal damping relative to the unit-diagonal scaled Gram matrix.
    pub ridge: f64,
}

impl Default for NormalEquations {
    fn default() -> Self {
        Self { ridge: 1e-10 }
    }
}

impl NormalEquations {
    pub fn new(ridge: f64) -> Self {
        Self { ridge }
    }

    /// No damping; singular systems fail instead of being regularized.
    pub fn undamped() -> Self {
        Self { ridge: 0.0 }
    }
}

impl LeastSquaresSolver for NormalEquations {
    fn solve(&self, a: &Matrix, b: &[f64]) -> Result<Vec<f64>> {
        if b.len() != a.rows() {
            return Err(ReliefError::InvalidInput(format!(
                "right-hand side has {} entries for {} equations",
                b.len(),
                a.rows()
            )));
        }
        let n = a.cols();
        if n == 0 {
            return Ok(Vec::new());
        }
        if b.iter().any(|v| !v.is_finite()) {
            return Err(ReliefError::NumericalFailure(
                "right-hand side contains non-finite values".to_string(),
            ));
        }

        let scale: Vec<f64> = a
            .column_norms()
            .into_iter()
            .map(|s| if s > 0.0 && s.is_finite() { 1.0 / s } else { 1.0 })
            .collect();

        let mut gram = a.gram();
        for i in 0..n {
            for j in 0..n {
                let v = gram.get(i, j) * scale[i] * scale[j];
                gram.set(i, j, v);
            }
            let d = gram.get(i, i) + self.ridge;
            gram.set(i, i, d);
        }
        let rhs: Vec<f64> = a
            .transpose_mul_vec(b)
            .into_iter()
            .zip(&scale)
            .map(|(v, s)| v * s)
            .collect();

        let lower = cholesky(&gram)?;
        let y = solve_lower(&lower, &rhs);
        let z = solve_upper_transposed(&lower, &y);

        let solution: Vec<f64> = z.into_iter().zip(&scale).map(|(v, s)| v * s).collect();
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(ReliefError::NumericalFailure(
                "least-squares solution is not finite".to_string(),
            ));
        }
        Ok(solution)
    }
}

/// Lower-triangular `L` with `L Lᵗ = m`.
fn cholesky(m: &Matrix) -> Result<Matrix> {
    let n = m.rows();
    let mut l = Matrix::zeros(n, n);
    for j in 0..n {
        let mut diag = m.get(j, j);
        for k in 0..j {
            diag -= l.get(j, k) * l.get(j, k);
        }
        if !diag.is_finite() || diag <= 0.0 {
            return Err(ReliefError::NumericalFailure(format!(
                "normal equations are not positive definite (pivot {} of {} is {:e})",
                j, n, diag
            )));
        }
        let pivot = diag.sqrt();
        l.set(j, j, pivot);

        for i in (j + 1)..n {
            let mut sum = m.get(i, j);
            for k in 0..j {
                sum -= l.get(i, k) * l.get(j, k);
            }
            l.set(i, j, sum / pivot);
        }
    }
    Ok(l)
}

/// Forward substitution for `L y = b`.
fn solve_lower(l: &Matrix, b: &[f64]) -> Vec<f64> {
    let n = l.rows();
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l.get(i, k) * y[k];
        }
        y[i] = sum / l.get(i, i);
    }
    y
}

/// Back substitution for `Lᵗ x = y`.
fn solve_upper_transposed(l: &Matrix, y: &[f64]) -> Vec<f64> {
    let n = l.rows();
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l.get(k, i) * x[k];
        }
        x[i] = sum / l.get(i, i);
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::residual_norm_sq;

    #[test]
    fn test_square_system() {
        let a = Matrix::from_rows(&[vec![4.0, 1.0], vec![1.0, 3.0]]);
        let c = NormalEquations::undamped().solve(&a, &[1.0, 2.0]).unwrap();
        // Exact solution: (1/11, 7/11).
        assert!((c[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((c[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_overdetermined_line_fit() {
        // y = 2x + 1 sampled with symmetric noise.
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.1, 2.9, 5.1, 6.9];
        let rows: Vec<Vec<f64>> = xs.iter().map(|&x| vec![1.0, x]).collect();
        let a = Matrix::from_rows(&rows);
        let c = NormalEquations::default().solve(&a, &ys).unwrap();
        assert!((c[0] - 1.06).abs() < 1e-6, "{:?}", c);
        assert!((c[1] - 1.96).abs() < 1e-6, "{:?}", c);
    }

    #[test]
    fn test_singular_without_ridge_fails() {
        // Second unknown never appears in any equation.
        let a = Matrix::from_rows(&[vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]);
        let err = NormalEquations::undamped()
            .solve(&a, &[1.0, 2.0, 3.0])
            .unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn test_singular_with_ridge_finds_least_squares_solution() {
        let a = Matrix::from_rows(&[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]]);
        let b = [1.0, 2.0, 3.0];
        let c = NormalEquations::default().solve(&a, &b).unwrap();
        // Minimum-norm solution splits the weight evenly.
        assert!((c[0] - 0.5).abs() < 1e-6);
        assert!((c[1] - 0.5).abs() < 1e-6);
        assert!(residual_norm_sq(&a, &c, &b) < 1e-10);
    }

    #[test]
    fn test_rejects_mismatched_rhs() {
        let a = Matrix::zeros(3, 2);
        let err = NormalEquations::default().solve(&a, &[1.0]).unwrap_err();
        assert!(matches!(err, ReliefError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_non_finite_rhs() {
        let a = Matrix::from_rows(&[vec![1.0], vec![1.0]]);
        let err = NormalEquations::default()
            .solve(&a, &[f64::NAN, 1.0])
            .unwrap_err();
        assert!(err.is_numerical());
    }
}
