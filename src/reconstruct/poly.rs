//! Bivariate polynomials.

use crate::error::{ReliefError, Result};

/// `P(x, y) = Σ coeff[j * (degree_x + 1) + i] · xⁱ · yʲ`.
#[derive(Debug, Clone, PartialEq)]
pub struct Poly2 {
    degree_x: usize,
    degree_y: usize,
    coeffs: Vec<f64>,
}

impl Poly2 {
    /// Wrap a y-major coefficient vector of length `(degree_x + 1) * (degree_y + 1)`.
    pub fn new(degree_x: usize, degree_y: usize, coeffs: Vec<f64>) -> Result<Self> {
        let expected = Self::monomial_count(degree_x, degree_y);
        if coeffs.len() != expected {
            return Err(ReliefError::InvalidInput(format!(
                "degree ({}, {}) polynomial needs {} coefficients, got {}",
                degree_x,
                degree_y,
                expected,
                coeffs.len()
            )));
        }
        Ok(Self {
            degree_x,
            degree_y,
            coeffs,
        })
    }

    /// Number of monomials for the given degrees.
    pub fn monomial_count(degree_x: usize, degree_y: usize) -> usize {
        (degree_x + 1) * (degree_y + 1)
    }

    /// Coefficient slot of `xⁱ yʲ`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * (self.degree_x + 1) + i
    }

    pub fn degree_x(&self) -> usize {
        self.degree_x
    }

    pub fn degree_y(&self) -> usize {
        self.degree_y
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn coefficient(&self, i: usize, j: usize) -> f64 {
        self.coeffs[self.index(i, j)]
    }

    /// The pinned constant term.
    pub fn constant(&self) -> f64 {
        self.coeffs[0]
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        let mut y_pow = 1.0;
        for j in 0..=self.degree_y {
            let mut row = 0.0;
            let mut x_pow = 1.0;
            for i in 0..=self.degree_x {
                row += self.coefficient(i, j) * x_pow;
                x_pow *= x;
            }
            sum += row * y_pow;
            y_pow *= y;
        }
        sum
    }

    /// `∂P/∂x` at `(x, y)`.
    pub fn derivative_x(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        let mut y_pow = 1.0;
        for j in 0..=self.degree_y {
            let mut x_pow = 1.0;
            for i in 1..=self.degree_x {
                sum += i as f64 * self.coefficient(i, j) * x_pow * y_pow;
                x_pow *= x;
            }
            y_pow *= y;
        }
        sum
    }

    /// `∂P/∂y` at `(x, y)`.
    pub fn derivative_y(&self, x: f64, y: f64) -> f64 {
        let mut sum = 0.0;
        let mut y_pow = 1.0;
        for j in 1..=self.degree_y {
            let mut x_pow = 1.0;
            for i in 0..=self.degree_x {
                sum += j as f64 * self.coefficient(i, j) * x_pow * y_pow;
                x_pow *= x;
            }
            y_pow *= y;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_layout() {
        // 1 + 2x + 3y + 4xy
        let p = Poly2::new(1, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(p.coefficient(1, 0), 2.0);
        assert_eq!(p.coefficient(0, 1), 3.0);
        assert_eq!(p.index(1, 1), 3);
        assert_eq!(p.evaluate(2.0, 3.0), 1.0 + 4.0 + 9.0 + 24.0);
        assert_eq!(p.constant(), 1.0);
    }

    #[test]
    fn test_derivatives() {
        // x²y + y²
        let mut coeffs = vec![0.0; Poly2::monomial_count(2, 2)];
        coeffs[1 * 3 + 2] = 1.0;
        coeffs[2 * 3] = 1.0;
        let p = Poly2::new(2, 2, coeffs).unwrap();
        assert_eq!(p.evaluate(2.0, 3.0), 12.0 + 9.0);
        assert_eq!(p.derivative_x(2.0, 3.0), 12.0);
        assert_eq!(p.derivative_y(2.0, 3.0), 4.0 + 6.0);
    }

    #[test]
    fn test_wrong_coefficient_count() {
        assert!(Poly2::new(2, 1, vec![0.0; 5]).is_err());
    }
}
