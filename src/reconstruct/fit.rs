//! Global least-squares polynomial surface fit.
//!
//! A single polynomial of degree `(width, height)` is fitted so that its
//! analytic gradient matches every texel's slope. The dense system has
//! `2·w·h` rows and `(w+1)(h+1) - 1` columns, so memory grows as
//! `O((w·h)²)` and the solve as `O((w·h)³)`. Only call this on tiles of a
//! few tens of texels per side.

use super::normalize::normalize;
use super::poly::Poly2;
use crate::error::Result;
use crate::solver::{residual_norm_sq, LeastSquaresSolver, Matrix, NormalEquations};
use crate::types::{Grid, HeightMap, Slope};
use log::{debug, log_enabled, Level};

/// Fits slope fields with a pluggable least-squares backend.
#[derive(Debug, Clone)]
pub struct SurfaceFitter<S = NormalEquations> {
    solver: S,
    constant: f64,
}

impl Default for SurfaceFitter<NormalEquations> {
    fn default() -> Self {
        Self::new(NormalEquations::default())
    }
}

impl<S: LeastSquaresSolver> SurfaceFitter<S> {
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            constant: 0.0,
        }
    }

    /// Pin the constant term, which slopes cannot determine.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    /// Fit the polynomial whose gradient best matches `slopes`.
    pub fn fit(&self, slopes: &Grid<Slope>) -> Result<Poly2> {
        slopes.ensure_non_empty()?;
        let (width, height) = slopes.dimensions();

        let (a, b) = assemble(slopes);
        debug!(
            "Fitting {}x{} slope field: {} equations, {} unknowns",
            width,
            height,
            a.rows(),
            a.cols()
        );

        let solved = self.solver.solve(&a, &b)?;
        if log_enabled!(Level::Debug) {
            debug!("Fit residual: {:e}", residual_norm_sq(&a, &solved, &b));
        }

        let mut coeffs = Vec::with_capacity(solved.len() + 1);
        coeffs.push(self.constant);
        coeffs.extend(solved);
        Poly2::new(width, height, coeffs)
    }

    /// Fit and evaluate onto the grid, then normalize.
    pub fn reconstruct(&self, slopes: &Grid<Slope>) -> Result<HeightMap> {
        let poly = self.fit(slopes)?;
        let mut heights = evaluate_on_grid(&poly, slopes.width(), slopes.height());
        normalize(&mut heights);
        Ok(heights)
    }
}

/// Fit with the default solver and evaluate to a normalized height map.
pub fn fit_height(slopes: &Grid<Slope>, constant: f32) -> Result<HeightMap> {
    SurfaceFitter::default()
        .with_constant(constant as f64)
        .reconstruct(slopes)
}

/// Texel-centre sample coordinate in `(0, 1)`.
#[inline]
pub fn sample_point(x: usize, y: usize, width: usize, height: usize) -> (f64, f64) {
    (
        (x as f64 + 0.5) / width as f64,
        (y as f64 + 0.5) / height as f64,
    )
}

/// Evaluate `poly` at every texel-centre sample point.
pub fn evaluate_on_grid(poly: &Poly2, width: usize, height: usize) -> HeightMap {
    Grid::from_fn(width, height, |x, y| {
        let (u, v) = sample_point(x, y, width, height);
        poly.evaluate(u, v) as f32
    })
}

/// Build the derivative-matching system.
///
/// Row `2t` constrains `∂P/∂x` at texel `t`, row `2t + 1` constrains `∂P/∂y`.
/// Column `k` holds monomial `k + 1` in y-major order; the constant monomial is
/// not an unknown.
fn assemble(slopes: &Grid<Slope>) -> (Matrix, Vec<f64>) {
    let (width, height) = slopes.dimensions();
    let degree_x = width;
    let degree_y = height;
    let unknowns = Poly2::monomial_count(degree_x, degree_y) - 1;

    let mut a = Matrix::zeros(2 * width * height, unknowns);
    let mut b = vec![0.0; 2 * width * height];

    for ((x, y), slope) in slopes.enumerate() {
        let (u, v) = sample_point(x, y, width, height);
        let u_pow = powers(u, degree_x);
        let v_pow = powers(v, degree_y);

        let t = slopes.index_of(x, y);
        let row_dx = 2 * t;
        let row_dy = row_dx + 1;

        for j in 0..=degree_y {
            for i in 0..=degree_x {
                if i == 0 && j == 0 {
                    continue;
                }
                let col = j * (degree_x + 1) + i - 1;
                if i > 0 {
                    a.set(row_dx, col, i as f64 * u_pow[i - 1] * v_pow[j]);
                }
                if j > 0 {
                    a.set(row_dy, col, j as f64 * u_pow[i] * v_pow[j - 1]);
                }
            }
        }

        b[row_dx] = slope.dx as f64;
        b[row_dy] = slope.dy as f64;
    }

    (a, b)
}

/// `[1, t, t², ..., t^degree]`.
fn powers(t: f64, degree: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(degree + 1);
    let mut p = 1.0;
    for _ in 0..=degree {
        out.push(p);
        p *= t;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReliefError;

    #[test]
    fn test_system_shape() {
        let slopes = Grid::new(3, 2, Slope::new(0.1, 0.2));
        let (a, b) = assemble(&slopes);
        assert_eq!(a.rows(), 2 * 3 * 2);
        assert_eq!(a.cols(), 4 * 3 - 1);
        assert_eq!(b.len(), a.rows());
        assert_eq!(b[0], 0.1f32 as f64);
        assert_eq!(b[1], 0.2f32 as f64);
    }

    #[test]
    fn test_row_coefficients() {
        let slopes = Grid::new(2, 2, Slope::FLAT);
        let (a, _) = assemble(&slopes);
        // Texel (1, 0) samples at (0.75, 0.25).
        let t = slopes.index_of(1, 0);
        let (u, v) = (0.75, 0.25);
        // Column of x¹y⁰ is 0; column of x⁰y¹ is 2; column of x²y¹ is 4.
        assert_eq!(a.get(2 * t, 0), 1.0);
        assert_eq!(a.get(2 * t + 1, 0), 0.0);
        assert_eq!(a.get(2 * t, 2), 0.0);
        assert_eq!(a.get(2 * t + 1, 2), 1.0);
        assert!((a.get(2 * t, 4) - 2.0 * u * v).abs() < 1e-12);
        assert!((a.get(2 * t + 1, 4) - u * u).abs() < 1e-12);
    }

    #[test]
    fn test_sample_points_are_texel_centres() {
        assert_eq!(sample_point(0, 0, 4, 2), (0.125, 0.25));
        assert_eq!(sample_point(3, 1, 4, 2), (0.875, 0.75));
    }

    #[test]
    fn test_constant_slope_fit_reproduces_slopes() {
        let (w, h) = (3, 3);
        let slopes = Grid::new(w, h, Slope::new(0.1, -0.1));
        let poly = SurfaceFitter::default().fit(&slopes).unwrap();
        assert_eq!(poly.degree_x(), 3);
        assert_eq!(poly.degree_y(), 3);
        assert_eq!(poly.constant(), 0.0);

        let values = evaluate_on_grid(&poly, w, h);
        for y in 0..h {
            for x in 0..w - 1 {
                let diff = (values[(x + 1, y)] - values[(x, y)]) * w as f32;
                assert!((diff - 0.1).abs() < 1e-3, "dx at ({}, {}) = {}", x, y, diff);
            }
        }
        for y in 0..h - 1 {
            for x in 0..w {
                let diff = (values[(x, y + 1)] - values[(x, y)]) * h as f32;
                assert!((diff + 0.1).abs() < 1e-3, "dy at ({}, {}) = {}", x, y, diff);
            }
        }

        // The analytic gradient matches at every sample point too.
        for y in 0..h {
            for x in 0..w {
                let (u, v) = sample_point(x, y, w, h);
                assert!((poly.derivative_x(u, v) - 0.1).abs() < 1e-4);
                assert!((poly.derivative_y(u, v) + 0.1).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_quadratic_surface_shape() {
        // h(u, v) = u² + v has gradient (2u, 1).
        let (w, h) = (3, 3);
        let slopes = Grid::from_fn(w, h, |x, y| {
            let (u, _) = sample_point(x, y, w, h);
            Slope::new((2.0 * u) as f32, 1.0)
        });
        let fitted = fit_height(&slopes, 0.0).unwrap();

        let mut expected = Grid::from_fn(w, h, |x, y| {
            let (u, v) = sample_point(x, y, w, h);
            (u * u + v) as f32
        });
        normalize(&mut expected);

        for (got, want) in fitted.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_pinned_constant() {
        let slopes = Grid::new(2, 2, Slope::FLAT);
        let poly = SurfaceFitter::default()
            .with_constant(2.5)
            .fit(&slopes)
            .unwrap();
        assert_eq!(poly.constant(), 2.5);
        assert!((poly.evaluate(0.3, 0.7) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_flat_field_gives_zero_heights() {
        let slopes = Grid::new(3, 2, Slope::FLAT);
        let heights = fit_height(&slopes, 0.0).unwrap();
        assert!(heights.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_grid_is_invalid() {
        let slopes: Grid<Slope> = Grid::new(0, 3, Slope::FLAT);
        let err = fit_height(&slopes, 0.0).unwrap_err();
        assert!(matches!(err, ReliefError::InvalidInput(_)));
    }

    struct FailingSolver;

    impl LeastSquaresSolver for FailingSolver {
        fn solve(&self, _a: &Matrix, _b: &[f64]) -> Result<Vec<f64>> {
            Err(ReliefError::NumericalFailure("singular".to_string()))
        }
    }

    #[test]
    fn test_solver_failure_propagates() {
        let slopes = Grid::new(2, 2, Slope::new(0.2, 0.1));
        let err = SurfaceFitter::new(FailingSolver).fit(&slopes).unwrap_err();
        assert!(err.is_numerical(), "{:?}", err);
    }
}
