//! Height range normalization.

use crate::types::Grid;

/// Smallest and largest finite value, or `None` if there are none.
pub fn value_range(grid: &Grid<f32>) -> Option<(f32, f32)> {
    grid.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Remap `grid` in place so its minimum becomes 0 and its maximum 1.
///
/// A flat grid (or one without finite values) becomes all zeros. Non-finite
/// cells are written as 0.
pub fn normalize(grid: &mut Grid<f32>) {
    match value_range(grid) {
        Some((lo, hi)) if hi > lo => {
            // f64 so that spans wider than f32::MAX stay finite.
            let lo = f64::from(lo);
            let span = f64::from(hi) - lo;
            for v in grid.iter_mut() {
                *v = if v.is_finite() {
                    ((f64::from(*v) - lo) / span).clamp(0.0, 1.0) as f32
                } else {
                    0.0
                };
            }
        }
        _ => {
            for v in grid.iter_mut() {
                *v = 0.0;
            }
        }
    }
}
