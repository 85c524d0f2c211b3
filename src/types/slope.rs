//! Conversion between surface normals and height-field slopes.

use super::Grid;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Lower bound applied to the outward normal component before dividing.
///
/// Changing this value changes the reconstructed geometry.
pub const MIN_NORMAL_Z: f32 = 0.001;

/// Partial derivatives `(dh/dx, dh/dy)` of the height surface at one texel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Slope {
    pub dx: f32,
    pub dy: f32,
}

impl Slope {
    /// A level surface.
    pub const FLAT: Slope = Slope { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Derive the slope implied by a decoded unit normal.
    ///
    /// The outward component is clamped to [`MIN_NORMAL_Z`], so normals lying
    /// in (or behind) the texture plane produce a bounded slope of at most
    /// `1 / MIN_NORMAL_Z` per axis instead of infinities.
    pub fn from_normal(normal: Vec3) -> Self {
        let f = -1.0 / normal.z.max(MIN_NORMAL_Z);
        Self {
            dx: -normal.x * f,
            dy: normal.y * f,
        }
    }

    /// Rebuild a unit normal from this slope.
    ///
    /// The surface tangents `(1, 0, dx)` and `(0, 1, dy)` are crossed in the
    /// height frame. Normal maps store x mirrored relative to that frame, so
    /// the x component is flipped on the way out; this keeps
    /// `Slope::from_normal(s.to_normal()) == s` for moderate slopes.
    pub fn to_normal(self) -> Vec3 {
        let a = Vec3::new(1.0, 0.0, self.dx);
        let b = Vec3::new(0.0, 1.0, self.dy);
        let n = a.cross(b).normalize();
        Vec3::new(-n.x, n.y, n.z)
    }

    /// Largest absolute component.
    pub fn max_abs(self) -> f32 {
        self.dx.abs().max(self.dy.abs())
    }
}

/// Derive the slope of every texel of a decoded normal map.
pub fn slope_field(normals: &Grid<Vec3>) -> Grid<Slope> {
    normals.map(|n| Slope::from_normal(*n))
}

/// Rebuild a normal map from a slope field (display and round-trip checks).
pub fn normal_field(slopes: &Grid<Slope>) -> Grid<Vec3> {
    slopes.map(|s| s.to_normal())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_flat_normal_is_level() {
        let slope = Slope::from_normal(Vec3::Z);
        assert_eq!(slope.dx, 0.0);
        assert_eq!(slope.dy, 0.0);
    }

    #[test]
    fn test_closed_form_above_clamp() {
        let n = Vec3::new(0.3, -0.2, 0.5).normalize();
        let slope = Slope::from_normal(n);
        assert!(close(slope.dx, n.x / n.z, 1e-6));
        assert!(close(slope.dy, -n.y / n.z, 1e-6));
    }

    #[test]
    fn test_clamp_applies_below_threshold() {
        // z below the threshold behaves as if z == MIN_NORMAL_Z.
        let n = Vec3::new(0.6, 0.8, 0.0001);
        let slope = Slope::from_normal(n);
        assert!(close(slope.dx, 0.6 / MIN_NORMAL_Z, 1e-2));
        assert!(close(slope.dy, -0.8 / MIN_NORMAL_Z, 1e-2));

        // Negative z is clamped the same way.
        let back = Slope::from_normal(Vec3::new(0.6, 0.8, -0.5));
        assert_eq!(back, slope);

        assert!(slope.dx.is_finite() && slope.dy.is_finite());
    }

    #[test]
    fn test_edge_on_normal_stays_finite() {
        let slope = Slope::from_normal(Vec3::X);
        assert!(slope.dx.is_finite());
        assert!(close(slope.dx, 1.0 / MIN_NORMAL_Z, 1e-2));
        assert_eq!(slope.dy, 0.0);
    }

    #[test]
    fn test_to_normal_is_unit() {
        let n = Slope::new(0.4, -0.7).to_normal();
        assert!(close(n.length(), 1.0, 1e-6));
        assert!(n.z > 0.0);
        assert_eq!(Slope::FLAT.to_normal(), Vec3::Z);
    }

    #[test]
    fn test_round_trip_small_slopes() {
        for &(dx, dy) in &[(0.0, 0.0), (0.5, -0.25), (-0.9, 0.9), (0.1, -0.1), (-0.33, -0.66)] {
            let slope = Slope::new(dx, dy);
            let back = Slope::from_normal(slope.to_normal());
            assert!(close(back.dx, dx, 1e-5), "dx {} -> {}", dx, back.dx);
            assert!(close(back.dy, dy, 1e-5), "dy {} -> {}", dy, back.dy);
        }
    }

    #[test]
    fn test_round_trip_large_slopes_is_bounded() {
        let limit = 1.0 / MIN_NORMAL_Z;
        for &(dx, dy) in &[(5000.0f32, 0.0f32), (-20000.0, 3.0), (2500.0, -2500.0)] {
            let back = Slope::from_normal(Slope::new(dx, dy).to_normal());
            // The clamp caps the recovered magnitude, the sign survives.
            assert!(back.max_abs() <= limit * 1.001, "{:?}", back);
            assert_eq!(back.dx.signum(), dx.signum());
            assert!(back.dx.abs() <= dx.abs());
        }
    }

    #[test]
    fn test_slope_field_preserves_dimensions() {
        let normals = Grid::from_fn(4, 3, |x, _| {
            if x % 2 == 0 {
                Vec3::Z
            } else {
                Vec3::new(0.0, 0.6, 0.8)
            }
        });
        let slopes = slope_field(&normals);
        assert_eq!(slopes.dimensions(), (4, 3));
        assert_eq!(slopes[(0, 0)], Slope::FLAT);
        assert!(close(slopes[(1, 2)].dy, -0.75, 1e-6));

        let rebuilt = normal_field(&slopes);
        assert!(close(rebuilt[(1, 2)].y, 0.6, 1e-5));
        assert!(close(rebuilt[(1, 2)].z, 0.8, 1e-5));
    }
}
