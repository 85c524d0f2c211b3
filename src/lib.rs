//! # Relief Baker
//!
//! Reconstructs relief height maps from game-texture normal maps.
//!
//! ## Overview
//!
//! Decoded normals are converted to a per-texel slope field, integrated into a
//! height field and normalized to `[0, 1]`. Two integrators are available:
//!
//! - a global polynomial least-squares fit (smooth, cubic cost, small tiles);
//! - a linear-time cross-scan that averages horizontal and vertical paths.
//!
//! The core is pure: every call reads one grid and returns a new one, so
//! independent textures can be processed on separate threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relief_baker::{load_normal_map, Method, ReliefConfig, Reconstructor, save_height_map};
//!
//! let normals = load_normal_map("brick_n.png")?;
//! let config = ReliefConfig::default().with_method(Method::CrossScan);
//! let heights = Reconstructor::new(config).reconstruct(&normals)?;
//! save_height_map(&heights, "brick_h.png")?;
//! ```
//!
//! ## Working with slopes directly
//!
//! ```ignore
//! use relief_baker::{slope_field, fit_height, cross_scan_height};
//!
//! let slopes = slope_field(&normals);
//! let smooth = fit_height(&slopes, 0.0)?;      // tiles only
//! let fast = cross_scan_height(&slopes)?;
//! ```

pub mod error;
pub mod types;
pub mod solver;
pub mod reconstruct;
pub mod texture;

// Re-export main types for convenience
pub use error::{ReliefError, Result};
pub use types::{normal_field, slope_field, Grid, HeightMap, Normal, Slope, TexelPosition};
pub use solver::{LeastSquaresSolver, Matrix, NormalEquations};
pub use reconstruct::{
    anchored_cross_scan_height, cross_scan_height, fit_height, normalize, reconstruct_height,
    CrossScanIntegrator, Method, Poly2, Reconstructor, ReliefConfig, SurfaceFitter,
};
pub use texture::{
    encode_normal_map, height_to_png, load_normal_map, load_normal_map_from_bytes,
    save_height_map,
};

#[cfg(feature = "wasm")]
pub mod wasm;
