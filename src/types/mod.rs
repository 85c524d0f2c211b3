//! Shared types used throughout the library.

mod grid;
mod slope;

pub use grid::{cell_count, Grid};
pub use slope::{normal_field, slope_field, Slope, MIN_NORMAL_Z};

/// A decoded unit normal; `z` is the outward component.
pub type Normal = glam::Vec3;

/// Relative surface height per texel, in `[0, 1]` once normalized.
pub type HeightMap = Grid<f32>;

/// A texel coordinate used to anchor integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TexelPosition {
    pub x: usize,
    pub y: usize,
}

impl TexelPosition {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The top-left texel.
    pub const ORIGIN: TexelPosition = TexelPosition { x: 0, y: 0 };
}
