//! Linear-time cross-scan integration.
//!
//! Heights are accumulated with the trapezoid rule along the anchor's row and
//! column, then every remaining texel takes the mean of the estimate arriving
//! horizontally and the one arriving vertically, both from the neighbour that
//! lies toward the anchor. A true gradient field makes the two estimates
//! agree; for anything else the mean is a first-order relaxation.

use super::normalize::normalize;
use crate::error::{ReliefError, Result};
use crate::types::{Grid, HeightMap, Slope, TexelPosition};
use log::debug;

/// Raw integration result before normalization.
#[derive(Debug, Clone)]
pub struct CrossScanOutput {
    /// Heights relative to the anchor (anchor = 0).
    pub heights: Grid<f32>,
    /// Largest absolute difference between the horizontal and vertical
    /// estimates at any filled texel. Zero for a path-independent field.
    pub max_path_disagreement: f32,
}

/// Integrates outward from an anchor texel in all four directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossScanIntegrator {
    anchor: TexelPosition,
}

impl CrossScanIntegrator {
    /// Anchored at the top-left texel.
    pub fn top_left() -> Self {
        Self::default()
    }

    pub fn anchored(anchor: TexelPosition) -> Self {
        Self { anchor }
    }

    pub fn anchor(&self) -> TexelPosition {
        self.anchor
    }

    /// Integrate without normalizing.
    pub fn integrate(&self, slopes: &Grid<Slope>) -> Result<CrossScanOutput> {
        slopes.ensure_non_empty()?;
        let (width, height) = slopes.dimensions();
        let TexelPosition { x: ax, y: ay } = self.anchor;
        if !slopes.contains(ax, ay) {
            return Err(ReliefError::InvalidInput(format!(
                "anchor ({}, {}) outside {}x{} grid",
                ax, ay, width, height
            )));
        }

        let mut h = Grid::new(width, height, 0.0f32);

        // Seed the anchor row.
        for x in (ax + 1)..width {
            h[(x, ay)] = h[(x - 1, ay)] + step_x(slopes, x - 1, x, ay);
        }
        for x in (0..ax).rev() {
            h[(x, ay)] = h[(x + 1, ay)] + step_x(slopes, x + 1, x, ay);
        }

        // Seed the anchor column.
        for y in (ay + 1)..height {
            h[(ax, y)] = h[(ax, y - 1)] + step_y(slopes, ax, y - 1, y);
        }
        for y in (0..ay).rev() {
            h[(ax, y)] = h[(ax, y + 1)] + step_y(slopes, ax, y + 1, y);
        }

        // Fill the four quadrants moving away from the anchor.
        let rows = ((ay + 1)..height)
            .map(|y| (y, y - 1))
            .chain((0..ay).rev().map(|y| (y, y + 1)));
        let mut max_disagreement = 0.0f32;
        for (y, from_y) in rows {
            let cols = ((ax + 1)..width)
                .map(|x| (x, x - 1))
                .chain((0..ax).rev().map(|x| (x, x + 1)));
            for (x, from_x) in cols {
                let horizontal = h[(from_x, y)] + step_x(slopes, from_x, x, y);
                let vertical = h[(x, from_y)] + step_y(slopes, x, from_y, y);
                max_disagreement = max_disagreement.max((horizontal - vertical).abs());
                h[(x, y)] = 0.5 * (horizontal + vertical);
            }
        }

        debug!(
            "Cross-scan {}x{} from ({}, {}): max path disagreement {}",
            width, height, ax, ay, max_disagreement
        );

        Ok(CrossScanOutput {
            heights: h,
            max_path_disagreement: max_disagreement,
        })
    }

    /// Integrate and normalize.
    pub fn reconstruct(&self, slopes: &Grid<Slope>) -> Result<HeightMap> {
        let mut heights = self.integrate(slopes)?.heights;
        normalize(&mut heights);
        Ok(heights)
    }
}

/// Top-left anchored cross-scan, normalized.
pub fn cross_scan_height(slopes: &Grid<Slope>) -> Result<HeightMap> {
    CrossScanIntegrator::top_left().reconstruct(slopes)
}

/// Cross-scan anchored at `anchor`, normalized.
pub fn anchored_cross_scan_height(
    slopes: &Grid<Slope>,
    anchor: TexelPosition,
) -> Result<HeightMap> {
    CrossScanIntegrator::anchored(anchor).reconstruct(slopes)
}

/// Trapezoidal height change walking from column `from` to adjacent column `to`.
#[inline]
fn step_x(slopes: &Grid<Slope>, from: usize, to: usize, y: usize) -> f32 {
    let avg = 0.5 * (slopes[(from, y)].dx + slopes[(to, y)].dx);
    if to > from {
        avg
    } else {
        -avg
    }
}

/// Trapezoidal height change walking from row `from` to adjacent row `to`.
#[inline]
fn step_y(slopes: &Grid<Slope>, x: usize, from: usize, to: usize) -> f32 {
    let avg = 0.5 * (slopes[(x, from)].dy + slopes[(x, to)].dy);
    if to > from {
        avg
    } else {
        -avg
    }
}
