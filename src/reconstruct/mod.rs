//! Height reconstruction from normal maps.
//!
//! A normal grid is turned into a slope field, integrated by one of two
//! algorithms and normalized to `[0, 1]`:
//!
//! - [`Method::Fit`]: one global least-squares polynomial. Smooth, but cubic
//!   in the texel count, so limited to small tiles.
//! - [`Method::CrossScan`] / [`Method::Anchored`]: linear-time path
//!   integration from an anchor texel.

pub mod cross_scan;
pub mod fit;
pub mod normalize;
pub mod poly;

pub use cross_scan::{anchored_cross_scan_height, cross_scan_height, CrossScanIntegrator};
pub use fit::{fit_height, SurfaceFitter};
pub use normalize::normalize;
pub use poly::Poly2;

use crate::error::{ReliefError, Result};
use crate::types::{slope_field, Grid, HeightMap, Normal, Slope, TexelPosition};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which integrator turns slopes into heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Method {
    /// Global polynomial least-squares fit.
    Fit,
    /// Cross-scan anchored at the top-left texel.
    #[default]
    CrossScan,
    /// Cross-scan anchored at an arbitrary texel.
    Anchored { x: usize, y: usize },
}

impl Method {
    /// Parse a method name (`fit`, `cross-scan`, `anchored`).
    pub fn from_name(name: &str, anchor: Option<TexelPosition>) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "fit" | "poly" | "polynomial" => Some(Method::Fit),
            "cross-scan" | "cross_scan" | "crossscan" | "scan" => Some(Method::CrossScan),
            "anchored" | "cross" => {
                let a = anchor.unwrap_or_default();
                Some(Method::Anchored { x: a.x, y: a.y })
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Fit => "fit",
            Method::CrossScan => "cross-scan",
            Method::Anchored { .. } => "anchored",
        }
    }
}

/// Reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefConfig {
    /// Integration algorithm.
    pub method: Method,
    /// Constant term pinned on the polynomial fit.
    pub fit_constant: f32,
    /// Largest `width * height` the fit path accepts.
    pub fit_texel_limit: usize,
    /// Use the top-left cross-scan when the fit fails or is over the limit.
    pub fallback_to_cross_scan: bool,
}

impl Default for ReliefConfig {
    fn default() -> Self {
        Self {
            method: Method::CrossScan,
            fit_constant: 0.0,
            fit_texel_limit: 32 * 32,
            fallback_to_cross_scan: true,
        }
    }
}

impl ReliefConfig {
    /// Select the integration method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Pin the fit's constant term.
    pub fn with_fit_constant(mut self, constant: f32) -> Self {
        self.fit_constant = constant;
        self
    }

    /// Change the largest texel count accepted by the fit.
    pub fn with_fit_texel_limit(mut self, limit: usize) -> Self {
        self.fit_texel_limit = limit;
        self
    }

    /// Enable or disable the cross-scan fallback.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_cross_scan = enabled;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReliefConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fit_texel_limit == 0 {
            return Err(ReliefError::Config(
                "fit_texel_limit must be at least 1".to_string(),
            ));
        }
        if !self.fit_constant.is_finite() {
            return Err(ReliefError::Config(format!(
                "fit_constant must be finite, got {}",
                self.fit_constant
            )));
        }
        Ok(())
    }
}

/// Runs the full normal map → height map pipeline.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    config: ReliefConfig,
}

impl Reconstructor {
    pub fn new(config: ReliefConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReliefConfig {
        &self.config
    }

    /// Reconstruct a normalized height map from decoded normals.
    pub fn reconstruct(&self, normals: &Grid<Normal>) -> Result<HeightMap> {
        normals.ensure_non_empty()?;
        let slopes = slope_field(normals);
        self.reconstruct_slopes(&slopes)
    }

    /// Reconstruct from an already derived slope field.
    pub fn reconstruct_slopes(&self, slopes: &Grid<Slope>) -> Result<HeightMap> {
        slopes.ensure_non_empty()?;
        let (width, height) = slopes.dimensions();
        debug!(
            "Reconstructing {}x{} height map with {}",
            width,
            height,
            self.config.method.name()
        );

        match self.config.method {
            Method::CrossScan => cross_scan_height(slopes),
            Method::Anchored { x, y } => {
                anchored_cross_scan_height(slopes, TexelPosition::new(x, y))
            }
            Method::Fit => self.fit_or_fallback(slopes),
        }
    }

    fn fit_or_fallback(&self, slopes: &Grid<Slope>) -> Result<HeightMap> {
        let texels = slopes.len();
        let result = if texels > self.config.fit_texel_limit {
            Err(ReliefError::InvalidInput(format!(
                "{}x{} is {} texels, above the fit limit of {}",
                slopes.width(),
                slopes.height(),
                texels,
                self.config.fit_texel_limit
            )))
        } else {
            fit_height(slopes, self.config.fit_constant)
        };

        match result {
            Err(e) if self.config.fallback_to_cross_scan && can_fall_back(&e) => {
                warn!("Polynomial fit unavailable ({}), using cross-scan", e);
                cross_scan_height(slopes)
            }
            other => other,
        }
    }
}

fn can_fall_back(error: &ReliefError) -> bool {
    matches!(
        error,
        ReliefError::NumericalFailure(_) | ReliefError::InvalidInput(_)
    )
}

/// Reconstruct with the default configuration.
pub fn reconstruct_height(normals: &Grid<Normal>) -> Result<HeightMap> {
    Reconstructor::default().reconstruct(normals)
}
