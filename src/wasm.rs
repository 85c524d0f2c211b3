//! WASM bindings for relief-baker.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::reconstruct::{Method, Reconstructor, ReliefConfig};
use crate::types::{cell_count, Grid, Normal, TexelPosition};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

/// Reconstruction options.
#[wasm_bindgen]
pub struct ReliefOptions {
    method: String,
    anchor_x: usize,
    anchor_y: usize,
    fit_constant: f32,
    fallback: bool,
}

#[wasm_bindgen]
impl ReliefOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ReliefOptions {
        ReliefOptions {
            method: "cross-scan".to_string(),
            anchor_x: 0,
            anchor_y: 0,
            fit_constant: 0.0,
            fallback: true,
        }
    }

    #[wasm_bindgen(setter)]
    pub fn set_method(&mut self, value: String) {
        self.method = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_anchor_x(&mut self, value: usize) {
        self.anchor_x = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_anchor_y(&mut self, value: usize) {
        self.anchor_y = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_fit_constant(&mut self, value: f32) {
        self.fit_constant = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_fallback(&mut self, value: bool) {
        self.fallback = value;
    }
}

impl Default for ReliefOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReliefOptions {
    fn to_config(&self) -> Result<ReliefConfig, JsError> {
        let anchor = TexelPosition::new(self.anchor_x, self.anchor_y);
        let method = Method::from_name(&self.method, Some(anchor))
            .ok_or_else(|| JsError::new(&format!("Unknown method: {}", self.method)))?;
        Ok(ReliefConfig::default()
            .with_method(method)
            .with_fit_constant(self.fit_constant)
            .with_fallback(self.fallback))
    }
}

/// Reconstruct heights from interleaved `xyz` normals (`width * height * 3` floats).
#[wasm_bindgen]
pub fn reconstruct_height(
    normals: &[f32],
    width: usize,
    height: usize,
    options: Option<ReliefOptions>,
) -> Result<Vec<f32>, JsError> {
    let expected = cell_count(width, height)
        .ok()
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| JsError::new(&format!("Normal map {}x{} is too large", width, height)))?;
    if normals.len() != expected {
        return Err(JsError::new(&format!(
            "Expected {} floats for a {}x{} normal map, got {}",
            expected,
            width,
            height,
            normals.len()
        )));
    }
    let cells = normals
        .chunks_exact(3)
        .map(|c| Normal::new(c[0], c[1], c[2]))
        .collect();
    let grid = Grid::from_vec(width, height, cells).map_err(|e| JsError::new(&e.to_string()))?;

    let config = options.unwrap_or_default().to_config()?;
    let heights = Reconstructor::new(config)
        .reconstruct(&grid)
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(heights.into_vec())
}

/// Reconstruct a 16-bit grayscale height PNG from normal map image bytes.
#[wasm_bindgen]
pub fn reconstruct_height_png(
    data: &[u8],
    options: Option<ReliefOptions>,
) -> Result<Vec<u8>, JsError> {
    let normals =
        crate::load_normal_map_from_bytes(data).map_err(|e| JsError::new(&e.to_string()))?;
    let config = options.unwrap_or_default().to_config()?;
    let heights = Reconstructor::new(config)
        .reconstruct(&normals)
        .map_err(|e| JsError::new(&e.to_string()))?;
    crate::height_to_png(&heights).map_err(|e| JsError::new(&e.to_string()))
}
