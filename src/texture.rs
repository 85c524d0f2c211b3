//! Conversion between texture images and reconstruction grids.
//!
//! Normal maps are read as tangent-space RGB, each channel mapped from
//! `[0, 1]` to `[-1, 1]`. Height maps are written as 16-bit grayscale.

use crate::error::{ReliefError, Result};
use crate::types::{Grid, HeightMap, Normal};
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// 16-bit grayscale image.
pub type Luma16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Decode one RGB texel into a unit normal.
///
/// A texel that decodes to a zero vector (mid-grey) is treated as straight up.
pub fn decode_normal(rgb: [f32; 3]) -> Normal {
    let v = Normal::new(rgb[0] * 2.0 - 1.0, rgb[1] * 2.0 - 1.0, rgb[2] * 2.0 - 1.0);
    v.try_normalize().unwrap_or(Normal::Z)
}

/// Encode a unit normal to 8-bit RGB.
pub fn encode_normal(n: Normal) -> [u8; 3] {
    let to_byte = |c: f32| (((c.clamp(-1.0, 1.0) + 1.0) * 0.5) * 255.0).round() as u8;
    [to_byte(n.x), to_byte(n.y), to_byte(n.z)]
}

/// Decode a normal map image of any bit depth.
pub fn decode_normal_map(image: &DynamicImage) -> Grid<Normal> {
    let rgb = image.to_rgb32f();
    let (width, height) = rgb.dimensions();
    Grid::from_fn(width as usize, height as usize, |x, y| {
        decode_normal(rgb.get_pixel(x as u32, y as u32).0)
    })
}

/// Load a normal map from PNG (or any format the `image` build supports).
pub fn load_normal_map<P: AsRef<Path>>(path: P) -> Result<Grid<Normal>> {
    let image = image::open(path)?;
    Ok(decode_normal_map(&image))
}

/// Load a normal map from encoded image bytes.
pub fn load_normal_map_from_bytes(data: &[u8]) -> Result<Grid<Normal>> {
    let image = image::load_from_memory(data)?;
    Ok(decode_normal_map(&image))
}

/// Render a normal grid back into an RGB image.
pub fn encode_normal_map(normals: &Grid<Normal>) -> Result<RgbImage> {
    let (width, height) = image_dimensions(normals)?;
    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb(encode_normal(normals[(x as usize, y as usize)]))
    }))
}

/// Quantize a normalized height map to 16-bit grayscale.
pub fn height_to_luma16(heights: &HeightMap) -> Result<Luma16Image> {
    let (width, height) = image_dimensions(heights)?;
    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        let h = heights[(x as usize, y as usize)];
        let h = if h.is_finite() { h.clamp(0.0, 1.0) } else { 0.0 };
        Luma([(h * u16::MAX as f32).round() as u16])
    }))
}

/// Encode a normalized height map as 16-bit grayscale PNG bytes.
pub fn height_to_png(heights: &HeightMap) -> Result<Vec<u8>> {
    let luma = height_to_luma16(heights)?;
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma16(luma).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Write a normalized height map to a 16-bit PNG file.
pub fn save_height_map<P: AsRef<Path>>(heights: &HeightMap, path: P) -> Result<()> {
    let bytes = height_to_png(heights)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn image_dimensions<T>(grid: &Grid<T>) -> Result<(u32, u32)> {
    grid.ensure_non_empty()?;
    let width = u32::try_from(grid.width())
        .map_err(|_| ReliefError::InvalidInput(format!("width {} too large", grid.width())))?;
    let height = u32::try_from(grid.height())
        .map_err(|_| ReliefError::InvalidInput(format!("height {} too large", grid.height())))?;
    Ok((width, height))
}
