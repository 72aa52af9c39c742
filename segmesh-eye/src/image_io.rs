//! Image files in and mask images out

use crate::error::VisionError;
use image::{GrayImage, RgbImage};
use segmesh_core::{Error as CoreError, MaskGrid, PixelImage};
use std::path::Path;
use tracing::debug;

/// Decode any supported image file into RGB pixels
pub fn load_image(path: &Path) -> Result<PixelImage, VisionError> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound(path.to_path_buf()).into());
    }
    let rgb = image::open(path)?.to_rgb8();
    debug!("Loaded {} ({}x{})", path.display(), rgb.width(), rgb.height());
    to_pixel_image(&rgb)
}

pub fn to_pixel_image(rgb: &RgbImage) -> Result<PixelImage, VisionError> {
    let pixels = rgb.pixels().map(|p| p.0).collect();
    Ok(PixelImage::new(
        rgb.width() as usize,
        rgb.height() as usize,
        pixels,
    )?)
}

/// Read a mask image as 8-bit luma, `255` meaning fully inside
pub fn read_mask_png(path: &Path) -> Result<MaskGrid, VisionError> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound(path.to_path_buf()).into());
    }
    let luma = image::open(path)?.to_luma8();
    let (w, h) = (luma.width() as usize, luma.height() as usize);
    MaskGrid::from_luma(w, h, luma.as_raw())
        .ok_or_else(|| VisionError::Processing(format!("{}: unreadable mask buffer", path.display())))
}

/// Write a mask as an 8-bit grayscale PNG
pub fn write_mask_png(grid: &MaskGrid, path: &Path) -> Result<(), VisionError> {
    let image = GrayImage::from_raw(grid.width() as u32, grid.height() as u32, grid.to_luma())
        .ok_or_else(|| {
            VisionError::Processing(format!(
                "mask buffer does not fit {}x{}",
                grid.width(),
                grid.height()
            ))
        })?;
    image.save(path)?;
    debug!("Wrote mask image {}", path.display());
    Ok(())
}
