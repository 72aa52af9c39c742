//! Seams to the segmentation model.
//!
//! The model itself is opaque: implementations live in `segmesh-eye`, and the
//! mesh pipeline only sees these traits.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::types::{MaskRecord, Prompt};

/// Decoded RGB image handed to a [`MaskProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl PixelImage {
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 3]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Provider("image has zero width or height".to_string()));
        }
        if width.checked_mul(height) != Some(pixels.len()) {
            return Err(Error::Provider(format!(
                "image buffer holds {} pixels, expected {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }
}

/// Produces mask records for an image
pub trait MaskProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run one segmentation pass. Records are returned in emission order with
    /// `index` set to their position.
    fn segment(&self, image: &PixelImage, config: &ProviderConfig) -> Result<Vec<MaskRecord>>;
}

/// Per-face membership predicted for one prompt
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMask {
    /// Membership probability per source face index
    pub values: Vec<f32>,
    pub score: f32,
}

impl FaceMask {
    pub fn from_membership(members: &[bool], score: f32) -> Self {
        Self {
            values: members.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect(),
            score,
        }
    }

    /// Faces whose probability reaches `threshold`
    pub fn threshold(&self, threshold: f32) -> Vec<bool> {
        self.values.iter().map(|&v| v >= threshold).collect()
    }
}

/// Predicts which faces of an existing mesh a prompt selects
pub trait FaceMaskProvider: Send + Sync {
    fn predict(&self, geometry: &Geometry, prompt: &Prompt, config: &ProviderConfig) -> Result<FaceMask>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_image_validation() {
        assert!(PixelImage::new(0, 1, vec![]).is_err());
        assert!(PixelImage::new(2, 1, vec![[0, 0, 0]]).is_err());
        let image = PixelImage::new(2, 1, vec![[1, 2, 3], [4, 5, 6]]).unwrap();
        assert_eq!(image.pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_face_mask_threshold() {
        let mask = FaceMask {
            values: vec![0.2, 0.5, 0.9],
            score: 1.0,
        };
        assert_eq!(mask.threshold(0.5), vec![false, true, true]);
        let from_bools = FaceMask::from_membership(&[true, false], 0.8);
        assert_eq!(from_bools.values, vec![1.0, 0.0]);
    }
}
