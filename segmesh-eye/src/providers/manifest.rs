//! Precomputed masks listed in a JSON manifest
//!
//! This is how an external segmentation model hands its output over:
//!
//! ```json
//! { "masks": [ { "file": "cat.png", "label": "cat", "score": 0.97, "bbox": [12, 40, 64, 48] } ] }
//! ```
//!
//! Mask files are resolved relative to the manifest. A mask PNG may either be
//! cropped to its bbox already or cover the whole input image, in which case
//! it is cropped here. Without a bbox, one is computed from the pixels at or
//! above the provider threshold.

use crate::error::VisionError;
use crate::image_io::read_mask_png;
use segmesh_core::{
    BBox, Error as CoreError, MaskGrid, MaskProvider, MaskRecord, PixelImage, ProviderConfig, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: PathBuf,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_score")]
    pub score: f32,
    /// `[x, y, width, height]` in image pixels
    #[serde(default)]
    pub bbox: Option<[u32; 4]>,
}

fn default_score() -> f32 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskManifest {
    pub masks: Vec<ManifestEntry>,
}

#[derive(Debug, Clone)]
pub struct ManifestMaskProvider {
    name: String,
    base_dir: PathBuf,
    manifest: MaskManifest,
}

impl ManifestMaskProvider {
    pub fn open(path: &Path) -> std::result::Result<Self, VisionError> {
        if !path.is_file() {
            return Err(CoreError::FileNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let manifest: MaskManifest = serde_json::from_str(&content)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(path.display().to_string(), base_dir, manifest))
    }

    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>, manifest: MaskManifest) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &MaskManifest {
        &self.manifest
    }

    fn load_entry(
        &self,
        index: usize,
        entry: &ManifestEntry,
        image: &PixelImage,
        threshold: f32,
    ) -> std::result::Result<Option<(MaskGrid, BBox)>, VisionError> {
        let grid = read_mask_png(&self.base_dir.join(&entry.file))?;
        let covers_image = grid.width() == image.width() && grid.height() == image.height();

        match entry.bbox {
            Some([x, y, w, h]) => {
                let bbox = BBox::new(x as i32, y as i32, w, h);
                if grid.width() == w as usize && grid.height() == h as usize {
                    Ok(Some((grid, bbox)))
                } else if covers_image {
                    crop(&grid, x as usize, y as usize, w as usize, h as usize)
                        .map(|g| Some((g, bbox)))
                        .ok_or_else(|| {
                            VisionError::from(CoreError::InvalidMask {
                                index,
                                reason: format!(
                                    "bbox {:?} does not fit the {}x{} image",
                                    [x, y, w, h],
                                    image.width(),
                                    image.height()
                                ),
                            })
                        })
                } else {
                    Err(CoreError::InvalidMask {
                        index,
                        reason: format!(
                            "{}x{} mask matches neither its {}x{} bbox nor the {}x{} image",
                            grid.width(),
                            grid.height(),
                            w,
                            h,
                            image.width(),
                            image.height()
                        ),
                    }
                    .into())
                }
            }
            None => {
                if !covers_image {
                    return Err(CoreError::InvalidMask {
                        index,
                        reason: "mask without bbox must cover the whole image".to_string(),
                    }
                    .into());
                }
                let Some((x, y, w, h)) = extent(&grid, threshold) else {
                    return Ok(None);
                };
                let bbox = BBox::new(x as i32, y as i32, w as u32, h as u32);
                Ok(crop(&grid, x, y, w, h).map(|g| (g, bbox)))
            }
        }
    }
}

/// Bounds `(x, y, width, height)` of the cells at or above `threshold`
fn extent(grid: &MaskGrid, threshold: f32) -> Option<(usize, usize, usize, usize)> {
    let mut min = (usize::MAX, usize::MAX);
    let mut max = (0, 0);
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            if grid.get(row, col).unwrap_or(0.0) >= threshold {
                min = (min.0.min(col), min.1.min(row));
                max = (max.0.max(col), max.1.max(row));
            }
        }
    }
    (min.0 != usize::MAX).then(|| (min.0, min.1, max.0 - min.0 + 1, max.1 - min.1 + 1))
}

fn crop(grid: &MaskGrid, x: usize, y: usize, w: usize, h: usize) -> Option<MaskGrid> {
    if w == 0 || h == 0 || x + w > grid.width() || y + h > grid.height() {
        return None;
    }
    let mut values = Vec::with_capacity(w * h);
    for row in y..y + h {
        for col in x..x + w {
            values.push(grid.get(row, col).unwrap_or(0.0));
        }
    }
    MaskGrid::new(w, h, values)
}

impl MaskProvider for ManifestMaskProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn segment(&self, image: &PixelImage, config: &ProviderConfig) -> Result<Vec<MaskRecord>> {
        let mut masks = Vec::with_capacity(self.manifest.masks.len());
        for (position, entry) in self.manifest.masks.iter().enumerate() {
            // Records keep their manifest position, so skipped entries leave gaps
            let Some((grid, bbox)) = self.load_entry(position, entry, image, config.threshold)? else {
                warn!("Skipping {}: no pixels above threshold", entry.file.display());
                continue;
            };
            let label = entry
                .label
                .clone()
                .unwrap_or_else(|| format!("mask_{}", position));
            masks.push(MaskRecord::new(position, grid, label, entry.score, bbox));
        }
        info!("Loaded {} masks from {}", masks.len(), self.name);
        Ok(masks)
    }
}
