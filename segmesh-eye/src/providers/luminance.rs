//! Fallback provider: connected regions of similar brightness

use segmesh_core::{BBox, MaskGrid, MaskProvider, MaskRecord, PixelImage, ProviderConfig, Result};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Splits the image into `num_classes` luminance bands and reports the
/// largest 4-connected regions as masks. The score is the fraction of the
/// region's bounding box it fills.
#[derive(Debug, Clone)]
pub struct LuminanceMaskProvider {
    min_pixels: usize,
}

impl Default for LuminanceMaskProvider {
    fn default() -> Self {
        Self { min_pixels: 16 }
    }
}

struct Region {
    band: usize,
    pixels: Vec<(usize, usize)>,
    min: (usize, usize),
    max: (usize, usize),
}

impl LuminanceMaskProvider {
    /// Regions smaller than `min_pixels` are ignored
    pub fn with_min_pixels(min_pixels: usize) -> Self {
        Self {
            min_pixels: min_pixels.max(1),
        }
    }

    fn bands(image: &PixelImage, bands: usize) -> Vec<usize> {
        image
            .pixels()
            .iter()
            .map(|&[r, g, b]| {
                let lum = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0;
                ((lum * bands as f32) as usize).min(bands - 1)
            })
            .collect()
    }

    fn regions(image: &PixelImage, band_of: &[usize]) -> Vec<Region> {
        let (w, h) = (image.width(), image.height());
        let mut visited = vec![false; w * h];
        let mut regions = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..w * h {
            if visited[start] {
                continue;
            }
            let band = band_of[start];
            visited[start] = true;
            queue.push_back(start);

            let mut region = Region {
                band,
                pixels: Vec::new(),
                min: (usize::MAX, usize::MAX),
                max: (0, 0),
            };
            while let Some(idx) = queue.pop_front() {
                let (x, y) = (idx % w, idx / w);
                region.pixels.push((x, y));
                region.min = (region.min.0.min(x), region.min.1.min(y));
                region.max = (region.max.0.max(x), region.max.1.max(y));

                let mut visit = |n: usize| {
                    if !visited[n] && band_of[n] == band {
                        visited[n] = true;
                        queue.push_back(n);
                    }
                };
                if x > 0 {
                    visit(idx - 1);
                }
                if x + 1 < w {
                    visit(idx + 1);
                }
                if y > 0 {
                    visit(idx - w);
                }
                if y + 1 < h {
                    visit(idx + w);
                }
            }
            regions.push(region);
        }
        regions
    }
}

impl MaskProvider for LuminanceMaskProvider {
    fn name(&self) -> &str {
        "luminance"
    }

    fn segment(&self, image: &PixelImage, config: &ProviderConfig) -> Result<Vec<MaskRecord>> {
        let bands = config.num_classes.max(1);
        let band_of = Self::bands(image, bands);
        let mut regions = Self::regions(image, &band_of);
        let found = regions.len();

        regions.retain(|r| r.pixels.len() >= self.min_pixels);
        // Largest first; regions are discovered in scan order, so the stable
        // sort keeps ties deterministic.
        regions.sort_by(|a, b| b.pixels.len().cmp(&a.pixels.len()));
        regions.truncate(config.num_classes);
        debug!(
            "{} regions found, {} kept (min {} pixels)",
            found,
            regions.len(),
            self.min_pixels
        );

        let masks: Vec<MaskRecord> = regions
            .into_iter()
            .enumerate()
            .map(|(index, region)| {
                let width = region.max.0 - region.min.0 + 1;
                let height = region.max.1 - region.min.1 + 1;
                let mut values = vec![0.0; width * height];
                for &(x, y) in &region.pixels {
                    values[(y - region.min.1) * width + (x - region.min.0)] = 1.0;
                }
                let grid = MaskGrid::new(width, height, values)
                    .unwrap_or_else(|| MaskGrid::filled(width, height, 0.0));
                let score = region.pixels.len() as f32 / (width * height) as f32;
                MaskRecord::new(
                    index,
                    grid,
                    format!("band_{}", region.band),
                    score,
                    BBox::new(region.min.0 as i32, region.min.1 as i32, width as u32, height as u32),
                )
            })
            .collect();

        info!("Luminance provider produced {} masks", masks.len());
        Ok(masks)
    }
}
