//! Height-mapped plane synthesis from a single mask

use segmesh_core::{Error, Geometry, GeometryConfig, GridResolution, MaskRecord, Result};
use tracing::debug;

/// Builds a displaced grid spanning `[-W/2, W/2] x [-H/2, H/2]` for a mask of
/// width `W` and height `H`, lifting each vertex by the mask value under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySynthesizer {
    pub extrude_scale: f32,
    pub resolution: GridResolution,
}

impl GeometrySynthesizer {
    pub fn new(extrude_scale: f32, resolution: GridResolution) -> Self {
        Self {
            extrude_scale,
            resolution,
        }
    }

    pub fn from_config(config: &GeometryConfig) -> Self {
        Self::new(config.extrude_scale, config.resolution)
    }

    pub fn synthesize(&self, mask: &MaskRecord) -> Result<Geometry> {
        let grid = &mask.pixels;
        let (width, height) = (grid.width(), grid.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidMask {
                index: mask.index,
                reason: format!("mask grid is {}x{}", width, height),
            });
        }
        if mask.bbox.width as usize != width || mask.bbox.height as usize != height {
            return Err(Error::InvalidMask {
                index: mask.index,
                reason: format!(
                    "mask grid is {}x{} but bbox declares {}x{}",
                    width, height, mask.bbox.width, mask.bbox.height
                ),
            });
        }

        let (columns, rows) = self.resolution.cells(width, height);
        let (w, h) = (width as f32, height as f32);
        let (cell_w, cell_h) = (w / columns as f32, h / rows as f32);
        let stride = columns + 1;

        let mut positions = Vec::with_capacity(stride * (rows + 1));
        let mut uvs = Vec::with_capacity(stride * (rows + 1));
        for j in 0..=rows {
            // Offsets from the grid's lower-left corner, so x + W/2 and y + H/2
            // are exact at every lattice point. World y grows upward, so the
            // top lattice row reads image row 0.
            let oy = j as f32 * cell_h;
            let image_y = h - oy;
            for i in 0..=columns {
                let ox = i as f32 * cell_w;
                let sample = grid.sample_clamped(image_y.floor() as i64, ox.floor() as i64);
                positions.push([ox - w / 2.0, oy - h / 2.0, sample * self.extrude_scale]);
                uvs.push([ox / w, image_y / h]);
            }
        }

        let mut faces = Vec::with_capacity(columns * rows);
        for j in 0..rows {
            for i in 0..columns {
                let v00 = (j * stride + i) as u32;
                let v10 = v00 + 1;
                let v01 = ((j + 1) * stride + i) as u32;
                let v11 = v01 + 1;
                faces.push(vec![v00, v10, v11, v01]);
            }
        }

        let mut geometry = Geometry {
            positions,
            uvs,
            faces,
        };
        // Image rows grow downward while world y grows upward
        geometry.translate([mask.bbox.x as f32, -(mask.bbox.y as f32), 0.0]);

        debug!(
            "Synthesized mask {} into {} vertices / {} faces",
            mask.index,
            geometry.vertex_count(),
            geometry.face_count()
        );
        Ok(geometry)
    }
}
