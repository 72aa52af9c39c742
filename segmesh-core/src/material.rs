//! Shaded-surface descriptions bound to geometry or face groups

use crate::geometry::Geometry;
use crate::types::{MaskGrid, Rgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// Reserved for faces no prompt claimed
    pub const BACKGROUND: MaterialId = MaterialId(0);
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a material reads its opacity from
#[derive(Debug, Clone)]
pub enum OpacitySource {
    /// Mask pixels laid over an image plane, addressed by the geometry's uvs
    Texture(Arc<MaskGrid>),
    /// One value per face of an existing mesh
    FaceAttribute(Arc<Vec<f32>>),
    /// Same opacity on every face
    Constant(f32),
}

impl OpacitySource {
    pub fn kind(&self) -> &'static str {
        match self {
            OpacitySource::Texture(_) => "texture",
            OpacitySource::FaceAttribute(_) => "face_attribute",
            OpacitySource::Constant(_) => "constant",
        }
    }

    pub fn mean(&self) -> f32 {
        match self {
            OpacitySource::Texture(grid) => grid.mean(),
            OpacitySource::FaceAttribute(values) if values.is_empty() => 0.0,
            OpacitySource::FaceAttribute(values) => values.iter().sum::<f32>() / values.len() as f32,
            OpacitySource::Constant(v) => *v,
        }
    }

    /// Opacity of `face` on `geometry`, whichever backing is in use.
    ///
    /// Texture lookups average the face's corner uvs and sample the grid cell
    /// under that point; geometry without uvs falls back to the mask mean.
    pub fn face_opacity(&self, geometry: &Geometry, face: usize) -> f32 {
        match self {
            OpacitySource::Texture(grid) => {
                let Some(corners) = geometry.faces.get(face) else {
                    return 0.0;
                };
                if !geometry.has_uvs() || corners.is_empty() {
                    return grid.mean();
                }
                let (mut u, mut v) = (0.0f32, 0.0f32);
                for &c in corners {
                    let uv = geometry.uvs[c as usize];
                    u += uv[0];
                    v += uv[1];
                }
                u /= corners.len() as f32;
                v /= corners.len() as f32;
                let row = (v * grid.height() as f32).floor() as i64;
                let col = (u * grid.width() as f32).floor() as i64;
                grid.sample_clamped(row, col)
            }
            OpacitySource::FaceAttribute(values) => values.get(face).copied().unwrap_or(0.0),
            OpacitySource::Constant(v) => *v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub base_color: Rgba,
    pub opacity_source: OpacitySource,
    /// Blend between the base shader and the mask channel
    pub mix_factor: f32,
}

impl Material {
    pub fn background() -> Self {
        Self {
            id: MaterialId::BACKGROUND,
            name: "_material_background".to_string(),
            base_color: Rgba::BACKGROUND,
            opacity_source: OpacitySource::Constant(1.0),
            mix_factor: 0.0,
        }
    }

    pub fn face_opacity(&self, geometry: &Geometry, face: usize) -> f32 {
        self.opacity_source.face_opacity(geometry, face)
    }

    pub fn mean_opacity(&self) -> f32 {
        self.opacity_source.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_face_opacity_uses_uvs() {
        let grid = MaskGrid::from_rows(&[vec![0.0, 1.0]]).unwrap();
        let mut geometry = Geometry::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2], vec![1, 3, 4]],
        );
        geometry.uvs = vec![[0.0, 0.0], [0.5, 0.0], [0.5, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let source = OpacitySource::Texture(Arc::new(grid));
        assert_eq!(source.face_opacity(&geometry, 0), 0.0);
        assert_eq!(source.face_opacity(&geometry, 1), 1.0);
        assert_eq!(source.face_opacity(&geometry, 2), 0.0);
    }

    #[test]
    fn test_texture_without_uvs_uses_mean() {
        let grid = MaskGrid::from_rows(&[vec![0.0, 1.0]]).unwrap();
        let geometry = Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            vec![vec![0, 1, 2]],
        );
        let source = OpacitySource::Texture(Arc::new(grid));
        assert_eq!(source.face_opacity(&geometry, 0), 0.5);
    }

    #[test]
    fn test_face_attribute_lookup() {
        let geometry = Geometry::default();
        let source = OpacitySource::FaceAttribute(Arc::new(vec![1.0, 0.0, 1.0]));
        assert_eq!(source.face_opacity(&geometry, 2), 1.0);
        assert_eq!(source.face_opacity(&geometry, 9), 0.0);
        assert!((source.mean() - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(source.kind(), "face_attribute");
    }

    #[test]
    fn test_background_material() {
        let bg = Material::background();
        assert_eq!(bg.id, MaterialId::BACKGROUND);
        assert_eq!(bg.mean_opacity(), 1.0);
    }
}
