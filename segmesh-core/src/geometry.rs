//! Polygon geometry and scene objects with material slots

use crate::error::{Error, Result};
use crate::material::Material;

/// Vertices and polygon faces. Faces index into `positions`; `uvs` is either
/// empty or parallel to `positions`.
///
/// Uvs are in image space: `v = 0` is the first pixel row. World y grows
/// upward, so OBJ export writes `1 - v`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Vec<u32>>,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            uvs: Vec::new(),
            faces,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty() && self.uvs.len() == self.positions.len()
    }

    /// Check that every face has at least three corners and only references
    /// existing vertices.
    pub fn validate(&self) -> Result<()> {
        if !self.uvs.is_empty() && self.uvs.len() != self.positions.len() {
            return Err(Error::Configuration(format!(
                "uv count {} does not match vertex count {}",
                self.uvs.len(),
                self.positions.len()
            )));
        }
        for (face_idx, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(Error::Configuration(format!(
                    "face {} has only {} vertices",
                    face_idx,
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&v| v as usize >= self.positions.len()) {
                return Err(Error::Configuration(format!(
                    "face {} references vertex {} of {}",
                    face_idx,
                    bad,
                    self.positions.len()
                )));
            }
        }
        Ok(())
    }

    pub fn translate(&mut self, offset: [f32; 3]) {
        for p in &mut self.positions {
            p[0] += offset[0];
            p[1] += offset[1];
            p[2] += offset[2];
        }
    }

    pub fn max_z(&self) -> Option<f32> {
        self.positions.iter().map(|p| p[2]).reduce(f32::max)
    }

    /// Average of the face's corner positions
    pub fn face_center(&self, face: usize) -> Option<[f32; 3]> {
        let corners = self.faces.get(face)?;
        if corners.is_empty() {
            return None;
        }
        let mut sum = [0.0f32; 3];
        for &v in corners {
            let p = self.positions.get(v as usize)?;
            sum[0] += p[0];
            sum[1] += p[1];
            sum[2] += p[2];
        }
        let n = corners.len() as f32;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    /// Triangles of a fan over the face, as vertex index triples
    pub fn face_triangles(&self, face: usize) -> impl Iterator<Item = [u32; 3]> + '_ {
        let corners = self.faces.get(face).map(Vec::as_slice).unwrap_or(&[]);
        (1..corners.len().saturating_sub(1)).map(move |i| [corners[0], corners[i], corners[i + 1]])
    }

    fn triangle(&self, tri: [u32; 3]) -> [[f32; 3]; 3] {
        [
            self.positions[tri[0] as usize],
            self.positions[tri[1] as usize],
            self.positions[tri[2] as usize],
        ]
    }

    /// Surface area of a face, summed over its fan triangles
    pub fn face_area(&self, face: usize) -> f32 {
        self.face_triangles(face)
            .map(|tri| length(triangle_normal(self.triangle(tri))) * 0.5)
            .sum()
    }

    /// Area-weighted vertex normals for smooth shading. Vertices not used by
    /// any face, or only by degenerate faces, get `+Z`.
    pub fn smooth_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; self.positions.len()];
        for face in 0..self.faces.len() {
            for tri in self.face_triangles(face) {
                // Unnormalized cross product already scales with area
                let n = triangle_normal(self.triangle(tri));
                for &v in &tri {
                    let acc = &mut normals[v as usize];
                    acc[0] += n[0];
                    acc[1] += n[1];
                    acc[2] += n[2];
                }
            }
        }
        normals
            .into_iter()
            .map(|n| {
                let len = length(n);
                if len > f32::EPSILON {
                    [n[0] / len, n[1] / len, n[2] / len]
                } else {
                    [0.0, 0.0, 1.0]
                }
            })
            .collect()
    }
}

pub(crate) fn triangle_normal([a, b, c]: [[f32; 3]; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

fn length(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Geometry together with its material slot table. `face_slots[f]` is the
/// index into `slots` used by face `f`.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Geometry,
    pub slots: Vec<Material>,
    pub face_slots: Vec<usize>,
}

impl SceneObject {
    /// Single-slot object: every face uses `material`
    pub fn with_material(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        let face_slots = vec![0; geometry.face_count()];
        Self {
            name: name.into(),
            geometry,
            slots: vec![material],
            face_slots,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.face_slots.len() != self.geometry.face_count() {
            return Err(Error::Configuration(format!(
                "object '{}' has {} face slots for {} faces",
                self.name,
                self.face_slots.len(),
                self.geometry.face_count()
            )));
        }
        if let Some(&slot) = self.face_slots.iter().find(|&&s| s >= self.slots.len()) {
            return Err(Error::Configuration(format!(
                "object '{}' references slot {} of {}",
                self.name,
                slot,
                self.slots.len()
            )));
        }
        Ok(())
    }

    /// Material bound to a face through the slot table
    pub fn face_material(&self, face: usize) -> Option<&Material> {
        self.face_slots.get(face).and_then(|&slot| self.slots.get(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Geometry {
        Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![vec![0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_face_area_of_unit_quad() {
        let quad = unit_quad();
        assert!((quad.face_area(0) - 1.0).abs() < 1e-6);
        assert_eq!(quad.face_area(5), 0.0);
    }

    #[test]
    fn test_face_center() {
        let quad = unit_quad();
        assert_eq!(quad.face_center(0), Some([0.5, 0.5, 0.0]));
        assert_eq!(quad.face_center(1), None);
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut quad = unit_quad();
        assert!(quad.validate().is_ok());
        quad.faces.push(vec![0, 1, 9]);
        assert!(quad.validate().is_err());
    }

    #[test]
    fn test_smooth_normals_flat_quad_point_up() {
        let quad = unit_quad();
        for n in quad.smooth_normals() {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_translate_and_max_z() {
        let mut quad = unit_quad();
        quad.translate([1.0, 2.0, 3.0]);
        assert_eq!(quad.positions[0], [1.0, 2.0, 3.0]);
        assert_eq!(quad.max_z(), Some(3.0));
        assert_eq!(Geometry::default().max_z(), None);
    }
}
