//! Scene assembly: material slots, merging and recentering

use segmesh_core::{Error, Geometry, Material, Result, SceneObject};
use tracing::{debug, info};

/// Objects placed for one run. Passed explicitly instead of living in any
/// global scene context.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give each geometry its material as a single slot. Positions are left
    /// exactly as synthesized.
    pub fn place<I>(&mut self, pairs: I) -> &[SceneObject]
    where
        I: IntoIterator<Item = (Geometry, Material)>,
    {
        let start = self.objects.len();
        for (geometry, material) in pairs {
            let name = format!("plane_{}", self.objects.len());
            self.objects.push(SceneObject::with_material(name, geometry, material));
        }
        debug!("Placed {} objects", self.objects.len() - start);
        &self.objects[start..]
    }

    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Join every placed object into one
    pub fn merge(&self, name: &str) -> Result<SceneObject> {
        let mut merged = merge(&self.objects)?;
        merged.name = name.to_string();
        Ok(merged)
    }

    pub fn into_objects(self) -> Vec<SceneObject> {
        self.objects
    }
}

/// Concatenate objects into one. Face indices of object `i` are offset by the
/// vertex count of objects `0..i`, and its slot indices by their slot count.
pub fn merge(objects: &[SceneObject]) -> Result<SceneObject> {
    if objects.is_empty() {
        return Err(Error::EmptyInput("nothing to merge".to_string()));
    }

    let vertex_total: usize = objects.iter().map(|o| o.geometry.vertex_count()).sum();
    let face_total: usize = objects.iter().map(|o| o.geometry.face_count()).sum();
    let keep_uvs = objects.iter().any(|o| o.geometry.has_uvs());

    let mut geometry = Geometry {
        positions: Vec::with_capacity(vertex_total),
        uvs: Vec::with_capacity(if keep_uvs { vertex_total } else { 0 }),
        faces: Vec::with_capacity(face_total),
    };
    let mut slots = Vec::new();
    let mut face_slots = Vec::with_capacity(face_total);

    for object in objects {
        let vertex_offset = u32::try_from(geometry.positions.len()).map_err(|_| {
            Error::Configuration("merged geometry exceeds u32 vertex indices".to_string())
        })?;
        let slot_offset = slots.len();

        geometry.positions.extend_from_slice(&object.geometry.positions);
        if keep_uvs {
            if object.geometry.has_uvs() {
                geometry.uvs.extend_from_slice(&object.geometry.uvs);
            } else {
                geometry
                    .uvs
                    .extend(std::iter::repeat([0.0, 0.0]).take(object.geometry.vertex_count()));
            }
        }
        geometry.faces.extend(
            object
                .geometry
                .faces
                .iter()
                .map(|face| face.iter().map(|&v| v + vertex_offset).collect::<Vec<u32>>()),
        );
        slots.extend(object.slots.iter().cloned());
        face_slots.extend(object.face_slots.iter().map(|&s| s + slot_offset));
    }

    info!(
        "Merged {} objects into {} vertices, {} faces, {} material slots",
        objects.len(),
        geometry.vertex_count(),
        geometry.face_count(),
        slots.len()
    );

    Ok(SceneObject {
        name: "model".to_string(),
        geometry,
        slots,
        face_slots,
    })
}

/// Centroid of the surface, weighting each face by its area. Falls back to
/// the vertex average when the surface has no area; `None` for no vertices.
pub fn area_weighted_centroid(geometry: &Geometry) -> Option<[f32; 3]> {
    if geometry.positions.is_empty() {
        return None;
    }

    let mut total_area = 0.0f64;
    let mut weighted = [0.0f64; 3];
    for face in 0..geometry.face_count() {
        for tri in geometry.face_triangles(face) {
            let [a, b, c] = tri.map(|v| geometry.positions[v as usize]);
            let area = f64::from(triangle_area(a, b, c));
            total_area += area;
            for axis in 0..3 {
                weighted[axis] += area * f64::from(a[axis] + b[axis] + c[axis]) / 3.0;
            }
        }
    }

    if total_area > f64::from(f32::EPSILON) {
        return Some(weighted.map(|w| (w / total_area) as f32));
    }

    let n = geometry.positions.len() as f64;
    let mut sum = [0.0f64; 3];
    for p in &geometry.positions {
        for axis in 0..3 {
            sum[axis] += f64::from(p[axis]);
        }
    }
    Some(sum.map(|s| (s / n) as f32))
}

fn triangle_area(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> f32 {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let cross = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt() * 0.5
}

/// Translate so the area-weighted centroid sits at the origin
pub fn recenter(mut geometry: Geometry) -> Geometry {
    if let Some(c) = area_weighted_centroid(&geometry) {
        geometry.translate([-c[0], -c[1], -c[2]]);
        debug!("Recentered geometry by ({:.3}, {:.3}, {:.3})", -c[0], -c[1], -c[2]);
    }
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmesh_core::{MaterialId, OpacitySource, Rgba};

    fn material(id: u32) -> Material {
        Material {
            id: MaterialId(id),
            name: format!("_material_{}", id),
            base_color: Rgba::WHITE,
            opacity_source: OpacitySource::Constant(1.0),
            mix_factor: 0.5,
        }
    }

    fn quad(x: f32) -> Geometry {
        Geometry::new(
            vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x + 1.0, 1.0, 0.0], [x, 1.0, 0.0]],
            vec![vec![0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_place_assigns_one_slot_each() {
        let mut scene = Scene::new();
        let placed = scene.place(vec![(quad(0.0), material(1)), (quad(5.0), material(2))]);
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].name, "plane_1");
        assert_eq!(placed[1].slots[0].id, MaterialId(2));
        assert_eq!(placed[1].geometry.positions[0], [5.0, 0.0, 0.0]);
        assert_eq!(placed[1].face_slots, vec![0]);
    }

    #[test]
    fn test_merge_offsets_indices_and_slots() {
        let mut scene = Scene::new();
        scene.place(vec![(quad(0.0), material(1)), (quad(2.0), material(2))]);
        let merged = scene.merge("model").unwrap();
        assert_eq!(merged.geometry.vertex_count(), 8);
        assert_eq!(merged.geometry.faces[1], vec![4, 5, 6, 7]);
        assert_eq!(merged.face_slots, vec![0, 1]);
        assert_eq!(merged.slot_count(), 2);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_merge_empty_fails() {
        assert!(matches!(merge(&[]), Err(Error::EmptyInput(_))));
        assert!(Scene::new().merge("model").is_err());
    }

    #[test]
    fn test_merge_is_associative() {
        let a = SceneObject::with_material("a", quad(0.0), material(1));
        let b = SceneObject::with_material("b", quad(2.0), material(2));
        let c = SceneObject::with_material("c", quad(4.0), material(3));

        let flat = merge(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let ab = merge(&[a, b]).unwrap();
        let nested = merge(&[ab, c]).unwrap();

        assert_eq!(flat.geometry, nested.geometry);
        assert_eq!(flat.face_slots, nested.face_slots);
        let ids = |o: &SceneObject| o.slots.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&flat), ids(&nested));
    }

    #[test]
    fn test_centroid_is_area_weighted() {
        // A large quad next to a densely tessellated small one: the vertex
        // average is pulled toward the dense part, the area centroid is not.
        let mut geometry = Geometry::new(
            vec![[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 4.0, 0.0], [0.0, 4.0, 0.0]],
            vec![vec![0, 1, 2, 3]],
        );
        let base = geometry.positions.len() as u32;
        for k in 0..10 {
            let x = 10.0 + k as f32 * 0.01;
            geometry.positions.push([x, 0.0, 0.0]);
        }
        geometry.faces.push(vec![base, base + 1, base + 2]);
        let centroid = area_weighted_centroid(&geometry).unwrap();
        assert!((centroid[0] - 2.0).abs() < 1e-3);
        assert!((centroid[1] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_recenter_moves_centroid_to_origin() {
        let centered = recenter(quad(3.0));
        let c = area_weighted_centroid(&centered).unwrap();
        for axis in c {
            assert!(axis.abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_centroid_uses_vertex_average() {
        let geometry = Geometry::new(vec![[1.0, 1.0, 1.0], [3.0, 3.0, 3.0]], vec![]);
        assert_eq!(area_weighted_centroid(&geometry), Some([2.0, 2.0, 2.0]));
        assert_eq!(area_weighted_centroid(&Geometry::default()), None);
    }
}
