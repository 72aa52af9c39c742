//! Wavefront OBJ/MTL and JSON output, OBJ input

use crate::segmenter::FaceGroupAssignment;
use segmesh_core::{Error, Geometry, Material, MaterialId, OpacitySource, Result, Rgba, SceneObject};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used for the mask image of mask `index`
pub fn mask_image_file_name(index: usize) -> String {
    format!("SAM_input_{}.png", index)
}

/// Mask image backing a texture material, if any. Material ids are
/// `mask index + 1`.
pub fn texture_file_name(material: &Material) -> Option<String> {
    match material.opacity_source {
        OpacitySource::Texture(_) if material.id != MaterialId::BACKGROUND => {
            Some(mask_image_file_name(material.id.0 as usize - 1))
        }
        _ => None,
    }
}

/// Serializable view of a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescription {
    pub id: MaterialId,
    pub name: String,
    pub base_color: Rgba,
    /// `base_color` as `rrggbb`
    pub color_hex: String,
    pub opacity_kind: String,
    pub mean_opacity: f32,
    pub mix_factor: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_values: Option<Vec<f32>>,
}

impl From<&Material> for MaterialDescription {
    fn from(material: &Material) -> Self {
        let face_values = match &material.opacity_source {
            OpacitySource::FaceAttribute(values) => Some(values.as_ref().clone()),
            _ => None,
        };
        Self {
            id: material.id,
            name: material.name.clone(),
            base_color: material.base_color,
            color_hex: material.base_color.to_hex(),
            opacity_kind: material.opacity_source.kind().to_string(),
            mean_opacity: material.mean_opacity(),
            mix_factor: material.mix_factor,
            texture: texture_file_name(material),
            face_values,
        }
    }
}

fn io_context(path: &Path, e: std::io::Error) -> Error {
    Error::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", path.display(), e),
    ))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| Error::Serialization(e.to_string()))?;
    fs::write(path, text).map_err(|e| io_context(path, e))
}

/// Write `_material_<i>.json` for one material; returns the path written
pub fn write_material(dir: &Path, material: &Material) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", material.name));
    write_json(&path, &MaterialDescription::from(material))?;
    debug!("Wrote material {}", path.display());
    Ok(path)
}

pub fn write_assignment(path: &Path, assignment: &FaceGroupAssignment) -> Result<()> {
    write_json(path, assignment)
}

/// Write `<stem>.obj` and `<stem>.mtl` into `dir`. Faces are grouped under
/// `usemtl` by their slot; smooth vertex normals are included.
pub fn write_obj(dir: &Path, stem: &str, object: &SceneObject) -> Result<PathBuf> {
    object.validate()?;

    let mtl_name = format!("{}.mtl", stem);
    write_mtl(&dir.join(&mtl_name), &object.slots)?;

    let obj_path = dir.join(format!("{}.obj", stem));
    let file = File::create(&obj_path).map_err(|e| io_context(&obj_path, e))?;
    let mut w = BufWriter::new(file);
    write_obj_body(&mut w, &mtl_name, object).map_err(|e| io_context(&obj_path, e))?;
    w.flush().map_err(|e| io_context(&obj_path, e))?;

    info!(
        "Wrote {} ({} vertices, {} faces)",
        obj_path.display(),
        object.geometry.vertex_count(),
        object.geometry.face_count()
    );
    Ok(obj_path)
}

fn write_obj_body<W: Write>(w: &mut W, mtl_name: &str, object: &SceneObject) -> std::io::Result<()> {
    let geometry = &object.geometry;
    writeln!(w, "# segmesh")?;
    writeln!(w, "mtllib {}", mtl_name)?;
    writeln!(w, "o {}", object.name)?;

    for p in &geometry.positions {
        writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
    }
    let has_uvs = geometry.has_uvs();
    if has_uvs {
        for uv in &geometry.uvs {
            writeln!(w, "vt {} {}", uv[0], 1.0 - uv[1])?;
        }
    }
    for n in geometry.smooth_normals() {
        writeln!(w, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    writeln!(w, "s 1")?;

    let mut current_slot = None;
    for (face, corners) in geometry.faces.iter().enumerate() {
        let slot = object.face_slots[face];
        if current_slot != Some(slot) {
            writeln!(w, "usemtl {}", object.slots[slot].name)?;
            current_slot = Some(slot);
        }
        write!(w, "f")?;
        for &v in corners {
            let i = v + 1;
            if has_uvs {
                write!(w, " {}/{}/{}", i, i, i)?;
            } else {
                write!(w, " {}//{}", i, i)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_mtl(path: &Path, materials: &[Material]) -> Result<()> {
    let file = File::create(path).map_err(|e| io_context(path, e))?;
    let mut w = BufWriter::new(file);
    write_mtl_body(&mut w, materials).map_err(|e| io_context(path, e))?;
    w.flush().map_err(|e| io_context(path, e))
}

fn write_mtl_body<W: Write>(w: &mut W, materials: &[Material]) -> std::io::Result<()> {
    writeln!(w, "# segmesh")?;
    for material in materials {
        let c = material.base_color;
        writeln!(w)?;
        writeln!(w, "newmtl {}", material.name)?;
        writeln!(w, "Kd {} {} {}", c.r(), c.g(), c.b())?;
        writeln!(w, "d {}", c.a() * (1.0 - material.mix_factor * (1.0 - material.mean_opacity())))?;
        writeln!(w, "illum 2")?;
        if let Some(texture) = texture_file_name(material) {
            writeln!(w, "map_d {}", texture)?;
        }
    }
    Ok(())
}

/// Load every object of an OBJ file into one geometry, keeping polygons as
/// they are written
pub fn import_obj(path: &Path) -> Result<Geometry> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;

    let mut geometry = Geometry::default();
    let mut all_uvs = true;
    for model in &models {
        let mesh = &model.mesh;
        let offset = geometry.positions.len() as u32;
        geometry
            .positions
            .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
        if mesh.texcoords.len() / 2 == mesh.positions.len() / 3 && !mesh.texcoords.is_empty() {
            geometry
                .uvs
                .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]));
        } else {
            all_uvs = false;
        }

        let mut cursor = 0usize;
        let arities: Vec<usize> = if mesh.face_arities.is_empty() {
            vec![3; mesh.indices.len() / 3]
        } else {
            mesh.face_arities.iter().map(|&a| a as usize).collect()
        };
        for arity in arities {
            let Some(corners) = mesh.indices.get(cursor..cursor + arity) else {
                return Err(Error::Serialization(format!(
                    "{}: face data of '{}' is truncated",
                    path.display(),
                    model.name
                )));
            };
            geometry.faces.push(corners.iter().map(|&i| i + offset).collect());
            cursor += arity;
        }
    }
    if !all_uvs {
        geometry.uvs.clear();
    }

    geometry.validate()?;
    info!(
        "Loaded {} ({} vertices, {} faces)",
        path.display(),
        geometry.vertex_count(),
        geometry.face_count()
    );
    Ok(geometry)
}
