//! Material construction for masks and face groups

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use segmesh_core::{ColorPolicy, MaskRecord, Material, MaterialConfig, MaterialId, OpacitySource, Rgba};
use std::sync::Arc;

/// Builds one material per mask or prompt.
///
/// Ids are `index + 1`; id `0` is reserved for the background material. A
/// builder is shared across worker threads, so random colours come from a
/// generator seeded per index rather than from shared state.
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    color_policy: ColorPolicy,
    seed: u64,
    mix_factor: f32,
}

impl MaterialBuilder {
    pub fn new(config: &MaterialConfig) -> Self {
        Self {
            color_policy: config.color_policy,
            seed: config.seed.unwrap_or_else(rand::random),
            mix_factor: config.mix_factor,
        }
    }

    pub fn material_id(index: usize) -> MaterialId {
        MaterialId(index as u32 + 1)
    }

    pub fn material_name(index: usize) -> String {
        format!("_material_{}", index)
    }

    /// Texture-backed material reading opacity from the mask's pixels
    pub fn for_mask(&self, mask: &MaskRecord, color: Option<Rgba>) -> Material {
        Material {
            id: Self::material_id(mask.index),
            name: Self::material_name(mask.index),
            base_color: color.unwrap_or_else(|| self.pick_color(mask.index, &mask.label)),
            opacity_source: OpacitySource::Texture(Arc::clone(&mask.pixels)),
            mix_factor: self.mix_factor,
        }
    }

    /// Face-attribute material over an existing mesh, one value per face
    pub fn for_faces(&self, index: usize, label: &str, values: Vec<f32>, color: Option<Rgba>) -> Material {
        Material {
            id: Self::material_id(index),
            name: Self::material_name(index),
            base_color: color.unwrap_or_else(|| self.pick_color(index, label)),
            opacity_source: OpacitySource::FaceAttribute(Arc::new(values)),
            mix_factor: self.mix_factor,
        }
    }

    fn pick_color(&self, index: usize, label: &str) -> Rgba {
        match self.color_policy {
            ColorPolicy::Label => Rgba::from_label(label),
            ColorPolicy::Random => {
                let mut rng = StdRng::seed_from_u64(self.seed ^ index as u64);
                Rgba::rgb(rng.gen(), rng.gen(), rng.gen())
            }
        }
    }
}
