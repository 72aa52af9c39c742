//! Prompted segmentation of an existing mesh into material groups

use crate::material::MaterialBuilder;
use segmesh_core::{
    Error, FaceMaskProvider, Geometry, Material, MaterialId, PromptSet, ProviderConfig, Result,
    SceneObject,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Material id for every face of a mesh, indexed by face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceGroupAssignment {
    material_ids: Vec<MaterialId>,
}

impl FaceGroupAssignment {
    /// All faces start on the background material
    pub fn background(face_count: usize) -> Self {
        Self {
            material_ids: vec![MaterialId::BACKGROUND; face_count],
        }
    }

    pub fn len(&self) -> usize {
        self.material_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.material_ids.is_empty()
    }

    pub fn get(&self, face: usize) -> Option<MaterialId> {
        self.material_ids.get(face).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, MaterialId)> + '_ {
        self.material_ids.iter().copied().enumerate()
    }

    /// Faces assigned to `id`, in ascending order
    pub fn faces_of(&self, id: MaterialId) -> Vec<usize> {
        self.iter().filter(|&(_, m)| m == id).map(|(f, _)| f).collect()
    }

    /// Claim every member face not already taken by an earlier prompt.
    /// Returns how many faces were claimed.
    fn claim(&mut self, members: &[bool], id: MaterialId) -> usize {
        let mut claimed = 0;
        for (slot, &member) in self.material_ids.iter_mut().zip(members) {
            if member && *slot == MaterialId::BACKGROUND {
                *slot = id;
                claimed += 1;
            }
        }
        claimed
    }
}

/// Result of segmenting one mesh
#[derive(Debug)]
pub struct Segmentation {
    pub assignment: FaceGroupAssignment,
    /// Background material first, then one per accepted prompt in order
    pub materials: Vec<Material>,
    /// Prompts skipped as [`Error::LowConfidenceMask`]
    pub skipped: Vec<Error>,
}

impl Segmentation {
    /// Bind the assignment to `geometry` through a material slot table
    pub fn apply(&self, name: &str, geometry: Geometry) -> Result<SceneObject> {
        if geometry.face_count() != self.assignment.len() {
            return Err(Error::Configuration(format!(
                "assignment covers {} faces but mesh has {}",
                self.assignment.len(),
                geometry.face_count()
            )));
        }
        let face_slots = self
            .assignment
            .iter()
            .map(|(face, id)| {
                self.materials.iter().position(|m| m.id == id).ok_or_else(|| {
                    Error::Configuration(format!("face {} uses unknown material {}", face, id))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(SceneObject {
            name: name.to_string(),
            geometry,
            slots: self.materials.clone(),
            face_slots,
        })
    }
}

/// Assigns mesh faces to prompts, first match wins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSegmenter {
    /// Face probabilities at or above this count as members
    pub threshold: f32,
    /// Prompt masks scoring below this are skipped
    pub confidence_threshold: f32,
}

impl ModelSegmenter {
    pub fn new(threshold: f32, confidence_threshold: f32) -> Self {
        Self {
            threshold,
            confidence_threshold,
        }
    }

    /// Segment `mesh` with one predicted face mask per prompt.
    ///
    /// A face claimed by an earlier prompt is never reassigned by a later
    /// one; unclaimed faces keep the background material.
    pub fn segment(
        &self,
        mesh: Option<&Geometry>,
        prompts: &PromptSet,
        predictor: &dyn FaceMaskProvider,
        provider_config: &ProviderConfig,
        builder: &MaterialBuilder,
    ) -> Result<Segmentation> {
        let mesh = mesh.ok_or(Error::NoModelSelected)?;
        let face_count = mesh.face_count();
        info!(
            "Segmenting mesh with {} faces using {} prompts",
            face_count,
            prompts.len()
        );

        let mut assignment = FaceGroupAssignment::background(face_count);
        let mut materials = vec![Material::background()];
        let mut skipped = Vec::new();

        for (index, prompt) in prompts.iter().enumerate() {
            let mask = predictor
                .predict(mesh, prompt, provider_config)
                .map_err(|e| Error::Provider(format!("prompt {}: {}", index, e)))?;

            if mask.values.len() != face_count {
                return Err(Error::InvalidMask {
                    index,
                    reason: format!(
                        "face mask has {} values for {} faces",
                        mask.values.len(),
                        face_count
                    ),
                });
            }

            if mask.score < self.confidence_threshold {
                warn!(
                    "Skipping prompt {} ({}): score {:.3} below {:.3}",
                    index, prompt, mask.score, self.confidence_threshold
                );
                skipped.push(Error::LowConfidenceMask {
                    index,
                    score: mask.score,
                    threshold: self.confidence_threshold,
                });
                continue;
            }

            let members = mask.threshold(self.threshold);
            let id = MaterialBuilder::material_id(index);
            let claimed = assignment.claim(&members, id);
            debug!("Prompt {} claimed {} faces", index, claimed);

            let values = members.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect();
            materials.push(builder.for_faces(index, &format!("prompt_{}", index), values, None));
        }

        Ok(Segmentation {
            assignment,
            materials,
            skipped,
        })
    }
}
