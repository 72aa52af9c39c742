//! Mask provider implementations and lookup by model name

mod luminance;
mod manifest;

pub use luminance::LuminanceMaskProvider;
pub use manifest::{ManifestEntry, ManifestMaskProvider, MaskManifest};

use crate::error::VisionError;
use segmesh_core::MaskProvider;
use std::path::Path;

/// Resolve a model name: `luminance` (or `auto`) selects the built-in
/// fallback, a path to a `.json` manifest selects precomputed masks.
pub fn provider_for(model: &str) -> Result<Box<dyn MaskProvider>, VisionError> {
    match model.trim() {
        "" => Err(VisionError::Model("no model name given".to_string())),
        "luminance" | "auto" => Ok(Box::new(LuminanceMaskProvider::default())),
        name if name.ends_with(".json") => Ok(Box::new(ManifestMaskProvider::open(Path::new(name))?)),
        other => Err(VisionError::Model(format!(
            "unknown model '{}': expected 'luminance' or a masks .json manifest",
            other
        ))),
    }
}
