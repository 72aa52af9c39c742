// Configuration for the segmentation-to-mesh pipeline

use crate::error::{Error, Result};
use crate::types::Prompt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// How prompts are supplied to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    /// Segment everything without prompts
    Auto,
    Point,
    Box,
}

impl PromptType {
    /// Whether prompts of this shape are consumed. `Auto` takes every prompt.
    pub fn accepts(&self, prompt: &Prompt) -> bool {
        match (self, prompt) {
            (PromptType::Auto, _) => true,
            (PromptType::Point, Prompt::Point { .. }) => true,
            (PromptType::Box, Prompt::Box { .. }) => true,
            _ => false,
        }
    }
}

/// Settings passed through to the mask provider. Only `threshold` and
/// `confidence` are read by the pipeline itself; the sampling counts are
/// interpreted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model_variant: String,
    pub prompt_type: PromptType,
    /// Binarization threshold for mask values
    pub threshold: f32,
    /// Minimum score the model should report for a mask
    pub confidence: f32,
    pub num_classes: usize,
    pub num_samples_per_class: usize,
    pub num_classes_per_prompt: usize,
    pub num_samples_per_prompt: usize,
    pub num_iterations_per_prompt: usize,
    pub num_proposals_per_prompt: usize,
    pub num_refinements_per_prompt: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model_variant: "luminance".to_string(),
            prompt_type: PromptType::Auto,
            threshold: 0.5,
            confidence: 0.9,
            num_classes: 10,
            num_samples_per_class: 10,
            num_classes_per_prompt: 5,
            num_samples_per_prompt: 20,
            num_iterations_per_prompt: 5,
            num_proposals_per_prompt: 3,
            num_refinements_per_prompt: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Masks scoring below this are dropped (inclusive lower bound)
    pub confidence_threshold: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }
}

/// Vertex lattice used when turning a mask into a height-mapped plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridResolution {
    /// One vertex per pixel corner: `(W + 1) * (H + 1)` vertices
    PerPixel,
    /// Fixed number of cells regardless of mask size
    Fixed { columns: usize, rows: usize },
}

impl GridResolution {
    /// Cell counts `(columns, rows)` for a `width` x `height` mask
    pub fn cells(&self, width: usize, height: usize) -> (usize, usize) {
        match *self {
            GridResolution::PerPixel => (width, height),
            GridResolution::Fixed { columns, rows } => (columns.max(1), rows.max(1)),
        }
    }

    pub fn vertex_count(&self, width: usize, height: usize) -> usize {
        let (columns, rows) = self.cells(width, height);
        (columns + 1) * (rows + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub extrude_scale: f32,
    pub resolution: GridResolution,
    /// Join all synthesized planes into one model
    pub merge: bool,
    /// Move the merged model's area-weighted centroid to the origin
    pub recenter: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            extrude_scale: 10.0,
            resolution: GridResolution::PerPixel,
            merge: true,
            recenter: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Colour hashed from the mask label
    Label,
    /// Seeded random colour per mask
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub color_policy: ColorPolicy,
    pub seed: Option<u64>,
    pub mix_factor: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            color_policy: ColorPolicy::Label,
            seed: None,
            mix_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub write_mask_images: bool,
    pub write_materials: bool,
    pub write_model: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_mask_images: true,
            write_materials: true,
            write_model: true,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmeshConfig {
    pub log_level: Option<String>,
    pub provider: ProviderConfig,
    pub filter: FilterConfig,
    pub geometry: GeometryConfig,
    pub material: MaterialConfig,
    pub output: OutputConfig,
}

impl SegmeshConfig {
    /// Load configuration from a JSON or TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text, trying JSON first and then TOML
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = serde_json::from_str::<SegmeshConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<SegmeshConfig>(content)
            .map_err(|e| Error::Configuration(format!("not valid JSON or TOML: {}", e)))
    }

    /// Apply `SEGMESH_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = lookup("SEGMESH_LOG_LEVEL") {
            self.log_level = Some(level);
        }

        if let Some(scale) = lookup("SEGMESH_EXTRUDE_SCALE") {
            self.geometry.extrude_scale = scale.parse().map_err(|_| {
                Error::Configuration(format!("SEGMESH_EXTRUDE_SCALE is not a number: {}", scale))
            })?;
        }

        if let Some(threshold) = lookup("SEGMESH_CONFIDENCE_THRESHOLD") {
            self.filter.confidence_threshold = threshold.parse().map_err(|_| {
                Error::Configuration(format!(
                    "SEGMESH_CONFIDENCE_THRESHOLD is not a number: {}",
                    threshold
                ))
            })?;
        }

        if let Some(seed) = lookup("SEGMESH_SEED") {
            let seed = seed.parse().map_err(|_| {
                Error::Configuration(format!("SEGMESH_SEED is not an unsigned integer: {}", seed))
            })?;
            self.material.seed = Some(seed);
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        };

        unit("provider.threshold", self.provider.threshold)?;
        unit("provider.confidence", self.provider.confidence)?;
        unit("filter.confidence_threshold", self.filter.confidence_threshold)?;
        unit("material.mix_factor", self.material.mix_factor)?;

        if !self.geometry.extrude_scale.is_finite() {
            return Err(Error::Configuration(
                "geometry.extrude_scale must be finite".to_string(),
            ));
        }

        if let GridResolution::Fixed { columns, rows } = self.geometry.resolution {
            if columns == 0 || rows == 0 {
                return Err(Error::Configuration(
                    "geometry.resolution needs at least one column and one row".to_string(),
                ));
            }
        }

        if self.provider.num_classes == 0 {
            return Err(Error::Configuration(
                "provider.num_classes must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = SegmeshConfig::default();
        assert_eq!(config.provider.threshold, 0.5);
        assert_eq!(config.provider.confidence, 0.9);
        assert_eq!(config.provider.num_classes, 10);
        assert_eq!(config.filter.confidence_threshold, 0.5);
        assert_eq!(config.geometry.extrude_scale, 10.0);
        assert_eq!(config.geometry.resolution, GridResolution::PerPixel);
        assert_eq!(config.material.color_policy, ColorPolicy::Label);
        assert!(config.output.write_model);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = SegmeshConfig::from_str(
            r#"{"geometry": {"extrude_scale": 2.5}, "filter": {"confidence_threshold": 0.7}}"#,
        )
        .unwrap();
        assert_eq!(config.geometry.extrude_scale, 2.5);
        assert_eq!(config.filter.confidence_threshold, 0.7);
        assert!(config.geometry.merge);
    }

    #[test]
    fn test_config_from_toml() {
        let config = SegmeshConfig::from_str(
            "[material]\ncolor_policy = \"random\"\nseed = 7\n\n[geometry]\nresolution = { fixed = { columns = 4, rows = 2 } }\n",
        )
        .unwrap();
        assert_eq!(config.material.color_policy, ColorPolicy::Random);
        assert_eq!(config.material.seed, Some(7));
        assert_eq!(
            config.geometry.resolution,
            GridResolution::Fixed { columns: 4, rows: 2 }
        );
    }

    #[test]
    fn test_prompt_type_accepts() {
        let point = Prompt::Point { x: 1.0, y: 2.0 };
        let boxed = Prompt::boxed(0.0, 0.0, 1.0, 1.0);
        assert!(PromptType::Auto.accepts(&point) && PromptType::Auto.accepts(&boxed));
        assert!(PromptType::Point.accepts(&point));
        assert!(!PromptType::Point.accepts(&boxed));
        assert!(PromptType::Box.accepts(&boxed));
    }

    #[test]
    fn test_config_rejects_garbage() {
        assert!(SegmeshConfig::from_str("not = [valid").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SegmeshConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(SegmeshConfig::from_str(&text).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SEGMESH_EXTRUDE_SCALE", "4"),
            ("SEGMESH_SEED", "99"),
            ("SEGMESH_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();
        let mut config = SegmeshConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.geometry.extrude_scale, 4.0);
        assert_eq!(config.material.seed, Some(99));
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let mut config = SegmeshConfig::default();
        let bad = config.apply_overrides(|k| {
            (k == "SEGMESH_CONFIDENCE_THRESHOLD").then(|| "high".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_validation_bounds() {
        let mut config = SegmeshConfig::default();
        config.filter.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = SegmeshConfig::default();
        config.geometry.resolution = GridResolution::Fixed { columns: 0, rows: 3 };
        assert!(config.validate().is_err());

        let mut config = SegmeshConfig::default();
        config.geometry.extrude_scale = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grid_resolution_counts() {
        assert_eq!(GridResolution::PerPixel.vertex_count(10, 10), 121);
        assert_eq!(
            GridResolution::Fixed { columns: 1, rows: 1 }.vertex_count(10, 10),
            4
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = SegmeshConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segmesh.toml");
        fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let config = SegmeshConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("warn"));
    }
}
