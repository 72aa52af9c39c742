//! Local face predictor for prompt-driven segmentation of existing meshes

use segmesh_core::{Error as CoreError, FaceMask, FaceMaskProvider, Geometry, Prompt, ProviderConfig, Result};
use tracing::debug;

/// Selects faces by projecting their centers onto the XY plane.
///
/// A point prompt gives each face a probability that falls off linearly to
/// zero at `radius`; a box prompt selects the faces whose center lies inside
/// it. The score is the mean probability of the selected faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionPredictor {
    radius: f32,
}

impl Default for ProjectionPredictor {
    fn default() -> Self {
        Self { radius: 1.0 }
    }
}

impl ProjectionPredictor {
    pub fn new(radius: f32) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CoreError::Configuration(format!(
                "prompt radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn membership(&self, center: [f32; 3], prompt: &Prompt) -> f32 {
        match *prompt {
            Prompt::Point { x, y } => {
                let d = ((center[0] - x).powi(2) + (center[1] - y).powi(2)).sqrt();
                (1.0 - d / self.radius).max(0.0)
            }
            Prompt::Box {
                min_x,
                min_y,
                max_x,
                max_y,
            } => {
                let inside = (min_x..=max_x).contains(&center[0]) && (min_y..=max_y).contains(&center[1]);
                if inside {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl FaceMaskProvider for ProjectionPredictor {
    fn predict(&self, geometry: &Geometry, prompt: &Prompt, config: &ProviderConfig) -> Result<FaceMask> {
        if !prompt.is_finite() {
            return Err(CoreError::Provider(format!("non-finite prompt {}", prompt)));
        }
        let values: Vec<f32> = (0..geometry.face_count())
            .map(|face| {
                geometry
                    .face_center(face)
                    .map_or(0.0, |center| self.membership(center, prompt))
            })
            .collect();

        let selected: Vec<f32> = values.iter().copied().filter(|&v| v >= config.threshold).collect();
        let score = if selected.is_empty() {
            0.0
        } else {
            selected.iter().sum::<f32>() / selected.len() as f32
        };
        debug!("Prompt {} selects {} faces (score {:.3})", prompt, selected.len(), score);
        Ok(FaceMask { values, score })
    }
}
