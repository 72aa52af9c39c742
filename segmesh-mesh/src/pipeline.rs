//! Image to model: filter, per-mask synthesis, assembly

use crate::assembler::{self, Scene};
use crate::filter::filter_by_confidence;
use crate::material::MaterialBuilder;
use crate::synth::GeometrySynthesizer;
use rayon::prelude::*;
use segmesh_core::{
    CancellationToken, Error, Geometry, MaskProvider, MaskRecord, Material, PixelImage, Result,
    SceneObject, SegmeshConfig,
};
use tracing::{debug, info};

/// Everything produced for one mask
#[derive(Debug, Clone)]
pub struct MaskUnit {
    pub mask: MaskRecord,
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Masks that survived filtering, in provider order
    pub masks: Vec<MaskRecord>,
    /// One single-slot object per mask
    pub objects: Vec<SceneObject>,
    /// Merged model, when merging is enabled
    pub model: Option<SceneObject>,
}

pub struct MeshPipeline {
    config: SegmeshConfig,
    synthesizer: GeometrySynthesizer,
    builder: MaterialBuilder,
    cancel: CancellationToken,
}

impl MeshPipeline {
    pub fn new(config: SegmeshConfig) -> Self {
        Self::with_cancellation(config, CancellationToken::new())
    }

    pub fn with_cancellation(config: SegmeshConfig, cancel: CancellationToken) -> Self {
        let synthesizer = GeometrySynthesizer::from_config(&config.geometry);
        let builder = MaterialBuilder::new(&config.material);
        Self {
            config,
            synthesizer,
            builder,
            cancel,
        }
    }

    pub fn config(&self) -> &SegmeshConfig {
        &self.config
    }

    pub fn builder(&self) -> &MaterialBuilder {
        &self.builder
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Segment `image` with `provider` and build the scene
    pub fn run(&self, provider: &dyn MaskProvider, image: &PixelImage) -> Result<PipelineOutput> {
        info!(
            "Segmenting {}x{} image with provider '{}'",
            image.width(),
            image.height(),
            provider.name()
        );
        let masks = provider.segment(image, &self.config.provider)?;
        info!("Provider returned {} masks", masks.len());
        self.run_masks(masks)
    }

    /// Build the scene from masks that were already produced
    pub fn run_masks(&self, masks: Vec<MaskRecord>) -> Result<PipelineOutput> {
        let masks = filter_by_confidence(masks, self.config.filter.confidence_threshold);
        if masks.is_empty() {
            return Err(Error::EmptyInput(
                "no masks survived confidence filtering".to_string(),
            ));
        }

        let units = self.build_units(masks)?;

        let mut kept = Vec::with_capacity(units.len());
        let mut scene = Scene::new();
        scene.place(units.into_iter().map(|unit| {
            kept.push(unit.mask);
            (unit.geometry, unit.material)
        }));

        let model = if self.config.geometry.merge {
            let mut model = scene.merge("model")?;
            if self.config.geometry.recenter {
                model.geometry = assembler::recenter(model.geometry);
            }
            Some(model)
        } else {
            None
        };

        Ok(PipelineOutput {
            masks: kept,
            objects: scene.into_objects(),
            model,
        })
    }

    /// Synthesize geometry and material for every mask in parallel. Output
    /// order follows mask order. Every unit runs to completion and the error
    /// reported belongs to the earliest failing mask in that order.
    pub fn build_units(&self, masks: Vec<MaskRecord>) -> Result<Vec<MaskUnit>> {
        let results: Vec<Result<MaskUnit>> = masks
            .into_par_iter()
            .map(|mask| self.build_unit(mask))
            .collect();
        let units = results.into_iter().collect::<Result<Vec<MaskUnit>>>()?;
        debug!("Built {} mask units", units.len());
        Ok(units)
    }

    fn build_unit(&self, mask: MaskRecord) -> Result<MaskUnit> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled { index: mask.index });
        }
        let geometry = self.synthesizer.synthesize(&mask)?;
        let material = self.builder.for_mask(&mask, None);
        Ok(MaskUnit {
            mask,
            geometry,
            material,
        })
    }
}
