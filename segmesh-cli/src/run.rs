//! `generate` and `segment` commands

use crate::paths;
use anyhow::{bail, Context};
use segmesh_core::{MaterialId, Prompt, PromptSet, SceneObject, SegmeshConfig};
use segmesh_eye::{load_image, provider_for, write_mask_png, ProjectionPredictor};
use segmesh_mesh::export::{import_obj, mask_image_file_name, write_assignment, write_material, write_obj};
use segmesh_mesh::{MaterialBuilder, MeshPipeline, ModelSegmenter};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Segment `image` with `model`, then write mask images, materials and the
/// model into `output`
pub fn generate(image: &Path, output: &Path, model: &str, config: SegmeshConfig) -> anyhow::Result<()> {
    paths::readable_file(image, "image")?;
    paths::writable_dir(output)?;

    let provider = provider_for(model).with_context(|| format!("Failed to load model '{}'", model))?;
    let pixels = load_image(image).with_context(|| format!("Failed to read image '{}'", image.display()))?;

    let pipeline = MeshPipeline::new(config);
    let result = pipeline.run(provider.as_ref(), &pixels)?;
    let settings = &pipeline.config().output;
    let mut written: Vec<PathBuf> = Vec::new();

    if settings.write_mask_images {
        for mask in &result.masks {
            let path = output.join(mask_image_file_name(mask.index));
            write_mask_png(&mask.pixels, &path)?;
            written.push(path);
        }
    }

    if settings.write_materials {
        for object in &result.objects {
            for material in &object.slots {
                written.push(write_material(output, material)?);
            }
        }
    }

    if settings.write_model {
        match &result.model {
            Some(merged) => written.push(write_obj(output, "model", merged)?),
            None => {
                for object in &result.objects {
                    written.push(write_obj(output, &object.name, object)?);
                }
            }
        }
    }

    info!("Generated {} objects from {} masks", result.objects.len(), result.masks.len());
    print_summary(&written);
    Ok(())
}

/// Partition the faces of `mesh` between `prompts`, then write the
/// segmented model, its materials and the face assignment into `output`
pub fn segment(
    mesh: &Path,
    output: &Path,
    prompts: Vec<Prompt>,
    radius: f32,
    config: SegmeshConfig,
) -> anyhow::Result<()> {
    paths::readable_file_with_extension(mesh, "obj", "mesh")?;
    paths::writable_dir(output)?;

    let prompt_type = config.provider.prompt_type;
    let prompts: PromptSet = prompts.into_iter().filter(|p| prompt_type.accepts(p)).collect();
    if prompts.is_empty() {
        bail!("no prompts to segment with (prompt type {:?})", prompt_type);
    }

    let geometry = import_obj(mesh).with_context(|| format!("Failed to load mesh '{}'", mesh.display()))?;
    let predictor = ProjectionPredictor::new(radius)?;
    let builder = MaterialBuilder::new(&config.material);
    let segmenter = ModelSegmenter::new(config.provider.threshold, config.filter.confidence_threshold);

    let segmentation = segmenter.segment(Some(&geometry), &prompts, &predictor, &config.provider, &builder)?;
    for skipped in &segmentation.skipped {
        warn!("{}", skipped);
    }
    let object: SceneObject = segmentation.apply("segmented", geometry)?;
    let mut written: Vec<PathBuf> = Vec::new();

    if config.output.write_materials {
        for material in object.slots.iter().filter(|m| m.id != MaterialId::BACKGROUND) {
            written.push(write_material(output, material)?);
        }
    }

    let assignment_path = output.join("assignment.json");
    write_assignment(&assignment_path, &segmentation.assignment)?;
    written.push(assignment_path);

    if config.output.write_model {
        written.push(write_obj(output, "segmented", &object)?);
    }

    info!(
        "Segmented {} faces with {} of {} prompts",
        object.geometry.face_count(),
        prompts.len() - segmentation.skipped.len(),
        prompts.len()
    );
    print_summary(&written);
    Ok(())
}

fn print_summary(written: &[PathBuf]) {
    let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
    let summary = json!({ "files": files });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => warn!("Failed to render summary: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use segmesh_core::MaterialConfig;

    fn seeded_config() -> SegmeshConfig {
        let mut config = SegmeshConfig::default();
        config.material = MaterialConfig {
            seed: Some(3),
            ..MaterialConfig::default()
        };
        config
    }

    #[test]
    fn test_generate_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("input.png");
        let mut rgb = RgbImage::from_pixel(8, 8, Rgb([10, 10, 10]));
        for y in 0..4 {
            for x in 0..4 {
                rgb.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
        rgb.save(&image).unwrap();
        let output = dir.path().join("out");
        std::fs::create_dir(&output).unwrap();

        generate(&image, &output, "luminance", seeded_config()).unwrap();

        assert!(output.join("SAM_input_0.png").is_file());
        assert!(output.join("SAM_input_1.png").is_file());
        assert!(output.join("_material_0.json").is_file());
        assert!(output.join("_material_1.json").is_file());
        assert!(output.join("model.obj").is_file());
        let mtl = std::fs::read_to_string(output.join("model.mtl")).unwrap();
        assert!(mtl.contains("map_d SAM_input_1.png"));
    }

    #[test]
    fn test_generate_rejects_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("input.png");
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&image).unwrap();
        let err = generate(&image, &dir.path().join("missing"), "luminance", seeded_config()).unwrap_err();
        assert!(err.to_string().contains("output directory"));
    }

    #[test]
    fn test_segment_writes_assignment() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = dir.path().join("strip.obj");
        std::fs::write(
            &mesh,
            "v 0 0 0\nv 1 0 0\nv 2 0 0\nv 0 1 0\nv 1 1 0\nv 2 1 0\nf 1 2 5 4\nf 2 3 6 5\n",
        )
        .unwrap();

        let prompts = vec![Prompt::boxed(1.0, 0.0, 2.0, 1.0)];
        segment(&mesh, dir.path(), prompts, 1.0, seeded_config()).unwrap();

        let assignment: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("assignment.json")).unwrap()).unwrap();
        assert_eq!(assignment["material_ids"], json!([0, 1]));
        assert!(dir.path().join("_material_0.json").is_file());
        assert!(dir.path().join("segmented.obj").is_file());
    }

    #[test]
    fn test_segment_requires_matching_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = dir.path().join("tri.obj");
        std::fs::write(&mesh, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut config = seeded_config();
        config.provider.prompt_type = segmesh_core::PromptType::Box;
        let prompts = vec![Prompt::Point { x: 0.0, y: 0.0 }];
        assert!(segment(&mesh, dir.path(), prompts, 1.0, config).is_err());
    }
}
