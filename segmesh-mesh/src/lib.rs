//! segmesh-mesh: turns segmentation masks into textured geometry
//!
//! Masks are filtered by score, extruded into height-mapped planes, given a
//! material each and assembled into one model. Existing meshes can also be
//! partitioned into material groups from prompted face masks.

pub mod assembler;
pub mod export;
pub mod filter;
pub mod material;
pub mod pipeline;
pub mod segmenter;
pub mod synth;

pub use assembler::{area_weighted_centroid, merge, recenter, Scene};
pub use filter::filter_by_confidence;
pub use material::MaterialBuilder;
pub use pipeline::{MaskUnit, MeshPipeline, PipelineOutput};
pub use segmenter::{FaceGroupAssignment, ModelSegmenter, Segmentation};
pub use synth::GeometrySynthesizer;
