//! segmesh-core: shared data model for mask-driven mesh synthesis
//!
//! Holds the records that flow between the segmentation provider, the
//! geometry synthesizer and the scene assembler, plus configuration and the
//! error type every other crate reports through.

pub mod cancel;
pub mod config;
pub mod error;
pub mod geometry;
pub mod material;
pub mod provider;
pub mod types;

pub use cancel::CancellationToken;
pub use config::{
    ColorPolicy, FilterConfig, GeometryConfig, GridResolution, MaterialConfig, OutputConfig,
    PromptType, ProviderConfig, SegmeshConfig,
};
pub use error::{Error, Result};
pub use geometry::{Geometry, SceneObject};
pub use material::{Material, MaterialId, OpacitySource};
pub use provider::{FaceMask, FaceMaskProvider, MaskProvider, PixelImage};
pub use types::{BBox, MaskGrid, MaskRecord, Prompt, PromptSet, Rgba};
