//! segmesh-eye: mask sources for segmesh
//!
//! The segmentation model is an external collaborator. This crate adapts its
//! outputs (or a local fallback) to the `MaskProvider` and
//! `FaceMaskProvider` seams, and handles image files on the way in and out.

pub mod error;
pub mod image_io;
pub mod predictor;
pub mod providers;

pub use error::VisionError;
pub use image_io::{load_image, read_mask_png, write_mask_png};
pub use predictor::ProjectionPredictor;
pub use providers::{provider_for, LuminanceMaskProvider, ManifestMaskProvider};
