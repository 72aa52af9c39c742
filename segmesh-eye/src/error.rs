//! Error types for segmesh-eye

use segmesh_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Core(inner) => inner,
            VisionError::Io(inner) => CoreError::Io(inner),
            other => CoreError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::Model("Test error".to_string());
        assert!(err.to_string().contains("Model error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_vision_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let vision_err: VisionError = io_err.into();
        match vision_err {
            VisionError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_vision_error_to_core_error() {
        let core_err: CoreError = VisionError::Manifest("bad entry".to_string()).into();
        match core_err {
            CoreError::Provider(msg) => assert!(msg.contains("bad entry")),
            _ => panic!("Expected Provider error"),
        }
    }

    #[test]
    fn test_core_error_passes_through() {
        let missing = VisionError::Core(CoreError::FileNotFound(PathBuf::from("x.png")));
        let core_err: CoreError = missing.into();
        assert!(matches!(core_err, CoreError::FileNotFound(_)));
    }
}
