use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid mask {index}: {reason}")]
    InvalidMask { index: usize, reason: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Mask {index} below confidence threshold ({score:.3} < {threshold:.3})")]
    LowConfidenceMask {
        index: usize,
        score: f32,
        threshold: f32,
    },

    #[error("No model selected for segmentation")]
    NoModelSelected,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Cancelled before mask {index}")]
    Cancelled { index: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Index of the mask or prompt that caused the failure, when there is one
    pub fn mask_index(&self) -> Option<usize> {
        match self {
            Error::InvalidMask { index, .. }
            | Error::LowConfidenceMask { index, .. }
            | Error::Cancelled { index } => Some(*index),
            _ => None,
        }
    }

    /// Whether the pipeline may skip the offending item and continue
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::LowConfidenceMask { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
