//! Error kinds surfaced by the classifier.
//!
//! Startup failures ([`ModelLoadError`]) are fatal; the service never becomes
//! ready. Per-request failures ([`PredictionError`]) leave the service running
//! and are meant to be mapped to a response by whoever called `predict`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("weight file not found: {}", path.display())]
    MissingWeights { path: PathBuf },

    /// The stored classification head was trained for another category count.
    #[error("classification head shape mismatch: expected {expected:?}, found {found:?}")]
    HeadMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Unreadable or corrupt file, or a backbone tensor with the wrong shape.
    #[error("failed to load weights from {}", path.display())]
    Weights {
        path: PathBuf,
        #[source]
        source: candle_core::Error,
    },

    #[error("device: {message}")]
    Device { message: String },
}

#[derive(Error, Debug)]
pub enum ImageDecodeError {
    #[error("empty image payload")]
    Empty,

    #[error("unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Decoded fine, but the aspect ratio is too extreme to resize and crop.
    #[error("unsupported image dimensions {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    #[error("malformed image data")]
    Malformed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<image::ImageError> for ImageDecodeError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::Unsupported(unsupported) => ImageDecodeError::UnsupportedFormat {
                format: unsupported.format_hint().to_string(),
            },
            other => ImageDecodeError::Malformed(Box::new(other)),
        }
    }
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("forward pass failed")]
    Backend(#[from] candle_core::Error),

    #[error("model produced {found} logits, expected {expected}")]
    OutputWidth { expected: usize, found: usize },

    #[error("model produced non-finite logits")]
    NonFinite,
}

/// Recoverable failure of a single `predict` call.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Decode(#[from] ImageDecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictionError {
    /// Stable identifier a transport layer can switch on.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::Decode(_) => "image_decode_error",
            PredictionError::Inference(_) => "inference_error",
        }
    }
}
