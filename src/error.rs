use thiserror::Error;

use crate::submission::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Landmark detector unavailable: {0}")]
    DetectionUnavailable(String),

    #[error("No face detected in the image")]
    NoFaceDetected,

    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to append row to sink: {0}")]
    SinkWrite(String),

    #[error("Invalid landmark set: expected {expected} points, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },

    #[error("Measurement {0} is not a finite number")]
    NonFiniteFeature(&'static str),

    #[error("Font error: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
