use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Insufficient data: need at least 2 frames, got {frames}")]
    InsufficientData { frames: usize },
    #[error("Frame shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: String, right: String },
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Non-finite distance at ({row}, {col})")]
    NonFiniteDistance { row: usize, col: usize },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RestoreError>;
