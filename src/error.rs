//! Error types for leaf diagnosis operations

use thiserror::Error;

/// Result type alias for leaf diagnosis operations
pub type Result<T> = std::result::Result<T, DiagnosisError>;

/// Error types for the diagnosis pipeline
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// Input/output errors (stream read failures, model file access)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes do not decode to a valid raster
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Feature extraction failures (absent or unreadable intensity image)
    #[error("Feature extraction error: {0}")]
    Feature(String),

    /// Classifier collaborator failures (contract mismatch, inference errors)
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Model loading or initialization errors
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal invariant violations (should be unreachable)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DiagnosisError {
    /// Create a new feature extraction error
    pub fn feature<S: Into<String>>(msg: S) -> Self {
        Self::Feature(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier<S: Into<String>>(msg: S) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a classifier contract mismatch error with expected/actual context
    pub fn contract_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        Self::Classifier(format!(
            "collaborator contract mismatch: expected {expected} {what}, got {actual}"
        ))
    }
}
