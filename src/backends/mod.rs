//! Classifier backend implementations
//!
//! The classifier collaborator sits behind the [`ClassifierBackend`] trait:
//! the core assembles feature vectors and interprets probability rows, while
//! the backend owns the fitted model. Backends are loaded once and treated as
//! read-only shared state safe for concurrent reads.

use crate::error::Result;
use ndarray::Array2;

#[cfg(feature = "onnx")]
pub mod onnx;

// Test utilities for backend testing
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "onnx")]
pub use self::onnx::OnnxClassifier;

/// Trait for classifier collaborators
///
/// Consumes a batch of feature vectors (rows) and exposes the collaborator's
/// two operations: batch-predict and batch-predict-probability. Probability
/// rows are ordered by the collaborator's internal fitted class order, which
/// must match [`crate::labels::DiseaseClass::ALL`].
pub trait ClassifierBackend: Send + Sync {
    /// Predict one class index per input row
    ///
    /// # Errors
    /// - Model inference failures
    /// - Input width not matching the fitted feature count
    fn predict(&self, batch: &Array2<f32>) -> Result<Vec<usize>>;

    /// Predict one probability vector per input row, in fitted class order
    ///
    /// # Errors
    /// - Model inference failures
    /// - Input width not matching the fitted feature count
    fn predict_proba(&self, batch: &Array2<f32>) -> Result<Array2<f32>>;

    /// Number of classes the model was fitted with
    fn num_classes(&self) -> usize;

    /// Length of the feature vector the model expects
    fn num_features(&self) -> usize;
}
