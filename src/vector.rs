//! Feature vector assembly
//!
//! Maps the named feature mapping into the fixed-order numeric vector the
//! classifier was trained with. The column order below is an external
//! contract: reordering it silently corrupts predictions.

use crate::{
    error::{DiagnosisError, Result},
    features::FeatureMap,
};
use ndarray::Array1;

/// Length of the classifier's input vector
pub const FEATURE_COUNT: usize = 18;

/// Authoritative feature order, matching the classifier's training columns
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "contrast_mean",
    "contrast_std",
    "dissimilarity_mean",
    "dissimilarity_std",
    "homogeneity_mean",
    "homogeneity_std",
    "energy_mean",
    "energy_std",
    "ASM_mean",
    "ASM_std",
    "correlation_mean",
    "correlation_std",
    "entropy",
    "cluster_shade",
    "cluster_prominence",
    "intensity_mean",
    "intensity_std",
    "intensity_var",
];

/// Assemble the fixed-order feature vector from a named feature mapping
///
/// # Errors
///
/// Returns `DiagnosisError::Internal` if any required name is absent — the
/// extractor's contract guarantees all 18, so a miss is an invariant
/// violation, not a user-facing condition.
pub fn assemble_feature_vector(features: &FeatureMap) -> Result<Array1<f32>> {
    let mut vector = Array1::<f32>::zeros(FEATURE_COUNT);

    for (i, name) in FEATURE_COLUMNS.iter().enumerate() {
        let value = features.get(name).ok_or_else(|| {
            DiagnosisError::internal(format!("feature '{name}' missing from feature mapping"))
        })?;
        vector[i] = value as f32;
    }

    Ok(vector)
}
