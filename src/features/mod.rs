//! Texture/statistical feature extraction over the segmented leaf region
//!
//! Produces the named 18-entry feature mapping the classifier was trained
//! against: six co-occurrence properties summarized as mean/std pairs,
//! entropy and the two cluster moments of the averaged matrix, and raw
//! intensity statistics.

pub mod glcm;
pub mod stats;

use crate::{
    config::GlcmConfig,
    error::{DiagnosisError, Result},
    types::LeafMask,
};
use image::GrayImage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub use glcm::{cluster_features, shannon_entropy, GlcmStack, TextureProperty};
pub use stats::{intensity_statistics, min_max_stretch, IntensityStats};

/// Named mapping of feature values
///
/// Holds exactly 18 entries after a successful extraction, every value
/// finite. The authoritative ordering for classification lives in
/// [`crate::vector::FEATURE_COLUMNS`]; this type only guarantees presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureMap(BTreeMap<&'static str, f64>);

impl FeatureMap {
    /// Value of a named feature, if present
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Number of named features
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping holds no features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (name, value) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    fn insert(&mut self, name: &'static str, value: f64) {
        self.0.insert(name, value);
    }
}

/// Extract the 18 named features from an intensity image
///
/// Region selection: when a mask with at least one foreground pixel is
/// supplied, intensity statistics are restricted to the masked pixel values
/// and background is zeroed in the working copy used for texture analysis.
/// Otherwise the full image is used — the documented fallback for a
/// degenerate segmentation, not a failure.
///
/// The working copy is min-max stretched before co-occurrence analysis;
/// intensity statistics use the raw (pre-stretch) values.
///
/// # Errors
/// - The intensity image has zero pixels
/// - A supplied mask does not match the image dimensions
pub fn extract_features(
    gray: &GrayImage,
    mask: Option<&LeafMask>,
    config: &GlcmConfig,
) -> Result<FeatureMap> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(DiagnosisError::feature("intensity image is empty"));
    }

    if let Some(mask) = mask {
        if mask.dimensions != (width, height) {
            return Err(DiagnosisError::feature(format!(
                "mask {}x{} does not match image {}x{}",
                mask.dimensions.0, mask.dimensions.1, width, height
            )));
        }
    }

    let (working, values) = match mask {
        Some(mask) if !mask.is_empty() => {
            let mut working = gray.clone();
            let mut values = Vec::with_capacity(mask.foreground_pixels());
            for (i, pixel) in working.pixels_mut().enumerate() {
                if mask.data.get(i).copied().unwrap_or(0) > 0 {
                    values.push(pixel.0[0]);
                } else {
                    pixel.0[0] = 0;
                }
            }
            (working, values)
        },
        _ => (gray.clone(), gray.as_raw().clone()),
    };
    let use_mask = mask.is_some_and(|m| !m.is_empty());

    debug!(
        masked = use_mask,
        region_pixels = values.len(),
        "extracting features"
    );

    let normalized = min_max_stretch(&working);
    let stack = GlcmStack::compute(&normalized, config);

    let mut features = FeatureMap::default();
    for property in TextureProperty::ALL {
        let (mean, std) = stack.property_summary(property);
        features.insert(mean_key(property), mean);
        features.insert(std_key(property), std);
    }

    let mean_matrix = stack.mean_matrix();
    features.insert("entropy", shannon_entropy(&mean_matrix));
    let (shade, prominence) = cluster_features(&mean_matrix);
    features.insert("cluster_shade", shade);
    features.insert("cluster_prominence", prominence);

    let intensity = intensity_statistics(&values);
    features.insert("intensity_mean", intensity.mean);
    features.insert("intensity_std", intensity.std_dev);
    features.insert("intensity_var", intensity.variance);

    Ok(features)
}

fn mean_key(property: TextureProperty) -> &'static str {
    match property {
        TextureProperty::Contrast => "contrast_mean",
        TextureProperty::Dissimilarity => "dissimilarity_mean",
        TextureProperty::Homogeneity => "homogeneity_mean",
        TextureProperty::Energy => "energy_mean",
        TextureProperty::Asm => "ASM_mean",
        TextureProperty::Correlation => "correlation_mean",
    }
}

fn std_key(property: TextureProperty) -> &'static str {
    match property {
        TextureProperty::Contrast => "contrast_std",
        TextureProperty::Dissimilarity => "dissimilarity_std",
        TextureProperty::Homogeneity => "homogeneity_std",
        TextureProperty::Energy => "energy_std",
        TextureProperty::Asm => "ASM_std",
        TextureProperty::Correlation => "correlation_std",
    }
}
