//! End-to-end leaf diagnosis processor
//!
//! Consolidates the pipeline: decode → resize to the canonical resolution →
//! leaf segmentation → feature extraction → vector assembly → classification.
//! Every run owns its intermediate state; the only shared piece is the
//! read-only classifier handle inside the adapter.

use crate::{
    adapter::ClassificationAdapter,
    backends::ClassifierBackend,
    config::PipelineConfig,
    error::Result,
    features::{extract_features, FeatureMap},
    segmentation::{rgb_to_gray, segment_leaf},
    types::{Diagnosis, LeafMask, PipelineTimings},
    vector::assemble_feature_vector,
};
use image::{imageops, DynamicImage, RgbImage};
use instant::Instant;
use ndarray::Array1;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything the pipeline produces short of classification
///
/// The presentation shell displays the resized input and the segmented
/// region next to the diagnosis, so both rasters are handed back alongside
/// the numeric results.
pub struct PreparedFeatures {
    /// Input resized to the canonical resolution
    pub image: RgbImage,

    /// Color image with background pixels zeroed
    pub segmented: RgbImage,

    /// Cleaned binary leaf mask
    pub mask: LeafMask,

    /// The 18 named feature values
    pub features: FeatureMap,

    /// Fixed-order feature vector ready for classification
    pub vector: Array1<f32>,

    /// True when the mask was empty and extraction fell back to the whole image
    pub segmentation_degraded: bool,
}

/// Run the image-to-feature-vector pipeline without classifying
///
/// # Errors
/// - Feature extraction failures (propagated from [`extract_features`])
pub fn prepare_features(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<PreparedFeatures> {
    let (prepared, _, _) = prepare_features_timed(image, config)?;
    Ok(prepared)
}

fn prepare_features_timed(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<(PreparedFeatures, u64, u64)> {
    let size = config.canonical_size;

    let segmentation_start = Instant::now();
    let resized = imageops::resize(
        &image.to_rgb8(),
        size,
        size,
        imageops::FilterType::Triangle,
    );

    let (segmented, mask) = segment_leaf(&resized, &config.segmentation);
    let segmentation_degraded = mask.is_empty();
    if segmentation_degraded {
        warn!("segmentation produced an empty mask, falling back to whole-image statistics");
    }
    let segmentation_ms = segmentation_start.elapsed().as_millis() as u64;

    let features_start = Instant::now();
    let gray = rgb_to_gray(&segmented);
    let features = extract_features(&gray, Some(&mask), &config.glcm)?;
    let vector = assemble_feature_vector(&features)?;
    let features_ms = features_start.elapsed().as_millis() as u64;

    let prepared = PreparedFeatures {
        image: resized,
        segmented,
        mask,
        features,
        vector,
        segmentation_degraded,
    };
    Ok((prepared, segmentation_ms, features_ms))
}

/// Leaf diagnosis processor: the full pipeline plus a classifier adapter
pub struct LeafDiagnosisProcessor {
    config: PipelineConfig,
    adapter: ClassificationAdapter,
}

impl LeafDiagnosisProcessor {
    /// Create a processor around a classifier backend
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisError::Classifier` when the backend's fitted shape
    /// does not match the feature/class contract.
    pub fn new(config: PipelineConfig, backend: Arc<dyn ClassifierBackend>) -> Result<Self> {
        Ok(Self {
            config,
            adapter: ClassificationAdapter::new(backend)?,
        })
    }

    /// The pipeline configuration this processor runs with
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Diagnose a leaf from raw encoded image bytes (JPEG/PNG)
    ///
    /// # Errors
    /// - `DiagnosisError::Decode` when the bytes are not a readable image
    /// - Feature extraction or classifier failures
    pub fn diagnose_bytes(&self, image_bytes: &[u8]) -> Result<Diagnosis> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let image = image::load_from_memory(image_bytes)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        self.diagnose_decoded(&image, decode_ms, total_start)
    }

    /// Diagnose a leaf from an already decoded image
    ///
    /// # Errors
    /// - Feature extraction or classifier failures
    pub fn diagnose_image(&self, image: &DynamicImage) -> Result<Diagnosis> {
        self.diagnose_decoded(image, 0, Instant::now())
    }

    /// Run the pipeline up to the feature vector, without classifying
    ///
    /// # Errors
    /// - Feature extraction failures
    pub fn prepare(&self, image: &DynamicImage) -> Result<PreparedFeatures> {
        prepare_features(image, &self.config)
    }

    fn diagnose_decoded(
        &self,
        image: &DynamicImage,
        decode_ms: u64,
        total_start: Instant,
    ) -> Result<Diagnosis> {
        let (prepared, segmentation_ms, features_ms) =
            prepare_features_timed(image, &self.config)?;

        debug!(
            foreground = prepared.mask.foreground_pixels(),
            degraded = prepared.segmentation_degraded,
            "pipeline features ready"
        );

        let inference_start = Instant::now();
        let (label, probabilities) = self.adapter.classify(&prepared.vector)?;
        let inference_ms = inference_start.elapsed().as_millis() as u64;

        let timings = PipelineTimings {
            decode_ms,
            segmentation_ms,
            features_ms,
            inference_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
        };

        let diagnosis = Diagnosis {
            label,
            probabilities,
            segmentation_degraded: prepared.segmentation_degraded,
            timings,
        };

        info!(
            label = %diagnosis.label,
            confidence = diagnosis.confidence(),
            degraded = diagnosis.segmentation_degraded,
            "diagnosis complete"
        );

        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::StubClassifier;
    use crate::vector::FEATURE_COUNT;
    use image::Rgb;

    fn green_image(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([40, 200, 40])))
    }

    fn stub_processor(proba: Vec<f32>) -> LeafDiagnosisProcessor {
        LeafDiagnosisProcessor::new(
            PipelineConfig::default(),
            Arc::new(StubClassifier::new(proba)),
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_features_green_leaf() {
        let prepared = prepare_features(&green_image(256), &PipelineConfig::default()).unwrap();

        assert_eq!(prepared.image.dimensions(), (128, 128));
        assert_eq!(prepared.segmented.dimensions(), (128, 128));
        assert_eq!(prepared.mask.dimensions, (128, 128));
        assert_eq!(prepared.vector.len(), FEATURE_COUNT);
        assert_eq!(prepared.features.len(), FEATURE_COUNT);
        assert!(!prepared.segmentation_degraded);

        // Uniform vegetation: nearly every pixel passes the threshold
        let coverage = prepared.mask.statistics().foreground_ratio;
        assert!(coverage >= 0.95, "coverage {coverage} below 95%");
    }

    #[test]
    fn test_prepare_features_black_image_degrades() {
        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([0, 0, 0])));
        let prepared = prepare_features(&black, &PipelineConfig::default()).unwrap();

        assert!(prepared.segmentation_degraded);
        assert!(prepared.mask.is_empty());
        assert!(prepared.vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_diagnose_image_with_stub() {
        let processor = stub_processor(vec![0.1, 0.1, 0.6, 0.1, 0.05, 0.05]);
        let diagnosis = processor.diagnose_image(&green_image(128)).unwrap();

        assert_eq!(diagnosis.label.as_str(), "healthy");
        assert!((diagnosis.confidence() - 0.6).abs() < f32::EPSILON);
        assert!(!diagnosis.segmentation_degraded);
    }

    #[test]
    fn test_diagnose_bytes_rejects_garbage() {
        let processor = stub_processor(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let result = processor.diagnose_bytes(b"definitely not an image");
        assert!(matches!(result, Err(crate::error::DiagnosisError::Decode(_))));
    }

    #[test]
    fn test_diagnose_is_deterministic() {
        let processor = stub_processor(vec![0.2, 0.2, 0.2, 0.2, 0.1, 0.1]);
        let image = green_image(200);

        let first = processor.prepare(&image).unwrap();
        let second = processor.prepare(&image).unwrap();
        assert_eq!(first.vector, second.vector);
        assert_eq!(first.mask.data, second.mask.data);
    }
}
