#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Rice Leaf Disease Diagnosis Library
//!
//! A Rust library that turns a photograph of a rice leaf into a disease
//! diagnosis. The pipeline isolates the leaf from its background with HSV
//! color segmentation, summarizes the leaf's surface texture with gray-level
//! co-occurrence (GLCM) statistics, and hands the resulting 18-value feature
//! vector to a fitted classifier.
//!
//! ## Features
//!
//! - **Deterministic pipeline**: decode → resize → segment → features → classify,
//!   with no hidden state between runs
//! - **HSV leaf segmentation**: vegetation thresholding with morphological
//!   open/close cleanup, plus a whole-image fallback when no leaf is found
//! - **GLCM texture features**: 12 co-occurrence matrices (3 distances × 4
//!   angles), six Haralick-style properties, entropy, and cluster moments
//! - **Pluggable classifier**: any model behind the [`ClassifierBackend`]
//!   trait; an ONNX Runtime backend ships behind the `onnx` feature
//! - **Six disease classes**: bacterial leaf blight, brown spot, healthy,
//!   leaf blast, leaf scald, narrow brown spot
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riceguard::{LeafDiagnosisProcessor, OnnxClassifier, PipelineConfig};
//! use std::sync::Arc;
//!
//! # fn example() -> riceguard::Result<()> {
//! let backend = Arc::new(OnnxClassifier::from_file("classifier.onnx")?);
//! let processor = LeafDiagnosisProcessor::new(PipelineConfig::default(), backend)?;
//!
//! let bytes = std::fs::read("leaf.jpg")?;
//! let diagnosis = processor.diagnose_bytes(&bytes)?;
//! println!("{} ({:.1}%)", diagnosis.label, diagnosis.confidence() * 100.0);
//! for (name, score) in diagnosis.probabilities.to_map() {
//!     println!("  {name}: {score:.4}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `onnx` (default): ONNX Runtime classifier backend

pub mod adapter;
pub mod backends;
pub mod config;
pub mod error;
pub mod features;
pub mod labels;
pub mod processor;
pub mod segmentation;
pub mod types;
pub mod vector;

pub use adapter::ClassificationAdapter;
pub use backends::ClassifierBackend;
pub use config::{GlcmConfig, PipelineConfig, PipelineConfigBuilder, SegmentationConfig};
pub use error::{DiagnosisError, Result};
pub use features::{extract_features, FeatureMap};
pub use labels::{DiseaseClass, CLASS_NAMES};
pub use processor::{prepare_features, LeafDiagnosisProcessor, PreparedFeatures};
pub use segmentation::segment_leaf;
pub use types::{ClassProbabilities, Diagnosis, LeafMask, MaskStatistics, PipelineTimings};
pub use vector::{assemble_feature_vector, FEATURE_COLUMNS, FEATURE_COUNT};

#[cfg(feature = "onnx")]
pub use backends::OnnxClassifier;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Diagnose a leaf from any async byte source (file, socket, upload stream)
///
/// Buffers the full image before decoding; the underlying formats need random
/// access, so streaming decode is not an option.
///
/// # Errors
/// - `DiagnosisError::Io` when reading from the source fails
/// - `DiagnosisError::Decode` when the buffered bytes are not a readable image
/// - Feature extraction or classifier failures
pub async fn diagnose_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    processor: &LeafDiagnosisProcessor,
) -> Result<Diagnosis> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    processor.diagnose_bytes(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::StubClassifier;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn encoded_green_png() -> Vec<u8> {
        let image = RgbImage::from_pixel(64, 64, Rgb([40, 200, 40]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_diagnose_from_reader() {
        let processor = LeafDiagnosisProcessor::new(
            PipelineConfig::default(),
            Arc::new(StubClassifier::new(vec![0.1, 0.1, 0.6, 0.1, 0.05, 0.05])),
        )
        .unwrap();

        let bytes = encoded_green_png();
        let diagnosis = diagnose_from_reader(Cursor::new(bytes), &processor)
            .await
            .unwrap();
        assert_eq!(diagnosis.label, DiseaseClass::Healthy);
    }

    #[tokio::test]
    async fn test_diagnose_from_reader_rejects_garbage() {
        let processor = LeafDiagnosisProcessor::new(
            PipelineConfig::default(),
            Arc::new(StubClassifier::uniform()),
        )
        .unwrap();

        let result = diagnose_from_reader(Cursor::new(b"not an image".to_vec()), &processor).await;
        assert!(matches!(result, Err(DiagnosisError::Decode(_))));
    }
}
