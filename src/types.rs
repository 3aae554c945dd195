//! Core types for leaf diagnosis operations

use crate::{
    error::{DiagnosisError, Result},
    labels::DiseaseClass,
};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Binary leaf mask, same spatial dimensions as the image it was derived from
///
/// Foreground (leaf tissue) pixels are 255, background pixels are 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafMask {
    /// Mask data in row-major order (0 or 255)
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl LeafMask {
    /// Create a new leaf mask from raw data
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create a mask from a grayscale image, treating any nonzero pixel as foreground
    #[must_use]
    pub fn from_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image
            .as_raw()
            .iter()
            .map(|&v| if v > 0 { 255 } else { 0 })
            .collect();

        Self::new(data, (width, height))
    }

    /// Convert the mask to a grayscale image
    pub fn to_image(&self) -> Result<GrayImage> {
        let (width, height) = self.dimensions;
        GrayImage::from_raw(width, height, self.data.clone())
            .ok_or_else(|| DiagnosisError::internal("mask data does not match its dimensions"))
    }

    /// Mask width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Mask height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Foreground pixel value at (x, y), without bounds checking the fast path
    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        let idx = (y * self.dimensions.0 + x) as usize;
        self.data.get(idx).is_some_and(|&v| v > 0)
    }

    /// Number of foreground pixels
    #[must_use]
    pub fn foreground_pixels(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }

    /// Whether no pixel passed the segmentation threshold
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Apply the mask to an RGB image: background pixels become zero in all channels
    pub fn apply_to_rgb(&self, image: &RgbImage) -> Result<RgbImage> {
        let (img_width, img_height) = image.dimensions();
        if (img_width, img_height) != self.dimensions {
            return Err(DiagnosisError::internal(format!(
                "image {}x{} and mask {}x{} dimensions do not match",
                img_width, img_height, self.dimensions.0, self.dimensions.1
            )));
        }

        let mut masked = image.clone();
        for (i, pixel) in masked.pixels_mut().enumerate() {
            if self.data.get(i).copied().unwrap_or(0) == 0 {
                pixel.0 = [0, 0, 0];
            }
        }

        Ok(masked)
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let foreground_pixels = self.foreground_pixels();
        let background_pixels = total_pixels - foreground_pixels;
        let total = total_pixels.max(1) as f32;

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: foreground_pixels as f32 / total,
            background_ratio: background_pixels as f32 / total,
        }
    }
}

/// Statistics about a leaf mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Per-class probability distribution in fitted class order
///
/// Values are in [0, 1] and sum to 1 up to floating-point tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    scores: [f32; DiseaseClass::COUNT],
}

impl ClassProbabilities {
    /// Build from a probability row in fitted class order
    ///
    /// # Errors
    /// - Row length differs from the number of classes
    /// - Any value is not finite
    pub fn from_row(row: &[f32]) -> Result<Self> {
        if row.len() != DiseaseClass::COUNT {
            return Err(DiagnosisError::contract_mismatch(
                "probabilities",
                DiseaseClass::COUNT,
                row.len(),
            ));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(DiagnosisError::classifier(
                "probability row contains non-finite values",
            ));
        }

        let mut scores = [0.0f32; DiseaseClass::COUNT];
        scores.copy_from_slice(row);
        Ok(Self { scores })
    }

    /// Probability of the given class
    #[must_use]
    pub fn get(&self, class: DiseaseClass) -> f32 {
        self.scores[class.index()]
    }

    /// The class with the highest probability
    #[must_use]
    pub fn argmax(&self) -> DiseaseClass {
        let mut best = DiseaseClass::ALL[0];
        let mut best_score = self.scores[0];
        for class in DiseaseClass::ALL {
            let score = self.scores[class.index()];
            if score > best_score {
                best = class;
                best_score = score;
            }
        }
        best
    }

    /// Iterate over (class, probability) pairs in fitted order
    pub fn iter(&self) -> impl Iterator<Item = (DiseaseClass, f32)> + '_ {
        DiseaseClass::ALL
            .iter()
            .map(move |&class| (class, self.scores[class.index()]))
    }

    /// The probabilities as a map keyed by label string, in fitted order
    #[must_use]
    pub fn to_map(&self) -> std::collections::BTreeMap<&'static str, f32> {
        self.iter().map(|(class, p)| (class.as_str(), p)).collect()
    }

    /// Sum of all class probabilities
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.scores.iter().sum()
    }

    /// The raw probability row in fitted class order
    #[must_use]
    pub fn scores(&self) -> &[f32; DiseaseClass::COUNT] {
        &self.scores
    }
}

/// Detailed timing breakdown for a diagnosis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineTimings {
    /// Image decoding and resizing to the canonical resolution
    pub decode_ms: u64,

    /// Leaf segmentation (HSV threshold + morphological cleanup)
    pub segmentation_ms: u64,

    /// Texture and intensity feature extraction
    pub features_ms: u64,

    /// Classifier inference
    pub inference_ms: u64,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

/// Result of a full diagnosis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Predicted condition label (argmax of the probability distribution)
    pub label: DiseaseClass,

    /// Per-class probability distribution
    pub probabilities: ClassProbabilities,

    /// True when segmentation produced an empty mask and feature extraction
    /// fell back to whole-image statistics
    pub segmentation_degraded: bool,

    /// Timing breakdown for this run
    pub timings: PipelineTimings,
}

impl Diagnosis {
    /// Confidence of the predicted label
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.probabilities.get(self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_mask_from_image_binarizes() {
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(0, 0, Luma([200]));
        img.put_pixel(1, 0, Luma([1]));
        let mask = LeafMask::from_image(&img);

        assert_eq!(mask.data, vec![255, 255, 0, 0]);
        assert_eq!(mask.dimensions, (2, 2));
    }

    #[test]
    fn test_mask_statistics() {
        let mask = LeafMask::new(vec![255, 255, 0, 0], (2, 2));

        let stats = mask.statistics();
        assert_eq!(stats.total_pixels, 4);
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert!((stats.foreground_ratio - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_mask_apply_zeroes_background() {
        let img = RgbImage::from_pixel(2, 1, image::Rgb([10, 20, 30]));
        let mask = LeafMask::new(vec![255, 0], (2, 1));

        let masked = mask.apply_to_rgb(&img).unwrap();
        assert_eq!(masked.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(masked.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_mask_apply_dimension_mismatch() {
        let img = RgbImage::new(3, 3);
        let mask = LeafMask::new(vec![0; 4], (2, 2));
        assert!(mask.apply_to_rgb(&img).is_err());
    }

    #[test]
    fn test_empty_mask_detection() {
        let mask = LeafMask::new(vec![0; 16], (4, 4));
        assert!(mask.is_empty());
        assert_eq!(mask.foreground_pixels(), 0);
    }

    #[test]
    fn test_probabilities_argmax_and_map() {
        let probs =
            ClassProbabilities::from_row(&[0.1, 0.1, 0.6, 0.1, 0.05, 0.05]).unwrap();
        assert_eq!(probs.argmax(), DiseaseClass::Healthy);
        assert!((probs.sum() - 1.0).abs() < 1e-3);

        let map = probs.to_map();
        assert_eq!(map.len(), DiseaseClass::COUNT);
        assert!((map["healthy"] - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_probabilities_reject_wrong_length() {
        assert!(ClassProbabilities::from_row(&[0.5, 0.5]).is_err());
        assert!(ClassProbabilities::from_row(&[0.1, 0.1, f32::NAN, 0.1, 0.1, 0.5]).is_err());
    }

    #[test]
    fn test_diagnosis_confidence() {
        let probabilities =
            ClassProbabilities::from_row(&[0.7, 0.1, 0.05, 0.05, 0.05, 0.05]).unwrap();
        let diagnosis = Diagnosis {
            label: probabilities.argmax(),
            probabilities,
            segmentation_degraded: false,
            timings: PipelineTimings::default(),
        };

        assert_eq!(diagnosis.label, DiseaseClass::BacterialLeafBlight);
        assert!((diagnosis.confidence() - 0.7).abs() < f32::EPSILON);
    }
}
