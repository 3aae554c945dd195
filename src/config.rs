//! Configuration types for the diagnosis pipeline

use crate::error::{DiagnosisError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// HSV threshold and morphological cleanup parameters for leaf segmentation
///
/// Channel scale follows the OpenCV 8-bit convention: hue 0-179,
/// saturation and value 0-255. The default hue band targets green and
/// yellow-green vegetation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Inclusive hue range (0-179)
    pub hue: (u8, u8),
    /// Inclusive saturation range (0-255)
    pub saturation: (u8, u8),
    /// Inclusive value range (0-255)
    pub value: (u8, u8),
    /// Side length of the square structuring element for opening/closing
    pub kernel_size: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            hue: (15, 90),
            saturation: (40, 255),
            value: (20, 255),
            kernel_size: 5,
        }
    }
}

/// Gray-level co-occurrence parameters for texture analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlcmConfig {
    /// Pixel-offset distances
    pub distances: Vec<usize>,
    /// Offset angles in radians
    pub angles: Vec<f64>,
    /// Number of intensity levels (matrix side length)
    pub levels: usize,
}

impl Default for GlcmConfig {
    fn default() -> Self {
        Self {
            distances: vec![1, 3, 5],
            angles: vec![0.0, FRAC_PI_4, FRAC_PI_2, 3.0 * FRAC_PI_4],
            levels: 256,
        }
    }
}

/// Configuration for the full diagnosis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Canonical square resolution images are resized to before segmentation
    pub canonical_size: u32,
    /// Leaf segmentation parameters
    pub segmentation: SegmentationConfig,
    /// Texture analysis parameters
    pub glcm: GlcmConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canonical_size: 128,
            segmentation: SegmentationConfig::default(),
            glcm: GlcmConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for `PipelineConfig`
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn canonical_size(mut self, size: u32) -> Self {
        self.config.canonical_size = size;
        self
    }

    #[must_use]
    pub fn hue_range(mut self, low: u8, high: u8) -> Self {
        self.config.segmentation.hue = (low, high);
        self
    }

    #[must_use]
    pub fn saturation_range(mut self, low: u8, high: u8) -> Self {
        self.config.segmentation.saturation = (low, high);
        self
    }

    #[must_use]
    pub fn value_range(mut self, low: u8, high: u8) -> Self {
        self.config.segmentation.value = (low, high);
        self
    }

    #[must_use]
    pub fn kernel_size(mut self, size: u32) -> Self {
        self.config.segmentation.kernel_size = size;
        self
    }

    #[must_use]
    pub fn glcm_distances(mut self, distances: Vec<usize>) -> Self {
        self.config.glcm.distances = distances;
        self
    }

    #[must_use]
    pub fn glcm_angles(mut self, angles: Vec<f64>) -> Self {
        self.config.glcm.angles = angles;
        self
    }

    #[must_use]
    pub fn glcm_levels(mut self, levels: usize) -> Self {
        self.config.glcm.levels = levels;
        self
    }

    /// Build the pipeline configuration
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisError::InvalidConfig` for:
    /// - Zero canonical size
    /// - Even or zero morphological kernel size
    /// - Inverted threshold ranges or hue bounds above 179
    /// - Empty GLCM distance/angle sets, zero distances, angles outside [0, pi]
    /// - Intensity levels outside 2-256
    pub fn build(self) -> Result<PipelineConfig> {
        let c = &self.config;

        if c.canonical_size == 0 {
            return Err(DiagnosisError::invalid_config(
                "canonical size must be nonzero",
            ));
        }
        if c.segmentation.kernel_size == 0 || c.segmentation.kernel_size % 2 == 0 {
            return Err(DiagnosisError::invalid_config(
                "morphological kernel size must be odd and nonzero",
            ));
        }
        if c.segmentation.hue.0 > c.segmentation.hue.1 || c.segmentation.hue.1 > 179 {
            return Err(DiagnosisError::invalid_config(
                "hue range must be ascending within 0-179",
            ));
        }
        if c.segmentation.saturation.0 > c.segmentation.saturation.1 {
            return Err(DiagnosisError::invalid_config(
                "saturation range must be ascending",
            ));
        }
        if c.segmentation.value.0 > c.segmentation.value.1 {
            return Err(DiagnosisError::invalid_config("value range must be ascending"));
        }
        if c.glcm.distances.is_empty() || c.glcm.distances.contains(&0) {
            return Err(DiagnosisError::invalid_config(
                "GLCM distances must be nonempty and nonzero",
            ));
        }
        if c.glcm.angles.is_empty() || c.glcm.angles.iter().any(|&a| !(0.0..=PI).contains(&a)) {
            return Err(DiagnosisError::invalid_config(
                "GLCM angles must be nonempty and within [0, pi]",
            ));
        }
        if !(2..=256).contains(&c.glcm.levels) {
            return Err(DiagnosisError::invalid_config(
                "GLCM levels must be between 2 and 256",
            ));
        }

        Ok(self.config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
