//! Intensity statistics and contrast normalization

use image::GrayImage;

/// First- and second-order statistics over raw pixel intensities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityStats {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

/// Population mean, variance, and standard deviation of the given values
///
/// An empty slice yields all-zero statistics; callers are expected to have
/// fallen back to the whole image before reaching that point.
#[must_use]
pub fn intensity_statistics(values: &[u8]) -> IntensityStats {
    if values.is_empty() {
        return IntensityStats {
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n;

    IntensityStats {
        mean,
        variance,
        std_dev: variance.sqrt(),
    }
}

/// Linearly stretch the image's intensity range to fill [0, 255]
///
/// Reduces lighting-dependent bias before texture analysis. A flat image
/// (max == min) maps to all zeros, keeping the output deterministic without
/// a division guard leaking into downstream features.
#[must_use]
pub fn min_max_stretch(image: &GrayImage) -> GrayImage {
    let raw = image.as_raw();
    let min = raw.iter().copied().min().unwrap_or(0);
    let max = raw.iter().copied().max().unwrap_or(0);

    if max == min {
        return GrayImage::new(image.width(), image.height());
    }

    let scale = 255.0 / f64::from(max - min);
    let stretched = raw
        .iter()
        .map(|&v| (f64::from(v - min) * scale).round() as u8)
        .collect();

    // Raw buffer length is unchanged, reconstruction cannot fail
    GrayImage::from_raw(image.width(), image.height(), stretched)
        .unwrap_or_else(|| GrayImage::new(image.width(), image.height()))
}
