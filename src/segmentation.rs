//! Leaf segmentation: HSV color threshold plus morphological cleanup
//!
//! Isolates plant-tissue pixels from the background. The threshold operates
//! in the OpenCV 8-bit HSV convention (hue 0-179, saturation/value 0-255),
//! which is the scale the segmentation ranges were tuned in. The cleaned
//! mask is applied to the color image by zeroing background pixels.

use crate::{config::SegmentationConfig, types::LeafMask};
use image::{GrayImage, RgbImage};
use tracing::debug;

/// Convert an RGB pixel to HSV in the OpenCV 8-bit convention
///
/// Hue is halved into 0-179 so it fits a byte; saturation and value span
/// the full 0-255 range.
#[must_use]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0 {
        0
    } else {
        ((255.0 * f32::from(delta)) / f32::from(v)).round() as u8
    };

    let h = if delta == 0 {
        0
    } else {
        let d = f32::from(delta);
        let degrees = if v == r {
            60.0 * (f32::from(g) - f32::from(b)) / d
        } else if v == g {
            120.0 + 60.0 * (f32::from(b) - f32::from(r)) / d
        } else {
            240.0 + 60.0 * (f32::from(r) - f32::from(g)) / d
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        let halved = (degrees / 2.0).round() as u16;
        // 359.x degrees rounds to 180, which wraps to red
        (halved % 180) as u8
    };

    (h, s, v)
}

/// Threshold an RGB image into a raw binary mask of pixels inside the HSV ranges
fn hsv_in_range(image: &RgbImage, config: &SegmentationConfig) -> LeafMask {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity((width * height) as usize);

    for pixel in image.pixels() {
        let [r, g, b] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let inside = (config.hue.0..=config.hue.1).contains(&h)
            && (config.saturation.0..=config.saturation.1).contains(&s)
            && (config.value.0..=config.value.1).contains(&v);
        data.push(if inside { 255 } else { 0 });
    }

    LeafMask::new(data, (width, height))
}

/// Binary erosion with a square all-ones kernel
///
/// Out-of-bounds neighbors are ignored (treated as foreground), matching the
/// OpenCV default border semantics so the image border does not shrink the mask.
fn erode(mask: &LeafMask, kernel_size: u32) -> LeafMask {
    let (width, height) = mask.dimensions;
    let radius = (kernel_size / 2) as i32;
    let mut data = vec![0u8; mask.data.len()];

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let mut keep = true;
            'kernel: for ky in -radius..=radius {
                for kx in -radius..=radius {
                    let nx = x + kx;
                    let ny = y + ky;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    if !mask.is_foreground(nx as u32, ny as u32) {
                        keep = false;
                        break 'kernel;
                    }
                }
            }
            if keep {
                data[(y as u32 * width + x as u32) as usize] = 255;
            }
        }
    }

    LeafMask::new(data, mask.dimensions)
}

/// Binary dilation with a square all-ones kernel
///
/// Out-of-bounds neighbors are ignored (treated as background).
fn dilate(mask: &LeafMask, kernel_size: u32) -> LeafMask {
    let (width, height) = mask.dimensions;
    let radius = (kernel_size / 2) as i32;
    let mut data = vec![0u8; mask.data.len()];

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let mut grow = false;
            'kernel: for ky in -radius..=radius {
                for kx in -radius..=radius {
                    let nx = x + kx;
                    let ny = y + ky;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    if mask.is_foreground(nx as u32, ny as u32) {
                        grow = true;
                        break 'kernel;
                    }
                }
            }
            if grow {
                data[(y as u32 * width + x as u32) as usize] = 255;
            }
        }
    }

    LeafMask::new(data, mask.dimensions)
}

/// Morphological opening: erosion followed by dilation, removing small specks
fn opening(mask: &LeafMask, kernel_size: u32) -> LeafMask {
    dilate(&erode(mask, kernel_size), kernel_size)
}

/// Morphological closing: dilation followed by erosion, filling small gaps
fn closing(mask: &LeafMask, kernel_size: u32) -> LeafMask {
    erode(&dilate(mask, kernel_size), kernel_size)
}

/// Segment the leaf region of a color image
///
/// Thresholds pixels inside the configured HSV ranges, cleans the raw mask
/// with an opening then a closing, and zeroes background pixels in the color
/// image. The returned mask and image always match the input's spatial
/// dimensions. An empty mask is a valid outcome, not an error.
pub fn segment_leaf(image: &RgbImage, config: &SegmentationConfig) -> (RgbImage, LeafMask) {
    let raw = hsv_in_range(image, config);
    let cleaned = closing(&opening(&raw, config.kernel_size), config.kernel_size);

    debug!(
        raw_foreground = raw.foreground_pixels(),
        cleaned_foreground = cleaned.foreground_pixels(),
        "segmented leaf region"
    );

    // Dimensions are equal by construction, apply cannot fail
    let masked = cleaned
        .apply_to_rgb(image)
        .unwrap_or_else(|_| image.clone());

    (masked, cleaned)
}

/// Convert an RGB image to single-channel intensity with BT.601 luma weights
///
/// Matches the gray conversion the feature extractor was trained against.
#[must_use]
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        gray.put_pixel(x, y, image::Luma([luma.round().min(255.0) as u8]));
    }

    gray
}
