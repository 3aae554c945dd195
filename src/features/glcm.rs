//! Gray-level co-occurrence matrices and texture descriptors
//!
//! A co-occurrence matrix is a 2D histogram of intensity pairs at a fixed
//! pixel offset. One matrix is built per (distance, angle) combination, with
//! symmetric pairing and per-matrix normalization to a probability
//! distribution. Texture properties are summarized across the stack; entropy
//! and the higher-order cluster features are computed on the averaged matrix.

use crate::config::GlcmConfig;
use image::GrayImage;
use ndarray::Array2;

/// Additive floor applied when renormalizing the averaged matrix
const RENORM_FLOOR: f64 = 1e-12;

/// Marginal deviations below this are treated as zero when computing correlation
const CORRELATION_EPS: f64 = 1e-15;

/// The six standard co-occurrence texture properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureProperty {
    Contrast,
    Dissimilarity,
    Homogeneity,
    Energy,
    Asm,
    Correlation,
}

impl TextureProperty {
    /// All properties, in feature-vector order
    pub const ALL: [Self; 6] = [
        Self::Contrast,
        Self::Dissimilarity,
        Self::Homogeneity,
        Self::Energy,
        Self::Asm,
        Self::Correlation,
    ];

    /// Feature-name prefix for this property ("ASM" keeps its historical casing)
    #[must_use]
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Contrast => "contrast",
            Self::Dissimilarity => "dissimilarity",
            Self::Homogeneity => "homogeneity",
            Self::Energy => "energy",
            Self::Asm => "ASM",
            Self::Correlation => "correlation",
        }
    }
}

/// Pixel offset (row, column) for a distance/angle combination
///
/// Rounded per component, so e.g. distance 3 at 45 degrees pairs at (2, 2).
pub(crate) fn offset_for(distance: usize, angle: f64) -> (i32, i32) {
    let d = distance as f64;
    ((angle.sin() * d).round() as i32, (angle.cos() * d).round() as i32)
}

/// A stack of normalized co-occurrence matrices, one per (distance, angle)
pub struct GlcmStack {
    /// Matrices in distances-major order: (d0,a0), (d0,a1), ..., (d1,a0), ...
    matrices: Vec<Array2<f64>>,
    levels: usize,
}

impl GlcmStack {
    /// Build the stack for an intensity image
    ///
    /// Pixel values are binned into `config.levels` levels (the identity
    /// mapping at 256). Pairing is symmetric and each matrix is normalized to
    /// sum to 1.
    #[must_use]
    pub fn compute(image: &GrayImage, config: &GlcmConfig) -> Self {
        let (width, height) = image.dimensions();
        let levels = config.levels;
        let raw = image.as_raw();

        let bin = |v: u8| (usize::from(v) * levels) / 256;

        let mut matrices = Vec::with_capacity(config.distances.len() * config.angles.len());
        for &distance in &config.distances {
            for &angle in &config.angles {
                let (drow, dcol) = offset_for(distance, angle);
                let mut matrix = Array2::<f64>::zeros((levels, levels));

                for row in 0..height as i32 {
                    for col in 0..width as i32 {
                        let row2 = row + drow;
                        let col2 = col + dcol;
                        if row2 < 0 || col2 < 0 || row2 >= height as i32 || col2 >= width as i32 {
                            continue;
                        }
                        let i = bin(raw[(row as u32 * width + col as u32) as usize]);
                        let j = bin(raw[(row2 as u32 * width + col2 as u32) as usize]);
                        // Symmetric pairing counts both orientations
                        matrix[[i, j]] += 1.0;
                        matrix[[j, i]] += 1.0;
                    }
                }

                let total: f64 = matrix.sum();
                if total > 0.0 {
                    matrix.mapv_inplace(|v| v / total);
                }
                matrices.push(matrix);
            }
        }

        Self { matrices, levels }
    }

    /// Number of (distance, angle) combinations in the stack
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Whether the stack holds no matrices
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Number of intensity levels (matrix side length)
    #[must_use]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// The property value for each matrix in the stack
    #[must_use]
    pub fn property_values(&self, property: TextureProperty) -> Vec<f64> {
        self.matrices
            .iter()
            .map(|m| matrix_property(m, self.levels, property))
            .collect()
    }

    /// Mean and population standard deviation of a property across the stack
    #[must_use]
    pub fn property_summary(&self, property: TextureProperty) -> (f64, f64) {
        let values = self.property_values(property);
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    /// Average the stack into a single probability matrix
    ///
    /// Renormalized with a small additive floor in the denominator to avoid
    /// division by zero on degenerate inputs.
    #[must_use]
    pub fn mean_matrix(&self) -> Array2<f64> {
        let mut mean = Array2::<f64>::zeros((self.levels, self.levels));
        for matrix in &self.matrices {
            mean += matrix;
        }
        if !self.matrices.is_empty() {
            mean /= self.matrices.len() as f64;
        }

        let total = mean.sum() + RENORM_FLOOR;
        mean.mapv_inplace(|v| v / total);
        mean
    }
}

/// Evaluate one texture property on a normalized co-occurrence matrix
fn matrix_property(matrix: &Array2<f64>, levels: usize, property: TextureProperty) -> f64 {
    match property {
        TextureProperty::Contrast => weighted_sum(matrix, levels, |i, j| (i - j).powi(2)),
        TextureProperty::Dissimilarity => weighted_sum(matrix, levels, |i, j| (i - j).abs()),
        TextureProperty::Homogeneity => {
            weighted_sum(matrix, levels, |i, j| 1.0 / (1.0 + (i - j).powi(2)))
        },
        TextureProperty::Asm => matrix.iter().map(|p| p * p).sum(),
        TextureProperty::Energy => {
            let asm: f64 = matrix.iter().map(|p| p * p).sum();
            asm.sqrt()
        },
        TextureProperty::Correlation => correlation(matrix, levels),
    }
}

fn weighted_sum(matrix: &Array2<f64>, levels: usize, weight: impl Fn(f64, f64) -> f64) -> f64 {
    let mut sum = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = matrix[[i, j]];
            if p > 0.0 {
                sum += p * weight(i as f64, j as f64);
            }
        }
    }
    sum
}

/// Correlation of the (i, j) indices under the joint distribution
///
/// Pinned to 1.0 when either marginal deviation vanishes (a flat region has
/// perfectly correlated intensities by convention).
fn correlation(matrix: &Array2<f64>, levels: usize) -> f64 {
    let mut mu_i = 0.0;
    let mut mu_j = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = matrix[[i, j]];
            mu_i += i as f64 * p;
            mu_j += j as f64 * p;
        }
    }

    let mut var_i = 0.0;
    let mut var_j = 0.0;
    let mut cov = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = matrix[[i, j]];
            let di = i as f64 - mu_i;
            let dj = j as f64 - mu_j;
            var_i += di * di * p;
            var_j += dj * dj * p;
            cov += di * dj * p;
        }
    }

    let std_i = var_i.sqrt();
    let std_j = var_j.sqrt();
    if std_i < CORRELATION_EPS || std_j < CORRELATION_EPS {
        1.0
    } else {
        cov / (std_i * std_j)
    }
}

/// Shannon entropy (base 2) of a probability matrix, over nonzero entries
#[must_use]
pub fn shannon_entropy(matrix: &Array2<f64>) -> f64 {
    matrix
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum()
}

/// Cluster shade and cluster prominence of a probability matrix
///
/// Both weigh each entry by powers of s(i, j) = i + j - mu_x - mu_y: shade is
/// the third moment, prominence the fourth.
#[must_use]
pub fn cluster_features(matrix: &Array2<f64>) -> (f64, f64) {
    let levels = matrix.nrows();

    let mut mu_x = 0.0;
    let mut mu_y = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = matrix[[i, j]];
            mu_x += i as f64 * p;
            mu_y += j as f64 * p;
        }
    }

    let mut shade = 0.0;
    let mut prominence = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = matrix[[i, j]];
            if p > 0.0 {
                let s = i as f64 + j as f64 - mu_x - mu_y;
                let s3 = s * s * s;
                shade += s3 * p;
                prominence += s3 * s * p;
            }
        }
    }

    (shade, prominence)
}
