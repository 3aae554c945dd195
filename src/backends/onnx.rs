//! ONNX Runtime classifier backend
//!
//! Runs a fitted classifier exported to ONNX (e.g. a gradient-boosted tree
//! model converted with onnxmltools). The exported graph exposes a label
//! output (int64) and a probability output (float32, fitted class order);
//! either is located positionally by element type, so tensor names do not
//! matter.
//!
//! The session is created once at construction and never mutated afterwards;
//! a mutex provides the exclusive access ONNX Runtime wants for `run` while
//! keeping the backend shareable across threads.

use crate::backends::ClassifierBackend;
use crate::error::{DiagnosisError, Result};
use crate::labels::DiseaseClass;
use crate::vector::FEATURE_COUNT;
use instant::Instant;
use ndarray::{Array2, Ix1, Ix2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

/// ONNX Runtime backed classifier collaborator
pub struct OnnxClassifier {
    session: Mutex<Session>,
    num_features: usize,
    num_classes: usize,
}

/// Raw tensors pulled out of one session run
struct RunOutputs {
    labels: Option<Vec<i64>>,
    probabilities: Option<Array2<f32>>,
}

impl OnnxClassifier {
    /// Load a classifier model with the standard 18-feature / 6-class shape
    ///
    /// # Errors
    /// - Model file missing or not a valid ONNX graph
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_shape(path, FEATURE_COUNT, DiseaseClass::COUNT)
    }

    /// Load a classifier model with an explicit input/output shape
    ///
    /// # Errors
    /// - Model file missing or not a valid ONNX graph
    /// - Zero feature or class counts
    pub fn from_file_with_shape<P: AsRef<Path>>(
        path: P,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if num_features == 0 || num_classes == 0 {
            return Err(DiagnosisError::invalid_config(
                "classifier shape must be nonzero",
            ));
        }

        let load_start = Instant::now();
        let session = Session::builder()
            .map_err(|e| DiagnosisError::model(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DiagnosisError::model(format!("failed to set optimization level: {e}")))?
            .commit_from_file(path.as_ref())
            .map_err(|e| {
                DiagnosisError::model(format!(
                    "failed to load classifier model '{}': {e}",
                    path.as_ref().display()
                ))
            })?;

        log::info!(
            "classifier model loaded from '{}' in {:.0}ms",
            path.as_ref().display(),
            load_start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            session: Mutex::new(session),
            num_features,
            num_classes,
        })
    }

    fn validate_batch(&self, batch: &Array2<f32>) -> Result<()> {
        if batch.ncols() != self.num_features {
            return Err(DiagnosisError::contract_mismatch(
                "features",
                self.num_features,
                batch.ncols(),
            ));
        }
        Ok(())
    }

    /// Run the session once and pull out the label/probability tensors
    fn run(&self, batch: &Array2<f32>) -> Result<RunOutputs> {
        let input = Value::from_array(batch.clone())
            .map_err(|e| DiagnosisError::classifier(format!("failed to convert input batch: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DiagnosisError::internal("classifier session lock poisoned"))?;

        let inference_start = Instant::now();
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| DiagnosisError::classifier(format!("inference failed: {e}")))?;
        log::debug!(
            "classifier inference: {:.2}ms",
            inference_start.elapsed().as_secs_f64() * 1000.0
        );

        let mut labels = None;
        let mut probabilities = None;
        let keys: Vec<_> = outputs.keys().collect();
        for key in keys {
            let Some(value) = outputs.get(key) else {
                continue;
            };

            if probabilities.is_none() {
                if let Ok(tensor) = value.try_extract_array::<f32>() {
                    if let Ok(matrix) = tensor.to_owned().into_dimensionality::<Ix2>() {
                        probabilities = Some(matrix);
                        continue;
                    }
                }
            }
            if labels.is_none() {
                if let Ok(tensor) = value.try_extract_array::<i64>() {
                    if let Ok(row) = tensor.to_owned().into_dimensionality::<Ix1>() {
                        labels = Some(row.to_vec());
                    }
                }
            }
        }

        Ok(RunOutputs {
            labels,
            probabilities,
        })
    }

    fn validated_probabilities(&self, outputs: RunOutputs, rows: usize) -> Result<Array2<f32>> {
        let probabilities = outputs.probabilities.ok_or_else(|| {
            DiagnosisError::classifier("model exposes no float32 probability output")
        })?;

        if probabilities.nrows() != rows || probabilities.ncols() != self.num_classes {
            return Err(DiagnosisError::contract_mismatch(
                "probability columns",
                self.num_classes,
                probabilities.ncols(),
            ));
        }

        Ok(probabilities)
    }
}

impl ClassifierBackend for OnnxClassifier {
    fn predict(&self, batch: &Array2<f32>) -> Result<Vec<usize>> {
        self.validate_batch(batch)?;
        let outputs = self.run(batch)?;

        if let Some(labels) = outputs.labels {
            if labels.len() != batch.nrows() {
                return Err(DiagnosisError::contract_mismatch(
                    "label rows",
                    batch.nrows(),
                    labels.len(),
                ));
            }
            return labels
                .into_iter()
                .map(|label| {
                    let index = usize::try_from(label).map_err(|_| {
                        DiagnosisError::classifier(format!("negative class index {label}"))
                    })?;
                    if index >= self.num_classes {
                        return Err(DiagnosisError::classifier(format!(
                            "class index {index} out of range for {} classes",
                            self.num_classes
                        )));
                    }
                    Ok(index)
                })
                .collect();
        }

        // No integer label output: derive labels from the probability rows
        let probabilities = self.validated_probabilities(outputs, batch.nrows())?;
        Ok(probabilities
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map_or(0, |(i, _)| i)
            })
            .collect())
    }

    fn predict_proba(&self, batch: &Array2<f32>) -> Result<Array2<f32>> {
        self.validate_batch(batch)?;
        let outputs = self.run(batch)?;
        self.validated_probabilities(outputs, batch.nrows())
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_shape() {
        let result = OnnxClassifier::from_file_with_shape("missing.onnx", 0, 6);
        assert!(matches!(result, Err(DiagnosisError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_model_is_model_error() {
        let result = OnnxClassifier::from_file("definitely-not-a-model.onnx");
        assert!(matches!(result, Err(DiagnosisError::Model(_))));
    }
}
