//! Classification adapter
//!
//! Bridges the assembled feature vector and the classifier collaborator:
//! wraps the single sample as a one-row batch, invokes the collaborator, and
//! normalizes its output into a predicted label plus a per-class probability
//! mapping. No retries, no caching — every call is a fresh classification.

use crate::{
    backends::ClassifierBackend,
    error::{DiagnosisError, Result},
    labels::DiseaseClass,
    types::ClassProbabilities,
    vector::FEATURE_COUNT,
};
use ndarray::{Array1, Array2, Axis};
use std::sync::Arc;

/// Adapter owning an immutable, thread-safe handle to the fitted classifier
pub struct ClassificationAdapter {
    backend: Arc<dyn ClassifierBackend>,
}

impl ClassificationAdapter {
    /// Create an adapter around a classifier backend
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisError::Classifier` when the backend's fitted shape
    /// does not match the 18-feature / 6-class contract.
    pub fn new(backend: Arc<dyn ClassifierBackend>) -> Result<Self> {
        if backend.num_features() != FEATURE_COUNT {
            return Err(DiagnosisError::contract_mismatch(
                "features",
                FEATURE_COUNT,
                backend.num_features(),
            ));
        }
        if backend.num_classes() != DiseaseClass::COUNT {
            return Err(DiagnosisError::contract_mismatch(
                "classes",
                DiseaseClass::COUNT,
                backend.num_classes(),
            ));
        }

        Ok(Self { backend })
    }

    /// Classify a feature vector into a label and probability distribution
    ///
    /// The predicted label is the argmax of the probability row, which keeps
    /// it consistent with the fitted class ordering regardless of how the
    /// collaborator breaks ties internally.
    ///
    /// # Errors
    /// - Vector length differs from the fitted feature count
    /// - Collaborator inference failure or malformed probability row
    pub fn classify(&self, vector: &Array1<f32>) -> Result<(DiseaseClass, ClassProbabilities)> {
        let batch = self.batch_of_one(vector)?;
        let proba = self.backend.predict_proba(&batch)?;

        if proba.nrows() != 1 {
            return Err(DiagnosisError::contract_mismatch(
                "probability rows",
                1,
                proba.nrows(),
            ));
        }

        let probabilities = ClassProbabilities::from_row(&proba.row(0).to_vec())?;
        Ok((probabilities.argmax(), probabilities))
    }

    /// Predict only the label, via the collaborator's batch-predict operation
    ///
    /// # Errors
    /// - Vector length differs from the fitted feature count
    /// - Collaborator inference failure or an out-of-range class index
    pub fn predict_label(&self, vector: &Array1<f32>) -> Result<DiseaseClass> {
        let batch = self.batch_of_one(vector)?;
        let indices = self.backend.predict(&batch)?;

        let index = indices.first().copied().ok_or_else(|| {
            DiagnosisError::classifier("collaborator returned no label for the batch")
        })?;
        DiseaseClass::from_index(index).ok_or_else(|| {
            DiagnosisError::classifier(format!(
                "class index {index} out of range for {} classes",
                DiseaseClass::COUNT
            ))
        })
    }

    fn batch_of_one(&self, vector: &Array1<f32>) -> Result<Array2<f32>> {
        if vector.len() != FEATURE_COUNT {
            return Err(DiagnosisError::contract_mismatch(
                "features",
                FEATURE_COUNT,
                vector.len(),
            ));
        }
        Ok(vector.clone().insert_axis(Axis(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::{FailingClassifier, StubClassifier};

    fn sample_vector() -> Array1<f32> {
        Array1::from_iter((0..FEATURE_COUNT).map(|i| i as f32))
    }

    #[test]
    fn test_classify_against_stub() {
        let stub = StubClassifier::new(vec![0.1, 0.1, 0.6, 0.1, 0.05, 0.05]);
        let adapter = ClassificationAdapter::new(Arc::new(stub)).unwrap();

        let (label, probabilities) = adapter.classify(&sample_vector()).unwrap();
        assert_eq!(label, DiseaseClass::Healthy);
        assert!((probabilities.get(DiseaseClass::Healthy) - 0.6).abs() < f32::EPSILON);
        assert!((probabilities.sum() - 1.0).abs() < 1e-3);

        let map = probabilities.to_map();
        assert_eq!(map["bacterial_leaf_blight"], 0.1);
        assert_eq!(map["narrow_brown_spot"], 0.05);
    }

    #[test]
    fn test_predict_label_uses_collaborator_predict() {
        let stub = StubClassifier::new(vec![0.05, 0.7, 0.05, 0.1, 0.05, 0.05]);
        let adapter = ClassificationAdapter::new(Arc::new(stub)).unwrap();

        let label = adapter.predict_label(&sample_vector()).unwrap();
        assert_eq!(label, DiseaseClass::BrownSpot);
    }

    #[test]
    fn test_wrong_vector_length_rejected() {
        let adapter = ClassificationAdapter::new(Arc::new(StubClassifier::uniform())).unwrap();
        let short = Array1::<f32>::zeros(12);

        let result = adapter.classify(&short);
        assert!(matches!(result, Err(DiagnosisError::Classifier(_))));
    }

    #[test]
    fn test_backend_shape_validated_at_construction() {
        let wrong_features = StubClassifier::uniform().with_feature_count(10);
        assert!(ClassificationAdapter::new(Arc::new(wrong_features)).is_err());

        let wrong_classes = StubClassifier::new(vec![0.5, 0.5]);
        assert!(ClassificationAdapter::new(Arc::new(wrong_classes)).is_err());
    }

    #[test]
    fn test_inference_failure_propagates() {
        let adapter = ClassificationAdapter::new(Arc::new(FailingClassifier)).unwrap();
        let result = adapter.classify(&sample_vector());
        assert!(matches!(result, Err(DiagnosisError::Classifier(_))));
    }

    #[test]
    fn test_classification_is_fresh_per_call() {
        let stub = Arc::new(StubClassifier::uniform());
        let adapter = ClassificationAdapter::new(stub.clone()).unwrap();

        adapter.classify(&sample_vector()).unwrap();
        adapter.classify(&sample_vector()).unwrap();
        assert_eq!(stub.call_count(), 2);
    }
}
