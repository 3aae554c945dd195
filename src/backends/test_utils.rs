//! Mock classifier backends for testing
//!
//! Implements the `ClassifierBackend` trait without a model file, so the
//! adapter and processor can be exercised against fixed probability rows.

use crate::{
    backends::ClassifierBackend,
    error::{DiagnosisError, Result},
    labels::DiseaseClass,
    vector::FEATURE_COUNT,
};
use ndarray::Array2;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stub collaborator returning the same probability row for every input
pub struct StubClassifier {
    proba: Vec<f32>,
    num_features: usize,
    calls: AtomicUsize,
}

impl StubClassifier {
    /// Stub with a fixed probability row over the six classes
    #[must_use]
    pub fn new(proba: Vec<f32>) -> Self {
        Self {
            proba,
            num_features: FEATURE_COUNT,
            calls: AtomicUsize::new(0),
        }
    }

    /// Stub with a uniform distribution
    #[must_use]
    pub fn uniform() -> Self {
        Self::new(vec![1.0 / DiseaseClass::COUNT as f32; DiseaseClass::COUNT])
    }

    /// Stub advertising a wrong feature count, for contract tests
    #[must_use]
    pub fn with_feature_count(mut self, num_features: usize) -> Self {
        self.num_features = num_features;
        self
    }

    /// Number of predict/predict_proba invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_batch(&self, batch: &Array2<f32>) -> Result<()> {
        if batch.ncols() != self.num_features {
            return Err(DiagnosisError::contract_mismatch(
                "features",
                self.num_features,
                batch.ncols(),
            ));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ClassifierBackend for StubClassifier {
    fn predict(&self, batch: &Array2<f32>) -> Result<Vec<usize>> {
        self.check_batch(batch)?;
        let argmax = self
            .proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        Ok(vec![argmax; batch.nrows()])
    }

    fn predict_proba(&self, batch: &Array2<f32>) -> Result<Array2<f32>> {
        self.check_batch(batch)?;
        let rows = batch.nrows();
        let cols = self.proba.len();
        let data: Vec<f32> = self.proba.iter().copied().cycle().take(rows * cols).collect();
        Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| DiagnosisError::internal(format!("stub probability shape: {e}")))
    }

    fn num_classes(&self) -> usize {
        self.proba.len()
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

/// Stub collaborator that fails every inference call
pub struct FailingClassifier;

impl ClassifierBackend for FailingClassifier {
    fn predict(&self, _batch: &Array2<f32>) -> Result<Vec<usize>> {
        Err(DiagnosisError::classifier("simulated inference failure"))
    }

    fn predict_proba(&self, _batch: &Array2<f32>) -> Result<Array2<f32>> {
        Err(DiagnosisError::classifier("simulated inference failure"))
    }

    fn num_classes(&self) -> usize {
        DiseaseClass::COUNT
    }

    fn num_features(&self) -> usize {
        FEATURE_COUNT
    }
}
