use super::{check_features, class_counts, majority};
use crate::core::{check_samples, Estimator, PipelineError};
use ndarray::{Array1, Array2};

/// Baseline that always predicts the most frequent training class
#[derive(Debug, Clone, Default)]
pub struct DummyClassifier {
    fitted: Option<(f64, usize)>,
}

impl DummyClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Estimator for DummyClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError> {
        check_samples(x, y)?;
        self.fitted = Some((majority(&class_counts(y.iter().copied())), x.ncols()));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        let (class, n_features) = self
            .fitted
            .ok_or_else(|| PipelineError::NotFitted("DummyClassifier".to_string()))?;
        check_features(n_features, x)?;
        Ok(Array1::from_elem(x.nrows(), class))
    }
}
