//! Preprocessor plus terminal estimator

use super::ColumnTransformer;
use crate::{
    core::{Estimator, PipelineError, Transformer},
    data::Frame,
    estimator::accuracy,
};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Routing preprocessor chained into an estimator
///
/// Callers only see `fit`/`transform`/`predict`; the branch structure stays
/// internal.
#[derive(Debug)]
pub struct CompositePipeline {
    preprocessor: ColumnTransformer,
    estimator: Box<dyn Estimator>,
    fitted: bool,
}

impl CompositePipeline {
    pub fn new(preprocessor: ColumnTransformer, estimator: Box<dyn Estimator>) -> Self {
        Self {
            preprocessor,
            estimator,
            fitted: false,
        }
    }

    pub fn preprocessor(&self) -> &ColumnTransformer {
        &self.preprocessor
    }

    pub fn estimator(&self) -> &dyn Estimator {
        self.estimator.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Names of the columns fed to the estimator
    pub fn feature_names_out(&self) -> Option<&[String]> {
        self.preprocessor.feature_names_out()
    }

    pub fn fit(&mut self, frame: &Frame, y: &Array1<f64>) -> Result<(), PipelineError> {
        self.fitted = false;
        let features = self.preprocessor.fit_transform(frame)?;
        let x = features.to_array()?;
        debug!("fitting estimator on {}x{} features", x.nrows(), x.ncols());
        self.estimator.fit(&x, y)?;
        self.fitted = true;
        Ok(())
    }

    /// Preprocessed feature frame
    pub fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        self.ensure_fitted()?;
        self.preprocessor.transform(frame)
    }

    pub fn predict(&self, frame: &Frame) -> Result<Array1<f64>, PipelineError> {
        let x = self.features(frame)?;
        self.estimator.predict(&x)
    }

    /// Accuracy of the predictions against `y`
    pub fn score(&self, frame: &Frame, y: &Array1<f64>) -> Result<f64, PipelineError> {
        accuracy(y, &self.predict(frame)?)
    }

    fn features(&self, frame: &Frame) -> Result<Array2<f64>, PipelineError> {
        Ok(self.transform(frame)?.to_array()?)
    }

    fn ensure_fitted(&self) -> Result<(), PipelineError> {
        if self.fitted {
            Ok(())
        } else {
            Err(PipelineError::NotFitted("CompositePipeline".to_string()))
        }
    }
}
