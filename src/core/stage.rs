//! Stage capability traits

use crate::{core::PipelineError, data::Frame};
use ndarray::{Array1, Array2};
use std::fmt;

/// A fit/transform unit operating on frames
pub trait Transformer: fmt::Debug + Send {
    /// Learn parameters from the data
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError>;

    /// Apply the learned parameters
    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError>;

    fn fit_transform(&mut self, frame: &Frame) -> Result<Frame, PipelineError> {
        self.fit(frame)?;
        self.transform(frame)
    }
}

/// Terminal stage consuming a numeric design matrix
pub trait Estimator: fmt::Debug + Send {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError>;
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        (**self).fit(frame)
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        (**self).transform(frame)
    }

    fn fit_transform(&mut self, frame: &Frame) -> Result<Frame, PipelineError> {
        (**self).fit_transform(frame)
    }
}

impl<E: Estimator + ?Sized> Estimator for Box<E> {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError> {
        (**self).fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        (**self).predict(x)
    }
}

/// Check that `x` and `y` describe the same number of samples
pub fn check_samples(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError> {
    if x.nrows() != y.len() {
        return Err(PipelineError::Shape {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::Shape {
            expected: "at least one sample".to_string(),
            actual: "0 samples".to_string(),
        });
    }
    Ok(())
}
