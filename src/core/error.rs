//! Pipeline error types

use crate::data::DataError;
use thiserror::Error;

/// Errors raised while wiring, fitting or applying pipeline stages
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("column '{column}' required by branch '{branch}' is missing from the input")]
    MissingColumn { branch: String, column: String },

    #[error("{0} is not fitted yet")]
    NotFitted(String),

    #[error("{stage} cannot handle column '{column}': {reason}")]
    Unsupported {
        stage: String,
        column: String,
        reason: String,
    },

    #[error("column '{column}' has unknown category '{category}'")]
    UnknownCategory { column: String, category: String },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

impl PipelineError {
    /// Wiring mistakes: bad pipeline structure or declared columns absent from the data
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Configuration(_) | PipelineError::MissingColumn { .. }
        )
    }
}
