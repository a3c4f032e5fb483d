//! Reference preprocessing stages
//!
//! - Missing value imputation ([`SimpleImputer`])
//! - Feature scaling ([`StandardScaler`], [`MinMaxScaler`])
//! - Categorical encoding ([`OneHotEncoder`])
//!
//! Every stage learns per-column parameters in `fit` and only touches the
//! columns it was fitted on in `transform`.

mod encoder;
mod imputer;
mod scaler;

pub use encoder::{HandleUnknown, OneHotEncoder};
pub use imputer::{FillValue, ImputeStrategy, SimpleImputer};
pub use scaler::{MinMaxScaler, StandardScaler};

use crate::{
    core::PipelineError,
    data::{DataError, Frame},
};
use polars::prelude::{Float64Chunked, Series};

/// Fetch a fitted column from the input, or fail with a data error
fn fitted_column<'a>(frame: &'a Frame, name: &str) -> Result<&'a Series, PipelineError> {
    frame
        .column(name)
        .ok_or_else(|| PipelineError::Data(DataError::MissingColumn(name.to_string())))
}

/// Numeric view of a column, or an `Unsupported` error naming the stage
fn numeric_values<'a>(stage: &str, name: &str, column: &'a Series) -> Result<&'a Float64Chunked, PipelineError> {
    column.f64().map_err(|_| PipelineError::Unsupported {
        stage: stage.to_string(),
        column: name.to_string(),
        reason: "expected numeric values".to_string(),
    })
}
