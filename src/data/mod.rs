//! Tabular data flowing through pipeline stages
//!
//! A [`Frame`] is an ordered set of named polars columns. Numeric columns are
//! normalized to `Float64` and categorical columns are `String`; nulls mark
//! missing cells. Preprocessing stages read and write frames; estimators
//! consume the numeric design matrix produced by [`Frame::to_array`].

pub mod frame;
pub mod io;

pub use frame::*;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while building or reshaping frames
#[derive(Debug, Error)]
pub enum DataError {
    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },

    #[error("column '{column}' has {count} missing values")]
    MissingValues { column: String, count: usize },

    #[error("failed to read data: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}
