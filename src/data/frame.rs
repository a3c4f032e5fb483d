//! Column-oriented frame backed by a polars `DataFrame`

use crate::data::DataError;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeSet;

/// Kind of values held by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Kind of a normalized column (`Float64` or `String`)
    pub fn of(series: &Series) -> Option<ColumnKind> {
        match series.dtype() {
            DataType::Float64 => Some(ColumnKind::Numeric),
            DataType::String => Some(ColumnKind::Categorical),
            _ => None,
        }
    }
}

/// Cell rendered as a category label (numbers use their shortest display form)
pub fn label_at(series: &Series, row: usize) -> Option<String> {
    if row >= series.len() {
        return None;
    }
    match series.dtype() {
        DataType::String => series.str().ok()?.get(row).map(str::to_string),
        _ => series.f64().ok()?.get(row).map(format_number),
    }
}

/// Format a number the way it is written in CSV/YAML input
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Cast integer, float and boolean columns to `Float64`
fn normalize(series: Series) -> Result<Series, DataError> {
    let dtype = series.dtype().clone();
    match dtype {
        DataType::Float64 | DataType::String => Ok(series),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Boolean => Ok(series.cast(&DataType::Float64)?),
        // a column with no observed values
        DataType::Null => Ok(series.cast(&DataType::String)?),
        other => Err(DataError::UnsupportedType {
            column: series.name().to_string(),
            dtype: other.to_string(),
        }),
    }
}

/// Ordered collection of equally long named columns
#[derive(Debug, Clone)]
pub struct Frame {
    df: DataFrame,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            df: DataFrame::empty(),
        }
    }
}

impl TryFrom<DataFrame> for Frame {
    type Error = DataError;

    fn try_from(df: DataFrame) -> Result<Self, Self::Error> {
        let mut frame = Frame::new();
        for column in df.get_columns() {
            frame.push_column(column.as_materialized_series().clone())?;
        }
        Ok(frame)
    }
}

/// Class labels extracted from a target column
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    /// Encoded label per row
    pub y: Array1<f64>,
    /// Original label names when the target column was categorical (index = encoded value)
    pub classes: Option<Vec<String>>,
}

impl Labels {
    /// Name of an encoded label
    pub fn decode(&self, value: f64) -> String {
        match &self.classes {
            Some(classes) => classes
                .get(value.round() as usize)
                .cloned()
                .unwrap_or_else(|| format_number(value)),
            None => format_number(value),
        }
    }
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_polars(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_polars(self) -> DataFrame {
        self.df
    }

    /// Builder-style column insertion
    pub fn with_column(mut self, series: Series) -> Result<Self, DataError> {
        self.push_column(series)?;
        Ok(self)
    }

    /// Append a column; names must be unique and lengths must agree
    pub fn push_column(&mut self, series: Series) -> Result<(), DataError> {
        let series = normalize(series)?;
        let name = series.name().to_string();
        if self.column(&name).is_some() {
            return Err(DataError::DuplicateColumn(name));
        }
        if !self.is_empty() && self.n_rows() != series.len() {
            return Err(DataError::LengthMismatch {
                name,
                expected: self.n_rows(),
                actual: series.len(),
            });
        }
        self.df.with_column(series)?;
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.df.height()
    }

    pub fn n_cols(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.width() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.df.get_columns().iter().map(|c| c.name().as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.df.column(name).ok().map(|c| c.as_materialized_series())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.df
            .get_columns()
            .iter()
            .map(|c| (c.name().as_str(), c.as_materialized_series()))
    }

    /// New frame with only the named columns, in the requested order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame, DataError> {
        let mut seen = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if self.column(name).is_none() {
                return Err(DataError::MissingColumn(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(DataError::DuplicateColumn(name.to_string()));
            }
        }
        let df = self.df.select(names.iter().map(|n| n.as_ref()))?;
        Ok(Frame { df })
    }

    /// Remove a column and return it together with the remaining frame
    pub fn split_off(&self, name: &str) -> Result<(Frame, Series), DataError> {
        let series = self
            .column(name)
            .cloned()
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))?;
        let df = self.df.drop(name)?;
        Ok((Frame { df }, series))
    }

    /// Split a frame into features and encoded class labels
    ///
    /// Categorical targets are encoded by the position of their label in the
    /// sorted set of distinct labels.
    pub fn split_target(&self, target: &str) -> Result<(Frame, Labels), DataError> {
        let (features, series) = self.split_off(target)?;
        let missing = series.null_count();
        if missing > 0 {
            return Err(DataError::MissingValues {
                column: target.to_string(),
                count: missing,
            });
        }

        let labels = match ColumnKind::of(&series) {
            Some(ColumnKind::Numeric) => Labels {
                y: series.f64()?.iter().flatten().collect(),
                classes: None,
            },
            Some(ColumnKind::Categorical) => {
                let values = series.str()?;
                let classes: Vec<String> = values
                    .iter()
                    .flatten()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let y = values
                    .iter()
                    .flatten()
                    .map(|v| classes.iter().position(|c| c == v).unwrap_or(0) as f64)
                    .collect();
                Labels {
                    y,
                    classes: Some(classes),
                }
            }
            None => {
                return Err(DataError::UnsupportedType {
                    column: target.to_string(),
                    dtype: series.dtype().to_string(),
                })
            }
        };
        Ok((features, labels))
    }

    /// Prefix every column name with `<prefix>__`
    pub fn prefixed(self, prefix: &str) -> Result<Frame, DataError> {
        let names: Vec<String> = self
            .column_names()
            .iter()
            .map(|n| format!("{}__{}", prefix, n))
            .collect();
        let mut df = self.df;
        df.set_column_names(names.iter().map(String::as_str))?;
        Ok(Frame { df })
    }

    /// Concatenate frames column-wise, keeping their order
    pub fn hstack(frames: impl IntoIterator<Item = Frame>) -> Result<Frame, DataError> {
        let mut out = Frame::new();
        for frame in frames {
            for (_, series) in frame.columns() {
                out.push_column(series.clone())?;
            }
        }
        Ok(out)
    }

    /// Dense row-major design matrix; every column must be numeric and complete
    pub fn to_array(&self) -> Result<Array2<f64>, DataError> {
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(self.n_cols());
        for (name, series) in self.columns() {
            let values = series
                .f64()
                .map_err(|_| DataError::NotNumeric(name.to_string()))?;
            let missing = values.null_count();
            if missing > 0 {
                return Err(DataError::MissingValues {
                    column: name.to_string(),
                    count: missing,
                });
            }
            columns.push(values.iter().flatten().collect());
        }
        Ok(Array2::from_shape_fn(
            (self.n_rows(), columns.len()),
            |(r, c)| columns[c][r],
        ))
    }
}
