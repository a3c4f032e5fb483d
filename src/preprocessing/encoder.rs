//! Categorical encoding

use super::fitted_column;
use crate::{
    core::{PipelineError, Transformer},
    data::{label_at, Frame},
};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::debug;

const STAGE: &str = "OneHotEncoder";

/// Behaviour on categories not seen during fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Encode the row as all zeros
    Ignore,
}

impl FromStr for HandleUnknown {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(HandleUnknown::Error),
            "ignore" => Ok(HandleUnknown::Ignore),
            other => Err(format!("unknown handle_unknown mode '{}'", other)),
        }
    }
}

/// Expands each input column into one indicator column per category
///
/// Categories are sorted; numeric columns are treated as labels. Output
/// columns are named `<column>_<category>`.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
    categories: Option<Vec<(String, Vec<String>)>>,
}

impl OneHotEncoder {
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            categories: None,
        }
    }

    /// Learned categories per input column
    pub fn categories(&self) -> Option<&[(String, Vec<String>)]> {
        self.categories.as_deref()
    }
}

fn labels(name: &str, column: &Series) -> Result<Vec<String>, PipelineError> {
    (0..column.len())
        .map(|row| {
            label_at(column, row).ok_or_else(|| PipelineError::Unsupported {
                stage: STAGE.to_string(),
                column: name.to_string(),
                reason: format!("missing value at row {}; impute before encoding", row),
            })
        })
        .collect()
}

impl Transformer for OneHotEncoder {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let mut categories = Vec::with_capacity(frame.n_cols());
        for (name, column) in frame.columns() {
            let seen: BTreeSet<String> = labels(name, column)?.into_iter().collect();
            debug!("{} learned {} categories for '{}'", STAGE, seen.len(), name);
            categories.push((name.to_string(), seen.into_iter().collect()));
        }
        self.categories = Some(categories);
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        let categories = self
            .categories
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted(STAGE.to_string()))?;

        let mut out = Frame::new();
        for (name, known) in categories {
            let rows = labels(name, fitted_column(frame, name)?)?;
            let mut indicators = vec![vec![0.0; rows.len()]; known.len()];
            for (i, label) in rows.iter().enumerate() {
                match known.binary_search(label) {
                    Ok(k) => indicators[k][i] = 1.0,
                    Err(_) if self.handle_unknown == HandleUnknown::Ignore => {}
                    Err(_) => {
                        return Err(PipelineError::UnknownCategory {
                            column: name.clone(),
                            category: label.clone(),
                        })
                    }
                }
            }
            for (category, values) in known.iter().zip(indicators) {
                out.push_column(Series::new(format!("{}_{}", name, category).into(), values))?;
            }
        }
        Ok(out)
    }
}
