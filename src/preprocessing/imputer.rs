//! Missing value imputation

use super::{fitted_column, numeric_values};
use crate::{
    core::{PipelineError, Transformer},
    data::{format_number, ColumnKind, Frame},
};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::debug;

const STAGE: &str = "SimpleImputer";
const DEFAULT_CATEGORICAL_FILL: &str = "missing_value";

/// How the fill value of a column is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeStrategy {
    Mean,
    Median,
    MostFrequent,
    Constant,
}

impl FromStr for ImputeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" => Ok(ImputeStrategy::MostFrequent),
            "constant" => Ok(ImputeStrategy::Constant),
            other => Err(format!("unknown imputation strategy '{}'", other)),
        }
    }
}

/// A value written into missing cells
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Number(f64),
    Label(String),
}

/// Replaces missing cells with a per-column statistic
#[derive(Debug, Clone)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    fill_value: Option<FillValue>,
    fills: Option<Vec<(String, FillValue)>>,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_value: None,
            fills: None,
        }
    }

    /// Constant used by [`ImputeStrategy::Constant`]
    pub fn with_fill_value(mut self, fill_value: FillValue) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }

    /// Learned fill values, in column order
    pub fn fills(&self) -> Option<&[(String, FillValue)]> {
        self.fills.as_deref()
    }

    fn numeric_fill(&self, name: &str, values: &Float64Chunked) -> Result<FillValue, PipelineError> {
        let mut observed: Vec<f64> = values.iter().flatten().collect();
        if observed.is_empty() && self.strategy != ImputeStrategy::Constant {
            return Err(unsupported(name, "column has no observed values"));
        }

        let fill = match self.strategy {
            ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
            ImputeStrategy::Median => {
                observed.sort_by(|a, b| a.total_cmp(b));
                let mid = observed.len() / 2;
                if observed.len() % 2 == 0 {
                    (observed[mid - 1] + observed[mid]) / 2.0
                } else {
                    observed[mid]
                }
            }
            ImputeStrategy::MostFrequent => {
                let mut counts: HashMap<u64, usize> = HashMap::new();
                for value in &observed {
                    *counts.entry(value.to_bits()).or_insert(0) += 1;
                }
                // ties resolve to the smallest value
                observed.sort_by(|a, b| a.total_cmp(b));
                observed
                    .iter()
                    .copied()
                    .fold((f64::NAN, 0usize), |best, value| {
                        let count = counts.get(&value.to_bits()).copied().unwrap_or(0);
                        if count > best.1 {
                            (value, count)
                        } else {
                            best
                        }
                    })
                    .0
            }
            ImputeStrategy::Constant => match &self.fill_value {
                None => 0.0,
                Some(FillValue::Number(n)) => *n,
                Some(FillValue::Label(_)) => {
                    return Err(unsupported(name, "a text fill value cannot fill a numeric column"))
                }
            },
        };
        Ok(FillValue::Number(fill))
    }

    fn categorical_fill(&self, name: &str, values: &StringChunked) -> Result<FillValue, PipelineError> {
        match self.strategy {
            ImputeStrategy::Mean | ImputeStrategy::Median => {
                Err(unsupported(name, "strategy requires numeric values"))
            }
            ImputeStrategy::MostFrequent => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for value in values.iter().flatten() {
                    *counts.entry(value).or_insert(0) += 1;
                }
                let mut best: Option<(&str, usize)> = None;
                for (label, count) in counts {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((label, count));
                    }
                }
                best.map(|(label, _)| FillValue::Label(label.to_string()))
                    .ok_or_else(|| unsupported(name, "column has no observed values"))
            }
            ImputeStrategy::Constant => Ok(FillValue::Label(match &self.fill_value {
                None => DEFAULT_CATEGORICAL_FILL.to_string(),
                Some(FillValue::Label(label)) => label.clone(),
                Some(FillValue::Number(n)) => format_number(*n),
            })),
        }
    }
}

fn categorical_values<'a>(name: &str, column: &'a Series) -> Result<&'a StringChunked, PipelineError> {
    column
        .str()
        .map_err(|_| unsupported(name, "expected categorical values"))
}

fn unsupported(column: &str, reason: &str) -> PipelineError {
    PipelineError::Unsupported {
        stage: STAGE.to_string(),
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

impl Transformer for SimpleImputer {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let fills = frame
            .columns()
            .map(|(name, column)| {
                let fill = match ColumnKind::of(column) {
                    Some(ColumnKind::Numeric) => {
                        self.numeric_fill(name, numeric_values(STAGE, name, column)?)?
                    }
                    _ => self.categorical_fill(name, categorical_values(name, column)?)?,
                };
                debug!("{} fill for '{}': {:?}", STAGE, name, fill);
                Ok((name.to_string(), fill))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        self.fills = Some(fills);
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        let fills = self
            .fills
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted(STAGE.to_string()))?;

        let mut out = Frame::new();
        for (name, fill) in fills {
            let column = fitted_column(frame, name)?;
            let filled = match fill {
                FillValue::Number(n) => {
                    let values: Vec<f64> = numeric_values(STAGE, name, column)?
                        .iter()
                        .map(|v| v.unwrap_or(*n))
                        .collect();
                    Series::new(name.as_str().into(), values)
                }
                FillValue::Label(label) => {
                    let values: Vec<&str> = categorical_values(name, column)?
                        .iter()
                        .map(|v| v.unwrap_or(label.as_str()))
                        .collect();
                    Series::new(name.as_str().into(), values)
                }
            };
            out.push_column(filled)?;
        }
        Ok(out)
    }
}
