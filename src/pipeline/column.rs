//! Column routing

use crate::{
    core::{PipelineError, Transformer},
    data::{DataError, Frame},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A transformer applied to a fixed subset of columns
#[derive(Debug)]
pub struct Branch {
    pub name: String,
    pub transformer: Box<dyn Transformer>,
    pub columns: Vec<String>,
}

impl Branch {
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        transformer: Box<dyn Transformer>,
        columns: &[S],
    ) -> Self {
        Self {
            name: name.into(),
            transformer,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    fn select(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        frame.select(self.columns.as_slice()).map_err(|e| match e {
            DataError::MissingColumn(column) => PipelineError::MissingColumn {
                branch: self.name.clone(),
                column,
            },
            other => other.into(),
        })
    }
}

/// Routes column subsets through their branch and concatenates the outputs
///
/// Output columns keep branch order and are named `<branch>__<column>`.
/// Columns not claimed by any branch are dropped.
#[derive(Debug)]
pub struct ColumnTransformer {
    branches: Vec<Branch>,
    feature_names_out: Option<Vec<String>>,
}

impl ColumnTransformer {
    pub fn new(branches: Vec<Branch>) -> Result<Self, PipelineError> {
        if branches.is_empty() {
            return Err(PipelineError::Configuration(
                "a column transformer needs at least one branch".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for branch in &branches {
            if !names.insert(branch.name.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "duplicate branch name '{}'",
                    branch.name
                )));
            }
            if branch.columns.is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "branch '{}' has no columns",
                    branch.name
                )));
            }
            for column in &branch.columns {
                if let Some(previous) = owners.insert(column.as_str(), branch.name.as_str()) {
                    warn!(
                        "column '{}' is routed to both '{}' and '{}'",
                        column, previous, branch.name
                    );
                }
            }
        }

        Ok(Self {
            branches,
            feature_names_out: None,
        })
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Output column names, known once fitted
    pub fn feature_names_out(&self) -> Option<&[String]> {
        self.feature_names_out.as_deref()
    }
}

impl Transformer for ColumnTransformer {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        self.fit_transform(frame).map(|_| ())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        if self.feature_names_out.is_none() {
            return Err(PipelineError::NotFitted("ColumnTransformer".to_string()));
        }
        let outputs = self
            .branches
            .iter()
            .map(|branch| {
                let input = branch.select(frame)?;
                Ok(branch.transformer.transform(&input)?.prefixed(&branch.name)?)
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Ok(Frame::hstack(outputs)?)
    }

    fn fit_transform(&mut self, frame: &Frame) -> Result<Frame, PipelineError> {
        // unfitted until every branch succeeds
        self.feature_names_out = None;
        let mut outputs = Vec::with_capacity(self.branches.len());
        for branch in &mut self.branches {
            let input = branch.select(frame)?;
            let output = branch.transformer.fit_transform(&input)?;
            debug!(
                "branch '{}' mapped {} columns to {}",
                branch.name,
                input.n_cols(),
                output.n_cols()
            );
            outputs.push(output.prefixed(&branch.name)?);
        }

        let out = Frame::hstack(outputs)?;
        self.feature_names_out = Some(out.column_names().into_iter().map(String::from).collect());
        Ok(out)
    }
}
