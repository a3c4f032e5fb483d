//! Fixed two-branch pipeline assembly

use super::{Branch, ColumnTransformer, CompositePipeline, Pipeline};
use crate::core::{Estimator, PipelineError, Transformer};
use tracing::{debug, info};

pub const NUMERICAL_BRANCH: &str = "num";
pub const CATEGORICAL_BRANCH: &str = "cat";
pub const NUMERICAL_IMPUTER: &str = "numerical_imputer";
pub const NUMERICAL_SCALER: &str = "numerical_scaler";
pub const CATEGORICAL_IMPUTER: &str = "categorical_imputer";
pub const CATEGORICAL_ENCODER: &str = "categorical_encoder";

/// Wire imputer/scaler and imputer/encoder branches in front of an estimator
///
/// The numerical branch output comes first, then the categorical branch.
/// A feature list that is empty drops its branch; with both empty there is
/// nothing to route and the build fails with a configuration error. Columns
/// are only looked up when the pipeline is fitted.
#[allow(clippy::too_many_arguments)]
pub fn create_pipeline<C: AsRef<str>, N: AsRef<str>>(
    numerical_imputer: Box<dyn Transformer>,
    numerical_scaler: Box<dyn Transformer>,
    categorical_imputer: Box<dyn Transformer>,
    categorical_encoder: Box<dyn Transformer>,
    categorical_features: &[C],
    numerical_features: &[N],
    estimator: Box<dyn Estimator>,
) -> Result<CompositePipeline, PipelineError> {
    let mut branches = Vec::with_capacity(2);

    if numerical_features.is_empty() {
        debug!("no numerical features, dropping the '{}' branch", NUMERICAL_BRANCH);
    } else {
        let steps = Pipeline::new([
            (NUMERICAL_IMPUTER, numerical_imputer),
            (NUMERICAL_SCALER, numerical_scaler),
        ])?;
        branches.push(Branch::new(NUMERICAL_BRANCH, Box::new(steps), numerical_features));
    }

    if categorical_features.is_empty() {
        debug!("no categorical features, dropping the '{}' branch", CATEGORICAL_BRANCH);
    } else {
        let steps = Pipeline::new([
            (CATEGORICAL_IMPUTER, categorical_imputer),
            (CATEGORICAL_ENCODER, categorical_encoder),
        ])?;
        branches.push(Branch::new(CATEGORICAL_BRANCH, Box::new(steps), categorical_features));
    }

    if branches.is_empty() {
        return Err(PipelineError::Configuration(
            "both numerical_features and categorical_features are empty".to_string(),
        ));
    }

    info!(
        "assembled pipeline: {} numerical, {} categorical features",
        numerical_features.len(),
        categorical_features.len()
    );
    Ok(CompositePipeline::new(ColumnTransformer::new(branches)?, estimator))
}
