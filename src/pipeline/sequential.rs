//! Sequential chain of named stages

use crate::{
    core::{PipelineError, Transformer},
    data::Frame,
};
use std::collections::HashSet;

/// A named transformer within a [`Pipeline`]
#[derive(Debug)]
pub struct Step {
    pub name: String,
    pub transformer: Box<dyn Transformer>,
}

/// Applies its steps in order, feeding each step the previous step's output
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Build a pipeline; step names must be unique and at least one step is required
    pub fn new<N: Into<String>>(
        steps: impl IntoIterator<Item = (N, Box<dyn Transformer>)>,
    ) -> Result<Self, PipelineError> {
        let steps: Vec<Step> = steps
            .into_iter()
            .map(|(name, transformer)| Step {
                name: name.into(),
                transformer,
            })
            .collect();

        if steps.is_empty() {
            return Err(PipelineError::Configuration(
                "a pipeline needs at least one step".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.name.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "duplicate step name '{}'",
                    step.name
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn step(&self, name: &str) -> Option<&dyn Transformer> {
        self.steps
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.transformer.as_ref())
    }
}

impl Transformer for Pipeline {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        self.fit_transform(frame).map(|_| ())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        let mut current = frame.clone();
        for step in &self.steps {
            current = step.transformer.transform(&current)?;
        }
        Ok(current)
    }

    fn fit_transform(&mut self, frame: &Frame) -> Result<Frame, PipelineError> {
        let mut current = frame.clone();
        for step in &mut self.steps {
            current = step.transformer.fit_transform(&current)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ImputeStrategy, SimpleImputer, StandardScaler};
    use polars::prelude::{NamedFrom, Series};

    fn boxed(t: impl Transformer + 'static) -> Box<dyn Transformer> {
        Box::new(t)
    }

    fn numeric_steps() -> Vec<(&'static str, Box<dyn Transformer>)> {
        vec![
            ("imputer", boxed(SimpleImputer::new(ImputeStrategy::Mean))),
            ("scaler", boxed(StandardScaler::default())),
        ]
    }

    #[test]
    fn test_steps_run_in_order() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[Some(1.0), None, Some(3.0)]))
            .unwrap();
        let mut pipeline = Pipeline::new(numeric_steps()).unwrap();
        let out = pipeline.fit_transform(&frame).unwrap();

        // imputed to the mean, then centered on it
        assert_eq!(out.column("x").unwrap().f64().unwrap().get(1), Some(0.0));
        assert_eq!(pipeline.step_names(), vec!["imputer", "scaler"]);
        assert!(pipeline.step("scaler").is_some());
    }

    #[test]
    fn test_duplicate_step_names_rejected() {
        let steps: Vec<(&str, Box<dyn Transformer>)> = vec![
            ("scaler", boxed(StandardScaler::default())),
            ("scaler", boxed(StandardScaler::default())),
        ];
        let err = Pipeline::new(steps).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let steps: Vec<(String, Box<dyn Transformer>)> = Vec::new();
        assert!(Pipeline::new(steps).is_err());
    }

    #[test]
    fn test_transform_before_fit() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[1.0]))
            .unwrap();
        let pipeline = Pipeline::new(numeric_steps()).unwrap();
        assert!(matches!(
            pipeline.transform(&frame),
            Err(PipelineError::NotFitted(_))
        ));
    }
}
