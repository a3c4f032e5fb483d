//! Feature scaling

use super::{fitted_column, numeric_values};
use crate::{
    core::{PipelineError, Transformer},
    data::Frame,
};
use polars::prelude::*;

/// Per-column affine map `(x - shift) / scale`
#[derive(Debug, Clone, PartialEq)]
struct Affine {
    column: String,
    shift: f64,
    scale: f64,
}

fn apply(stage: &str, params: &Option<Vec<Affine>>, frame: &Frame) -> Result<Frame, PipelineError> {
    let params = params
        .as_ref()
        .ok_or_else(|| PipelineError::NotFitted(stage.to_string()))?;

    let mut out = Frame::new();
    for p in params {
        let values = numeric_values(stage, &p.column, fitted_column(frame, &p.column)?)?;
        let scaled: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.map(|x| (x - p.shift) / p.scale))
            .collect();
        out.push_column(Series::new(p.column.as_str().into(), scaled))?;
    }
    Ok(out)
}

/// Standardizes columns to zero mean and unit variance
///
/// Uses the population standard deviation; constant columns are only centered.
/// Missing cells are ignored when fitting and stay missing.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    with_mean: bool,
    with_std: bool,
    params: Option<Vec<Affine>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl StandardScaler {
    pub fn new(with_mean: bool, with_std: bool) -> Self {
        Self {
            with_mean,
            with_std,
            params: None,
        }
    }

    /// Learned `(mean, std)` pairs, in column order
    pub fn statistics(&self) -> Option<Vec<(f64, f64)>> {
        self.params
            .as_ref()
            .map(|ps| ps.iter().map(|p| (p.shift, p.scale)).collect())
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let mut params = Vec::with_capacity(frame.n_cols());
        for (name, column) in frame.columns() {
            let observed: Vec<f64> = numeric_values("StandardScaler", name, column)?
                .iter()
                .flatten()
                .collect();
            let n = observed.len().max(1) as f64;
            let mean = observed.iter().sum::<f64>() / n;
            let var = observed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();

            params.push(Affine {
                column: name.to_string(),
                shift: if self.with_mean { mean } else { 0.0 },
                scale: if self.with_std && std > 0.0 { std } else { 1.0 },
            });
        }
        self.params = Some(params);
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        apply("StandardScaler", &self.params, frame)
    }
}

/// Rescales columns into `[min, max]` using the range seen during fit
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
    params: Option<Vec<Affine>>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            params: None,
        }
    }
}

impl MinMaxScaler {
    pub fn new(min: f64, max: f64) -> Result<Self, PipelineError> {
        if !(min < max) {
            return Err(PipelineError::Configuration(format!(
                "feature_range minimum {} must be smaller than maximum {}",
                min, max
            )));
        }
        Ok(Self {
            min,
            max,
            params: None,
        })
    }

    pub fn feature_range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl Transformer for MinMaxScaler {
    fn fit(&mut self, frame: &Frame) -> Result<(), PipelineError> {
        let span = self.max - self.min;
        let mut params = Vec::with_capacity(frame.n_cols());
        for (name, column) in frame.columns() {
            let (lo, hi) = numeric_values("MinMaxScaler", name, column)?
                .iter()
                .flatten()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            let (lo, hi) = if lo.is_finite() { (lo, hi) } else { (0.0, 0.0) };
            let range = if hi > lo { hi - lo } else { 1.0 };

            // (x - lo) / range * span + min == (x - shift) / scale
            let scale = range / span;
            params.push(Affine {
                column: name.to_string(),
                shift: lo - self.min * scale,
                scale,
            });
        }
        self.params = Some(params);
        Ok(())
    }

    fn transform(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        apply("MinMaxScaler", &self.params, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(frame: &Frame, name: &str) -> Vec<f64> {
        frame
            .column(name)
            .unwrap()
            .f64()
            .unwrap()
            .iter()
            .map(|v| v.unwrap())
            .collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_standard_scaler() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[1.0, 2.0, 3.0]))
            .unwrap();
        let mut scaler = StandardScaler::default();
        let out = scaler.fit_transform(&frame).unwrap();
        let std = (2.0f64 / 3.0).sqrt();
        assert_close(&values(&out, "x"), &[-1.0 / std, 0.0, 1.0 / std]);
    }

    #[test]
    fn test_standard_scaler_constant_column() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[4.0, 4.0]))
            .unwrap();
        let mut scaler = StandardScaler::default();
        let out = scaler.fit_transform(&frame).unwrap();
        assert_close(&values(&out, "x"), &[0.0, 0.0]);
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[2.0, 4.0]))
            .unwrap();
        let mut scaler = StandardScaler::new(false, true);
        let out = scaler.fit_transform(&frame).unwrap();
        assert_close(&values(&out, "x"), &[2.0, 4.0]);
        assert_eq!(scaler.statistics(), Some(vec![(0.0, 1.0)]));
    }

    #[test]
    fn test_standard_scaler_keeps_missing_cells() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[Some(1.0), None, Some(3.0)]))
            .unwrap();
        let mut scaler = StandardScaler::default();
        let out = scaler.fit_transform(&frame).unwrap();
        assert_eq!(out.column("x").unwrap().null_count(), 1);
    }

    #[test]
    fn test_min_max_scaler() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[10.0, 15.0, 20.0]))
            .unwrap();
        let mut scaler = MinMaxScaler::new(-1.0, 1.0).unwrap();
        let out = scaler.fit_transform(&frame).unwrap();
        assert_close(&values(&out, "x"), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_min_max_rejects_inverted_range() {
        assert!(matches!(
            MinMaxScaler::new(1.0, 0.0),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_scalers_reject_categorical_columns() {
        let frame = Frame::new()
            .with_column(Series::new("city".into(), &["a", "b"]))
            .unwrap();
        assert!(matches!(
            StandardScaler::default().fit(&frame),
            Err(PipelineError::Unsupported { .. })
        ));
        assert!(matches!(
            MinMaxScaler::default().fit(&frame),
            Err(PipelineError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_scaler_transform_before_fit() {
        let frame = Frame::new()
            .with_column(Series::new("x".into(), &[1.0]))
            .unwrap();
        assert!(matches!(
            StandardScaler::default().transform(&frame),
            Err(PipelineError::NotFitted(_))
        ));
    }
}
