//! Random forest classifier

use super::{check_features, class_counts, majority, DecisionTreeClassifier, DEFAULT_SEED};
use crate::core::{check_samples, Estimator, PipelineError};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::str::FromStr;
use tracing::debug;

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let m = match *self {
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2 => n.log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        m.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => Err(format!("unknown max_features '{}'", other)),
        }
    }
}

/// Bagged ensemble of decision trees voting by majority
///
/// Tree `i` draws its bootstrap sample and feature subsets from a ChaCha
/// generator seeded with `random_state + i`, so fitted forests are
/// reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
    trees: Vec<DecisionTreeClassifier>,
    n_features: usize,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    /// Mean of the per-tree importances
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut total: Array1<f64> = Array1::zeros(self.n_features);
        for imp in self.trees.iter().filter_map(|t| t.feature_importances()) {
            total += imp;
        }
        Some(total / self.trees.len() as f64)
    }

    /// Check hyperparameters without fitting
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.n_estimators == 0 {
            return Err(PipelineError::Configuration(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        match self.max_features {
            MaxFeatures::Fixed(0) => {
                return Err(PipelineError::Configuration(
                    "max_features must be at least 1".to_string(),
                ))
            }
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(PipelineError::Configuration(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )))
            }
            _ => {}
        }
        DecisionTreeClassifier::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .validate()
    }
}

impl Estimator for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError> {
        check_samples(x, y)?;
        self.validate()?;

        let n_samples = x.nrows();
        let max_features = self.max_features.resolve(x.ncols());
        let base_seed = self.random_state.unwrap_or(DEFAULT_SEED);
        debug!(
            "fitting {} trees on {} samples, {} of {} features per split",
            self.n_estimators,
            n_samples,
            max_features,
            x.ncols()
        );

        let mut trees = Vec::with_capacity(self.n_estimators);
        for idx in 0..self.n_estimators {
            let seed = base_seed.wrapping_add(idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let mut tree = DecisionTreeClassifier::new()
                .with_min_samples_split(self.min_samples_split)
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_max_features(max_features)
                .with_random_state(seed);
            tree.max_depth = self.max_depth;

            if self.bootstrap {
                let sample: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample);
                let y_boot = y.select(Axis(0), &sample);
                tree.fit_with_rng(&x_boot, &y_boot, &mut rng)?;
            } else {
                tree.fit_with_rng(x, y, &mut rng)?;
            }
            trees.push(tree);
        }

        self.n_features = x.ncols();
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        if self.trees.is_empty() {
            return Err(PipelineError::NotFitted("RandomForestClassifier".to_string()));
        }
        check_features(self.n_features, x)?;

        let votes = self
            .trees
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((0..x.nrows())
            .map(|row| majority(&class_counts(votes.iter().map(|v| v[row]))))
            .collect())
    }
}
