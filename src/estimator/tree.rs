//! CART decision tree classifier

use super::{check_features, class_counts, majority, DEFAULT_SEED};
use crate::core::{check_samples, Estimator, PipelineError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

fn gini(counts: &BTreeMap<i64, usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .values()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

/// Binary classification tree grown with the Gini criterion
///
/// Thresholds are midpoints between consecutive distinct feature values.
/// When `max_features` is set, each split considers a random subset of
/// features drawn from a generator seeded by `random_state`.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    root: Option<TreeNode>,
    n_features: usize,
    importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            root: None,
            n_features: 0,
            importances: None,
        }
    }
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.importances.as_ref()
    }

    /// Depth of the fitted tree (a single leaf has depth 0)
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.min_samples_split < 2 {
            return Err(PipelineError::Configuration(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(PipelineError::Configuration(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(PipelineError::Configuration(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fit drawing feature subsets from a caller-owned generator
    pub(crate) fn fit_with_rng(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), PipelineError> {
        check_samples(x, y)?;
        self.validate()?;

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.grow(x, y, &indices, 0, rng, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }
        self.importances = Some(Array1::from_vec(importances));
        self.root = Some(root);
        Ok(())
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let counts = class_counts(indices.iter().map(|&i| y[i]));
        let leaf = TreeNode::Leaf {
            value: majority(&counts),
        };

        let n = indices.len();
        if n < self.min_samples_split
            || counts.len() <= 1
            || self.max_depth.map_or(false, |d| depth >= d)
        {
            return leaf;
        }

        let parent = gini(&counts, n);
        let Some((feature, threshold, gain)) = self.best_split(x, y, indices, parent, rng) else {
            return leaf;
        };
        importances[feature] += n as f64 * gain;

        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature]] <= threshold);
        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.grow(x, y, &left, depth + 1, rng, importances)),
            right: Box::new(self.grow(x, y, &right, depth + 1, rng, importances)),
        }
    }

    /// Best `(feature, threshold, gain)` with strictly positive gain
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let features: Vec<usize> = match self.max_features {
            Some(m) if m < n_features => {
                let mut picked = sample(rng, n_features, m).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        };

        let n = indices.len();
        let total = class_counts(indices.iter().map(|&i| y[i]));
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in features {
            let mut pairs: Vec<(f64, i64)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], y[i].round() as i64))
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left: BTreeMap<i64, usize> = BTreeMap::new();
            let mut right = total.clone();
            for i in 0..n - 1 {
                let (value, class) = pairs[i];
                *left.entry(class).or_insert(0) += 1;
                if let Some(c) = right.get_mut(&class) {
                    *c -= 1;
                }
                let next = pairs[i + 1].0;
                if value == next {
                    continue;
                }

                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                let gain = parent - weighted;
                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, (value + next) / 2.0, gain));
                }
            }
        }
        best
    }
}

impl Estimator for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), PipelineError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(DEFAULT_SEED));
        self.fit_with_rng(x, y, &mut rng)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("DecisionTreeClassifier".to_string()))?;
        check_features(self.n_features, x)?;
        Ok(x.rows().into_iter().map(|row| root.predict(row)).collect())
    }
}
