//! Random forest classifier
//!
//! Bagged decision trees with per-tree feature subsampling. Trees are built
//! in parallel; each tree derives its RNG from `random_state + tree index`,
//! so a fixed seed reproduces the forest exactly regardless of thread
//! scheduling.

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FraudMlError, Result};
use crate::models::decision_tree::{DecisionTreeClassifier, SplitCriterion};
use crate::models::validate_fit_shapes;

/// How many features each tree may split on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureSampling {
    /// ceil(sqrt(n_features))
    Sqrt,
    /// ceil(log2(n_features))
    Log2,
    /// All features (bagging only)
    All,
    /// Fixed count, clamped to n_features
    Fixed(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: SplitCriterion,
    pub feature_sampling: FeatureSampling,
    pub random_state: Option<u64>,
    n_features: usize,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomForestClassifier {
    pub fn new() -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            feature_sampling: FeatureSampling::Sqrt,
            random_state: None,
            n_features: 0,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n.max(1);
        self
    }

    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_feature_sampling(mut self, sampling: FeatureSampling) -> Self {
        self.feature_sampling = sampling;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn features_per_tree(&self, n_features: usize) -> usize {
        let k = match self.feature_sampling {
            FeatureSampling::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            FeatureSampling::Log2 => (n_features as f64).log2().ceil() as usize,
            FeatureSampling::All => n_features,
            FeatureSampling::Fixed(n) => n.min(n_features),
        };
        k.clamp(1, n_features)
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        let k_features = self.features_per_tree(self.n_features);
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<Result<DecisionTreeClassifier>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                // Bootstrap rows
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() % n_samples as u64) as usize)
                    .collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot =
                    Array1::from_iter(sample_indices.iter().map(|&i| y[i]));

                // Feature subset for this tree
                let mut features: Vec<usize> = (0..self.n_features).collect();
                features.shuffle(&mut rng);
                features.truncate(k_features);
                features.sort_unstable();

                let mut tree = DecisionTreeClassifier::new()
                    .with_criterion(self.criterion)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.feature_subset = Some(features);

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(FraudMlError::NotFitted);
        }

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .iter()
            .map(|t| t.predict(x))
            .collect::<Result<Vec<_>>>()?;

        // Majority vote per sample; ties resolve to the lower label
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
                for preds in &per_tree {
                    *votes.entry(preds[i].round() as i64).or_insert(0) += 1;
                }
                votes
                    .into_iter()
                    .max_by(|(la, ca), (lb, cb)| ca.cmp(cb).then(lb.cmp(la)))
                    .map(|(label, _)| label as f64)
                    .unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
