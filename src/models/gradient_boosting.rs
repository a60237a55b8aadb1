//! Gradient-boosted trees for binary classification
//!
//! Logistic boosting: the ensemble accumulates log-odds. Each round fits a
//! depth-limited regression tree to the gradient residuals `y - p` and sets
//! leaf values with a Newton step (gradient sum over hessian sum), then the
//! round's contribution is shrunk by the learning rate.

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{FraudMlError, Result};
use crate::models::{validate_binary_labels, validate_fit_shapes};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows sampled per round
    pub subsample: f64,
    pub random_state: Option<u64>,
    init_score: f64,
    trees: Vec<ResidualTree>,
    is_fitted: bool,
}

impl Default for GradientBoostedTrees {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientBoostedTrees {
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: None,
            init_score: 0.0,
            trees: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n.max(1);
        self
    }

    pub fn with_subsample(mut self, fraction: f64) -> Self {
        self.subsample = fraction.clamp(0.1, 1.0);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;
        validate_binary_labels(y)?;

        let n_samples = x.nrows();

        // Log-odds of the base rate, clamped away from degenerate 0/1
        let pos_rate = y.mean().unwrap_or(0.5).clamp(1e-6, 1.0 - 1e-6);
        self.init_score = (pos_rate / (1.0 - pos_rate)).ln();

        let mut scores = Array1::from_elem(n_samples, self.init_score);
        let mut rng =
            Xoshiro256PlusPlus::seed_from_u64(self.random_state.unwrap_or(42));
        self.trees = Vec::with_capacity(self.n_estimators);

        let subsample_size =
            ((n_samples as f64 * self.subsample).round() as usize).clamp(1, n_samples);

        for _ in 0..self.n_estimators {
            let probs = scores.mapv(|s| 1.0 / (1.0 + (-s).exp()));
            let gradients: Vec<f64> =
                y.iter().zip(probs.iter()).map(|(yi, pi)| yi - pi).collect();
            let hessians: Vec<f64> = probs.iter().map(|p| p * (1.0 - p)).collect();

            let rows: Vec<usize> = if subsample_size < n_samples {
                let mut all: Vec<usize> = (0..n_samples).collect();
                all.shuffle(&mut rng);
                all.truncate(subsample_size);
                all.sort_unstable();
                all
            } else {
                (0..n_samples).collect()
            };

            let tree = ResidualTree::fit(
                x,
                &gradients,
                &hessians,
                &rows,
                self.max_depth,
                self.min_samples_leaf,
            );

            for i in 0..n_samples {
                scores[i] += self.learning_rate * tree.predict_row(x, i);
            }
            self.trees.push(tree);
        }

        self.is_fitted = true;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(FraudMlError::NotFitted);
        }

        let scores: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let mut score = self.init_score;
                for tree in &self.trees {
                    score += self.learning_rate * tree.predict_row(x, i);
                }
                score
            })
            .collect();

        Ok(Array1::from_vec(scores).mapv(|s| 1.0 / (1.0 + (-s).exp())))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

/// Regression tree over boosting residuals. Splits minimize residual
/// variance; leaves hold the Newton step for the logistic loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum ResidualTree {
    Leaf {
        value: f64,
    },
    Branch {
        feature: usize,
        threshold: f64,
        left: Box<ResidualTree>,
        right: Box<ResidualTree>,
    },
}

impl ResidualTree {
    fn fit(
        x: &Array2<f64>,
        gradients: &[f64],
        hessians: &[f64],
        indices: &[usize],
        depth_left: usize,
        min_samples_leaf: usize,
    ) -> Self {
        if depth_left == 0 || indices.len() < 2 * min_samples_leaf {
            return Self::leaf(gradients, hessians, indices);
        }

        let split = Self::best_split(x, gradients, indices, min_samples_leaf);
        let (feature, threshold) = match split {
            Some(s) => s,
            None => return Self::leaf(gradients, hessians, indices),
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);

        ResidualTree::Branch {
            feature,
            threshold,
            left: Box::new(Self::fit(
                x,
                gradients,
                hessians,
                &left_idx,
                depth_left - 1,
                min_samples_leaf,
            )),
            right: Box::new(Self::fit(
                x,
                gradients,
                hessians,
                &right_idx,
                depth_left - 1,
                min_samples_leaf,
            )),
        }
    }

    fn leaf(gradients: &[f64], hessians: &[f64], indices: &[usize]) -> Self {
        let grad_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let hess_sum: f64 = indices.iter().map(|&i| hessians[i]).sum();
        ResidualTree::Leaf {
            value: grad_sum / (hess_sum + 1e-12),
        }
    }

    /// Variance-reduction split over the residuals
    fn best_split(
        x: &Array2<f64>,
        gradients: &[f64],
        indices: &[usize],
        min_samples_leaf: usize,
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| gradients[i].powi(2)).sum();
        let parent_var = total_sq / n - (total_sum / n).powi(2);

        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..x.ncols() {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for w in 0..order.len() - 1 {
                let g = gradients[order[w]];
                left_sum += g;
                left_sq += g * g;

                let v_here = x[[order[w], feature]];
                let v_next = x[[order[w + 1], feature]];
                if v_next <= v_here {
                    continue;
                }

                let n_left = (w + 1) as f64;
                let n_right = n - n_left;
                if (n_left as usize) < min_samples_leaf
                    || (n_right as usize) < min_samples_leaf
                {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_var = left_sq / n_left - (left_sum / n_left).powi(2);
                let right_var = right_sq / n_right - (right_sum / n_right).powi(2);
                let weighted = (n_left * left_var + n_right * right_var) / n;
                let gain = parent_var - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, (v_here + v_next) / 2.0, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }

    fn predict_row(&self, x: &Array2<f64>, row: usize) -> f64 {
        let mut node = self;
        loop {
            match node {
                ResidualTree::Leaf { value } => break *value,
                ResidualTree::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[[row, *feature]] <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 1.0],
            [0.4, 0.8],
            [0.2, 1.1],
            [0.5, 0.9],
            [0.1, 1.2],
            [4.0, 5.0],
            [4.4, 4.8],
            [4.2, 5.1],
            [4.5, 4.9],
            [4.1, 5.2],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_fit_predict() {
        let (x, y) = training_data();
        let mut gbt = GradientBoostedTrees::new()
            .with_n_estimators(30)
            .with_random_state(42);
        gbt.fit(&x, &y).unwrap();
        assert_eq!(gbt.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_probabilities_move_with_boosting() {
        let (x, y) = training_data();
        let mut gbt = GradientBoostedTrees::new()
            .with_n_estimators(50)
            .with_random_state(1);
        gbt.fit(&x, &y).unwrap();

        let proba = gbt.predict_proba(&x).unwrap();
        for (p, yi) in proba.iter().zip(y.iter()) {
            if *yi > 0.5 {
                assert!(*p > 0.5);
            } else {
                assert!(*p < 0.5);
            }
        }
    }

    #[test]
    fn test_subsample_reproducible() {
        let (x, y) = training_data();
        let mut a = GradientBoostedTrees::new()
            .with_n_estimators(20)
            .with_subsample(0.8)
            .with_random_state(3);
        let mut b = a.clone();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let probe = array![[2.0, 3.0], [0.3, 1.0]];
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
    }

    #[test]
    fn test_predict_before_fit() {
        let gbt = GradientBoostedTrees::new();
        assert!(matches!(
            gbt.predict(&array![[0.0, 0.0]]),
            Err(FraudMlError::NotFitted)
        ));
    }
}
