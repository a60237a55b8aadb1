//! Decision tree classifier
//!
//! Greedy CART with Gini or entropy impurity. Splits are scanned by sorting
//! each candidate feature once and sweeping class counts across the sorted
//! order, so every boundary between distinct values is considered.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{FraudMlError, Result};
use crate::models::{sorted_classes, validate_fit_shapes};

/// Impurity criterion for split selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitCriterion {
    Gini,
    Entropy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: f64,
        n_samples: usize,
    },
    Branch {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    root: Option<Node>,
    pub criterion: SplitCriterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Restrict splits to these feature indices (set by the forest)
    pub(crate) feature_subset: Option<Vec<usize>>,
    classes: Vec<i64>,
    n_features: usize,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self {
            root: None,
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            feature_subset: None,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
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

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;

        self.n_features = x.ncols();
        self.classes = sorted_classes(y);

        let class_of: Vec<usize> = y
            .iter()
            .map(|&v| {
                let label = v.round() as i64;
                self.classes.binary_search(&label).unwrap_or(0)
            })
            .collect();

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.grow(x, &class_of, &indices, 0));
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(FraudMlError::NotFitted)?;

        if x.ncols() != self.n_features {
            return Err(FraudMlError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        Node::Leaf { class, .. } => break *class,
                        Node::Branch {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Depth of the fitted tree (0 if unfitted)
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Branch { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(|n| walk(n)).unwrap_or(0)
    }

    fn grow(&self, x: &Array2<f64>, class_of: &[usize], indices: &[usize], depth: usize) -> Node {
        let counts = self.class_counts(class_of, indices);

        let at_depth_limit = self.max_depth.map_or(false, |d| depth >= d);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if pure || at_depth_limit || indices.len() < self.min_samples_split {
            return self.leaf(&counts, indices.len());
        }

        let split = self.best_split(x, class_of, indices, &counts);
        let (feature, threshold) = match split {
            Some(s) => s,
            None => return self.leaf(&counts, indices.len()),
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);

        if left_idx.len() < self.min_samples_leaf || right_idx.len() < self.min_samples_leaf {
            return self.leaf(&counts, indices.len());
        }

        Node::Branch {
            feature,
            threshold,
            left: Box::new(self.grow(x, class_of, &left_idx, depth + 1)),
            right: Box::new(self.grow(x, class_of, &right_idx, depth + 1)),
        }
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> Node {
        // Majority class; ties resolve to the lower label
        let best = counts
            .iter()
            .enumerate()
            .max_by(|(ia, ca), (ib, cb)| ca.cmp(cb).then(ib.cmp(ia)))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Node::Leaf {
            class: self.classes[best] as f64,
            n_samples,
        }
    }

    fn class_counts(&self, class_of: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[class_of[i]] += 1;
        }
        counts
    }

    /// Best (feature, threshold) by impurity decrease, or None when no split
    /// improves on the parent.
    fn best_split(
        &self,
        x: &Array2<f64>,
        class_of: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let parent_impurity = self.impurity(parent_counts, indices.len());

        let all_features: Vec<usize>;
        let candidates: &[usize] = match &self.feature_subset {
            Some(subset) => subset,
            None => {
                all_features = (0..self.n_features).collect();
                &all_features
            }
        };

        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

        for &feature in candidates {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_counts = vec![0usize; self.classes.len()];
            let mut right_counts = parent_counts.to_vec();

            for w in 0..order.len() - 1 {
                let i = order[w];
                left_counts[class_of[i]] += 1;
                right_counts[class_of[i]] -= 1;

                let v_here = x[[i, feature]];
                let v_next = x[[order[w + 1], feature]];
                if v_next <= v_here {
                    continue; // no boundary between equal values
                }

                let n_left = w + 1;
                let n_right = order.len() - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * self.impurity(&left_counts, n_left)
                    + n_right as f64 * self.impurity(&right_counts, n_right))
                    / n;
                let gain = parent_impurity - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, (v_here + v_next) / 2.0, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }

    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self.criterion {
            SplitCriterion::Gini => {
                1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
            }
            SplitCriterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}
