//! Stratified k-fold splitting for tuning and internal model selection

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::error::{FraudMlError, Result};

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter.
///
/// Maintains class proportions across folds, which matters for the heavily
/// imbalanced fraud label. Class grouping uses a BTreeMap so fold assignment
/// is identical across runs for a given seed.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: None,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits from the label vector.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CvSplit>> {
        let n_samples = y.len();

        if self.n_splits < 2 {
            return Err(FraudMlError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(FraudMlError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, self.n_splits
            )));
        }

        // Group sample indices by class label
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Deal samples from each class round-robin into folds
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in class_indices.values() {
            for (i, &idx) in indices.iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let mut splits = Vec::with_capacity(self.n_splits);
        for fold_idx in 0..self.n_splits {
            let test_indices = folds[fold_idx].clone();
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            if test_indices.is_empty() || train_indices.is_empty() {
                return Err(FraudMlError::ValidationError(format!(
                    "fold {} is empty, too few samples for {} splits",
                    fold_idx, self.n_splits
                )));
            }

            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_folds_cover_all_samples() {
        let y = Array1::from_vec(
            (0..50).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect(),
        );
        let cv = StratifiedKFold::new(5).with_random_state(42);
        let splits = cv.split(&y).unwrap();

        assert_eq!(splits.len(), 5);
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_class_proportions_preserved() {
        let y = Array1::from_vec(
            std::iter::repeat(0.0)
                .take(20)
                .chain(std::iter::repeat(1.0).take(10))
                .collect(),
        );
        let cv = StratifiedKFold::new(5).with_shuffle(false);
        let splits = cv.split(&y).unwrap();

        for split in &splits {
            let positives = split
                .test_indices
                .iter()
                .filter(|&&i| y[i] > 0.5)
                .count();
            assert_eq!(positives, 2);
            assert_eq!(split.test_indices.len(), 6);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let y = Array1::from_vec((0..40).map(|i| (i % 2) as f64).collect());
        let a = StratifiedKFold::new(4).with_random_state(7).split(&y).unwrap();
        let b = StratifiedKFold::new(4).with_random_state(7).split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_too_few_samples() {
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0]);
        assert!(StratifiedKFold::new(5).split(&y).is_err());
        assert!(StratifiedKFold::new(1).split(&y).is_err());
    }
}
