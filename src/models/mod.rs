//! Classifier implementations
//!
//! Every model exposes `fit(x, y)` and `predict(x)` over `ndarray` matrices
//! and serializes with serde so trained state can be persisted as an
//! artifact. The [`Classifier`] enum is the dispatch surface the registry
//! hands out.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod decision_tree;
pub mod gradient_boosting;
pub mod logistic;
pub mod naive_bayes;
pub mod random_forest;
pub mod svm;

pub use decision_tree::{DecisionTreeClassifier, SplitCriterion};
pub use gradient_boosting::GradientBoostedTrees;
pub use logistic::{LogisticRegression, LogisticRegressionCv};
pub use naive_bayes::GaussianNb;
pub use random_forest::{FeatureSampling, RandomForestClassifier};
pub use svm::{SvmClassifier, SvmKernel};

use crate::error::{FraudMlError, Result};

/// A trainable classifier, unfitted when produced by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
    LogisticRegression(LogisticRegression),
    LogisticRegressionCv(LogisticRegressionCv),
    NaiveBayes(GaussianNb),
    SupportVectorMachine(SvmClassifier),
    GradientBoostedTrees(GradientBoostedTrees),
}

impl Classifier {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::DecisionTree(m) => m.fit(x, y),
            Classifier::RandomForest(m) => m.fit(x, y),
            Classifier::LogisticRegression(m) => m.fit(x, y),
            Classifier::LogisticRegressionCv(m) => m.fit(x, y),
            Classifier::NaiveBayes(m) => m.fit(x, y),
            Classifier::SupportVectorMachine(m) => m.fit(x, y),
            Classifier::GradientBoostedTrees(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::DecisionTree(m) => m.predict(x),
            Classifier::RandomForest(m) => m.predict(x),
            Classifier::LogisticRegression(m) => m.predict(x),
            Classifier::LogisticRegressionCv(m) => m.predict(x),
            Classifier::NaiveBayes(m) => m.predict(x),
            Classifier::SupportVectorMachine(m) => m.predict(x),
            Classifier::GradientBoostedTrees(m) => m.predict(x),
        }
    }

    /// Short human-readable name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::DecisionTree(_) => "decision-tree",
            Classifier::RandomForest(_) => "random-forest",
            Classifier::LogisticRegression(_) => "logistic-regression",
            Classifier::LogisticRegressionCv(_) => "logistic-regression-cv",
            Classifier::NaiveBayes(_) => "naive-bayes",
            Classifier::SupportVectorMachine(_) => "support-vector-machine",
            Classifier::GradientBoostedTrees(_) => "gradient-boosted-trees",
        }
    }
}

/// Shared fit-time validation: non-empty data with matching label length
pub(crate) fn validate_fit_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(FraudMlError::ValidationError(
            "training data is empty".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(FraudMlError::ShapeMismatch {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    Ok(())
}

/// Binary models require labels drawn from {0, 1}
pub(crate) fn validate_binary_labels(y: &Array1<f64>) -> Result<()> {
    for &v in y.iter() {
        let label = v.round() as i64;
        if (v - label as f64).abs() > 1e-9 || (label != 0 && label != 1) {
            return Err(FraudMlError::ValidationError(format!(
                "expected binary labels in {{0, 1}}, found {}",
                v
            )));
        }
    }
    Ok(())
}

/// Distinct integer class labels in ascending order
pub(crate) fn sorted_classes(y: &Array1<f64>) -> Vec<i64> {
    let set: BTreeSet<i64> = y.iter().map(|&v| v.round() as i64).collect();
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_validate_shapes() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(validate_fit_shapes(&x, &array![0.0, 1.0]).is_ok());
        assert!(validate_fit_shapes(&x, &array![0.0]).is_err());
        let empty: Array2<f64> = Array2::zeros((0, 2));
        assert!(validate_fit_shapes(&empty, &array![]).is_err());
    }

    #[test]
    fn test_validate_binary_labels() {
        assert!(validate_binary_labels(&array![0.0, 1.0, 1.0]).is_ok());
        assert!(validate_binary_labels(&array![0.0, 2.0]).is_err());
        assert!(validate_binary_labels(&array![0.5]).is_err());
    }

    #[test]
    fn test_sorted_classes() {
        let y = array![2.0, 0.0, 1.0, 2.0, 0.0];
        assert_eq!(sorted_classes(&y), vec![0, 1, 2]);
    }

    #[test]
    fn test_classifier_roundtrips_through_json() {
        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut model = Classifier::DecisionTree(DecisionTreeClassifier::new());
        model.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: Classifier = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }
}
