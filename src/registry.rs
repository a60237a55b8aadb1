//! Model registry and dispatch
//!
//! Maps a short model identifier onto a freshly constructed, unfitted
//! classifier with explicit defaults applied and caller-supplied parameter
//! overrides merged in. This is a pure factory: no I/O, no shared state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{ParamMap, ParamValue};
use crate::error::{FraudMlError, Result};
use crate::models::{
    Classifier, DecisionTreeClassifier, FeatureSampling, GaussianNb, GradientBoostedTrees,
    LogisticRegression, LogisticRegressionCv, RandomForestClassifier, SplitCriterion,
    SvmClassifier, SvmKernel,
};

/// The supported model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    RandomForest,
    LogisticRegression,
    LogisticRegressionCv,
    DecisionTree,
    GradientBoostedTrees,
    NaiveBayes,
    SupportVectorMachine,
}

impl ModelKind {
    pub const ALL: [ModelKind; 7] = [
        ModelKind::RandomForest,
        ModelKind::LogisticRegression,
        ModelKind::LogisticRegressionCv,
        ModelKind::DecisionTree,
        ModelKind::GradientBoostedTrees,
        ModelKind::NaiveBayes,
        ModelKind::SupportVectorMachine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random-forest",
            ModelKind::LogisticRegression => "logistic-regression",
            ModelKind::LogisticRegressionCv => "logistic-regression-cv",
            ModelKind::DecisionTree => "decision-tree",
            ModelKind::GradientBoostedTrees => "gradient-boosted-trees",
            ModelKind::NaiveBayes => "naive-bayes",
            ModelKind::SupportVectorMachine => "support-vector-machine",
        }
    }
}

impl FromStr for ModelKind {
    type Err = FraudMlError;

    /// Case-insensitive; anything outside the supported set is rejected,
    /// never silently defaulted.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "random-forest" => Ok(ModelKind::RandomForest),
            "logistic-regression" => Ok(ModelKind::LogisticRegression),
            "logistic-regression-cv" => Ok(ModelKind::LogisticRegressionCv),
            "decision-tree" => Ok(ModelKind::DecisionTree),
            "gradient-boosted-trees" => Ok(ModelKind::GradientBoostedTrees),
            "naive-bayes" => Ok(ModelKind::NaiveBayes),
            "support-vector-machine" => Ok(ModelKind::SupportVectorMachine),
            other => Err(FraudMlError::InvalidModelIdentifier(other.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defaults threaded through every construction instead of hidden constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelDefaults {
    pub random_seed: u64,
    pub max_iter: usize,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            random_seed: 42,
            max_iter: 1000,
        }
    }
}

/// Substitution policy for direct (non-grid) fits.
///
/// A direct fit of plain logistic regression upgrades to the variant with
/// built-in regularization search; grid search always uses the kind it was
/// given, since the grid itself supplies the values.
pub fn direct_fit_kind(kind: ModelKind) -> ModelKind {
    match kind {
        ModelKind::LogisticRegression => ModelKind::LogisticRegressionCv,
        other => other,
    }
}

/// Construct an unfitted classifier for `kind` with `params` merged over the
/// built-in defaults.
pub fn build_classifier(
    kind: ModelKind,
    params: &ParamMap,
    defaults: &ModelDefaults,
) -> Result<Classifier> {
    match kind {
        ModelKind::DecisionTree => build_decision_tree(params),
        ModelKind::RandomForest => build_random_forest(params, defaults),
        ModelKind::LogisticRegression => build_logistic(params, defaults),
        ModelKind::LogisticRegressionCv => build_logistic_cv(params, defaults),
        ModelKind::NaiveBayes => build_naive_bayes(params),
        ModelKind::SupportVectorMachine => build_svm(params, defaults),
        ModelKind::GradientBoostedTrees => build_gradient_boosting(params, defaults),
    }
}

fn usize_param(name: &str, value: &ParamValue) -> Result<usize> {
    value.as_usize().ok_or_else(|| FraudMlError::InvalidParameter {
        name: name.to_string(),
        reason: format!("expected a non-negative integer, got {}", value),
    })
}

fn f64_param(name: &str, value: &ParamValue) -> Result<f64> {
    value.as_f64().ok_or_else(|| FraudMlError::InvalidParameter {
        name: name.to_string(),
        reason: format!("expected a number, got {}", value),
    })
}

fn str_param<'a>(name: &str, value: &'a ParamValue) -> Result<&'a str> {
    value.as_str().ok_or_else(|| FraudMlError::InvalidParameter {
        name: name.to_string(),
        reason: format!("expected a string, got {}", value),
    })
}

fn criterion_param(name: &str, value: &ParamValue) -> Result<SplitCriterion> {
    match str_param(name, value)? {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => Err(FraudMlError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected 'gini' or 'entropy', got '{}'", other),
        }),
    }
}

fn build_decision_tree(params: &ParamMap) -> Result<Classifier> {
    let mut model = DecisionTreeClassifier::new();
    for (name, value) in params {
        model = match name.as_str() {
            "max_depth" => model.with_max_depth(usize_param(name, value)?),
            "min_samples_split" => model.with_min_samples_split(usize_param(name, value)?),
            "min_samples_leaf" => model.with_min_samples_leaf(usize_param(name, value)?),
            "criterion" => model.with_criterion(criterion_param(name, value)?),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "decision-tree",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::DecisionTree(model))
}

fn build_random_forest(params: &ParamMap, defaults: &ModelDefaults) -> Result<Classifier> {
    let mut model = RandomForestClassifier::new().with_random_state(defaults.random_seed);
    for (name, value) in params {
        model = match name.as_str() {
            "n_estimators" => model.with_n_estimators(usize_param(name, value)?),
            "max_depth" => model.with_max_depth(usize_param(name, value)?),
            "min_samples_split" => model.with_min_samples_split(usize_param(name, value)?),
            "min_samples_leaf" => model.with_min_samples_leaf(usize_param(name, value)?),
            "criterion" => model.with_criterion(criterion_param(name, value)?),
            "max_features" => {
                let sampling = match value {
                    ParamValue::Int(_) => FeatureSampling::Fixed(usize_param(name, value)?),
                    _ => match str_param(name, value)? {
                        "sqrt" => FeatureSampling::Sqrt,
                        "log2" => FeatureSampling::Log2,
                        "all" => FeatureSampling::All,
                        other => {
                            return Err(FraudMlError::InvalidParameter {
                                name: name.clone(),
                                reason: format!(
                                    "expected 'sqrt', 'log2', 'all', or an integer, got '{}'",
                                    other
                                ),
                            })
                        }
                    },
                };
                model.with_feature_sampling(sampling)
            }
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "random-forest",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::RandomForest(model))
}

fn build_logistic(params: &ParamMap, defaults: &ModelDefaults) -> Result<Classifier> {
    let mut model = LogisticRegression::new().with_max_iter(defaults.max_iter);
    for (name, value) in params {
        model = match name.as_str() {
            "c" => model.with_c(f64_param(name, value)?),
            "learning_rate" => model.with_learning_rate(f64_param(name, value)?),
            "max_iter" => model.with_max_iter(usize_param(name, value)?),
            "tol" => model.with_tol(f64_param(name, value)?),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "logistic-regression",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::LogisticRegression(model))
}

fn build_logistic_cv(params: &ParamMap, defaults: &ModelDefaults) -> Result<Classifier> {
    let mut model = LogisticRegressionCv::new()
        .with_max_iter(defaults.max_iter)
        .with_random_state(defaults.random_seed);
    for (name, value) in params {
        model = match name.as_str() {
            "n_cs" => model.with_n_cs(usize_param(name, value)?),
            "folds" => model.with_folds(usize_param(name, value)?),
            "learning_rate" => model.with_learning_rate(f64_param(name, value)?),
            "max_iter" => model.with_max_iter(usize_param(name, value)?),
            "tol" => model.with_tol(f64_param(name, value)?),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "logistic-regression-cv",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::LogisticRegressionCv(model))
}

fn build_naive_bayes(params: &ParamMap) -> Result<Classifier> {
    let mut model = GaussianNb::new();
    for (name, value) in params {
        model = match name.as_str() {
            "var_smoothing" => model.with_var_smoothing(f64_param(name, value)?),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "naive-bayes",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::NaiveBayes(model))
}

fn build_svm(params: &ParamMap, defaults: &ModelDefaults) -> Result<Classifier> {
    let mut model = SvmClassifier::new()
        .with_max_iter(defaults.max_iter)
        .with_random_state(defaults.random_seed);
    // gamma applies to the RBF kernel; remember it across the loop so the
    // order of "kernel" and "gamma" keys does not matter
    let mut gamma: Option<f64> = None;
    let mut kernel_name: Option<String> = None;

    for (name, value) in params {
        match name.as_str() {
            "c" => model = model.with_c(f64_param(name, value)?),
            "max_iter" => model = model.with_max_iter(usize_param(name, value)?),
            "tol" => model = model.with_tol(f64_param(name, value)?),
            "gamma" => gamma = Some(f64_param(name, value)?),
            "kernel" => kernel_name = Some(str_param(name, value)?.to_string()),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "support-vector-machine",
                    name: name.clone(),
                })
            }
        }
    }

    let kernel = match kernel_name.as_deref() {
        None | Some("rbf") => SvmKernel::Rbf { gamma },
        Some("linear") => SvmKernel::Linear,
        Some(other) => {
            return Err(FraudMlError::InvalidParameter {
                name: "kernel".to_string(),
                reason: format!("expected 'linear' or 'rbf', got '{}'", other),
            })
        }
    };

    Ok(Classifier::SupportVectorMachine(model.with_kernel(kernel)))
}

fn build_gradient_boosting(params: &ParamMap, defaults: &ModelDefaults) -> Result<Classifier> {
    let mut model = GradientBoostedTrees::new().with_random_state(defaults.random_seed);
    for (name, value) in params {
        model = match name.as_str() {
            "n_estimators" => model.with_n_estimators(usize_param(name, value)?),
            "learning_rate" => model.with_learning_rate(f64_param(name, value)?),
            "max_depth" => model.with_max_depth(usize_param(name, value)?),
            "min_samples_leaf" => model.with_min_samples_leaf(usize_param(name, value)?),
            "subsample" => model.with_subsample(f64_param(name, value)?),
            _ => {
                return Err(FraudMlError::UnknownParameter {
                    model: "gradient-boosted-trees",
                    name: name.clone(),
                })
            }
        };
    }
    Ok(Classifier::GradientBoostedTrees(model))
}
