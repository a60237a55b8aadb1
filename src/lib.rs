//! fraudml - classical classifiers for tabular fraud detection
//!
//! A small training stack for a credit-card-transaction dataset:
//!
//! - [`registry`] - model identifiers and the classifier factory
//! - [`config`] - JSON hyperparameter files with soft-fail loading
//! - [`trainer`] - direct training and grid-search tuning entry points
//! - [`tuning`] - exhaustive grid search under cross-validation
//! - [`models`] - the classifier implementations
//! - [`metrics`] - accuracy/precision/recall/F1 scoring and evaluation
//! - [`preprocess`] - the fixed column-wise preprocessing pipeline
//! - [`artifact`] - JSON persistence of trained models and preprocessors
//! - [`data`] - CSV loading and DataFrame → matrix conversion
//! - [`cli`] - command-line interface

pub mod artifact;
pub mod cli;
pub mod config;
pub mod cross_validation;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod preprocess;
pub mod registry;
pub mod trainer;
pub mod tuning;

pub use error::{FraudMlError, Result};
pub use metrics::{evaluate, EvalReport, Metric};
pub use models::Classifier;
pub use registry::{build_classifier, direct_fit_kind, ModelDefaults, ModelKind};
pub use trainer::{train, tune, TrainOptions, TuneOptions};
pub use tuning::TuningOutcome;
