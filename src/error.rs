//! Error types for the fraudml crate

use thiserror::Error;

/// Result type alias using [`FraudMlError`]
pub type Result<T> = std::result::Result<T, FraudMlError>;

/// Errors produced by the registry, orchestrator, and preprocessing pipeline
#[derive(Debug, Error)]
pub enum FraudMlError {
    /// Model identifier outside the supported set
    #[error("unknown model identifier '{0}' (supported: random-forest, logistic-regression, logistic-regression-cv, decision-tree, gradient-boosted-trees, naive-bayes, support-vector-machine)")]
    InvalidModelIdentifier(String),

    /// Hyperparameter name the target model does not recognize
    #[error("model '{model}' does not accept parameter '{name}'")]
    UnknownParameter { model: &'static str, name: String },

    /// Hyperparameter value of the wrong type or out of range
    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Tuning requested with nothing to search over
    #[error("tuning configuration is empty, nothing to search")]
    EmptySearchSpace,

    /// Predict/evaluate called before fit
    #[error("model has not been fitted")]
    NotFitted,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("data error: {0}")]
    DataError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("column not found: {0}")]
    FeatureNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
