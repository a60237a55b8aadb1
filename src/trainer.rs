//! Train/tune orchestration
//!
//! The two entry operations of the crate. Both load hyperparameter files by
//! the per-model path convention, resolve the estimator through the
//! registry, and return a typed `Result` — configuration absence is the only
//! soft condition (it degrades to built-in defaults inside the loader).

use ndarray::{Array1, Array2};
use std::path::PathBuf;
use tracing::info;

use crate::config::{self, ParamGrid};
use crate::error::{FraudMlError, Result};
use crate::metrics::Metric;
use crate::models::Classifier;
use crate::registry::{build_classifier, direct_fit_kind, ModelDefaults, ModelKind};
use crate::tuning::{GridSearch, TuningOutcome};

/// Options for direct training
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Directory holding `<identifier>_config.json` files
    pub config_dir: PathBuf,
    pub defaults: ModelDefaults,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("configs"),
            defaults: ModelDefaults::default(),
        }
    }
}

/// Options for hyperparameter tuning
#[derive(Debug, Clone)]
pub struct TuneOptions {
    /// Explicit tuning file; defaults to `<config_dir>/<identifier>_tune.json`
    pub config_path: Option<PathBuf>,
    pub config_dir: PathBuf,
    pub scoring: Metric,
    pub folds: usize,
    pub defaults: ModelDefaults,
}

impl Default for TuneOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            config_dir: PathBuf::from("configs"),
            scoring: Metric::F1,
            folds: 5,
            defaults: ModelDefaults::default(),
        }
    }
}

/// Direct training.
///
/// Loads the per-model config (softly), applies the direct-fit substitution
/// policy, builds through the registry, and fits. A direct fit of
/// `logistic-regression` therefore trains the CV variant.
pub fn train(
    x: &Array2<f64>,
    y: &Array1<f64>,
    identifier: &str,
    opts: &TrainOptions,
) -> Result<Classifier> {
    let requested: ModelKind = identifier.parse()?;
    let effective = direct_fit_kind(requested);

    let config_path = config::fit_config_path(&opts.config_dir, requested);
    let params = config::load_params(&config_path);

    if requested != effective {
        info!(requested = %requested, effective = %effective, "direct-fit substitution applied");
    }

    let mut model = build_classifier(effective, &params, &opts.defaults)?;
    info!(model = %effective, rows = x.nrows(), features = x.ncols(), "training");
    model.fit(x, y)?;
    info!(model = %effective, "training finished");

    Ok(model)
}

/// Hyperparameter tuning by exhaustive grid search.
///
/// An empty or missing tuning configuration aborts with
/// [`FraudMlError::EmptySearchSpace`] before any search machinery is
/// constructed. The substitution policy never applies here: the grid drives
/// exactly the model kind it was written for.
pub fn tune(
    x: &Array2<f64>,
    y: &Array1<f64>,
    identifier: &str,
    opts: &TuneOptions,
) -> Result<TuningOutcome> {
    let kind: ModelKind = identifier.parse()?;

    let config_path = opts
        .config_path
        .clone()
        .unwrap_or_else(|| config::tune_config_path(&opts.config_dir, kind));
    let grid: ParamGrid = config::load_grid(&config_path);

    if grid.is_empty() {
        return Err(FraudMlError::EmptySearchSpace);
    }

    let search = GridSearch::new(kind, grid, opts.scoring, opts.folds, opts.defaults)?;
    search.run(x, y)
}
