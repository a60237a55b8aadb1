//! Integration test: grid-search tuning

use fraudml::{tune, Classifier, FraudMlError, Metric, TuneOptions};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

fn classification_data() -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut rows: Vec<[f64; 2]> = Vec::with_capacity(80);
    let mut labels = Vec::with_capacity(80);

    for i in 0..80 {
        let class = i % 2;
        let center = if class == 0 { 0.0 } else { 4.0 };
        rows.push([
            center + rng.gen_range(-1.0..1.0),
            center + rng.gen_range(-1.0..1.0),
        ]);
        labels.push(class as f64);
    }

    let x = Array2::from_shape_fn((rows.len(), 2), |(r, c)| rows[r][c]);
    (x, Array1::from_vec(labels))
}

fn opts_with_config(contents: &str) -> (tempfile::TempDir, TuneOptions) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tune.json");
    std::fs::write(&path, contents).unwrap();
    let opts = TuneOptions {
        config_path: Some(path),
        folds: 4,
        ..TuneOptions::default()
    };
    (dir, opts)
}

#[test]
fn test_missing_config_aborts_before_searching() {
    let (x, y) = classification_data();
    let opts = TuneOptions {
        config_dir: PathBuf::from("/nonexistent-config-dir"),
        ..TuneOptions::default()
    };
    let err = tune(&x, &y, "decision-tree", &opts).unwrap_err();
    assert!(matches!(err, FraudMlError::EmptySearchSpace));
}

#[test]
fn test_empty_config_aborts_before_searching() {
    let (x, y) = classification_data();
    let (_dir, opts) = opts_with_config("{}");
    let err = tune(&x, &y, "decision-tree", &opts).unwrap_err();
    assert!(matches!(err, FraudMlError::EmptySearchSpace));
}

#[test]
fn test_exhaustive_search_over_grid() {
    let (x, y) = classification_data();
    let (_dir, opts) =
        opts_with_config(r#"{"max_depth": [2, 4], "criterion": ["gini", "entropy"]}"#);

    let outcome = tune(&x, &y, "decision-tree", &opts).unwrap();
    assert_eq!(outcome.candidates.len(), 4);
    assert!(outcome.best_score > 0.8);
    assert!(outcome.best_params.contains_key("max_depth"));
    assert!(outcome.best_params.contains_key("criterion"));

    // Best score is the maximum over all candidates
    let max = outcome
        .candidates
        .iter()
        .map(|c| c.mean_score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.best_score, max);
}

#[test]
fn test_scalar_equals_singleton_list() {
    let (x, y) = classification_data();

    let (_dir_a, opts_a) = opts_with_config(r#"{"max_depth": 4}"#);
    let (_dir_b, opts_b) = opts_with_config(r#"{"max_depth": [4]}"#);

    let scalar = tune(&x, &y, "decision-tree", &opts_a).unwrap();
    let listed = tune(&x, &y, "decision-tree", &opts_b).unwrap();

    assert_eq!(scalar.candidates.len(), 1);
    assert_eq!(listed.candidates.len(), 1);
    assert_eq!(scalar.best_params, listed.best_params);
    assert_eq!(scalar.best_score, listed.best_score);
}

#[test]
fn test_tuning_logistic_never_substitutes_cv_variant() {
    let (x, y) = classification_data();
    let (_dir, opts) = opts_with_config(r#"{"c": [0.1, 1.0]}"#);

    let outcome = tune(&x, &y, "logistic-regression", &opts).unwrap();
    assert!(matches!(outcome.best, Classifier::LogisticRegression(_)));
}

#[test]
fn test_unknown_identifier_is_rejected() {
    let (x, y) = classification_data();
    let (_dir, opts) = opts_with_config(r#"{"max_depth": [2]}"#);
    let err = tune(&x, &y, "adaboost", &opts).unwrap_err();
    assert!(matches!(err, FraudMlError::InvalidModelIdentifier(_)));
}

#[test]
fn test_unknown_grid_parameter_is_rejected() {
    let (x, y) = classification_data();
    let (_dir, opts) = opts_with_config(r#"{"n_neighbors": [3, 5]}"#);
    let err = tune(&x, &y, "decision-tree", &opts).unwrap_err();
    assert!(matches!(err, FraudMlError::UnknownParameter { .. }));
}

#[test]
fn test_alternate_scoring_metric() {
    let (x, y) = classification_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tune.json");
    std::fs::write(&path, r#"{"n_estimators": [10]}"#).unwrap();

    let opts = TuneOptions {
        config_path: Some(path),
        scoring: Metric::Accuracy,
        folds: 4,
        ..TuneOptions::default()
    };
    let outcome = tune(&x, &y, "random-forest", &opts).unwrap();
    assert!(outcome.best_score > 0.8);
}

#[test]
fn test_tuning_is_deterministic() {
    let (x, y) = classification_data();
    let (_dir, opts) = opts_with_config(r#"{"max_depth": [2, 4, 6]}"#);

    let a = tune(&x, &y, "decision-tree", &opts).unwrap();
    let b = tune(&x, &y, "decision-tree", &opts).unwrap();
    assert_eq!(a.best_params, b.best_params);
    assert_eq!(a.best_score, b.best_score);
}
