//! Integration test: direct training across the supported model set

use fraudml::{evaluate, train, Classifier, FraudMlError, ModelKind, TrainOptions};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// 100 rows, two classes, deterministically generated and well separated
fn classification_data() -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let mut rows: Vec<[f64; 3]> = Vec::with_capacity(100);
    let mut labels = Vec::with_capacity(100);

    for i in 0..100 {
        let class = i % 2;
        let center = if class == 0 { -2.0 } else { 2.0 };
        rows.push([
            center + rng.gen_range(-0.8..0.8),
            center * 0.5 + rng.gen_range(-0.8..0.8),
            rng.gen_range(-1.0..1.0),
        ]);
        labels.push(class as f64);
    }

    let x = Array2::from_shape_fn((rows.len(), 3), |(r, c)| rows[r][c]);
    (x, Array1::from_vec(labels))
}

fn no_config_opts() -> TrainOptions {
    TrainOptions {
        config_dir: PathBuf::from("/nonexistent-config-dir"),
        ..TrainOptions::default()
    }
}

#[test]
fn test_train_every_supported_identifier() {
    let (x, y) = classification_data();
    let opts = no_config_opts();

    for kind in ModelKind::ALL {
        let model = train(&x, &y, kind.as_str(), &opts)
            .unwrap_or_else(|e| panic!("training {} failed: {}", kind, e));
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.len(), x.nrows(), "{} prediction length", kind);

        let report = evaluate(&model, &x, &y).unwrap();
        assert!(
            report.accuracy > 0.9,
            "{} accuracy too low: {}",
            kind,
            report.accuracy
        );
    }
}

#[test]
fn test_identifier_is_case_insensitive() {
    let (x, y) = classification_data();
    let model = train(&x, &y, "Decision-Tree", &no_config_opts()).unwrap();
    assert!(matches!(model, Classifier::DecisionTree(_)));
}

#[test]
fn test_unknown_identifier_is_rejected() {
    let (x, y) = classification_data();
    let err = train(&x, &y, "neural-network", &no_config_opts()).unwrap_err();
    assert!(matches!(err, FraudMlError::InvalidModelIdentifier(_)));
    assert!(err.to_string().contains("gradient-boosted-trees"));
}

#[test]
fn test_direct_logistic_fit_uses_cv_variant() {
    let (x, y) = classification_data();
    let model = train(&x, &y, "logistic-regression", &no_config_opts()).unwrap();
    assert!(matches!(model, Classifier::LogisticRegressionCv(_)));

    // The explicit CV identifier resolves to the same variant
    let model = train(&x, &y, "logistic-regression-cv", &no_config_opts()).unwrap();
    assert!(matches!(model, Classifier::LogisticRegressionCv(_)));
}

#[test]
fn test_training_is_deterministic() {
    let (x, y) = classification_data();
    let opts = no_config_opts();

    let a = train(&x, &y, "decision-tree", &opts).unwrap();
    let b = train(&x, &y, "decision-tree", &opts).unwrap();

    let report_a = evaluate(&a, &x, &y).unwrap();
    let report_b = evaluate(&b, &x, &y).unwrap();
    assert_eq!(report_a.accuracy, report_b.accuracy);
    assert_eq!(report_a.f1, report_b.f1);
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());

    // Seeded models repeat exactly too
    let a = train(&x, &y, "random-forest", &opts).unwrap();
    let b = train(&x, &y, "random-forest", &opts).unwrap();
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
}

#[test]
fn test_config_file_overrides_apply() {
    let (x, y) = classification_data();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("random-forest_config.json"),
        r#"{"n_estimators": 5, "max_depth": 3}"#,
    )
    .unwrap();

    let opts = TrainOptions {
        config_dir: dir.path().to_path_buf(),
        ..TrainOptions::default()
    };
    let model = train(&x, &y, "random-forest", &opts).unwrap();
    match model {
        Classifier::RandomForest(forest) => {
            assert_eq!(forest.n_estimators, 5);
            assert_eq!(forest.max_depth, Some(3));
        }
        other => panic!("unexpected variant: {}", other.name()),
    }
}

#[test]
fn test_save_load_round_trip() {
    let (x, y) = classification_data();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifacts/models_decision-tree.json");

    let model = train(&x, &y, "decision-tree", &no_config_opts()).unwrap();
    fraudml::artifact::save_classifier(&model, &path).unwrap();

    let restored = fraudml::artifact::load_classifier(&path).unwrap();
    assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
}
