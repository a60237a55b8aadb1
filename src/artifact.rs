//! Artifact persistence
//!
//! Trained classifiers and the fitted preprocessor serialize to JSON. Saves
//! create missing parent directories and overwrite in place; every artifact
//! is produced by a single batch run, so there is no versioning or locking.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::Classifier;
use crate::preprocess::FraudPreprocessor;
use crate::registry::ModelKind;

/// Conventional load path of a trained model artifact
pub fn model_artifact_path(model_dir: &Path, kind: ModelKind) -> PathBuf {
    model_dir.join(format!("models_{}.json", kind.as_str()))
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn save_classifier(model: &Classifier, path: &Path) -> Result<()> {
    save_json(model, path)?;
    info!(model = model.name(), path = %path.display(), "saved model artifact");
    Ok(())
}

pub fn load_classifier(path: &Path) -> Result<Classifier> {
    load_json(path)
}

pub fn save_preprocessor(preprocessor: &FraudPreprocessor, path: &Path) -> Result<()> {
    save_json(preprocessor, path)?;
    info!(path = %path.display(), "saved preprocessor artifact");
    Ok(())
}

pub fn load_preprocessor(path: &Path) -> Result<FraudPreprocessor> {
    load_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DecisionTreeClassifier;
    use ndarray::array;

    #[test]
    fn test_artifact_path_convention() {
        assert_eq!(
            model_artifact_path(Path::new("models"), ModelKind::RandomForest),
            Path::new("models/models_random-forest.json")
        );
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/model.json");

        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = Classifier::DecisionTree(DecisionTreeClassifier::new());
        model.fit(&x, &y).unwrap();

        save_classifier(&model, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_load_round_trip_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let x = array![[0.0, 1.0], [1.0, 2.0], [10.0, 9.0], [11.0, 8.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = Classifier::DecisionTree(DecisionTreeClassifier::new());
        model.fit(&x, &y).unwrap();

        save_classifier(&model, &path).unwrap();
        let restored = load_classifier(&path).unwrap();

        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_load_missing_artifact_errors() {
        assert!(load_classifier(Path::new("/nonexistent/model.json")).is_err());
    }
}
