//! Exhaustive grid search under stratified k-fold cross-validation

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ParamGrid, ParamMap};
use crate::cross_validation::StratifiedKFold;
use crate::error::{FraudMlError, Result};
use crate::metrics::Metric;
use crate::models::Classifier;
use crate::registry::{build_classifier, ModelDefaults, ModelKind};

/// Score record for one hyperparameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: ParamMap,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Outcome of a completed grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningOutcome {
    /// Best combination refit on the full training data
    pub best: Classifier,
    pub best_params: ParamMap,
    pub best_score: f64,
    /// Every combination evaluated, in search order
    pub candidates: Vec<CandidateScore>,
}

/// Exhaustive search over the Cartesian product of candidate lists.
///
/// The grid keys come from a BTreeMap, so combination order is deterministic
/// and the strict `>` comparison makes ties resolve to the first-encountered
/// combination.
#[derive(Debug, Clone)]
pub struct GridSearch {
    kind: ModelKind,
    grid: ParamGrid,
    scoring: Metric,
    folds: usize,
    defaults: ModelDefaults,
}

impl GridSearch {
    /// An empty grid is not a valid search space.
    pub fn new(
        kind: ModelKind,
        grid: ParamGrid,
        scoring: Metric,
        folds: usize,
        defaults: ModelDefaults,
    ) -> Result<Self> {
        if grid.is_empty() || grid.values().any(|candidates| candidates.is_empty()) {
            return Err(FraudMlError::EmptySearchSpace);
        }
        Ok(Self {
            kind,
            grid,
            scoring,
            folds,
            defaults,
        })
    }

    /// Every combination in the Cartesian product of the candidate lists
    fn combinations(&self) -> Vec<ParamMap> {
        let mut combos = vec![ParamMap::new()];
        for (name, candidates) in &self.grid {
            let mut next = Vec::with_capacity(combos.len() * candidates.len());
            for combo in &combos {
                for value in candidates {
                    let mut extended = combo.clone();
                    extended.insert(name.clone(), value.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }

    pub fn run(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TuningOutcome> {
        let combos = self.combinations();
        info!(
            model = %self.kind,
            combinations = combos.len(),
            folds = self.folds,
            scoring = %self.scoring,
            "starting grid search"
        );

        let cv = StratifiedKFold::new(self.folds)
            .with_random_state(self.defaults.random_seed);
        let splits = cv.split(y)?;

        let mut candidates: Vec<CandidateScore> = Vec::with_capacity(combos.len());
        let mut best_idx: Option<usize> = None;

        for (idx, params) in combos.iter().enumerate() {
            let mut fold_scores = Vec::with_capacity(splits.len());

            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train =
                    Array1::from_iter(split.train_indices.iter().map(|&i| y[i]));
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test =
                    Array1::from_iter(split.test_indices.iter().map(|&i| y[i]));

                let mut model = build_classifier(self.kind, params, &self.defaults)?;
                model.fit(&x_train, &y_train)?;
                let y_pred = model.predict(&x_test)?;
                fold_scores.push(self.scoring.score(&y_test, &y_pred));
            }

            let mean_score =
                fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!(candidate = idx, mean_score, "combination scored");

            // Strict comparison: first-encountered combination wins ties
            if best_idx.map_or(true, |b| mean_score > candidates[b].mean_score) {
                best_idx = Some(idx);
            }

            candidates.push(CandidateScore {
                params: params.clone(),
                fold_scores,
                mean_score,
            });
        }

        let best_idx = best_idx.ok_or(FraudMlError::EmptySearchSpace)?;
        let best_params = candidates[best_idx].params.clone();
        let best_score = candidates[best_idx].mean_score;

        // Refit the winner on the full training data
        let mut best = build_classifier(self.kind, &best_params, &self.defaults)?;
        best.fit(x, y)?;

        info!(
            model = %self.kind,
            best_score,
            params = %format_params(&best_params),
            "grid search finished"
        );

        Ok(TuningOutcome {
            best,
            best_params,
            best_score,
            candidates,
        })
    }
}

/// Compact `key=value` rendering for logs and CLI output
pub fn format_params(params: &ParamMap) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;

    fn training_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            rows.push([i as f64 * 0.1, i as f64 * 0.05]);
            labels.push(0.0);
            rows.push([5.0 + i as f64 * 0.1, 5.0 + i as f64 * 0.05]);
            labels.push(1.0);
        }
        let x = Array2::from_shape_fn((rows.len(), 2), |(r, c)| rows[r][c]);
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_empty_grid_rejected() {
        let err = GridSearch::new(
            ModelKind::DecisionTree,
            ParamGrid::new(),
            Metric::F1,
            5,
            ModelDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FraudMlError::EmptySearchSpace));
    }

    #[test]
    fn test_grid_with_empty_candidate_list_rejected() {
        let mut grid = ParamGrid::new();
        grid.insert("max_depth".to_string(), Vec::new());
        let err = GridSearch::new(
            ModelKind::DecisionTree,
            grid,
            Metric::F1,
            5,
            ModelDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FraudMlError::EmptySearchSpace));
    }

    #[test]
    fn test_cartesian_product_size() {
        let mut grid = ParamGrid::new();
        grid.insert(
            "max_depth".to_string(),
            vec![ParamValue::Int(2), ParamValue::Int(4), ParamValue::Int(8)],
        );
        grid.insert(
            "criterion".to_string(),
            vec![
                ParamValue::Str("gini".into()),
                ParamValue::Str("entropy".into()),
            ],
        );
        let search = GridSearch::new(
            ModelKind::DecisionTree,
            grid,
            Metric::F1,
            3,
            ModelDefaults::default(),
        )
        .unwrap();
        assert_eq!(search.combinations().len(), 6);
    }

    #[test]
    fn test_search_scores_every_combination() {
        let (x, y) = training_data();
        let mut grid = ParamGrid::new();
        grid.insert(
            "max_depth".to_string(),
            vec![ParamValue::Int(1), ParamValue::Int(4)],
        );

        let search = GridSearch::new(
            ModelKind::DecisionTree,
            grid,
            Metric::F1,
            3,
            ModelDefaults::default(),
        )
        .unwrap();
        let outcome = search.run(&x, &y).unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.best_score > 0.8);
        assert!(outcome.best_params.contains_key("max_depth"));
        // The best model is already fitted
        assert_eq!(outcome.best.predict(&x).unwrap().len(), x.nrows());
    }

    #[test]
    fn test_singleton_grid_equals_scalar_normalization() {
        let (x, y) = training_data();
        let defaults = ModelDefaults::default();

        let mut grid = ParamGrid::new();
        grid.insert("max_depth".to_string(), vec![ParamValue::Int(3)]);
        let outcome = GridSearch::new(ModelKind::DecisionTree, grid, Metric::F1, 3, defaults)
            .unwrap()
            .run(&x, &y)
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(
            outcome.best_params.get("max_depth"),
            Some(&ParamValue::Int(3))
        );
    }

    #[test]
    fn test_format_params() {
        let mut params = ParamMap::new();
        params.insert("c".to_string(), ParamValue::Float(0.5));
        params.insert("kernel".to_string(), ParamValue::Str("rbf".into()));
        assert_eq!(format_params(&params), "c=0.5, kernel=rbf");
    }
}
