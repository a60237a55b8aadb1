//! Logistic regression classifiers
//!
//! Two variants:
//! - [`LogisticRegression`] — plain L2-penalized model fitted by gradient
//!   descent, the variant driven through grid search.
//! - [`LogisticRegressionCv`] — searches a log-spaced ladder of inverse
//!   regularization strengths with internal stratified k-fold validation and
//!   refits at the winner. Chosen automatically for direct fits of the plain
//!   identifier.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cross_validation::StratifiedKFold;
use crate::error::{FraudMlError, Result};
use crate::metrics;
use crate::models::{validate_binary_labels, validate_fit_shapes};

fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
    z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Option<Array1<f64>>,
    bias: f64,
    /// Inverse regularization strength; smaller means stronger L2 penalty
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            weights: None,
            bias: 0.0,
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            is_fitted: false,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;
        validate_binary_labels(y)?;

        if self.c <= 0.0 {
            return Err(FraudMlError::InvalidParameter {
                name: "c".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let n = x.nrows() as f64;
        let mut weights = Array1::zeros(x.ncols());
        let mut bias = 0.0;
        let penalty = 1.0 / (self.c * n);

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let errors = sigmoid(&linear) - y;

            let dw = x.t().dot(&errors) / n + penalty * &weights;
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        self.weights = Some(weights);
        self.bias = bias;
        self.is_fitted = true;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.weights.as_ref().ok_or(FraudMlError::NotFitted)?;
        let linear = x.dot(weights) + self.bias;
        Ok(sigmoid(&linear))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionCv {
    /// Number of inverse-regularization candidates, log-spaced over
    /// [1e-4, 1e4]
    pub n_cs: usize,
    pub folds: usize,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: Option<u64>,
    /// Winning inverse regularization strength after fit
    best_c: Option<f64>,
    inner: Option<LogisticRegression>,
}

impl Default for LogisticRegressionCv {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegressionCv {
    pub fn new() -> Self {
        Self {
            n_cs: 10,
            folds: 5,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            random_state: None,
            best_c: None,
            inner: None,
        }
    }

    pub fn with_n_cs(mut self, n: usize) -> Self {
        self.n_cs = n.max(1);
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds.max(2);
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Candidate inverse-regularization ladder
    fn candidate_cs(&self) -> Vec<f64> {
        if self.n_cs == 1 {
            return vec![1.0];
        }
        let (lo, hi) = (-4.0f64, 4.0f64);
        (0..self.n_cs)
            .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / (self.n_cs - 1) as f64))
            .collect()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;
        validate_binary_labels(y)?;

        let cv = StratifiedKFold::new(self.folds)
            .with_random_state(self.random_state.unwrap_or(42));
        let splits = cv.split(y)?;

        let mut best: Option<(f64, f64)> = None; // (c, mean accuracy)

        for c in self.candidate_cs() {
            let mut fold_scores = Vec::with_capacity(splits.len());
            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = Array1::from_iter(split.train_indices.iter().map(|&i| y[i]));
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = Array1::from_iter(split.test_indices.iter().map(|&i| y[i]));

                let mut model = self.base_model(c);
                model.fit(&x_train, &y_train)?;
                let y_pred = model.predict(&x_test)?;
                fold_scores.push(metrics::accuracy(&y_test, &y_pred));
            }

            let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!(c, mean_accuracy = mean, "regularization candidate scored");
            if best.map_or(true, |(_, s)| mean > s) {
                best = Some((c, mean));
            }
        }

        let (best_c, _) = best.ok_or(FraudMlError::ValidationError(
            "no regularization candidate could be scored".to_string(),
        ))?;

        let mut inner = self.base_model(best_c);
        inner.fit(x, y)?;
        self.best_c = Some(best_c);
        self.inner = Some(inner);
        Ok(())
    }

    fn base_model(&self, c: f64) -> LogisticRegression {
        LogisticRegression::new()
            .with_c(c)
            .with_learning_rate(self.learning_rate)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol)
    }

    pub fn best_c(&self) -> Option<f64> {
        self.best_c
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner
            .as_ref()
            .ok_or(FraudMlError::NotFitted)?
            .predict_proba(x)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner
            .as_ref()
            .ok_or(FraudMlError::NotFitted)?
            .predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            rows.push([i as f64 * 0.1, -1.0 - i as f64 * 0.05]);
            labels.push(0.0);
            rows.push([3.0 + i as f64 * 0.1, 1.0 + i as f64 * 0.05]);
            labels.push(1.0);
        }
        let x = Array2::from_shape_fn((rows.len(), 2), |(r, c)| rows[r][c]);
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_plain_fit_predict() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new().with_max_iter(2000);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert!(metrics::accuracy(&y, &preds) > 0.9);
    }

    #[test]
    fn test_rejects_nonbinary_labels() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0];
        let mut model = LogisticRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_rejects_nonpositive_c() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new().with_c(0.0);
        assert!(matches!(
            model.fit(&x, &y),
            Err(FraudMlError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_cv_variant_selects_a_strength() {
        let (x, y) = separable();
        let mut model = LogisticRegressionCv::new()
            .with_n_cs(4)
            .with_folds(4)
            .with_max_iter(500)
            .with_random_state(42);
        model.fit(&x, &y).unwrap();
        assert!(model.best_c().is_some());
        let preds = model.predict(&x).unwrap();
        assert!(metrics::accuracy(&y, &preds) > 0.9);
    }

    #[test]
    fn test_candidate_ladder_is_log_spaced() {
        let model = LogisticRegressionCv::new().with_n_cs(3);
        let cs = model.candidate_cs();
        assert_eq!(cs.len(), 3);
        assert!((cs[0] - 1e-4).abs() < 1e-12);
        assert!((cs[1] - 1.0).abs() < 1e-9);
        assert!((cs[2] - 1e4).abs() < 1e-6);
    }
}
