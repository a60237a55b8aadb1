//! Gaussian naive Bayes classifier

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::{FraudMlError, Result};
use crate::models::{sorted_classes, validate_fit_shapes};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNb {
    /// Per-class feature means
    means: BTreeMap<i64, Vec<f64>>,
    /// Per-class feature variances (smoothed)
    variances: BTreeMap<i64, Vec<f64>>,
    /// Log prior of each class
    log_priors: BTreeMap<i64, f64>,
    classes: Vec<i64>,
    /// Added to every variance to keep the likelihood finite for constant
    /// features
    pub var_smoothing: f64,
    n_features: usize,
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNb {
    pub fn new() -> Self {
        Self {
            means: BTreeMap::new(),
            variances: BTreeMap::new(),
            log_priors: BTreeMap::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
            n_features: 0,
        }
    }

    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.classes = sorted_classes(y);

        // Smoothing is scaled by the largest feature variance over the whole
        // training set, matching the usual var_smoothing semantics.
        let global_max_var = {
            let mut max_var = 0.0f64;
            for col in x.columns() {
                let mean = col.mean().unwrap_or(0.0);
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / n_samples as f64;
                max_var = max_var.max(var);
            }
            max_var
        };
        let epsilon = self.var_smoothing * global_max_var.max(1.0);

        for &class in &self.classes {
            let indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &v)| v.round() as i64 == class)
                .map(|(i, _)| i)
                .collect();
            let n_class = indices.len();

            let mut means = vec![0.0; self.n_features];
            for &i in &indices {
                for (j, &v) in x.row(i).iter().enumerate() {
                    means[j] += v;
                }
            }
            for m in &mut means {
                *m /= n_class as f64;
            }

            let mut variances = vec![0.0; self.n_features];
            for &i in &indices {
                for (j, &v) in x.row(i).iter().enumerate() {
                    variances[j] += (v - means[j]).powi(2);
                }
            }
            for v in &mut variances {
                *v = *v / n_class as f64 + epsilon;
            }

            self.log_priors
                .insert(class, (n_class as f64 / n_samples as f64).ln());
            self.means.insert(class, means);
            self.variances.insert(class, variances);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.classes.is_empty() {
            return Err(FraudMlError::NotFitted);
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                self.classes
                    .iter()
                    .map(|&class| (class, self.joint_log_likelihood(&row.to_owned(), class)))
                    .max_by(|(_, a), (_, b)| {
                        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(class, _)| class as f64)
                    .unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn joint_log_likelihood(&self, row: &Array1<f64>, class: i64) -> f64 {
        let means = &self.means[&class];
        let variances = &self.variances[&class];

        let log_likelihood: f64 = row
            .iter()
            .zip(means.iter())
            .zip(variances.iter())
            .map(|((&xi, &mean), &var)| {
                -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
            .sum();

        self.log_priors[&class] + log_likelihood
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_gaussians() {
        let x = array![
            [-2.0, -2.1],
            [-1.9, -2.0],
            [-2.1, -1.8],
            [-2.0, -2.2],
            [2.0, 2.1],
            [1.9, 2.0],
            [2.1, 1.8],
            [2.0, 2.2],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let mut nb = GaussianNb::new();
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), y);

        let probe = array![[-1.5, -1.5], [1.5, 1.5]];
        assert_eq!(nb.predict(&probe).unwrap(), array![0.0, 1.0]);
    }

    #[test]
    fn test_constant_feature_survives_smoothing() {
        let x = array![[0.0, 1.0], [0.1, 1.0], [5.0, 1.0], [5.1, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut nb = GaussianNb::new();
        nb.fit(&x, &y).unwrap();
        let preds = nb.predict(&x).unwrap();
        assert!(preds.iter().all(|p| p.is_finite()));
        assert_eq!(preds, y);
    }

    #[test]
    fn test_predict_before_fit() {
        let nb = GaussianNb::new();
        assert!(matches!(
            nb.predict(&array![[0.0]]),
            Err(FraudMlError::NotFitted)
        ));
    }
}
