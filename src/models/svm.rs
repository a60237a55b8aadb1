//! Support vector machine classifier
//!
//! Binary soft-margin SVM trained with simplified SMO. The Gram matrix is
//! materialized eagerly, so training is bounded to datasets that fit it in
//! memory.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{FraudMlError, Result};
use crate::models::{validate_binary_labels, validate_fit_shapes};

/// Training set size above which the eager Gram matrix would be unreasonable
const MAX_GRAM_SAMPLES: usize = 20_000;

/// Kernel function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SvmKernel {
    /// K(a, b) = a · b
    Linear,
    /// K(a, b) = exp(-gamma * ||a - b||^2); gamma defaults to 1/n_features
    Rbf { gamma: Option<f64> },
}

impl Default for SvmKernel {
    fn default() -> Self {
        SvmKernel::Rbf { gamma: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    pub c: f64,
    pub kernel: SvmKernel,
    pub tol: f64,
    /// Cap on full passes over the training set without progress
    pub max_iter: usize,
    pub random_state: Option<u64>,
    support_vectors: Option<Array2<f64>>,
    /// alpha_k * y_k for each support vector, y in {-1, +1}
    dual_coef: Option<Array1<f64>>,
    bias: f64,
    resolved_gamma: f64,
}

impl Default for SvmClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SvmClassifier {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            kernel: SvmKernel::default(),
            tol: 1e-3,
            max_iter: 1000,
            random_state: None,
            support_vectors: None,
            dual_coef: None,
            bias: 0.0,
            resolved_gamma: 1.0,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_kernel(mut self, kernel: SvmKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn kernel_value(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.kernel {
            SvmKernel::Linear => a.dot(&b),
            SvmKernel::Rbf { .. } => {
                let dist_sq: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum();
                (-self.resolved_gamma * dist_sq).exp()
            }
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit_shapes(x, y)?;
        validate_binary_labels(y)?;

        let n = x.nrows();
        if n < 2 {
            return Err(FraudMlError::ValidationError(
                "SVM training needs at least 2 samples".to_string(),
            ));
        }
        if n > MAX_GRAM_SAMPLES {
            return Err(FraudMlError::ValidationError(format!(
                "training set of {} rows exceeds the {} row kernel matrix limit",
                n, MAX_GRAM_SAMPLES
            )));
        }
        if self.c <= 0.0 {
            return Err(FraudMlError::InvalidParameter {
                name: "c".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        self.resolved_gamma = match self.kernel {
            SvmKernel::Rbf { gamma: Some(g) } => g,
            SvmKernel::Rbf { gamma: None } => 1.0 / x.ncols() as f64,
            SvmKernel::Linear => 1.0,
        };

        // Labels in {-1, +1}
        let y_pm: Array1<f64> = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });

        // Gram matrix
        let mut gram = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let k = self.kernel_value(x.row(i), x.row(j));
                gram[[i, j]] = k;
                gram[[j, i]] = k;
            }
        }

        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0f64;
        let mut rng =
            Xoshiro256PlusPlus::seed_from_u64(self.random_state.unwrap_or(42));

        let decision = |alphas: &Array1<f64>, bias: f64, gram: &Array2<f64>, i: usize| -> f64 {
            let mut sum = bias;
            for k in 0..n {
                if alphas[k] > 0.0 {
                    sum += alphas[k] * y_pm[k] * gram[[k, i]];
                }
            }
            sum
        };

        let mut passes_without_change = 0usize;
        let mut total_passes = 0usize;

        while passes_without_change < 3 && total_passes < self.max_iter {
            let mut num_changed = 0usize;

            for i in 0..n {
                let e_i = decision(&alphas, bias, &gram, i) - y_pm[i];
                let violates = (y_pm[i] * e_i < -self.tol && alphas[i] < self.c)
                    || (y_pm[i] * e_i > self.tol && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                // Random partner index j != i
                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let e_j = decision(&alphas, bias, &gram, j) - y_pm[j];

                let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);
                let (low, high) = if (y_pm[i] - y_pm[j]).abs() < f64::EPSILON {
                    (
                        (alpha_i_old + alpha_j_old - self.c).max(0.0),
                        (alpha_i_old + alpha_j_old).min(self.c),
                    )
                } else {
                    (
                        (alpha_j_old - alpha_i_old).max(0.0),
                        (self.c + alpha_j_old - alpha_i_old).min(self.c),
                    )
                };
                if (high - low).abs() < 1e-12 {
                    continue;
                }

                let eta = 2.0 * gram[[i, j]] - gram[[i, i]] - gram[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let mut alpha_j = alpha_j_old - y_pm[j] * (e_i - e_j) / eta;
                alpha_j = alpha_j.clamp(low, high);
                if (alpha_j - alpha_j_old).abs() < 1e-7 {
                    continue;
                }

                let alpha_i = alpha_i_old + y_pm[i] * y_pm[j] * (alpha_j_old - alpha_j);

                let b1 = bias
                    - e_i
                    - y_pm[i] * (alpha_i - alpha_i_old) * gram[[i, i]]
                    - y_pm[j] * (alpha_j - alpha_j_old) * gram[[i, j]];
                let b2 = bias
                    - e_j
                    - y_pm[i] * (alpha_i - alpha_i_old) * gram[[i, j]]
                    - y_pm[j] * (alpha_j - alpha_j_old) * gram[[j, j]];

                bias = if alpha_i > 0.0 && alpha_i < self.c {
                    b1
                } else if alpha_j > 0.0 && alpha_j < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                alphas[i] = alpha_i;
                alphas[j] = alpha_j;
                num_changed += 1;
            }

            total_passes += 1;
            if num_changed == 0 {
                passes_without_change += 1;
            } else {
                passes_without_change = 0;
            }
        }

        // Keep only the support vectors
        let sv_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        if sv_indices.is_empty() {
            // Degenerate but possible on trivially uniform labels: the
            // decision function reduces to the bias sign.
            self.support_vectors = Some(Array2::zeros((0, x.ncols())));
            self.dual_coef = Some(Array1::zeros(0));
            self.bias = if y.mean().unwrap_or(0.0) > 0.5 { 1.0 } else { -1.0 };
            return Ok(());
        }

        self.support_vectors = Some(x.select(Axis(0), &sv_indices));
        self.dual_coef = Some(Array1::from_iter(
            sv_indices.iter().map(|&i| alphas[i] * y_pm[i]),
        ));
        self.bias = bias;
        Ok(())
    }

    /// Signed distance to the separating surface
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let sv = self.support_vectors.as_ref().ok_or(FraudMlError::NotFitted)?;
        let coef = self.dual_coef.as_ref().ok_or(FraudMlError::NotFitted)?;

        let scores: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut sum = self.bias;
                for (k, sv_row) in sv.rows().into_iter().enumerate() {
                    sum += coef[k] * self.kernel_value(sv_row, row);
                }
                sum
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| if s >= 0.0 { 1.0 } else { 0.0 }))
    }
}
