//! Classification metrics and scoring

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FraudMlError, Result};
use crate::models::Classifier;

/// Scoring metric for tuning and evaluation.
///
/// Binary metrics treat the positive class as label 1 (fraud).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::F1
    }
}

impl FromStr for Metric {
    type Err = FraudMlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "accuracy" => Ok(Metric::Accuracy),
            "precision" => Ok(Metric::Precision),
            "recall" => Ok(Metric::Recall),
            "f1" => Ok(Metric::F1),
            other => Err(FraudMlError::ValidationError(format!(
                "unknown scoring metric '{}' (supported: accuracy, precision, recall, f1)",
                other
            ))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
        };
        write!(f, "{}", name)
    }
}

impl Metric {
    /// Score predictions against ground truth. Higher is better for every
    /// supported metric.
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            Metric::Accuracy => accuracy(y_true, y_pred),
            Metric::Precision => precision(y_true, y_pred),
            Metric::Recall => recall(y_true, y_pred),
            Metric::F1 => f1_score(y_true, y_pred),
        }
    }
}

/// Evaluation report for a fitted classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub accuracy: f64,
    pub f1: f64,
}

/// Run prediction once and compare against ground truth.
pub fn evaluate(model: &Classifier, x: &Array2<f64>, y: &Array1<f64>) -> Result<EvalReport> {
    let y_pred = model.predict(x)?;
    Ok(EvalReport {
        accuracy: accuracy(y, &y_pred),
        f1: f1_score(y, &y_pred),
    })
}

fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (*t > 0.5, *p > 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

pub fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, _, _) = confusion_counts(y_true, y_pred);
    if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    }
}

pub fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, _, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_) as f64
    }
}

pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![1.0, 0.0, 1.0, 1.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0];
        assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_f1_perfect() {
        let y = array![1.0, 0.0, 1.0, 0.0];
        assert!((f1_score(&y, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_f1_degenerate_all_negative_predictions() {
        let y_true = array![1.0, 1.0, 0.0];
        let y_pred = array![0.0, 0.0, 0.0];
        assert_eq!(f1_score(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_precision_recall() {
        // tp=2, fp=1, fn=1
        let y_true = array![1.0, 1.0, 0.0, 1.0, 0.0];
        let y_pred = array![1.0, 1.0, 1.0, 0.0, 0.0];
        assert!((precision(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("f1".parse::<Metric>().unwrap(), Metric::F1);
        assert_eq!("Accuracy".parse::<Metric>().unwrap(), Metric::Accuracy);
        assert!("auc".parse::<Metric>().is_err());
    }
}
