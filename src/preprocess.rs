//! Fixed column-wise preprocessing for the transaction dataset
//!
//! The transformation shape is fixed by the dataset schema: the `Time`
//! column (raw seconds since the first transaction) becomes hour-of-day and
//! is standard-scaled, `Amount` and the 28 anonymized features `V1..V28`
//! are standard-scaled, and every other column is dropped. Fitting happens
//! once against a reference dataset; the fitted transformer is persisted and
//! reused at inference time.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::data;
use crate::error::{FraudMlError, Result};

pub const TIME_COLUMN: &str = "Time";
pub const AMOUNT_COLUMN: &str = "Amount";

/// The fixed block of anonymized numeric feature columns
pub fn anonymized_columns() -> Vec<String> {
    (1..=28).map(|i| format!("V{}", i)).collect()
}

/// Raw seconds → hour of day, by integer division: `90000 → 1`
pub fn hour_of_day(seconds: f64) -> f64 {
    ((seconds / 3600.0).floor() as i64).rem_euclid(24) as f64
}

/// Zero-mean/unit-variance parameters for one column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnScale {
    mean: f64,
    std: f64,
}

impl ColumnScale {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Self {
            mean,
            std: if std == 0.0 { 1.0 } else { std },
        }
    }

    fn apply(&self, v: f64) -> f64 {
        (v - self.mean) / self.std
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudPreprocessor {
    scales: BTreeMap<String, ColumnScale>,
    is_fitted: bool,
}

impl Default for FraudPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FraudPreprocessor {
    pub fn new() -> Self {
        Self {
            scales: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Columns produced by `transform`, in output order
    pub fn output_columns() -> Vec<String> {
        let mut columns = vec![TIME_COLUMN.to_string(), AMOUNT_COLUMN.to_string()];
        columns.extend(anonymized_columns());
        columns
    }

    /// Values of one retained column, with the time transform applied
    fn feature_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let values = data::column_f64(df, name)?;
        if name == TIME_COLUMN {
            Ok(values.into_iter().map(hour_of_day).collect())
        } else {
            Ok(values)
        }
    }

    /// Fit scaling parameters against the reference dataset. All retained
    /// columns must be present.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.scales.clear();
        for name in Self::output_columns() {
            let values = Self::feature_values(df, &name)?;
            if values.is_empty() {
                return Err(FraudMlError::DataError(format!(
                    "column '{}' has no rows to fit on",
                    name
                )));
            }
            self.scales.insert(name, ColumnScale::from_values(&values));
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted transformation; every non-retained column is dropped.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(FraudMlError::NotFitted);
        }

        let columns: Vec<Column> = Self::output_columns()
            .into_iter()
            .map(|name| {
                let scale = self.scales.get(&name).ok_or(FraudMlError::NotFitted)?;
                let scaled: Vec<f64> = Self::feature_values(df, &name)?
                    .into_iter()
                    .map(|v| scale.apply(v))
                    .collect();
                Ok(Series::new(name.as_str().into(), scaled).into())
            })
            .collect::<Result<Vec<_>>>()?;

        DataFrame::new(columns).map_err(|e| FraudMlError::DataError(e.to_string()))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Transformed feature matrix in output-column order, ready for a
    /// classifier.
    pub fn transform_matrix(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let transformed = self.transform(df)?;
        data::feature_matrix(&transformed, &Self::output_columns())
    }
}

/// One-shot batch job: fit the preprocessor against the reference dataset
/// and persist it. A missing input dataset is fatal here — there is no
/// degraded behavior for this job.
pub fn build_preprocessor(input: &Path, output: &Path) -> Result<FraudPreprocessor> {
    if !input.exists() {
        return Err(FraudMlError::DataError(format!(
            "reference dataset not found: {}",
            input.display()
        )));
    }

    let df = data::load_csv(input)?;
    info!(
        path = %input.display(),
        rows = df.height(),
        "fitting preprocessor against reference dataset"
    );

    let mut preprocessor = FraudPreprocessor::new();
    preprocessor.fit(&df)?;
    crate::artifact::save_preprocessor(&preprocessor, output)?;

    Ok(preprocessor)
}
