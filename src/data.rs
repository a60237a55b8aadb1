//! Dataset loading and DataFrame → ndarray conversion

use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::error::{FraudMlError, Result};

/// Load a CSV file with a header row into a DataFrame.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| FraudMlError::DataError(format!("{}: {}", path.display(), e)))?;

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| FraudMlError::DataError(e.to_string()))
}

/// A single column as f64 values, casting from any numeric dtype.
pub fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| FraudMlError::FeatureNotFound(name.to_string()))?;

    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| FraudMlError::DataError(e.to_string()))?;

    Ok(casted
        .f64()
        .map_err(|e| FraudMlError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Named columns as a row-major feature matrix.
pub fn feature_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let col_data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| column_f64(df, name))
        .collect::<Result<Vec<_>>>()?;

    let n_rows = df.height();
    let n_cols = columns.len();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_data[c][r]
    }))
}

/// Target column as a label vector.
pub fn label_vector(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    Ok(Array1::from_vec(column_f64(df, target)?))
}

/// Split a DataFrame into (features, labels, feature names); every column
/// except the target is treated as a feature.
pub fn split_features_labels(
    df: &DataFrame,
    target: &str,
) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let feature_cols: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|s| s.to_string())
        .collect();

    if feature_cols.len() == df.width() {
        return Err(FraudMlError::FeatureNotFound(target.to_string()));
    }

    let x = feature_matrix(df, &feature_cols)?;
    let y = label_vector(df, target)?;
    Ok((x, y, feature_cols))
}
