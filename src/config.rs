//! Hyperparameter configuration files
//!
//! Configuration is stored as JSON, one file per model identifier:
//! - `configs/<identifier>_config.json` — direct-fit parameters
//! - `configs/<identifier>_tune.json` — grid-search candidates
//!
//! Loading is deliberately soft: a missing or unparsable file degrades to an
//! empty mapping with a logged diagnostic, and callers treat an empty mapping
//! as "use built-in defaults".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::registry::ModelKind;

/// A single hyperparameter value as it appears in a JSON config file.
///
/// Untagged: JSON booleans, integers, floats, and strings map onto the
/// variants in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Integer-valued parameter (counts, depths, iteration caps)
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }

    /// Numeric parameter; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Direct-fit parameters: name → value.
///
/// BTreeMap keeps key order deterministic, which keeps logs and the
/// grid-search Cartesian product stable across runs.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Tuning parameters after normalization: name → candidate list
pub type ParamGrid = BTreeMap<String, Vec<ParamValue>>;

/// A tuning-file entry: either a scalar or a list of candidates
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ParamValue>),
    One(ParamValue),
}

/// Conventional path of the direct-fit config for a model
pub fn fit_config_path(config_dir: &Path, kind: ModelKind) -> PathBuf {
    config_dir.join(format!("{}_config.json", kind.as_str()))
}

/// Conventional path of the tuning config for a model
pub fn tune_config_path(config_dir: &Path, kind: ModelKind) -> PathBuf {
    config_dir.join(format!("{}_tune.json", kind.as_str()))
}

/// Load direct-fit parameters from a JSON file.
///
/// Never fails: a missing file or malformed content degrades to an empty
/// mapping after logging a warning.
pub fn load_params(path: &Path) -> ParamMap {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            warn!(path = %path.display(), "config file not found, using built-in defaults");
            return ParamMap::new();
        }
    };

    match serde_json::from_str::<ParamMap>(&text) {
        Ok(params) => params,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config, using built-in defaults");
            ParamMap::new()
        }
    }
}

/// Load grid-search candidates from a JSON file and normalize every scalar
/// into a one-element candidate list.
///
/// Same soft-fail policy as [`load_params`]; the caller decides whether an
/// empty grid is acceptable (direct fit) or aborts (tuning).
pub fn load_grid(path: &Path) -> ParamGrid {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            warn!(path = %path.display(), "tuning config not found");
            return ParamGrid::new();
        }
    };

    let raw: BTreeMap<String, OneOrMany> = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse tuning config");
            return ParamGrid::new();
        }
    };

    raw.into_iter()
        .map(|(name, entry)| {
            let candidates = match entry {
                OneOrMany::Many(values) => values,
                OneOrMany::One(value) => vec![value],
            };
            (name, candidates)
        })
        .collect()
}
