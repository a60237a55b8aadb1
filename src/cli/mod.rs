//! Command-line interface
//!
//! Subcommands for training, tuning, evaluation, prediction, and the
//! one-shot preprocessor batch job.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifact;
use crate::data;
use crate::metrics::{self, Metric};
use crate::preprocess;
use crate::registry::ModelKind;
use crate::trainer::{self, TrainOptions, TuneOptions};
use crate::tuning::format_params;

// ─── Output helpers ───────────────────────────────────────────────────────────

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", muted(&"─".repeat(48)));
}

fn step(msg: &str, detail: &str) {
    println!("  {} {} {}", "✓".green(), msg, muted(detail));
}

fn metric_line(name: &str, value: f64) {
    println!("  {:<12} {}", muted(name), format!("{:.4}", value).white().bold());
}

// ─── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fraudml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, tune, and persist fraud-detection classifiers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model with its per-model config file
    Train {
        /// Training data (CSV with header)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "Class")]
        target: String,

        /// Model identifier (e.g. random-forest, decision-tree)
        #[arg(short, long)]
        model: String,

        /// Directory of per-model config files
        #[arg(long, default_value = "configs")]
        config_dir: PathBuf,

        /// Output artifact path (default: models/models_<identifier>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Grid-search hyperparameters with cross-validation
    Tune {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "Class")]
        target: String,

        #[arg(short, long)]
        model: String,

        /// Tuning config file (default: configs/<identifier>_tune.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scoring metric (accuracy, precision, recall, f1)
        #[arg(long, default_value = "f1")]
        scoring: String,

        /// Cross-validation fold count
        #[arg(long, default_value = "5")]
        folds: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate a saved model against labeled data
    Evaluate {
        /// Saved model artifact
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "Class")]
        target: String,
    },

    /// Predict labels with a saved model
    Predict {
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short, long)]
        data: PathBuf,

        /// Write predictions as CSV instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit the fixed preprocessing pipeline against a reference dataset
    FitPreprocessor {
        /// Reference dataset
        #[arg(short, long, default_value = "data/train_goc.csv")]
        data: PathBuf,

        /// Output artifact path
        #[arg(short, long, default_value = "data/fraud_preprocessor.json")]
        output: PathBuf,
    },
}

// ─── Commands ─────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    target: &str,
    model: &str,
    config_dir: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Train");

    let start = Instant::now();
    let df = data::load_csv(data_path)?;
    let (x, y, _) = data::split_features_labels(&df, target)?;
    step(
        "loaded data",
        &format!("{} rows × {} features", x.nrows(), x.ncols()),
    );

    let opts = TrainOptions {
        config_dir: config_dir.to_path_buf(),
        ..TrainOptions::default()
    };
    let fitted = trainer::train(&x, &y, model, &opts)?;
    step("trained", &format!("{} in {:.2?}", fitted.name(), start.elapsed()));

    let report = metrics::evaluate(&fitted, &x, &y)?;
    metric_line("accuracy", report.accuracy);
    metric_line("f1", report.f1);

    let kind: ModelKind = model.parse()?;
    let default_path = artifact::model_artifact_path(Path::new("models"), kind);
    let out_path = output.unwrap_or(&default_path);
    artifact::save_classifier(&fitted, out_path)?;
    step("saved", &out_path.display().to_string());

    Ok(())
}

pub fn cmd_tune(
    data_path: &Path,
    target: &str,
    model: &str,
    config: Option<&Path>,
    scoring: &str,
    folds: usize,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Tune");

    let df = data::load_csv(data_path)?;
    let (x, y, _) = data::split_features_labels(&df, target)?;
    step(
        "loaded data",
        &format!("{} rows × {} features", x.nrows(), x.ncols()),
    );

    let scoring: Metric = scoring.parse()?;
    let opts = TuneOptions {
        config_path: config.map(|p| p.to_path_buf()),
        scoring,
        folds,
        ..TuneOptions::default()
    };

    let start = Instant::now();
    let outcome = trainer::tune(&x, &y, model, &opts)?;
    step(
        "searched",
        &format!(
            "{} combinations in {:.2?}",
            outcome.candidates.len(),
            start.elapsed()
        ),
    );

    println!(
        "  {:<12} {}",
        muted("best params"),
        format_params(&outcome.best_params).white()
    );
    metric_line(&format!("best {}", scoring), outcome.best_score);

    let kind: ModelKind = model.parse()?;
    let default_path = artifact::model_artifact_path(Path::new("models"), kind);
    let out_path = output.unwrap_or(&default_path);
    artifact::save_classifier(&outcome.best, out_path)?;
    step("saved", &out_path.display().to_string());

    Ok(())
}

pub fn cmd_evaluate(model_path: &Path, data_path: &Path, target: &str) -> anyhow::Result<()> {
    section("Evaluate");

    let model = artifact::load_classifier(model_path)?;
    step("loaded model", model.name());

    let df = data::load_csv(data_path)?;
    let (x, y, _) = data::split_features_labels(&df, target)?;
    let report = metrics::evaluate(&model, &x, &y)?;

    metric_line("accuracy", report.accuracy);
    metric_line("f1", report.f1);
    Ok(())
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    let model = artifact::load_classifier(model_path)?;
    let df = data::load_csv(data_path)?;

    let feature_cols: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let x = data::feature_matrix(&df, &feature_cols)?;
    let predictions = model.predict(&x)?;

    let flagged = predictions.iter().filter(|&&p| p > 0.5).count();
    step(
        "predicted",
        &format!("{} rows, {} flagged", predictions.len(), flagged),
    );

    if let Some(out_path) = output {
        let mut text = String::from("prediction\n");
        for p in predictions.iter() {
            text.push_str(&format!("{}\n", *p as i64));
        }
        std::fs::write(out_path, text)?;
        step("saved", &out_path.display().to_string());
    }

    Ok(())
}

pub fn cmd_fit_preprocessor(data_path: &Path, output: &Path) -> anyhow::Result<()> {
    section("Fit preprocessor");

    let start = Instant::now();
    preprocess::build_preprocessor(data_path, output)?;
    step(
        "fitted and saved",
        &format!("{} in {:.2?}", output.display(), start.elapsed()),
    );

    Ok(())
}
