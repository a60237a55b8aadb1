//! fraudml - Main entry point

use clap::Parser;
use fraudml::cli::{
    cmd_evaluate, cmd_fit_preprocessor, cmd_predict, cmd_train, cmd_tune, Cli, Commands,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            target,
            model,
            config_dir,
            output,
        } => cmd_train(&data, &target, &model, &config_dir, output.as_deref()),
        Commands::Tune {
            data,
            target,
            model,
            config,
            scoring,
            folds,
            output,
        } => cmd_tune(
            &data,
            &target,
            &model,
            config.as_deref(),
            &scoring,
            folds,
            output.as_deref(),
        ),
        Commands::Evaluate {
            model,
            data,
            target,
        } => cmd_evaluate(&model, &data, &target),
        Commands::Predict {
            model,
            data,
            output,
        } => cmd_predict(&model, &data, output.as_deref()),
        Commands::FitPreprocessor { data, output } => cmd_fit_preprocessor(&data, &output),
    }
}
