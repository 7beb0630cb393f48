use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use payment_predictor::io::{read_features, read_target, save_json};
use payment_predictor::training::{train, TrainingReport};

use crate::input::TrainCommandConfig;

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const REPORT_FILE: &str = "training_report.json";

/// Fit the scaler and classifier and write both next to a training report.
pub fn run_training(config: &TrainCommandConfig) -> Result<TrainingReport> {
    let features = read_features(&config.features_file)
        .with_context(|| format!("Failed to read features: {}", config.features_file))?;
    let labels = read_target(&config.target_file)
        .with_context(|| format!("Failed to read target: {}", config.target_file))?;

    let trained = train(&features, &labels, &config.train)?;

    let out = PathBuf::from(&config.output_dir);
    fs::create_dir_all(&out)
        .with_context(|| format!("Failed to create output folder: {}", out.display()))?;
    save_json(&trained.scaler, out.join(SCALER_FILE))?;
    trained.classifier.save(&out.join(MODEL_FILE))?;
    save_json(&trained.report, out.join(REPORT_FILE))?;

    log::info!(
        "Model written to {} (test accuracy {:.4}, test AUC {})",
        out.display(),
        trained.report.test_accuracy,
        trained
            .report
            .test_auc
            .map(|auc| format!("{:.4}", auc))
            .unwrap_or_else(|| "n/a".to_string())
    );
    Ok(trained.report)
}
