use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use payment_predictor::io::{read_transactions, write_features, write_target, write_transactions};
use payment_predictor::prep::{clean, encode_features};

use crate::input::PrepCommandConfig;

pub const CLEAN_FILE: &str = "clean.csv";
pub const FEATURES_FILE: &str = "features.csv";
pub const TARGET_FILE: &str = "target.csv";

/// Clean the raw log and write the three row-aligned tables into
/// `output_dir`. Returns the output folder.
pub fn run_prep(config: &PrepCommandConfig) -> Result<PathBuf> {
    let raw = read_transactions(&config.raw_data)
        .with_context(|| format!("Failed to read transactions: {}", config.raw_data))?;
    log::info!("Read {} raw transactions", raw.len());

    let cleaned = clean(&raw, &config.prep)?;
    let (features, labels) = encode_features(&cleaned)?;
    log::info!(
        "Kept {} payment rows for {} accounts, {} feature columns",
        cleaned.len(),
        cleaned.unique_accounts().len(),
        features.feature_names().len()
    );

    let out = PathBuf::from(&config.output_dir);
    fs::create_dir_all(&out)
        .with_context(|| format!("Failed to create output folder: {}", out.display()))?;
    write_transactions(&cleaned, out.join(CLEAN_FILE))?;
    write_features(&features, out.join(FEATURES_FILE))?;
    write_target(&labels, out.join(TARGET_FILE))?;

    Ok(out)
}
