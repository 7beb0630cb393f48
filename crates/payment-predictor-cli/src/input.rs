//! JSON command configs. Every field falls back to its default with a
//! warning; command-line arguments override the file.
use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use payment_predictor::config::{BatchConfig, ModelType, PrepConfig, TrainConfig};

use crate::util::{validate_csv_file, validate_json_file};

macro_rules! load_or_default {
    ($partial:expr, $config:ident, $field:ident) => {
        if let Some(val) = $partial.get(stringify!($field)) {
            if let Ok(parsed) = serde_json::from_value(val.clone()) {
                $config.$field = parsed;
            } else {
                log::warn!(
                    "Config Invalid value for '{}', using default: {:?}",
                    stringify!($field),
                    $config.$field
                );
            }
        } else {
            log::warn!(
                "Config Missing field '{}', using default: {:?}",
                stringify!($field),
                $config.$field
            );
        }
    };
}

fn read_partial(config_path: &PathBuf) -> Result<serde_json::Value> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
    serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", config_path))
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrepCommandConfig {
    pub version: String,
    pub raw_data: String,
    pub output_dir: String,
    pub prep: PrepConfig,
}

impl Default for PrepCommandConfig {
    fn default() -> Self {
        PrepCommandConfig {
            version: clap::crate_version!().to_string(),
            raw_data: String::new(),
            output_dir: String::from("prepared"),
            prep: PrepConfig::default(),
        }
    }
}

impl PrepCommandConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = PrepCommandConfig::default();
        if let Some(path) = config_path {
            let partial = read_partial(path)?;
            load_or_default!(partial, config, output_dir);
            load_or_default!(partial, config, prep);
        }

        if let Some(raw_data) = matches.get_one::<String>("raw_data") {
            config.raw_data = raw_data.clone();
        }
        validate_csv_file(&config.raw_data)?;
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }

        Ok(config)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrainCommandConfig {
    pub version: String,
    pub features_file: String,
    pub target_file: String,
    pub output_dir: String,
    pub train: TrainConfig,
}

impl Default for TrainCommandConfig {
    fn default() -> Self {
        TrainCommandConfig {
            version: clap::crate_version!().to_string(),
            features_file: String::from("prepared/features.csv"),
            target_file: String::from("prepared/target.csv"),
            output_dir: String::from("model"),
            train: TrainConfig::default(),
        }
    }
}

/// Apply a `--model-type` name to `current`. The configured hyperparameters
/// survive unless the name selects a different model family.
pub fn override_model_type(current: &mut ModelType, name: &str) -> Result<()> {
    let requested = ModelType::from_str(name).map_err(anyhow::Error::msg)?;
    if std::mem::discriminant(&requested) != std::mem::discriminant(current) {
        *current = requested;
    }
    Ok(())
}

impl TrainCommandConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let partial = read_partial(config_path)?;
        let mut config = TrainCommandConfig::default();

        load_or_default!(partial, config, features_file);
        load_or_default!(partial, config, target_file);
        load_or_default!(partial, config, output_dir);
        load_or_default!(partial, config, train);

        // Apply CLI overrides
        if let Some(features_file) = matches.get_one::<String>("features_file") {
            config.features_file = features_file.clone();
        }
        if let Some(target_file) = matches.get_one::<String>("target_file") {
            config.target_file = target_file.clone();
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            override_model_type(&mut config.train.model.model_type, model_type)?;
        }
        validate_csv_file(&config.features_file)?;
        validate_csv_file(&config.target_file)?;

        Ok(config)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PredictCommandConfig {
    pub version: String,
    pub transactions_file: String,
    pub features_file: String,
    pub target_file: String,
    pub model_file: String,
    pub scaler_file: String,
    pub output_dir: String,
    pub batch: BatchConfig,
}

impl Default for PredictCommandConfig {
    fn default() -> Self {
        PredictCommandConfig {
            version: clap::crate_version!().to_string(),
            transactions_file: String::from("prepared/clean.csv"),
            features_file: String::from("prepared/features.csv"),
            target_file: String::from("prepared/target.csv"),
            model_file: String::from("model/model.json"),
            scaler_file: String::from("model/scaler.json"),
            output_dir: String::from("predictions"),
            batch: BatchConfig::default(),
        }
    }
}

impl PredictCommandConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let partial = read_partial(config_path)?;
        let mut config = PredictCommandConfig::default();

        load_or_default!(partial, config, transactions_file);
        load_or_default!(partial, config, features_file);
        load_or_default!(partial, config, target_file);
        load_or_default!(partial, config, model_file);
        load_or_default!(partial, config, scaler_file);
        load_or_default!(partial, config, output_dir);
        load_or_default!(partial, config, batch);

        // Apply CLI overrides
        if let Some(model_file) = matches.get_one::<String>("model_file") {
            config.model_file = model_file.clone();
        }
        if let Some(scaler_file) = matches.get_one::<String>("scaler_file") {
            config.scaler_file = scaler_file.clone();
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if let Some(interval) = matches.get_one::<usize>("report_interval") {
            config.batch.report_interval = *interval;
        }
        if matches.get_flag("parallel") {
            config.batch.parallel = true;
        }

        validate_csv_file(&config.transactions_file)?;
        validate_csv_file(&config.features_file)?;
        validate_csv_file(&config.target_file)?;
        validate_json_file(&config.model_file)?;
        validate_json_file(&config.scaler_file)?;

        Ok(config)
    }
}
