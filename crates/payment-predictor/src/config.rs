use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::GBDT {
            max_depth: 6,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "SquaredError".to_string(),
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}. Supported: gbdt", s)),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::GBDT { .. } => write!(f, "gbdt"),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// Row and column filters applied to the raw transaction log.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PrepConfig {
    /// Transaction codes kept; everything else is dropped.
    pub accepted_codes: Vec<i64>,
    /// Descriptions kept when the log has a description column.
    pub accepted_descriptions: Vec<String>,
    /// Attribute columns with at least this share of empty values are dropped.
    pub null_column_threshold: f64,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            accepted_codes: vec![204, 206],
            accepted_descriptions: vec![
                "P+I Principal Payment".to_string(),
                "P+I Interest Payment".to_string(),
            ],
            null_column_threshold: 0.1,
        }
    }
}

/// Settings for fitting the scaler and classifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelConfig,
    /// Share of rows held out for out-of-sample scoring.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            test_size: 0.25,
            seed: 33,
        }
    }
}

/// Settings for scoring many customers.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Emit a progress snapshot every `report_interval` customers (0 disables).
    pub report_interval: usize,
    /// Fan customers out over the rayon pool.
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            report_interval: 5000,
            parallel: false,
        }
    }
}
