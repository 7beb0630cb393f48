use std::path::Path;

use crate::config::{ModelConfig, ModelType};
use crate::error::PredictorResult;
use crate::models::classifier_trait::{Classifier, TrainableClassifier};
use crate::models::gbdt::GBDTClassifier;

/// Build an unfitted classifier from a `ModelConfig`.
pub fn build_model(params: ModelConfig) -> Box<dyn TrainableClassifier> {
    match params.model_type {
        ModelType::GBDT { .. } => Box::new(GBDTClassifier::new(params)),
    }
}

/// Load a fitted classifier written by `TrainableClassifier::save`.
pub fn load_model(path: &Path) -> PredictorResult<Box<dyn Classifier>> {
    let model = GBDTClassifier::load(path)?;
    log::debug!("Loaded {} model from {}", model.name(), path.display());
    Ok(Box::new(model))
}
