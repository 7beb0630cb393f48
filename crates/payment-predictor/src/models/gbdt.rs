use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;
use crate::models::classifier_trait::{Classifier, TrainableClassifier};

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Serialize, Deserialize)]
pub struct GBDTClassifier {
    params: ModelConfig,
    feature_names: Vec<String>,
    model: Option<GBDT>,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GBDTClassifier {
            params,
            feature_names: Vec::new(),
            model: None,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn load(path: &Path) -> PredictorResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let classifier: GBDTClassifier = serde_json::from_reader(reader)?;
        if classifier.model.is_none() {
            return Err(PredictorError::Model(format!(
                "{} holds an unfitted model",
                path.display()
            )));
        }
        Ok(classifier)
    }

    fn loss_type(&self) -> &str {
        match &self.params.model_type {
            ModelType::GBDT { loss_type, .. } => loss_type,
        }
    }

    /// LogLikelyhood expects labels in {-1, 1}; the other losses regress on {0, 1}.
    fn encode_label(&self, y: u8) -> f32 {
        match (self.loss_type(), y) {
            ("LogLikelyhood", 0) => -1.0,
            (_, 0) => 0.0,
            _ => 1.0,
        }
    }

    fn to_data(x: &Array2<f64>) -> DataVec {
        let mut data = DataVec::with_capacity(x.nrows());
        for row in x.rows() {
            let features = row.iter().map(|&v| v as f32).collect();
            data.push(Data::new_training_data(features, 1.0, 0.0, None));
        }
        data
    }
}

impl Classifier for GBDTClassifier {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, x: &Array2<f64>) -> PredictorResult<Vec<[f64; 2]>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PredictorError::Model("GBDT model has not been fitted".to_string()))?;
        if x.ncols() != self.feature_names.len() {
            return Err(PredictorError::schema(format!(
                "model trained on {} columns, matrix has {}",
                self.feature_names.len(),
                x.ncols()
            )));
        }
        if x.is_empty() {
            return Ok(Vec::new());
        }

        let raw = model.predict(&Self::to_data(x));
        Ok(raw
            .iter()
            .map(|&v| {
                let p = f64::from(v).clamp(0.0, 1.0);
                [1.0 - p, p]
            })
            .collect())
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

impl TrainableClassifier for GBDTClassifier {
    fn fit(&mut self, feature_names: &[String], x: &Array2<f64>, y: &[u8]) -> PredictorResult<()> {
        if x.nrows() != y.len() {
            return Err(PredictorError::schema(format!(
                "{} feature rows for {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(PredictorError::Model(
                "cannot fit a GBDT model on an empty table".to_string(),
            ));
        }
        if feature_names.len() != x.ncols() {
            return Err(PredictorError::schema(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                x.ncols()
            )));
        }

        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();

                config.set_feature_size(x.ncols());
                config.set_shrinkage(self.params.learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);

                let mut train_x = DataVec::with_capacity(x.nrows());
                for (row, &label) in x.rows().zip(y.iter()) {
                    let features = row.iter().map(|&v| v as f32).collect();
                    train_x.push(Data::new_training_data(
                        features,
                        1.0,
                        self.encode_label(label),
                        None,
                    ));
                }

                log::debug!(
                    "Fitting GBDT on {} rows x {} features ({} rounds, loss {})",
                    x.nrows(),
                    x.ncols(),
                    num_boost_round,
                    loss_type
                );
                gbdt.fit(&mut train_x);

                self.model = Some(gbdt);
                self.feature_names = feature_names.to_vec();
            }
        }
        Ok(())
    }

    fn save(&self, path: &Path) -> PredictorResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    fn as_classifier(&self) -> &dyn Classifier {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["f0".to_string(), "f1".to_string()]
    }

    fn toy() -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                1.0, 0.0, 0.0, 1.0, 1.0, 0.1, 0.0, 0.9, 1.1, 0.0, 0.0, 1.2, 0.9, 0.2, 0.1, 1.0,
            ],
        )
        .unwrap();
        (x, vec![1, 0, 1, 0, 1, 0, 1, 0])
    }

    #[test]
    fn predict_before_fit_is_a_model_error() {
        let clf = GBDTClassifier::new(ModelConfig::default());
        let (x, _) = toy();
        assert_eq!(clf.predict_proba(&x).unwrap_err().kind(), "model");
    }

    #[test]
    fn probabilities_are_complementary() {
        let mut clf = GBDTClassifier::new(ModelConfig::default());
        let (x, y) = toy();
        clf.fit(&names(), &x, &y).unwrap();
        let probs = clf.predict_proba(&x).unwrap();
        assert_eq!(probs.len(), 8);
        for p in probs {
            assert!((0.0..=1.0).contains(&p[1]));
            assert!((p[0] + p[1] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn fit_rejects_label_length_mismatch() {
        let mut clf = GBDTClassifier::new(ModelConfig::default());
        let (x, _) = toy();
        assert!(clf.fit(&names(), &x, &[1, 0]).is_err());
    }
}
