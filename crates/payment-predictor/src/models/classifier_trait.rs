use std::path::Path;

use crate::error::PredictorResult;
use crate::math::Array2;
use crate::preprocessing::check_columns;

/// Probability threshold separating "pay" from "no pay".
pub const PAY_THRESHOLD: f64 = 0.5;

/// Read-only binary classifier contract used by the projector.
///
/// Class 1 is "pay", class 0 is "no pay". Implementations must not mutate
/// themselves while scoring so one fitted model can be shared across
/// worker threads.
pub trait Classifier: Send + Sync {
    /// Columns (and their order) the model was trained on.
    fn feature_names(&self) -> &[String];

    /// `[P(no pay), P(pay)]` for every row.
    fn predict_proba(&self, x: &Array2<f64>) -> PredictorResult<Vec<[f64; 2]>>;

    /// Point prediction per row; defaults to thresholding `predict_proba`.
    fn predict(&self, x: &Array2<f64>) -> PredictorResult<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|p| u8::from(p[1] >= PAY_THRESHOLD))
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// A classifier that can be fitted and persisted.
pub trait TrainableClassifier: Classifier {
    /// Fit on rows whose columns are `feature_names`; `y` holds 0/1 labels.
    fn fit(&mut self, feature_names: &[String], x: &Array2<f64>, y: &[u8]) -> PredictorResult<()>;

    fn save(&self, path: &Path) -> PredictorResult<()>;

    /// Borrow as the read-only scoring interface.
    fn as_classifier(&self) -> &dyn Classifier;
}

/// Reject a feature table whose columns differ from the training schema.
pub fn check_model_columns(model: &dyn Classifier, feature_names: &[String]) -> PredictorResult<()> {
    check_columns(model.feature_names(), feature_names, model.name())
}
