//! Fit the scaler and classifier on the encoded feature table.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::data_handling::FeatureTable;
use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;
use crate::models::factory::build_model;
use crate::models::{Classifier, TrainableClassifier};
use crate::preprocessing::{fit_transform, MinMaxScaler};
use crate::stats::{accuracy_score, roc_auc};

/// Scores of the fitted classifier on both sides of the split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_auc: Option<f64>,
    pub test_auc: Option<f64>,
}

pub struct TrainedModel {
    pub scaler: MinMaxScaler,
    pub classifier: Box<dyn TrainableClassifier>,
    pub report: TrainingReport,
}

/// Shuffle row indices with a fixed seed and cut off the test share.
///
/// The test side gets `ceil(n * test_size)` rows, leaving at least one
/// training row.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

fn evaluate(
    model: &dyn Classifier,
    x: &Array2<f64>,
    y: &[u8],
) -> PredictorResult<(f64, Option<f64>)> {
    if x.is_empty() {
        return Ok((0.0, None));
    }
    let predicted = model.predict(x)?;
    let scores: Vec<f64> = model.predict_proba(x)?.iter().map(|p| p[1]).collect();
    Ok((accuracy_score(y, &predicted), roc_auc(&scores, y)))
}

/// Fit a `MinMaxScaler` on all rows, then fit the configured classifier on
/// a seeded train split and score it on both sides.
pub fn train(
    features: &FeatureTable,
    labels: &[u8],
    config: &TrainConfig,
) -> PredictorResult<TrainedModel> {
    if features.nrows() != labels.len() {
        return Err(PredictorError::schema(format!(
            "{} feature rows for {} labels",
            features.nrows(),
            labels.len()
        )));
    }

    let names = features.feature_names();
    let (scaler, scaled) = fit_transform(names, features.values())?;

    let (train_idx, test_idx) = train_test_split(scaled.nrows(), config.test_size, config.seed);
    let x_train = scaled.select_rows(&train_idx);
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let x_test = scaled.select_rows(&test_idx);
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

    log::info!(
        "Training {} model on {} rows, holding out {}",
        config.model.model_type,
        train_idx.len(),
        test_idx.len()
    );
    let mut classifier = build_model(config.model.clone());
    classifier.fit(names, &x_train, &y_train)?;

    let (train_accuracy, train_auc) = evaluate(classifier.as_classifier(), &x_train, &y_train)?;
    let (test_accuracy, test_auc) = evaluate(classifier.as_classifier(), &x_test, &y_test)?;
    let report = TrainingReport {
        n_train: train_idx.len(),
        n_test: test_idx.len(),
        train_accuracy,
        test_accuracy,
        train_auc,
        test_auc,
    };
    log::info!(
        "Train accuracy {:.4}, test accuracy {:.4}",
        report.train_accuracy,
        report.test_accuracy
    );

    Ok(TrainedModel {
        scaler,
        classifier,
        report,
    })
}
