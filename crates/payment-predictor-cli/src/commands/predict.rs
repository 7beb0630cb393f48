use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use payment_predictor::batch::{BatchOutcome, BatchRunner};
use payment_predictor::data_handling::{FeatureTable, TransactionTable};
use payment_predictor::io::{
    load_json, read_features, read_target, read_transactions, write_errors, write_results,
};
use payment_predictor::models::factory::load_model;
use payment_predictor::models::Classifier;
use payment_predictor::preprocessing::MinMaxScaler;
use payment_predictor::ScoringContext;

use crate::input::PredictCommandConfig;
use crate::progress::Progress;
use crate::util::create_run_dir;

/// Tables and fitted models shared by every customer of a run.
pub struct LoadedInputs {
    pub transactions: TransactionTable,
    pub features: FeatureTable,
    pub labels: Vec<u8>,
    pub classifier: Box<dyn Classifier>,
    pub scaler: MinMaxScaler,
}

impl LoadedInputs {
    pub fn load(config: &PredictCommandConfig) -> Result<Self> {
        let transactions = read_transactions(&config.transactions_file).with_context(|| {
            format!("Failed to read transactions: {}", config.transactions_file)
        })?;
        let features = read_features(&config.features_file)
            .with_context(|| format!("Failed to read features: {}", config.features_file))?;
        let labels = read_target(&config.target_file)
            .with_context(|| format!("Failed to read target: {}", config.target_file))?;
        let classifier = load_model(Path::new(&config.model_file))
            .with_context(|| format!("Failed to load model: {}", config.model_file))?;
        let scaler: MinMaxScaler = load_json(&config.scaler_file)
            .with_context(|| format!("Failed to load scaler: {}", config.scaler_file))?;

        Ok(Self {
            transactions,
            features,
            labels,
            classifier,
            scaler,
        })
    }

    pub fn context(&self) -> Result<ScoringContext<'_>> {
        Ok(ScoringContext::new(
            &self.transactions,
            &self.features,
            &self.labels,
            self.classifier.as_ref(),
            &self.scaler,
        )?)
    }
}

/// Which customers to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    One(i64),
    All,
}

impl Selection {
    fn file_prefix(&self) -> String {
        match self {
            Selection::One(acctrefno) => acctrefno.to_string(),
            Selection::All => "all".to_string(),
        }
    }
}

/// Score the selected customers and write `<prefix>_results.csv` and
/// `<prefix>_errors.csv` into a dated folder under `output_dir`.
pub fn run_prediction(
    config: &PredictCommandConfig,
    selection: Selection,
) -> Result<(BatchOutcome, PathBuf)> {
    let inputs = LoadedInputs::load(config)?;
    let ctx = inputs.context()?;

    let ids = match selection {
        Selection::One(acctrefno) => vec![acctrefno],
        Selection::All => inputs.transactions.unique_accounts(),
    };
    log::info!("Scoring {} customer(s)", ids.len());

    let mut batch = config.batch.clone();
    if let Selection::One(_) = selection {
        batch.report_interval = 1;
    }

    let progress = Progress::new(ids.len(), "Scoring customers");
    let outcome = BatchRunner::new(ctx, batch)
        .with_reporter(&progress)
        .execute(&ids);
    progress.finish();

    let dir = create_run_dir(
        Path::new(&config.output_dir),
        matches!(selection, Selection::One(_)),
    )?;
    let prefix = selection.file_prefix();
    write_results(&outcome.results, dir.join(format!("{}_results.csv", prefix)))?;
    write_errors(&outcome.errors, dir.join(format!("{}_errors.csv", prefix)))?;

    for e in &outcome.errors {
        log::warn!("acctrefno {}: {}", e.acctrefno, e.message);
    }
    Ok((outcome, dir))
}
