//! Per-customer history reconstruction and next-payment projection.
//!
//! A `CustomerProjector` is built for exactly one account. Construction
//! rebuilds the customer's raw and model views, scores the history to get
//! an in-sample accuracy, then synthesizes one "next payment" row per
//! transaction code by advancing the payment number one average step and
//! scores those rows for the pay probability.
use chrono::NaiveDate;

use crate::data_handling::{FeatureTable, TransactionRecord, TransactionTable};
use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;
use crate::models::classifier_trait::{check_model_columns, Classifier, PAY_THRESHOLD};
use crate::preprocessing::FeatureScaler;
use crate::stats::{accuracy_score, mean, round_to};

/// Read-only inputs shared by every projection in a run.
#[derive(Clone, Copy)]
pub struct ScoringContext<'a> {
    pub transactions: &'a TransactionTable,
    pub features: &'a FeatureTable,
    /// Realized `paid` labels, row-aligned with `features`.
    pub labels: &'a [u8],
    pub classifier: &'a dyn Classifier,
    pub scaler: &'a dyn FeatureScaler,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        transactions: &'a TransactionTable,
        features: &'a FeatureTable,
        labels: &'a [u8],
        classifier: &'a dyn Classifier,
        scaler: &'a dyn FeatureScaler,
    ) -> PredictorResult<Self> {
        if labels.len() != features.nrows() {
            return Err(PredictorError::schema(format!(
                "label column has {} rows, feature table has {}",
                labels.len(),
                features.nrows()
            )));
        }
        Ok(Self {
            transactions,
            features,
            labels,
            classifier,
            scaler,
        })
    }
}

/// Unscaled history of one customer, most recent payment first.
#[derive(Debug, Clone)]
pub struct RawView {
    pub rows: Vec<TransactionRecord>,
    /// Distinct codes in order of first appearance in the log.
    pub payment_codes: Vec<i64>,
    /// Due date of the latest row of each code, ordered by the payment
    /// number of that row.
    pub payment_dates: Vec<NaiveDate>,
}

impl RawView {
    pub fn max_payment_number(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.payment_number).max()
    }
}

/// Scaled feature rows of one customer, most recent payment first.
#[derive(Debug, Clone)]
pub struct ModelView {
    /// Feature values before scaling; used for grouping by code.
    pub unscaled: Array2<f64>,
    pub scaled: Array2<f64>,
    /// Realized labels detached from the rows above.
    pub target: Vec<u8>,
    pub payment_number_idx: usize,
    pub transaction_code_idx: usize,
}

impl ModelView {
    fn unscaled_payment_numbers(&self) -> Vec<f64> {
        self.unscaled.column(self.payment_number_idx)
    }

    fn scaled_payment_numbers(&self) -> Vec<f64> {
        self.scaled.column(self.payment_number_idx)
    }

    pub fn distinct_payment_numbers(&self) -> usize {
        let mut values = self.unscaled_payment_numbers();
        values.sort_by(f64::total_cmp);
        values.dedup();
        values.len()
    }
}

/// Indices of `payment_numbers` sorted descending; ties keep table order.
fn descending_order(payment_numbers: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..payment_numbers.len()).collect();
    order.sort_by(|&a, &b| payment_numbers[b].total_cmp(&payment_numbers[a]));
    order
}

/// Sort ascending by payment number and keep the last row of every code.
///
/// The survivors come back in ascending payment-number order, one per
/// distinct code.
pub fn latest_per_code<K: PartialEq + Copy>(payment_numbers: &[f64], codes: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..payment_numbers.len()).collect();
    order.sort_by(|&a, &b| payment_numbers[a].total_cmp(&payment_numbers[b]));

    let mut seen: Vec<K> = Vec::new();
    let mut kept = Vec::new();
    for &i in order.iter().rev() {
        if !seen.contains(&codes[i]) {
            seen.push(codes[i]);
            kept.push(i);
        }
    }
    kept.reverse();
    kept
}

/// Filter the cleaned log to one customer and derive the display fields.
pub fn build_raw_view(acctrefno: i64, transactions: &TransactionTable) -> PredictorResult<RawView> {
    let rows: Vec<TransactionRecord> = transactions
        .records_for(acctrefno)
        .into_iter()
        .cloned()
        .collect();
    if rows.is_empty() {
        return Err(PredictorError::NotFound { acctrefno });
    }

    let payment_numbers: Vec<f64> = rows.iter().map(|r| r.payment_number as f64).collect();
    let codes: Vec<i64> = rows.iter().map(|r| r.transaction_code).collect();
    let latest = latest_per_code(&payment_numbers, &codes);
    let mut payment_codes: Vec<i64> = Vec::new();
    for &code in &codes {
        if !payment_codes.contains(&code) {
            payment_codes.push(code);
        }
    }
    let payment_dates = latest.iter().map(|&i| rows[i].date_due).collect();

    let rows = descending_order(&payment_numbers)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect();

    Ok(RawView {
        rows,
        payment_codes,
        payment_dates,
    })
}

fn select_model_rows(acctrefno: i64, features: &FeatureTable) -> PredictorResult<Vec<usize>> {
    let rows = features.rows_for(acctrefno);
    if rows.is_empty() {
        return Err(PredictorError::NotFound { acctrefno });
    }
    let pn_idx = features.payment_number_index();
    let payment_numbers: Vec<f64> = rows
        .iter()
        .map(|&r| features.values()[(r, pn_idx)])
        .collect();
    Ok(descending_order(&payment_numbers)
        .into_iter()
        .map(|i| rows[i])
        .collect())
}

/// Filter the feature table to one customer, detach its labels and scale it.
pub fn build_model_view(acctrefno: i64, ctx: &ScoringContext<'_>) -> PredictorResult<ModelView> {
    let rows = select_model_rows(acctrefno, ctx.features)?;
    model_view_from_rows(&rows, ctx)
}

fn model_view_from_rows(rows: &[usize], ctx: &ScoringContext<'_>) -> PredictorResult<ModelView> {
    let unscaled = ctx.features.values().select_rows(rows);
    let target = rows.iter().map(|&r| ctx.labels[r]).collect();
    let scaled = ctx
        .scaler
        .transform(ctx.features.feature_names(), &unscaled)?;
    Ok(ModelView {
        unscaled,
        scaled,
        target,
        payment_number_idx: ctx.features.payment_number_index(),
        transaction_code_idx: ctx.features.transaction_code_index(),
    })
}

/// Complete payment-prediction profile of one customer.
#[derive(Debug, Clone)]
pub struct CustomerProjector {
    pub acctrefno: i64,
    /// In-sample agreement between point predictions and realized labels.
    pub accuracy: f64,
    pub payment_codes: Vec<i64>,
    pub payment_dates: Vec<NaiveDate>,
    /// Pay probability per synthetic row, rounded to 5 decimals.
    pub next_payment_probability: Vec<f64>,
    pub payment_prediction: Vec<u8>,
    /// Mean pay probability as a percentage, rounded to 2 decimals.
    pub certainty: f64,
    /// Transaction code of each synthetic row, aligned with the probabilities.
    pub future_codes: Vec<i64>,
    /// Synthetic scaled rows that were scored.
    pub future: Array2<f64>,
    /// Point predictions for the history, most recent first.
    pub historical_predictions: Vec<u8>,
    pub number_of_payments: f64,
    pub payment_number_distance: f64,
    history: Vec<TransactionRecord>,
}

impl CustomerProjector {
    pub fn new(acctrefno: i64, ctx: &ScoringContext<'_>) -> PredictorResult<Self> {
        let raw = build_raw_view(acctrefno, ctx.transactions)?;
        let model_rows = select_model_rows(acctrefno, ctx.features)?;
        check_model_columns(ctx.classifier, ctx.features.feature_names())?;

        let model = model_view_from_rows(&model_rows, ctx)?;
        let distinct = model.distinct_payment_numbers();
        if distinct < 2 {
            return Err(PredictorError::NotEnoughHistory {
                acctrefno,
                distinct_payment_numbers: distinct,
            });
        }

        // running maximum over both views
        let scaled_pn = model.scaled_payment_numbers();
        let number_of_payments = scaled_pn
            .iter()
            .copied()
            .fold(raw.max_payment_number().unwrap_or(0) as f64, f64::max);
        if number_of_payments <= 0.0 {
            return Err(PredictorError::NonPositivePaymentNumbers {
                acctrefno,
                number_of_payments,
            });
        }

        let historical_predictions = ctx.classifier.predict(&model.scaled)?;
        if historical_predictions.len() != model.target.len() {
            return Err(PredictorError::Model(format!(
                "{} returned {} predictions for {} rows",
                ctx.classifier.name(),
                historical_predictions.len(),
                model.target.len()
            )));
        }
        let accuracy = accuracy_score(&model.target, &historical_predictions);

        let (max_pn, min_pn) = scaled_pn
            .iter()
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), &v| {
                (hi.max(v), lo.min(v))
            });
        let payment_number_distance = (max_pn - min_pn) / number_of_payments;

        let unscaled_pn = model.unscaled_payment_numbers();
        let unscaled_codes = model.unscaled.column(model.transaction_code_idx);
        let latest = latest_per_code(&unscaled_pn, &unscaled_codes);
        let mut future = model.scaled.select_rows(&latest);
        for r in 0..future.nrows() {
            future[(r, model.payment_number_idx)] += payment_number_distance;
        }
        let future_codes = latest
            .iter()
            .map(|&i| unscaled_codes[i].round() as i64)
            .collect();

        let probabilities = ctx.classifier.predict_proba(&future)?;
        if probabilities.len() != future.nrows() {
            return Err(PredictorError::Model(format!(
                "{} returned {} probabilities for {} rows",
                ctx.classifier.name(),
                probabilities.len(),
                future.nrows()
            )));
        }
        let next_payment_probability: Vec<f64> =
            probabilities.iter().map(|p| round_to(p[1], 5)).collect();
        let payment_prediction = next_payment_probability
            .iter()
            .map(|&p| u8::from(p >= PAY_THRESHOLD))
            .collect();
        let certainty = round_to(mean(&next_payment_probability).unwrap_or(0.0) * 100.0, 2);

        log::trace!(
            "acctrefno {}: {} history rows, step {:.5}, certainty {}",
            acctrefno,
            model.target.len(),
            payment_number_distance,
            certainty
        );

        Ok(Self {
            acctrefno,
            accuracy,
            payment_codes: raw.payment_codes,
            payment_dates: raw.payment_dates,
            next_payment_probability,
            payment_prediction,
            certainty,
            future_codes,
            future,
            historical_predictions,
            number_of_payments,
            payment_number_distance,
            history: raw.rows,
        })
    }

    /// Raw history rows, most recent first.
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    /// Pair each raw history row with its point prediction.
    ///
    /// Both views are sorted the same way, so this only fails when the raw
    /// log and the feature table disagree on the customer's row count.
    pub fn predicted_history(&self) -> PredictorResult<Vec<(&TransactionRecord, u8)>> {
        if self.history.len() != self.historical_predictions.len() {
            return Err(PredictorError::schema(format!(
                "raw history has {} rows, model view has {}",
                self.history.len(),
                self.historical_predictions.len()
            )));
        }
        Ok(self
            .history
            .iter()
            .zip(self.historical_predictions.iter().copied())
            .collect())
    }
}
