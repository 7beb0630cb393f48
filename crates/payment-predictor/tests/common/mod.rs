#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use payment_predictor::data_handling::{
    FeatureTable, TransactionRecord, TransactionTable, PAYMENT_NUMBER, TRANSACTION_CODE,
};
use payment_predictor::math::Array2;
use payment_predictor::models::Classifier;
use payment_predictor::preprocessing::FeatureScaler;
use payment_predictor::PredictorResult;

pub fn names() -> Vec<String> {
    vec![PAYMENT_NUMBER.to_string(), TRANSACTION_CODE.to_string()]
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 3, d).unwrap()
}

/// `(acctrefno, payment_number, transaction_code, paid)`
pub type Row = (i64, i64, i64, u8);

pub struct Fixture {
    pub transactions: TransactionTable,
    pub features: FeatureTable,
    pub labels: Vec<u8>,
}

/// Build the cleaned log and its two-column feature table from the same rows.
pub fn fixture(rows: &[Row]) -> Fixture {
    let records = rows
        .iter()
        .map(|&(acct, pn, code, paid)| {
            let due = day(pn.rem_euclid(28) as u32 + 1);
            TransactionRecord {
                acctrefno: acct,
                payment_number: pn,
                transaction_code: code,
                date_due: due,
                transaction_date: if paid == 1 { due } else { due.pred_opt().unwrap() },
                transaction_description: None,
                attributes: Vec::new(),
            }
        })
        .collect();
    let transactions = TransactionTable::new(Vec::new(), records).unwrap();

    let values = Array2::from_rows(
        rows.iter()
            .map(|&(_, pn, code, _)| vec![pn as f64, code as f64])
            .collect(),
        2,
    )
    .unwrap();
    let features =
        FeatureTable::new(rows.iter().map(|r| r.0).collect(), names(), values).unwrap();
    let labels = rows.iter().map(|r| r.3).collect();

    Fixture {
        transactions,
        features,
        labels,
    }
}

/// Four rows over codes 204/206 for account 1.
pub fn two_code_rows() -> Vec<Row> {
    vec![
        (1, 1, 204, 1),
        (1, 2, 206, 1),
        (1, 3, 204, 0),
        (1, 4, 206, 1),
    ]
}

/// Passes values through and counts calls.
pub struct IdentityScaler {
    pub names: Vec<String>,
    pub calls: AtomicUsize,
}

impl IdentityScaler {
    pub fn new() -> Self {
        Self {
            names: names(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeatureScaler for IdentityScaler {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn transform(&self, feature_names: &[String], x: &Array2<f64>) -> PredictorResult<Array2<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        payment_predictor::preprocessing::check_columns(&self.names, feature_names, "identity")?;
        Ok(x.clone())
    }
}

/// Returns the same pay probability for every row.
pub struct ConstantClassifier {
    pub names: Vec<String>,
    pub p: f64,
    pub calls: AtomicUsize,
}

impl ConstantClassifier {
    pub fn new(p: f64) -> Self {
        Self {
            names: names(),
            p,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for ConstantClassifier {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict_proba(&self, x: &Array2<f64>) -> PredictorResult<Vec<[f64; 2]>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![[1.0 - self.p, self.p]; x.nrows()])
    }
}

/// Pay probability grows with the payment number column, capped at 1.
pub struct PaymentNumberClassifier {
    pub names: Vec<String>,
    pub scale: f64,
}

impl PaymentNumberClassifier {
    pub fn new(scale: f64) -> Self {
        Self {
            names: names(),
            scale,
        }
    }
}

impl Classifier for PaymentNumberClassifier {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict_proba(&self, x: &Array2<f64>) -> PredictorResult<Vec<[f64; 2]>> {
        Ok(x.rows()
            .map(|row| {
                let p = (row[0] / self.scale).clamp(0.0, 1.0);
                [1.0 - p, p]
            })
            .collect())
    }
}

/// Panics when it sees the given transaction code.
pub struct PanickingClassifier {
    pub names: Vec<String>,
    pub poison_code: f64,
}

impl Classifier for PanickingClassifier {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict_proba(&self, x: &Array2<f64>) -> PredictorResult<Vec<[f64; 2]>> {
        if x.rows().any(|row| row[1] == self.poison_code) {
            panic!("poisoned row");
        }
        Ok(vec![[0.2, 0.8]; x.nrows()])
    }
}
