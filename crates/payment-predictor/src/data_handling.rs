//! Data structures for transaction logs and dummy-encoded feature tables.
//!
//! `TransactionTable` is the cleaned, unscaled log used for display fields
//! (payment codes and due dates). `FeatureTable` is the numeric table the
//! scaler and classifier were trained on; it carries the account identifier
//! beside the features rather than inside them.
use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;

/// Column holding the ordinal position of a payment.
pub const PAYMENT_NUMBER: &str = "payment_number";
/// Column holding the transaction type code.
pub const TRANSACTION_CODE: &str = "transaction_code";
/// Identifier column; never part of the feature vector.
pub const ACCTREFNO: &str = "acctrefno";

/// One row of the cleaned transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub acctrefno: i64,
    pub payment_number: i64,
    pub transaction_code: i64,
    pub date_due: NaiveDate,
    pub transaction_date: NaiveDate,
    pub transaction_description: Option<String>,
    /// Extra columns, aligned with `TransactionTable::attribute_names`.
    /// Empty strings mark missing values.
    pub attributes: Vec<String>,
}

impl TransactionRecord {
    /// Realized label: 1 when `date_due <= transaction_date`, else 0.
    pub fn paid(&self) -> u8 {
        u8::from(self.date_due <= self.transaction_date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    pub attribute_names: Vec<String>,
    pub records: Vec<TransactionRecord>,
}

impl TransactionTable {
    pub fn new(
        attribute_names: Vec<String>,
        records: Vec<TransactionRecord>,
    ) -> PredictorResult<Self> {
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.attributes.len() != attribute_names.len())
        {
            return Err(PredictorError::schema(format!(
                "row {} has {} attribute values, header declares {}",
                row,
                record.attributes.len(),
                attribute_names.len()
            )));
        }
        Ok(Self {
            attribute_names,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows belonging to one account, in table order.
    pub fn records_for(&self, acctrefno: i64) -> Vec<&TransactionRecord> {
        self.records
            .iter()
            .filter(|r| r.acctrefno == acctrefno)
            .collect()
    }

    /// Distinct account ids in order of first appearance.
    pub fn unique_accounts(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.acctrefno))
            .map(|r| r.acctrefno)
            .collect()
    }

    pub fn contains_account(&self, acctrefno: i64) -> bool {
        self.records.iter().any(|r| r.acctrefno == acctrefno)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attribute_names.iter().position(|n| n == name)
    }
}

/// Dummy-encoded feature table, row-aligned with an external label column.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    acctrefno: Vec<i64>,
    feature_names: Vec<String>,
    values: Array2<f64>,
    payment_number_idx: usize,
    transaction_code_idx: usize,
}

impl FeatureTable {
    pub fn new(
        acctrefno: Vec<i64>,
        feature_names: Vec<String>,
        values: Array2<f64>,
    ) -> PredictorResult<Self> {
        if acctrefno.len() != values.nrows() {
            return Err(PredictorError::schema(format!(
                "{} account ids for {} feature rows",
                acctrefno.len(),
                values.nrows()
            )));
        }
        if feature_names.len() != values.ncols() {
            return Err(PredictorError::schema(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                values.ncols()
            )));
        }
        let find = |name: &str| {
            feature_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| PredictorError::schema(format!("missing feature column '{}'", name)))
        };
        let payment_number_idx = find(PAYMENT_NUMBER)?;
        let transaction_code_idx = find(TRANSACTION_CODE)?;

        Ok(Self {
            acctrefno,
            feature_names,
            values,
            payment_number_idx,
            transaction_code_idx,
        })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn acctrefno(&self) -> &[i64] {
        &self.acctrefno
    }

    pub fn payment_number_index(&self) -> usize {
        self.payment_number_idx
    }

    pub fn transaction_code_index(&self) -> usize {
        self.transaction_code_idx
    }

    /// Row indices belonging to one account, in table order.
    pub fn rows_for(&self, acctrefno: i64) -> Vec<usize> {
        self.acctrefno
            .iter()
            .enumerate()
            .filter(|(_, &id)| id == acctrefno)
            .map(|(i, _)| i)
            .collect()
    }
}
