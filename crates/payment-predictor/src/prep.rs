//! Cleaning and encoding of the raw transaction log.
//!
//! Produces the two tables the projector consumes: the cleaned log (raw
//! view source) and the dummy-encoded feature table with its `paid`
//! label column, row-aligned with each other.
use std::collections::BTreeSet;

use crate::config::PrepConfig;
use crate::data_handling::{FeatureTable, TransactionTable, PAYMENT_NUMBER, TRANSACTION_CODE};
use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;

const DESCRIPTION_FEATURE: &str = "transaction_description";

/// Keep payment rows only and drop sparse columns and incomplete rows.
pub fn clean(table: &TransactionTable, config: &PrepConfig) -> PredictorResult<TransactionTable> {
    let has_description = table
        .records
        .iter()
        .any(|r| r.transaction_description.is_some());

    let selected: Vec<_> = table
        .records
        .iter()
        .filter(|r| config.accepted_codes.contains(&r.transaction_code))
        .filter(|r| {
            !has_description
                || r.transaction_description
                    .as_ref()
                    .map_or(false, |d| config.accepted_descriptions.contains(d))
        })
        .cloned()
        .collect();
    log::debug!(
        "{} rows have been deleted in payment selection",
        table.len() - selected.len()
    );

    // drop attribute columns whose empty share reaches the threshold
    let keep_cols: Vec<usize> = (0..table.attribute_names.len())
        .filter(|&c| {
            if selected.is_empty() {
                return true;
            }
            let empty = selected
                .iter()
                .filter(|r| r.attributes[c].is_empty())
                .count();
            (empty as f64 / selected.len() as f64) < config.null_column_threshold
        })
        .collect();
    log::debug!(
        "{} columns have been deleted while dropping columns containing null values",
        table.attribute_names.len() - keep_cols.len()
    );

    let before = selected.len();
    let records: Vec<_> = selected
        .into_iter()
        .map(|mut r| {
            r.attributes = keep_cols.iter().map(|&c| r.attributes[c].clone()).collect();
            r
        })
        .filter(|r| r.attributes.iter().all(|v| !v.is_empty()))
        .collect();
    log::debug!(
        "{} rows have been deleted while dropping rows containing null values",
        before - records.len()
    );

    TransactionTable::new(
        keep_cols
            .iter()
            .map(|&c| table.attribute_names[c].clone())
            .collect(),
        records,
    )
}

/// `paid` label per row: 1 when `date_due <= transaction_date`.
pub fn paid_labels(table: &TransactionTable) -> Vec<u8> {
    table.records.iter().map(|r| r.paid()).collect()
}

enum Encoding {
    Numeric,
    OneHot(Vec<String>),
}

fn column_encoding<'a>(values: impl Iterator<Item = &'a str> + Clone) -> Encoding {
    if values.clone().all(|v| v.parse::<f64>().is_ok()) {
        Encoding::Numeric
    } else {
        let levels: BTreeSet<&str> = values.collect();
        Encoding::OneHot(levels.into_iter().map(str::to_string).collect())
    }
}

/// Build the dummy-encoded feature table and its label column.
///
/// Features are `payment_number`, `transaction_code`, then every attribute:
/// numeric attributes as-is, others one-hot encoded as `<column>_<value>`
/// with levels in sorted order. Dates and the label are not features.
pub fn encode_features(table: &TransactionTable) -> PredictorResult<(FeatureTable, Vec<u8>)> {
    let mut names = vec![PAYMENT_NUMBER.to_string(), TRANSACTION_CODE.to_string()];
    let mut columns: Vec<Vec<f64>> = vec![
        table.records.iter().map(|r| r.payment_number as f64).collect(),
        table.records.iter().map(|r| r.transaction_code as f64).collect(),
    ];

    let mut categorical: Vec<(String, Vec<&str>)> = table
        .attribute_names
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let values = table.records.iter().map(|r| r.attributes[c].as_str()).collect();
            (name.clone(), values)
        })
        .collect();
    if table.records.iter().any(|r| r.transaction_description.is_some()) {
        let values = table
            .records
            .iter()
            .map(|r| r.transaction_description.as_deref().unwrap_or(""))
            .collect();
        categorical.push((DESCRIPTION_FEATURE.to_string(), values));
    }

    for (name, values) in &categorical {
        match column_encoding(values.iter().copied()) {
            Encoding::Numeric => {
                names.push(name.clone());
                columns.push(values.iter().map(|v| v.parse::<f64>().unwrap_or(0.0)).collect());
            }
            Encoding::OneHot(levels) => {
                for level in levels {
                    names.push(format!("{}_{}", name, level));
                    columns.push(
                        values
                            .iter()
                            .map(|v| if *v == level { 1.0 } else { 0.0 })
                            .collect(),
                    );
                }
            }
        }
    }

    let nrows = table.len();
    let rows: Vec<Vec<f64>> = (0..nrows)
        .map(|r| columns.iter().map(|col| col[r]).collect())
        .collect();
    let values = Array2::from_rows(rows, names.len())
        .map_err(|e| PredictorError::schema(e.to_string()))?;

    log::debug!(
        "Data labeling and dummy encoding resulted in {} feature columns",
        names.len()
    );

    let acctrefno = table.records.iter().map(|r| r.acctrefno).collect();
    let features = FeatureTable::new(acctrefno, names, values)?;
    Ok((features, paid_labels(table)))
}
