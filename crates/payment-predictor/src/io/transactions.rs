//! Transaction log reader/writer.
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::data_handling::{
    TransactionRecord, TransactionTable, ACCTREFNO, PAYMENT_NUMBER, TRANSACTION_CODE,
};
use crate::error::{PredictorError, PredictorResult};
use crate::io::{field, find_column, parse_i64, require_column};

pub const DATE_DUE: &str = "date_due";
pub const TRANSACTION_DATE: &str = "transaction_date";
pub const TRANSACTION_DESCRIPTION: &str = "transaction_description";

const KNOWN_COLUMNS: [&str; 6] = [
    ACCTREFNO,
    PAYMENT_NUMBER,
    TRANSACTION_CODE,
    DATE_DUE,
    TRANSACTION_DATE,
    TRANSACTION_DESCRIPTION,
];

fn parse_date(value: &str, row: usize, column: &str) -> PredictorResult<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").map_err(|_| PredictorError::Parse {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Read a transaction log CSV.
///
/// Required columns: `acctrefno`, `payment_number`, `transaction_code`,
/// `date_due`, `transaction_date`. An optional `transaction_description`
/// column is kept aside; every other named column becomes an attribute.
/// Unnamed columns (a leading index) are skipped.
pub fn read_transactions<P: AsRef<Path>>(path: P) -> PredictorResult<TransactionTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(&path)?;
    let headers = reader.headers()?.clone();

    let acct_idx = require_column(&headers, ACCTREFNO)?;
    let pn_idx = require_column(&headers, PAYMENT_NUMBER)?;
    let code_idx = require_column(&headers, TRANSACTION_CODE)?;
    let due_idx = require_column(&headers, DATE_DUE)?;
    let tx_date_idx = require_column(&headers, TRANSACTION_DATE)?;
    let desc_idx = find_column(&headers, TRANSACTION_DESCRIPTION);

    let attribute_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty() && !KNOWN_COLUMNS.contains(&h.trim()))
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let row = row + 1;

        let attributes = attribute_cols
            .iter()
            .map(|(i, _)| record.get(*i).unwrap_or_default().trim().to_string())
            .collect();

        records.push(TransactionRecord {
            acctrefno: parse_i64(field(&record, acct_idx, row, ACCTREFNO)?, row, ACCTREFNO)?,
            payment_number: parse_i64(
                field(&record, pn_idx, row, PAYMENT_NUMBER)?,
                row,
                PAYMENT_NUMBER,
            )?,
            transaction_code: parse_i64(
                field(&record, code_idx, row, TRANSACTION_CODE)?,
                row,
                TRANSACTION_CODE,
            )?,
            date_due: parse_date(field(&record, due_idx, row, DATE_DUE)?, row, DATE_DUE)?,
            transaction_date: parse_date(
                field(&record, tx_date_idx, row, TRANSACTION_DATE)?,
                row,
                TRANSACTION_DATE,
            )?,
            transaction_description: desc_idx
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            attributes,
        });
    }

    log::debug!(
        "Read {} transactions with {} attribute columns from {}",
        records.len(),
        attribute_cols.len(),
        path.as_ref().display()
    );
    TransactionTable::new(attribute_cols.into_iter().map(|(_, n)| n).collect(), records)
}

/// Write a transaction log in the layout `read_transactions` expects.
pub fn write_transactions<P: AsRef<Path>>(table: &TransactionTable, path: P) -> PredictorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let has_description = table
        .records
        .iter()
        .any(|r| r.transaction_description.is_some());

    let mut header: Vec<&str> = vec![
        ACCTREFNO,
        PAYMENT_NUMBER,
        TRANSACTION_CODE,
        DATE_DUE,
        TRANSACTION_DATE,
    ];
    if has_description {
        header.push(TRANSACTION_DESCRIPTION);
    }
    header.extend(table.attribute_names.iter().map(String::as_str));
    writer.write_record(&header)?;

    for r in &table.records {
        let mut row = vec![
            r.acctrefno.to_string(),
            r.payment_number.to_string(),
            r.transaction_code.to_string(),
            r.date_due.format("%Y-%m-%d").to_string(),
            r.transaction_date.format("%Y-%m-%d").to_string(),
        ];
        if has_description {
            row.push(r.transaction_description.clone().unwrap_or_default());
        }
        row.extend(r.attributes.iter().cloned());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
