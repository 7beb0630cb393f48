//! Dummy-encoded feature table and target column reader/writer.
use std::path::Path;

use crate::data_handling::{FeatureTable, ACCTREFNO};
use crate::error::{PredictorError, PredictorResult};
use crate::io::{field, parse_f64, parse_i64, require_column};
use crate::math::Array2;

/// Name of the target column in the label file.
pub const TARGET_COLUMN: &str = "paid";

/// Read a feature CSV: an `acctrefno` column plus one numeric column per
/// feature. Unnamed columns (a leading index) are skipped.
pub fn read_features<P: AsRef<Path>>(path: P) -> PredictorResult<FeatureTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)?;
    let headers = reader.headers()?.clone();

    let acct_idx = require_column(&headers, ACCTREFNO)?;
    let feature_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != acct_idx && !h.trim().is_empty())
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut acctrefno = Vec::new();
    let mut values = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let row = row + 1;
        acctrefno.push(parse_i64(field(&record, acct_idx, row, ACCTREFNO)?, row, ACCTREFNO)?);
        for (idx, name) in &feature_cols {
            values.push(parse_f64(field(&record, *idx, row, name)?, row, name)?);
        }
    }

    let nrows = acctrefno.len();
    let values = Array2::from_shape_vec((nrows, feature_cols.len()), values)
        .map_err(|e| PredictorError::schema(e.to_string()))?;
    FeatureTable::new(
        acctrefno,
        feature_cols.into_iter().map(|(_, n)| n).collect(),
        values,
    )
}

pub fn write_features<P: AsRef<Path>>(table: &FeatureTable, path: P) -> PredictorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![ACCTREFNO.to_string()];
    header.extend(table.feature_names().iter().cloned());
    writer.write_record(&header)?;

    for (r, acct) in table.acctrefno().iter().enumerate() {
        let mut row = vec![acct.to_string()];
        row.extend(table.values().row_slice(r).iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the binary label column. Uses the `paid` column when present,
/// otherwise the last column of the file.
pub fn read_target<P: AsRef<Path>>(path: P) -> PredictorResult<Vec<u8>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)?;
    let headers = reader.headers()?.clone();
    let idx = match require_column(&headers, TARGET_COLUMN) {
        Ok(idx) => idx,
        Err(_) if !headers.is_empty() => headers.len() - 1,
        Err(e) => return Err(e),
    };

    let mut labels = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let row = row + 1;
        let raw = field(&record, idx, row, TARGET_COLUMN)?;
        match parse_f64(raw, row, TARGET_COLUMN)? {
            v if v == 0.0 => labels.push(0),
            v if v == 1.0 => labels.push(1),
            _ => {
                return Err(PredictorError::Parse {
                    row,
                    column: TARGET_COLUMN.to_string(),
                    value: raw.to_string(),
                })
            }
        }
    }
    Ok(labels)
}

pub fn write_target<P: AsRef<Path>>(labels: &[u8], path: P) -> PredictorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([TARGET_COLUMN])?;
    for label in labels {
        writer.write_record([label.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
