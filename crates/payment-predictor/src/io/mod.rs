//! CSV and JSON readers/writers for the tables the pipeline exchanges.
pub mod features;
pub mod output;
pub mod transactions;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PredictorError, PredictorResult};

pub use features::{read_features, read_target, write_features, write_target};
pub use output::{write_errors, write_results};
pub use transactions::{read_transactions, write_transactions};

/// Serialize any value (fitted scaler, configs) as pretty JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> PredictorResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> PredictorResult<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

pub(crate) fn require_column(headers: &StringRecord, name: &str) -> PredictorResult<usize> {
    find_column(headers, name)
        .ok_or_else(|| PredictorError::schema(format!("missing column '{}'", name)))
}

pub(crate) fn field<'r>(record: &'r StringRecord, idx: usize, row: usize, column: &str) -> PredictorResult<&'r str> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| PredictorError::Parse {
            row,
            column: column.to_string(),
            value: String::new(),
        })
}

/// Integers may have been written as floats (`204.0`) by other tools.
pub(crate) fn parse_i64(value: &str, row: usize, column: &str) -> PredictorResult<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
        _ => Err(PredictorError::Parse {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

pub(crate) fn parse_f64(value: &str, row: usize, column: &str) -> PredictorResult<f64> {
    match value {
        "True" | "true" => Ok(1.0),
        "False" | "false" => Ok(0.0),
        _ => value.parse::<f64>().map_err(|_| PredictorError::Parse {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}
