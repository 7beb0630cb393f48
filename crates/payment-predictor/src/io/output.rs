//! Result and error tables of a batch run.
//!
//! Both tables are keyed by `acctrefno` and written independently, so a
//! run that only partly succeeded still produces both files.
use std::path::Path;

use crate::batch::{CustomerError, CustomerResult};
use crate::error::PredictorResult;

/// Render a list the way the results table stores it: `[a b c]`.
fn bracketed<T: ToString>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(" "))
}

pub fn write_results<P: AsRef<Path>>(results: &[CustomerResult], path: P) -> PredictorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "acctrefno",
        "Accuracy",
        "Certainty",
        "Prediction",
        "Payment Probability",
        "Payment Codes",
    ])?;
    for r in results {
        writer.write_record([
            r.acctrefno.to_string(),
            r.accuracy.to_string(),
            r.certainty.to_string(),
            bracketed(&r.payment_prediction),
            bracketed(&r.next_payment_probability),
            bracketed(&r.payment_codes),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_errors<P: AsRef<Path>>(errors: &[CustomerError], path: P) -> PredictorResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["acctrefno", "Kind", "Error"])?;
    for e in errors {
        writer.write_record([e.acctrefno.to_string(), e.kind.clone(), e.message.clone()])?;
    }
    writer.flush()?;
    Ok(())
}
