//! Feature scaling shared by training and inference.
//!
//! A `MinMaxScaler` learns per-column bounds at training time and maps
//! every feature into [0, 1]. The same fitted scaler has to be reused at
//! prediction time; column names and order are checked on every call.

use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};
use crate::math::Array2;

/// A fitted, column-preserving numeric transform.
pub trait FeatureScaler: Send + Sync {
    /// Columns (and their order) the scaler was fitted on.
    fn feature_names(&self) -> &[String];

    /// Transform rows whose columns are `feature_names`. Fails with
    /// `SchemaMismatch` when the column set differs from the fitted one.
    fn transform(&self, feature_names: &[String], x: &Array2<f64>) -> PredictorResult<Array2<f64>>;
}

/// Reject a column set that differs from `expected` in names or order.
pub fn check_columns(expected: &[String], actual: &[String], who: &str) -> PredictorResult<()> {
    if expected == actual {
        return Ok(());
    }
    let first_diff = expected
        .iter()
        .zip(actual.iter())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| expected.len().min(actual.len()));
    Err(PredictorError::schema(format!(
        "{} expects {} columns, got {} (first difference at position {}: expected {:?}, got {:?})",
        who,
        expected.len(),
        actual.len(),
        first_diff,
        expected.get(first_diff),
        actual.get(first_diff),
    )))
}

/// Per-column min/max normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub feature_names: Vec<String>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit column bounds from a non-empty matrix.
    pub fn fit(feature_names: &[String], x: &Array2<f64>) -> PredictorResult<Self> {
        let (nrows, ncols) = x.shape();
        if nrows == 0 || ncols == 0 {
            return Err(PredictorError::Model(
                "cannot fit a scaler on an empty feature table".to_string(),
            ));
        }
        if feature_names.len() != ncols {
            return Err(PredictorError::schema(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                ncols
            )));
        }

        let mut min = vec![f64::INFINITY; ncols];
        let mut max = vec![f64::NEG_INFINITY; ncols];
        for row in x.rows() {
            for (c, &v) in row.iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }

        Ok(Self {
            feature_names: feature_names.to_vec(),
            min,
            max,
        })
    }

    /// Constant columns keep a unit range so they map to 0.
    fn range(&self, col: usize) -> f64 {
        let r = self.max[col] - self.min[col];
        if r == 0.0 {
            1.0
        } else {
            r
        }
    }
}

impl FeatureScaler for MinMaxScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, feature_names: &[String], x: &Array2<f64>) -> PredictorResult<Array2<f64>> {
        check_columns(&self.feature_names, feature_names, "scaler")?;
        if x.ncols() != self.min.len() {
            return Err(PredictorError::schema(format!(
                "scaler fitted on {} columns, matrix has {}",
                self.min.len(),
                x.ncols()
            )));
        }

        let mut out = x.clone();
        for r in 0..out.nrows() {
            for (c, v) in out.row_slice_mut(r).iter_mut().enumerate() {
                *v = (*v - self.min[c]) / self.range(c);
            }
        }
        Ok(out)
    }
}

/// Fit a scaler and return the transformed matrix in one call.
pub fn fit_transform(
    feature_names: &[String],
    x: &Array2<f64>,
) -> PredictorResult<(MinMaxScaler, Array2<f64>)> {
    let scaler = MinMaxScaler::fit(feature_names, x)?;
    let scaled = scaler.transform(feature_names, x)?;
    Ok((scaler, scaled))
}
