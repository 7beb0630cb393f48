//! Small dense matrix type used for feature rows.
//!
//! Rows are samples (transactions) and columns are features. The type is
//! dependency-free so scalers and classifiers can share one layout.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
