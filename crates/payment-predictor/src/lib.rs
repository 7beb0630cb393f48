//! Next-payment prediction for loan customers.
//!
//! The pipeline cleans a transaction log ([`prep`]), fits a scaler and a
//! classifier on the encoded features ([`training`]), then projects each
//! customer's next payment from their history ([`customer`]). The
//! [`batch`] runner scores many customers, isolating per-customer errors.

pub mod batch;
pub mod config;
pub mod customer;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod prep;
pub mod preprocessing;
pub mod stats;
pub mod training;

pub use customer::{CustomerProjector, ScoringContext};
pub use error::{PredictorError, PredictorResult};
