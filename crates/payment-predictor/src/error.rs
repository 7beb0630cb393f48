use thiserror::Error;

/// Errors raised while preparing tables, training or projecting a customer.
///
/// Every variant is scoped to the operation that produced it. The batch
/// runner records them per customer and keeps going.
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("No data found with acctrefno {acctrefno}")]
    NotFound { acctrefno: i64 },

    #[error(
        "acctrefno {acctrefno} has {distinct_payment_numbers} distinct payment number(s); \
         at least 2 are needed to project the next payment"
    )]
    NotEnoughHistory {
        acctrefno: i64,
        distinct_payment_numbers: usize,
    },

    #[error(
        "acctrefno {acctrefno} has no positive payment number (largest is {number_of_payments}); \
         the payment step cannot be normalized"
    )]
    NonPositivePaymentNumbers {
        acctrefno: i64,
        number_of_payments: f64,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid value '{value}' for column '{column}' at row {row}")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl PredictorError {
    /// Short stable tag used as the category column of the error table.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::NotFound { .. } => "not_found",
            PredictorError::NotEnoughHistory { .. } => "not_enough_history",
            PredictorError::NonPositivePaymentNumbers { .. } => "non_positive_payment_numbers",
            PredictorError::SchemaMismatch(_) => "schema_mismatch",
            PredictorError::Parse { .. } => "parse",
            PredictorError::Model(_) => "model",
            PredictorError::Io(_) => "io",
            PredictorError::Csv(_) => "csv",
            PredictorError::Json(_) => "json",
            PredictorError::Unexpected(_) => "unexpected",
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        PredictorError::SchemaMismatch(msg.into())
    }
}

pub type PredictorResult<T> = Result<T, PredictorError>;
