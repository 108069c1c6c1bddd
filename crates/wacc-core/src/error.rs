use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaccError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Undefined weights: firm value is zero (enter equity and/or debt capital)")]
    UndefinedWeights,

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for WaccError {
    fn from(e: serde_json::Error) -> Self {
        WaccError::SerializationError(e.to_string())
    }
}
