use thiserror::Error;

/// Error types for the reconciliation engine.
///
/// A duplicate skip is deliberately *not* represented here: skipping a record
/// because it matched an existing one is a reported outcome, not a failure.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Structural validation failed: {0}")]
    StructuralValidation(String),

    #[error("Logical validation failed: {0}")]
    LogicalValidation(String),

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
