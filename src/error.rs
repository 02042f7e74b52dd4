use thiserror::Error;

/// Main error type for graphrag-eval
#[derive(Error, Debug)]
pub enum EvalError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ground-truth entry without an `id` field
    #[error("Ground truth entry {index} has no id")]
    MissingGroundTruthId { index: usize },

    /// Failure raised inside a (usually custom) metric
    #[error("Metric error: {0}")]
    Metric(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using EvalError
pub type Result<T> = std::result::Result<T, EvalError>;
