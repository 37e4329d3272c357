//! Error types for the geochem-coda library.

use thiserror::Error;

/// Main error type for the library.
///
/// Numeric degeneration (zero parts, negative parts, NaN) is never reported
/// here; it flows through the transforms as NaN or infinity.
#[derive(Error, Debug)]
pub enum CodaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid numeric value '{value}' at row {row}, column {col}")]
    Parse {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("ILR basis is not orthonormal (max deviation from identity {max_deviation:e})")]
    BasisInvariant { max_deviation: f64 },

    #[error("Box-Cox lambda search is ambiguous: {} grid points tie for the maximum ({candidates:?})", candidates.len())]
    AmbiguousLambda { candidates: Vec<f64> },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, CodaError>;
