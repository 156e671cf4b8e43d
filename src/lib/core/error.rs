//! Error types for the dartrs library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Threshold validation error: {field} must be between {min} and {max}, got {value}")]
    ThresholdValidation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Population {population} went extinct in generation {generation}: {reason}")]
    Extinction {
        generation: usize,
        population: usize,
        reason: String,
    },

    #[error("Numerical error: {0}")]
    Numerical(String),
}

pub type Result<T> = std::result::Result<T, DartError>;

impl DartError {
    /// Shorthand for operations that only make sense on diploid SNP calls.
    pub fn snp_only(operation: &str) -> Self {
        DartError::UnsupportedDataType(format!(
            "{} requires SNP genotypes, got silicodart presence/absence data",
            operation
        ))
    }
}
