use thiserror::Error;

/// Every failure the analysis stages can report.
///
/// Errors are raised by the call that detects them; no stage returns a
/// partial result alongside an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Column '{column}' has zero variance (std = {std:e}); drop it before standardizing.")]
    DegenerateColumn { column: String, std: f64 },

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected} columns, found {found}.")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Non-finite value at row {row}, column {column}; missing values must be dropped upstream.")]
    NonFiniteValue { row: usize, column: usize },

    #[error("The column '{0}' was not found in the feature table.")]
    UnknownColumn(String),

    #[error("{0} has not been fitted yet.")]
    NotFitted(&'static str),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
