//! Error types for Pulseplan

use thiserror::Error;

/// Errors that can occur during computation
///
/// Absence of data is not an error: statistics report it through `Option`
/// or [`crate::types::WindowStats::has_data`].
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate date in series: {0}")]
    DuplicateDate(String),

    #[error("Activity factor {0} is not one of 1.2, 1.375, 1.55, 1.725, 1.9")]
    InvalidActivityFactor(f64),

    #[error("Invalid biometric profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No data: {0}")]
    EmptyInput(String),
}
