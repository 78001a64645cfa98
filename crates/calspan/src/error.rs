//! Error types for calspan operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpanError {
    #[error("Empty or invalid duration: '{0}'")]
    EmptyOrInvalid(String),

    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Malformed number: '{0}'")]
    MalformedNumber(String),

    #[error("Invalid magnitude: {0}")]
    InvalidMagnitude(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, SpanError>;
