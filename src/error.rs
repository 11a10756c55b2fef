//! Gate error types.
//!
//! A `GateError` never reaches the caller of `evaluate`: the gate maps it to
//! `Deny(InternalError)` at its boundary. Construction and reconfiguration do
//! return it.

use thiserror::Error;

use crate::config::validation::{join_errors, ValidationError};

/// Errors raised while building or running the gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// The request named a limiter class that is not configured.
    #[error("unknown limiter class '{0}'")]
    UnknownLimiterClass(String),

    /// The raw request body could not be decoded as UTF-8 text.
    #[error("request body is not valid UTF-8: {0}")]
    InvalidBody(#[from] std::str::Utf8Error),

    /// The window end of a limiter class is not representable from `now`.
    #[error("window of limiter class '{0}' overflows the clock")]
    WindowOverflow(String),

    /// Configuration failed semantic validation.
    #[error("invalid gate configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
