//! Error types
//!
//! Every failure surfaced by the crate is one of the [`Error`] variants, so
//! callers can tell a dead link from a confused device from a bad argument.

use std::time::Duration;
use thiserror::Error;

use crate::protocol::SessionState;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for all heat pump operations
#[derive(Error, Debug)]
pub enum Error {
    /// Link unavailable, unsupported baud rate, or the link failed mid-write
    #[error("Connection error: {0}")]
    Connection(String),

    /// The device answered with something we cannot accept
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No complete response line arrived in time
    #[error("Timeout: no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Rejected locally before any I/O took place
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Name not present in the parameter registry
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Reading a parameter table file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation called from a session state that does not allow it
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

/// Errors caused by device responses that do not match what was asked for
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Malformed response {response:?}")]
    MalformedResponse { response: String },

    #[error("Response {response:?} does not echo command {expected:?}")]
    CommandMismatch { expected: String, response: String },

    #[error("Field '{field}' missing from response {response:?}")]
    MissingField { field: String, response: String },

    #[error("Device reports name '{actual}', expected '{expected}'")]
    NameMismatch { expected: String, actual: String },

    #[error("Parameter '{name}': device {bound} is {actual}, registry says {expected}")]
    BoundMismatch {
        name: String,
        bound: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Device returned invalid value {token:?} for field '{field}'")]
    InvalidValue { field: String, token: String },

    #[error("Malformed fault record {0:?}")]
    MalformedFaultRecord(String),

    #[error("Command {command:?} not acknowledged, got {response:?}")]
    NotAcknowledged { command: String, response: String },

    #[error("Response line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// Errors raised before anything touches the wire
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid {data_type} token {token:?}")]
    InvalidToken { data_type: String, token: String },

    #[error("Unknown data type '{0}'")]
    UnknownDataType(String),

    #[error("Value {value} for '{name}' outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid access control code '{0}'")]
    InvalidAcl(String),

    #[error("Parameter '{name}': min {min} is greater than max {max}")]
    InvalidBounds {
        name: String,
        min: String,
        max: String,
    },

    #[error("Parameter '{name}' expects {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Parameter '{name}' is {acl}, cannot {operation}")]
    AccessDenied {
        name: String,
        acl: String,
        operation: &'static str,
    },

    #[error("Parameter table line {line}: {message}")]
    MalformedRow { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
