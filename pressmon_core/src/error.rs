use thiserror::Error;

/// Failure talking to a backend during one attempt. Never escapes a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("timeout waiting for backend")]
    Timeout,
    #[error("backend io error: {0}")]
    Io(String),
    #[error("backend not connected")]
    NotConnected,
    #[error("no text detected in frame")]
    NoDetections,
}

/// A raw token that does not carry a valid reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed line: {0:?}")]
    MalformedLine(String),
    #[error("not numeric: {0:?}")]
    NotNumeric(String),
}

/// A batch that could not be reduced to one reading per channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationFailure {
    #[error("no valid attempts in batch")]
    NoData,
    #[error("results length mismatch: expected {expected} channels, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Errors surfaced to the operator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    #[error("calibration failed: {0}")]
    Calibration(AggregationFailure),
    #[error("session aborted: no valid reading was recorded")]
    SessionAbort,
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
