//! Error types for the flight computer.

use thiserror::Error;

/// Fatal errors. These only ever happen before the control loop starts; once
/// the loop is running nothing is allowed to stop it.
#[derive(Debug, Error)]
pub enum FlightError {
    /// A required sensor could not be brought up.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// A threshold is missing or outside its valid range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a single inertial read. Always transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// No fresh sample is buffered this tick.
    #[error("sensor not ready")]
    NotReady,

    #[error("bus error: {0}")]
    Bus(String),
}

pub type Result<T> = std::result::Result<T, FlightError>;
