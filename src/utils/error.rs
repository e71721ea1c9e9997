//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Result type used throughout the acquisition object model
pub type SrResult<T> = Result<T, SrError>;

/// Errors caused by the command line itself
#[derive(Error, Debug)]
pub enum CliError {
    #[error("No operation requested")]
    NothingToDo,

    #[error("Invalid key=value pair: '{0}'")]
    InvalidPair(String),

    #[error("Log level must be between 0 and 5, got {0}")]
    InvalidLogLevel(i32),

    #[error("File not in any recognised input format.")]
    UnrecognisedInputFormat,

    #[error("Unknown input format: {0}")]
    UnknownInputFormat(String),
}

/// Errors raised by the acquisition library object model
#[derive(Error, Debug)]
pub enum SrError {
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    #[error("Unknown output format: {0}")]
    UnknownOutputFormat(String),

    #[error("Unknown configuration key: {0}")]
    UnknownConfigKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration key {0} is not supported by this device")]
    ConfigNotSupported(String),

    #[error("No devices found for driver {0}")]
    NoDevicesFound(String),

    #[error("Device is not open")]
    DeviceNotOpen,

    #[error("No such channel: {0}")]
    UnknownChannel(String),

    #[error("Session is not running")]
    SessionNotRunning,

    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}
