use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the calendar integration
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(subtrack::config),
        help("Check the environment, .env and config/subtrack.toml")
    )]
    Config(String),

    #[error("Load error: {0}")]
    #[diagnostic(code(subtrack::load))]
    Load(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(code(subtrack::authorization))]
    Authorization(String),

    #[error("Calendar submission error: {0}")]
    #[diagnostic(code(subtrack::submission))]
    Submission(String),

    #[error("Token storage error: {0}")]
    #[diagnostic(code(subtrack::storage))]
    Storage(String),

    #[error("Invalid renewal date '{0}'")]
    #[diagnostic(
        code(subtrack::invalid_date),
        help("Use an RFC 3339 timestamp or a YYYY-MM-DD date")
    )]
    InvalidDate(String),

    #[error("Add to calendar is already in progress")]
    #[diagnostic(code(subtrack::busy))]
    Busy,

    #[error(transparent)]
    #[diagnostic(code(subtrack::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(subtrack::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(subtrack::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create load errors
pub fn load_error(message: &str) -> Error {
    Error::Load(message.to_string())
}

/// Helper to create authorization errors
pub fn authorization_error(message: &str) -> Error {
    Error::Authorization(message.to_string())
}

/// Helper to create submission errors
pub fn submission_error(message: &str) -> Error {
    Error::Submission(message.to_string())
}

/// Helper to create storage errors
pub fn storage_error(message: &str) -> Error {
    Error::Storage(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
