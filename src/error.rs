use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Replay key {0} used twice in the same run")]
    #[diagnostic(
        code(calendar_to_sheet::duplicate_replay_key),
        help("Every recorded operation needs its own key within a run")
    )]
    DuplicateReplayKey(String),

    #[error("Replay key {0} is missing from the recorded run")]
    #[diagnostic(code(calendar_to_sheet::missing_replay_key))]
    MissingReplayKey(String),

    #[error("Fetch error: {0}")]
    #[diagnostic(code(calendar_to_sheet::fetch))]
    Fetch(String),

    #[error("Append error: {0}")]
    #[diagnostic(code(calendar_to_sheet::append))]
    Append(String),

    #[error("Malformed timestamp '{value}': {reason}")]
    #[diagnostic(code(calendar_to_sheet::malformed_timestamp))]
    MalformedTimestamp { value: String, reason: String },

    #[error("Authentication error: {0}")]
    #[diagnostic(code(calendar_to_sheet::auth))]
    Auth(String),

    #[error("Messaging error: {0}")]
    #[diagnostic(code(calendar_to_sheet::messaging))]
    Messaging(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_to_sheet::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_to_sheet::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_to_sheet::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_to_sheet::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_to_sheet::other))]
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
pub type BotResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create append errors
pub fn append_error(message: &str) -> Error {
    Error::Append(message.to_string())
}

pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

pub fn messaging_error(message: &str) -> Error {
    Error::Messaging(message.to_string())
}

/// Helper to create timestamp errors
pub fn timestamp_error(value: &str, reason: impl ToString) -> Error {
    Error::MalformedTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
