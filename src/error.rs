use thiserror::Error;

/// Typed errors for the two-factor login flow.
///
/// Validation and submit-time errors are returned synchronously to the caller;
/// terminal outcomes during polling are pushed through the session-state
/// stream instead. Transient network failures while polling are logged and
/// retried, never surfaced.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username must not be empty")]
    InvalidUsername,
    #[error("Telegram user not found")]
    UserNotFound,
    #[error("Rate limited")]
    RateLimited { retry_after_ms: Option<u64> },
    #[error("A login request is already awaiting approval")]
    LoginInProgress,
    #[error("Login request denied")]
    RequestDenied,
    #[error("Login request expired")]
    RequestExpired,
    #[error("Login cancelled")]
    Cancelled,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
