// src/errors.rs

use thiserror::Error;

/// Errors raised by the auth, store and webhook clients and by configuration.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The auth provider rejected the credentials. The message is the provider's own text.
    #[error("{0}")]
    Auth(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn auth_error(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn decode_error(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Short label used when logging failures, so transport, timeout and
    /// server errors stay distinguishable even though the UI collapses them.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_displays_provider_text_verbatim() {
        let err = AgentError::auth_error("Invalid login credentials");
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.kind(), "auth");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: AgentError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "decode");
        assert!(!err.is_timeout());
    }
}
