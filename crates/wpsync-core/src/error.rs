use std::io;

use reqwest::StatusCode;
use thiserror::Error;

use crate::remote::{Capability, Transport};

/// Custom result type for wpsync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Custom error type for wpsync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{capability} is not supported by the {transport} transport")]
    Unsupported {
        capability: Capability,
        transport: Transport,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        SyncError::Network(msg.into())
    }

    /// Create a new HTTP status error
    pub fn http<S: Into<String>>(status: StatusCode, msg: S) -> Self {
        SyncError::Http {
            status: status.as_u16(),
            message: msg.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        SyncError::Auth(msg.into())
    }

    /// Create a new XML-RPC fault error
    pub fn fault<S: Into<String>>(code: i64, msg: S) -> Self {
        SyncError::Fault {
            code,
            message: msg.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        SyncError::Parse(msg.into())
    }

    /// Create a new unsupported-capability error
    pub fn unsupported(capability: Capability, transport: Transport) -> Self {
        SyncError::Unsupported {
            capability,
            transport,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SyncError::Config(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SyncError::Serialization(msg.into())
    }

    /// Whether the error is a transient failure worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, SyncError::Unsupported { .. })
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<io::Error> for SyncError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::http(status, err.to_string()),
            None if err.is_decode() => Self::Parse(err.to_string()),
            None => Self::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::network("connection reset").is_retryable());
        assert!(SyncError::http(StatusCode::BAD_GATEWAY, "bad gateway").is_retryable());
        assert!(SyncError::http(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(!SyncError::http(StatusCode::NOT_FOUND, "unknown_blog").is_retryable());
        assert!(!SyncError::auth("invalid token").is_retryable());
        assert!(!SyncError::fault(403, "Incorrect username or password.").is_retryable());
    }

    #[test]
    fn test_unsupported_display() {
        let err = SyncError::unsupported(Capability::PostFormats, Transport::Rest);
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "post formats is not supported by the REST transport");
    }

    #[test]
    fn test_io_conversion() {
        let err: SyncError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, SyncError::Io(_)));
    }
}
