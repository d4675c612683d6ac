// src/utils/error.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub type AlertResult<T> = Result<T, SentinelError>;

/// Custom error details for additional context
pub type ErrorDetails = HashMap<String, serde_json::Value>;

/// Main error type for the alerting engine and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelError {
    pub message: String,
    pub details: Option<Box<ErrorDetails>>, // Boxed to keep the error small
    pub status: Option<u16>,
    pub error_code: Option<String>,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[default]
    UnknownError,
    NetworkError,
    ValidationError,
    ConfigurationError,
    SerializationError,
    DeserializationError,
    TimeoutError,
    NotFoundError,
    ExternalServiceError,
    StorageError,
    Internal,
}

impl fmt::Display for SentinelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SentinelError {}

impl SentinelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            status: None,
            error_code: None,
            kind,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(Box::new(details));
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn network_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::NetworkError, message)
            .with_status(503)
            .with_code("NETWORK_ERROR")
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
            .with_status(400)
            .with_code("VALIDATION_ERROR")
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationError, message)
            .with_status(500)
            .with_code("CONFIG_ERROR")
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeserializationError, message)
            .with_status(400)
            .with_code("PARSE_ERROR")
    }

    pub fn serialization_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::SerializationError, message)
            .with_status(400)
            .with_code("SERIALIZATION_ERROR")
    }

    pub fn telegram_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalServiceError, message)
            .with_status(502)
            .with_code("TELEGRAM_ERROR")
    }

    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimeoutError, message)
            .with_status(408)
            .with_code("TIMEOUT_ERROR")
    }

    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageError, message)
            .with_status(500)
            .with_code("STORAGE_ERROR")
    }

    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFoundError, message)
            .with_status(503)
            .with_code("DATA_UNAVAILABLE")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFoundError, message)
            .with_status(404)
            .with_code("NOT_FOUND")
    }

    pub fn internal_error<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Internal, message)
            .with_status(500)
            .with_code("INTERNAL_ERROR")
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NetworkError | ErrorKind::TimeoutError | ErrorKind::ExternalServiceError
        )
    }
}

/// Failures raised while talking to the chat transport's HTTP API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Telegram rejected message: {0}")]
    Rejected(String),
    #[error("Failed to parse Telegram response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<TransportError> for SentinelError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Http(e) if e.is_timeout() => {
                SentinelError::timeout_error(format!("Telegram request timed out: {}", e))
            }
            TransportError::Http(e) => {
                SentinelError::network_error(format!("HTTP request failed: {}", e))
            }
            TransportError::Api { status, body } => {
                let mut details = ErrorDetails::new();
                details.insert("http_status".to_string(), serde_json::json!(status));
                SentinelError::telegram_error(format!("Telegram API error {}: {}", status, body))
                    .with_details(details)
            }
            TransportError::Rejected(description) => {
                SentinelError::telegram_error(format!("Telegram rejected message: {}", description))
            }
            TransportError::Parse(e) => {
                SentinelError::parse_error(format!("Failed to parse Telegram response: {}", e))
            }
        }
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        SentinelError::parse_error(format!("JSON parsing error: {}", err))
    }
}

impl From<url::ParseError> for SentinelError {
    fn from(err: url::ParseError) -> Self {
        SentinelError::config_error(format!("URL parse error: {}", err))
    }
}

impl From<reqwest::Error> for SentinelError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err).into()
    }
}

// Helper macro for creating errors with context
#[macro_export]
macro_rules! sentinel_error {
    ($kind:expr, $msg:expr) => {
        $crate::utils::SentinelError::new($kind, $msg)
    };
    ($kind:expr, $msg:expr, $($key:expr => $value:expr),+) => {{
        let mut details = std::collections::HashMap::new();
        $(
            details.insert($key.to_string(), serde_json::json!($value));
        )+
        $crate::utils::SentinelError::new($kind, $msg).with_details(details)
    }};
}
