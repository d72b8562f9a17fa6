use serde_json::Value;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
///
/// Every failure path of the client ends up here, so callers can branch on the
/// kind of failure instead of inspecting message text.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response arrived within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// The request never produced a response (DNS, connect, reset, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<Value>,
    },

    /// Session could not be re-established (missing or rejected refresh token)
    #[error("{0}")]
    Auth(String),

    /// Input rejected before reaching the network
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Token storage backend failed
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Build an HTTP error from a status code and the raw response body.
    ///
    /// Any JSON body counts as a server answer: its `message`, `code` and
    /// `details` are used when it is an object carrying them, otherwise the
    /// message is `HTTP <status>`. A body that is not JSON at all gives
    /// `HTTP <status>: <reason>`.
    pub fn from_status(status: u16, reason: &str, body: &[u8]) -> Self {
        let Ok(parsed) = serde_json::from_slice::<Value>(body) else {
            return ApiError::Http {
                status,
                message: format!("HTTP {}: {}", status, reason),
                code: None,
                details: None,
            };
        };

        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        ApiError::Http {
            status,
            message,
            code: parsed.get("code").cloned().and_then(code_to_string),
            details: parsed.get("details").filter(|d| !d.is_null()).cloned(),
        }
    }

    /// Create a validation error for the given field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied error code, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is worth retrying: server errors and network failures
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => *status >= 500,
            ApiError::Network(_) => true,
            _ => false,
        }
    }

    /// Check if this error is a request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }

    /// Check if the caller has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Auth(_)) || self.status() == Some(401)
    }
}

fn code_to_string(code: Value) -> Option<String> {
    match code {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
