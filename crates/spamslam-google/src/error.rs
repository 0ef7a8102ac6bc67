//! Error types for Google and AI proxy calls.

use spamslam_core::GatewayError;

/// Result type alias for gateway HTTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP gateway error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success status from the remote API.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Response parsed but lacked required fields.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// True when the remote API rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl From<Error> for GatewayError {
    fn from(e: Error) -> Self {
        let message = e.to_string();
        match e {
            Error::Status { .. } if e.is_unauthorized() => Self::Unauthorized(message),
            Error::Status { .. } => Self::Rejected(message),
            Error::Http(_) => Self::Transport(message),
            Error::Json(_) | Error::InvalidResponse(_) => Self::Malformed(message),
            Error::Url(_) => Self::Rejected(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unauthorized = Error::Status {
            status: 401,
            body: "Invalid Credentials".into(),
        };
        assert!(matches!(
            GatewayError::from(unauthorized),
            GatewayError::Unauthorized(msg) if msg.contains("Invalid Credentials")
        ));

        let throttled = Error::Status {
            status: 429,
            body: "Rate limit".into(),
        };
        assert!(matches!(GatewayError::from(throttled), GatewayError::Rejected(_)));
    }

    #[test]
    fn test_invalid_response_is_malformed() {
        let e = Error::InvalidResponse("missing id".into());
        assert!(matches!(GatewayError::from(e), GatewayError::Malformed(_)));
    }
}
