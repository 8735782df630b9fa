//! Error types for REST API operations

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the response body, or the raw body
        message: String,
    },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RestError {
    /// True for transient failures worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = RestError::Status {
            status: 429,
            message: "too many requests".into(),
        };
        assert!(rate_limited.is_retryable());

        let server = RestError::Status {
            status: 502,
            message: "bad gateway".into(),
        };
        assert!(server.is_retryable());

        let forbidden = RestError::Status {
            status: 403,
            message: "forbidden".into(),
        };
        assert!(!forbidden.is_retryable());
        assert!(!RestError::Parse("bad json".into()).is_retryable());
    }
}
