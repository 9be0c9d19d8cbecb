//! API Error Types
//!
//! Errors raised while talking to the prediction-market backend.

use thiserror::Error;

/// Errors that can occur when communicating with the backend
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a transport error the way every call site does
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Unavailable
        } else {
            ApiError::Request(err)
        }
    }

    /// True when the server never gave a verdict (network trouble or 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Unavailable | ApiError::Timeout | ApiError::Request(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Rejected(_) | ApiError::Decode(_) => false,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// A bare status carries whatever body the server sent (HTML error
    /// pages, proxy JSON), so only the code is shown.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected(msg) => msg.clone(),
            ApiError::Status { status, .. } => format!("API error {}", status),
            other => other.to_string(),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Unavailable.is_transient());
        assert!(ApiError::Status {
            status: 503,
            message: String::new()
        }
        .is_transient());

        assert!(!ApiError::Status {
            status: 401,
            message: "Unauthorized".to_string()
        }
        .is_transient());
        assert!(!ApiError::Rejected("Invalid token".to_string()).is_transient());
        assert!(!ApiError::Decode("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_user_message() {
        let err = ApiError::Rejected("Invalid credentials".to_string());
        assert_eq!(err.user_message(), "Invalid credentials");

        let err = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "API error 500");
        assert_eq!(ApiError::Timeout.user_message(), "Request timeout");
    }

    #[test]
    fn test_user_message_hides_raw_body() {
        let err = ApiError::Status {
            status: 404,
            message: "<html><body>Cannot POST /api/auth/login</body></html>".to_string(),
        };
        assert_eq!(err.user_message(), "API error 404");
        // Logs still see the body
        assert!(err.to_string().contains("Cannot POST"));
    }
}
