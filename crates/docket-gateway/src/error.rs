//! Error types for extraction calls

use thiserror::Error;

/// Errors that can occur while calling the extraction service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The service asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The service is busy or failed transiently (5xx)
    #[error("Service overloaded (HTTP {status}): {message}")]
    Overloaded {
        /// HTTP status
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// No response within the configured limit
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The response could not be interpreted
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// What was wrong
        message: String,
        /// Raw model text, kept for diagnosis
        raw: String,
    },

    /// The service refused the request
    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),
}

impl GatewayError {
    /// Whether another attempt may succeed
    ///
    /// Only rate-limit and transient server signals are retried; everything
    /// else, parse failures included, is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited(_) | GatewayError::Overloaded { .. }
        )
    }

    /// Raw response text attached to the error, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            GatewayError::InvalidResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => GatewayError::RateLimited(message),
            500..=599 => GatewayError::Overloaded { status, message },
            _ => GatewayError::Rejected { status, message },
        }
    }
}
