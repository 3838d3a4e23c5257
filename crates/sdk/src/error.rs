use std::sync::Arc;

use billing_types::{ApiErrorBody, LimitError};
use thiserror::Error;

/// Errors that can occur in the billing SDK
#[derive(Error, Debug)]
pub enum BillingError {
    /// No client was configured (using the SDK outside a configured provider)
    #[error(
        "billing client used without a configured BillingProvider. \
         Build one with BillingProvider::new(BillingConfig::new(\"sk_...\"))"
    )]
    MissingClient,

    /// Request rejected before reaching the network
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-2xx response from the API
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<ApiErrorBody>,
    },

    /// HTTP error from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request timed out
    #[error("Timeout")]
    Timeout,

    /// Any other failure, carried as its display text
    #[error("{0}")]
    Other(String),
}

impl BillingError {
    /// HTTP status of an API rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            BillingError::Api { status, .. } => Some(*status),
            BillingError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn from_response_body(status: u16, text: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(text) {
            Ok(body) => BillingError::Api {
                status,
                message: body.error.message.clone(),
                body: Some(body),
            },
            Err(_) => BillingError::Api {
                status,
                message: if text.is_empty() {
                    "empty response body".to_string()
                } else {
                    text.to_string()
                },
                body: None,
            },
        }
    }
}

impl From<LimitError> for BillingError {
    fn from(e: LimitError) -> Self {
        BillingError::InvalidRequest(e.to_string())
    }
}

impl From<url::ParseError> for BillingError {
    fn from(e: url::ParseError) -> Self {
        BillingError::InvalidRequest(format!("invalid base URL: {}", e))
    }
}

impl From<String> for BillingError {
    fn from(message: String) -> Self {
        BillingError::Other(message)
    }
}

/// Result type alias for billing operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Error as stored in observable state, cheap to clone into every snapshot
pub type SharedError = Arc<BillingError>;
