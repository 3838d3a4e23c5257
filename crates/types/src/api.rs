use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

/// A page of results returned by every list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List<T> {
    /// Items on this page, newest first
    pub data: Vec<T>,

    /// Whether another page is available
    #[serde(default)]
    pub has_more: bool,

    /// Opaque cursor to pass as `cursor` to fetch the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
            next_cursor: None,
        }
    }
}

impl<T> List<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-request options for mutating calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Sent as the `Idempotency-Key` header so retried creations are deduplicated
    pub idempotency_key: Option<String>,
}

impl RequestOptions {
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Error category, e.g. `invalid_request_error` or `authentication_error`
    #[serde(rename = "type")]
    pub error_type: String,

    /// Machine-readable code, e.g. `checkout_not_found`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable message
    pub message: String,

    /// Request parameter the error relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error.code {
            Some(code) => write!(f, "{} ({}): {}", self.error.error_type, code, self.error.message),
            None => write!(f, "{}: {}", self.error.error_type, self.error.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("limit must be between 1 and {max}, got {got}", max = defaults::MAX_PAGE_LIMIT)]
pub struct LimitError {
    pub got: u32,
}

/// Resolve an optional page size, applying the default and enforcing the 1-100 range
pub fn validate_limit(limit: Option<u32>) -> Result<u32, LimitError> {
    match limit {
        None => Ok(defaults::PAGE_LIMIT),
        Some(got) if got == 0 || got > defaults::MAX_PAGE_LIMIT => Err(LimitError { got }),
        Some(limit) => Ok(limit),
    }
}
