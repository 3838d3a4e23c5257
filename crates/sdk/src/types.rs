// Re-export shared types from billing-types
pub use billing_types::{
    ApiErrorBody, Chain, Checkout, CheckoutList, CheckoutStatus, CheckoutStatusResponse,
    CreateCheckoutRequest, Event, EventList, EventType, List,
    ListCheckoutsParams, ListEventsParams, ListWebhookEndpointsParams, RequestOptions, Token,
    WebhookEndpoint, WebhookEndpointList, defaults,
};

/// Configuration for the billing.io HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`)
    pub api_key: String,

    /// Base URL for the billing.io API
    pub base_url: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl BillingConfig {
    /// Create a new configuration against the production endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: defaults::BASE_URL.to_string(),
            timeout_ms: 30_000,
        }
    }

    /// Override the API base URL, e.g. `http://localhost:8080/v1`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Whether this key targets the sandbox environment
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }
}
