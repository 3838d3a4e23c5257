//! Wire types for the billing.io API.
//!
//! This crate holds the request and response shapes shared by the SDK and the
//! CLI. It performs no I/O.
//!
//! - [`checkouts`] - checkouts, their lifecycle status and the lightweight
//!   status snapshot used for polling
//! - [`webhooks`] - webhook endpoint registrations
//! - [`events`] - the event log emitted for every checkout transition
//! - [`api`] - pagination, request options and error bodies

pub mod api;
pub mod checkouts;
pub mod events;
pub mod webhooks;

pub use api::{ApiErrorBody, ApiErrorDetail, LimitError, List, RequestOptions, validate_limit};
pub use checkouts::{
    Chain, Checkout, CheckoutList, CheckoutStatus, CheckoutStatusResponse, CreateCheckoutRequest,
    ListCheckoutsParams, Token,
};
pub use events::{Event, EventList, EventType, ListEventsParams};
pub use webhooks::{
    ListWebhookEndpointsParams, WebhookEndpoint, WebhookEndpointList, WebhookEndpointStatus,
};

/// Default values shared by clients of the API
pub mod defaults {
    /// Production API endpoint
    pub const BASE_URL: &str = "https://api.billing.io/v1";

    /// Polling interval used until the server suggests one
    pub const POLLING_INTERVAL_MS: u64 = 3000;

    /// Page size used when a list request does not specify one
    pub const PAGE_LIMIT: u32 = 25;

    /// Largest page size accepted by list endpoints
    pub const MAX_PAGE_LIMIT: u32 = 100;
}
