//! billing.io SDK
//!
//! This crate provides async bindings for the billing.io crypto checkout API
//! and a status poller that follows a checkout until its payment settles.
//!
//! # Overview
//!
//! - [`BillingClient`] - the API operations, implemented over HTTP by [`HttpBillingClient`]
//! - [`BillingProvider`] - owns the client handed to everything else
//! - [`CheckoutStatusPoller`] - polls one checkout until `confirmed`, `expired` or `failed`
//! - [`Query`] - re-runnable list requests for checkouts, webhook endpoints and events
//! - [`CreateCheckoutMutation`] - creates checkouts on demand
//!
//! # Quick Start
//!
//! ```ignore
//! use billing_sdk::{BillingConfig, BillingProvider, CheckoutStatusPoller, PollOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = BillingProvider::new(BillingConfig::new("sk_test_..."))?;
//!
//!     let poller = CheckoutStatusPoller::from_provider(&provider)?;
//!     poller.start(Some("co_abc123"), PollOptions::default());
//!
//!     let state = poller.wait_until_settled().await;
//!     println!("Checkout settled: {:?} (tx {:?})", state.status, state.tx_hash);
//!     Ok(())
//! }
//! ```
//!
//! # Polling
//!
//! The poller issues its first request immediately, then waits for the
//! interval suggested by the server in `polling_interval_ms` (3s until one is
//! received). Pin a fixed interval with
//! [`PollOptions::with_polling_interval_ms`]. Failed requests are retried
//! indefinitely; only a terminal status or [`CheckoutStatusPoller::stop`]
//! ends polling.

pub mod client;
pub mod error;
pub mod mutation;
pub mod poller;
pub mod provider;
pub mod query;
pub mod types;

// Re-export main types at crate root
pub use client::{BillingClient, HttpBillingClient};
pub use error::{BillingError, Result, SharedError};
pub use mutation::CreateCheckoutMutation;
pub use poller::{
    CheckoutStatusPoller, CheckoutStatusState, DEFAULT_POLLING_INTERVAL_MS, PollOptions, PollPhase,
};
pub use provider::BillingProvider;
pub use query::{Query, QueryState};
pub use types::{
    BillingConfig, Chain, Checkout, CheckoutList, CheckoutStatus, CheckoutStatusResponse,
    CreateCheckoutRequest, Event, EventList, EventType, ListCheckoutsParams, ListEventsParams,
    ListWebhookEndpointsParams, RequestOptions, Token, WebhookEndpoint, WebhookEndpointList,
};
