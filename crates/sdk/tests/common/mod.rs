#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use billing_sdk::{
    BillingClient, BillingError, Chain, Checkout, CheckoutList, CheckoutStatus,
    CheckoutStatusResponse, CreateCheckoutRequest, EventList, ListCheckoutsParams,
    ListEventsParams, ListWebhookEndpointsParams, RequestOptions, Result, Token,
    WebhookEndpointList,
};
use parking_lot::Mutex;
use tokio::{sync::Notify, time::Instant};

/// One scripted status response
pub enum Step {
    Respond(Result<CheckoutStatusResponse>),
    /// Respond after simulated network latency
    Delayed(Duration, CheckoutStatusResponse),
    /// Respond once the test releases the gate
    Gated(Arc<Notify>, CheckoutStatusResponse),
}

impl Step {
    pub fn ok(res: CheckoutStatusResponse) -> Self {
        Step::Respond(Ok(res))
    }

    pub fn network_error() -> Self {
        Step::Respond(Err(BillingError::Other(
            "connection reset by peer".to_string(),
        )))
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub checkout_id: String,
    pub at: Instant,
}

/// Test double for [`BillingClient`] answering from scripted queues
///
/// When the status script runs out it keeps answering `pending`.
#[derive(Default)]
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    checkout_pages: Mutex<VecDeque<Result<CheckoutList>>>,
    created: Mutex<VecDeque<Result<Checkout>>>,
    create_calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().push_back(step);
    }

    pub fn push_checkout_page(&self, page: Result<CheckoutList>) {
        self.checkout_pages.lock().push_back(page);
    }

    pub fn push_created(&self, checkout: Result<Checkout>) {
        self.created.lock().push_back(checkout);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Offsets of every status request relative to `start`
    pub fn call_offsets(&self, start: Instant) -> Vec<Duration> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.at.duration_since(start))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingClient for ScriptedClient {
    async fn create_checkout(
        &self,
        _request: &CreateCheckoutRequest,
        _options: &RequestOptions,
    ) -> Result<Checkout> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BillingError::Other("no checkout scripted".to_string())))
    }

    async fn get_checkout_status(&self, checkout_id: &str) -> Result<CheckoutStatusResponse> {
        self.calls.lock().push(Call {
            checkout_id: checkout_id.to_string(),
            at: Instant::now(),
        });
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let step = self.steps.lock().pop_front();
        let result = match step {
            Some(Step::Respond(result)) => result,
            Some(Step::Delayed(latency, res)) => {
                tokio::time::sleep(latency).await;
                Ok(res)
            }
            Some(Step::Gated(gate, res)) => {
                gate.notified().await;
                Ok(res)
            }
            None => Ok(CheckoutStatusResponse::new(CheckoutStatus::Pending)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_checkouts(&self, _params: &ListCheckoutsParams) -> Result<CheckoutList> {
        self.checkout_pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(CheckoutList::default()))
    }

    async fn list_webhook_endpoints(
        &self,
        _params: &ListWebhookEndpointsParams,
    ) -> Result<WebhookEndpointList> {
        Ok(WebhookEndpointList::default())
    }

    async fn list_events(&self, _params: &ListEventsParams) -> Result<EventList> {
        Ok(EventList::default())
    }
}

pub fn checkout(id: &str) -> Checkout {
    Checkout {
        id: id.to_string(),
        status: CheckoutStatus::Pending,
        amount_usd: 49.99,
        amount_atomic: Some("49990000".to_string()),
        chain: Chain::Tron,
        token: Token::Usdt,
        deposit_address: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".to_string(),
        confirmations: 0,
        required_confirmations: 19,
        tx_hash: None,
        metadata: Default::default(),
        created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        expires_at: None,
        detected_at: None,
        confirmed_at: None,
    }
}

/// Let spawned tasks run without advancing the paused clock
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
