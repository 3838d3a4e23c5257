use std::time::Duration;

use async_trait::async_trait;
use billing_types::validate_limit;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{BillingError, Result},
    types::{
        BillingConfig, Checkout, CheckoutList, CheckoutStatusResponse, CreateCheckoutRequest,
        EventList, ListCheckoutsParams, ListEventsParams, ListWebhookEndpointsParams,
        RequestOptions, WebhookEndpointList,
    },
};

/// Operations of the billing.io API used by the SDK
///
/// [`HttpBillingClient`] is the production implementation. Pollers, queries
/// and mutations only ever see `Arc<dyn BillingClient>`, so tests can script
/// responses without a server.
#[async_trait]
pub trait BillingClient: Send + Sync {
    /// `POST /checkouts`
    async fn create_checkout(
        &self,
        request: &CreateCheckoutRequest,
        options: &RequestOptions,
    ) -> Result<Checkout>;

    /// `GET /checkouts/{id}/status`
    async fn get_checkout_status(&self, checkout_id: &str) -> Result<CheckoutStatusResponse>;

    /// `GET /checkouts`
    async fn list_checkouts(&self, params: &ListCheckoutsParams) -> Result<CheckoutList>;

    /// `GET /webhooks`
    async fn list_webhook_endpoints(
        &self,
        params: &ListWebhookEndpointsParams,
    ) -> Result<WebhookEndpointList>;

    /// `GET /events`
    async fn list_events(&self, params: &ListEventsParams) -> Result<EventList>;
}

/// HTTP implementation of [`BillingClient`]
///
/// # Example
///
/// ```ignore
/// use billing_sdk::{BillingConfig, BillingClient, HttpBillingClient};
///
/// let client = HttpBillingClient::new(BillingConfig::new("sk_test_..."))?;
/// let status = client.get_checkout_status("co_abc123").await?;
/// println!("{} ({}/{})", status.status, status.confirmations, status.required_confirmations);
/// ```
#[derive(Debug, Clone)]
pub struct HttpBillingClient {
    config: BillingConfig,
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpBillingClient {
    /// Create a client from the given configuration
    ///
    /// Fails if the API key is empty or the base URL cannot be parsed.
    pub fn new(config: BillingConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(BillingError::InvalidRequest(
                "API key must not be empty".to_string(),
            ));
        }

        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(BillingError::InvalidRequest(format!(
                "invalid base URL: {}",
                config.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// Build an endpoint URL by appending percent-encoded path segments to the base URL
    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BillingError::InvalidRequest(format!("invalid base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
    }

    /// Send a request and decode a JSON body, mapping non-2xx responses into [`BillingError::Api`]
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let url = response.url().clone();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "billing API request failed");
            return Err(BillingError::from_response_body(status.as_u16(), &body));
        }

        let body = response.text().await.map_err(transport_error)?;
        debug!(url = %url, status = %status, bytes = body.len(), "billing API response");
        Ok(serde_json::from_str(&body)?)
    }
}

fn transport_error(e: reqwest::Error) -> BillingError {
    if e.is_timeout() {
        BillingError::Timeout
    } else {
        BillingError::Http(e)
    }
}

#[async_trait]
impl BillingClient for HttpBillingClient {
    async fn create_checkout(
        &self,
        request: &CreateCheckoutRequest,
        options: &RequestOptions,
    ) -> Result<Checkout> {
        if !(request.amount_usd.is_finite() && request.amount_usd > 0.0) {
            return Err(BillingError::InvalidRequest(format!(
                "amount_usd must be positive, got {}",
                request.amount_usd
            )));
        }

        let url = self.build_url(&["checkouts"])?;
        debug!(url = %url, chain = ?request.chain, token = ?request.token, "Creating checkout");

        let mut builder = self.request(Method::POST, url).json(request);
        if let Some(ref key) = options.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        self.send(builder).await
    }

    async fn get_checkout_status(&self, checkout_id: &str) -> Result<CheckoutStatusResponse> {
        if checkout_id.is_empty() {
            return Err(BillingError::InvalidRequest(
                "checkout id must not be empty".to_string(),
            ));
        }

        let url = self.build_url(&["checkouts", checkout_id, "status"])?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn list_checkouts(&self, params: &ListCheckoutsParams) -> Result<CheckoutList> {
        validate_limit(params.limit)?;
        let url = self.build_url(&["checkouts"])?;
        self.send(self.request(Method::GET, url).query(params)).await
    }

    async fn list_webhook_endpoints(
        &self,
        params: &ListWebhookEndpointsParams,
    ) -> Result<WebhookEndpointList> {
        validate_limit(params.limit)?;
        let url = self.build_url(&["webhooks"])?;
        self.send(self.request(Method::GET, url).query(params)).await
    }

    async fn list_events(&self, params: &ListEventsParams) -> Result<EventList> {
        validate_limit(params.limit)?;
        let url = self.build_url(&["events"])?;
        self.send(self.request(Method::GET, url).query(params)).await
    }
}
