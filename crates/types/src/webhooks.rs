use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{api::List, events::EventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEndpointStatus {
    Enabled,
    Disabled,
}

/// A registered webhook endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    /// Endpoint ID (`we_...`)
    pub id: String,

    pub url: String,

    /// Event types delivered to this endpoint
    #[serde(default)]
    pub events: Vec<EventType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Signing secret, only returned when the endpoint is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    pub status: WebhookEndpointStatus,

    pub created_at: DateTime<Utc>,
}

pub type WebhookEndpointList = List<WebhookEndpoint>;

/// Query parameters for `GET /webhooks`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListWebhookEndpointsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Page size, 1-100 (default 25)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
