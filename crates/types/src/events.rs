use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::List;

/// Kind of event recorded for a checkout transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "checkout.created")]
    CheckoutCreated,
    #[serde(rename = "checkout.payment_detected")]
    CheckoutPaymentDetected,
    #[serde(rename = "checkout.confirming")]
    CheckoutConfirming,
    #[serde(rename = "checkout.completed")]
    CheckoutCompleted,
    #[serde(rename = "checkout.expired")]
    CheckoutExpired,
    #[serde(rename = "checkout.failed")]
    CheckoutFailed,
    #[serde(other)]
    Unknown,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CheckoutCreated => "checkout.created",
            EventType::CheckoutPaymentDetected => "checkout.payment_detected",
            EventType::CheckoutConfirming => "checkout.confirming",
            EventType::CheckoutCompleted => "checkout.completed",
            EventType::CheckoutExpired => "checkout.expired",
            EventType::CheckoutFailed => "checkout.failed",
            EventType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkout.created" => Ok(EventType::CheckoutCreated),
            "checkout.payment_detected" => Ok(EventType::CheckoutPaymentDetected),
            "checkout.confirming" => Ok(EventType::CheckoutConfirming),
            "checkout.completed" => Ok(EventType::CheckoutCompleted),
            "checkout.expired" => Ok(EventType::CheckoutExpired),
            "checkout.failed" => Ok(EventType::CheckoutFailed),
            _ => Err(format!("Invalid event type: {}", s)),
        }
    }
}

/// An entry of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID (`evt_...`)
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: EventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<String>,

    /// Snapshot of the affected resource at the time of the event
    #[serde(default)]
    pub data: serde_json::Value,

    pub created_at: DateTime<Utc>,
}

pub type EventList = List<Event>;

/// Query parameters for `GET /events`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListEventsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Page size, 1-100 (default 25)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let json = r#"{
            "id": "evt_1",
            "type": "checkout.completed",
            "checkout_id": "co_abc123",
            "data": {"status": "confirmed"},
            "created_at": "2024-01-01T00:00:00Z"
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EventType::CheckoutCompleted);
        assert_eq!(event.checkout_id.as_deref(), Some("co_abc123"));
        assert_eq!(event.data["status"], "confirmed");
    }

    #[test]
    fn test_event_type_round_trips_through_str() {
        let parsed: EventType = "checkout.payment_detected".parse().unwrap();
        assert_eq!(parsed.to_string(), "checkout.payment_detected");
    }

    #[test]
    fn test_params_use_type_key() {
        let params = ListEventsParams {
            event_type: Some(EventType::CheckoutExpired),
            checkout_id: Some("co_1".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "checkout.expired", "checkout_id": "co_1"})
        );
    }
}
