//! Checkout resources.
//!
//! A checkout is one requested payment. Once the payer broadcasts a transaction
//! the server tracks it on-chain and moves the checkout through
//! `pending → detected → confirming` until it lands in one of the terminal
//! states `confirmed`, `expired` or `failed`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::List;

/// Decode an explicit `null` the same way as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lifecycle status of a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Created, no payment observed yet
    Created,
    /// Waiting for the payer to send funds
    Pending,
    /// A matching transaction was seen on-chain
    Detected,
    /// Transaction is accumulating confirmations
    Confirming,
    /// Required confirmations reached
    Confirmed,
    /// No payment before the checkout expired
    Expired,
    /// Payment could not be completed
    Failed,
    /// A status this client version does not know about
    #[serde(other)]
    Unknown,
}

impl CheckoutStatus {
    pub const TERMINAL: [CheckoutStatus; 3] = [
        CheckoutStatus::Confirmed,
        CheckoutStatus::Expired,
        CheckoutStatus::Failed,
    ];

    /// Whether no further state change is expected after this status
    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Created => "created",
            CheckoutStatus::Pending => "pending",
            CheckoutStatus::Detected => "detected",
            CheckoutStatus::Confirming => "confirming",
            CheckoutStatus::Confirmed => "confirmed",
            CheckoutStatus::Expired => "expired",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CheckoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(CheckoutStatus::Created),
            "pending" => Ok(CheckoutStatus::Pending),
            "detected" => Ok(CheckoutStatus::Detected),
            "confirming" => Ok(CheckoutStatus::Confirming),
            "confirmed" => Ok(CheckoutStatus::Confirmed),
            "expired" => Ok(CheckoutStatus::Expired),
            "failed" => Ok(CheckoutStatus::Failed),
            _ => Err(format!("Invalid checkout status: {}", s)),
        }
    }
}

/// Blockchain network a checkout is paid on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Tron,
    Ethereum,
    Arbitrum,
    Base,
    Optimism,
    Polygon,
    Solana,
    #[serde(other)]
    Unknown,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Tron => "tron",
            Chain::Ethereum => "ethereum",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
            Chain::Optimism => "optimism",
            Chain::Polygon => "polygon",
            Chain::Solana => "solana",
            Chain::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tron" => Ok(Chain::Tron),
            "ethereum" => Ok(Chain::Ethereum),
            "arbitrum" => Ok(Chain::Arbitrum),
            "base" => Ok(Chain::Base),
            "optimism" => Ok(Chain::Optimism),
            "polygon" => Ok(Chain::Polygon),
            "solana" => Ok(Chain::Solana),
            _ => Err(format!("Invalid chain: {}", s)),
        }
    }
}

/// Stablecoin accepted for a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Token::Usdt => "USDT",
            Token::Usdc => "USDC",
            Token::Unknown => "unknown",
        })
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USDT" => Ok(Token::Usdt),
            "USDC" => Ok(Token::Usdc),
            _ => Err(format!("Invalid token: {}", s)),
        }
    }
}

/// A checkout as returned by the create, get and list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkout {
    /// Checkout ID (`co_...`)
    pub id: String,

    pub status: CheckoutStatus,

    /// Requested amount in US dollars
    pub amount_usd: f64,

    /// Amount in the token's smallest unit, as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_atomic: Option<String>,

    pub chain: Chain,

    pub token: Token,

    /// Address the payer must send funds to
    pub deposit_address: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmations: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub required_confirmations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /checkouts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    pub amount_usd: f64,

    pub chain: Chain,

    pub token: Token,

    /// Free-form key/value pairs echoed back on the checkout and its events
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,

    /// Override the server's default expiry window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,
}

impl CreateCheckoutRequest {
    pub fn new(amount_usd: f64, chain: Chain, token: Token) -> Self {
        Self {
            amount_usd,
            chain,
            token,
            metadata: IndexMap::new(),
            expires_in_seconds: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_expires_in_seconds(mut self, seconds: u64) -> Self {
        self.expires_in_seconds = Some(seconds);
        self
    }
}

/// Lightweight response of `GET /checkouts/{id}/status`
///
/// Every field other than `status` is optional on the wire; counts default
/// to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<String>,

    pub status: CheckoutStatus,

    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmations: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub required_confirmations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Delay the server would like before the next status request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval_ms: Option<u64>,
}

impl CheckoutStatusResponse {
    pub fn new(status: CheckoutStatus) -> Self {
        Self {
            checkout_id: None,
            status,
            confirmations: 0,
            required_confirmations: 0,
            tx_hash: None,
            detected_at: None,
            confirmed_at: None,
            polling_interval_ms: None,
        }
    }

    pub fn with_confirmations(mut self, confirmations: u32, required: u32) -> Self {
        self.confirmations = confirmations;
        self.required_confirmations = required;
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    pub fn with_polling_interval_ms(mut self, interval_ms: u64) -> Self {
        self.polling_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_confirmed_at(mut self, confirmed_at: DateTime<Utc>) -> Self {
        self.confirmed_at = Some(confirmed_at);
        self
    }
}

pub type CheckoutList = List<Checkout>;

/// Query parameters for `GET /checkouts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListCheckoutsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Page size, 1-100 (default 25)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckoutStatus>,
}
