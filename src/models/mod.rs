//! Shared models for the feed's control and data messages.
//!
//! Contains channel-name builders, subscription request/response types,
//! and the normalized trade record shared between the wire decoder and
//! the output emitter.

mod trade;

pub use trade::{Deal, TradeSide};

use serde::{Deserialize, Serialize};

/// Public aggregated channels this feed consumes.
pub enum Channel {
    /// Aggregated depth updates (`spot@public.aggre.depth.v3.api.pb`).
    AggreDepth,
    /// Aggregated deal prints (`spot@public.aggre.deals.v3.api.pb`).
    AggreDeals,
}

impl Channel {
    /// Returns the wire-format channel prefix expected by the exchange.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::AggreDepth => "spot@public.aggre.depth.v3.api.pb",
            Channel::AggreDeals => "spot@public.aggre.deals.v3.api.pb",
        }
    }

    /// Builds the full subscription topic for one symbol.
    ///
    /// Both aggregated channels require an interval suffix (10ms/100ms);
    /// without it the server replies "Blocked" and sends nothing.
    #[must_use]
    pub fn topic(&self, symbol: &str) -> String {
        format!("{}@100ms@{symbol}", self.as_str())
    }
}

/// A `SUBSCRIPTION` request sent after connecting.
#[derive(Serialize)]
pub struct SubscriptionRequest {
    pub method: String,
    pub params: Vec<String>,
}

impl SubscriptionRequest {
    #[must_use]
    pub fn new(topics: Vec<String>) -> Self {
        Self {
            method: "SUBSCRIPTION".to_string(),
            params: topics,
        }
    }
}

/// A `PONG` reply to the server's keepalive `PING`.
#[derive(Serialize)]
pub struct PongRequest {
    pub method: String,
}

impl PongRequest {
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: "PONG".to_string(),
        }
    }
}

impl Default for PongRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-side control message carried on text frames (keepalive pings,
/// subscription acknowledgments).
#[derive(Deserialize)]
pub struct ControlMessage {
    pub method: Option<String>,
    #[serde(rename = "msg")]
    pub message: Option<String>,
}

impl ControlMessage {
    /// Whether this is a keepalive ping that must be answered.
    #[must_use]
    pub fn is_ping(&self) -> bool {
        self.method.as_deref() == Some("PING")
    }
}
