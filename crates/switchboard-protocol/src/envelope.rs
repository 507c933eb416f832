use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::events::EventBody;

/// Outer JSON wrapper posted by the Events API.
/// Wire: `{ "type": "event_callback", "team_id": "T1", "event_id": "Ev1", "event": {...} }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification(UrlVerification),
    EventCallback(EventCallback),
    #[serde(alias = "rate_limited")]
    AppRateLimited(RateLimited),
}

impl EventEnvelope {
    /// Wire discriminator, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            EventEnvelope::UrlVerification(_) => "url_verification",
            EventEnvelope::EventCallback(_) => "event_callback",
            EventEnvelope::AppRateLimited(_) => "rate_limited",
        }
    }
}

/// Endpoint ownership handshake. The challenge must be echoed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlVerification {
    pub challenge: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventCallback {
    pub team_id: Option<String>,
    pub api_app_id: Option<String>,
    pub enterprise_id: Option<String>,
    /// Stable across redeliveries of the same event.
    pub event_id: Option<String>,
    /// Unix seconds.
    pub event_time: Option<i64>,
    pub event: EventBody,
}

/// Sent when the app exceeded the event delivery rate for a minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimited {
    pub team_id: Option<String>,
    pub minute_rate_limited: Option<i64>,
    pub api_app_id: Option<String>,
}

/// An envelope plus the raw JSON it was decoded from.
///
/// The raw value travels with the translated activity as channel data.
#[derive(Debug, Clone)]
pub struct DecodedEnvelope {
    pub envelope: EventEnvelope,
    pub raw: Value,
}

/// Decode a JSON request body into an envelope, keeping the raw value.
pub fn decode_envelope(body: &[u8]) -> Result<DecodedEnvelope> {
    let raw: Value = serde_json::from_slice(body)?;
    let envelope = EventEnvelope::deserialize(&raw)?;
    Ok(DecodedEnvelope { envelope, raw })
}
