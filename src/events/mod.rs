//! Presence webhook decoding and dispatch.
//!
//! # Data Flow
//! ```text
//! POST /event body
//!     → WebhookPayload (events kept as raw JSON)
//!     → WebhookEvent per entry (tagged on "name", unknown names tolerated)
//!     → channel_type("private-<type>-...")
//!     → ChannelHandler::handle_vacated_channel
//! ```
//!
//! # Design Decisions
//! - Each event decodes independently; one bad entry never hides the rest
//! - The endpoint never reports failure to the webhook sender

pub mod handler;

use serde::Deserialize;
use serde_json::{Map, Value};

pub use handler::{ChannelHandler, LoggingChannelHandler};

/// Envelope posted by the pub/sub provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub time_ms: Option<u64>,
}

/// A `channel_vacated` event; fields other than `channel` are kept as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VacatedChannel {
    pub channel: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The event object exactly as delivered, `name` included.
    #[serde(skip)]
    pub raw: Value,
}

/// Webhook events this gateway understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum WebhookEvent {
    #[serde(rename = "channel_vacated")]
    ChannelVacated(VacatedChannel),
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    /// Decode one event, `None` if it is malformed.
    pub fn decode(raw: Value) -> Option<Self> {
        match serde_json::from_value(raw.clone()) {
            Ok(WebhookEvent::ChannelVacated(mut vacated)) => {
                vacated.raw = raw;
                Some(WebhookEvent::ChannelVacated(vacated))
            }
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed webhook event");
                None
            }
        }
    }

    /// Metric label for this event.
    pub fn label(&self) -> &'static str {
        match self {
            WebhookEvent::ChannelVacated(_) => "channel_vacated",
            WebhookEvent::Unknown => "unknown",
        }
    }
}

/// Decode a raw webhook body; `None` when it is absent or not a payload.
pub fn parse_payload(body: &[u8]) -> Option<WebhookPayload> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// Extract `<type>` from a `private-<type>-...` channel name.
///
/// `<type>` is one or more ASCII word characters and must be followed by `-`.
pub fn channel_type(channel: &str) -> Option<&str> {
    let rest = channel.strip_prefix("private-")?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 || !rest[end..].starts_with('-') {
        return None;
    }
    Some(&rest[..end])
}

/// Feed every vacated private channel in `payload` to `handler`.
///
/// Returns the number of handler invocations.
pub async fn dispatch(payload: WebhookPayload, handler: &dyn ChannelHandler) -> usize {
    let mut dispatched = 0;
    for raw in payload.events {
        let Some(event) = WebhookEvent::decode(raw) else {
            continue;
        };
        crate::observability::metrics::record_webhook_event(event.label());

        match event {
            WebhookEvent::ChannelVacated(vacated) => {
                if let Some(kind) = channel_type(&vacated.channel) {
                    handler
                        .handle_vacated_channel(kind, &vacated, payload.time_ms)
                        .await;
                    dispatched += 1;
                }
            }
            WebhookEvent::Unknown => {}
        }
    }
    dispatched
}
