//! Presence webhook endpoint.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use serde_json::Value;

use crate::events;
use crate::http::response::ok_response;
use crate::http::server::AppState;

/// Accept a webhook delivery. Always acknowledges.
pub async fn receive(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<Value> {
    let payload = match body {
        Ok(body) => events::parse_payload(&body),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable webhook body");
            None
        }
    };

    match payload {
        Some(payload) => {
            let dispatched = events::dispatch(payload, state.channels.as_ref()).await;
            tracing::debug!(dispatched, "Webhook processed");
        }
        None => tracing::debug!("Ignoring webhook without a valid payload"),
    }

    ok_response()
}
