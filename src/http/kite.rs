//! Kite routes: proxying, registration and deregistration.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::signature::verify_disconnect_token;
use crate::http::request::{RequestParams, SessionContext};
use crate::http::response::{ok_response, script_response, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;

/// `data` payload of `/kite/connect`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest {
    kite_name: String,
    uri: String,
}

/// Forward the caller's parameters to the kite and relay its answer.
pub async fn proxy(
    State(state): State<AppState>,
    Path(kite_name): Path<String>,
    SessionContext(session): SessionContext,
    mut params: RequestParams,
) -> Result<Response, ApiError> {
    let uri = state
        .store
        .resolve_kite(&kite_name, &session.username)
        .await?
        .ok_or_else(|| {
            tracing::debug!(kite = %kite_name, username = %session.username, "Kite not registered");
            ApiError::KiteNotFound
        })?;

    params.set("username", session.username.as_str());
    let url = params.append_to(&uri);

    tracing::debug!(kite = %kite_name, username = %session.username, url = %url, "Proxying to kite");

    match state.fetcher.fetch(&url).await {
        Ok(body) => {
            metrics::record_proxy_fetch("ok");
            Ok(script_response(body))
        }
        Err(e) => {
            tracing::warn!(kite = %kite_name, uri = %uri, error = %e, "Kite fetch failed");
            metrics::record_proxy_fetch(e.label());
            Err(ApiError::ServiceUnavailable { uri })
        }
    }
}

/// Register a kite announced by `data={"kiteName":..,"uri":..}`.
pub async fn connect(
    State(state): State<AppState>,
    params: RequestParams,
) -> Result<Json<Value>, ApiError> {
    let Some(data) = params.get("data") else {
        tracing::debug!("kite/connect without data");
        return Err(ApiError::denied());
    };

    let request: ConnectRequest = serde_json::from_str(data).map_err(|e| {
        tracing::debug!(error = %e, "Malformed kite/connect data");
        ApiError::denied()
    })?;

    if let Err(e) = state.store.upsert_kite(&request.kite_name, &request.uri).await {
        tracing::error!(kite = %request.kite_name, uri = %request.uri, error = %e, "Kite registration failed");
        return Err(ApiError::denied());
    }

    tracing::info!(kite = %request.kite_name, uri = %request.uri, "Kite connected");
    Ok(ok_response())
}

/// Deregister a kite that proves knowledge of the shared secret.
pub async fn disconnect(
    State(state): State<AppState>,
    params: RequestParams,
) -> Result<Json<Value>, ApiError> {
    let (Some(token), Some(uri), Some(kite_name)) =
        (params.get("token"), params.get("uri"), params.get("kiteName"))
    else {
        tracing::warn!("Unauthorized kite/disconnect attempt: missing fields");
        return Err(ApiError::denied());
    };

    if !verify_disconnect_token(token, uri, &state.config.kites.disconnect_secret) {
        tracing::warn!(kite = %kite_name, uri = %uri, "Unauthorized kite/disconnect attempt");
        return Err(ApiError::denied());
    }

    let removed = state.store.delete_kite(kite_name, uri).await?;
    tracing::info!(kite = %kite_name, uri = %uri, removed, "Kite disconnected");
    Ok(ok_response())
}
