//! Login and logout.

use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::auth::cookie::{cleared_session_cookie, session_cookie};
use crate::http::request::RequestParams;
use crate::http::response::{ok_response, ApiError};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Exchange the one-time nonce `n` for a `clientId` cookie.
///
/// Denial codes: 1 no nonce, 3 nonce unknown or already used, 4 no token.
pub async fn login(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = RequestParams::from_query(query.as_deref());
    let Some(nonce) = params.get("n") else {
        metrics::record_login("missing_nonce");
        return Err(ApiError::denied_with(1));
    };

    let Some(session) = state.store.find_session_by_nonce(nonce).await? else {
        metrics::record_login("unknown_nonce");
        return Err(ApiError::denied_with(3));
    };
    tracing::debug!(username = %session.username, "Session found for nonce");

    // A concurrent login may have consumed the nonce since the lookup.
    if !state.store.remove_nonce(nonce).await? {
        metrics::record_login("nonce_consumed");
        return Err(ApiError::denied_with(3));
    }

    let token = match state.tokens.issue(&session).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(username = %session.username, error = %e, "Token issuance failed");
            metrics::record_login("token_failure");
            return Err(ApiError::denied_with(4));
        }
    };

    tracing::info!(username = %session.username, expires = %token.expires, "Session logged in");
    metrics::record_login("ok");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, Utc::now()))],
        ok_response(),
    )
        .into_response())
}

/// Drop the `clientId` cookie.
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, cleared_session_cookie(Utc::now()))],
        ok_response(),
    )
        .into_response()
}
