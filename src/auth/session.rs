//! Session cookie extraction and validation.

use axum::http::{header, HeaderMap};
use thiserror::Error;

use crate::store::{Session, Store, StoreError};

/// Cookie carrying the opaque session token.
pub const CLIENT_ID_COOKIE: &str = "clientId";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no clientId cookie")]
    MissingCookie,

    #[error("unknown session token")]
    UnknownToken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extract the `clientId` cookie value verbatim.
///
/// Multiple `Cookie` headers are searched in order; the first non-empty
/// value wins.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CLIENT_ID_COOKIE).then_some(value)
        })
        .find(|value| !value.is_empty())
}

/// Resolve the session behind `token`.
///
/// The store is not consulted when no token was presented.
pub async fn require_valid_session(
    store: &dyn Store,
    token: Option<&str>,
) -> Result<Session, AuthError> {
    let token = token.ok_or(AuthError::MissingCookie)?;
    store
        .find_session_by_token(token)
        .await?
        .ok_or(AuthError::UnknownToken)
}
