//! Response shapes and the handler error type.
//!
//! # Design Decisions
//! - Every denial looks the same to the caller; sub-codes only reach the log
//! - Kite bodies are relayed untouched as `text/javascript`

use axum::{
    body::Bytes,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Errors a route handler can end with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `code` identifies the failing check in logs; it is never sent.
    #[error("access denied")]
    AccessDenied { code: Option<u8> },

    #[error("kite not found")]
    KiteNotFound,

    #[error("kite at {uri} unavailable")]
    ServiceUnavailable { uri: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn denied() -> Self {
        Self::AccessDenied { code: None }
    }

    pub fn denied_with(code: u8) -> Self {
        Self::AccessDenied { code: Some(code) }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied { .. } => StatusCode::UNAUTHORIZED,
            Self::KiteNotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCookie | AuthError::UnknownToken => Self::denied(),
            AuthError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::AccessDenied { code } => {
                tracing::info!(code = ?code, "Access denied");
                json!({ "error": status.as_u16() })
            }
            Self::KiteNotFound => json!({ "error": status.as_u16() }),
            Self::ServiceUnavailable { uri } => json!({ "error": status.as_u16(), "uri": uri }),
            Self::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                json!({ "error": status.as_u16() })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// The `{"ok":true}` acknowledgement.
pub fn ok_response() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Relay a kite body verbatim.
pub fn script_response(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "text/javascript")], body).into_response()
}
