//! Request context extraction.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) for every inbound request
//! - Collect query and form parameters into one ordered map
//! - Resolve the caller's session from the `clientId` cookie
//!
//! # Design Decisions
//! - Form body values override query values with the same name
//! - Later duplicates override earlier ones, keeping first position

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::form_urlencoded;
use uuid::Uuid;

use crate::auth::{require_valid_session, session_token};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::store::Session;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a fresh UUID v4 per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Query and form parameters of a request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        if let Some(query) = query {
            params.merge_encoded(query.as_bytes());
        }
        params
    }

    /// Merge `application/x-www-form-urlencoded` pairs, overriding duplicates.
    pub fn merge_encoded(&mut self, encoded: &[u8]) {
        for (key, value) in form_urlencoded::parse(encoded) {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of `key` in place, or append it.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// `uri` with these parameters appended as its query string.
    pub fn append_to(&self, uri: &str) -> String {
        let separator = if uri.contains('?') { '&' } else { '?' };
        format!("{uri}{separator}{}", self.to_query_string())
    }
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = Self::from_query(request.uri().query());
        if is_form(&request) {
            let body = Bytes::from_request(request, state)
                .await
                .map_err(IntoResponse::into_response)?;
            params.merge_encoded(&body);
        }
        Ok(params)
    }
}

/// The session of an authenticated caller.
#[derive(Debug, Clone)]
pub struct SessionContext(pub Session);

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        match require_valid_session(state.store.as_ref(), token).await {
            Ok(session) => Ok(Self(session)),
            Err(e) => {
                tracing::debug!(error = %e, "Session rejected");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_query_parsing_and_override() {
        let params = RequestParams::from_query(Some("a=1&b=two+words&a=3"));
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(params.get("b"), Some("two words"));
        assert_eq!(params.len(), 2);
        assert_eq!(params.to_query_string(), "a=3&b=two+words");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = RequestParams::from_query(Some("username=mallory&x=1"));
        params.set("username", "alice");
        params.set("y", "2");
        assert_eq!(params.to_query_string(), "username=alice&x=1&y=2");
    }

    #[test]
    fn test_append_to() {
        let params = RequestParams::from_query(Some("q=a%26b"));
        assert_eq!(params.append_to("http://kite/fs"), "http://kite/fs?q=a%26b");
        assert_eq!(params.append_to("http://kite/fs?v=1"), "http://kite/fs?v=1&q=a%26b");
    }

    #[tokio::test]
    async fn test_extracts_form_body_over_query() {
        let request = Request::builder()
            .method("POST")
            .uri("/kite/connect?data=old&keep=1")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("data=new&extra=2"))
            .unwrap();

        let params = RequestParams::from_request(request, &()).await.unwrap();
        assert_eq!(params.get("data"), Some("new"));
        assert_eq!(params.get("keep"), Some("1"));
        assert_eq!(params.get("extra"), Some("2"));
    }

    #[tokio::test]
    async fn test_non_form_body_ignored() {
        let request = Request::builder()
            .method("POST")
            .uri("/x?a=1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a":2}"#))
            .unwrap();

        let params = RequestParams::from_request(request, &()).await.unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_request_id_is_uuid() {
        let request = axum::http::Request::new(());
        let id = MakeRequestUuidV4.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
