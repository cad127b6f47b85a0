//! Outbound HTTP fetch to kites.
//!
//! # Responsibilities
//! - GET a resolved kite URL, following its redirects
//! - Bound the exchange by a timeout and a body size limit
//! - Collapse every kind of failure into `FetchError` ("no response")
//!
//! # Design Decisions
//! - Plain HTTP only (`HttpConnector`, no TLS)
//! - Redirects are followed, up to `max_redirects`, to `http` targets only
//! - Other non-2xx statuses, empty bodies and a bare `0` count as failures
//! - No retries; the caller answers 503 on the first failure

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid kite URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("kite request failed: {0}")]
    Request(String),

    #[error("kite responded with {0}")]
    Status(StatusCode),

    #[error("kite response body unreadable: {0}")]
    Body(String),

    #[error("kite did not answer within {0:?}")]
    Timeout(Duration),

    #[error("kite redirected more than {0} times")]
    TooManyRedirects(usize),

    #[error("kite returned no content")]
    Empty,
}

impl FetchError {
    /// Metric label for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Request(_) => "request_error",
            FetchError::Status(_) => "bad_status",
            FetchError::Body(_) => "body_error",
            FetchError::Timeout(_) => "timeout",
            FetchError::TooManyRedirects(_) => "too_many_redirects",
            FetchError::Empty => "empty",
        }
    }
}

/// Fetches a kite response body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// `Fetcher` over a hyper client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(config: &ProxyConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout: Duration::from_secs(config.fetch_timeout_secs),
            max_body_bytes: config.max_response_bytes,
            max_redirects: config.max_redirects,
        }
    }

    fn parse_url(url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Self::check_scheme(parsed)
    }

    fn check_scheme(url: Url) -> Result<Url, FetchError> {
        if url.scheme() != "http" {
            return Err(FetchError::InvalidUrl {
                reason: format!("unsupported scheme '{}'", url.scheme()),
                url: url.into(),
            });
        }
        Ok(url)
    }

    fn request_uri(url: &Url) -> Result<Uri, FetchError> {
        url.as_str()
            .parse::<Uri>()
            .map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Where a redirect response points, resolved against `base`.
    fn redirect_target(base: &Url, response: &Response<Incoming>) -> Option<Result<Url, FetchError>> {
        let location = response.headers().get(header::LOCATION)?;
        let target = location
            .to_str()
            .map_err(|e| e.to_string())
            .and_then(|l| base.join(l).map_err(|e| e.to_string()))
            .map_err(|reason| FetchError::InvalidUrl {
                url: String::from_utf8_lossy(location.as_bytes()).into_owned(),
                reason,
            })
            .and_then(Self::check_scheme);
        Some(target)
    }

    async fn get(&self, mut url: Url) -> Result<Bytes, FetchError> {
        let mut hops = 0;

        let response = loop {
            let request = Request::get(Self::request_uri(&url)?)
                .body(Body::empty())
                .map_err(|e| FetchError::Request(e.to_string()))?;

            let response: Response<Incoming> = self
                .client
                .request(request)
                .await
                .map_err(|e| FetchError::Request(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                break response;
            }
            if !status.is_redirection() {
                return Err(FetchError::Status(status));
            }

            let Some(target) = Self::redirect_target(&url, &response) else {
                return Err(FetchError::Status(status));
            };
            if hops == self.max_redirects {
                return Err(FetchError::TooManyRedirects(hops));
            }
            hops += 1;
            url = target?;
            tracing::debug!(status = %status, location = %url, hops, "Following kite redirect");
        };

        let body = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes)
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        // A bare `0` is as good as nothing.
        if body.is_empty() || body.as_ref() == b"0" {
            return Err(FetchError::Empty);
        }
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let url = Self::parse_url(url)?;
        tokio::time::timeout(self.timeout, self.get(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
