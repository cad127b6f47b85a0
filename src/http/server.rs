//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, timeout, metrics)
//! - Bind server to listener
//! - Hold the injected collaborators every handler shares

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{SessionTokenIssuer, TokenIssuer};
use crate::config::GatewayConfig;
use crate::events::{ChannelHandler, LoggingChannelHandler};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::{event, kite, session};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::store::Store;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub channels: Arc<dyn ChannelHandler>,
    pub fetcher: Arc<dyn Fetcher>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// State with the default collaborators for `config` around `store`.
    pub fn new(config: GatewayConfig, store: Arc<dyn Store>) -> Self {
        Self {
            tokens: Arc::new(SessionTokenIssuer::new(config.auth.token_ttl_secs)),
            channels: Arc::new(LoggingChannelHandler),
            fetcher: Arc::new(HttpFetcher::new(&config.proxy)),
            store,
            config: Arc::new(config),
        }
    }

    pub fn with_token_issuer(mut self, tokens: Arc<dyn TokenIssuer>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_channel_handler(mut self, channels: Arc<dyn ChannelHandler>) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }
}

/// HTTP server for the kite gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/kite/connect", any(kite::connect))
            .route("/kite/disconnect", any(kite::disconnect))
            .route("/kite/{kite_name}", any(kite::proxy))
            .route("/event", any(event::receive))
            .route("/login", any(session::login))
            .route("/logout", any(session::logout))
            .route("/health", get(health))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            // Checked by the body extractors; `/event` swallows the rejection.
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(layers)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
