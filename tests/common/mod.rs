//! Shared utilities for route and end-to-end tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use kite_gateway::auth::{IssuedToken, TokenError, TokenIssuer};
use kite_gateway::events::{ChannelHandler, VacatedChannel};
use kite_gateway::fetch::{FetchError, Fetcher};
use kite_gateway::store::{MemoryStore, Session, Store, StoreResult};
use kite_gateway::{AppState, GatewayConfig, GatewayServer, Shutdown};

pub const SECRET: &str = "test-secret";

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.kites.disconnect_secret = SECRET.into();
    config.proxy.fetch_timeout_secs = 5;
    config
}

/// Read a response body as UTF-8.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `MemoryStore` wrapper that counts calls per operation.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub token_lookups: AtomicUsize,
    pub resolves: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>> {
        self.token_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_session_by_token(token).await
    }

    async fn find_session_by_nonce(&self, nonce: &str) -> StoreResult<Option<Session>> {
        self.inner.find_session_by_nonce(nonce).await
    }

    async fn remove_nonce(&self, nonce: &str) -> StoreResult<bool> {
        self.inner.remove_nonce(nonce).await
    }

    async fn resolve_kite(&self, name: &str, username: &str) -> StoreResult<Option<String>> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_kite(name, username).await
    }

    async fn upsert_kite(&self, name: &str, uri: &str) -> StoreResult<()> {
        self.inner.upsert_kite(name, uri).await
    }

    async fn delete_kite(&self, name: &str, uri: &str) -> StoreResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_kite(name, uri).await
    }
}

/// Fetcher that records URLs and answers with a canned body or failure.
pub struct RecordingFetcher {
    pub urls: Mutex<Vec<String>>,
    reply: Option<&'static str>,
}

impl RecordingFetcher {
    pub fn replying(body: &'static str) -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            reply: Some(body),
        }
    }

    pub fn failing() -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            reply: None,
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());
        match self.reply {
            Some(body) => Ok(Bytes::from_static(body.as_bytes())),
            None => Err(FetchError::Request("connection refused".into())),
        }
    }
}

/// Channel handler that records `(type, channel, time_ms)`.
#[derive(Default)]
pub struct RecordingChannels {
    pub calls: Mutex<Vec<(String, String, Option<u64>)>>,
}

impl RecordingChannels {
    pub fn calls(&self) -> Vec<(String, String, Option<u64>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelHandler for RecordingChannels {
    async fn handle_vacated_channel(
        &self,
        channel_type: &str,
        event: &VacatedChannel,
        time_ms: Option<u64>,
    ) {
        self.calls.lock().unwrap().push((
            channel_type.to_string(),
            event.channel.clone(),
            time_ms,
        ));
    }
}

/// Token issuer that always fails.
pub struct FailingIssuer;

#[async_trait]
impl TokenIssuer for FailingIssuer {
    async fn issue(&self, session: &Session) -> Result<IssuedToken, TokenError> {
        Err(TokenError::MissingClientId(session.username.clone()))
    }
}

/// Everything a route test needs to poke at.
pub struct Harness {
    pub store: Arc<CountingStore>,
    pub fetcher: Arc<RecordingFetcher>,
    pub channels: Arc<RecordingChannels>,
    pub state: AppState,
}

impl Harness {
    pub fn new(memory: MemoryStore, fetcher: RecordingFetcher) -> Self {
        Self::with_config(memory, fetcher, test_config())
    }

    pub fn with_config(
        memory: MemoryStore,
        fetcher: RecordingFetcher,
        config: GatewayConfig,
    ) -> Self {
        let store = Arc::new(CountingStore::new(memory));
        let fetcher = Arc::new(fetcher);
        let channels = Arc::new(RecordingChannels::default());
        let state = AppState::new(config, store.clone())
            .with_fetcher(fetcher.clone())
            .with_channel_handler(channels.clone());
        Self {
            store,
            fetcher,
            channels,
            state,
        }
    }

    pub fn router(&self) -> axum::Router {
        GatewayServer::build_router(self.state.clone())
    }
}

/// Start a gateway on an ephemeral port.
pub async fn spawn_gateway(state: AppState) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(state);
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

/// What the programmable backend answers with.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl BackendReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives the request target (path and query) and returns the reply.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BackendReply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        while read < buf.len() {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => read += n,
                            }
                            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        let head = String::from_utf8_lossy(&buf[..read]).to_string();
                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let reply = f(target).await;
                        let status_text = match reply.status {
                            200 => "200 OK",
                            301 => "301 Moved Permanently",
                            302 => "302 Found",
                            307 => "307 Temporary Redirect",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let location = reply
                            .location
                            .map(|l| format!("Location: {}\r\n", l))
                            .unwrap_or_default();

                        let response_str = format!(
                            "HTTP/1.1 {}\r\n{}Content-Type: application/javascript\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            location,
                            reply.body.len(),
                            reply.body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
