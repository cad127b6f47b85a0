//! Session and kite storage.
//!
//! # Data Flow
//! ```text
//! handlers
//!     → Store trait (injected as Arc<dyn Store>)
//!     → memory.rs (DashMap-backed, JSON seed/persist)
//! ```
//!
//! # Design Decisions
//! - Records are owned by the store; handlers receive clones
//! - Consistency (nonce consumption, kite uniqueness) is the store's job
//! - Every operation is fallible so remote document stores fit the same trait

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;

/// An authenticated browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque token carried in the `clientId` cookie.
    pub client_id: String,
    pub username: String,
    /// One-time login nonces still redeemable for this session.
    #[serde(default)]
    pub nonces: BTreeSet<String>,
}

impl Session {
    pub fn new(client_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            username: username.into(),
            nonces: BTreeSet::new(),
        }
    }

    /// Builder-style helper for seeding nonces.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonces.insert(nonce.into());
        self
    }
}

/// A registered kite endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KiteRecord {
    pub name: String,
    pub uri: String,
    /// Username this kite is dedicated to; `None` serves everyone.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

impl KiteRecord {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            owner: None,
            registered_at: Utc::now(),
        }
    }
}

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations the gateway needs for sessions and kites.
#[async_trait]
pub trait Store: Send + Sync {
    /// Find the session whose `clientId` equals `token`.
    async fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Find a session whose nonce set contains `nonce`.
    async fn find_session_by_nonce(&self, nonce: &str) -> StoreResult<Option<Session>>;

    /// Atomically remove `nonce` from the session holding it.
    ///
    /// Returns `false` when no session held the nonce anymore.
    async fn remove_nonce(&self, nonce: &str) -> StoreResult<bool>;

    /// Resolve the URI of kite `name` for `username`.
    async fn resolve_kite(&self, name: &str, username: &str) -> StoreResult<Option<String>>;

    /// Register kite `name` at `uri`, refreshing an existing registration.
    async fn upsert_kite(&self, name: &str, uri: &str) -> StoreResult<()>;

    /// Remove the registration of `name` at `uri`.
    ///
    /// Returns `false` when nothing matched.
    async fn delete_kite(&self, name: &str, uri: &str) -> StoreResult<bool>;
}
