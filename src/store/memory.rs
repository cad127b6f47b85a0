//! In-memory store with optional JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::store::{KiteRecord, Session, Store, StoreResult};

/// On-disk layout of the seed/persistence file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub kites: Vec<KiteRecord>,
}

/// A thread-safe store for sessions and kites.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Sessions keyed by `clientId`.
    sessions: Arc<DashMap<String, Session>>,
    /// Kite registrations keyed by kite name.
    kites: Arc<DashMap<String, Vec<KiteRecord>>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            kites: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; the path is remembered for `save_to_file`.
    pub fn load_from_file(path: &Path) -> StoreResult<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: StoreSnapshot = serde_json::from_reader(reader)?;
            store.restore(snapshot);
            tracing::info!(
                sessions = store.sessions.len(),
                kites = store.kite_count(),
                path = %path.display(),
                "Loaded store seed file"
            );
        }
        Ok(store)
    }

    /// Save to the remembered file, if any.
    pub fn save_to_file(&self) -> StoreResult<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let snapshot = self.snapshot();
            serde_json::to_writer_pretty(writer, &snapshot)?;
            tracing::info!(
                sessions = snapshot.sessions.len(),
                kites = snapshot.kites.len(),
                path = %path.display(),
                "Saved store to file"
            );
        }
        Ok(())
    }

    /// Insert or replace a session.
    pub fn insert_session(&self, session: Session) {
        self.sessions.insert(session.client_id.clone(), session);
    }

    /// Insert a kite record as-is, keeping its owner and timestamp.
    pub fn insert_kite(&self, record: KiteRecord) {
        self.kites.entry(record.name.clone()).or_default().push(record);
        metrics::record_registered_kites(self.kite_count());
    }

    /// Total number of kite registrations.
    pub fn kite_count(&self) -> usize {
        self.kites.iter().map(|r| r.value().len()).sum()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn restore(&self, snapshot: StoreSnapshot) {
        for session in snapshot.sessions {
            self.insert_session(session);
        }
        for record in snapshot.kites {
            self.insert_kite(record);
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            sessions: self.sessions.iter().map(|r| r.value().clone()).collect(),
            kites: self
                .kites
                .iter()
                .flat_map(|r| r.value().clone())
                .collect(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_session_by_token(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.get(token).map(|r| r.value().clone()))
    }

    async fn find_session_by_nonce(&self, nonce: &str) -> StoreResult<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|r| r.value().nonces.contains(nonce))
            .map(|r| r.value().clone()))
    }

    async fn remove_nonce(&self, nonce: &str) -> StoreResult<bool> {
        // Key lookup drops its shard read guard before get_mut takes the write guard.
        let key = self
            .sessions
            .iter()
            .find(|r| r.value().nonces.contains(nonce))
            .map(|r| r.key().clone());

        let Some(key) = key else {
            return Ok(false);
        };

        Ok(self
            .sessions
            .get_mut(&key)
            .map(|mut session| session.nonces.remove(nonce))
            .unwrap_or(false))
    }

    async fn resolve_kite(&self, name: &str, username: &str) -> StoreResult<Option<String>> {
        let Some(records) = self.kites.get(name) else {
            return Ok(None);
        };

        // Dedicated kites beat shared ones; newest registration wins ties.
        Ok(records
            .iter()
            .filter(|k| k.owner.as_deref().map_or(true, |owner| owner == username))
            .max_by_key(|k| (k.owner.is_some(), k.registered_at))
            .map(|k| k.uri.clone()))
    }

    async fn upsert_kite(&self, name: &str, uri: &str) -> StoreResult<()> {
        {
            let mut records = self.kites.entry(name.to_string()).or_default();
            match records.iter_mut().find(|k| k.uri == uri) {
                Some(existing) => existing.registered_at = Utc::now(),
                None => records.push(KiteRecord::new(name, uri)),
            }
        }
        metrics::record_registered_kites(self.kite_count());
        Ok(())
    }

    async fn delete_kite(&self, name: &str, uri: &str) -> StoreResult<bool> {
        let removed = match self.kites.get_mut(name) {
            Some(mut records) => {
                let before = records.len();
                records.retain(|k| k.uri != uri);
                records.len() != before
            }
            None => false,
        };
        self.kites.remove_if(name, |_, records| records.is_empty());
        metrics::record_registered_kites(self.kite_count());
        Ok(removed)
    }
}
