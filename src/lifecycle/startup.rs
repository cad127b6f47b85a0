//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. The listener binds last so traffic
//! only arrives once the store and collaborators exist.

use std::path::Path;
use std::sync::Arc;

use crate::config::{GatewayConfig, StoreConfig};
use crate::http::AppState;
use crate::store::{MemoryStore, StoreResult};

/// Open the memory store, seeding it from `seed_path` when configured.
pub fn open_store(config: &StoreConfig) -> StoreResult<MemoryStore> {
    match &config.seed_path {
        Some(path) => MemoryStore::load_from_file(Path::new(path)),
        None => Ok(MemoryStore::new(None)),
    }
}

/// Build handler state around `store` with the default collaborators.
pub fn build_state(config: GatewayConfig, store: MemoryStore) -> AppState {
    AppState::new(config, Arc::new(store))
}

/// Flush the store to disk if the configuration asks for it.
pub fn persist_store(config: &StoreConfig, store: &MemoryStore) {
    if !config.persist_on_shutdown {
        return;
    }
    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to persist store");
    }
}
