//! # Key-Value Store
//!
//! The shared medium every view polls. Two backings:
//!
//! - [`MemoryStore`]: process-local map, for tests and single-process setups
//! - [`glazier_db::KvRepository`]: the SQLite `kv_store` table, shared by
//!   every process that opens the same database file

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use glazier_db::KvRepository;

use crate::error::SyncResult;

/// String values under string keys. Last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> SyncResult<()>;
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for KvRepository {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(KvRepository::get(self, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> SyncResult<()> {
        Ok(KvRepository::set(self, key, value).await?)
    }
}
