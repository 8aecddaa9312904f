//! # State Accessor
//!
//! Typed, timestamped access to the shared key-value store.
//!
//! Every tracked collection lives under its [`DataType`] label as one JSON
//! envelope:
//!
//! ```json
//! { "value": [ ... ], "updatedAt": 1718000000123 }
//! ```
//!
//! `updatedAt` is what the poll loop compares against its watermark. It is
//! strictly increasing per key across writers: a write stamps
//! `max(now, last local stamp + 1, stored stamp + 1)`, so two writes inside
//! the same millisecond still look like two changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use glazier_core::DataType;
use glazier_db::ChangePublisher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::SyncResult;
use crate::store::KeyValueStore;

/// Stored form of a tracked value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub value: T,
    /// Epoch milliseconds of the write.
    pub updated_at: u64,
}

/// The envelope without its payload, for cheap polling.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    updated_at: u64,
}

/// Reads and writes envelopes. Cheap to clone.
#[derive(Clone)]
pub struct StateAccessor {
    store: Arc<dyn KeyValueStore>,
    /// Highest stamp handed out per key, stored or not.
    issued: Arc<Mutex<HashMap<DataType, u64>>>,
    /// Highest stamp that actually reached the store per key.
    last_written: Arc<Mutex<HashMap<DataType, u64>>>,
}

impl fmt::Debug for StateAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateAccessor").finish_non_exhaustive()
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

impl StateAccessor {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        StateAccessor {
            store,
            issued: Arc::new(Mutex::new(HashMap::new())),
            last_written: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores `value` for `data_type`, overwriting whatever is there.
    ///
    /// Returns the stamp written. Store failures are logged and returned.
    pub async fn write<T>(&self, data_type: DataType, value: &T) -> SyncResult<u64>
    where
        T: Serialize + ?Sized,
    {
        let key = data_type.as_str();

        let stored = match self.store.get(key).await {
            Ok(raw) => raw
                .and_then(|raw| serde_json::from_str::<Header>(&raw).ok())
                .map_or(0, |h| h.updated_at),
            Err(e) => {
                error!(data_type = %data_type, error = %e, "Failed to read before write");
                return Err(e);
            }
        };

        let updated_at = {
            let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = issued.get(&data_type).copied().unwrap_or(0);
            let stamp = now_millis()
                .max(previous.saturating_add(1))
                .max(stored.saturating_add(1));
            issued.insert(data_type, stamp);
            stamp
        };

        let payload = serde_json::to_string(&Envelope { value, updated_at })?;

        if let Err(e) = self.store.set(key, &payload).await {
            error!(data_type = %data_type, error = %e, "Failed to write synced value");
            return Err(e);
        }

        // Only stamps that reached the store count as ours: a failed write
        // must not hide another writer that lands on the same stamp.
        {
            let mut written = self.last_written.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = written.entry(data_type).or_insert(0);
            *entry = (*entry).max(updated_at);
        }

        debug!(data_type = %data_type, updated_at, bytes = payload.len(), "Synced value written");
        Ok(updated_at)
    }

    /// Current value for `data_type`, or `None` when it is missing or
    /// cannot be read as `T`.
    pub async fn read<T: DeserializeOwned>(&self, data_type: DataType) -> Option<T> {
        self.read_envelope(data_type).await.map(|envelope| envelope.value)
    }

    /// Like [`read`](Self::read) but keeps the stamp.
    pub async fn read_envelope<T: DeserializeOwned>(
        &self,
        data_type: DataType,
    ) -> Option<Envelope<T>> {
        let raw = match self.store.get(data_type.as_str()).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!(data_type = %data_type, error = %e, "Failed to read synced value");
                return None;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!(data_type = %data_type, error = %e, "Ignoring unreadable synced value");
                None
            }
        }
    }

    /// Stamp of this accessor's latest stored write for `data_type`, zero if
    /// none succeeded. Shared by clones.
    pub fn last_written(&self, data_type: DataType) -> u64 {
        self.last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&data_type)
            .copied()
            .unwrap_or(0)
    }

    /// Stamp of the stored envelope, without decoding its value.
    ///
    /// `Ok(None)` when nothing is stored. Store failures and corrupt headers
    /// are errors so the poll loop can log them per data type.
    pub async fn updated_at(&self, data_type: DataType) -> SyncResult<Option<u64>> {
        match self.store.get(data_type.as_str()).await? {
            Some(raw) => Ok(Some(serde_json::from_str::<Header>(&raw)?.updated_at)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ChangePublisher for StateAccessor {
    async fn publish(&self, data_type: DataType, snapshot: Value) {
        // Failures are already logged by `write`; the mutation itself stands.
        self.write(data_type, &snapshot).await.ok();
    }
}
