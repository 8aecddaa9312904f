//! # glazier-sync: Sync Engine for Glazier
//!
//! Keeps every open view of the back-office data (customers, bills,
//! quotations, daily sales) converged. Views write to a shared key-value
//! store; each process polls that store and tells its own listeners which
//! collections moved.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Service Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     SyncService (one per process)                │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ ChangeNotifier │  │    Poller      │  │    StateAccessor       │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Listeners per  │◄─│ Interval scan, │─►│ Envelope {value,       │    │
//! │  │ data type, run │  │ watermark per  │  │ updatedAt} per key,    │    │
//! │  │ in order       │  │ data type      │  │ last writer wins       │    │
//! │  └────────────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │                                                      ▼                  │
//! │                                          ┌────────────────────────┐    │
//! │                                          │ KeyValueStore          │    │
//! │                                          │ MemoryStore | SQLite   │    │
//! │                                          └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Staleness between two processes is bounded by the poll interval.
//!
//! ## Module Organization
//! - [`config`] - Poll interval, tracked collections, database location
//! - [`error`] - Sync error types
//! - [`notifier`] - Change listeners
//! - [`store`] - Key-value store seam and its backings
//! - [`accessor`] - Timestamped envelopes over the store
//! - [`poller`] - Interval scan and watermarks
//! - [`service`] - `SyncService` and `SyncedValue`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glazier_sync::{SyncConfig, SyncService};
//! use glazier_core::DataType;
//!
//! let config = SyncConfig::load_or_default(None);
//! let sync = SyncService::new(&config, Arc::new(db.kv()));
//!
//! let billing = db.billing().with_publisher(sync.publisher());
//! let _sub = sync.subscribe(DataType::Bills, Arc::new(|| println!("bills changed")));
//! sync.start()?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accessor;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use accessor::{Envelope, StateAccessor};
pub use config::{SyncConfig, SyncSettings, StoreSettings, DEFAULT_POLL_INTERVAL_MS};
pub use error::{SyncError, SyncResult};
pub use notifier::{Callback, ChangeNotifier, Subscription};
pub use poller::{PollState, Poller};
pub use service::{SyncService, SyncedValue};
pub use store::{KeyValueStore, MemoryStore};
