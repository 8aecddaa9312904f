//! # glazier-db: Database Layer for Glazier
//!
//! SQLite storage for the back office: a JSON document store per collection,
//! the key-value table the sync layer polls, and the billing workflows built
//! on both.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Glazier Data Flow                                │
//! │                                                                         │
//! │  apps/backoffice, glazier-sync                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     glazier-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌─────────────┐  │    │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations  │  │    │
//! │  │   │   (pool.rs)   │◄───│ DocumentRepository │  │ (embedded)  │  │    │
//! │  │   │  SqlitePool   │    │ KvRepository       │  │ 001_initial │  │    │
//! │  │   │               │    │ BillingService     │  │             │  │    │
//! │  │   └───────────────┘    └────────────────────┘  └─────────────┘  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file shared by every process that opens it                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Document store, key-value table, billing service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glazier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("glazier.db")).await?;
//!
//! let bill = db.billing().add_bill(bill).await?;
//! let today = db.billing().daily_summary(bill.data.date.date()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::billing::{BillingService, ChangePublisher};
pub use repository::document::{Document, DocumentRepository, StoredRecord};
pub use repository::kv::KvRepository;
