//! # Repository Module
//!
//! Database repositories for Glazier.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BillingService (billing.rs)                                            │
//! │  ├── add_bill ──► documents(bills) + documents(dailySales), one tx      │
//! │  ├── daily_sales / daily_summary                                        │
//! │  └── publish  ──► ChangePublisher (glazier-sync's state accessor)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DocumentRepository<T> (document.rs)                                    │
//! │  ├── create / list / get_by_id / update / delete                        │
//! │  └── SQL: documents(collection, id, payload JSON, timestamps)           │
//! │                                                                         │
//! │  KvRepository (kv.rs)                                                   │
//! │  └── get / set on kv_store, polled by the sync layer                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DocumentRepository`](document::DocumentRepository) - CRUD per collection
//! - [`KvRepository`](kv::KvRepository) - Sync state key-value table
//! - [`BillingService`](billing::BillingService) - Back-office workflows

pub mod billing;
pub mod document;
pub mod kv;
