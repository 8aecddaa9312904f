//! # Document Repository
//!
//! A small document store on top of one SQLite table. Each record type maps
//! to a collection; the record itself is stored as a JSON payload.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(data)      INSERT, new UUID id, created_at = updated_at = now   │
//! │  list()            newest first (created_at DESC)                       │
//! │  get_by_id(id)     Option<Document<T>>                                  │
//! │  update(id, patch) top-level JSON merge, updated_at = now               │
//! │  delete(id)        true if a row was removed                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unreadable Rows
//! A payload that no longer decodes as `T` is skipped by `list()` and
//! reported as absent by `get_by_id()`, with a warning in the log.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use glazier_core::billing::{Bill, Quotation};
use glazier_core::types::{Customer, DailySale, DataType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Stored Records
// =============================================================================

/// A record type with its own collection in the document store.
pub trait StoredRecord: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection the records live in.
    const COLLECTION: DataType;

    /// Entity name used in error messages.
    const ENTITY: &'static str;
}

impl StoredRecord for Customer {
    const COLLECTION: DataType = DataType::Customers;
    const ENTITY: &'static str = "Customer";
}

impl StoredRecord for Bill {
    const COLLECTION: DataType = DataType::Bills;
    const ENTITY: &'static str = "Bill";
}

impl StoredRecord for Quotation {
    const COLLECTION: DataType = DataType::Quotations;
    const ENTITY: &'static str = "Quotation";
}

impl StoredRecord for DailySale {
    const COLLECTION: DataType = DataType::DailySales;
    const ENTITY: &'static str = "Daily sale";
}

/// A stored record with its id and timestamps.
///
/// Serializes flat, `{ "id": .., "createdAt": .., "updatedAt": .., ...data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(sqlx::FromRow)]
pub(crate) struct DocumentRow {
    id: String,
    payload: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn decode<T: DeserializeOwned>(self) -> DbResult<Document<T>> {
        let data = serde_json::from_str(&self.payload)?;
        Ok(Document {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            data,
        })
    }

    /// Decodes the row, logging and dropping it when the payload is bad.
    pub(crate) fn decode_or_skip<T: StoredRecord>(self) -> Option<Document<T>> {
        let id = self.id.clone();
        match self.decode() {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(
                    collection = %T::COLLECTION,
                    id = %id,
                    error = %e,
                    "Skipping unreadable document"
                );
                None
            }
        }
    }
}

pub(crate) const SELECT_COLUMNS: &str = "SELECT id, payload, created_at, updated_at FROM documents";

/// Inserts a new record on an existing connection or transaction.
pub(crate) async fn insert_document<T: StoredRecord>(
    conn: &mut SqliteConnection,
    data: T,
) -> DbResult<Document<T>> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let payload = serde_json::to_string(&data)?;

    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, payload, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        "#,
    )
    .bind(T::COLLECTION.as_str())
    .bind(&id)
    .bind(&payload)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(collection = %T::COLLECTION, id = %id, "Document created");

    Ok(Document {
        id,
        created_at: now,
        updated_at: now,
        data,
    })
}

// =============================================================================
// Repository
// =============================================================================

/// CRUD access to one collection.
pub struct DocumentRepository<T> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentRepository<T> {
    fn clone(&self) -> Self {
        DocumentRepository {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: StoredRecord> fmt::Debug for DocumentRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("collection", &T::COLLECTION)
            .finish()
    }
}

impl<T: StoredRecord> DocumentRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository {
            pool,
            _record: PhantomData,
        }
    }

    /// Stores a new record and returns it with its generated id.
    pub async fn create(&self, data: T) -> DbResult<Document<T>> {
        let mut conn = self.pool.acquire().await?;
        insert_document(&mut conn, data).await
    }

    /// All readable records, newest first.
    pub async fn list(&self) -> DbResult<Vec<Document<T>>> {
        let sql = format!("{SELECT_COLUMNS} WHERE collection = ?1 ORDER BY created_at DESC, rowid DESC");
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(T::COLLECTION.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().filter_map(DocumentRow::decode_or_skip::<T>).collect())
    }

    /// Looks a record up by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Document<T>>> {
        let sql = format!("{SELECT_COLUMNS} WHERE collection = ?1 AND id = ?2");
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(T::COLLECTION.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(DocumentRow::decode_or_skip::<T>))
    }

    /// Merges the top-level fields of `patch` into a stored record.
    ///
    /// Fields absent from the patch keep their value; a field set to `null`
    /// is cleared. The merged record must still decode as `T`.
    ///
    /// ## Errors
    /// - `InvalidData` when the patch is not a JSON object
    /// - `NotFound` when no record has this id
    /// - `Serialization` when the merged record is not a valid `T`
    pub async fn update(&self, id: &str, patch: Value) -> DbResult<Document<T>> {
        let Value::Object(patch) = patch else {
            return Err(DbError::InvalidData(
                "update patch must be a JSON object".to_string(),
            ));
        };

        let mut tx = self.pool.begin().await?;

        let sql = format!("{SELECT_COLUMNS} WHERE collection = ?1 AND id = ?2");
        let row: DocumentRow = sqlx::query_as(&sql)
            .bind(T::COLLECTION.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, id))?;

        let mut merged: Value = serde_json::from_str(&row.payload)?;
        let Value::Object(fields) = &mut merged else {
            return Err(DbError::InvalidData(format!(
                "stored {} {} is not a JSON object",
                T::ENTITY,
                id
            )));
        };
        fields.extend(patch);

        let data: T = serde_json::from_value(merged)?;
        let payload = serde_json::to_string(&data)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE documents SET payload = ?3, updated_at = ?4
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(T::COLLECTION.as_str())
        .bind(id)
        .bind(&payload)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(collection = %T::COLLECTION, id = %id, "Document updated");

        Ok(Document {
            id: row.id,
            created_at: row.created_at,
            updated_at: now,
            data,
        })
    }

    /// Deletes a record. Returns `false` when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(T::COLLECTION.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        debug!(collection = %T::COLLECTION, id = %id, removed, "Document deleted");
        Ok(removed)
    }

    /// Number of stored records, readable or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(T::COLLECTION.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
