use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;

// 1. DocumentStore Contract

/// One stored document: the store-assigned key plus its schema-less fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Value,
}

/// StoreError
///
/// Failure taxonomy of the document store. `PermissionDenied` is kept
/// distinct from generic backend failure because the role-resolution fallback
/// policy depends on telling the two apart.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("permission denied by store access rules")]
    PermissionDenied,
    #[error("document not found")]
    NotFound,
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// DocumentStore
///
/// Defines the abstract contract for the hosted document database: arbitrary
/// schema-less collections, keyed documents, and string-ordered queries. The
/// handlers and the session resolver interact with this trait only, so the
/// concrete backend (Postgres, in-memory) can be swapped without touching
/// them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document. A missing document is `Ok(None)`, not an error.
    async fn get_document(&self, collection: &str, key: &str)
    -> Result<Option<Document>, StoreError>;

    /// Creates or fully replaces one document.
    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Value,
    ) -> Result<(), StoreError>;

    /// Merges `partial` into an existing document. Fails with `NotFound` when
    /// the document does not exist.
    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        partial: Value,
    ) -> Result<(), StoreError>;

    /// Deletes one document, returning whether anything was removed.
    async fn delete_document(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    /// Lists a collection ordered ascending by the string value of
    /// `order_by` inside the document fields.
    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError>;
}

/// The concrete type used to share store access across the application state.
pub type StoreState = Arc<dyn DocumentStore>;

// 2. The Hosted Implementation (Postgres, JSONB documents)

/// PostgresStore
///
/// The production implementation of `DocumentStore`, backed by a single
/// schema-less `documents` table (collection + key + JSONB fields). All
/// queries are runtime-parameterized; a SQLSTATE 42501 (insufficient
/// privilege) from row security rules surfaces as `PermissionDenied`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it does not exist. Idempotent, safe to
    /// call at startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key        TEXT NOT NULL,
                fields     JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(map_sqlx_error)
    }
}

/// Maps a sqlx failure into the store taxonomy. Postgres signals an access
/// rule rejection with SQLSTATE 42501.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("42501") {
            return StoreError::PermissionDenied;
        }
    }
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT fields FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| Document {
            key: key.to_owned(),
            fields: r.get("fields"),
        }))
    }

    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key)
            DO UPDATE SET fields = EXCLUDED.fields, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(fields)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(map_sqlx_error)
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        partial: Value,
    ) -> Result<(), StoreError> {
        // JSONB || merges top-level keys, leaving unmentioned fields intact.
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET fields = fields || $3, updated_at = NOW()
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(partial)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT key, fields FROM documents WHERE collection = $1 ORDER BY fields->>$2 ASC",
        )
        .bind(collection)
        .bind(order_by)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|r| Document {
                key: r.get("key"),
                fields: r.get("fields"),
            })
            .collect())
    }
}

// 3. The In-Process Implementation (Local Development & Tests)

/// MemoryStore
///
/// An in-process `DocumentStore` used for `Env::Local` runs and tests. Read
/// operations can be made to fail on demand (to exercise the
/// permission-denied fallback policy) and can be artificially delayed (to
/// reproduce the out-of-order resolution race in tests).
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<(String, String), Value>>,
    fail_reads: Mutex<Option<StoreError>>,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent read fails with `err` until `clear_read_failure`.
    pub fn fail_reads_with(&self, err: StoreError) {
        *self.fail_reads.lock().unwrap_or_else(|e| e.into_inner()) = Some(err);
    }

    pub fn clear_read_failure(&self) {
        *self.fail_reads.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Every subsequent read sleeps for `delay` before resolving.
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn clear_read_delay(&self) {
        *self.read_delay.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    async fn before_read(&self) -> Result<(), StoreError> {
        let delay = *self.read_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .fail_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn entry_key(collection: &str, key: &str) -> (String, String) {
        (collection.to_owned(), key.to_owned())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.before_read().await?;
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        Ok(docs
            .get(&Self::entry_key(collection, key))
            .map(|fields| Document {
                key: key.to_owned(),
                fields: fields.clone(),
            }))
    }

    async fn set_document(
        &self,
        collection: &str,
        key: &str,
        fields: Value,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.insert(Self::entry_key(collection, key), fields);
        Ok(())
    }

    async fn update_document(
        &self,
        collection: &str,
        key: &str,
        partial: Value,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        let entry = docs
            .get_mut(&Self::entry_key(collection, key))
            .ok_or(StoreError::NotFound)?;
        if let (Some(target), Some(source)) = (entry.as_object_mut(), partial.as_object()) {
            for (k, v) in source {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        Ok(docs.remove(&Self::entry_key(collection, key)).is_some())
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.before_read().await?;
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<Document> = docs
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, key), fields)| Document {
                key: key.clone(),
                fields: fields.clone(),
            })
            .collect();
        results.sort_by(|a, b| {
            let field = |d: &Document| {
                d.fields
                    .get(order_by)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned()
            };
            field(a).cmp(&field(b))
        });
        Ok(results)
    }
}
