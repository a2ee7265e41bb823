//! # Key-Value Repository
//!
//! JSON documents stored by key in the `kv_store` table.
//!
//! Each save replaces the whole document. There are no partial updates and
//! no cross-key transactions; a reader sees either the old or the new
//! document for a key.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Well-known keys.
pub mod keys {
    /// The product collection.
    pub const PRODUCTS: &str = "products";
    /// The sale ledger.
    pub const SALES: &str = "sales";
    /// The open cart.
    pub const CART: &str = "pos_cart";
    /// The settings record.
    pub const SETTINGS: &str = "pos_settings";
}

/// Repository for key-value documents.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Loads the raw JSON document stored under `key`.
    ///
    /// ## Returns
    /// * `Ok(None)` - nothing stored
    /// * `Err(DbError::Serialization)` - stored text is not JSON
    pub async fn load(&self, key: &str) -> DbResult<Option<serde_json::Value>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Loads and decodes the document stored under `key`.
    pub async fn load_as<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.load(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key`, replacing any previous document.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let text = serde_json::to_string(value)?;

        debug!(key = %key, bytes = text.len(), "Saving document");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes the document under `key`. Returns whether one existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

// =============================================================================
// Tests
// =============================================================================
