//! # Database State
//!
//! Wraps the `Database` handle and owns the "persist after every mutation"
//! rule.
//!
//! ## Write Path
//! ```text
//! command ──► mutate under lock ──► clone snapshot ──► release lock
//!                                                          │
//!                                                          ▼
//!                                   DbState::persist(key, &snapshot)
//!                                          │
//!                                   Err ──►  tracing::warn!, dropped
//! ```
//! The in-memory state is the source of truth while the app runs. A failed
//! write costs durability, never the mutation the cashier just made.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use duka_db::{Database, KvRepository};

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }

    pub fn kv(&self) -> KvRepository {
        self.db.kv()
    }

    /// Saves a snapshot. Failures are logged and swallowed.
    pub async fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match self.db.kv().save(key, value).await {
            Ok(()) => debug!(key = %key, "Snapshot persisted"),
            Err(e) => warn!(key = %key, error = %e, "Failed to persist snapshot"),
        }
    }

    /// Loads a snapshot.
    ///
    /// `None` when nothing is stored or the stored document is unreadable;
    /// the latter is logged so the caller can fall back quietly.
    pub async fn restore<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.db.kv().load_as(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored snapshot unreadable, ignoring it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_db::{keys, DbConfig};

    #[tokio::test]
    async fn test_persist_then_restore() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        db.persist(keys::SALES, &vec![1, 2, 3]).await;

        let restored: Option<Vec<i64>> = db.restore(keys::SALES).await;
        assert_eq!(restored, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_persist_failure_is_swallowed() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        db.inner().close().await;

        db.persist(keys::SALES, &vec![1]).await;
        let restored: Option<Vec<i64>> = db.restore(keys::SALES).await;
        assert!(restored.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_restores_none() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        db.persist(keys::PRODUCTS, &serde_json::json!({"not": "a list"})).await;

        let restored: Option<Vec<duka_core::Product>> = db.restore(keys::PRODUCTS).await;
        assert!(restored.is_none());
    }
}
