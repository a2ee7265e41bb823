//! Errors from the snapshot store.
//!
//! The terminal state layer logs these and carries on with what it has in
//! memory; only startup (opening the file, migrating) is fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The file could not be opened or created, or the pool is gone.
    #[error("Cannot open store: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement.
    #[error("Store query failed: {0}")]
    QueryFailed(String),

    /// A stored document does not decode into the requested type, or a value
    /// could not be encoded. Usually a snapshot from an incompatible build.
    #[error("Snapshot encoding failed: {0}")]
    Serialization(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(e) => DbError::QueryFailed(e.message().to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DbError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::Decode(e) | sqlx::Error::ColumnDecode { source: e, .. } => {
                DbError::Serialization(e.to_string())
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
