//! Embedded schema migrations.
//!
//! SQL lives in `migrations/sqlite/NNN_description.sql` at the workspace root
//! and is compiled into the binary. Applied files are never edited; schema
//! changes get a new file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, before) = migration_status(pool).await?;
    MIGRATOR.run(pool).await?;

    if total > before {
        info!(applied = total - before, total, "Schema migrated");
    } else {
        debug!(total, "Schema up to date");
    }
    Ok(())
}

/// `(known, applied)` migration counts. A fresh database has applied none.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = MIGRATOR.migrations.len();

    let has_table: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if has_table == 0 {
        return Ok((known, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;
    Ok((known, applied as usize))
}
