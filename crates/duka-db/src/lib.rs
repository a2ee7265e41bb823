//! # duka-db: Persistence Layer for Duka POS
//!
//! Stores the engine's collections as JSON documents in a SQLite key-value
//! table. The engine keeps everything in memory; this crate only makes it
//! survive a restart.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Data Flow                               │
//! │                                                                         │
//! │  Command (checkout)                                                    │
//! │       │  mutate catalog / ledger / cart in memory                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ KvRepository  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ load / save   │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ remove / keys │    │ 001_kv.sql   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/duka.db                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The key-value repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{keys, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("duka.db")).await?;
//! db.kv().save(keys::PRODUCTS, &products).await?;
//! let restored: Option<Vec<Product>> = db.kv().load_as(keys::PRODUCTS).await?;
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
pub use repository::kv::{keys, KvRepository};
