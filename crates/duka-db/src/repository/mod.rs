//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  State layer                                                           │
//! │       │  db.kv().save("products", catalog.products())                  │
//! │       ▼                                                                 │
//! │  KvRepository                                                          │
//! │  ├── load(&self, key)        → Option<serde_json::Value>               │
//! │  ├── load_as::<T>(&self, key) → Option<T>                              │
//! │  ├── save(&self, key, &T)    (upsert)                                  │
//! │  ├── remove(&self, key)                                                │
//! │  └── keys(&self)                                                       │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  kv_store table                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`kv::KvRepository`] - JSON documents by key

pub mod kv;
