//! # Commands Module
//!
//! Everything the shell (or any other front end) can ask of the engine.
//!
//! ```text
//! commands/
//! ├── product.rs    ◄─── catalog CRUD, restock, import/export
//! ├── cart.rs       ◄─── cart manipulation
//! ├── sale.rs       ◄─── checkout, history, receipts
//! ├── analytics.rs  ◄─── dashboard, stock analysis, stats, trends
//! └── config.rs     ◄─── settings
//! ```
//!
//! Each command declares only the state handles it needs:
//! ```rust,ignore
//! // read only
//! fn list_products(catalog: &CatalogState, query: Option<&str>)
//!
//! // mutates and persists
//! async fn add_to_cart(db: &DbState, catalog: &CatalogState, cart: &CartState, ...)
//! ```

pub mod analytics;
pub mod cart;
pub mod config;
pub mod product;
pub mod sale;
