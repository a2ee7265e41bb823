//! # duka-core: Pure Business Logic for Duka POS
//!
//! Everything the shop does with products, carts and sales lives here, as
//! plain data structures and functions with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Duka POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Terminal shell (duka-terminal)                  │   │
//! │  │    products ──► add ──► cart ──► checkout ──► receipt          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands + state handles               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ duka-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │   cart    │  │  ledger   │  │ analytics │  │   │
//! │  │   │ Products  │  │ CartLine  │  │   Sales   │  │  health   │  │   │
//! │  │   │ import    │  │ checkout  │  │  history  │  │  trends   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO TIMERS • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 duka-db (key-value snapshots)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, PaymentMethod, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`catalog`] - Product collection
//! - [`ledger`] - Append-only sale history
//! - [`cart`] - Cart engine and checkout
//! - [`analytics`] - Derived views over catalog and ledger
//! - [`alerts`] - Stock alert evaluation
//! - [`receipt`] - Plain-text receipt rendering
//! - [`seed`] - Demo catalog for first start
//!
//! ## Example Usage
//!
//! ```rust
//! use duka_core::cart::{Cart, CheckoutRequest};
//! use duka_core::catalog::Catalog;
//! use duka_core::ledger::Ledger;
//! use duka_core::types::TaxRate;
//!
//! let mut catalog = Catalog::from_products(duka_core::seed::demo_products());
//! let mut ledger = Ledger::new();
//! let mut cart = Cart::new();
//!
//! cart.add_to_cart(&catalog, "TO-101", 2).unwrap();
//! let sale = cart
//!     .checkout(&mut catalog, &mut ledger, CheckoutRequest::new(TaxRate::from_bps(1600)))
//!     .unwrap();
//!
//! // 2 × 3500.00 = 7000.00, plus 16% VAT
//! assert_eq!(sale.total().cents(), 812_000);
//! assert_eq!(catalog.find_by_code("TO-101").unwrap().qty, 8);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod money;
pub mod receipt;
pub mod seed;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, CheckoutRequest};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::Ledger;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reorder level given to products that arrive without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 5;

/// Kenyan VAT, 16%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1600;

/// Customer name recorded when the cashier leaves it blank.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Sales per page in the history view.
pub const HISTORY_PAGE_SIZE: usize = 8;
