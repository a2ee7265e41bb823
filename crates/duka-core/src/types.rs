//! # Domain Types
//!
//! Core domain types used throughout Duka POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (SALE-...)  │   │  product_id     │       │
//! │  │  code (business)│   │  items          │   │  quantity       │       │
//! │  │  prices (cents) │   │  totals (cents) │   │  unit price     │       │
//! │  │  qty, reorder   │   │  payment method │   │  line total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  bps (u32)      │   │  Completed      │   │  Cash, Card     │       │
//! │  │  1600 = 16%     │   │                 │   │  Mobile, Bank   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4, immutable, used by cart lines and sale lines
//! - `code`: human-readable business key (e.g. `TO-101`), used by the cashier

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1600 bps = 16% (Kenyan VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, e.g. `16.0`.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Creates a tax rate from a fraction, e.g. `0.16`.
    pub fn from_fraction(fraction: f64) -> Self {
        TaxRate((fraction * 10_000.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Only ever constructed through [`crate::catalog::Catalog`] ingestion or by
/// deserializing a snapshot the catalog produced, so the price and stock
/// invariants hold for every instance the engine sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code scanned or typed at the till, unique in the catalog.
    pub code: String,

    pub name: String,

    pub category: String,

    /// Cost price in cents.
    pub buying_price_cents: i64,

    /// Shelf price in cents, always above the buying price.
    pub selling_price_cents: i64,

    /// Units on hand, never negative.
    pub qty: i64,

    /// At or below this many units the product counts as low stock.
    pub reorder_level: i64,

    pub supplier: String,

    pub description: String,

    pub barcode: Option<String>,

    pub brand: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the buying price as Money.
    #[inline]
    pub fn buying_price(&self) -> Money {
        Money::from_cents(self.buying_price_cents)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Unit profit: selling price minus buying price.
    #[inline]
    pub fn profit(&self) -> Money {
        self.selling_price() - self.buying_price()
    }

    /// Profit if every unit on hand sells at the shelf price.
    pub fn profit_potential(&self) -> Money {
        self.profit().multiply_quantity(self.qty)
    }

    /// Stock valued at the selling price.
    pub fn stock_value(&self) -> Money {
        self.selling_price().multiply_quantity(self.qty)
    }

    /// Stock valued at the buying price.
    pub fn cost_value(&self) -> Money {
        self.buying_price().multiply_quantity(self.qty)
    }

    /// Margin as a fraction of the selling price, for display.
    pub fn margin_percent(&self) -> f64 {
        if self.selling_price_cents <= 0 {
            return 0.0;
        }
        self.profit().cents() as f64 / self.selling_price_cents as f64 * 100.0
    }

    /// True when the margin is strictly above `pct` percent.
    ///
    /// Compared in integers: `profit * 100 > sell * pct`.
    pub fn margin_above(&self, pct: i64) -> bool {
        self.selling_price_cents > 0
            && self.profit().cents() * 100 > self.selling_price_cents * pct
    }

    /// True when the margin is strictly below `pct` percent.
    pub fn margin_below(&self, pct: i64) -> bool {
        self.selling_price_cents > 0
            && self.profit().cents() * 100 < self.selling_price_cents * pct
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.qty == 0
    }

    /// `0 < qty <= reorder_level`
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.qty > 0 && self.qty <= self.reorder_level
    }

    /// `qty <= reorder_level`, out-of-stock products included.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.qty <= self.reorder_level
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.is_out_of_stock() {
            StockStatus::OutOfStock
        } else if self.is_low_stock() {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Stock classification shown next to every product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

// =============================================================================
// Product Input
// =============================================================================

/// Loosely-filled product record as it arrives from a form or an import file.
///
/// Every field is optional. [`crate::catalog::Catalog::add`] substitutes
/// defaults once and validates, producing a [`Product`]. A serialized
/// `Product` deserializes into a fully populated `ProductInput`, which is
/// what makes export/import round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductInput {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub buying_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub qty: Option<i64>,
    pub reorder_level: Option<i64>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub brand: Option<String>,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Product> for ProductInput {
    fn from(p: Product) -> Self {
        ProductInput {
            id: Some(p.id),
            code: Some(p.code),
            name: Some(p.name),
            category: Some(p.category),
            buying_price_cents: Some(p.buying_price_cents),
            selling_price_cents: Some(p.selling_price_cents),
            qty: Some(p.qty),
            reorder_level: Some(p.reorder_level),
            supplier: Some(p.supplier),
            description: Some(p.description),
            barcode: p.barcode,
            brand: p.brand,
            created_at: Some(p.created_at),
            updated_at: Some(p.updated_at),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale record.
///
/// Checkout only ever produces `Completed`; the ledger is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleStatus {
    #[default]
    Completed,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Mobile money (M-Pesa and friends).
    Mobile,
    /// Bank transfer.
    Bank,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Mobile,
        PaymentMethod::Bank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile" | "mpesa" | "m-pesa" => Ok(PaymentMethod::Mobile),
            "bank" | "transfer" => Ok(PaymentMethod::Bank),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a completed sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    pub name: String,
    pub code: String,
    /// Category at time of sale, used for per-category revenue.
    pub category: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit price × quantity
    pub line_total_cents: i64,
    /// (selling − buying) × quantity
    pub line_profit_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    #[inline]
    pub fn line_profit(&self) -> Money {
        Money::from_cents(self.line_profit_cents)
    }
}

/// A completed sale. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub items: Vec<SaleLine>,
    pub subtotal_cents: i64,
    /// Rate the tax was computed at, for the receipt.
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub total_profit_cents: i64,
    pub customer_name: String,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub status: SaleStatus,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
