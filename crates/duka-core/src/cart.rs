//! # Cart Engine
//!
//! The working set of the current sale, kept honest against live stock.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  Cashier Action        Engine Call              Line State              │
//! │  ──────────────        ───────────              ──────────              │
//! │                                                                         │
//! │  Type code + qty ────► add_to_cart() ─────────► absent → present(N)    │
//! │                                        (merge) present(N) → (N+M)      │
//! │                                                                         │
//! │  Edit quantity ──────► change_quantity() ─────► present(N) → (M)       │
//! │                        (M < 1) ───────────────► removed                │
//! │                                                                         │
//! │  + / − buttons ──────► increment / decrement ─► N+1 / N−1 (stops at 1) │
//! │                                                                         │
//! │  Remove / Clear ─────► remove_line() / clear()► removed                │
//! │                                                                         │
//! │  Checkout ───────────► checkout() ────────────► Sale, cart empty       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is reserved: every mutation re-reads the product's current
//! quantity from the catalog, and checkout re-validates the whole cart.
//! A failed operation leaves the cart, catalog and ledger untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::types::{PaymentMethod, Product, Sale, SaleLine, SaleStatus, TaxRate};
use crate::validation;
use crate::WALK_IN_CUSTOMER;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Prices are frozen when the line is created; later price edits in the
/// catalog do not change what the customer was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    pub code: String,
    pub selling_price_cents: i64,
    pub buying_price_cents: i64,
    pub qty: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product, qty: i64) -> Self {
        CartLine {
            line_id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            code: product.code.clone(),
            selling_price_cents: product.selling_price_cents,
            buying_price_cents: product.buying_price_cents,
            qty,
            added_at: Utc::now(),
        }
    }

    /// selling price × qty
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.selling_price_cents).multiply_quantity(self.qty)
    }

    /// (selling − buying) × qty
    pub fn line_profit(&self) -> Money {
        Money::from_cents(self.selling_price_cents - self.buying_price_cents)
            .multiply_quantity(self.qty)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    /// Σ qty
    pub item_count: i64,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub total_profit_cents: i64,
}

impl CartTotals {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// What the cashier supplies at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub tax_rate: TaxRate,
    pub payment_method: PaymentMethod,
    /// Blank or absent means [`WALK_IN_CUSTOMER`].
    pub customer_name: Option<String>,
}

impl CheckoutRequest {
    pub fn new(tax_rate: TaxRate) -> Self {
        CheckoutRequest {
            tax_rate,
            payment_method: PaymentMethod::default(),
            customer_name: None,
        }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    fn customer(&self) -> String {
        self.customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
            .to_string()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (re-adding merges)
/// - Every line has `qty >= 1`
/// - `qty <= product.qty` as of the last operation that touched the line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,

    /// When the cart was created or last emptied.
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether any line points at the product.
    pub fn references_product(&self, product_id: &str) -> bool {
        self.lines.iter().any(|l| l.product_id == product_id)
    }

    /// Adds `requested` units of the product with `code`, merging into an
    /// existing line for the same product. Returns the line id.
    ///
    /// ## Errors
    /// - `Validation(MustBePositive)` if `requested < 1`
    /// - `ProductNotFound` for an unknown code
    /// - `InsufficientStock` if the request, or the merged total, exceeds
    ///   stock; `available` is what can still be added
    pub fn add_to_cart(&mut self, catalog: &Catalog, code: &str, requested: i64) -> CoreResult<String> {
        validation::validate_quantity(requested)?;

        let product = catalog
            .find_by_code(code)
            .ok_or_else(|| CoreError::ProductNotFound(code.trim().to_string()))?;

        if requested > product.qty {
            return Err(CoreError::InsufficientStock {
                code: product.code.clone(),
                available: product.qty,
                requested,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            if line.qty + requested > product.qty {
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available: product.qty - line.qty,
                    requested,
                });
            }
            line.qty += requested;
            return Ok(line.line_id.clone());
        }

        let line = CartLine::from_product(product, requested);
        let line_id = line.line_id.clone();
        self.lines.push(line);
        Ok(line_id)
    }

    /// Sets a line's quantity. `new_qty < 1` removes the line; an unknown
    /// line id is a no-op.
    pub fn change_quantity(&mut self, catalog: &Catalog, line_id: &str, new_qty: i64) -> CoreResult<()> {
        if new_qty < 1 {
            self.remove_line(line_id);
            return Ok(());
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.line_id == line_id) else {
            return Ok(());
        };

        let product = catalog
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.code.clone()))?;

        if new_qty > product.qty {
            return Err(CoreError::InsufficientStock {
                code: product.code.clone(),
                available: product.qty,
                requested: new_qty,
            });
        }

        line.qty = new_qty;
        Ok(())
    }

    pub fn increment_quantity(&mut self, catalog: &Catalog, line_id: &str) -> CoreResult<()> {
        match self.line(line_id) {
            Some(line) => {
                let next = line.qty + 1;
                self.change_quantity(catalog, line_id, next)
            }
            None => Ok(()),
        }
    }

    /// Takes one unit off a line. A line at 1 stays at 1; removal is an
    /// explicit [`Cart::remove_line`].
    pub fn decrement_quantity(&mut self, catalog: &Catalog, line_id: &str) -> CoreResult<()> {
        match self.line(line_id) {
            Some(line) if line.qty > 1 => {
                let next = line.qty - 1;
                self.change_quantity(catalog, line_id, next)
            }
            _ => Ok(()),
        }
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_line(&mut self, line_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Drops lines whose product is gone from the catalog or no longer has
    /// enough stock for the line. Used when a persisted cart is restored.
    /// Returns the dropped lines.
    pub fn retain_available(&mut self, catalog: &Catalog) -> Vec<CartLine> {
        let (kept, dropped) = std::mem::take(&mut self.lines)
            .into_iter()
            .partition(|l| catalog.get(&l.product_id).is_some_and(|p| l.qty <= p.qty));
        self.lines = kept;
        dropped
    }

    /// Totals at `tax_rate`. Tax is rounded once, on the exact subtotal.
    pub fn totals(&self, tax_rate: TaxRate) -> CartTotals {
        let subtotal: Money = self.lines.iter().map(CartLine::line_total).sum();
        let tax = subtotal.calculate_tax(tax_rate);
        let profit: Money = self.lines.iter().map(CartLine::line_profit).sum();

        CartTotals {
            line_count: self.lines.len(),
            item_count: self.lines.iter().map(|l| l.qty).sum(),
            subtotal_cents: subtotal.cents(),
            tax_rate_bps: tax_rate.bps(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
            total_profit_cents: profit.cents(),
        }
    }

    /// Completes the sale.
    ///
    /// ## Flow
    /// ```text
    /// 1. Cart empty?                → EmptyCart
    /// 2. For each product in cart:
    ///      Σ qty over its lines ≤ product.qty?
    ///                               → ProductNotFound / InsufficientStock
    ///    (nothing has changed yet)
    /// 3. Decrement stock (floor 0)
    /// 4. Build Sale, append to ledger
    /// 5. Clear cart
    /// ```
    pub fn checkout(
        &mut self,
        catalog: &mut Catalog,
        ledger: &mut Ledger,
        request: CheckoutRequest,
    ) -> CoreResult<Sale> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let demand = self.demand_by_product();
        for (product_id, code, wanted) in &demand {
            let product = catalog
                .get(product_id)
                .ok_or_else(|| CoreError::ProductNotFound(code.clone()))?;
            if *wanted > product.qty {
                return Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    available: product.qty,
                    requested: *wanted,
                });
            }
        }

        let now = Utc::now();
        let items: Vec<SaleLine> = self
            .lines
            .iter()
            .map(|line| SaleLine {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                code: line.code.clone(),
                category: catalog
                    .get(&line.product_id)
                    .map(|p| p.category.clone())
                    .unwrap_or_default(),
                quantity: line.qty,
                unit_price_cents: line.selling_price_cents,
                line_total_cents: line.line_total().cents(),
                line_profit_cents: line.line_profit().cents(),
            })
            .collect();

        let totals = self.totals(request.tax_rate);
        let sale = Sale {
            id: generate_sale_id(now),
            items,
            subtotal_cents: totals.subtotal_cents,
            tax_rate_bps: totals.tax_rate_bps,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            total_profit_cents: totals.total_profit_cents,
            customer_name: request.customer(),
            payment_method: request.payment_method,
            date: now,
            status: SaleStatus::Completed,
        };

        for (product_id, _, sold) in &demand {
            catalog.decrement_stock(product_id, *sold, now);
        }
        ledger.append(sale.clone());
        self.clear();

        Ok(sale)
    }

    /// (product id, code, Σ qty) per product, in first-line order.
    fn demand_by_product(&self) -> Vec<(String, String, i64)> {
        let mut demand: Vec<(String, String, i64)> = Vec::new();
        for line in &self.lines {
            match demand.iter_mut().find(|(id, _, _)| *id == line.product_id) {
                Some(entry) => entry.2 += line.qty,
                None => demand.push((line.product_id.clone(), line.code.clone(), line.qty)),
            }
        }
        demand
    }
}

/// `SALE-<yyyymmddHHMMSS>-<5 hex>`
fn generate_sale_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..5].to_uppercase();
    format!("SALE-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================
