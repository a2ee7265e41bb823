//! # Catalog Store
//!
//! Owns the product collection.
//!
//! ## Ingestion
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ProductInput → Product                               │
//! │                                                                         │
//! │  Form / import record (all fields optional)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Default substitution (ONCE, here, nowhere else)                    │
//! │     id → UUID v4          code → PROD-XXXXXXXX (unique)                │
//! │     qty → 0               reorder_level → configured default           │
//! │     barcode → BC########  timestamps → now                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. validate_product()  (required fields, selling > buying, ≥ 0)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. Uniqueness (id, code) against the catalog                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Product stored                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog never persists anything itself; the caller snapshots
//! [`Catalog::products`] after every successful mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, ProductInput};
use crate::validation::{self, require_text};

/// Which timestamps ingestion honours from the input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timestamps {
    /// `add`: `updated_at` is always now.
    Fresh,
    /// `import`: keep whatever the record carries.
    Preserve,
}

/// The product collection.
///
/// Order is insertion order; nothing depends on it beyond stable display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Wraps a snapshot previously produced by a catalog. No checks; use
    /// [`Catalog::restore`] for data read back from storage.
    pub fn from_products(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    /// Rebuilds a catalog from stored products, re-checking every product
    /// rule and id/code uniqueness. Fails on the first offending product.
    pub fn restore(products: Vec<Product>) -> CoreResult<Self> {
        let mut catalog = Catalog::new();
        for product in products {
            validation::validate_product(&product)?;
            catalog.ensure_unique(&product, None)?;
            catalog.products.push(product);
        }
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Exact (trimmed) code lookup, as used by the till.
    pub fn find_by_code(&self, code: &str) -> Option<&Product> {
        let code = code.trim();
        self.products.iter().find(|p| p.code == code)
    }

    /// Case-insensitive search over name, code and category; substring on
    /// barcode. An empty query returns every product.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.products.iter().collect();
        }

        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.code.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
                    || p.barcode
                        .as_deref()
                        .is_some_and(|b| b.contains(query.trim()))
            })
            .collect()
    }

    /// Distinct non-empty categories, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.products {
            let cat = p.category.as_str();
            if !cat.is_empty() && !seen.contains(&cat) {
                seen.push(cat);
            }
        }
        seen
    }

    /// Unit profit of a product: selling price minus buying price.
    pub fn profit(product: &Product) -> Money {
        product.profit()
    }

    /// Σ profit × qty over the products of one category.
    pub fn category_profit(&self, category: &str) -> Money {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .map(Product::profit_potential)
            .sum()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a product, substituting defaults and validating.
    ///
    /// ## Errors
    /// - `Validation(Required)` if name, category or either price is missing
    /// - `Validation(PriceNotAboveCost)` if selling ≤ buying
    /// - `Validation(Duplicate)` if the id or code is taken
    pub fn add(&mut self, input: ProductInput, default_reorder_level: i64) -> CoreResult<&Product> {
        let product = self.ingest(input, default_reorder_level, Utc::now(), Timestamps::Fresh)?;
        self.ensure_unique(&product, None)?;
        self.products.push(product);
        // just pushed
        Ok(&self.products[self.products.len() - 1])
    }

    /// Replaces the product with the same id.
    ///
    /// `created_at` is kept from the stored record; `updated_at` is set now.
    pub fn update(&mut self, mut product: Product) -> CoreResult<&Product> {
        let idx = self
            .position(&product.id)
            .ok_or_else(|| CoreError::ProductNotFound(product.id.clone()))?;

        product.code = product.code.trim().to_string();
        product.name = product.name.trim().to_string();
        product.category = product.category.trim().to_string();
        validation::validate_product(&product)?;
        self.ensure_unique(&product, Some(idx))?;

        product.created_at = self.products[idx].created_at;
        product.updated_at = Utc::now();
        self.products[idx] = product;
        Ok(&self.products[idx])
    }

    /// Removes the product with the given id. Removing an unknown id is a
    /// no-op; the return value says whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() != before
    }

    /// Bulk delete. Returns how many products were removed.
    pub fn remove_many(&mut self, ids: &[String]) -> usize {
        let before = self.products.len();
        self.products.retain(|p| !ids.contains(&p.id));
        before - self.products.len()
    }

    /// Adds `amount` units to each listed product. Unknown ids are skipped.
    /// Returns how many products were restocked.
    ///
    /// All-or-nothing: if any target would end above
    /// [`validation::MAX_QTY`], nothing changes and `OutOfRange` is returned.
    pub fn restock(&mut self, ids: &[String], amount: i64) -> CoreResult<usize> {
        validation::validate_quantity(amount)?;

        let over_limit = self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .any(|p| {
                p.qty
                    .checked_add(amount)
                    .map_or(true, |total| total > validation::MAX_QTY)
            });
        if over_limit {
            return Err(ValidationError::OutOfRange {
                field: "qty".to_string(),
                min: 0,
                max: validation::MAX_QTY,
            }
            .into());
        }

        let now = Utc::now();
        let mut count = 0;
        for p in self.products.iter_mut().filter(|p| ids.contains(&p.id)) {
            p.qty += amount;
            p.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    /// Imports a batch of records, all-or-nothing.
    ///
    /// Each record goes through the same ingestion and validation as
    /// [`Catalog::add`]. A record whose id matches an existing product
    /// replaces it; the rest are appended. Timestamps carried by the
    /// records are preserved, so export → import reproduces the catalog.
    pub fn import(&mut self, inputs: Vec<ProductInput>, default_reorder_level: i64) -> CoreResult<usize> {
        let now = Utc::now();
        let mut staged = self.clone();
        let count = inputs.len();

        for (n, input) in inputs.into_iter().enumerate() {
            let product = staged
                .ingest(input, default_reorder_level, now, Timestamps::Preserve)
                .map_err(|e| CoreError::Import(format!("record {}: {}", n + 1, e)))?;

            let existing = staged.position(&product.id);
            staged
                .ensure_unique(&product, existing)
                .map_err(|e| CoreError::Import(format!("record {}: {}", n + 1, e)))?;

            match existing {
                Some(idx) => staged.products[idx] = product,
                None => staged.products.push(product),
            }
        }

        *self = staged;
        Ok(count)
    }

    /// Parses a JSON array of product records and imports it.
    pub fn import_json(&mut self, json: &str, default_reorder_level: i64) -> CoreResult<usize> {
        let inputs: Vec<ProductInput> =
            serde_json::from_str(json).map_err(|e| CoreError::Import(e.to_string()))?;
        self.import(inputs, default_reorder_level)
    }

    /// The listed products, in request order, each once.
    ///
    /// ## Errors
    /// - `ProductNotFound` for the first id not in the catalog
    pub fn select(&self, ids: &[String]) -> CoreResult<Vec<&Product>> {
        let mut selected: Vec<&Product> = Vec::with_capacity(ids.len());
        for id in ids {
            let product = self
                .get(id)
                .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?;
            if !selected.iter().any(|p| p.id == product.id) {
                selected.push(product);
            }
        }
        Ok(selected)
    }

    /// Serializes the whole collection as a pretty JSON array.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.products)
    }

    /// Takes `qty` units off a product's stock, flooring at zero.
    pub(crate) fn decrement_stock(&mut self, id: &str, qty: i64, now: DateTime<Utc>) {
        if let Some(p) = self.products.iter_mut().find(|p| p.id == id) {
            p.qty = (p.qty - qty).max(0);
            p.updated_at = now;
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.products.iter().position(|p| p.id == id)
    }

    /// Default substitution followed by validation.
    fn ingest(
        &self,
        input: ProductInput,
        default_reorder_level: i64,
        now: DateTime<Utc>,
        timestamps: Timestamps,
    ) -> CoreResult<Product> {
        let name = require_text("name", input.name.as_deref())?;
        let category = require_text("category", input.category.as_deref())?;
        let buying_price_cents = input.buying_price_cents.ok_or_else(|| ValidationError::Required {
            field: "buying price".to_string(),
        })?;
        let selling_price_cents = input.selling_price_cents.ok_or_else(|| ValidationError::Required {
            field: "selling price".to_string(),
        })?;

        let id = non_blank(input.id).unwrap_or_else(|| Uuid::new_v4().to_string());
        let code = non_blank(input.code).unwrap_or_else(|| self.generate_code());
        let created_at = input.created_at.unwrap_or(now);
        let updated_at = match timestamps {
            Timestamps::Fresh => now,
            Timestamps::Preserve => input.updated_at.unwrap_or(now),
        };
        let barcode = non_blank(input.barcode).or_else(|| Some(generate_barcode(created_at)));

        let product = Product {
            id,
            code,
            name,
            category,
            buying_price_cents,
            selling_price_cents,
            qty: input.qty.unwrap_or(0),
            reorder_level: input.reorder_level.unwrap_or(default_reorder_level),
            supplier: input.supplier.unwrap_or_default().trim().to_string(),
            description: input.description.unwrap_or_default().trim().to_string(),
            barcode,
            brand: non_blank(input.brand),
            created_at,
            updated_at,
        };

        validation::validate_product(&product)?;
        Ok(product)
    }

    /// Rejects a product whose id or code collides with another entry.
    /// `skip` is the slot the product is about to replace.
    fn ensure_unique(&self, product: &Product, skip: Option<usize>) -> CoreResult<()> {
        for (idx, other) in self.products.iter().enumerate() {
            if Some(idx) == skip {
                continue;
            }
            if other.id == product.id {
                return Err(ValidationError::Duplicate {
                    field: "id".to_string(),
                    value: product.id.clone(),
                }
                .into());
            }
            if other.code == product.code {
                return Err(ValidationError::Duplicate {
                    field: "code".to_string(),
                    value: product.code.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn generate_code(&self) -> String {
        loop {
            let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
            let code = format!("PROD-{}", suffix);
            if self.find_by_code(&code).is_none() {
                return code;
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `BC` followed by the last eight digits of the creation time in millis.
fn generate_barcode(created_at: DateTime<Utc>) -> String {
    format!("BC{:08}", created_at.timestamp_millis().rem_euclid(100_000_000))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_REORDER_LEVEL;

    fn input(code: &str, category: &str, buy: i64, sell: i64, qty: i64) -> ProductInput {
        ProductInput {
            code: Some(code.to_string()),
            name: Some(format!("Product {}", code)),
            category: Some(category.to_string()),
            buying_price_cents: Some(buy),
            selling_price_cents: Some(sell),
            qty: Some(qty),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_substitutes_defaults() {
        let mut catalog = Catalog::new();
        let p = catalog
            .add(
                ProductInput {
                    name: Some("Shower Head".to_string()),
                    category: Some("Showers".to_string()),
                    buying_price_cents: Some(180_000),
                    selling_price_cents: Some(250_000),
                    ..Default::default()
                },
                DEFAULT_REORDER_LEVEL,
            )
            .unwrap()
            .clone();

        assert!(!p.id.is_empty());
        assert!(p.code.starts_with("PROD-"));
        assert_eq!(p.code.len(), 13);
        assert_eq!(p.qty, 0);
        assert_eq!(p.reorder_level, 5);
        assert!(p.barcode.as_deref().is_some_and(|b| b.starts_with("BC") && b.len() == 10));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_add_requires_fields() {
        let mut catalog = Catalog::new();

        let mut missing_name = input("A-1", "Taps", 100, 200, 1);
        missing_name.name = None;
        let err = catalog.add(missing_name, 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { ref field }) if field == "name"
        ));

        let mut missing_price = input("A-1", "Taps", 100, 200, 1);
        missing_price.selling_price_cents = None;
        assert!(catalog.add(missing_price, 5).is_err());

        let blank_category = input("A-1", "  ", 100, 200, 1);
        assert!(catalog.add(blank_category, 5).is_err());

        assert!(catalog.is_empty());
    }

    #[test]
    fn test_add_enforces_price_invariant() {
        let mut catalog = Catalog::new();
        let err = catalog.add(input("A-1", "Taps", 200, 200, 1), 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::PriceNotAboveCost { .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_code() {
        let mut catalog = Catalog::new();
        catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap();
        let err = catalog.add(input("A-1", "Taps", 100, 300, 1), 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_replaces_and_revalidates() {
        let mut catalog = Catalog::new();
        let mut p = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().clone();
        let created = p.created_at;

        p.qty = 42;
        p.name = "Renamed".to_string();
        catalog.update(p.clone()).unwrap();
        let stored = catalog.get(&p.id).unwrap();
        assert_eq!(stored.qty, 42);
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.created_at, created);

        p.selling_price_cents = 50;
        assert!(catalog.update(p.clone()).is_err());
        assert_eq!(catalog.get(&p.id).unwrap().selling_price_cents, 200);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut catalog = Catalog::new();
        let mut p = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().clone();
        p.id = "missing".to_string();
        assert!(matches!(
            catalog.update(p),
            Err(CoreError::ProductNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut catalog = Catalog::new();
        let id = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().id.clone();

        assert!(catalog.remove(&id));
        assert!(!catalog.remove(&id));
        assert!(!catalog.remove("never-existed"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_category_profit() {
        let mut catalog = Catalog::new();
        catalog.add(input("TO-1", "Toilets", 2_500, 3_500, 10), 5).unwrap();
        catalog.add(input("TO-2", "Toilets", 7_500, 9_500, 6), 5).unwrap();
        catalog.add(input("FA-1", "Taps", 800, 1_200, 15), 5).unwrap();

        // 1000 × 10 + 2000 × 6
        assert_eq!(catalog.category_profit("Toilets").cents(), 22_000);
        assert_eq!(catalog.category_profit("Taps").cents(), 6_000);
        assert_eq!(catalog.category_profit("Sinks").cents(), 0);
        assert_eq!(catalog.categories(), vec!["Toilets", "Taps"]);
    }

    #[test]
    fn test_search() {
        let mut catalog = Catalog::new();
        catalog.add(input("FA-102", "Taps", 800, 1_200, 15), 5).unwrap();
        catalog.add(input("SH-103", "Showers", 1_800, 2_500, 8), 5).unwrap();

        assert_eq!(catalog.search("fa-1").len(), 1);
        assert_eq!(catalog.search("SHOWERS").len(), 1);
        assert_eq!(catalog.search("product").len(), 2);
        assert_eq!(catalog.search("").len(), 2);
        assert!(catalog.search("zzz").is_empty());
    }

    #[test]
    fn test_restock() {
        let mut catalog = Catalog::new();
        let id = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().id.clone();

        assert_eq!(catalog.restock(&[id.clone(), "nope".to_string()], 10).unwrap(), 1);
        assert_eq!(catalog.get(&id).unwrap().qty, 11);
        assert!(catalog.restock(&[id], 0).is_err());
    }

    #[test]
    fn test_select_keeps_request_order() {
        let mut catalog = Catalog::new();
        let a = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().id.clone();
        let b = catalog.add(input("B-1", "Taps", 100, 200, 1), 5).unwrap().id.clone();

        let codes: Vec<&str> = catalog
            .select(&[b.clone(), a.clone(), b.clone()])
            .unwrap()
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        assert_eq!(codes, vec!["B-1", "A-1"]);

        assert!(matches!(
            catalog.select(&[a, "missing".to_string()]),
            Err(CoreError::ProductNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_restore_rechecks_stored_products() {
        let mut source = Catalog::new();
        source.add(input("TO-101", "Toilets", 2_500, 3_500, 10), 5).unwrap();
        source.add(input("FA-102", "Taps", 800, 1_200, 15), 3).unwrap();

        let restored = Catalog::restore(source.products().to_vec()).unwrap();
        assert_eq!(restored, source);

        let mut negative = source.products().to_vec();
        negative[0].qty = -3;
        assert!(matches!(
            Catalog::restore(negative),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));

        let mut underpriced = source.products().to_vec();
        underpriced[1].selling_price_cents = underpriced[1].buying_price_cents;
        assert!(Catalog::restore(underpriced).is_err());

        let mut duplicated = source.products().to_vec();
        duplicated[1].code = "TO-101".to_string();
        assert!(matches!(
            Catalog::restore(duplicated),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_restock_past_limit_changes_nothing() {
        let mut catalog = Catalog::new();
        let a = catalog.add(input("A-1", "Taps", 100, 200, 5), 5).unwrap().id.clone();
        let b = catalog
            .add(input("B-1", "Taps", 100, 200, validation::MAX_QTY - 1), 5)
            .unwrap()
            .id
            .clone();

        let err = catalog.restock(&[a.clone()], i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert_eq!(catalog.get(&a).unwrap().qty, 5);

        // B would pass the limit; A must not be topped up either.
        let err = catalog.restock(&[a.clone(), b.clone()], 10).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert_eq!(catalog.get(&a).unwrap().qty, 5);
        assert_eq!(catalog.get(&b).unwrap().qty, validation::MAX_QTY - 1);

        assert_eq!(catalog.restock(&[b.clone()], 1).unwrap(), 1);
        assert_eq!(catalog.get(&b).unwrap().qty, validation::MAX_QTY);
    }

    #[test]
    fn test_add_rejects_unbounded_stock_and_price() {
        let mut catalog = Catalog::new();

        let err = catalog
            .add(input("BIG-1", "Toilets", 500_000, 1_000_000, 10_000_000_000_000), 5)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = catalog
            .add(input("BIG-2", "Toilets", 0, i64::MAX, 1), 5)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));
        assert!(catalog.products().is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = Catalog::new();
        source.add(input("TO-101", "Toilets", 2_500, 3_500, 10), 5).unwrap();
        source.add(input("FA-102", "Taps", 800, 1_200, 15), 3).unwrap();

        let json = source.export_json().unwrap();
        let mut target = Catalog::new();
        assert_eq!(target.import_json(&json, 5).unwrap(), 2);

        assert_eq!(target, source);
    }

    #[test]
    fn test_import_upserts_by_id() {
        let mut catalog = Catalog::new();
        let mut p = catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap().clone();
        p.qty = 99;

        catalog
            .import(vec![p.clone().into(), input("B-1", "Taps", 100, 200, 1)], 5)
            .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(&p.id).unwrap().qty, 99);
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut catalog = Catalog::new();
        catalog.add(input("A-1", "Taps", 100, 200, 1), 5).unwrap();
        let before = catalog.clone();

        let err = catalog
            .import(
                vec![
                    input("B-1", "Taps", 100, 200, 1),
                    input("C-1", "Taps", 300, 200, 1),
                ],
                5,
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::Import(ref msg) if msg.starts_with("record 2")));
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.import_json("{\"not\": \"a list\"}", 5),
            Err(CoreError::Import(_))
        ));
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut catalog = Catalog::new();
        let id = catalog.add(input("A-1", "Taps", 100, 200, 3), 5).unwrap().id.clone();
        catalog.decrement_stock(&id, 5, Utc::now());
        assert_eq!(catalog.get(&id).unwrap().qty, 0);
    }
}
