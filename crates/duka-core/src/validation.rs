//! # Validation Module
//!
//! Input validation for products, quantities and settings.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                     │
//! │  ├── Basic format checks (empty fields, numeric inputs)                │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization (serde)                                      │
//! │  └── Types: integers are integers, dates are dates                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  ├── Required fields present                                           │
//! │  ├── selling price > buying price                                      │
//! │  └── quantities and levels non-negative                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use duka_core::validation::{validate_code, validate_quantity};
//!
//! assert!(validate_code("TO-101").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Product;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Most units a product can hold, and the most a single cart or restock
/// request can ask for.
pub const MAX_QTY: i64 = 1_000_000;

/// Highest buying or selling price, in cents (100 million major units).
///
/// With [`MAX_QTY`] this keeps `price × qty` for any product or line at or
/// below 10^16 cents.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Returns the trimmed value of a required text field.
///
/// ```rust
/// use duka_core::validation::require_text;
///
/// assert_eq!(require_text("name", Some("  Faucet ")).unwrap(), "Faucet");
/// assert!(require_text("name", Some("   ")).is_err());
/// assert!(require_text("name", None).is_err());
/// ```
pub fn require_text(field: &str, value: Option<&str>) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, numbers, hyphens and underscores only
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed. Empty means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested cart quantity.
///
/// ## User Workflow
/// ```text
/// Cashier enters quantity: 0
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      ▼
/// Error: "quantity must be positive"
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QTY {
        return Err(out_of_range("quantity", 1, MAX_QTY));
    }

    Ok(())
}

/// Validates that a count or level is zero or more.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock count or reorder level: `0..=MAX_QTY`.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    validate_non_negative(field, value)?;
    if value > MAX_QTY {
        return Err(out_of_range(field, 0, MAX_QTY));
    }
    Ok(())
}

fn out_of_range(field: &str, min: i64, max: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max,
    }
}

/// Validates a buying/selling price pair.
///
/// ## Rules
/// - Both prices within `0..=MAX_PRICE_CENTS`
/// - Selling price must be strictly greater than buying price
///
/// ```rust
/// use duka_core::validation::validate_prices;
///
/// assert!(validate_prices(250_000, 350_000).is_ok());
/// assert!(validate_prices(350_000, 350_000).is_err());
/// ```
pub fn validate_prices(buying_cents: i64, selling_cents: i64) -> ValidationResult<()> {
    for (field, cents) in [("buying price", buying_cents), ("selling price", selling_cents)] {
        validate_non_negative(field, cents)?;
        if cents > MAX_PRICE_CENTS {
            return Err(out_of_range(field, 0, MAX_PRICE_CENTS));
        }
    }

    if selling_cents <= buying_cents {
        return Err(ValidationError::PriceNotAboveCost {
            buying: buying_cents,
            selling: selling_cents,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points: 0 to 10000 (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates every invariant of a fully-populated product.
///
/// Applied by catalog add, update, import and restore alike.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }
    validate_code(&product.code)?;
    validate_product_name(&product.name)?;
    if product.category.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }
    validate_prices(product.buying_price_cents, product.selling_price_cents)?;
    validate_stock_level("qty", product.qty)?;
    validate_stock_level("reorder level", product.reorder_level)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
