//! # Receipt Rendering
//!
//! Turns a completed [`Sale`] into a fixed-width plain-text receipt.
//!
//! ```text
//!                POS RECEIPT
//!              Business POS
//! ----------------------------------------
//! Receipt: SALE-20240310090000-3FA9C
//! Date: 2024-03-10 12:00
//! Customer: Walk-in Customer
//! ----------------------------------------
//! Toilet Seat
//!   2 x KES 3500.00            KES 7000.00
//! ----------------------------------------
//! Subtotal:                    KES 7000.00
//! Tax (16%):                   KES 1120.00
//! TOTAL:                       KES 8120.00
//! Payment: CASH
//! ----------------------------------------
//!       Thank you for your business!
//! ```
//!
//! Printing is somebody else's job; this only produces the text.

use std::fmt::{Display, Write};

use chrono::TimeZone;

use crate::money::Money;
use crate::types::{Sale, TaxRate};

/// Characters per receipt line.
pub const RECEIPT_WIDTH: usize = 40;

pub const DEFAULT_FOOTER: &str = "Thank you for your business!";

/// Shop details and preferences printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptOptions {
    pub business_name: String,
    pub business_address: String,
    pub business_phone: String,
    /// Prefix for every amount, e.g. `KES`.
    pub currency: String,
    pub footer: String,
    pub show_tax: bool,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        ReceiptOptions {
            business_name: String::new(),
            business_address: String::new(),
            business_phone: String::new(),
            currency: "KES".to_string(),
            footer: DEFAULT_FOOTER.to_string(),
            show_tax: true,
        }
    }
}

/// Renders the receipt, showing the sale time in `tz`.
pub fn render_receipt<Tz>(sale: &Sale, options: &ReceiptOptions, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rule = "-".repeat(RECEIPT_WIDTH);
    let amount = |m: Money| format!("{} {}", options.currency, m);
    let mut out = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(out, "{}", center("POS RECEIPT"));
    for header in [
        &options.business_name,
        &options.business_address,
        &options.business_phone,
    ] {
        if !header.trim().is_empty() {
            let _ = writeln!(out, "{}", center(header.trim()));
        }
    }
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "Receipt: {}", sale.id);
    let _ = writeln!(
        out,
        "Date: {}",
        sale.date.with_timezone(tz).format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(out, "Customer: {}", sale.customer_name);
    let _ = writeln!(out, "{}", rule);

    for line in &sale.items {
        let _ = writeln!(out, "{}", line.name);
        let left = format!("  {} x {}", line.quantity, amount(line.unit_price()));
        let _ = writeln!(out, "{}", columns(&left, &amount(line.line_total())));
    }
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "{}", columns("Subtotal:", &amount(sale.subtotal())));
    if options.show_tax {
        let label = format!("Tax ({}):", format_rate(sale.tax_rate()));
        let _ = writeln!(out, "{}", columns(&label, &amount(sale.tax())));
    }
    let _ = writeln!(out, "{}", columns("TOTAL:", &amount(sale.total())));
    let _ = writeln!(
        out,
        "Payment: {}",
        sale.payment_method.as_str().to_uppercase()
    );
    let _ = writeln!(out, "{}", rule);

    let footer = if options.footer.trim().is_empty() {
        DEFAULT_FOOTER
    } else {
        options.footer.trim()
    };
    let _ = writeln!(out, "{}", center(footer));

    out
}

/// `1600` → `16%`, `825` → `8.25%`, `1650` → `16.5%`
pub fn format_rate(rate: TaxRate) -> String {
    let bps = rate.bps();
    if bps % 100 == 0 {
        return format!("{}%", bps / 100);
    }
    let text = format!("{}.{:02}", bps / 100, bps % 100);
    format!("{}%", text.trim_end_matches('0'))
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((RECEIPT_WIDTH - len) / 2), text)
}

/// Left text, right text flush to the receipt edge, at least one space apart.
fn columns(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = RECEIPT_WIDTH.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

// =============================================================================
// Unit Tests
// =============================================================================
