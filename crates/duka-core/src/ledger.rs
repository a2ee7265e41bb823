//! # Sale Ledger
//!
//! Append-only list of completed sales, oldest first.
//!
//! Sales are never edited or removed; the only writer is checkout.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Sale, SaleLine};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    sales: Vec<Sale>,
}

/// One page of the sales history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage<'a> {
    pub sales: Vec<&'a Sale>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty history.
    pub total_pages: usize,
    /// Sales matching the filter across all pages.
    pub total_matches: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn from_sales(sales: Vec<Sale>) -> Self {
        Ledger { sales }
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    /// Appends a completed sale.
    pub fn append(&mut self, sale: Sale) {
        self.sales.push(sale);
    }

    /// The last `n` sales, newest first.
    pub fn recent(&self, n: usize) -> Vec<&Sale> {
        self.sales.iter().rev().take(n).collect()
    }

    /// Sales whose timestamp falls on `date` in the given timezone.
    pub fn sales_on<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> Vec<&Sale> {
        self.sales
            .iter()
            .filter(|s| s.date.with_timezone(tz).date_naive() == date)
            .collect()
    }

    /// Sales history: optionally filtered to one calendar day, newest first,
    /// split into pages of `page_size`.
    ///
    /// ```text
    /// 11 sales, page_size 8
    ///   page 1 → newest 8
    ///   page 2 → remaining 3
    ///   page 9 → clamped to page 2
    /// ```
    pub fn history<Tz: TimeZone>(
        &self,
        date: Option<NaiveDate>,
        tz: &Tz,
        page: usize,
        page_size: usize,
    ) -> HistoryPage<'_> {
        let mut matches: Vec<&Sale> = match date {
            Some(d) => self.sales_on(d, tz),
            None => self.sales.iter().collect(),
        };
        // stable sort keeps append order among equal timestamps; reverse after
        matches.sort_by_key(|s| s.date);
        matches.reverse();

        let page_size = page_size.max(1);
        let total_matches = matches.len();
        let total_pages = total_matches.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let sales = matches
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        HistoryPage {
            sales,
            page,
            total_pages,
            total_matches,
        }
    }

    /// Total units of a product across every sale.
    pub fn units_sold(&self, product_id: &str) -> i64 {
        self.lines_for(product_id).map(|l| l.quantity).sum()
    }

    /// Revenue (line totals, before tax) of a product across every sale.
    pub fn revenue(&self, product_id: &str) -> Money {
        self.lines_for(product_id).map(|l| l.line_total()).sum()
    }

    /// Timestamp of the most recent sale containing the product.
    pub fn last_sold_at(&self, product_id: &str) -> Option<DateTime<Utc>> {
        self.sales
            .iter()
            .filter(|s| s.items.iter().any(|l| l.product_id == product_id))
            .map(|s| s.date)
            .max()
    }

    /// Units sold per product id, in one pass.
    pub fn units_by_product(&self) -> HashMap<&str, i64> {
        let mut units = HashMap::new();
        for line in self.sales.iter().flat_map(|s| &s.items) {
            *units.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
        }
        units
    }

    fn lines_for<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a SaleLine> {
        self.sales
            .iter()
            .flat_map(|s| &s.items)
            .filter(move |l| l.product_id == product_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleStatus};
    use chrono::Duration;

    fn sale(id: &str, date: DateTime<Utc>, product_id: &str, qty: i64, price: i64) -> Sale {
        Sale {
            id: id.to_string(),
            items: vec![SaleLine {
                product_id: product_id.to_string(),
                name: "Item".to_string(),
                code: "IT-1".to_string(),
                category: "Misc".to_string(),
                quantity: qty,
                unit_price_cents: price,
                line_total_cents: price * qty,
                line_profit_cents: 0,
            }],
            subtotal_cents: price * qty,
            tax_rate_bps: 0,
            tax_cents: 0,
            total_cents: price * qty,
            total_profit_cents: 0,
            customer_name: "Walk-in Customer".to_string(),
            payment_method: PaymentMethod::Cash,
            date,
            status: SaleStatus::Completed,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_append_and_recent() {
        let mut ledger = Ledger::new();
        ledger.append(sale("S1", at(2024, 3, 1, 9), "p1", 1, 100));
        ledger.append(sale("S2", at(2024, 3, 1, 10), "p1", 1, 100));
        ledger.append(sale("S3", at(2024, 3, 2, 9), "p2", 1, 100));

        let ids: Vec<&str> = ledger.recent(2).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S3", "S2"]);
        assert_eq!(ledger.recent(10).len(), 3);
        assert!(ledger.get("S2").is_some());
    }

    #[test]
    fn test_history_filters_and_paginates() {
        let mut ledger = Ledger::new();
        let start = at(2024, 3, 1, 8);
        for i in 0..11 {
            ledger.append(sale(&format!("S{}", i), start + Duration::minutes(i), "p1", 1, 100));
        }
        ledger.append(sale("OTHER", at(2024, 3, 2, 8), "p1", 1, 100));

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let first = ledger.history(Some(day), &Utc, 1, 8);
        assert_eq!(first.total_matches, 11);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.sales.len(), 8);
        assert_eq!(first.sales[0].id, "S10");

        let second = ledger.history(Some(day), &Utc, 2, 8);
        assert_eq!(second.sales.len(), 3);
        assert_eq!(second.sales[2].id, "S0");

        let clamped = ledger.history(Some(day), &Utc, 99, 8);
        assert_eq!(clamped.page, 2);

        let all = ledger.history(None, &Utc, 1, 8);
        assert_eq!(all.total_matches, 12);
        assert_eq!(all.sales[0].id, "OTHER");
    }

    #[test]
    fn test_history_of_empty_ledger() {
        let ledger = Ledger::new();
        let page = ledger.history(None, &Utc, 1, 8);
        assert!(page.sales.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_per_product_lookups() {
        let mut ledger = Ledger::new();
        ledger.append(sale("S1", at(2024, 3, 1, 9), "p1", 2, 150));
        ledger.append(sale("S2", at(2024, 3, 5, 9), "p1", 3, 150));
        ledger.append(sale("S3", at(2024, 3, 3, 9), "p2", 1, 999));

        assert_eq!(ledger.units_sold("p1"), 5);
        assert_eq!(ledger.revenue("p1").cents(), 750);
        assert_eq!(ledger.last_sold_at("p1"), Some(at(2024, 3, 5, 9)));
        assert_eq!(ledger.last_sold_at("p3"), None);
        assert_eq!(ledger.units_by_product().get("p2"), Some(&1));
    }
}
