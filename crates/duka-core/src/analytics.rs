//! # Analytics Projection
//!
//! Read-only views derived from the catalog and the ledger. Nothing here is
//! stored; every view is recomputed on demand from the current data.
//!
//! ## Views
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog ──┬──► category_summaries   (stock, value, profit, revenue)   │
//! │            ├──► inventory_health     (0..100)                          │
//! │            └──► product_health       (0..100, per product)             │
//! │                                                                         │
//! │  Ledger ───┬──► daily_sales_trend    (fixed-length, oldest first)      │
//! │            └──► sales_stats          (filtered day + today)            │
//! │                                                                         │
//! │  Both ─────┬──► dashboard_summary                                      │
//! │            └──► stock_analysis                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::money::Money;
use crate::types::{Product, Sale};

/// Days shown by the dashboard sales trend.
pub const TREND_DAYS: usize = 30;

/// Length of the top-N lists.
pub const TOP_N: usize = 5;

/// Recent sales shown on the dashboard.
pub const RECENT_SALES: usize = 10;

/// A product unsold for longer than this is a slow mover.
pub const SLOW_MOVER_DAYS: i64 = 30;

// =============================================================================
// Category Summaries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub product_count: usize,
    pub stock_units: i64,
    /// Σ selling price × qty
    pub stock_value_cents: i64,
    /// Σ profit × qty
    pub profit_potential_cents: i64,
    /// Products with `qty <= reorder_level`, out-of-stock included.
    pub low_stock_count: usize,
    /// Σ line totals of sale lines recorded under this category.
    pub revenue_cents: i64,
}

pub fn category_summaries(catalog: &Catalog, ledger: &Ledger) -> Vec<CategorySummary> {
    catalog
        .categories()
        .into_iter()
        .map(|category| {
            let products: Vec<&Product> = catalog
                .products()
                .iter()
                .filter(|p| p.category == category)
                .collect();

            let revenue: Money = ledger
                .sales()
                .iter()
                .flat_map(|s| &s.items)
                .filter(|l| l.category == category)
                .map(|l| l.line_total())
                .sum();

            CategorySummary {
                category: category.to_string(),
                product_count: products.len(),
                stock_units: products.iter().fold(0, |acc: i64, p| acc.saturating_add(p.qty)),
                stock_value_cents: products.iter().map(|p| p.stock_value()).sum::<Money>().cents(),
                profit_potential_cents: products
                    .iter()
                    .map(|p| p.profit_potential())
                    .sum::<Money>()
                    .cents(),
                low_stock_count: products.iter().filter(|p| p.needs_reorder()).count(),
                revenue_cents: revenue.cents(),
            }
        })
        .collect()
}

// =============================================================================
// Health Scores
// =============================================================================

/// Whole-inventory health:
/// `max(0, 100 − 50·out/total − 25·low/total)`.
///
/// An empty catalog scores 100.
pub fn inventory_health(products: &[Product]) -> f64 {
    let total = products.len().max(1) as f64;
    let out = products.iter().filter(|p| p.is_out_of_stock()).count() as f64;
    let low = products.iter().filter(|p| p.is_low_stock()).count() as f64;

    (100.0 - out / total * 50.0 - low / total * 25.0).max(0.0)
}

/// Per-product health score in `0..=100`.
///
/// ```text
/// start                         100
/// qty == 0                      −40
/// else qty <= reorder_level     −20
/// never sold                    −30
/// else sold > 10 units          +20
/// margin > 50%                  +15
/// else margin < 20%             −10
/// clamp to [0, 100]
/// ```
///
/// An out-of-stock product never scores above 60, whatever its sales.
pub fn product_health(product: &Product, units_sold: i64) -> u8 {
    let mut score: i64 = 100;

    if product.is_out_of_stock() {
        score -= 40;
    } else if product.needs_reorder() {
        score -= 20;
    }

    if units_sold == 0 {
        score -= 30;
    } else if units_sold > 10 {
        score += 20;
    }

    if product.margin_above(50) {
        score += 15;
    } else if product.margin_below(20) {
        score -= 10;
    }

    let ceiling = if product.is_out_of_stock() { 60 } else { 100 };
    score.clamp(0, ceiling) as u8
}

// =============================================================================
// Sales Trend
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Sales totals for the `days` calendar days ending at `end_date`
/// (inclusive), oldest first. Days without sales are present with zero.
pub fn daily_sales_trend<Tz: TimeZone>(
    sales: &[Sale],
    tz: &Tz,
    end_date: NaiveDate,
    days: usize,
) -> Vec<DailyTotal> {
    let mut trend: Vec<DailyTotal> = (0..days)
        .rev()
        .map(|back| DailyTotal {
            date: end_date - Duration::days(back as i64),
            total_cents: 0,
        })
        .collect();

    let Some(first) = trend.first().map(|d| d.date) else {
        return trend;
    };

    for sale in sales {
        let day = sale.date.with_timezone(tz).date_naive();
        if day < first || day > end_date {
            continue;
        }
        let idx = (day - first).num_days() as usize;
        trend[idx].total_cents += sale.total_cents;
    }

    trend
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sales_cents: i64,
    pub order_count: usize,
    /// Integer division; 0 with no orders.
    pub average_order_value_cents: i64,
    pub product_count: usize,
    pub total_stock_value_cents: i64,
    pub profit_potential_cents: i64,
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    /// Top products by profit potential.
    pub top_products: Vec<Product>,
    /// Newest first.
    pub recent_sales: Vec<Sale>,
    pub categories: Vec<CategorySummary>,
    pub trend: Vec<DailyTotal>,
    pub inventory_health: f64,
}

pub fn dashboard_summary<Tz: TimeZone>(
    catalog: &Catalog,
    ledger: &Ledger,
    tz: &Tz,
    today: NaiveDate,
) -> DashboardSummary {
    let products = catalog.products();
    let total_sales: Money = ledger.sales().iter().map(Sale::total).sum();
    let order_count = ledger.len();
    let average = if order_count == 0 {
        0
    } else {
        total_sales.cents() / order_count as i64
    };

    let mut top_products: Vec<Product> = products.to_vec();
    top_products.sort_by_key(|p| std::cmp::Reverse(p.profit_potential()));
    top_products.truncate(TOP_N);

    DashboardSummary {
        total_sales_cents: total_sales.cents(),
        order_count,
        average_order_value_cents: average,
        product_count: products.len(),
        total_stock_value_cents: products.iter().map(Product::stock_value).sum::<Money>().cents(),
        profit_potential_cents: products
            .iter()
            .map(Product::profit_potential)
            .sum::<Money>()
            .cents(),
        low_stock: products.iter().filter(|p| p.is_low_stock()).cloned().collect(),
        out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).cloned().collect(),
        top_products,
        recent_sales: ledger.recent(RECENT_SALES).into_iter().cloned().collect(),
        categories: category_summaries(catalog, ledger),
        trend: daily_sales_trend(ledger.sales(), tz, today, TREND_DAYS),
        inventory_health: inventory_health(products),
    }
}

// =============================================================================
// Stock Analysis
// =============================================================================

/// A product with its sales figures attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInsight {
    pub product: Product,
    pub units_sold: i64,
    pub revenue_cents: i64,
    /// Whole days since the product last sold; `None` if it never has.
    pub days_since_last_sale: Option<i64>,
    pub margin_percent: f64,
    pub health_score: u8,
}

impl ProductInsight {
    pub fn new(product: &Product, ledger: &Ledger, now: DateTime<Utc>) -> Self {
        let units_sold = ledger.units_sold(&product.id);
        ProductInsight {
            product: product.clone(),
            units_sold,
            revenue_cents: ledger.revenue(&product.id).cents(),
            days_since_last_sale: ledger
                .last_sold_at(&product.id)
                .map(|last| (now - last).num_days()),
            margin_percent: product.margin_percent(),
            health_score: product_health(product, units_sold),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    /// `0 < qty <= reorder_level`
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
    /// `qty > reorder_level`
    pub healthy: Vec<Product>,
    /// Σ buying price × qty
    pub inventory_value_cents: i64,
    pub profit_potential_cents: i64,
    pub top_sellers: Vec<ProductInsight>,
    /// Sold before, but not in the last 30 days.
    pub slow_movers: Vec<ProductInsight>,
    pub best_margins: Vec<ProductInsight>,
    pub healthiest: Vec<ProductInsight>,
    pub inventory_health: f64,
}

pub fn stock_analysis(catalog: &Catalog, ledger: &Ledger, now: DateTime<Utc>) -> StockAnalysis {
    let products = catalog.products();
    let insights: Vec<ProductInsight> = products
        .iter()
        .map(|p| ProductInsight::new(p, ledger, now))
        .collect();

    let top = |cmp: fn(&ProductInsight, &ProductInsight) -> Ordering| {
        let mut sorted = insights.clone();
        sorted.sort_by(cmp);
        sorted.truncate(TOP_N);
        sorted
    };

    StockAnalysis {
        low_stock: products.iter().filter(|p| p.is_low_stock()).cloned().collect(),
        out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).cloned().collect(),
        healthy: products.iter().filter(|p| !p.needs_reorder()).cloned().collect(),
        inventory_value_cents: products.iter().map(Product::cost_value).sum::<Money>().cents(),
        profit_potential_cents: products
            .iter()
            .map(Product::profit_potential)
            .sum::<Money>()
            .cents(),
        top_sellers: top(|a, b| b.revenue_cents.cmp(&a.revenue_cents)),
        slow_movers: insights
            .iter()
            .filter(|i| i.days_since_last_sale.is_some_and(|d| d > SLOW_MOVER_DAYS))
            .cloned()
            .collect(),
        best_margins: top(|a, b| compare_margin(&b.product, &a.product)),
        healthiest: top(|a, b| b.health_score.cmp(&a.health_score)),
        inventory_health: inventory_health(products),
    }
}

/// Orders products by margin without going through floats:
/// `pa/sa` vs `pb/sb` ⇔ `pa·sb` vs `pb·sa` (selling prices are positive).
fn compare_margin(a: &Product, b: &Product) -> Ordering {
    let lhs = a.profit().cents() as i128 * b.selling_price_cents as i128;
    let rhs = b.profit().cents() as i128 * a.selling_price_cents as i128;
    lhs.cmp(&rhs)
}

// =============================================================================
// Sales Stats
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub revenue_cents: i64,
    pub profit_cents: i64,
    pub units: i64,
    pub transaction_count: usize,
    pub today_revenue_cents: i64,
    pub today_transactions: usize,
}

/// Figures for the sales page: the filtered set (one day, or everything)
/// plus today's figures regardless of the filter.
pub fn sales_stats<Tz: TimeZone>(
    ledger: &Ledger,
    filter_date: Option<NaiveDate>,
    today: NaiveDate,
    tz: &Tz,
) -> SalesStats {
    let filtered: Vec<&Sale> = match filter_date {
        Some(d) => ledger.sales_on(d, tz),
        None => ledger.sales().iter().collect(),
    };
    let todays = ledger.sales_on(today, tz);

    SalesStats {
        revenue_cents: filtered.iter().map(|s| s.total_cents).sum(),
        profit_cents: filtered.iter().map(|s| s.total_profit_cents).sum(),
        units: filtered.iter().map(|s| s.unit_count()).sum(),
        transaction_count: filtered.len(),
        today_revenue_cents: todays.iter().map(|s| s.total_cents).sum(),
        today_transactions: todays.len(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
