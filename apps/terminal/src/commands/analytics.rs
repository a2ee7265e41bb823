//! # Analytics Commands
//!
//! Read-only views recomputed on every call from the live catalog and
//! ledger. Calendar days are the machine's local days.

use chrono::{Local, NaiveDate, Utc};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{CatalogState, LedgerState};
use duka_core::analytics::{
    self, CategorySummary, DailyTotal, DashboardSummary, ProductInsight, SalesStats,
    StockAnalysis,
};

/// Longest trend the shell will compute.
pub const MAX_TREND_DAYS: usize = 366;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn dashboard(catalog: &CatalogState, ledger: &LedgerState) -> DashboardSummary {
    debug!("dashboard command");
    catalog.with_catalog(|c| {
        ledger.with_ledger(|l| analytics::dashboard_summary(c, l, &Local, today()))
    })
}

pub fn stock_analysis(catalog: &CatalogState, ledger: &LedgerState) -> StockAnalysis {
    debug!("stock_analysis command");
    catalog.with_catalog(|c| ledger.with_ledger(|l| analytics::stock_analysis(c, l, Utc::now())))
}

/// Revenue, profit and units for all sales or one local day.
pub fn sales_stats(ledger: &LedgerState, date: Option<NaiveDate>) -> SalesStats {
    ledger.with_ledger(|l| analytics::sales_stats(l, date, today(), &Local))
}

pub fn category_summaries(catalog: &CatalogState, ledger: &LedgerState) -> Vec<CategorySummary> {
    catalog.with_catalog(|c| ledger.with_ledger(|l| analytics::category_summaries(c, l)))
}

/// Per-day totals for the last `days` days, oldest first.
pub fn sales_trend(ledger: &LedgerState, days: usize) -> ApiResult<Vec<DailyTotal>> {
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(ApiError::validation(format!(
            "days must be between 1 and {}",
            MAX_TREND_DAYS
        )));
    }
    Ok(ledger.with_ledger(|l| analytics::daily_sales_trend(l.sales(), &Local, today(), days)))
}

/// Health details for one product.
pub fn product_insight(
    catalog: &CatalogState,
    ledger: &LedgerState,
    id: &str,
) -> ApiResult<ProductInsight> {
    catalog.with_catalog(|c| {
        let product = c.get(id).ok_or_else(|| ApiError::not_found("Product", id))?;
        Ok(ledger.with_ledger(|l| ProductInsight::new(product, l, Utc::now())))
    })
}
