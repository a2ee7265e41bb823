//! # Stock Alerts
//!
//! Advisory notices raised periodically while the till is open.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ Alert                │ Condition                                        │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ LowStock             │ 0 < qty <= reorder_level, at most once per       │
//! │                      │ product every 5 minutes                          │
//! │ PredictedStockOut    │ qty / (units_sold / 30) < 7 days                 │
//! │ SlowMover            │ last sale > 30 days ago, or never sold and       │
//! │                      │ created > 30 days ago                            │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! The tracker only remembers when each product last raised a low-stock
//! alert. The caller owns the clock and the timer.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::analytics::SLOW_MOVER_DAYS;
use crate::catalog::Catalog;
use crate::ledger::Ledger;

/// Window over which sales velocity is averaged.
const VELOCITY_WINDOW_DAYS: i64 = 30;

/// Stock expected to last fewer days than this raises a prediction.
const STOCK_OUT_HORIZON_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StockAlert {
    LowStock {
        product_id: String,
        name: String,
        qty: i64,
    },
    PredictedStockOut {
        product_id: String,
        name: String,
        days_left: i64,
    },
    SlowMover {
        product_id: String,
        name: String,
    },
}

impl StockAlert {
    pub fn product_id(&self) -> &str {
        match self {
            StockAlert::LowStock { product_id, .. }
            | StockAlert::PredictedStockOut { product_id, .. }
            | StockAlert::SlowMover { product_id, .. } => product_id,
        }
    }
}

impl fmt::Display for StockAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockAlert::LowStock { name, qty, .. } => {
                write!(f, "Low stock: {} has only {} units left", name, qty)
            }
            StockAlert::PredictedStockOut { name, days_left, .. } => {
                write!(f, "Prediction: {} may run out in {} days", name, days_left)
            }
            StockAlert::SlowMover { name, .. } => {
                write!(f, "Slow mover: {} hasn't sold in 30+ days", name)
            }
        }
    }
}

/// Evaluates alerts and suppresses repeated low-stock notices.
#[derive(Debug, Clone)]
pub struct AlertTracker {
    last_low_stock: HashMap<String, DateTime<Utc>>,
    suppression: Duration,
}

impl Default for AlertTracker {
    fn default() -> Self {
        AlertTracker::new()
    }
}

impl AlertTracker {
    pub fn new() -> Self {
        AlertTracker::with_suppression(Duration::minutes(5))
    }

    pub fn with_suppression(suppression: Duration) -> Self {
        AlertTracker {
            last_low_stock: HashMap::new(),
            suppression,
        }
    }

    /// Computes the alerts due at `now`.
    ///
    /// Ordered: predictions, then low stock, then slow movers.
    pub fn evaluate(&mut self, catalog: &Catalog, ledger: &Ledger, now: DateTime<Utc>) -> Vec<StockAlert> {
        let units = ledger.units_by_product();
        let mut predictions = Vec::new();
        let mut low = Vec::new();
        let mut slow = Vec::new();

        for product in catalog.products() {
            let sold = units.get(product.id.as_str()).copied().unwrap_or(0);

            // qty / (sold / 30) < 7  ⇔  qty · 30 < 7 · sold
            if product.qty > 0
                && sold > 0
                && product.qty * VELOCITY_WINDOW_DAYS < STOCK_OUT_HORIZON_DAYS * sold
            {
                let days_left = (product.qty * VELOCITY_WINDOW_DAYS + sold - 1) / sold;
                predictions.push(StockAlert::PredictedStockOut {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    days_left,
                });
            }

            if product.is_low_stock() {
                let due = self
                    .last_low_stock
                    .get(&product.id)
                    .map_or(true, |last| now - *last > self.suppression);
                if due {
                    self.last_low_stock.insert(product.id.clone(), now);
                    low.push(StockAlert::LowStock {
                        product_id: product.id.clone(),
                        name: product.name.clone(),
                        qty: product.qty,
                    });
                }
            }

            let idle_since = ledger.last_sold_at(&product.id).unwrap_or(product.created_at);
            if now - idle_since > Duration::days(SLOW_MOVER_DAYS) {
                slow.push(StockAlert::SlowMover {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                });
            }
        }

        predictions.extend(low);
        predictions.extend(slow);
        predictions
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
