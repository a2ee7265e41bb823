//! # Stock Alert Monitor
//!
//! Background task that periodically evaluates stock alerts and publishes
//! them as `StoreEvent::StockAlert`. Advisory only: it reads state and never
//! mutates the catalog or ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AlertMonitor::run                                                      │
//! │                                                                         │
//! │  loop select!                                                           │
//! │    interval.tick()  ──► low_stock_alert enabled?                        │
//! │                            │ yes                                        │
//! │                            ▼                                            │
//! │                    AlertTracker::evaluate(catalog, ledger, now)         │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                    warn! + publish each alert                           │
//! │                                                                         │
//! │    shutdown_rx     ──► break                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The period is read from settings when the monitor is created.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, CatalogState, EventBus, LedgerState, SettingsState, StoreEvent};
use duka_core::alerts::{AlertTracker, StockAlert};

pub struct AlertMonitor {
    catalog: CatalogState,
    ledger: LedgerState,
    settings: SettingsState,
    events: EventBus,
    tracker: AlertTracker,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running monitor.
#[derive(Debug, Clone)]
pub struct AlertMonitorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl AlertMonitorHandle {
    /// Asks the monitor to stop after its current evaluation.
    pub async fn shutdown(&self) -> ApiResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ApiError::internal("Alert monitor already stopped"))
    }
}

impl AlertMonitor {
    pub fn new(state: &AppState) -> (Self, AlertMonitorHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let period = Duration::from_secs(state.settings.get().alert_interval_secs.max(1));

        let monitor = AlertMonitor {
            catalog: state.catalog.clone(),
            ledger: state.ledger.clone(),
            settings: state.settings.clone(),
            events: state.events.clone(),
            tracker: AlertTracker::new(),
            period,
            shutdown_rx,
        };

        (monitor, AlertMonitorHandle { shutdown_tx })
    }

    /// Runs until shut down. Spawn this as a background task.
    pub async fn run(mut self) {
        info!(period_secs = self.period.as_secs(), "Alert monitor starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let alerts = self.check();
                    debug!(count = alerts.len(), "Stock alerts evaluated");
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Alert monitor shutting down");
                    break;
                }
            }
        }

        info!("Alert monitor stopped");
    }

    /// Evaluates alerts once and publishes the ones due.
    ///
    /// Does nothing while low-stock alerts are switched off in settings.
    pub fn check(&mut self) -> Vec<StockAlert> {
        if !self.settings.get().low_stock_alert {
            return Vec::new();
        }

        let now = Utc::now();
        let tracker = &mut self.tracker;
        let alerts = self
            .catalog
            .with_catalog(|c| self.ledger.with_ledger(|l| tracker.evaluate(c, l, now)));

        for alert in &alerts {
            warn!(product_id = %alert.product_id(), "{}", alert);
            self.events.publish(StoreEvent::StockAlert {
                alert: alert.clone(),
            });
        }
        alerts
    }
}
