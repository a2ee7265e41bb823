//! # Change Notifications
//!
//! Every successful mutation publishes a [`StoreEvent`] on a broadcast
//! channel. Subscribers (the shell, the alert task, tests) receive the ones
//! sent after they subscribed; a slow subscriber lags rather than blocking
//! the publisher.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use duka_core::alerts::StockAlert;

/// Channel depth before slow subscribers start lagging.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreEvent {
    /// The product collection changed (add, update, delete, restock,
    /// import, checkout).
    ProductsChanged,
    /// A sale was appended.
    SaleRecorded { sale_id: String },
    CartChanged,
    SettingsChanged,
    StockAlert { alert: StockAlert },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publishes to current subscribers. Having none is fine.
    pub fn publish(&self, event: StoreEvent) {
        trace!(?event, "Publishing store event");
        let _ = self.tx.send(event);
    }
}
