//! # Ledger State

use std::sync::{Arc, Mutex, PoisonError};

use duka_core::{Ledger, Sale};

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    ledger: Arc<Mutex<Ledger>>,
}

impl LedgerState {
    pub fn new(ledger: Ledger) -> Self {
        LedgerState {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn with_ledger<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Ledger) -> R,
    {
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&ledger)
    }

    pub fn with_ledger_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Ledger) -> R,
    {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ledger)
    }

    pub fn snapshot(&self) -> Vec<Sale> {
        self.with_ledger(|l| l.sales().to_vec())
    }
}
