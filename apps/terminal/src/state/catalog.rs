//! # Catalog State
//!
//! The product collection behind a mutex, shared by commands and the alert
//! timer.

use std::sync::{Arc, Mutex, PoisonError};

use duka_core::Catalog;

#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    catalog: Arc<Mutex<Catalog>>,
}

impl CatalogState {
    pub fn new(catalog: Catalog) -> Self {
        CatalogState {
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Runs `f` with read access to the catalog.
    ///
    /// ```rust,ignore
    /// let count = catalog_state.with_catalog(|c| c.len());
    /// ```
    pub fn with_catalog<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Catalog) -> R,
    {
        let catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);
        f(&catalog)
    }

    /// Runs `f` with write access to the catalog.
    pub fn with_catalog_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Catalog) -> R,
    {
        let mut catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut catalog)
    }

    /// Copy of the product list, taken for persistence outside the lock.
    pub fn snapshot(&self) -> Vec<duka_core::Product> {
        self.with_catalog(|c| c.products().to_vec())
    }
}
