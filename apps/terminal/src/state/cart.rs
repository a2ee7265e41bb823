//! # Cart State
//!
//! The open cart, shared across commands.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` so only one command mutates it at
//! a time. Operations that also need the catalog or ledger take the locks
//! in a fixed order:
//!
//! ```text
//! cart ──► catalog ──► ledger
//! ```
//!
//! Locks are plain `std::sync::Mutex` and are never held across `.await`.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use duka_core::{Cart, CartLine, CartTotals, TaxRate};

/// Cart contents plus totals at the configured tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartView {
    pub fn new(cart: &Cart, tax_rate: TaxRate) -> Self {
        CartView {
            lines: cart.lines().to_vec(),
            totals: cart.totals(tax_rate),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new(cart: Cart) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(cart)),
        }
    }

    /// Runs `f` with read access to the cart.
    ///
    /// ```rust,ignore
    /// let view = cart_state.with_cart(|cart| CartView::new(cart, rate));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Runs `f` with write access to the cart.
    ///
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| {
    ///     catalog_state.with_catalog(|catalog| cart.add_to_cart(catalog, "TO-101", 1))
    /// })?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }
}
