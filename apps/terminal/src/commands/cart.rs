//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌──────────┐  add_to_cart   ┌──────────┐  checkout (sale.rs)  ┌──────────┐
//! │  Empty   │───────────────►│ In Cart  │─────────────────────►│   Sale   │
//! └──────────┘                └──────────┘                      └──────────┘
//!      ▲                        │  update_cart_line / increment / decrement
//!      │                        │  remove_from_cart
//!      └──────── clear_cart ────┘
//! ```
//!
//! Every command answers with the resulting [`CartView`]. Mutations persist
//! the cart under `pos_cart` and publish `CartChanged`.

use tracing::debug;

use crate::error::ApiResult;
use crate::state::{CartState, CartView, CatalogState, DbState, EventBus, SettingsState, StoreEvent};
use duka_core::{Cart, Catalog, CoreResult};
use duka_db::keys;

/// Runs a cart mutation that needs the live catalog, then persists.
async fn mutate<F, R>(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    f: F,
) -> ApiResult<(R, CartView)>
where
    F: FnOnce(&mut Cart, &Catalog) -> CoreResult<R>,
{
    let tax_rate = settings.tax_rate();
    let (result, view, snapshot) = cart.with_cart_mut(|cart| {
        let result = catalog.with_catalog(|c| f(cart, c))?;
        CoreResult::Ok((result, CartView::new(cart, tax_rate), cart.clone()))
    })?;

    db.persist(keys::CART, &snapshot).await;
    events.publish(StoreEvent::CartChanged);
    Ok((result, view))
}

pub fn get_cart(cart: &CartState, settings: &SettingsState) -> CartView {
    let tax_rate = settings.tax_rate();
    cart.with_cart(|c| CartView::new(c, tax_rate))
}

/// Adds `qty` of the product with `code`, merging into an existing line.
///
/// ## Errors
/// - `VALIDATION_ERROR` when `qty < 1`
/// - `NOT_FOUND` for an unknown code
/// - `INSUFFICIENT_STOCK` when stock (minus what the cart holds) is short
pub async fn add_to_cart(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    code: &str,
    qty: i64,
) -> ApiResult<CartView> {
    debug!(code = %code, qty, "add_to_cart command");
    let (_line_id, view) = mutate(db, catalog, cart, settings, events, |cart, c| {
        cart.add_to_cart(c, code, qty)
    })
    .await?;
    Ok(view)
}

/// Sets a line's quantity. Below 1 removes the line.
pub async fn update_cart_line(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    line_id: &str,
    qty: i64,
) -> ApiResult<CartView> {
    debug!(line_id = %line_id, qty, "update_cart_line command");
    let ((), view) = mutate(db, catalog, cart, settings, events, |cart, c| {
        cart.change_quantity(c, line_id, qty)
    })
    .await?;
    Ok(view)
}

pub async fn increment_line(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    line_id: &str,
) -> ApiResult<CartView> {
    let ((), view) = mutate(db, catalog, cart, settings, events, |cart, c| {
        cart.increment_quantity(c, line_id)
    })
    .await?;
    Ok(view)
}

/// Decrements a line. A line at quantity 1 stays; use remove.
pub async fn decrement_line(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    line_id: &str,
) -> ApiResult<CartView> {
    let ((), view) = mutate(db, catalog, cart, settings, events, |cart, c| {
        cart.decrement_quantity(c, line_id)
    })
    .await?;
    Ok(view)
}

pub async fn remove_from_cart(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    line_id: &str,
) -> ApiResult<CartView> {
    debug!(line_id = %line_id, "remove_from_cart command");
    let (_removed, view) = mutate(db, catalog, cart, settings, events, |cart, _| {
        Ok(cart.remove_line(line_id))
    })
    .await?;
    Ok(view)
}

pub async fn clear_cart(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
) -> ApiResult<CartView> {
    debug!("clear_cart command");
    let ((), view) = mutate(db, catalog, cart, settings, events, |cart, _| {
        cart.clear();
        Ok(())
    })
    .await?;
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::AppState;
    use duka_db::{Database, DbConfig};

    async fn app() -> AppState {
        AppState::load(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    async fn add(app: &AppState, code: &str, qty: i64) -> ApiResult<CartView> {
        add_to_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, code, qty).await
    }

    #[tokio::test]
    async fn test_add_merges_and_totals() {
        let app = app().await;
        add(&app, "FA-102", 3).await.unwrap();
        let view = add(&app, "FA-102", 2).await.unwrap();

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].qty, 5);
        // 5 × 1200.00 = 6000.00, 16% = 960.00
        assert_eq!(view.totals.subtotal_cents, 600_000);
        assert_eq!(view.totals.tax_cents, 96_000);
        assert_eq!(view.totals.total_cents, 696_000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_cart_empty() {
        let app = app().await;
        let err = add(&app, "SI-104", 6).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(get_cart(&app.cart, &app.settings).lines.is_empty());
    }

    #[tokio::test]
    async fn test_cart_persisted_after_mutation() {
        let app = app().await;
        add(&app, "TO-101", 2).await.unwrap();

        let stored: Cart = app.db.kv().load_as(keys::CART).await.unwrap().unwrap();
        assert_eq!(stored.lines().len(), 1);
        assert_eq!(stored.lines()[0].qty, 2);
    }

    #[tokio::test]
    async fn test_line_quantity_commands() {
        let app = app().await;
        let view = add(&app, "TO-101", 1).await.unwrap();
        let line_id = view.lines[0].line_id.clone();

        let view = increment_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id)
            .await
            .unwrap();
        assert_eq!(view.lines[0].qty, 2);

        let view = update_cart_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id, 7)
            .await
            .unwrap();
        assert_eq!(view.lines[0].qty, 7);

        let err = update_cart_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id, 11)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let view = decrement_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id)
            .await
            .unwrap();
        assert_eq!(view.lines[0].qty, 6);

        update_cart_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id, 1)
            .await
            .unwrap();
        // decrement stops at 1
        let view = decrement_line(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id)
            .await
            .unwrap();
        assert_eq!(view.lines[0].qty, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let app = app().await;
        let view = add(&app, "TO-101", 1).await.unwrap();
        add(&app, "FA-102", 1).await.unwrap();
        let line_id = view.lines[0].line_id.clone();

        let view = remove_from_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id)
            .await
            .unwrap();
        assert_eq!(view.lines.len(), 1);

        // removing again is a no-op
        let view = remove_from_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, &line_id)
            .await
            .unwrap();
        assert_eq!(view.lines.len(), 1);

        let view = clear_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events)
            .await
            .unwrap();
        assert!(view.lines.is_empty());
        assert_eq!(view.totals.total_cents, 0);
    }
}
