//! # Sale Commands
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(method, customer)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock cart → catalog → ledger                                           │
//! │       │    Cart::checkout: validate all lines, decrement stock,         │
//! │       │    append sale, clear cart (all or nothing)                     │
//! │       ▼                                                                 │
//! │  release locks, clone snapshots                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  persist products, sales, pos_cart        (failures logged only)        │
//! │  publish ProductsChanged, SaleRecorded, CartChanged                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  render receipt if printing is enabled                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{
    CartState, CatalogState, DbState, EventBus, LedgerState, SettingsState, StoreEvent,
};
use duka_core::receipt::render_receipt;
use duka_core::{CheckoutRequest, PaymentMethod, Sale, HISTORY_PAGE_SIZE};
use duka_db::keys;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale: Sale,
    /// Present when receipt printing is enabled.
    pub receipt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesHistoryResponse {
    pub sales: Vec<Sale>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

/// Completes the sale for the current cart.
///
/// `method` defaults to the configured payment method; a blank or absent
/// customer is recorded as the walk-in customer.
#[allow(clippy::too_many_arguments)]
pub async fn checkout(
    db: &DbState,
    catalog: &CatalogState,
    ledger: &LedgerState,
    cart: &CartState,
    settings: &SettingsState,
    events: &EventBus,
    method: Option<PaymentMethod>,
    customer: Option<String>,
) -> ApiResult<CheckoutResponse> {
    debug!(?method, ?customer, "checkout command");

    let config = settings.get();
    let mut request = CheckoutRequest::new(config.tax_rate())
        .with_payment_method(method.unwrap_or(config.default_payment_method));
    if let Some(name) = customer {
        request = request.with_customer(name);
    }

    let (sale, products, sales, cart_snapshot) = cart.with_cart_mut(|cart| {
        catalog.with_catalog_mut(|catalog| {
            ledger.with_ledger_mut(|ledger| {
                let sale = cart.checkout(catalog, ledger, request)?;
                Ok::<_, ApiError>((
                    sale,
                    catalog.products().to_vec(),
                    ledger.sales().to_vec(),
                    cart.clone(),
                ))
            })
        })
    })?;

    info!(
        sale_id = %sale.id,
        total = %sale.total(),
        lines = sale.items.len(),
        method = %sale.payment_method,
        "Sale completed"
    );

    db.persist(keys::PRODUCTS, &products).await;
    db.persist(keys::SALES, &sales).await;
    db.persist(keys::CART, &cart_snapshot).await;

    events.publish(StoreEvent::ProductsChanged);
    events.publish(StoreEvent::SaleRecorded {
        sale_id: sale.id.clone(),
    });
    events.publish(StoreEvent::CartChanged);

    let receipt = config
        .print_receipt
        .then(|| render_receipt(&sale, &config.receipt_options(), &Local));

    Ok(CheckoutResponse { sale, receipt })
}

/// One page of sales history, newest first, optionally limited to one
/// local calendar day.
pub fn sales_history(
    ledger: &LedgerState,
    date: Option<NaiveDate>,
    page: usize,
) -> SalesHistoryResponse {
    ledger.with_ledger(|l| {
        let page = l.history(date, &Local, page, HISTORY_PAGE_SIZE);
        SalesHistoryResponse {
            sales: page.sales.into_iter().cloned().collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_matches: page.total_matches,
        }
    })
}

pub fn get_sale(ledger: &LedgerState, id: &str) -> ApiResult<Sale> {
    ledger
        .with_ledger(|l| l.get(id).cloned())
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

/// Re-renders the receipt of a past sale with the current settings.
pub fn sale_receipt(ledger: &LedgerState, settings: &SettingsState, id: &str) -> ApiResult<String> {
    let sale = get_sale(ledger, id)?;
    Ok(render_receipt(&sale, &settings.get().receipt_options(), &Local))
}

pub fn recent_sales(ledger: &LedgerState, n: usize) -> Vec<Sale> {
    ledger.with_ledger(|l| l.recent(n).into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart};
    use crate::error::ErrorCode;
    use crate::state::AppState;
    use duka_core::{Cart, Product};
    use duka_db::{Database, DbConfig};

    async fn app() -> AppState {
        AppState::load(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    async fn add(app: &AppState, code: &str, qty: i64) {
        add_to_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, code, qty)
            .await
            .unwrap();
    }

    async fn pay(app: &AppState, method: Option<PaymentMethod>) -> ApiResult<CheckoutResponse> {
        checkout(
            &app.db,
            &app.catalog,
            &app.ledger,
            &app.cart,
            &app.settings,
            &app.events,
            method,
            None,
        )
        .await
    }

    fn qty_of(app: &AppState, code: &str) -> i64 {
        app.catalog.with_catalog(|c| c.find_by_code(code).map(|p| p.qty).unwrap_or(-1))
    }

    #[tokio::test]
    async fn test_checkout_persists_everything() {
        let app = app().await;
        add(&app, "TO-101", 2).await;
        add(&app, "FA-102", 1).await;

        let response = pay(&app, Some(PaymentMethod::Mobile)).await.unwrap();
        let sale = &response.sale;

        // 2 × 3500 + 1200 = 8200.00, 16% = 1312.00
        assert_eq!(sale.subtotal_cents, 820_000);
        assert_eq!(sale.tax_cents, 131_200);
        assert_eq!(sale.total_cents, 951_200);
        assert_eq!(sale.customer_name, duka_core::WALK_IN_CUSTOMER);
        assert_eq!(qty_of(&app, "TO-101"), 8);
        assert_eq!(qty_of(&app, "FA-102"), 14);
        assert!(get_cart(&app.cart, &app.settings).lines.is_empty());

        let kv = app.db.kv();
        let products: Vec<Product> = kv.load_as(keys::PRODUCTS).await.unwrap().unwrap();
        let stored_qty = products.iter().find(|p| p.code == "TO-101").map(|p| p.qty);
        assert_eq!(stored_qty, Some(8));

        let sales: Vec<Sale> = kv.load_as(keys::SALES).await.unwrap().unwrap();
        assert_eq!(sales, vec![sale.clone()]);

        let cart: Cart = kv.load_as(keys::CART).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_publishes_events() {
        let app = app().await;
        add(&app, "TO-101", 1).await;
        let mut rx = app.events.subscribe();

        let sale = pay(&app, None).await.unwrap().sale;

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::ProductsChanged);
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::SaleRecorded { sale_id: sale.id }
        );
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::CartChanged);
    }

    #[tokio::test]
    async fn test_checkout_uses_configured_defaults() {
        let app = app().await;
        let mut settings = app.settings.get();
        settings.default_payment_method = PaymentMethod::Bank;
        settings.tax_rate_bps = 0;
        settings.print_receipt = false;
        app.settings.replace(settings);
        add(&app, "TO-101", 1).await;

        let response = pay(&app, None).await.unwrap();
        assert_eq!(response.sale.payment_method, PaymentMethod::Bank);
        assert_eq!(response.sale.tax_cents, 0);
        assert!(response.receipt.is_none());
    }

    #[tokio::test]
    async fn test_receipt_rendered_when_enabled() {
        let app = app().await;
        add(&app, "TO-101", 1).await;

        let response = pay(&app, Some(PaymentMethod::Cash)).await.unwrap();
        let receipt = response.receipt.unwrap();
        assert!(receipt.contains("Business POS"));
        assert!(receipt.contains(&response.sale.id));
        assert!(receipt.contains("Payment: CASH"));

        let again = sale_receipt(&app.ledger, &app.settings, &response.sale.id).unwrap();
        assert_eq!(again, receipt);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_fails() {
        let app = app().await;
        let err = pay(&app, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(app.ledger.with_ledger(|l| l.is_empty()));
    }

    #[tokio::test]
    async fn test_stale_cart_checkout_changes_nothing() {
        let app = app().await;
        add(&app, "SI-104", 5).await;
        add(&app, "TO-101", 1).await;
        app.catalog.with_catalog_mut(|c| {
            let mut product = c.find_by_code("SI-104").cloned().unwrap();
            product.qty = 3;
            c.update(product).unwrap();
        });

        let err = pay(&app, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(qty_of(&app, "TO-101"), 10);
        assert_eq!(qty_of(&app, "SI-104"), 3);
        assert_eq!(get_cart(&app.cart, &app.settings).lines.len(), 2);
        assert!(app.ledger.with_ledger(|l| l.is_empty()));
    }

    #[tokio::test]
    async fn test_history_pages() {
        let app = app().await;
        for _ in 0..9 {
            add(&app, "FA-107", 1).await;
            pay(&app, None).await.unwrap();
        }

        let first = sales_history(&app.ledger, None, 1);
        assert_eq!(first.sales.len(), 8);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_matches, 9);

        let second = sales_history(&app.ledger, None, 2);
        assert_eq!(second.sales.len(), 1);

        let newest = recent_sales(&app.ledger, 1);
        assert_eq!(first.sales[0], newest[0]);
        assert_eq!(qty_of(&app, "FA-107"), 1);
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let app = app().await;
        assert_eq!(get_sale(&app.ledger, "SALE-x").unwrap_err().code, ErrorCode::NotFound);
    }
}
