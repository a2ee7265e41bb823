//! # Product Commands
//!
//! Catalog maintenance: listing, add/edit/delete, bulk restock and
//! import/export. Every successful mutation persists the full product list
//! under `products` and publishes `ProductsChanged`.

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, CatalogState, DbState, EventBus, SettingsState, StoreEvent};
use duka_core::validation::validate_search_query;
use duka_core::{CoreError, Product, ProductInput};
use duka_db::keys;

async fn products_changed(db: &DbState, catalog: &CatalogState, events: &EventBus) {
    let snapshot = catalog.snapshot();
    db.persist(keys::PRODUCTS, &snapshot).await;
    events.publish(StoreEvent::ProductsChanged);
}

/// Lists products, optionally filtered by a search query.
///
/// Matches name, code and category case-insensitively and barcode by
/// substring. A blank query lists everything.
pub fn list_products(catalog: &CatalogState, query: Option<&str>) -> ApiResult<Vec<Product>> {
    debug!(?query, "list_products command");

    let query = match query {
        Some(q) => validate_search_query(q)?,
        None => String::new(),
    };

    Ok(catalog.with_catalog(|c| c.search(&query).into_iter().cloned().collect()))
}

pub fn get_product(catalog: &CatalogState, id: &str) -> ApiResult<Product> {
    catalog
        .with_catalog(|c| c.get(id).cloned())
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub fn get_product_by_code(catalog: &CatalogState, code: &str) -> ApiResult<Product> {
    catalog
        .with_catalog(|c| c.find_by_code(code).cloned())
        .ok_or_else(|| ApiError::not_found("Product", code))
}

/// Adds a product. Missing optional fields get their defaults; the reorder
/// level defaults to the configured one.
pub async fn add_product(
    db: &DbState,
    catalog: &CatalogState,
    settings: &SettingsState,
    events: &EventBus,
    input: ProductInput,
) -> ApiResult<Product> {
    debug!(name = ?input.name, "add_product command");

    let reorder = settings.default_reorder_level();
    let product = catalog.with_catalog_mut(|c| c.add(input, reorder).cloned())?;

    info!(id = %product.id, code = %product.code, "Product added");
    products_changed(db, catalog, events).await;
    Ok(product)
}

/// Replaces the product with the same id.
pub async fn update_product(
    db: &DbState,
    catalog: &CatalogState,
    events: &EventBus,
    product: Product,
) -> ApiResult<Product> {
    debug!(id = %product.id, "update_product command");

    let updated = catalog.with_catalog_mut(|c| c.update(product).cloned())?;

    info!(id = %updated.id, code = %updated.code, "Product updated");
    products_changed(db, catalog, events).await;
    Ok(updated)
}

/// Deletes a product. Refused while the open cart holds it.
///
/// ## Returns
/// `false` when no product had that id.
pub async fn delete_product(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    events: &EventBus,
    id: &str,
) -> ApiResult<bool> {
    delete_products(db, catalog, cart, events, &[id.to_string()])
        .await
        .map(|removed| removed > 0)
}

/// Bulk delete. All-or-nothing with respect to the cart check.
pub async fn delete_products(
    db: &DbState,
    catalog: &CatalogState,
    cart: &CartState,
    events: &EventBus,
    ids: &[String],
) -> ApiResult<usize> {
    debug!(count = ids.len(), "delete_products command");

    let removed = cart.with_cart(|cart| {
        if let Some(id) = ids.iter().find(|id| cart.references_product(id)) {
            return Err(CoreError::ProductInCart(id.clone()));
        }
        Ok(catalog.with_catalog_mut(|c| c.remove_many(ids)))
    })?;

    if removed > 0 {
        info!(removed, "Products deleted");
        products_changed(db, catalog, events).await;
    }
    Ok(removed)
}

/// Adds `amount` units to each listed product.
pub async fn restock_products(
    db: &DbState,
    catalog: &CatalogState,
    events: &EventBus,
    ids: &[String],
    amount: i64,
) -> ApiResult<usize> {
    debug!(count = ids.len(), amount, "restock_products command");

    let restocked = catalog.with_catalog_mut(|c| c.restock(ids, amount))?;

    if restocked > 0 {
        info!(restocked, amount, "Products restocked");
        products_changed(db, catalog, events).await;
    }
    Ok(restocked)
}

/// Imports a JSON array of product records.
///
/// Every record is validated like a manual add; one bad record rejects the
/// whole file. Records whose id matches an existing product replace it.
pub async fn import_products(
    db: &DbState,
    catalog: &CatalogState,
    settings: &SettingsState,
    events: &EventBus,
    json: &str,
) -> ApiResult<usize> {
    let reorder = settings.default_reorder_level();
    let imported = catalog.with_catalog_mut(|c| c.import_json(json, reorder))?;

    info!(imported, "Products imported");
    products_changed(db, catalog, events).await;
    Ok(imported)
}

/// The listed products as a pretty-printed JSON array, in the format
/// [`import_products`] reads. An empty `ids` exports the whole catalog.
///
/// ## Errors
/// - `NOT_FOUND` if any id is unknown; nothing is exported
pub fn export_products(catalog: &CatalogState, ids: &[String]) -> ApiResult<String> {
    debug!(count = ids.len(), "export_products command");

    catalog.with_catalog(|c| {
        let json = if ids.is_empty() {
            c.export_json()
        } else {
            serde_json::to_string_pretty(&c.select(ids)?)
        };
        json.map_err(|e| ApiError::internal(format!("Export failed: {}", e)))
    })
}

pub fn list_categories(catalog: &CatalogState) -> Vec<String> {
    catalog.with_catalog(|c| c.categories().into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::add_to_cart;
    use crate::error::ErrorCode;
    use crate::state::AppState;
    use duka_db::{Database, DbConfig};

    async fn app() -> AppState {
        AppState::load(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    fn input(name: &str, buying: i64, selling: i64) -> ProductInput {
        ProductInput {
            name: Some(name.to_string()),
            category: Some("Taps".to_string()),
            buying_price_cents: Some(buying),
            selling_price_cents: Some(selling),
            qty: Some(3),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_product_persists_and_notifies() {
        let app = app().await;
        let mut rx = app.events.subscribe();

        let product = add_product(
            &app.db,
            &app.catalog,
            &app.settings,
            &app.events,
            input("Mixer Tap", 90_000, 120_000),
        )
        .await
        .unwrap();

        assert_eq!(product.reorder_level, 5);
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::ProductsChanged);

        let stored: Vec<Product> = app.db.kv().load_as(keys::PRODUCTS).await.unwrap().unwrap();
        assert!(stored.iter().any(|p| p.id == product.id));
    }

    #[tokio::test]
    async fn test_add_product_uses_configured_reorder_level() {
        let app = app().await;
        let mut settings = app.settings.get();
        settings.default_reorder_level = 12;
        app.settings.replace(settings);

        let product = add_product(
            &app.db,
            &app.catalog,
            &app.settings,
            &app.events,
            input("Mixer Tap", 90_000, 120_000),
        )
        .await
        .unwrap();
        assert_eq!(product.reorder_level, 12);
    }

    #[tokio::test]
    async fn test_add_invalid_product_changes_nothing() {
        let app = app().await;
        let before = app.catalog.snapshot();

        let err = add_product(
            &app.db,
            &app.catalog,
            &app.settings,
            &app.events,
            input("Mixer Tap", 120_000, 120_000),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(app.catalog.snapshot(), before);
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_cart() {
        let app = app().await;
        let id = get_product_by_code(&app.catalog, "TO-101").unwrap().id;
        add_to_cart(&app.db, &app.catalog, &app.cart, &app.settings, &app.events, "TO-101", 1)
            .await
            .unwrap();

        let err = delete_product(&app.db, &app.catalog, &app.cart, &app.events, &id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(get_product(&app.catalog, &id).is_ok());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let app = app().await;
        let id = get_product_by_code(&app.catalog, "FA-102").unwrap().id;

        assert!(delete_product(&app.db, &app.catalog, &app.cart, &app.events, &id).await.unwrap());
        assert!(!delete_product(&app.db, &app.catalog, &app.cart, &app.events, &id).await.unwrap());
        assert!(get_product(&app.catalog, &id).is_err());
    }

    #[tokio::test]
    async fn test_restock_listed_products() {
        let app = app().await;
        let ids: Vec<String> = ["SI-104", "SH-103"]
            .iter()
            .map(|code| get_product_by_code(&app.catalog, code).unwrap().id)
            .collect();

        let n = restock_products(&app.db, &app.catalog, &app.events, &ids, 10).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(get_product_by_code(&app.catalog, "SI-104").unwrap().qty, 15);
        assert_eq!(get_product_by_code(&app.catalog, "SH-103").unwrap().qty, 18);

        assert!(restock_products(&app.db, &app.catalog, &app.events, &ids, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_export_then_import_round_trip() {
        let app = app().await;
        let exported = export_products(&app.catalog, &[]).unwrap();
        let before = app.catalog.snapshot();

        let n = import_products(&app.db, &app.catalog, &app.settings, &app.events, &exported)
            .await
            .unwrap();
        assert_eq!(n, before.len());
        assert_eq!(app.catalog.snapshot(), before);
    }

    #[tokio::test]
    async fn test_export_subset_round_trip() {
        let app = app().await;
        let toilet = get_product_by_code(&app.catalog, "TO-101").unwrap();
        let sink = get_product_by_code(&app.catalog, "SI-104").unwrap();
        let ids = vec![sink.id.clone(), toilet.id.clone()];

        let exported = export_products(&app.catalog, &ids).unwrap();
        let records: Vec<ProductInput> = serde_json::from_str(&exported).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code.as_deref(), Some("SI-104"));

        delete_product(&app.db, &app.catalog, &app.cart, &app.events, &sink.id)
            .await
            .unwrap();
        restock_products(&app.db, &app.catalog, &app.events, &[toilet.id.clone()], 5)
            .await
            .unwrap();
        let count = app.catalog.with_catalog(|c| c.len());

        let n = import_products(&app.db, &app.catalog, &app.settings, &app.events, &exported)
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(app.catalog.with_catalog(|c| c.len()), count + 1);
        assert_eq!(get_product(&app.catalog, &sink.id).unwrap(), sink);
        assert_eq!(get_product(&app.catalog, &toilet.id).unwrap(), toilet);
    }

    #[tokio::test]
    async fn test_export_unknown_product() {
        let app = app().await;
        let err = export_products(&app.catalog, &["missing".to_string()]).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_file() {
        let app = app().await;
        let err = import_products(&app.db, &app.catalog, &app.settings, &app.events, "{oops")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportError);
    }

    #[tokio::test]
    async fn test_search_and_categories() {
        let app = app().await;
        let hits = list_products(&app.catalog, Some("sink")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(list_products(&app.catalog, None).unwrap().len(), 10);

        let categories = list_categories(&app.catalog);
        assert_eq!(categories.first().map(String::as_str), Some("Toilets"));
        assert_eq!(categories.len(), 5);
    }
}
