//! # State Module
//!
//! Separate handles per concern instead of one global store. Commands take
//! only the handles they need.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │   DbState    │ │ CatalogState │ │ LedgerState  │ │  CartState   │   │
//! │  │  kv_store    │ │ Arc<Mutex<   │ │ Arc<Mutex<   │ │ Arc<Mutex<   │   │
//! │  │  snapshots   │ │   Catalog>>  │ │   Ledger>>   │ │   Cart>>     │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐                                     │
//! │  │SettingsState │ │   EventBus   │                                     │
//! │  │ Arc<Mutex<   │ │  broadcast:: │                                     │
//! │  │  Settings>>  │ │  Sender      │                                     │
//! │  └──────────────┘ └──────────────┘                                     │
//! │                                                                         │
//! │  Lock order: cart → catalog → ledger. No lock is held across .await.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;
mod config;
mod db;
mod events;
mod ledger;

pub use cart::{CartState, CartView};
pub use catalog::CatalogState;
pub use config::{Settings, SettingsState, DEFAULT_ALERT_INTERVAL_SECS};
pub use db::DbState;
pub use events::{EventBus, StoreEvent};
pub use ledger::LedgerState;

use tracing::{info, warn};

use duka_core::seed::demo_products;
use duka_core::{Cart, Catalog, Ledger, Product, Sale};
use duka_db::{keys, Database};

/// Every state handle. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DbState,
    pub catalog: CatalogState,
    pub ledger: LedgerState,
    pub cart: CartState,
    pub settings: SettingsState,
    pub events: EventBus,
}

impl AppState {
    /// Restores state from the database.
    ///
    /// ## Restore Rules
    /// ```text
    /// pos_settings  missing/unreadable → defaults      then DUKA_* overrides
    /// products      missing/unreadable/invalid → demo catalog  (persisted)
    /// sales         missing/unreadable → empty ledger
    /// pos_cart      missing/unreadable → empty cart
    ///               lines whose product is gone, or whose qty exceeds
    ///               stock, are dropped
    /// ```
    pub async fn load(db: Database) -> Self {
        let db = DbState::new(db);

        let mut settings = db.restore::<Settings>(keys::SETTINGS).await.unwrap_or_default();
        settings.apply_env();
        if let Err(e) = settings.validate() {
            warn!(error = %e, "Stored settings invalid, using defaults");
            settings = Settings::default();
            settings.apply_env();
        }

        let restored = match db.restore::<Vec<Product>>(keys::PRODUCTS).await {
            Some(products) => match Catalog::restore(products) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    warn!(error = %e, "Stored products invalid, loading demo catalog");
                    None
                }
            },
            None => {
                info!("No stored products, loading demo catalog");
                None
            }
        };
        let catalog = match restored {
            Some(catalog) => catalog,
            None => {
                let catalog = Catalog::from_products(demo_products());
                db.persist(keys::PRODUCTS, catalog.products()).await;
                catalog
            }
        };

        let ledger = Ledger::from_sales(
            db.restore::<Vec<Sale>>(keys::SALES).await.unwrap_or_default(),
        );

        let mut cart = db.restore::<Cart>(keys::CART).await.unwrap_or_default();
        let dropped = cart.retain_available(&catalog);
        if !dropped.is_empty() {
            warn!(
                dropped = dropped.len(),
                "Restored cart lines no longer available, lines removed"
            );
            db.persist(keys::CART, &cart).await;
        }

        info!(
            products = catalog.len(),
            sales = ledger.len(),
            cart_lines = cart.lines().len(),
            "State restored"
        );

        AppState {
            db,
            catalog: CatalogState::new(catalog),
            ledger: LedgerState::new(ledger),
            cart: CartState::new(cart),
            settings: SettingsState::new(settings),
            events: EventBus::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_core::{ProductInput, DEFAULT_REORDER_LEVEL};
    use duka_db::DbConfig;

    async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_start_seeds_demo_catalog() {
        let db = memory_db().await;
        let state = AppState::load(db.clone()).await;

        assert_eq!(state.catalog.with_catalog(|c| c.len()), demo_products().len());
        assert!(state.ledger.with_ledger(|l| l.is_empty()));
        assert!(state.cart.with_cart(|c| c.is_empty()));

        let stored: Option<Vec<Product>> = db.kv().load_as(keys::PRODUCTS).await.unwrap();
        assert_eq!(stored.map(|p| p.len()), Some(demo_products().len()));
    }

    #[tokio::test]
    async fn test_restores_stored_products() {
        let db = memory_db().await;
        let mut catalog = Catalog::new();
        catalog
            .add(
                ProductInput {
                    name: Some("Maize Flour 2kg".into()),
                    category: Some("Food".into()),
                    buying_price_cents: Some(15_000),
                    selling_price_cents: Some(18_000),
                    qty: Some(40),
                    ..Default::default()
                },
                DEFAULT_REORDER_LEVEL,
            )
            .unwrap();
        db.kv().save(keys::PRODUCTS, catalog.products()).await.unwrap();

        let state = AppState::load(db).await;
        assert_eq!(state.catalog.snapshot(), catalog.products().to_vec());
    }

    #[tokio::test]
    async fn test_unreadable_products_fall_back_to_demo() {
        let db = memory_db().await;
        db.kv().save(keys::PRODUCTS, &serde_json::json!("garbage")).await.unwrap();

        let state = AppState::load(db).await;
        assert_eq!(state.catalog.with_catalog(|c| c.len()), demo_products().len());
    }

    #[tokio::test]
    async fn test_invalid_stored_products_fall_back_to_demo() {
        let db = memory_db().await;
        let mut products = demo_products();
        products[0].qty = -3;
        db.kv().save(keys::PRODUCTS, &products).await.unwrap();

        let state = AppState::load(db.clone()).await;
        assert_eq!(state.catalog.with_catalog(|c| c.len()), demo_products().len());
        let toilet_qty = state.catalog.with_catalog(|c| c.find_by_code("TO-101").map(|p| p.qty));
        assert_eq!(toilet_qty, Some(10));

        let stored: Vec<Product> = db.kv().load_as(keys::PRODUCTS).await.unwrap().unwrap();
        assert!(stored.iter().all(|p| p.qty >= 0));
    }

    #[tokio::test]
    async fn test_duplicate_stored_codes_fall_back_to_demo() {
        let db = memory_db().await;
        let mut products = demo_products();
        products[1].code = products[0].code.clone();
        db.kv().save(keys::PRODUCTS, &products).await.unwrap();

        let state = AppState::load(db).await;
        let codes: Vec<String> =
            state.catalog.with_catalog(|c| c.products().iter().map(|p| p.code.clone()).collect());
        assert!(codes.contains(&"FA-102".to_string()));
        assert_eq!(codes.len(), demo_products().len());
    }

    #[tokio::test]
    async fn test_restored_cart_drops_lines_beyond_stock() {
        let db = memory_db().await;
        let catalog = Catalog::from_products(demo_products());
        let mut cart = Cart::new();
        cart.add_to_cart(&catalog, "TO-101", 8).unwrap();
        cart.add_to_cart(&catalog, "FA-102", 1).unwrap();

        let mut products = catalog.products().to_vec();
        for p in products.iter_mut().filter(|p| p.code == "TO-101") {
            p.qty = 3;
        }
        db.kv().save(keys::PRODUCTS, &products).await.unwrap();
        db.kv().save(keys::CART, &cart).await.unwrap();

        let state = AppState::load(db).await;
        let codes: Vec<String> =
            state.cart.with_cart(|c| c.lines().iter().map(|l| l.code.clone()).collect());
        assert_eq!(codes, vec!["FA-102".to_string()]);
    }

    #[tokio::test]
    async fn test_restored_cart_drops_unknown_products() {
        let db = memory_db().await;
        let catalog = Catalog::from_products(demo_products());
        let mut cart = Cart::new();
        cart.add_to_cart(&catalog, "TO-101", 1).unwrap();
        cart.add_to_cart(&catalog, "SI-104", 1).unwrap();

        let kept: Vec<Product> = catalog
            .products()
            .iter()
            .filter(|p| p.code != "SI-104")
            .cloned()
            .collect();
        db.kv().save(keys::PRODUCTS, &kept).await.unwrap();
        db.kv().save(keys::CART, &cart).await.unwrap();

        let state = AppState::load(db.clone()).await;
        let codes: Vec<String> =
            state.cart.with_cart(|c| c.lines().iter().map(|l| l.code.clone()).collect());
        assert_eq!(codes, vec!["TO-101".to_string()]);

        let stored: Cart = db.kv().load_as(keys::CART).await.unwrap().unwrap();
        assert_eq!(stored.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_stored_settings_reset() {
        let db = memory_db().await;
        db.kv()
            .save(keys::SETTINGS, &serde_json::json!({ "taxRateBps": 50_000 }))
            .await
            .unwrap();

        let state = AppState::load(db).await;
        assert_eq!(state.settings.tax_rate().bps(), duka_core::DEFAULT_TAX_RATE_BPS);
    }
}
