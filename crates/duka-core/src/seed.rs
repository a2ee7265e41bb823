//! Demo catalog loaded on first start, when nothing is persisted yet.
//!
//! A small bathroom-fittings shop: ten products over five categories.

use chrono::Utc;
use uuid::Uuid;

use crate::types::Product;

/// (code, name, category, buying, selling, qty, supplier, brand, reorder, description)
/// Prices in whole shillings.
type DemoRow = (
    &'static str,
    &'static str,
    &'static str,
    i64,
    i64,
    i64,
    &'static str,
    &'static str,
    i64,
    &'static str,
);

const DEMO_ROWS: [DemoRow; 10] = [
    ("TO-101", "Toilet Seat", "Toilets", 2500, 3500, 10, "Sanitech Ltd", "AquaComfort", 5, "High-quality ceramic toilet seat"),
    ("FA-102", "Faucet Tap", "Taps", 800, 1200, 15, "FlowMaster Co.", "FlowTech", 5, "Chrome-finished kitchen faucet tap"),
    ("SH-103", "Shower Head", "Showers", 1800, 2500, 8, "HydroPro Ltd", "RainFlow", 3, "Adjustable rain shower head"),
    ("SI-104", "Sink Basin", "Sinks", 4000, 5000, 5, "CeramiCo", "PureBasin", 2, "Ceramic sink basin"),
    ("MI-105", "Bathroom Mirror", "Cabinets", 1000, 1800, 12, "MirrorWorks", "Reflecta", 4, "Elegant bathroom mirror with LED lighting"),
    ("TO-106", "Wall-mounted Toilet", "Toilets", 7500, 9500, 6, "Sanitech Ltd", "AquaComfort", 3, "Modern wall-mounted toilet"),
    ("FA-107", "Bathroom Faucet", "Taps", 1000, 1500, 10, "FlowMaster Co.", "FlowTech", 5, "Stylish bathroom faucet"),
    ("SH-108", "Hand Shower", "Showers", 1200, 1800, 9, "HydroPro Ltd", "RainFlow", 4, "Flexible hand shower with multiple sprays"),
    ("SI-109", "Kitchen Sink", "Sinks", 5000, 6500, 7, "CeramiCo", "PureBasin", 3, "Stainless steel kitchen sink"),
    ("MI-110", "Medicine Cabinet", "Cabinets", 2000, 3000, 8, "MirrorWorks", "Reflecta", 3, "Wall-mounted medicine cabinet"),
];

/// Fresh copies of the demo products, with new ids and timestamps.
pub fn demo_products() -> Vec<Product> {
    let now = Utc::now();

    DEMO_ROWS
        .iter()
        .enumerate()
        .map(
            |(n, &(code, name, category, buy, sell, qty, supplier, brand, reorder, description))| Product {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                buying_price_cents: buy * 100,
                selling_price_cents: sell * 100,
                qty,
                reorder_level: reorder,
                supplier: supplier.to_string(),
                description: description.to_string(),
                barcode: Some(format!("BC{:08}", 10_100_000 + n as i64 + 1)),
                brand: Some(brand.to_string()),
                created_at: now,
                updated_at: now,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::validation::validate_product;

    #[test]
    fn test_demo_products_are_valid_and_unique() {
        let products = demo_products();
        assert_eq!(products.len(), 10);
        for p in &products {
            validate_product(p).unwrap();
        }

        let catalog = Catalog::from_products(products);
        assert_eq!(catalog.categories().len(), 5);
        assert_eq!(catalog.find_by_code("SI-104").unwrap().qty, 5);

        // re-import through the strict path: no duplicate codes or ids
        let mut fresh = Catalog::new();
        let json = catalog.export_json().unwrap();
        assert_eq!(fresh.import_json(&json, 5).unwrap(), 10);
    }
}
