//! # Seed Data
//!
//! Writes the demo catalog into a database, for development and demos.
//!
//! ## Usage
//! ```bash
//! # Seed ./duka_dev.db (default)
//! cargo run -p duka-db --bin seed
//!
//! # Specify database path
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//!
//! # Replace an existing catalog and clear sales
//! cargo run -p duka-db --bin seed -- --force
//! ```

use std::env;

use duka_core::seed::demo_products;
use duka_core::Product;
use duka_db::{keys, Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./duka_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("Duka POS Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./duka_dev.db)");
                println!("  -f, --force        Overwrite an existing catalog and clear sales");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("Duka POS Seed Data");
    println!("==================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let kv = db.kv();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: Option<Vec<Product>> = kv.load_as(keys::PRODUCTS).await?;
    if let Some(products) = existing.filter(|p| !p.is_empty()) {
        if !force {
            println!("⚠ Database already has {} products", products.len());
            println!("  Skipping seed. Pass --force to replace them.");
            db.close().await;
            return Ok(());
        }
        println!("Replacing {} existing products", products.len());
        kv.remove(keys::SALES).await?;
        kv.remove(keys::CART).await?;
    }

    let products = demo_products();
    kv.save(keys::PRODUCTS, &products).await?;

    println!();
    for p in &products {
        println!(
            "  {:<8} {:<22} {:<9} qty {:>3}  KES {}",
            p.code,
            p.name,
            p.category,
            p.qty,
            p.selling_price()
        );
    }
    println!();
    println!("✓ Seeded {} products", products.len());

    db.close().await;
    Ok(())
}
