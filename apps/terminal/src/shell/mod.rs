//! # Terminal Shell
//!
//! Line-oriented front end over the command layer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shell::run                                                             │
//! │                                                                         │
//! │  loop select!                                                           │
//! │    stdin line ──► Command::from_str ──► Shell::execute ──► render::*    │
//! │                                              │                          │
//! │                                              └─► "error [CODE] ..."     │
//! │    StoreEvent::StockAlert ──► "! <alert>"                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart lines are addressed by their 1-based position in `cart` output or by
//! line id; products by id or code (codes match case-insensitively).

mod parse;
mod render;

pub use parse::{Command, HELP};

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::commands::{analytics, cart, config, product, sale};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{AppState, StoreEvent};
use duka_core::{Product, ProductInput};

const PROMPT: &str = "duka> ";

/// Result of one shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub struct Shell {
    state: AppState,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        Shell { state }
    }

    /// Reads commands until `quit` or end of input. Stock alerts published
    /// while waiting are printed between commands.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut events = self.state.events.subscribe();

        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };

                    if !line.trim().is_empty() {
                        match self.execute(&line).await {
                            Ok(Outcome::Quit) => break,
                            Ok(Outcome::Continue(text)) => {
                                output.write_all(text.as_bytes()).await?;
                                output.write_all(b"\n").await?;
                            }
                            Err(e) => {
                                output.write_all(format!("error {}\n", e).as_bytes()).await?;
                            }
                        }
                    }

                    output.write_all(PROMPT.as_bytes()).await?;
                    output.flush().await?;
                }

                event = events.recv() => {
                    if let Ok(StoreEvent::StockAlert { alert }) = event {
                        output.write_all(format!("\n! {}\n", alert).as_bytes()).await?;
                        output.flush().await?;
                    }
                }
            }
        }

        output.write_all(b"\n").await?;
        output.flush().await
    }

    /// Parses and runs one line.
    pub async fn execute(&self, line: &str) -> ApiResult<Outcome> {
        let command: Command = line.parse()?;
        debug!(?command, "shell command");

        let s = &self.state;
        let settings = s.settings.get();

        let text = match command {
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),

            Command::Products(query) => {
                let list = product::list_products(&s.catalog, query.as_deref())?;
                render::products(&list, &settings)
            }
            Command::Product(token) => {
                let p = self.resolve_product(&token)?;
                let insight = analytics::product_insight(&s.catalog, &s.ledger, &p.id)?;
                render::product(&insight, &settings)
            }
            Command::ProductAdd(json) => {
                let input: ProductInput = serde_json::from_str(&json)
                    .map_err(|e| ApiError::validation(format!("Product is not valid JSON: {}", e)))?;
                let p = product::add_product(&s.db, &s.catalog, &s.settings, &s.events, input).await?;
                format!("Added {} {} ({})", p.code, p.name, p.id)
            }
            Command::ProductUpdate(json) => {
                let p = self.update_product(&json).await?;
                format!("Updated {} {}", p.code, p.name)
            }
            Command::ProductDelete(token) => {
                let p = self.resolve_product(&token)?;
                product::delete_product(&s.db, &s.catalog, &s.cart, &s.events, &p.id).await?;
                format!("Deleted {} {}", p.code, p.name)
            }
            Command::Restock { amount, products } => {
                let ids = products
                    .iter()
                    .map(|token| self.resolve_product(token).map(|p| p.id))
                    .collect::<ApiResult<Vec<_>>>()?;
                let count = product::restock_products(&s.db, &s.catalog, &s.events, &ids, amount).await?;
                format!("Restocked {} product(s) by {}", count, amount)
            }
            Command::Import(path) => {
                let json = read_file(&path).await?;
                let count =
                    product::import_products(&s.db, &s.catalog, &s.settings, &s.events, &json).await?;
                format!("Imported {} product(s) from {}", count, path.display())
            }
            Command::Export { path, products } => {
                let ids = products
                    .iter()
                    .map(|token| self.resolve_product(token).map(|p| p.id))
                    .collect::<ApiResult<Vec<_>>>()?;
                let json = product::export_products(&s.catalog, &ids)?;
                write_file(&path, &json).await?;
                let count = if ids.is_empty() {
                    s.catalog.with_catalog(|c| c.len())
                } else {
                    ids.iter().collect::<HashSet<_>>().len()
                };
                format!("Exported {} product(s) to {}", count, path.display())
            }

            Command::Add { code, qty } => {
                let p = self.resolve_product(&code)?;
                let view =
                    cart::add_to_cart(&s.db, &s.catalog, &s.cart, &s.settings, &s.events, &p.code, qty)
                        .await?;
                render::cart(&view, &settings)
            }
            Command::Qty { line, qty } => {
                let line_id = self.line_id(&line)?;
                let view = cart::update_cart_line(
                    &s.db, &s.catalog, &s.cart, &s.settings, &s.events, &line_id, qty,
                )
                .await?;
                render::cart(&view, &settings)
            }
            Command::Inc(line) => {
                let line_id = self.line_id(&line)?;
                let view =
                    cart::increment_line(&s.db, &s.catalog, &s.cart, &s.settings, &s.events, &line_id)
                        .await?;
                render::cart(&view, &settings)
            }
            Command::Dec(line) => {
                let line_id = self.line_id(&line)?;
                let view =
                    cart::decrement_line(&s.db, &s.catalog, &s.cart, &s.settings, &s.events, &line_id)
                        .await?;
                render::cart(&view, &settings)
            }
            Command::Remove(line) => {
                let line_id = self.line_id(&line)?;
                let view =
                    cart::remove_from_cart(&s.db, &s.catalog, &s.cart, &s.settings, &s.events, &line_id)
                        .await?;
                render::cart(&view, &settings)
            }
            Command::Clear => {
                let view = cart::clear_cart(&s.db, &s.catalog, &s.cart, &s.settings, &s.events).await?;
                render::cart(&view, &settings)
            }
            Command::Cart => render::cart(&cart::get_cart(&s.cart, &s.settings), &settings),
            Command::Checkout { method, customer } => {
                let response = sale::checkout(
                    &s.db, &s.catalog, &s.ledger, &s.cart, &s.settings, &s.events, method, customer,
                )
                .await?;
                let mut text = format!(
                    "Sale {} completed: {}",
                    response.sale.id,
                    settings.format_currency(response.sale.total_cents)
                );
                if let Some(receipt) = response.receipt {
                    text.push_str("\n\n");
                    text.push_str(&receipt);
                }
                text
            }

            Command::Sales { date, page } => {
                render::history(&sale::sales_history(&s.ledger, date, page), &settings)
            }
            Command::Receipt(id) => sale::sale_receipt(&s.ledger, &s.settings, &id)?,
            Command::Stats(date) => render::stats(&analytics::sales_stats(&s.ledger, date), &settings),
            Command::Dashboard => render::dashboard(&analytics::dashboard(&s.catalog, &s.ledger), &settings),
            Command::Categories => render::categories(
                &analytics::category_summaries(&s.catalog, &s.ledger),
                &settings,
            ),
            Command::Health => render::health(&analytics::stock_analysis(&s.catalog, &s.ledger), &settings),
            Command::Trend(days) => render::trend(&analytics::sales_trend(&s.ledger, days)?, &settings),

            Command::Settings => render::settings(&config::get_settings(&s.settings)),
            Command::SetTax(percent) => {
                let updated = config::set_tax_rate(&s.db, &s.settings, &s.events, percent).await?;
                render::settings(&updated)
            }
            Command::SettingsImport(path) => {
                let json = read_file(&path).await?;
                let updated = config::import_settings(&s.db, &s.settings, &s.events, &json).await?;
                render::settings(&updated)
            }
            Command::SettingsExport(path) => {
                write_file(&path, &config::export_settings(&s.settings)?).await?;
                format!("Settings written to {}", path.display())
            }
            Command::SettingsReset => {
                render::settings(&config::reset_settings(&s.db, &s.settings, &s.events).await)
            }
        };

        Ok(Outcome::Continue(text))
    }

    /// Finds a product by id, exact code, then case-insensitive code.
    fn resolve_product(&self, token: &str) -> ApiResult<Product> {
        let token = token.trim();
        self.state
            .catalog
            .with_catalog(|c| {
                c.get(token)
                    .or_else(|| c.find_by_code(token))
                    .or_else(|| c.products().iter().find(|p| p.code.eq_ignore_ascii_case(token)))
                    .cloned()
            })
            .ok_or_else(|| ApiError::not_found("Product", token))
    }

    /// A 1-based line number or a line id, resolved against the live cart.
    fn line_id(&self, token: &str) -> ApiResult<String> {
        self.state
            .cart
            .with_cart(|cart| match token.parse::<usize>() {
                Ok(n) if n >= 1 => cart.lines().get(n - 1).map(|l| l.line_id.clone()),
                Ok(_) => None,
                Err(_) => cart.line(token).map(|l| l.line_id.clone()),
            })
            .ok_or_else(|| ApiError::not_found("Cart line", token))
    }

    /// Overlays a partial JSON object onto the product named by its `id` or
    /// `code` field.
    async fn update_product(&self, json: &str) -> ApiResult<Product> {
        let patch: Value = serde_json::from_str(json)
            .map_err(|e| ApiError::validation(format!("Product is not valid JSON: {}", e)))?;
        let fields = patch
            .as_object()
            .ok_or_else(|| ApiError::validation("Product must be a JSON object"))?;
        let key = fields
            .get("id")
            .or_else(|| fields.get("code"))
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::validation("Product needs an \"id\" or \"code\""))?;

        let current = self.resolve_product(key)?;
        let mut merged =
            serde_json::to_value(&current).map_err(|e| ApiError::internal(e.to_string()))?;
        if let Value::Object(target) = &mut merged {
            for (field, value) in fields {
                target.insert(field.clone(), value.clone());
            }
            target.insert("id".to_string(), Value::String(current.id.clone()));
        }
        let updated: Product = serde_json::from_value(merged)
            .map_err(|e| ApiError::validation(format!("Invalid product: {}", e)))?;

        let s = &self.state;
        product::update_product(&s.db, &s.catalog, &s.events, updated).await
    }
}

async fn read_file(path: &Path) -> ApiResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        ApiError::new(
            ErrorCode::FileError,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })
}

async fn write_file(path: &Path, contents: &str) -> ApiResult<()> {
    tokio::fs::write(path, contents).await.map_err(|e| {
        ApiError::new(
            ErrorCode::FileError,
            format!("Cannot write {}: {}", path.display(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duka_db::{Database, DbConfig};

    async fn shell() -> Shell {
        let state = AppState::load(Database::new(DbConfig::in_memory()).await.unwrap()).await;
        Shell::new(state)
    }

    async fn ok(shell: &Shell, line: &str) -> String {
        match shell.execute(line).await.unwrap() {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("unexpected quit on '{}'", line),
        }
    }

    fn qty_of(shell: &Shell, code: &str) -> i64 {
        shell.resolve_product(code).unwrap().qty
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("duka-shell-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_sell_through_shell() {
        let shell = shell().await;

        let cart = ok(&shell, "add to-101 2").await;
        assert!(cart.contains("TO-101"));
        assert!(cart.contains("KSh 8120.00"));

        ok(&shell, "add FA-102").await;
        let cart = ok(&shell, "inc 2").await;
        assert!(cart.contains("2 line(s), 4 item(s)"));

        let text = ok(&shell, "checkout card Jane Wanjiku").await;
        assert!(text.starts_with("Sale SALE-"));
        assert!(text.contains("Jane Wanjiku"));

        assert_eq!(qty_of(&shell, "TO-101"), 8);
        assert_eq!(qty_of(&shell, "FA-102"), 13);
        assert_eq!(ok(&shell, "cart").await, "Cart is empty");

        let history = ok(&shell, "sales").await;
        assert!(history.contains("page 1/1 (1 sale(s))"));
        assert!(history.contains("card"));
    }

    #[tokio::test]
    async fn test_line_references() {
        let shell = shell().await;
        ok(&shell, "add TO-101").await;
        ok(&shell, "add SH-103").await;

        assert_eq!(
            shell.execute("qty 3 2").await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            shell.execute("inc 0").await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let cart = ok(&shell, "rm 1").await;
        assert!(!cart.contains("TO-101"));
        assert!(cart.contains("SH-103"));

        let line_id = shell.state.cart.with_cart(|c| c.lines()[0].line_id.clone());
        let cart = ok(&shell, &format!("qty {} 4", line_id)).await;
        assert!(cart.contains("1 line(s), 4 item(s)"));
    }

    #[tokio::test]
    async fn test_product_commands() {
        let shell = shell().await;

        let added = ok(
            &shell,
            r#"product-add {"name":"Bidet Spray","code":"TA-201","category":"Taps","buyingPriceCents":150000,"sellingPriceCents":250000,"qty":4}"#,
        )
        .await;
        assert!(added.starts_with("Added TA-201 Bidet Spray"));

        let updated = ok(&shell, r#"product-update {"code":"TA-201","sellingPriceCents":275000}"#).await;
        assert_eq!(updated, "Updated TA-201 Bidet Spray");
        let p = shell.resolve_product("TA-201").unwrap();
        assert_eq!(p.selling_price_cents, 275_000);
        assert_eq!(p.qty, 4);

        ok(&shell, "restock 6 TA-201 si-104").await;
        assert_eq!(qty_of(&shell, "TA-201"), 10);
        assert_eq!(qty_of(&shell, "SI-104"), 11);

        let detail = ok(&shell, "product TA-201").await;
        assert!(detail.contains("last sale: never"));

        ok(&shell, "product-delete ta-201").await;
        assert_eq!(
            shell.execute("product TA-201").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_cart() {
        let shell = shell().await;
        ok(&shell, "add SI-104").await;

        let err = shell.execute("product-delete SI-104").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(qty_of(&shell, "SI-104"), 5);
    }

    #[tokio::test]
    async fn test_export_import_files() {
        let shell = shell().await;
        let products = temp_path("products.json");
        let settings = temp_path("settings.json");

        ok(&shell, &format!("export {}", products.display())).await;
        ok(&shell, "set-tax 8").await;
        ok(&shell, &format!("settings-export {}", settings.display())).await;

        ok(&shell, "set-tax 16").await;
        let text = ok(&shell, &format!("settings-import {}", settings.display())).await;
        assert!(text.contains("Tax rate: 8%"));

        let text = ok(&shell, &format!("import {}", products.display())).await;
        assert!(text.starts_with("Imported 10 product(s)"));

        let err = shell.execute("import /nonexistent/duka.json").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FileError);

        let _ = std::fs::remove_file(products);
        let _ = std::fs::remove_file(settings);
    }

    #[tokio::test]
    async fn test_export_listed_products_then_import() {
        let shell = shell().await;
        let path = temp_path("some-products.json");

        let text = ok(&shell, &format!("export {} to-101 SI-104 TO-101", path.display())).await;
        assert!(text.starts_with("Exported 2 product(s)"));

        ok(&shell, "restock 5 TO-101").await;
        let text = ok(&shell, &format!("import {}", path.display())).await;
        assert!(text.starts_with("Imported 2 product(s)"));
        assert_eq!(qty_of(&shell, "TO-101"), 10);
        assert_eq!(qty_of(&shell, "FA-102"), 15);

        let err = shell
            .execute(&format!("export {} TO-101 NOPE-1", path.display()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_settings_reset() {
        let shell = shell().await;
        ok(&shell, "set-tax 8").await;

        let text = ok(&shell, "settings-reset").await;
        assert!(text.contains("Tax rate: 16%"));
        assert_eq!(shell.state.settings.tax_rate().bps(), 1600);
    }

    #[tokio::test]
    async fn test_reports_render() {
        let shell = shell().await;
        ok(&shell, "add TO-101").await;
        ok(&shell, "checkout").await;

        assert!(ok(&shell, "dashboard").await.contains("Orders:           1"));
        assert!(ok(&shell, "stats").await.contains("Transactions: 1"));
        assert!(ok(&shell, "categories").await.contains("Toilets"));
        assert!(ok(&shell, "health").await.starts_with("Inventory health:"));
        assert_eq!(ok(&shell, "trend 3").await.lines().count(), 3);
        assert_eq!(
            shell.execute("trend 0").await.unwrap_err().code,
            ErrorCode::ValidationError
        );
    }

    #[tokio::test]
    async fn test_run_loop_prints_results_and_errors() {
        let shell = shell().await;
        let input: &[u8] = b"add FA-102 2\n\nfrobnicate\ncart\nquit\nproducts\n";
        let mut output = Vec::new();

        shell.run(input, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with(PROMPT));
        assert!(text.contains("error [UNKNOWN_COMMAND]"));
        assert!(text.contains("1 line(s), 2 item(s)"));
        // nothing runs after quit
        assert!(!text.contains("product(s)"));
        assert_eq!(qty_of(&shell, "FA-102"), 15);
    }

    #[tokio::test]
    async fn test_quit_and_end_of_input() {
        let shell = shell().await;
        assert_eq!(shell.execute("exit").await.unwrap(), Outcome::Quit);

        let mut output = Vec::new();
        shell.run(&b""[..], &mut output).await.unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), format!("{}\n", PROMPT));
    }
}
