//! Shell line parsing.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::ApiError;
use duka_core::PaymentMethod;

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Products(Option<String>),
    Product(String),
    ProductAdd(String),
    ProductUpdate(String),
    ProductDelete(String),
    Restock { amount: i64, products: Vec<String> },
    Import(PathBuf),
    Export { path: PathBuf, products: Vec<String> },
    Add { code: String, qty: i64 },
    Qty { line: String, qty: i64 },
    Inc(String),
    Dec(String),
    Remove(String),
    Clear,
    Cart,
    Checkout {
        method: Option<PaymentMethod>,
        customer: Option<String>,
    },
    Sales { date: Option<NaiveDate>, page: usize },
    Receipt(String),
    Stats(Option<NaiveDate>),
    Dashboard,
    Categories,
    Health,
    Trend(usize),
    Settings,
    SetTax(f64),
    SettingsImport(PathBuf),
    SettingsExport(PathBuf),
    SettingsReset,
    Quit,
}

pub const HELP: &str = "\
Catalog
  products [query]              list or search products
  product <id|code>             product details and health
  product-add <json>            add a product, e.g. {\"name\":..,\"category\":..,\"buyingPriceCents\":..,\"sellingPriceCents\":..}
  product-update <json>         replace a product (full record with id)
  product-delete <id|code>      delete a product
  restock <amount> <id|code>... add stock to products
  import <file>                 import a JSON product array
  export <file> [id|code...]    export products as JSON (all, or the listed ones)
Cart
  add <code> [qty]              add to cart (default 1)
  qty <line> <n>                set a line's quantity (line number or id)
  inc <line> | dec <line>       step a line's quantity
  remove <line>                 remove a line
  clear                         empty the cart
  cart                          show the cart
  checkout [method] [customer]  complete the sale (cash, card, mobile, bank)
Sales & analytics
  sales [yyyy-mm-dd] [page]     sales history
  receipt <sale-id>             reprint a receipt
  stats [yyyy-mm-dd]            sales statistics
  dashboard                     business overview
  categories                    per-category summary
  health                        stock analysis and health scores
  trend [days]                  daily sales totals (default 7)
Settings
  settings                      show settings
  set-tax <percent>             change the tax rate
  settings-import <file>        merge settings from a JSON file
  settings-export <file>        write settings to a JSON file
  settings-reset                restore default settings
  quit                          exit";

/// Default number of days for `trend`.
const DEFAULT_TREND_DAYS: usize = 7;

impl FromStr for Command {
    type Err = ApiError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "products" | "ls" => Command::Products(non_empty(rest)),
            "product" => Command::Product(single(&args, "product <id|code>")?),
            "product-add" => Command::ProductAdd(required(rest, "product-add <json>")?),
            "product-update" => Command::ProductUpdate(required(rest, "product-update <json>")?),
            "product-delete" => {
                Command::ProductDelete(required(rest, "product-delete <id|code>")?)
            }
            "restock" => {
                let usage = "restock <amount> <id|code>...";
                let (amount, products) = args.split_first().ok_or_else(|| ApiError::usage(usage))?;
                if products.is_empty() {
                    return Err(ApiError::usage(usage));
                }
                Command::Restock {
                    amount: number(amount, "amount")?,
                    products: products.iter().map(|s| s.to_string()).collect(),
                }
            }
            "import" => Command::Import(PathBuf::from(required(rest, "import <file>")?)),
            "export" => {
                let (path, products) = args
                    .split_first()
                    .ok_or_else(|| ApiError::usage("export <file> [id|code...]"))?;
                Command::Export {
                    path: PathBuf::from(path),
                    products: products.iter().map(|s| s.to_string()).collect(),
                }
            }
            "add" => match args.as_slice() {
                [code] => Command::Add {
                    code: code.to_string(),
                    qty: 1,
                },
                [code, qty] => Command::Add {
                    code: code.to_string(),
                    qty: number(qty, "quantity")?,
                },
                _ => return Err(ApiError::usage("add <code> [qty]")),
            },
            "qty" => match args.as_slice() {
                [line, qty] => Command::Qty {
                    line: line.to_string(),
                    qty: number(qty, "quantity")?,
                },
                _ => return Err(ApiError::usage("qty <line> <n>")),
            },
            "inc" => Command::Inc(single(&args, "inc <line>")?),
            "dec" => Command::Dec(single(&args, "dec <line>")?),
            "remove" | "rm" => Command::Remove(single(&args, "remove <line>")?),
            "clear" => Command::Clear,
            "cart" => Command::Cart,
            "checkout" | "pay" => parse_checkout(&args),
            "sales" => {
                let mut date = None;
                let mut page = 1;
                for arg in &args {
                    if arg.contains('-') {
                        date = Some(parse_date(arg)?);
                    } else {
                        page = number(arg, "page")?;
                    }
                }
                Command::Sales { date, page }
            }
            "receipt" => Command::Receipt(single(&args, "receipt <sale-id>")?),
            "stats" => Command::Stats(args.first().map(|d| parse_date(d)).transpose()?),
            "dashboard" => Command::Dashboard,
            "categories" => Command::Categories,
            "health" => Command::Health,
            "trend" => Command::Trend(
                args.first()
                    .map(|d| number(d, "days"))
                    .transpose()?
                    .unwrap_or(DEFAULT_TREND_DAYS),
            ),
            "settings" => Command::Settings,
            "set-tax" => Command::SetTax(
                number(&single(&args, "set-tax <percent>")?, "tax rate")?,
            ),
            "settings-import" => {
                Command::SettingsImport(PathBuf::from(required(rest, "settings-import <file>")?))
            }
            "settings-export" => {
                Command::SettingsExport(PathBuf::from(required(rest, "settings-export <file>")?))
            }
            "settings-reset" => Command::SettingsReset,
            "quit" | "exit" | "q" => Command::Quit,
            "" => return Err(ApiError::usage("Type 'help' for commands")),
            other => {
                return Err(ApiError::usage(format!(
                    "Unknown command '{}'. Type 'help' for commands",
                    other
                )))
            }
        };

        Ok(command)
    }
}

/// `checkout [method] [customer...]`. A first word that isn't a payment
/// method starts the customer name.
fn parse_checkout(args: &[&str]) -> Command {
    let (method, name_words) = match args.split_first() {
        Some((first, rest)) => match first.parse::<PaymentMethod>() {
            Ok(method) => (Some(method), rest),
            Err(_) => (None, args),
        },
        None => (None, args),
    };

    Command::Checkout {
        method,
        customer: non_empty(&name_words.join(" ")),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn required(rest: &str, usage: &str) -> Result<String, ApiError> {
    non_empty(rest).ok_or_else(|| ApiError::usage(usage))
}

fn single(args: &[&str], usage: &str) -> Result<String, ApiError> {
    match args {
        [one] => Ok(one.to_string()),
        _ => Err(ApiError::usage(usage)),
    }
}

fn number<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid {}: '{}'", what, raw)))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("Invalid date '{}', expected yyyy-mm-dd", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn parse(line: &str) -> Command {
        line.parse().unwrap()
    }

    #[test]
    fn test_cart_commands() {
        assert_eq!(
            parse("add TO-101"),
            Command::Add {
                code: "TO-101".into(),
                qty: 1
            }
        );
        assert_eq!(
            parse("  ADD  si-104   3 "),
            Command::Add {
                code: "si-104".into(),
                qty: 3
            }
        );
        assert_eq!(
            parse("qty 2 5"),
            Command::Qty {
                line: "2".into(),
                qty: 5
            }
        );
        assert_eq!(parse("dec 1"), Command::Dec("1".into()));
        assert_eq!(parse("rm 1"), Command::Remove("1".into()));
    }

    #[test]
    fn test_checkout_variants() {
        assert_eq!(
            parse("checkout"),
            Command::Checkout {
                method: None,
                customer: None
            }
        );
        assert_eq!(
            parse("checkout mpesa Jane Wanjiku"),
            Command::Checkout {
                method: Some(PaymentMethod::Mobile),
                customer: Some("Jane Wanjiku".into())
            }
        );
        assert_eq!(
            parse("checkout Jane"),
            Command::Checkout {
                method: None,
                customer: Some("Jane".into())
            }
        );
    }

    #[test]
    fn test_json_argument_kept_whole() {
        let json = r#"{"name": "Bidet Spray", "category": "Taps"}"#;
        assert_eq!(
            parse(&format!("product-add {}", json)),
            Command::ProductAdd(json.to_string())
        );
    }

    #[test]
    fn test_sales_and_stats_arguments() {
        assert_eq!(parse("sales"), Command::Sales { date: None, page: 1 });
        assert_eq!(
            parse("sales 2024-03-10 2"),
            Command::Sales {
                date: NaiveDate::from_ymd_opt(2024, 3, 10),
                page: 2
            }
        );
        assert_eq!(parse("sales 3"), Command::Sales { date: None, page: 3 });
        assert_eq!(parse("stats"), Command::Stats(None));
        assert_eq!(parse("trend"), Command::Trend(7));
        assert_eq!(parse("trend 30"), Command::Trend(30));
    }

    #[test]
    fn test_restock_and_settings() {
        assert_eq!(
            parse("restock 10 SI-104 TO-101"),
            Command::Restock {
                amount: 10,
                products: vec!["SI-104".into(), "TO-101".into()]
            }
        );
        assert_eq!(parse("set-tax 8.25"), Command::SetTax(8.25));
        assert_eq!(
            parse("settings-export /tmp/settings.json"),
            Command::SettingsExport(PathBuf::from("/tmp/settings.json"))
        );
        assert_eq!(parse("settings-reset"), Command::SettingsReset);
        assert_eq!(parse("product si-104"), Command::Product("si-104".into()));
        assert_eq!(parse("quit"), Command::Quit);
    }

    #[test]
    fn test_export_with_and_without_products() {
        assert_eq!(
            parse("export /tmp/all.json"),
            Command::Export {
                path: PathBuf::from("/tmp/all.json"),
                products: vec![]
            }
        );
        assert_eq!(
            parse("export /tmp/some.json TO-101 si-104"),
            Command::Export {
                path: PathBuf::from("/tmp/some.json"),
                products: vec!["TO-101".into(), "si-104".into()]
            }
        );
        assert!("export".parse::<Command>().is_err());
    }

    #[test]
    fn test_bad_lines() {
        let err = "frobnicate".parse::<Command>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownCommand);

        assert!("add".parse::<Command>().is_err());
        assert!("restock 10".parse::<Command>().is_err());
        assert!("qty 1".parse::<Command>().is_err());
        assert_eq!(
            "add TO-101 lots".parse::<Command>().unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert!("sales 2024-13-40".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }
}
