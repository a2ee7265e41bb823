//! Plain-text rendering of command results.

use chrono::Local;

use crate::commands::sale::SalesHistoryResponse;
use crate::state::{CartView, Settings};
use duka_core::analytics::{
    CategorySummary, DailyTotal, DashboardSummary, ProductInsight, SalesStats, StockAnalysis,
};
use duka_core::receipt::format_rate;
use duka_core::{Product, Sale, StockStatus};

/// Bar width of the longest day in `trend`.
const TREND_BAR_WIDTH: i64 = 30;

fn status_label(product: &Product) -> &'static str {
    match product.stock_status() {
        StockStatus::InStock => "in stock",
        StockStatus::LowStock => "LOW",
        StockStatus::OutOfStock => "OUT",
    }
}

pub fn products(list: &[Product], settings: &Settings) -> String {
    if list.is_empty() {
        return "No products found".to_string();
    }

    let mut lines = vec![format!(
        "{:<12} {:<24} {:<12} {:>14} {:>6}  {}",
        "CODE", "NAME", "CATEGORY", "PRICE", "QTY", "STATUS"
    )];
    lines.extend(list.iter().map(|p| {
        format!(
            "{:<12} {:<24} {:<12} {:>14} {:>6}  {}",
            p.code,
            truncate(&p.name, 24),
            truncate(&p.category, 12),
            settings.format_currency(p.selling_price_cents),
            p.qty,
            status_label(p)
        )
    }));
    lines.push(format!("{} product(s)", list.len()));
    lines.join("\n")
}

pub fn product(insight: &ProductInsight, settings: &Settings) -> String {
    let p = &insight.product;
    let last_sale = match insight.days_since_last_sale {
        Some(0) => "today".to_string(),
        Some(days) => format!("{} day(s) ago", days),
        None => "never".to_string(),
    };

    [
        format!("{} {} ({})", p.code, p.name, p.id),
        format!("  category: {}  supplier: {}", p.category, p.supplier),
        format!(
            "  buying: {}  selling: {}  margin: {:.1}%",
            settings.format_currency(p.buying_price_cents),
            settings.format_currency(p.selling_price_cents),
            insight.margin_percent
        ),
        format!(
            "  qty: {}  reorder at: {}  status: {}",
            p.qty,
            p.reorder_level,
            status_label(p)
        ),
        format!(
            "  sold: {} for {}  last sale: {}  health: {}/100",
            insight.units_sold,
            settings.format_currency(insight.revenue_cents),
            last_sale,
            insight.health_score
        ),
    ]
    .join("\n")
}

pub fn cart(view: &CartView, settings: &Settings) -> String {
    if view.lines.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut lines: Vec<String> = view
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            format!(
                "{:>2}. {:<10} {:<24} {:>4} x {:>14} = {:>14}",
                i + 1,
                line.code,
                truncate(&line.name, 24),
                line.qty,
                settings.format_currency(line.selling_price_cents),
                settings.format_currency(line.line_total().cents())
            )
        })
        .collect();

    let t = &view.totals;
    lines.push(format!("{} line(s), {} item(s)", t.line_count, t.item_count));
    lines.push(format!("  Subtotal: {}", settings.format_currency(t.subtotal_cents)));
    lines.push(format!(
        "  Tax ({}): {}",
        format_rate(settings.tax_rate()),
        settings.format_currency(t.tax_cents)
    ));
    lines.push(format!("  TOTAL: {}", settings.format_currency(t.total_cents)));
    lines.join("\n")
}

pub fn sale_summary(sale: &Sale, settings: &Settings) -> String {
    format!(
        "{}  {}  {:<20} {:>6} {:>14}",
        sale.id,
        sale.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        truncate(&sale.customer_name, 20),
        sale.payment_method,
        settings.format_currency(sale.total_cents)
    )
}

pub fn history(page: &SalesHistoryResponse, settings: &Settings) -> String {
    if page.total_matches == 0 {
        return "No sales found".to_string();
    }

    let mut lines: Vec<String> = page.sales.iter().map(|s| sale_summary(s, settings)).collect();
    lines.push(format!(
        "page {}/{} ({} sale(s))",
        page.page, page.total_pages, page.total_matches
    ));
    lines.join("\n")
}

pub fn stats(stats: &SalesStats, settings: &Settings) -> String {
    [
        format!("Revenue:      {}", settings.format_currency(stats.revenue_cents)),
        format!("Profit:       {}", settings.format_currency(stats.profit_cents)),
        format!("Units sold:   {}", stats.units),
        format!("Transactions: {}", stats.transaction_count),
        format!(
            "Today:        {} in {} sale(s)",
            settings.format_currency(stats.today_revenue_cents),
            stats.today_transactions
        ),
    ]
    .join("\n")
}

pub fn dashboard(d: &DashboardSummary, settings: &Settings) -> String {
    let mut lines = vec![
        format!("Sales:            {}", settings.format_currency(d.total_sales_cents)),
        format!("Orders:           {}", d.order_count),
        format!(
            "Avg order:        {}",
            settings.format_currency(d.average_order_value_cents)
        ),
        format!("Products:         {}", d.product_count),
        format!(
            "Stock value:      {}",
            settings.format_currency(d.total_stock_value_cents)
        ),
        format!(
            "Profit potential: {}",
            settings.format_currency(d.profit_potential_cents)
        ),
        format!("Inventory health: {:.0}%", d.inventory_health),
        format!(
            "Low stock: {}   Out of stock: {}",
            codes(&d.low_stock),
            codes(&d.out_of_stock)
        ),
        "Top products by profit potential:".to_string(),
    ];
    lines.extend(d.top_products.iter().map(|p| {
        format!(
            "  {:<10} {:<24} {:>14}",
            p.code,
            truncate(&p.name, 24),
            settings.format_currency(p.profit_potential().cents())
        )
    }));

    if d.recent_sales.is_empty() {
        lines.push("Recent sales: none".to_string());
    } else {
        lines.push("Recent sales:".to_string());
        lines.extend(
            d.recent_sales
                .iter()
                .map(|s| format!("  {}", sale_summary(s, settings))),
        );
    }
    lines.join("\n")
}

pub fn categories(list: &[CategorySummary], settings: &Settings) -> String {
    if list.is_empty() {
        return "No categories".to_string();
    }

    let mut lines = vec![format!(
        "{:<14} {:>5} {:>6} {:>16} {:>16} {:>4} {:>16}",
        "CATEGORY", "ITEMS", "UNITS", "STOCK VALUE", "PROFIT POT.", "LOW", "REVENUE"
    )];
    lines.extend(list.iter().map(|c| {
        format!(
            "{:<14} {:>5} {:>6} {:>16} {:>16} {:>4} {:>16}",
            truncate(&c.category, 14),
            c.product_count,
            c.stock_units,
            settings.format_currency(c.stock_value_cents),
            settings.format_currency(c.profit_potential_cents),
            c.low_stock_count,
            settings.format_currency(c.revenue_cents)
        )
    }));
    lines.join("\n")
}

pub fn health(a: &StockAnalysis, settings: &Settings) -> String {
    let mut lines = vec![
        format!("Inventory health: {:.0}%", a.inventory_health),
        format!(
            "Healthy: {}  Low: {}  Out: {}",
            a.healthy.len(),
            a.low_stock.len(),
            a.out_of_stock.len()
        ),
        format!(
            "Inventory value (cost): {}",
            settings.format_currency(a.inventory_value_cents)
        ),
        format!(
            "Profit potential:       {}",
            settings.format_currency(a.profit_potential_cents)
        ),
        "Top sellers:".to_string(),
    ];
    lines.extend(a.top_sellers.iter().map(|i| {
        format!(
            "  {:<10} {:>5} sold {:>14}",
            i.product.code,
            i.units_sold,
            settings.format_currency(i.revenue_cents)
        )
    }));
    lines.push("Best margins:".to_string());
    lines.extend(
        a.best_margins
            .iter()
            .map(|i| format!("  {:<10} {:>5.1}%", i.product.code, i.margin_percent)),
    );
    lines.push("Health scores:".to_string());
    lines.extend(
        a.healthiest
            .iter()
            .map(|i| format!("  {:<10} {:>3}/100", i.product.code, i.health_score)),
    );

    let slow: Vec<&str> = a.slow_movers.iter().map(|i| i.product.code.as_str()).collect();
    lines.push(format!(
        "Slow movers: {}",
        if slow.is_empty() { "none".to_string() } else { slow.join(", ") }
    ));
    lines.join("\n")
}

pub fn trend(days: &[DailyTotal], settings: &Settings) -> String {
    let max = days.iter().map(|d| d.total_cents).max().unwrap_or(0).max(1);

    let lines: Vec<String> = days
        .iter()
        .map(|d| {
            let bar = (d.total_cents.saturating_mul(TREND_BAR_WIDTH) / max) as usize;
            format!(
                "{}  {:>14}  {}",
                d.date.format("%Y-%m-%d"),
                settings.format_currency(d.total_cents),
                "#".repeat(bar)
            )
        })
        .collect();
    lines.join("\n")
}

pub fn settings(s: &Settings) -> String {
    [
        format!("Business: {}", s.business_name),
        format!("  {} | {} | {}", s.business_address, s.business_phone, s.business_email),
        format!("Tax rate: {}", format_rate(s.tax_rate())),
        format!("Currency: {} ({})", s.currency, s.currency_symbol),
        format!(
            "Stock alerts: {} every {}s, default reorder level {}",
            on_off(s.low_stock_alert),
            s.alert_interval_secs,
            s.default_reorder_level
        ),
        format!(
            "Receipts: print {}, show tax {}, footer \"{}\"",
            on_off(s.print_receipt),
            on_off(s.show_tax_on_receipt),
            s.receipt_footer
        ),
        format!("Default payment: {}", s.default_payment_method),
    ]
    .join("\n")
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn codes(products: &[Product]) -> String {
    if products.is_empty() {
        return "none".to_string();
    }
    products.iter().map(|p| p.code.as_str()).collect::<Vec<_>>().join(", ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
