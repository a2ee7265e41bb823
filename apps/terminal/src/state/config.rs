//! # Settings State
//!
//! The shop's settings record: business details for receipts, tax,
//! currency, inventory and receipt toggles.
//!
//! ## Sources (later wins)
//! 1. Defaults (this file)
//! 2. Persisted `pos_settings` document
//! 3. Environment variables (`DUKA_*`)
//!
//! Runtime edits (`set-tax`, `settings-import`) are validated, persisted and
//! broadcast as `SettingsChanged`.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use duka_core::receipt::{ReceiptOptions, DEFAULT_FOOTER};
use duka_core::validation::{validate_stock_level, validate_tax_rate_bps};
use duka_core::{
    CoreResult, Money, PaymentMethod, TaxRate, ValidationError, DEFAULT_REORDER_LEVEL,
    DEFAULT_TAX_RATE_BPS,
};

/// Seconds between stock-alert evaluations.
pub const DEFAULT_ALERT_INTERVAL_SECS: u64 = 300;

/// Application settings.
///
/// Missing fields deserialize to their defaults, so a record written by an
/// older version still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub business_name: String,
    pub business_email: String,
    pub business_phone: String,
    pub business_address: String,

    /// Basis points, 0..=10000. 1600 = 16% VAT.
    pub tax_rate_bps: u32,

    /// ISO 4217 code, printed on receipts.
    pub currency: String,

    /// Short symbol for on-screen amounts.
    pub currency_symbol: String,

    /// Whether the alert task raises stock alerts.
    pub low_stock_alert: bool,

    /// Reorder level given to products that don't specify one.
    pub default_reorder_level: i64,

    /// Print a receipt after checkout.
    pub print_receipt: bool,
    pub receipt_footer: String,
    pub show_tax_on_receipt: bool,

    pub default_payment_method: PaymentMethod,

    pub alert_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            business_name: "Business POS".to_string(),
            business_email: "contact@business.com".to_string(),
            business_phone: "+254 700 000 000".to_string(),
            business_address: "Nairobi, Kenya".to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            currency: "KES".to_string(),
            currency_symbol: "KSh".to_string(),
            low_stock_alert: true,
            default_reorder_level: DEFAULT_REORDER_LEVEL,
            print_receipt: true,
            receipt_footer: DEFAULT_FOOTER.to_string(),
            show_tax_on_receipt: true,
            default_payment_method: PaymentMethod::Cash,
            alert_interval_secs: DEFAULT_ALERT_INTERVAL_SECS,
        }
    }
}

impl Settings {
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks every field with a constrained range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.business_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "business name".to_string(),
            });
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }
        validate_tax_rate_bps(self.tax_rate_bps)?;
        validate_stock_level("default reorder level", self.default_reorder_level)?;
        if self.alert_interval_secs == 0 {
            return Err(ValidationError::MustBePositive {
                field: "alert interval".to_string(),
            });
        }
        Ok(())
    }

    /// Overlays a partial JSON object onto these settings and validates the
    /// result. Keys not present keep their current value; unknown keys are
    /// ignored.
    ///
    /// ```rust,ignore
    /// let merged = settings.merge(&json!({ "taxRateBps": 800 }))?;
    /// ```
    pub fn merge(&self, partial: &serde_json::Value) -> CoreResult<Settings> {
        let overlay = partial.as_object().ok_or_else(|| ValidationError::InvalidFormat {
            field: "settings".to_string(),
            reason: "expected a JSON object".to_string(),
        })?;

        let mut merged = serde_json::to_value(self).map_err(invalid_settings)?;
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in overlay {
                fields.insert(key.clone(), value.clone());
            }
        }

        let settings: Settings = serde_json::from_value(merged).map_err(invalid_settings)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies `DUKA_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`. Unparseable or out-of-range values
    /// are logged and ignored.
    ///
    /// ## Variables
    /// - `DUKA_STORE_NAME`: business name
    /// - `DUKA_TAX_RATE`: percent, e.g. `16` or `8.25`
    /// - `DUKA_CURRENCY`: currency code
    /// - `DUKA_ALERT_INTERVAL_SECS`: alert timer period
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("DUKA_STORE_NAME").filter(|n| !n.trim().is_empty()) {
            self.business_name = name;
        }

        if let Some(raw) = lookup("DUKA_TAX_RATE") {
            match raw.trim().parse::<f64>() {
                Ok(pct) if (0.0..=100.0).contains(&pct) => {
                    self.tax_rate_bps = TaxRate::from_percentage(pct).bps();
                }
                _ => warn!(value = %raw, "Ignoring invalid DUKA_TAX_RATE"),
            }
        }

        if let Some(code) = lookup("DUKA_CURRENCY").filter(|c| !c.trim().is_empty()) {
            self.currency = code.trim().to_uppercase();
        }

        if let Some(raw) = lookup("DUKA_ALERT_INTERVAL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.alert_interval_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid DUKA_ALERT_INTERVAL_SECS"),
            }
        }
    }

    /// Formats a cent amount with the currency symbol.
    ///
    /// ```rust,ignore
    /// assert_eq!(Settings::default().format_currency(350_000), "KSh 3500.00");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        format!("{} {}", self.currency_symbol, Money::from_cents(cents))
    }

    pub fn receipt_options(&self) -> ReceiptOptions {
        ReceiptOptions {
            business_name: self.business_name.clone(),
            business_address: self.business_address.clone(),
            business_phone: self.business_phone.clone(),
            currency: self.currency.clone(),
            footer: self.receipt_footer.clone(),
            show_tax: self.show_tax_on_receipt,
        }
    }
}

fn invalid_settings(err: serde_json::Error) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "settings".to_string(),
        reason: err.to_string(),
    }
}

/// Shared settings handle.
#[derive(Debug, Clone, Default)]
pub struct SettingsState {
    settings: Arc<Mutex<Settings>>,
}

impl SettingsState {
    pub fn new(settings: Settings) -> Self {
        SettingsState {
            settings: Arc::new(Mutex::new(settings)),
        }
    }

    /// Copy of the current settings.
    pub fn get(&self) -> Settings {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, settings: Settings) {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tax_rate()
    }

    pub fn default_reorder_level(&self) -> i64 {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .default_reorder_level
    }
}
