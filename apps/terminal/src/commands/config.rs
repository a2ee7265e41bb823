//! # Settings Commands
//!
//! Every change is validated, persisted under `pos_settings` and broadcast
//! as `SettingsChanged`.

use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, EventBus, Settings, SettingsState, StoreEvent};
use duka_core::TaxRate;
use duka_db::keys;

pub fn get_settings(settings: &SettingsState) -> Settings {
    settings.get()
}

async fn store(db: &DbState, settings: &SettingsState, events: &EventBus, updated: Settings) {
    db.persist(keys::SETTINGS, &updated).await;
    settings.replace(updated);
    events.publish(StoreEvent::SettingsChanged);
}

/// Sets the tax rate from a percentage, e.g. `16` or `8.25`.
pub async fn set_tax_rate(
    db: &DbState,
    settings: &SettingsState,
    events: &EventBus,
    percent: f64,
) -> ApiResult<Settings> {
    debug!(percent, "set_tax_rate command");

    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ApiError::validation("Tax rate must be between 0 and 100 percent"));
    }

    let mut updated = settings.get();
    updated.tax_rate_bps = TaxRate::from_percentage(percent).bps();
    updated.validate()?;

    info!(tax_rate_bps = updated.tax_rate_bps, "Tax rate changed");
    store(db, settings, events, updated.clone()).await;
    Ok(updated)
}

/// Merges a JSON object onto the current settings.
///
/// Only the keys present change. The merged record must validate as a whole,
/// otherwise nothing changes.
pub async fn import_settings(
    db: &DbState,
    settings: &SettingsState,
    events: &EventBus,
    json: &str,
) -> ApiResult<Settings> {
    let partial: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ApiError::validation(format!("Settings file is not JSON: {}", e)))?;

    let updated = settings.get().merge(&partial)?;

    info!("Settings imported");
    store(db, settings, events, updated.clone()).await;
    Ok(updated)
}

/// Restores factory settings, with `DUKA_*` overrides applied the same way
/// as at startup.
pub async fn reset_settings(db: &DbState, settings: &SettingsState, events: &EventBus) -> Settings {
    let mut defaults = Settings::default();
    defaults.apply_env();
    if let Err(e) = defaults.validate() {
        warn!(error = %e, "Environment overrides invalid, resetting to plain defaults");
        defaults = Settings::default();
    }

    info!("Settings reset to defaults");
    store(db, settings, events, defaults.clone()).await;
    defaults
}

/// The full settings record as pretty-printed JSON.
pub fn export_settings(settings: &SettingsState) -> ApiResult<String> {
    serde_json::to_string_pretty(&settings.get())
        .map_err(|e| ApiError::internal(format!("Export failed: {}", e)))
}
