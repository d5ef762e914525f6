use chrono::Local;
use log::{info, warn};
use thiserror::Error;
use erse_pricing::manager_spot_prices::SpotPriceSource;
use erse_pricing::manager_tariff_store::{TariffStore, TariffStoreError};
use erse_pricing::models::PricedSpot;
use erse_pricing::{compute_prices, price_series};
use crate::config::Config;
use crate::initialization::Mgr;

/// Prices the loaded spot series and prints the result as JSON on stdout
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'mgr' - struct with the loaded store and spot prices
pub fn run(config: &Config, mgr: &Mgr) -> Result<(), WorkerError> {
    let site = mgr.store.get_site_settings()?;
    let tariff_type = config.pricing.tariff_type.unwrap_or(site.tariff_type);
    let voltage_level = config.pricing.voltage_level.as_deref().unwrap_or(site.voltage_level.as_str());

    info!("pricing {} spot prices for tariff type {} at {}", mgr.spot_prices.len(), tariff_type, voltage_level);

    let priced = price_series(mgr.spot_prices.prices(), tariff_type, voltage_level, &mgr.store)?;
    for p in priced.iter() {
        info!("{}", p);
    }

    let now = Local::now().fixed_offset();
    match mgr.spot_prices.spot_price_at(now) {
        Some(spot) => {
            let prices = compute_prices(spot, &now, tariff_type, voltage_level, &mgr.store)?;
            info!("price now: spot {:.2} EUR/MWh, buy {:.5} EUR/kWh, export {:.5} EUR/kWh",
                spot, prices.buy_price_eur_kwh, prices.export_price_eur_kwh);
        },
        None => warn!("no spot price in force at {}", now),
    }

    println!("{}", to_json(&priced)?);

    Ok(())
}

/// Serializes priced points
///
/// # Arguments
///
/// * 'priced' - priced spot points
fn to_json(priced: &[PricedSpot]) -> Result<String, WorkerError> {
    serde_json::to_string_pretty(priced)
        .map_err(|e| WorkerError::OutputError(format!("error serializing prices: {}", e)))
}

/// Error depicting errors that occur while running a pricing pass
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error while reading tariff store: {0}")]
    TariffStoreError(#[from] TariffStoreError),
    #[error("error while writing prices: {0:?}")]
    OutputError(String),
}
