use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike};
use log::debug;
use rayon::prelude::*;
use crate::calendar::TimeOfUse;
use crate::manager_tariff_store::{TariffStore, TariffStoreError};
use crate::models::{PricedSpot, PricingResult, SlotName, SpotPrice, TariffParameters, TariffType, DEFAULT_GRID_ACCESS_EUR_KWH};
use crate::validity::ActiveTariff;

/// Computes retail buy and export prices from a wholesale spot price.
///
/// The formula follows the shape of the tariff definition in force on the timestamp's local date.
/// Loss factor based definitions, and the absence of any definition, give
/// `((spot / 1000) * loss_factor + buy_spread + grid_access) * vat_rate`, where grid access comes
/// from the cost slot covering the timestamp. Peak hours based definitions give
/// `spot / 1000 + access_charge(hour)`. The export price is `spot / 1000 * export_multiplier`
/// either way.
///
/// Missing reference data falls back to defaults, only store failures are returned as errors.
///
/// # Arguments
///
/// * 'spot_price_eur_mwh' - wholesale spot price in EUR/MWh
/// * 'timestamp' - the time to price, its local date and time select tariff and slot
/// * 'tariff_type' - tariff type
/// * 'voltage_level' - voltage level of the connection
/// * 'store' - tariff store
pub fn compute_prices<S, Tz>(spot_price_eur_mwh: f64, timestamp: &DateTime<Tz>, tariff_type: TariffType, voltage_level: &str, store: &S) -> Result<PricingResult, TariffStoreError>
where
    S: TariffStore + ?Sized,
    Tz: TimeZone,
{
    let local = timestamp.naive_local();
    let tariff = ActiveTariff::resolve(store, tariff_type, local.date())?;
    let spot_eur_kwh = spot_price_eur_mwh / 1000.0;

    let buy_price_eur_kwh = match tariff.definition().map(|d| &d.parameters) {
        Some(TariffParameters::PeakHours(_)) => spot_eur_kwh + tariff.access_charge_for_hour(local.hour()),
        _ => {
            let grid_access = grid_access(local, tariff_type, voltage_level, store)?;
            let energy_component = spot_eur_kwh * tariff.loss_factor() + tariff.buy_spread();
            (energy_component + grid_access) * tariff.vat_rate()
        },
    };

    Ok(PricingResult {
        buy_price_eur_kwh,
        export_price_eur_kwh: spot_eur_kwh * tariff.export_multiplier(),
    })
}

/// Same as `compute_prices` but takes tariff type and voltage level from the site settings when
/// they are not given
///
/// # Arguments
///
/// * 'spot_price_eur_mwh' - wholesale spot price in EUR/MWh
/// * 'timestamp' - the time to price
/// * 'tariff_type' - tariff type, or None for the site's
/// * 'voltage_level' - voltage level, or None for the site's
/// * 'store' - tariff store
pub fn compute_prices_for_site<S, Tz>(spot_price_eur_mwh: f64, timestamp: &DateTime<Tz>, tariff_type: Option<TariffType>, voltage_level: Option<&str>, store: &S) -> Result<PricingResult, TariffStoreError>
where
    S: TariffStore + ?Sized,
    Tz: TimeZone,
{
    if let (Some(tariff_type), Some(voltage_level)) = (tariff_type, voltage_level) {
        return compute_prices(spot_price_eur_mwh, timestamp, tariff_type, voltage_level, store);
    }

    let site = store.get_site_settings()?;
    compute_prices(
        spot_price_eur_mwh,
        timestamp,
        tariff_type.unwrap_or(site.tariff_type),
        voltage_level.unwrap_or(site.voltage_level.as_str()),
        store,
    )
}

/// Returns the name of the cost slot in force at the given time, if the slot table covers it
///
/// # Arguments
///
/// * 'timestamp' - the time to look up
/// * 'tariff_type' - tariff type
/// * 'voltage_level' - voltage level of the connection
/// * 'store' - tariff store
pub fn slot_name_at<S, Tz>(timestamp: &DateTime<Tz>, tariff_type: TariffType, voltage_level: &str, store: &S) -> Result<Option<SlotName>, TariffStoreError>
where
    S: TariffStore + ?Sized,
    Tz: TimeZone,
{
    let tou = TimeOfUse::classify(timestamp.naive_local(), store)?;
    let slot = store.find_cost_slot(tariff_type, voltage_level, tou.season, tou.day_type, tou.hour, tou.minute)?;

    Ok(slot.map(|s| s.slot_name))
}

/// Prices every point of a spot price series. Points are priced in parallel, the result keeps the
/// order of the input.
///
/// # Arguments
///
/// * 'spots' - spot prices to price
/// * 'tariff_type' - tariff type
/// * 'voltage_level' - voltage level of the connection
/// * 'store' - tariff store
pub fn price_series<S>(spots: &[SpotPrice], tariff_type: TariffType, voltage_level: &str, store: &S) -> Result<Vec<PricedSpot>, TariffStoreError>
where
    S: TariffStore + Sync + ?Sized,
{
    spots
        .par_iter()
        .map(|spot| {
            let prices = compute_prices(spot.spot_price_eur_mwh, &spot.timestamp, tariff_type, voltage_level, store)?;
            Ok(PricedSpot {
                timestamp: spot.timestamp,
                spot_price_eur_mwh: spot.spot_price_eur_mwh,
                buy_price_eur_kwh: prices.buy_price_eur_kwh,
                export_price_eur_kwh: prices.export_price_eur_kwh,
            })
        })
        .collect()
}

/// Returns the grid access cost of the slot covering the given local time
///
/// # Arguments
///
/// * 'local' - wall clock date and time at the site
/// * 'tariff_type' - tariff type
/// * 'voltage_level' - voltage level of the connection
/// * 'store' - tariff store
fn grid_access<S: TariffStore + ?Sized>(local: NaiveDateTime, tariff_type: TariffType, voltage_level: &str, store: &S) -> Result<f64, TariffStoreError> {
    let tou = TimeOfUse::classify(local, store)?;
    let slot = store.find_cost_slot(tariff_type, voltage_level, tou.season, tou.day_type, tou.hour, tou.minute)?;

    Ok(match slot {
        Some(slot) => slot.grid_access_eur_kwh,
        None => {
            debug!("no {} {} cost slot for {} {} {:02}:{:02}, using default grid access",
                tariff_type, voltage_level, tou.season, tou.day_type, tou.hour, tou.minute);
            DEFAULT_GRID_ACCESS_EUR_KWH
        },
    })
}
