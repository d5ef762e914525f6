pub mod errors;
pub mod models;

use std::fs;
use chrono::{DateTime, FixedOffset};
use log::info;
use crate::models::SpotPrice;
use crate::manager_spot_prices::models::SpotPriceDocument;

pub use crate::manager_spot_prices::errors::SpotPriceError;

/// Source of wholesale spot prices
pub trait SpotPriceSource {
    /// Returns the spot price in EUR/MWh in force at the given time, that is the price of the
    /// latest point at or before it. Times before the first point have no price.
    ///
    /// # Arguments
    ///
    /// * 'timestamp' - the time to look up
    fn spot_price_at(&self, timestamp: DateTime<FixedOffset>) -> Option<f64>;
}

/// A spot price series ordered by time
#[derive(Clone, Default, Debug)]
pub struct SpotPriceSeries {
    prices: Vec<SpotPrice>,
}

impl SpotPriceSeries {
    /// Builds a series from prices in any order. Of points sharing a timestamp the one given last
    /// is used for lookups.
    ///
    /// # Arguments
    ///
    /// * 'prices' - spot prices
    pub fn new(mut prices: Vec<SpotPrice>) -> SpotPriceSeries {
        prices.sort_by_key(|p| p.timestamp);
        SpotPriceSeries { prices }
    }

    /// Loads a series from a JSON file
    ///
    /// # Arguments
    ///
    /// * 'path' - path to the spot price file
    pub fn from_file(path: &str) -> Result<SpotPriceSeries, SpotPriceError> {
        let json = fs::read_to_string(path)?;
        let series = SpotPriceSeries::from_json(&json)?;

        match (series.prices.first(), series.prices.last()) {
            (Some(first), Some(last)) => info!("loaded {} spot prices from {}, {} to {}",
                series.prices.len(), path, first.timestamp, last.timestamp),
            _ => info!("no spot prices in {}", path),
        }

        Ok(series)
    }

    /// Builds a series from JSON, a list of `{"timestamp", "spot_price_eur_mwh"}` objects either
    /// bare or under a `prices` key
    ///
    /// # Arguments
    ///
    /// * 'json' - the JSON text
    pub fn from_json(json: &str) -> Result<SpotPriceSeries, SpotPriceError> {
        let document: SpotPriceDocument = serde_json::from_str(json)?;

        Ok(SpotPriceSeries::new(document.into_prices()))
    }

    pub fn prices(&self) -> &[SpotPrice] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl SpotPriceSource for SpotPriceSeries {
    fn spot_price_at(&self, timestamp: DateTime<FixedOffset>) -> Option<f64> {
        let after = self.prices.partition_point(|p| p.timestamp <= timestamp);

        after.checked_sub(1).map(|i| self.prices[i].spot_price_eur_mwh)
    }
}
