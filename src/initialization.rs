use std::env;
use log::info;
use thiserror::Error;
use erse_pricing::manager_spot_prices::{SpotPriceError, SpotPriceSeries};
use erse_pricing::manager_tariff_store::{MemoryTariffStore, TariffStoreError};
use crate::config::{load_config, Config, LoadConfigurationError};
use crate::logging::{setup_logger, LoggerError};

pub struct Mgr {
    pub store: MemoryTariffStore,
    pub spot_prices: SpotPriceSeries,
}

/// Initializes and returns configuration and a Mgr struct holding the loaded tariff store and
/// spot price series
///
pub fn init() -> Result<(Config, Mgr), InitializationError> {
    let config_path = config_path(env::args())?;

    // Load configuration
    let config = load_config(&config_path)?;

    // Setup logging
    let _ = setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("starting erse pricing version: {}", env!("CARGO_PKG_VERSION"));

    let store = MemoryTariffStore::from_file(&config.files.tariff_data)?;
    let spot_prices = SpotPriceSeries::from_file(&config.files.spot_prices)?;

    Ok((config, Mgr { store, spot_prices }))
}

/// Picks the configuration file path out of the command line arguments
///
/// # Arguments
///
/// * 'args' - command line arguments
fn config_path<I: IntoIterator<Item = String>>(args: I) -> Result<String, InitializationError> {
    args.into_iter()
        .find_map(|a| a.strip_prefix("--config=").map(str::to_string))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| InitializationError::ArgumentError("usage: erse_pricing --config=<path>".to_string()))
}

/// Error depicting errors that occur while initializing
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ArgumentError: {0}")]
    ArgumentError(String),
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("TariffStoreError: {0}")]
    TariffStoreError(#[from] TariffStoreError),
    #[error("SpotPriceError: {0}")]
    SpotPriceError(#[from] SpotPriceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn finds_config_argument() {
        let path = config_path(args(&["erse_pricing", "--config=/etc/erse_pricing/config.toml"])).unwrap();

        assert_eq!(path, "/etc/erse_pricing/config.toml");
    }

    #[test]
    fn missing_config_argument_is_an_error() {
        assert!(matches!(config_path(args(&["erse_pricing"])), Err(InitializationError::ArgumentError(_))));
        assert!(matches!(config_path(args(&["erse_pricing", "--config="])), Err(InitializationError::ArgumentError(_))));
    }
}
