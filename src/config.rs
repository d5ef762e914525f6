use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use erse_pricing::models::TariffType;

#[derive(Deserialize)]
pub struct Files {
    pub tariff_data: String,
    pub spot_prices: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

/// Overrides of the site settings held in the tariff data
#[derive(Deserialize, Default)]
pub struct Pricing {
    pub tariff_type: Option<TariffType>,
    pub voltage_level: Option<String>,
}

#[derive(Deserialize)]
pub struct Config {
    pub general: General,
    pub files: Files,
    #[serde(default)]
    pub pricing: Pricing,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)?;

    parse_config(&toml)
}

/// Parses configuration from TOML
///
/// # Arguments
///
/// * 'toml' - configuration in TOML format
fn parse_config(toml: &str) -> Result<Config, LoadConfigurationError> {
    let config: Config = toml::from_str(toml)?;

    Ok(config)
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum LoadConfigurationError {
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    #[error("ParseError: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[general]
log_path = "/var/log/erse_pricing/"
log_level = "debug"
log_to_stdout = true

[files]
tariff_data = "/etc/erse_pricing/tariffs.toml"
spot_prices = "/var/lib/erse_pricing/spot.json"
"#;

    #[test]
    fn pricing_section_is_optional() {
        let config = parse_config(CONFIG).unwrap();

        assert_eq!(config.general.log_level, LevelFilter::Debug);
        assert!(config.general.log_to_stdout);
        assert_eq!(config.files.tariff_data, "/etc/erse_pricing/tariffs.toml");
        assert!(config.pricing.tariff_type.is_none());
        assert!(config.pricing.voltage_level.is_none());
    }

    #[test]
    fn reads_pricing_overrides() {
        let toml = format!("{}\n[pricing]\ntariff_type = \"four_rate\"\nvoltage_level = \"low_voltage\"\n", CONFIG);
        let config = parse_config(&toml).unwrap();

        assert_eq!(config.pricing.tariff_type, Some(TariffType::FourRate));
        assert_eq!(config.pricing.voltage_level.as_deref(), Some("low_voltage"));
    }

    #[test]
    fn unknown_tariff_type_is_rejected() {
        let toml = format!("{}\n[pricing]\ntariff_type = \"bi_hourly\"\n", CONFIG);

        assert!(matches!(parse_config(&toml), Err(LoadConfigurationError::ParseError(_))));
    }
}
