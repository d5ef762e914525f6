use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::slots::{in_wrapping_range, SlotTime};

// Fallbacks used when the tariff store has nothing to offer
pub const DEFAULT_GRID_ACCESS_EUR_KWH: f64 = 0.05;
pub const DEFAULT_LOSS_FACTOR: f64 = 1.08;
pub const DEFAULT_BUY_SPREAD_EUR_KWH: f64 = 0.005;
pub const DEFAULT_VAT_RATE: f64 = 1.23;
pub const DEFAULT_EXPORT_MULTIPLIER: f64 = 0.8;
pub const DEFAULT_ACCESS_CHARGE_EUR_KWH: f64 = 0.0;

pub const DEFAULT_VOLTAGE_LEVEL: &str = "medium_voltage";

/// ERSE tariff options, from flat rate to four time-of-use periods
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    Simple,
    TwoRate,
    ThreeRate,
    FourRate,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for TariffType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TariffType::Simple    => write!(f, "simple"),
            TariffType::TwoRate   => write!(f, "two_rate"),
            TariffType::ThreeRate => write!(f, "three_rate"),
            TariffType::FourRate  => write!(f, "four_rate"),
        }
    }
}

impl FromStr for TariffType {
    type Err = UnknownTariffTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple" => Ok(TariffType::Simple),
            "two_rate" => Ok(TariffType::TwoRate),
            "three_rate" => Ok(TariffType::ThreeRate),
            "four_rate" => Ok(TariffType::FourRate),
            other => Err(UnknownTariffTypeError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown tariff type: {0}")]
pub struct UnknownTariffTypeError(pub String);

/// Tariff season, summer runs from the last Sunday of March to the last Sunday of October
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Summer,
    Winter,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Season::Summer => write!(f, "summer"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

/// Day classification used by the cost slot tables. Holidays are priced as Sundays.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DayType::Weekday  => write!(f, "weekday"),
            DayType::Saturday => write!(f, "saturday"),
            DayType::Sunday   => write!(f, "sunday"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Peak,
    Standard,
    OffPeak,
    SuperOffPeak,
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SlotName::Peak         => write!(f, "peak"),
            SlotName::Standard     => write!(f, "standard"),
            SlotName::OffPeak      => write!(f, "off_peak"),
            SlotName::SuperOffPeak => write!(f, "super_off_peak"),
        }
    }
}

/// One time-of-use rate band from the grid tariff cost table
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct GridTariffCostSlot {
    pub tariff_type: TariffType,
    pub voltage_level: String,
    pub season: Season,
    pub day_of_week: DayType,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    pub grid_access_eur_kwh: f64,
    pub slot_name: SlotName,
}

/// The part of a cost slot the pricing formulas care about
#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
pub struct CostSlot {
    pub grid_access_eur_kwh: f64,
    pub slot_name: SlotName,
}

impl From<&GridTariffCostSlot> for CostSlot {
    fn from(slot: &GridTariffCostSlot) -> Self {
        CostSlot {
            grid_access_eur_kwh: slot.grid_access_eur_kwh,
            slot_name: slot.slot_name,
        }
    }
}

/// Half open hour range [start, end), wrapping past midnight when start > end
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct HourRange(pub u32, pub u32);

impl HourRange {
    /// Checks whether the given hour falls within the range
    ///
    /// # Arguments
    ///
    /// * 'hour' - hour of day (0-23)
    pub fn contains(&self, hour: u32) -> bool {
        in_wrapping_range(hour, self.0, self.1)
    }
}

/// Hour ranges per slot name for peak-hours based tariff definitions.
/// Hours not covered by `peak` or `super_off_peak` are off peak.
#[derive(Serialize, Deserialize, Clone, PartialEq, Default, Debug)]
pub struct PeakHours {
    #[serde(default)]
    pub peak: Vec<HourRange>,
    #[serde(default)]
    pub off_peak: Vec<HourRange>,
    #[serde(default)]
    pub super_off_peak: Vec<HourRange>,
}

impl PeakHours {
    /// Returns the slot an hour belongs to, peak ranges take precedence over super off peak ranges
    ///
    /// # Arguments
    ///
    /// * 'hour' - hour of day (0-23)
    pub fn slot_for_hour(&self, hour: u32) -> SlotName {
        if self.peak.iter().any(|r| r.contains(hour)) {
            SlotName::Peak
        } else if self.super_off_peak.iter().any(|r| r.contains(hour)) {
            SlotName::SuperOffPeak
        } else {
            SlotName::OffPeak
        }
    }
}

/// Generation A tariff parameters (loss factor based)
#[derive(Serialize, Clone, PartialEq, Default, Debug)]
pub struct LossFactorParameters {
    pub loss_factor: Option<f64>,
    pub buy_spread_eur_kwh: Option<f64>,
    pub vat_rate: Option<f64>,
    pub export_multiplier: Option<f64>,
}

/// Generation B tariff parameters (peak hours based)
#[derive(Serialize, Clone, PartialEq, Default, Debug)]
pub struct PeakHoursParameters {
    pub peak_hours: PeakHours,
    pub access_charge_peak: Option<f64>,
    pub access_charge_off_peak: Option<f64>,
    pub access_charge_super_off_peak: Option<f64>,
    pub export_multiplier: Option<f64>,
}

/// The two historical shapes of a tariff definition, never mixed within one record
#[derive(Serialize, Clone, PartialEq, Debug)]
#[serde(tag = "generation", rename_all = "snake_case")]
pub enum TariffParameters {
    LossFactor(LossFactorParameters),
    PeakHours(PeakHoursParameters),
}

/// One validity window of tariff economics for one tariff type. Bounds are inclusive.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct TariffDefinition {
    pub id: u64,
    pub tariff_type: TariffType,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub parameters: TariffParameters,
}

impl TariffDefinition {
    /// Checks whether the validity window includes the given date
    ///
    /// # Arguments
    ///
    /// * 'date' - date to check
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && date <= self.valid_to
    }
}

/// Deployment parameters used when a pricing call leaves tariff type or voltage level out
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct SiteSettings {
    pub voltage_level: String,
    pub tariff_type: TariffType,
    pub contracted_power_kva: f64,
    pub assumed_daily_kwh: f64,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            voltage_level: DEFAULT_VOLTAGE_LEVEL.to_string(),
            tariff_type: TariffType::ThreeRate,
            contracted_power_kva: 250.0,
            assumed_daily_kwh: 500.0,
        }
    }
}

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
pub struct PricingResult {
    pub buy_price_eur_kwh: f64,
    pub export_price_eur_kwh: f64,
}

/// A wholesale spot price valid from the given time
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct SpotPrice {
    pub timestamp: DateTime<FixedOffset>,
    pub spot_price_eur_mwh: f64,
}

#[derive(Serialize, Clone, Copy, PartialEq, Debug)]
pub struct PricedSpot {
    pub timestamp: DateTime<FixedOffset>,
    pub spot_price_eur_mwh: f64,
    pub buy_price_eur_kwh: f64,
    pub export_price_eur_kwh: f64,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for PricedSpot {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} -> spot {:>8.2} EUR/MWh, buy {:>7.5} EUR/kWh, export {:>7.5} EUR/kWh",
               self.timestamp.format("%Y-%m-%d %H:%M"),
               self.spot_price_eur_mwh,
               self.buy_price_eur_kwh,
               self.export_price_eur_kwh)
    }
}
