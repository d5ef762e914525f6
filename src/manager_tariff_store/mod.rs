pub mod errors;
pub mod models;

use std::collections::{BTreeSet, HashSet};
use std::fs;
use chrono::NaiveDate;
use log::{debug, info, warn};
use crate::models::{CostSlot, DayType, GridTariffCostSlot, Season, SiteSettings, TariffDefinition, TariffType};
use crate::slots::resolve_slot;
use crate::validity::select_active;

pub use crate::manager_tariff_store::errors::TariffStoreError;
pub use crate::manager_tariff_store::models::{PeakHoursField, TariffData, TariffRecord, TariffUpdate};

/// Read access to tariff reference data as needed by the pricing engine.
///
/// Implementations decide how data is persisted. Returning `Ok(None)` or `Ok(false)` means the data
/// is simply not there, errors are reserved for failing or inconsistent stores.
pub trait TariffStore {
    /// Checks whether the date is a holiday
    ///
    /// # Arguments
    ///
    /// * 'date' - calendar date, no time component
    fn is_holiday(&self, date: NaiveDate) -> Result<bool, TariffStoreError>;

    /// Finds the cost slot covering the given time of day
    ///
    /// # Arguments
    ///
    /// * 'tariff_type' - tariff type
    /// * 'voltage_level' - voltage level of the connection
    /// * 'season' - season of the date priced
    /// * 'day_type' - day type of the date priced
    /// * 'hour' - hour of day (0-23)
    /// * 'minute' - minute of hour (0-59)
    fn find_cost_slot(&self, tariff_type: TariffType, voltage_level: &str, season: Season, day_type: DayType, hour: u32, minute: u32) -> Result<Option<CostSlot>, TariffStoreError>;

    /// Finds the tariff definition in force for a tariff type on a date
    ///
    /// # Arguments
    ///
    /// * 'tariff_type' - tariff type
    /// * 'date' - calendar date, no time component
    fn find_active_tariff(&self, tariff_type: TariffType, date: NaiveDate) -> Result<Option<TariffDefinition>, TariffStoreError>;

    fn get_site_settings(&self) -> Result<SiteSettings, TariffStoreError>;
}

/// Tariff store keeping all reference data in memory, typically loaded from a TOML data file
#[derive(Clone, Default, Debug)]
pub struct MemoryTariffStore {
    site: SiteSettings,
    holidays: BTreeSet<NaiveDate>,
    tariffs: Vec<TariffDefinition>,
    cost_slots: Vec<GridTariffCostSlot>,
}

impl MemoryTariffStore {
    /// Returns an empty store with default site settings
    pub fn new() -> MemoryTariffStore {
        MemoryTariffStore::default()
    }

    /// Loads a store from a tariff data file
    ///
    /// # Arguments
    ///
    /// * 'path' - path to the tariff data file
    pub fn from_file(path: &str) -> Result<MemoryTariffStore, TariffStoreError> {
        let toml = fs::read_to_string(path)?;
        let store = MemoryTariffStore::from_toml(&toml)?;

        info!("loaded {} tariff definitions, {} cost slots and {} holidays from {}",
            store.tariffs.len(), store.cost_slots.len(), store.holidays.len(), path);

        Ok(store)
    }

    /// Builds a store from the contents of a tariff data file.
    /// Tariff definitions without an id are numbered after the highest given id.
    ///
    /// # Arguments
    ///
    /// * 'toml' - tariff data in TOML format
    pub fn from_toml(toml: &str) -> Result<MemoryTariffStore, TariffStoreError> {
        let data: TariffData = toml::from_str(toml)?;

        let mut seen: HashSet<u64> = HashSet::new();
        for id in data.tariffs.iter().filter_map(|t| t.id) {
            if !seen.insert(id) {
                return Err(TariffStoreError::DuplicateIdError(id));
            }
        }

        let mut next_id = seen.iter().max().copied().unwrap_or(0) + 1;
        let mut tariffs = Vec::with_capacity(data.tariffs.len());
        for record in data.tariffs {
            let id = match record.id {
                Some(id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    id
                }
            };
            tariffs.push(record.into_definition(id)?);
        }

        Ok(MemoryTariffStore {
            site: data.site,
            holidays: data.holidays.into_iter().collect(),
            tariffs,
            cost_slots: data.cost_slots,
        })
    }

    /// Adds a tariff definition and returns the id it was given.
    /// Any id carried by the record is ignored.
    ///
    /// # Arguments
    ///
    /// * 'record' - the tariff definition to add
    pub fn insert_tariff(&mut self, record: TariffRecord) -> Result<u64, TariffStoreError> {
        let id = self.tariffs.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let definition = record.into_definition(id)?;
        debug!("inserting {} tariff {} valid {} - {}", definition.tariff_type, id, definition.valid_from, definition.valid_to);
        self.tariffs.push(definition);

        Ok(id)
    }

    /// Changes the provided fields of an existing tariff definition.
    /// A definition can't switch generation through an update, delete and insert instead.
    ///
    /// # Arguments
    ///
    /// * 'id' - id of the definition to update
    /// * 'update' - fields to change
    pub fn update_tariff(&mut self, id: u64, update: TariffUpdate) -> Result<(), TariffStoreError> {
        let index = self.tariffs
            .iter()
            .position(|t| t.id == id)
            .ok_or(TariffStoreError::NotFoundError(id))?;

        let merged = TariffRecord::from(&self.tariffs[index]).merge(update);
        self.tariffs[index] = merged.into_definition(id)?;

        Ok(())
    }

    /// Removes a tariff definition, unknown ids are ignored
    ///
    /// # Arguments
    ///
    /// * 'id' - id of the definition to remove
    pub fn delete_tariff(&mut self, id: u64) {
        self.tariffs.retain(|t| t.id != id);
    }

    /// Returns tariff definitions ordered by tariff type and start of validity
    ///
    /// # Arguments
    ///
    /// * 'tariff_type' - only return definitions of this type if given
    pub fn tariff_definitions(&self, tariff_type: Option<TariffType>) -> Vec<&TariffDefinition> {
        let mut result: Vec<&TariffDefinition> = self.tariffs
            .iter()
            .filter(|t| tariff_type.is_none_or(|tt| t.tariff_type == tt))
            .collect();
        result.sort_by(|a, b| a.tariff_type.cmp(&b.tariff_type).then(a.valid_from.cmp(&b.valid_from)));

        result
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_cost_slot(&mut self, slot: GridTariffCostSlot) {
        self.cost_slots.push(slot);
    }

    /// Sets a site setting from its textual value. Values that don't parse are ignored and
    /// the previous setting is kept.
    ///
    /// # Arguments
    ///
    /// * 'key' - one of voltage_level, tariff_type, contracted_power_kva or assumed_daily_kwh
    /// * 'value' - the new value
    pub fn set_site_setting(&mut self, key: &str, value: &str) {
        match key {
            "voltage_level" => self.site.voltage_level = value.to_string(),
            "tariff_type" => match value.parse() {
                Ok(tariff_type) => self.site.tariff_type = tariff_type,
                Err(e) => warn!("ignoring site setting {}: {}", key, e),
            },
            "contracted_power_kva" => match value.trim().parse() {
                Ok(kva) => self.site.contracted_power_kva = kva,
                Err(e) => warn!("ignoring site setting {}={}: {}", key, value, e),
            },
            "assumed_daily_kwh" => match value.trim().parse() {
                Ok(kwh) => self.site.assumed_daily_kwh = kwh,
                Err(e) => warn!("ignoring site setting {}={}: {}", key, value, e),
            },
            _ => debug!("unknown site setting {}", key),
        }
    }
}

impl TariffStore for MemoryTariffStore {
    fn is_holiday(&self, date: NaiveDate) -> Result<bool, TariffStoreError> {
        Ok(self.holidays.contains(&date))
    }

    fn find_cost_slot(&self, tariff_type: TariffType, voltage_level: &str, season: Season, day_type: DayType, hour: u32, minute: u32) -> Result<Option<CostSlot>, TariffStoreError> {
        let candidates = self.cost_slots
            .iter()
            .filter(|s| s.tariff_type == tariff_type
                && s.voltage_level == voltage_level
                && s.season == season
                && s.day_of_week == day_type);

        Ok(resolve_slot(candidates, hour, minute).map(CostSlot::from))
    }

    fn find_active_tariff(&self, tariff_type: TariffType, date: NaiveDate) -> Result<Option<TariffDefinition>, TariffStoreError> {
        Ok(select_active(&self.tariffs, tariff_type, date).cloned())
    }

    fn get_site_settings(&self) -> Result<SiteSettings, TariffStoreError> {
        Ok(self.site.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourRange, SlotName, TariffParameters};

    const TARIFF_DATA: &str = r#"
holidays = ["2025-04-25", "2025-12-25"]

[site]
voltage_level = "low_voltage"
tariff_type = "four_rate"

[[tariffs]]
tariff_type = "simple"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
loss_factor = 1.1
vat_rate = 1.23

[[tariffs]]
id = 7
tariff_type = "two_rate"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
access_charge_peak = 0.09
access_charge_off_peak = 0.03
export_multiplier = 0.7

[tariffs.peak_hours]
peak = [[8, 22]]

[[tariffs]]
tariff_type = "three_rate"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
peak_hours = '{"peak": [[9, 12], [18, 21]], "super_off_peak": [[2, 6]]}'
access_charge_super_off_peak = 0.01

[[cost_slots]]
tariff_type = "four_rate"
voltage_level = "low_voltage"
season = "winter"
day_of_week = "weekday"
start_time = "22:00"
end_time = "06:00"
grid_access_eur_kwh = 0.012
slot_name = "super_off_peak"

[[cost_slots]]
tariff_type = "four_rate"
voltage_level = "low_voltage"
season = "winter"
day_of_week = "weekday"
start_time = "06:00"
end_time = "22:00"
grid_access_eur_kwh = 0.041
slot_name = "standard"
"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loss_factor_record(valid_from: NaiveDate, valid_to: NaiveDate) -> TariffRecord {
        TariffRecord {
            id: None,
            tariff_type: TariffType::Simple,
            valid_from,
            valid_to,
            loss_factor: Some(1.08),
            buy_spread_eur_kwh: Some(0.005),
            vat_rate: Some(1.23),
            export_multiplier: Some(0.8),
            peak_hours: None,
            access_charge_peak: None,
            access_charge_off_peak: None,
            access_charge_super_off_peak: None,
        }
    }

    #[test]
    fn loads_tariff_data_file_contents() {
        let store = MemoryTariffStore::from_toml(TARIFF_DATA).unwrap();

        assert!(store.is_holiday(date(2025, 4, 25)).unwrap());
        assert!(!store.is_holiday(date(2025, 4, 24)).unwrap());

        let site = store.get_site_settings().unwrap();
        assert_eq!(site.voltage_level, "low_voltage");
        assert_eq!(site.tariff_type, TariffType::FourRate);
        assert_eq!(site.contracted_power_kva, 250.0);

        let ids: Vec<u64> = store.tariff_definitions(None).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![8, 7, 9]);
    }

    #[test]
    fn classifies_tariff_generations_at_load() {
        let store = MemoryTariffStore::from_toml(TARIFF_DATA).unwrap();

        let simple = store.find_active_tariff(TariffType::Simple, date(2025, 6, 1)).unwrap().unwrap();
        assert!(matches!(simple.parameters, TariffParameters::LossFactor(ref p) if p.loss_factor == Some(1.1) && p.buy_spread_eur_kwh.is_none()));

        let two_rate = store.find_active_tariff(TariffType::TwoRate, date(2025, 6, 1)).unwrap().unwrap();
        match two_rate.parameters {
            TariffParameters::PeakHours(p) => {
                assert_eq!(p.peak_hours.peak, vec![HourRange(8, 22)]);
                assert_eq!(p.export_multiplier, Some(0.7));
            },
            other => panic!("unexpected parameters {:?}", other),
        }

        let three_rate = store.find_active_tariff(TariffType::ThreeRate, date(2025, 6, 1)).unwrap().unwrap();
        match three_rate.parameters {
            TariffParameters::PeakHours(p) => {
                assert_eq!(p.peak_hours.peak, vec![HourRange(9, 12), HourRange(18, 21)]);
                assert_eq!(p.peak_hours.super_off_peak, vec![HourRange(2, 6)]);
                assert_eq!(p.access_charge_peak, None);
            },
            other => panic!("unexpected parameters {:?}", other),
        }
    }

    #[test]
    fn finds_cost_slots_within_group_only() {
        let store = MemoryTariffStore::from_toml(TARIFF_DATA).unwrap();

        let night = store.find_cost_slot(TariffType::FourRate, "low_voltage", Season::Winter, DayType::Weekday, 23, 15).unwrap().unwrap();
        assert_eq!(night.slot_name, SlotName::SuperOffPeak);
        assert_eq!(night.grid_access_eur_kwh, 0.012);

        let day = store.find_cost_slot(TariffType::FourRate, "low_voltage", Season::Winter, DayType::Weekday, 6, 0).unwrap().unwrap();
        assert_eq!(day.slot_name, SlotName::Standard);

        assert!(store.find_cost_slot(TariffType::FourRate, "low_voltage", Season::Summer, DayType::Weekday, 12, 0).unwrap().is_none());
        assert!(store.find_cost_slot(TariffType::FourRate, "medium_voltage", Season::Winter, DayType::Weekday, 12, 0).unwrap().is_none());
        assert!(store.find_cost_slot(TariffType::FourRate, "low_voltage", Season::Winter, DayType::Saturday, 12, 0).unwrap().is_none());
    }

    #[test]
    fn malformed_slot_time_is_a_load_error() {
        let toml = r#"
[[cost_slots]]
tariff_type = "simple"
voltage_level = "low_voltage"
season = "winter"
day_of_week = "weekday"
start_time = "00:00"
end_time = "25:00"
grid_access_eur_kwh = 0.04
slot_name = "standard"
"#;
        assert!(matches!(MemoryTariffStore::from_toml(toml), Err(TariffStoreError::DocumentError(_))));
    }

    #[test]
    fn rejects_inconsistent_tariff_records() {
        let mixed = r#"
[[tariffs]]
id = 3
tariff_type = "simple"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
loss_factor = 1.08
access_charge_peak = 0.1
"#;
        assert!(matches!(MemoryTariffStore::from_toml(mixed), Err(TariffStoreError::MixedGenerationError(3))));

        let inverted = r#"
[[tariffs]]
id = 4
tariff_type = "simple"
valid_from = "2025-12-31"
valid_to = "2025-01-01"
"#;
        assert!(matches!(MemoryTariffStore::from_toml(inverted), Err(TariffStoreError::ValidityWindowError(4))));

        let duplicate = r#"
[[tariffs]]
id = 2
tariff_type = "simple"
valid_from = "2025-01-01"
valid_to = "2025-12-31"

[[tariffs]]
id = 2
tariff_type = "two_rate"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
"#;
        assert!(matches!(MemoryTariffStore::from_toml(duplicate), Err(TariffStoreError::DuplicateIdError(2))));

        let bad_json = r#"
[[tariffs]]
tariff_type = "two_rate"
valid_from = "2025-01-01"
valid_to = "2025-12-31"
peak_hours = '{"peak": [[8, 22]'
"#;
        assert!(matches!(MemoryTariffStore::from_toml(bad_json), Err(TariffStoreError::PeakHoursError(_))));
    }

    #[test]
    fn insert_update_and_delete_tariffs() {
        let mut store = MemoryTariffStore::new();

        let first = store.insert_tariff(loss_factor_record(date(2024, 1, 1), date(2024, 12, 31))).unwrap();
        let second = store.insert_tariff(loss_factor_record(date(2025, 1, 1), date(2025, 12, 31))).unwrap();
        assert_eq!((first, second), (1, 2));

        let update = TariffUpdate {
            vat_rate: Some(1.06),
            valid_to: Some(date(2026, 6, 30)),
            ..TariffUpdate::default()
        };
        store.update_tariff(second, update).unwrap();

        let updated = store.find_active_tariff(TariffType::Simple, date(2026, 3, 1)).unwrap().unwrap();
        assert_eq!(updated.id, second);
        match updated.parameters {
            TariffParameters::LossFactor(p) => {
                assert_eq!(p.vat_rate, Some(1.06));
                assert_eq!(p.loss_factor, Some(1.08));
            },
            other => panic!("unexpected parameters {:?}", other),
        }

        let switch = TariffUpdate { access_charge_peak: Some(0.1), ..TariffUpdate::default() };
        assert!(matches!(store.update_tariff(second, switch), Err(TariffStoreError::MixedGenerationError(2))));
        assert!(matches!(store.update_tariff(42, TariffUpdate::default()), Err(TariffStoreError::NotFoundError(42))));

        store.delete_tariff(first);
        store.delete_tariff(42);
        assert_eq!(store.tariff_definitions(Some(TariffType::Simple)).len(), 1);
        assert!(store.find_active_tariff(TariffType::Simple, date(2024, 6, 1)).unwrap().is_none());
    }

    #[test]
    fn site_settings_ignore_unparseable_values() {
        let mut store = MemoryTariffStore::new();

        store.set_site_setting("voltage_level", "high_voltage");
        store.set_site_setting("tariff_type", "two_rate");
        store.set_site_setting("contracted_power_kva", "41.4");
        store.set_site_setting("assumed_daily_kwh", "lots");
        store.set_site_setting("tariff_type", "bi_hourly");
        store.set_site_setting("colour", "blue");

        let site = store.get_site_settings().unwrap();
        assert_eq!(site.voltage_level, "high_voltage");
        assert_eq!(site.tariff_type, TariffType::TwoRate);
        assert_eq!(site.contracted_power_kva, 41.4);
        assert_eq!(site.assumed_daily_kwh, 500.0);
    }
}
