use chrono::NaiveDate;
use log::debug;
use crate::manager_tariff_store::{TariffStore, TariffStoreError};
use crate::models::{
    SlotName, TariffDefinition, TariffParameters, TariffType, DEFAULT_ACCESS_CHARGE_EUR_KWH,
    DEFAULT_BUY_SPREAD_EUR_KWH, DEFAULT_EXPORT_MULTIPLIER, DEFAULT_LOSS_FACTOR, DEFAULT_VAT_RATE,
};

/// Selects the definition in force for a tariff type on a date.
///
/// Among the windows covering the date the one with the latest start wins. Windows starting on the
/// same day shouldn't exist, if they do the highest id is picked.
///
/// # Arguments
///
/// * 'definitions' - all known tariff definitions
/// * 'tariff_type' - tariff type to select for
/// * 'date' - the date priced
pub fn select_active<'a, I>(definitions: I, tariff_type: TariffType, date: NaiveDate) -> Option<&'a TariffDefinition>
where
    I: IntoIterator<Item = &'a TariffDefinition>,
{
    definitions
        .into_iter()
        .filter(|d| d.tariff_type == tariff_type && d.covers(date))
        .max_by(|a, b| a.valid_from.cmp(&b.valid_from).then(a.id.cmp(&b.id)))
}

/// The tariff definition in force for one pricing call, or the lack of one.
///
/// All parameter accessors fall back to the documented defaults when there is no definition or when
/// the definition doesn't carry the field. A single instance is used for a whole computation so
/// parameters never come from different definitions.
#[derive(Clone, PartialEq, Debug)]
pub struct ActiveTariff {
    definition: Option<TariffDefinition>,
}

impl ActiveTariff {
    pub fn new(definition: Option<TariffDefinition>) -> ActiveTariff {
        ActiveTariff { definition }
    }

    /// Looks up the tariff definition in force
    ///
    /// # Arguments
    ///
    /// * 'store' - tariff store to query
    /// * 'tariff_type' - tariff type to look up
    /// * 'date' - the date priced
    pub fn resolve<S: TariffStore + ?Sized>(store: &S, tariff_type: TariffType, date: NaiveDate) -> Result<ActiveTariff, TariffStoreError> {
        let definition = store.find_active_tariff(tariff_type, date)?;
        if definition.is_none() {
            debug!("no {} tariff definition valid on {}, using defaults", tariff_type, date);
        }

        Ok(ActiveTariff { definition })
    }

    pub fn definition(&self) -> Option<&TariffDefinition> {
        self.definition.as_ref()
    }

    fn parameters(&self) -> Option<&TariffParameters> {
        self.definition.as_ref().map(|d| &d.parameters)
    }

    pub fn loss_factor(&self) -> f64 {
        match self.parameters() {
            Some(TariffParameters::LossFactor(p)) => p.loss_factor,
            _ => None,
        }.unwrap_or(DEFAULT_LOSS_FACTOR)
    }

    pub fn buy_spread(&self) -> f64 {
        match self.parameters() {
            Some(TariffParameters::LossFactor(p)) => p.buy_spread_eur_kwh,
            _ => None,
        }.unwrap_or(DEFAULT_BUY_SPREAD_EUR_KWH)
    }

    pub fn vat_rate(&self) -> f64 {
        match self.parameters() {
            Some(TariffParameters::LossFactor(p)) => p.vat_rate,
            _ => None,
        }.unwrap_or(DEFAULT_VAT_RATE)
    }

    pub fn export_multiplier(&self) -> f64 {
        match self.parameters() {
            Some(TariffParameters::LossFactor(p)) => p.export_multiplier,
            Some(TariffParameters::PeakHours(p)) => p.export_multiplier,
            None => None,
        }.unwrap_or(DEFAULT_EXPORT_MULTIPLIER)
    }

    /// Returns the access charge for an hour from the peak hours definition.
    /// Peak ranges are checked first, then super off peak, anything else is off peak.
    ///
    /// # Arguments
    ///
    /// * 'hour' - hour of day (0-23)
    pub fn access_charge_for_hour(&self, hour: u32) -> f64 {
        let Some(TariffParameters::PeakHours(p)) = self.parameters() else {
            return DEFAULT_ACCESS_CHARGE_EUR_KWH;
        };

        match p.peak_hours.slot_for_hour(hour) {
            SlotName::Peak => p.access_charge_peak,
            SlotName::SuperOffPeak => p.access_charge_super_off_peak,
            _ => p.access_charge_off_peak,
        }.unwrap_or(DEFAULT_ACCESS_CHARGE_EUR_KWH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourRange, LossFactorParameters, PeakHours, PeakHoursParameters};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn definition(id: u64, tariff_type: TariffType, valid_from: NaiveDate, valid_to: NaiveDate) -> TariffDefinition {
        TariffDefinition {
            id,
            tariff_type,
            valid_from,
            valid_to,
            parameters: TariffParameters::LossFactor(LossFactorParameters::default()),
        }
    }

    fn peak_hours_tariff() -> ActiveTariff {
        ActiveTariff::new(Some(TariffDefinition {
            id: 1,
            tariff_type: TariffType::ThreeRate,
            valid_from: date(2025, 1, 1),
            valid_to: date(2025, 12, 31),
            parameters: TariffParameters::PeakHours(PeakHoursParameters {
                peak_hours: PeakHours {
                    peak: vec![HourRange(9, 12), HourRange(18, 21)],
                    off_peak: Vec::new(),
                    super_off_peak: vec![HourRange(22, 6)],
                },
                access_charge_peak: Some(0.12),
                access_charge_off_peak: Some(0.05),
                access_charge_super_off_peak: None,
                export_multiplier: Some(0.9),
            }),
        }))
    }

    #[test]
    fn later_start_wins_among_overlapping_windows() {
        let definitions = vec![
            definition(1, TariffType::Simple, date(2023, 1, 1), date(2023, 12, 31)),
            definition(2, TariffType::Simple, date(2023, 6, 1), date(2024, 12, 31)),
        ];

        assert_eq!(select_active(&definitions, TariffType::Simple, date(2023, 7, 1)).unwrap().id, 2);
        assert_eq!(select_active(&definitions, TariffType::Simple, date(2023, 3, 1)).unwrap().id, 1);
        assert_eq!(select_active(&definitions, TariffType::Simple, date(2024, 3, 1)).unwrap().id, 2);
        assert!(select_active(&definitions, TariffType::Simple, date(2025, 1, 1)).is_none());
        assert!(select_active(&definitions, TariffType::TwoRate, date(2023, 7, 1)).is_none());
    }

    #[test]
    fn identical_starts_pick_highest_id() {
        let definitions = vec![
            definition(5, TariffType::Simple, date(2023, 1, 1), date(2023, 12, 31)),
            definition(9, TariffType::Simple, date(2023, 1, 1), date(2023, 6, 30)),
            definition(3, TariffType::Simple, date(2023, 1, 1), date(2023, 12, 31)),
        ];

        assert_eq!(select_active(&definitions, TariffType::Simple, date(2023, 2, 1)).unwrap().id, 9);
        assert_eq!(select_active(&definitions, TariffType::Simple, date(2023, 8, 1)).unwrap().id, 5);
    }

    #[test]
    fn missing_tariff_gives_defaults() {
        let active = ActiveTariff::new(None);

        assert_eq!(active.loss_factor(), DEFAULT_LOSS_FACTOR);
        assert_eq!(active.buy_spread(), DEFAULT_BUY_SPREAD_EUR_KWH);
        assert_eq!(active.vat_rate(), DEFAULT_VAT_RATE);
        assert_eq!(active.export_multiplier(), DEFAULT_EXPORT_MULTIPLIER);
        assert_eq!(active.access_charge_for_hour(10), DEFAULT_ACCESS_CHARGE_EUR_KWH);
    }

    #[test]
    fn null_fields_give_defaults() {
        let active = ActiveTariff::new(Some(TariffDefinition {
            parameters: TariffParameters::LossFactor(LossFactorParameters {
                loss_factor: Some(1.02),
                ..LossFactorParameters::default()
            }),
            ..definition(1, TariffType::Simple, date(2025, 1, 1), date(2025, 12, 31))
        }));

        assert_eq!(active.loss_factor(), 1.02);
        assert_eq!(active.buy_spread(), DEFAULT_BUY_SPREAD_EUR_KWH);
        assert_eq!(active.vat_rate(), DEFAULT_VAT_RATE);
        assert_eq!(active.export_multiplier(), DEFAULT_EXPORT_MULTIPLIER);
    }

    #[test]
    fn access_charge_follows_peak_hours() {
        let active = peak_hours_tariff();

        assert_eq!(active.access_charge_for_hour(10), 0.12);
        assert_eq!(active.access_charge_for_hour(20), 0.12);
        assert_eq!(active.access_charge_for_hour(14), 0.05);
        assert_eq!(active.access_charge_for_hour(23), DEFAULT_ACCESS_CHARGE_EUR_KWH);
        assert_eq!(active.access_charge_for_hour(3), DEFAULT_ACCESS_CHARGE_EUR_KWH);
        assert_eq!(active.export_multiplier(), 0.9);
        assert_eq!(active.loss_factor(), DEFAULT_LOSS_FACTOR);
    }
}
