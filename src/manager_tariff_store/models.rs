use chrono::NaiveDate;
use serde::Deserialize;
use crate::manager_tariff_store::errors::TariffStoreError;
use crate::models::{GridTariffCostSlot, LossFactorParameters, PeakHours, PeakHoursParameters, SiteSettings, TariffDefinition, TariffParameters, TariffType};

/// Layout of a tariff data file
#[derive(Deserialize, Debug)]
pub struct TariffData {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub tariffs: Vec<TariffRecord>,
    #[serde(default)]
    pub cost_slots: Vec<GridTariffCostSlot>,
}

/// Peak hours as stored, either as a table or as the JSON text older stores kept
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum PeakHoursField {
    Table(PeakHours),
    Json(String),
}

impl PeakHoursField {
    fn into_peak_hours(self) -> Result<PeakHours, serde_json::Error> {
        match self {
            PeakHoursField::Table(peak_hours) => Ok(peak_hours),
            PeakHoursField::Json(json) if json.trim().is_empty() => Ok(PeakHours::default()),
            PeakHoursField::Json(json) => serde_json::from_str(&json),
        }
    }
}

/// A tariff definition row as stored, with the fields of both generations flattened together
#[derive(Deserialize, Clone, Debug)]
pub struct TariffRecord {
    pub id: Option<u64>,
    pub tariff_type: TariffType,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub loss_factor: Option<f64>,
    pub buy_spread_eur_kwh: Option<f64>,
    pub vat_rate: Option<f64>,
    pub export_multiplier: Option<f64>,
    pub peak_hours: Option<PeakHoursField>,
    pub access_charge_peak: Option<f64>,
    pub access_charge_off_peak: Option<f64>,
    pub access_charge_super_off_peak: Option<f64>,
}

/// Partial update of a tariff definition, only provided fields are changed
#[derive(Deserialize, Clone, Default, Debug)]
pub struct TariffUpdate {
    pub tariff_type: Option<TariffType>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub loss_factor: Option<f64>,
    pub buy_spread_eur_kwh: Option<f64>,
    pub vat_rate: Option<f64>,
    pub export_multiplier: Option<f64>,
    pub peak_hours: Option<PeakHoursField>,
    pub access_charge_peak: Option<f64>,
    pub access_charge_off_peak: Option<f64>,
    pub access_charge_super_off_peak: Option<f64>,
}

impl TariffRecord {
    /// Classifies the record into one of the two tariff generations
    ///
    /// # Arguments
    ///
    /// * 'id' - the id the resulting definition gets
    pub fn into_definition(self, id: u64) -> Result<TariffDefinition, TariffStoreError> {
        if self.valid_from > self.valid_to {
            return Err(TariffStoreError::ValidityWindowError(id));
        }

        let loss_factor_based = self.loss_factor.is_some()
            || self.buy_spread_eur_kwh.is_some()
            || self.vat_rate.is_some();
        let peak_hours_based = self.peak_hours.is_some()
            || self.access_charge_peak.is_some()
            || self.access_charge_off_peak.is_some()
            || self.access_charge_super_off_peak.is_some();

        let parameters = match (loss_factor_based, peak_hours_based) {
            (true, true) => return Err(TariffStoreError::MixedGenerationError(id)),
            (false, true) => TariffParameters::PeakHours(PeakHoursParameters {
                peak_hours: match self.peak_hours {
                    Some(field) => field.into_peak_hours()?,
                    None => PeakHours::default(),
                },
                access_charge_peak: self.access_charge_peak,
                access_charge_off_peak: self.access_charge_off_peak,
                access_charge_super_off_peak: self.access_charge_super_off_peak,
                export_multiplier: self.export_multiplier,
            }),
            _ => TariffParameters::LossFactor(LossFactorParameters {
                loss_factor: self.loss_factor,
                buy_spread_eur_kwh: self.buy_spread_eur_kwh,
                vat_rate: self.vat_rate,
                export_multiplier: self.export_multiplier,
            }),
        };

        Ok(TariffDefinition {
            id,
            tariff_type: self.tariff_type,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            parameters,
        })
    }

    /// Overlays the provided fields of an update onto the record
    ///
    /// # Arguments
    ///
    /// * 'update' - fields to change
    pub fn merge(mut self, update: TariffUpdate) -> TariffRecord {
        self.tariff_type = update.tariff_type.unwrap_or(self.tariff_type);
        self.valid_from = update.valid_from.unwrap_or(self.valid_from);
        self.valid_to = update.valid_to.unwrap_or(self.valid_to);
        self.loss_factor = update.loss_factor.or(self.loss_factor);
        self.buy_spread_eur_kwh = update.buy_spread_eur_kwh.or(self.buy_spread_eur_kwh);
        self.vat_rate = update.vat_rate.or(self.vat_rate);
        self.export_multiplier = update.export_multiplier.or(self.export_multiplier);
        self.peak_hours = update.peak_hours.or(self.peak_hours);
        self.access_charge_peak = update.access_charge_peak.or(self.access_charge_peak);
        self.access_charge_off_peak = update.access_charge_off_peak.or(self.access_charge_off_peak);
        self.access_charge_super_off_peak = update.access_charge_super_off_peak.or(self.access_charge_super_off_peak);

        self
    }
}

impl From<&TariffDefinition> for TariffRecord {
    fn from(definition: &TariffDefinition) -> Self {
        let mut record = TariffRecord {
            id: Some(definition.id),
            tariff_type: definition.tariff_type,
            valid_from: definition.valid_from,
            valid_to: definition.valid_to,
            loss_factor: None,
            buy_spread_eur_kwh: None,
            vat_rate: None,
            export_multiplier: None,
            peak_hours: None,
            access_charge_peak: None,
            access_charge_off_peak: None,
            access_charge_super_off_peak: None,
        };

        match &definition.parameters {
            TariffParameters::LossFactor(p) => {
                record.loss_factor = p.loss_factor;
                record.buy_spread_eur_kwh = p.buy_spread_eur_kwh;
                record.vat_rate = p.vat_rate;
                record.export_multiplier = p.export_multiplier;
            },
            TariffParameters::PeakHours(p) => {
                record.peak_hours = Some(PeakHoursField::Table(p.peak_hours.clone()));
                record.access_charge_peak = p.access_charge_peak;
                record.access_charge_off_peak = p.access_charge_off_peak;
                record.access_charge_super_off_peak = p.access_charge_super_off_peak;
                record.export_multiplier = p.export_multiplier;
            },
        }

        record
    }
}
