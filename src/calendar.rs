use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use crate::manager_tariff_store::{TariffStore, TariffStoreError};
use crate::models::{DayType, Season};

// Summer runs from the last Sunday of March to the last Sunday of October, both inclusive
const SUMMER_START_MONTH: u32 = 3;
const SUMMER_END_MONTH: u32 = 10;

/// Everything about a point in time that selects a cost slot
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimeOfUse {
    pub date: NaiveDate,
    pub season: Season,
    pub day_type: DayType,
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfUse {
    /// Classifies a local date and time
    ///
    /// # Arguments
    ///
    /// * 'local' - wall clock date and time at the site
    /// * 'store' - tariff store to look holidays up in
    pub fn classify<S: TariffStore + ?Sized>(local: NaiveDateTime, store: &S) -> Result<TimeOfUse, TariffStoreError> {
        let date = local.date();

        Ok(TimeOfUse {
            date,
            season: season(date),
            day_type: day_type(date, |d| store.is_holiday(d))?,
            hour: local.hour(),
            minute: local.minute(),
        })
    }
}

/// Returns the last Sunday of the given month
///
/// # Arguments
///
/// * 'year' - the year
/// * 'month' - the month (1-12)
pub fn last_sunday_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()?;
    let days_back = (last.weekday().num_days_from_monday() + 1) % 7;

    last.checked_sub_signed(TimeDelta::days(days_back as i64))
}

/// Returns the tariff season a date falls into
///
/// # Arguments
///
/// * 'date' - the date to classify
pub fn season(date: NaiveDate) -> Season {
    let year = date.year();
    match (last_sunday_of_month(year, SUMMER_START_MONTH), last_sunday_of_month(year, SUMMER_END_MONTH)) {
        (Some(summer_start), Some(summer_end)) if summer_start <= date && date <= summer_end => Season::Summer,
        _ => Season::Winter,
    }
}

/// Returns the day type of a date, holidays count as Sundays whatever day they fall on
///
/// # Arguments
///
/// * 'date' - the date to classify
/// * 'is_holiday' - holiday lookup
pub fn day_type<F, E>(date: NaiveDate, is_holiday: F) -> Result<DayType, E>
where
    F: FnOnce(NaiveDate) -> Result<bool, E>,
{
    if is_holiday(date)? {
        return Ok(DayType::Sunday);
    }

    Ok(match date.weekday() {
        Weekday::Sat => DayType::Saturday,
        Weekday::Sun => DayType::Sunday,
        _ => DayType::Weekday,
    })
}
