use std::fmt;
use std::fmt::Formatter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::models::GridTariffCostSlot;

/// Minutes in a full day, also the value of the `24:00` end-of-day marker
pub const MINUTES_PER_DAY: u32 = 1440;

/// A slot boundary as minutes since midnight, `24:00` being 1440
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(u32);

impl SlotTime {
    /// Returns a SlotTime from an HH:MM string
    ///
    /// # Arguments
    ///
    /// * 's' - time string, `24:00` is accepted as end of day
    pub fn parse(s: &str) -> Result<SlotTime, TimeFormatError> {
        parse_time_minutes(s).map(SlotTime)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl TryFrom<String> for SlotTime {
    type Error = TimeFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotTime::parse(&value)
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Parses an HH:MM string into minutes since midnight
///
/// # Arguments
///
/// * 's' - time string, hours 0-23 and minutes 0-59, or exactly `24:00`
pub fn parse_time_minutes(s: &str) -> Result<u32, TimeFormatError> {
    let err = || TimeFormatError(s.to_string());

    let (hour, minute) = s.trim().split_once(':').ok_or_else(err)?;
    let hour: u32 = hour.parse().map_err(|_| err())?;
    let minute: u32 = minute.parse().map_err(|_| err())?;

    match (hour, minute) {
        (24, 0) => Ok(MINUTES_PER_DAY),
        (0..=23, 0..=59) => Ok(hour * 60 + minute),
        _ => Err(err()),
    }
}

/// Checks whether value falls in [start, end). When start > end the range wraps past
/// midnight and value matches if it is at or after start, or before end.
///
/// # Arguments
///
/// * 'value' - the minute or hour of day to check
/// * 'start' - inclusive range start
/// * 'end' - exclusive range end
pub fn in_wrapping_range(value: u32, start: u32, end: u32) -> bool {
    if start <= end {
        start <= value && value < end
    } else {
        value >= start || value < end
    }
}

impl GridTariffCostSlot {
    /// Checks whether the slot covers the given minute of the day
    ///
    /// # Arguments
    ///
    /// * 'minutes_since_midnight' - minute of day (0-1439)
    pub fn contains_minute(&self, minutes_since_midnight: u32) -> bool {
        in_wrapping_range(minutes_since_midnight, self.start_time.minutes(), self.end_time.minutes())
    }
}

/// Returns the first slot covering the given time of day, in iteration order.
/// Slots are expected to already be narrowed to one tariff type, voltage level, season and day type.
///
/// # Arguments
///
/// * 'slots' - candidate slots
/// * 'hour' - hour of day (0-23)
/// * 'minute' - minute of hour (0-59)
pub fn resolve_slot<'a, I>(slots: I, hour: u32, minute: u32) -> Option<&'a GridTariffCostSlot>
where
    I: IntoIterator<Item = &'a GridTariffCostSlot>,
{
    let minutes_since_midnight = hour * 60 + minute;
    slots.into_iter().find(|s| s.contains_minute(minutes_since_midnight))
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid slot time '{0}', expected HH:MM")]
pub struct TimeFormatError(pub String);
