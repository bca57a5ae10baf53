use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day-of-week ordinal (0 = Sunday) of the weekly rest day.
pub const REST_DAY_ORDINAL: u8 = 6;

/// A date in the Bikram Sambat calendar.
///
/// Construction does not validate month lengths; use
/// [`crate::services::converter::bs_to_ad`] to check a date against the
/// calendar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BsDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BsDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for BsDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A named flag on a calendar day.
///
/// `is_holiday` is the authoritative marker: an annotation without it is a
/// notable date (festival, memorial day) but not a day off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAnnotation {
    pub name_en: Option<String>,
    pub name_np: Option<String>,
    pub is_holiday: bool,
}

impl EventAnnotation {
    pub fn holiday(name: impl Into<String>) -> Self {
        Self {
            name_en: Some(name.into()),
            name_np: None,
            is_holiday: true,
        }
    }

    pub fn observance(name: impl Into<String>) -> Self {
        Self {
            name_en: Some(name.into()),
            name_np: None,
            is_holiday: false,
        }
    }

    /// English name first, Nepali name as fallback. Blank names count as missing.
    pub fn display_name(&self) -> Option<&str> {
        [self.name_en.as_deref(), self.name_np.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

/// One validated calendar day as delivered by a calendar source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    pub local_date: BsDate,
    pub gregorian_date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub events: Vec<EventAnnotation>,
}

/// A day that is a rest day, a holiday, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedDay {
    pub local_date: BsDate,
    pub gregorian_date: NaiveDate,
    pub is_rest_day: bool,
    pub is_holiday: bool,
    pub display_name: String,
}

impl ClassifiedDay {
    pub fn kind_label(&self) -> &'static str {
        if self.is_holiday {
            "Holiday"
        } else {
            "Saturday"
        }
    }
}
