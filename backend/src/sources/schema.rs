//! Wire schema shared by every calendar source.
//!
//! ```json
//! {
//!   "date": {
//!     "bs": { "year": 2082, "month": 7, "day": 30 },
//!     "ad": { "year": 2025, "month": 11, "day": 15 }
//!   },
//!   "week_day": 6,
//!   "event": ["Tihar", { "en": "Bhai Tika", "np": "भाइटीका", "holiday": true }],
//!   "public_holiday": true
//! }
//! ```
//!
//! `ad` is optional and derived from `bs` when absent. The weekday always
//! comes from the AD date; a `week_day` that disagrees with it is malformed.
//! `public_holiday` marks every plain-string event as a holiday; object
//! events may carry their own `holiday` flag. A holiday day without any
//! event gets one unnamed holiday annotation.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{MalformedRecordError, RecordError},
    models::{BsDate, DayRecord, EventAnnotation},
    services::converter,
};

#[derive(Debug, Clone, Deserialize)]
pub struct WireDay {
    pub date: WireDates,
    #[serde(default)]
    pub week_day: Option<u8>,
    #[serde(default)]
    pub event: Option<Vec<WireEvent>>,
    #[serde(default)]
    pub public_holiday: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireDates {
    pub bs: WireYmd,
    #[serde(default)]
    pub ad: Option<WireYmd>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireYmd {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireEvent {
    Name(String),
    Detailed {
        #[serde(default)]
        en: Option<String>,
        #[serde(default)]
        np: Option<String>,
        #[serde(default)]
        holiday: Option<bool>,
    },
}

/// Deserializes and validates one day record.
pub fn parse_day(value: Value, location: &str) -> Result<DayRecord, RecordError> {
    let wire: WireDay = serde_json::from_value(value)
        .map_err(|e| MalformedRecordError::new(location, e.to_string()))?;
    wire.into_record(location)
}

impl WireDay {
    pub fn into_record(self, location: &str) -> Result<DayRecord, RecordError> {
        let bs = self.date.bs;
        let local_date = BsDate::new(bs.year, bs.month, bs.day);
        if !(1..=12).contains(&bs.month) || !(1..=32).contains(&bs.day) {
            return Err(MalformedRecordError::new(
                location,
                format!("invalid BS date {}", local_date),
            )
            .into());
        }

        let gregorian_date = match self.date.ad {
            Some(ad) => NaiveDate::from_ymd_opt(ad.year, ad.month, ad.day).ok_or_else(|| {
                MalformedRecordError::new(
                    location,
                    format!("invalid AD date {}-{:02}-{:02}", ad.year, ad.month, ad.day),
                )
            })?,
            None => converter::bs_to_ad(local_date).map_err(|source| RecordError::Conversion {
                location: location.to_string(),
                source,
            })?,
        };

        let day_of_week = gregorian_date.weekday().num_days_from_sunday() as u8;
        if let Some(claimed) = self.week_day.filter(|claimed| *claimed != day_of_week) {
            return Err(MalformedRecordError::new(
                location,
                format!(
                    "week_day {} does not match {} ({})",
                    claimed,
                    gregorian_date,
                    gregorian_date.weekday()
                ),
            )
            .into());
        }

        let mut events: Vec<EventAnnotation> = self
            .event
            .unwrap_or_default()
            .into_iter()
            .map(|event| match event {
                WireEvent::Name(name) => EventAnnotation {
                    name_en: Some(name),
                    name_np: None,
                    is_holiday: self.public_holiday,
                },
                WireEvent::Detailed { en, np, holiday } => EventAnnotation {
                    name_en: en,
                    name_np: np,
                    is_holiday: holiday.unwrap_or(self.public_holiday),
                },
            })
            .collect();

        if self.public_holiday && !events.iter().any(|event| event.is_holiday) {
            events.push(EventAnnotation {
                name_en: None,
                name_np: None,
                is_holiday: true,
            });
        }

        Ok(DayRecord {
            local_date,
            gregorian_date,
            day_of_week,
            events,
        })
    }
}
