use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;

use crate::{error::ConversionError, utils::time::start_of_day};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// The rolling scan window `(start of today, start of today + N days)`.
///
/// Both bounds are exclusive: today and the day N days out are never
/// scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    today: NaiveDate,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl ScanWindow {
    pub fn starting_at(now: DateTime<Tz>, days: u32) -> Result<Self, ConversionError> {
        let tz = now.timezone();
        let today = now.date_naive();
        let last = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or(ConversionError::DateOutOfRange(today))?;

        Ok(Self {
            today,
            start: start_of_day(&tz, today)?,
            end: start_of_day(&tz, last)?,
        })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn contains(&self, candidate_midnight: DateTime<Tz>) -> bool {
        candidate_midnight > self.start && candidate_midnight < self.end
    }

    /// Evaluates `date` by its local midnight in the window's time zone.
    pub fn contains_date(&self, date: NaiveDate) -> Result<bool, ConversionError> {
        let midnight = start_of_day(&self.start.timezone(), date)?;
        Ok(self.contains(midnight))
    }

    /// Inclusive date range to request from a calendar source: tomorrow
    /// through the window's exclusive end date.
    pub fn fetch_range(&self) -> (NaiveDate, NaiveDate) {
        let first = self.today.succ_opt().unwrap_or(self.today);
        (first, self.end.date_naive())
    }
}
