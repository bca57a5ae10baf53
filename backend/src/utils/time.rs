use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ConversionError;

/// Source of "now" for window and past-send decisions.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Resolves a local wall-clock time to an instant. Ambiguous times take the
/// earlier instant; times inside a DST gap are an error.
pub fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Tz>, ConversionError> {
    tz.from_local_datetime(&local)
        .earliest()
        .ok_or(ConversionError::NonexistentLocalTime(local))
}

/// Local midnight of `date` in `tz`.
pub fn start_of_day(tz: &Tz, date: NaiveDate) -> Result<DateTime<Tz>, ConversionError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(ConversionError::DateOutOfRange(date))?;
    resolve_local(tz, midnight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn fixed_clock_returns_its_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 11, 1, 6, 0, 0).unwrap();
        assert_eq!(FixedClock(instant).now_utc(), instant);
    }

    #[test]
    fn system_clock_is_close_to_utc_now() {
        let diff = (SystemClock.now_utc() - Utc::now()).num_seconds().abs();
        assert!(diff < 2, "Difference should be less than 2 seconds");
    }

    #[test]
    fn start_of_day_in_kathmandu_is_previous_evening_utc() {
        let tz = chrono_tz::Asia::Kathmandu;
        let date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let midnight = start_of_day(&tz, date).unwrap();

        assert_eq!(midnight.date_naive(), date);
        assert_eq!(midnight.hour(), 0);
        assert_eq!(
            midnight.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 11, 14, 18, 15, 0).unwrap()
        );
    }

    #[test]
    fn resolve_local_rejects_times_in_a_dst_gap() {
        let tz = chrono_tz::America::New_York;
        let gap = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(
            resolve_local(&tz, gap),
            Err(ConversionError::NonexistentLocalTime(gap))
        );
    }
}
