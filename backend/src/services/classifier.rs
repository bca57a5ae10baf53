use crate::models::{ClassifiedDay, DayRecord, REST_DAY_ORDINAL};

pub const REST_DAY_LABEL: &str = "Saturday";
pub const HOLIDAY_FALLBACK_LABEL: &str = "Holiday";

/// Classifies a day as rest day and/or holiday.
///
/// Returns `None` for ordinary working days. When several annotations carry
/// the holiday marker, the first one in source order names the day.
pub fn classify(record: &DayRecord) -> Option<ClassifiedDay> {
    let is_rest_day = record.day_of_week == REST_DAY_ORDINAL;
    let holiday = record.events.iter().find(|event| event.is_holiday);

    if !is_rest_day && holiday.is_none() {
        return None;
    }

    let display_name = match holiday {
        Some(event) => event
            .display_name()
            .unwrap_or(HOLIDAY_FALLBACK_LABEL)
            .to_string(),
        None => REST_DAY_LABEL.to_string(),
    };

    Some(ClassifiedDay {
        local_date: record.local_date,
        gregorian_date: record.gregorian_date,
        is_rest_day,
        is_holiday: holiday.is_some(),
        display_name,
    })
}
