use chrono::{Days, Utc};
use chrono_tz::Tz;

use crate::{
    error::ConversionError,
    models::{ClassifiedDay, NotificationPlan, OffsetKind},
    utils::time::resolve_local,
};

/// Builds the three notifications for a day already known to be in the
/// scan window, in `OffsetKind::ALL` order.
pub fn plan_notifications(
    day: &ClassifiedDay,
    tz: &Tz,
) -> Result<[NotificationPlan; 3], ConversionError> {
    let [first, second, third] = OffsetKind::ALL;
    Ok([
        plan_for(day, first, tz)?,
        plan_for(day, second, tz)?,
        plan_for(day, third, tz)?,
    ])
}

fn plan_for(
    day: &ClassifiedDay,
    kind: OffsetKind,
    tz: &Tz,
) -> Result<NotificationPlan, ConversionError> {
    let send_date = day
        .gregorian_date
        .checked_sub_days(Days::new(kind.days_before()))
        .ok_or(ConversionError::DateOutOfRange(day.gregorian_date))?;
    let local = send_date
        .and_hms_milli_opt(kind.send_hour(), 0, 0, 0)
        .ok_or(ConversionError::DateOutOfRange(send_date))?;
    let send_at = resolve_local(tz, local)?;

    Ok(NotificationPlan {
        occasion: day.display_name.clone(),
        local_date: day.local_date.to_string(),
        offset_kind: kind,
        send_at_utc: send_at.with_timezone(&Utc),
    })
}
