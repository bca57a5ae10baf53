//! Calendar and notification models shared by sources, services and the driver.

pub mod calendar;
pub mod notification;

pub use calendar::{BsDate, ClassifiedDay, DayRecord, EventAnnotation, REST_DAY_ORDINAL};
pub use notification::{DispatchOutcome, DispatchResult, NotificationPlan, OffsetKind};
