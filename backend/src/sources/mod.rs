//! Calendar data providers.
//!
//! Every provider yields a lazy stream of [`SourceItem`]s for a Gregorian
//! date range. Records that fail validation are yielded as
//! [`SourceItem::Rejected`] so the pipeline can count and skip them; a
//! stream error means the calendar itself could not be read.

pub mod api;
pub mod file;
pub mod memory;
pub mod schema;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;

use crate::{
    error::{DataSourceError, RecordError},
    models::DayRecord,
};

pub use api::ApiCalendarSource;
pub use file::FileCalendarSource;
pub use memory::InMemoryCalendarSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Day(DayRecord),
    Rejected(RecordError),
}

pub type DayStream = BoxStream<'static, Result<SourceItem, DataSourceError>>;

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Days whose Gregorian date lies in `range_start..=range_end`.
    async fn fetch_days(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

pub(crate) fn ensure_valid_range(start: NaiveDate, end: NaiveDate) -> Result<(), DataSourceError> {
    if start > end {
        Err(DataSourceError::InvalidRange { start, end })
    } else {
        Ok(())
    }
}
