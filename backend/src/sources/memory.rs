use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use std::sync::Arc;

use super::{ensure_valid_range, CalendarSource, DayStream, SourceItem};
use crate::error::DataSourceError;

/// Calendar held in memory. Day records outside the requested range are
/// filtered out; rejections are always passed through.
#[derive(Clone, Default)]
pub struct InMemoryCalendarSource {
    items: Arc<Vec<SourceItem>>,
}

impl InMemoryCalendarSource {
    pub fn new(items: impl IntoIterator<Item = SourceItem>) -> Self {
        Self {
            items: Arc::new(items.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CalendarSource for InMemoryCalendarSource {
    async fn fetch_days(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError> {
        ensure_valid_range(range_start, range_end)?;

        let items: Vec<_> = self
            .items
            .iter()
            .filter(|item| match item {
                SourceItem::Day(record) => {
                    record.gregorian_date >= range_start && record.gregorian_date <= range_end
                }
                SourceItem::Rejected(_) => true,
            })
            .cloned()
            .map(Ok)
            .collect();

        Ok(stream::iter(items).boxed())
    }

    fn describe(&self) -> String {
        format!("in-memory calendar ({} items)", self.items.len())
    }
}
