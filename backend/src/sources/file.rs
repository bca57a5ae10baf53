use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use futures::{stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};

use super::{ensure_valid_range, schema, CalendarSource, DayStream, SourceItem};
use crate::{error::DataSourceError, models::BsDate, services::converter};

/// Local JSON-lines calendar: one BS month per line, in chronological order.
///
/// ```json
/// {"year": 2082, "month": 7, "days": [{"date": {"bs": {...}}, ...}, ...]}
/// ```
///
/// The file is read line by line; reading stops at the first month that
/// starts well after the requested range. Month placement only decides which
/// lines are worth parsing. Whether a day is in range is decided by its own
/// AD date.
pub struct FileCalendarSource {
    path: PathBuf,
}

impl FileCalendarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Deserialize)]
struct MonthLine {
    year: i32,
    month: u32,
    days: Vec<Value>,
}

enum MonthScan {
    Before,
    After,
    Items(Vec<SourceItem>),
}

struct Cursor {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    path: PathBuf,
    range_start: NaiveDate,
    range_end: NaiveDate,
}

#[async_trait]
impl CalendarSource for FileCalendarSource {
    async fn fetch_days(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError> {
        ensure_valid_range(range_start, range_end)?;

        let file = File::open(&self.path)
            .await
            .map_err(|source| DataSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!(path = %self.path.display(), "Reading calendar file");

        let cursor = Cursor {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            path: self.path.clone(),
            range_start,
            range_end,
        };

        let months = stream::unfold(Some(cursor), |state| async move {
            let Some(mut cursor) = state else {
                return None;
            };
            loop {
                let line = match cursor.lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => return None,
                    Err(source) => {
                        let err = DataSourceError::Io {
                            path: cursor.path.clone(),
                            source,
                        };
                        return Some((vec![Err(err)], None));
                    }
                };
                cursor.line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }

                match scan_month(&line, cursor.line_no, cursor.range_start, cursor.range_end) {
                    Ok(MonthScan::Before) => continue,
                    Ok(MonthScan::After) => return None,
                    Ok(MonthScan::Items(items)) => {
                        let items: Vec<_> = items.into_iter().map(Ok).collect();
                        return Some((items, Some(cursor)));
                    }
                    Err(err) => return Some((vec![Err(err)], None)),
                }
            }
        });

        Ok(months.flat_map(stream::iter).boxed())
    }

    fn describe(&self) -> String {
        format!("calendar file {}", self.path.display())
    }
}

/// Published calendars may place a month's edge days a little off the
/// conversion table; lines this close to the range are still parsed.
const MONTH_EDGE_MARGIN_DAYS: u64 = 3;

/// Gregorian span of a BS month, when the month is inside the table.
fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = converter::bs_to_ad(BsDate::new(year, month, 1)).ok()?;
    let length = converter::days_in_month(year, month).ok()?;
    let last = first.checked_add_days(Days::new(u64::from(length - 1)))?;
    Some((first, last))
}

fn scan_month(
    line: &str,
    line_no: usize,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<MonthScan, DataSourceError> {
    let month: MonthLine = serde_json::from_str(line)
        .map_err(|e| DataSourceError::Payload(format!("line {}: {}", line_no, e)))?;

    if let Some((first, last)) = month_span(month.year, month.month) {
        let margin = Days::new(MONTH_EDGE_MARGIN_DAYS);
        if last.checked_add_days(margin).is_some_and(|edge| edge < range_start) {
            return Ok(MonthScan::Before);
        }
        if range_end.checked_add_days(margin).is_some_and(|edge| first > edge) {
            return Ok(MonthScan::After);
        }
    }

    let mut items = Vec::new();
    for (index, value) in month.days.into_iter().enumerate() {
        let location = format!("line {} day {}", line_no, index + 1);
        match schema::parse_day(value, &location) {
            Ok(record)
                if record.gregorian_date >= range_start && record.gregorian_date <= range_end =>
            {
                items.push(SourceItem::Day(record));
            }
            Ok(_) => {}
            Err(err) => items.push(SourceItem::Rejected(err)),
        }
    }

    Ok(MonthScan::Items(items))
}
