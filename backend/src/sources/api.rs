use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{ensure_valid_range, schema, CalendarSource, DayStream, SourceItem};
use crate::error::DataSourceError;

/// Remote range API answering
/// `GET {base}/range/ad/from/{YYYY-MM-DD}/to/{YYYY-MM-DD}` with a
/// `year -> month -> day -> record` document.
pub struct ApiCalendarSource {
    client: Client,
    base_url: String,
}

impl ApiCalendarSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bida-backend/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to initialize HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn range_url(&self, range_start: NaiveDate, range_end: NaiveDate) -> String {
        format!(
            "{}/range/ad/from/{}/to/{}",
            self.base_url.trim_end_matches('/'),
            range_start.format("%Y-%m-%d"),
            range_end.format("%Y-%m-%d")
        )
    }
}

#[async_trait]
impl CalendarSource for ApiCalendarSource {
    async fn fetch_days(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError> {
        ensure_valid_range(range_start, range_end)?;

        let url = self.range_url(range_start, range_end);
        tracing::info!(%url, "Querying calendar API");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataSourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        let items = flatten_payload(payload, range_start, range_end)?;
        tracing::debug!(records = items.len(), "Calendar API response received");

        Ok(stream::iter(items.into_iter().map(Ok)).boxed())
    }

    fn describe(&self) -> String {
        format!("calendar API at {}", self.base_url)
    }
}

/// Children of a year/month node. Objects are ordered by numeric key;
/// arrays are keyed by 1-based position.
fn entries(node: Value) -> Option<Vec<(String, Value)>> {
    match node {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| {
                let key = |k: &str| k.parse::<u32>().unwrap_or(u32::MAX);
                key(a).cmp(&key(b)).then_with(|| a.cmp(b))
            });
            Some(entries)
        }
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| ((index + 1).to_string(), item))
                .collect(),
        ),
        _ => None,
    }
}

fn flatten_payload(
    payload: Value,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<SourceItem>, DataSourceError> {
    let years = match payload {
        Value::Object(_) => entries(payload).unwrap_or_default(),
        other => {
            return Err(DataSourceError::Payload(format!(
                "expected an object keyed by year, got {}",
                type_name(&other)
            )))
        }
    };

    let mut items = Vec::new();
    for (year, months) in years {
        let Some(months) = entries(months) else {
            tracing::warn!(%year, "Skipping non-object year entry in calendar response");
            continue;
        };
        for (month, days) in months {
            let Some(days) = entries(days) else {
                tracing::warn!(%year, %month, "Skipping non-object month entry in calendar response");
                continue;
            };
            for (day, value) in days {
                let location = format!("{}-{}-{}", year, month, day);
                match schema::parse_day(value, &location) {
                    Ok(record)
                        if record.gregorian_date >= range_start
                            && record.gregorian_date <= range_end =>
                    {
                        items.push(SourceItem::Day(record));
                    }
                    Ok(record) => {
                        tracing::debug!(
                            %location,
                            gregorian_date = %record.gregorian_date,
                            "Ignoring calendar record outside requested range"
                        );
                    }
                    Err(err) => items.push(SourceItem::Rejected(err)),
                }
            }
        }
    }

    Ok(items)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use chrono::Datelike;
    use serde_json::json;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// A Mangsir 2082 day; Mangsir 1 is 2025-11-16.
    fn day_json(bs_day: u32) -> Value {
        let ad = date(2025, 11, 15) + chrono::Days::new(u64::from(bs_day));
        json!({
            "date": {
                "bs": { "year": 2082, "month": 8, "day": bs_day },
                "ad": { "year": ad.year(), "month": ad.month(), "day": ad.day() }
            }
        })
    }

    #[test]
    fn range_url_uses_iso_dates_and_trims_slash() {
        let source = ApiCalendarSource::new("https://example.test/v2/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.range_url(date(2025, 11, 2), date(2025, 12, 1)),
            "https://example.test/v2/range/ad/from/2025-11-02/to/2025-12-01"
        );
    }

    #[test]
    fn flatten_orders_days_numerically() {
        let payload = json!({
            "2082": { "8": { "10": day_json(10), "2": day_json(2), "1": day_json(1) } }
        });
        let items = flatten_payload(payload, date(2025, 11, 1), date(2025, 11, 30)).unwrap();
        let days: Vec<_> = items
            .iter()
            .map(|item| match item {
                SourceItem::Day(record) => record.local_date.day,
                SourceItem::Rejected(_) => 0,
            })
            .collect();
        assert_eq!(days, vec![1, 2, 10]);
    }

    #[test]
    fn flatten_keeps_malformed_records_as_rejections() {
        let payload = json!({
            "2082": { "8": { "1": day_json(1), "2": { "date": {} } } }
        });
        let items = flatten_payload(payload, date(2025, 11, 1), date(2025, 11, 30)).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[1],
            SourceItem::Rejected(RecordError::Malformed(err)) if err.location == "2082-8-2"
        ));
    }

    #[test]
    fn flatten_skips_non_object_nodes_and_out_of_range_days() {
        let payload = json!({
            "2082": { "8": { "1": day_json(1), "20": day_json(20) }, "meta": "ignored" },
            "note": 5
        });
        let items = flatten_payload(payload, date(2025, 11, 10), date(2025, 11, 30)).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn flatten_accepts_day_arrays() {
        let payload = json!({ "2082": { "8": [day_json(1), day_json(2)] } });
        let items = flatten_payload(payload, date(2025, 11, 1), date(2025, 11, 30)).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn non_object_payload_is_a_data_source_error() {
        let err = flatten_payload(json!([1, 2]), date(2025, 11, 1), date(2025, 11, 30)).unwrap_err();
        assert!(matches!(err, DataSourceError::Payload(msg) if msg.contains("an array")));
    }
}
