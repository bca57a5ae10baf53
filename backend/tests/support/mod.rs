#![allow(dead_code)]
use async_trait::async_trait;
use axum::Router;
use bida_backend::{
    error::{DataSourceError, DispatchError},
    models::{DayRecord, EventAnnotation},
    push::{PushBackend, PushPayload},
    services::converter,
    sources::{CalendarSource, DayStream, SourceItem},
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Kathmandu;
use std::{
    io,
    sync::{Arc, Mutex},
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A Kathmandu wall-clock time as a UTC instant.
pub fn kathmandu(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Kathmandu
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous Kathmandu time")
        .with_timezone(&Utc)
}

/// A day record whose BS date is derived from `ad`.
pub fn day_record(ad: NaiveDate, day_of_week: u8, events: Vec<EventAnnotation>) -> DayRecord {
    DayRecord {
        local_date: converter::ad_to_bs(ad).expect("date inside conversion table"),
        gregorian_date: ad,
        day_of_week,
        events,
    }
}

pub fn day(ad: NaiveDate, day_of_week: u8, events: Vec<EventAnnotation>) -> SourceItem {
    SourceItem::Day(day_record(ad, day_of_week, events))
}

/// Push backend that records every payload and accepts it, unless its
/// heading starts with the configured failure prefix.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<PushPayload>>>,
    fail_prefix: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(prefix: &str) -> Self {
        Self {
            calls: Arc::default(),
            fail_prefix: Some(prefix.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<PushPayload> {
        self.calls.lock().expect("lock calls").clone()
    }

    pub fn headings(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|payload| payload.headings["en"].clone())
            .collect()
    }
}

#[async_trait]
impl PushBackend for RecordingBackend {
    async fn schedule_notification(&self, payload: &PushPayload) -> Result<String, DispatchError> {
        let position = {
            let mut calls = self.calls.lock().expect("lock calls");
            calls.push(payload.clone());
            calls.len()
        };
        match &self.fail_prefix {
            Some(prefix) if payload.headings["en"].starts_with(prefix.as_str()) => {
                Err(DispatchError::Rejected {
                    status: 400,
                    body: Some(serde_json::json!({ "errors": ["rejected by test backend"] })),
                })
            }
            _ => Ok(format!("notification-{}", position)),
        }
    }
}

/// Calendar source that cannot be reached.
pub struct FailingSource;

#[async_trait]
impl CalendarSource for FailingSource {
    async fn fetch_days(
        &self,
        _range_start: NaiveDate,
        _range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError> {
        Err(DataSourceError::Status {
            status: 503,
            body: "service unavailable".into(),
        })
    }

    fn describe(&self) -> String {
        "failing source".into()
    }
}

/// Calendar source that panics when queried.
pub struct PanickingSource;

#[async_trait]
impl CalendarSource for PanickingSource {
    async fn fetch_days(
        &self,
        _range_start: NaiveDate,
        _range_end: NaiveDate,
    ) -> Result<DayStream, DataSourceError> {
        panic!("calendar source exploded");
    }

    fn describe(&self) -> String {
        "panicking source".into()
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test router");
    });
    format!("http://{}", addr)
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Subscriber writing plain-text events into this buffer.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let buffer = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || buffer.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("lock log buffer")).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("lock log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
