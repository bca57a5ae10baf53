use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// The calendar could not be obtained at all. Aborts the current run.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("calendar request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to read calendar file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid calendar payload: {0}")]
    Payload(String),
    #[error("invalid calendar range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// One day record did not match the calendar schema. The record is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed day record at {location}: {reason}")]
pub struct MalformedRecordError {
    pub location: String,
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Date outside the conversion table or structurally invalid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("month {0} is outside 1-12")]
    InvalidMonth(u32),
    #[error("day {day} is outside 1-{max} for {year}-{month:02}")]
    InvalidDay {
        year: i32,
        month: u32,
        day: u32,
        max: u32,
    },
    #[error("BS year {year} is outside the supported range {min}-{max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
    #[error("date {0} is outside the supported range")]
    DateOutOfRange(NaiveDate),
    #[error("local time {0} does not exist in the configured time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// A record rejected at the calendar source boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),
    #[error("unconvertible day record at {location}: {source}")]
    Conversion {
        location: String,
        #[source]
        source: ConversionError,
    },
}

/// Push credentials are missing; every dispatch of the run is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("push backend not configured: {missing} is missing")]
pub struct BackendConfigError {
    pub missing: &'static str,
}

/// A single push submission failed. Never escalates past the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("push backend rejected the request with status {status}")]
    Rejected { status: u16, body: Option<Value> },
    #[error("push backend request timed out")]
    Timeout,
    #[error("push backend request failed: {0}")]
    Network(String),
    #[error("push backend response could not be read: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            DispatchError::Rejected { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout
        } else if err.is_decode() {
            DispatchError::InvalidResponse(err.to_string())
        } else {
            DispatchError::Network(err.to_string())
        }
    }
}

/// Errors that end a pipeline run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("failed to compute scan window: {0}")]
    Window(#[source] ConversionError),
}
