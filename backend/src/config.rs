use anyhow::anyhow;
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};

use crate::{error::BackendConfigError, push::onesignal::DEFAULT_ENDPOINT};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kathmandu";
pub const DEFAULT_CALENDAR_API_BASE_URL: &str = "https://npclapi.casualsnek.eu.org/v2";
pub const DEFAULT_CALENDAR_FILE_PATH: &str = "data/calendar.jsonl";
const API_KEY_PLACEHOLDER: &str = "YOUR_REST_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub time_zone: Tz,
    pub push: PushConfig,
    pub calendar_source: CalendarSourceConfig,
    pub http_timeout: Duration,
    pub scan_window_days: u32,
    pub daily_run_at: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarSourceConfig {
    Api { base_url: String },
    File { path: PathBuf },
}

#[derive(Clone, PartialEq, Eq)]
pub struct PushCredentials {
    pub app_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for PushCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushCredentials")
            .field("app_id", &self.app_id)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

impl PushConfig {
    /// Both credential halves, or the first one that is missing.
    pub fn credentials(&self) -> Result<PushCredentials, BackendConfigError> {
        let app_id = self
            .app_id
            .clone()
            .ok_or(BackendConfigError {
                missing: "ONESIGNAL_APP_ID",
            })?;
        let api_key = self
            .api_key
            .clone()
            .filter(|key| key != API_KEY_PLACEHOLDER)
            .ok_or(BackendConfigError {
                missing: "ONESIGNAL_API_KEY",
            })?;
        Ok(PushCredentials { app_id, api_key })
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `load` uses the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let time_zone_name =
            non_empty("APP_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let push = PushConfig {
            app_id: non_empty("ONESIGNAL_APP_ID"),
            api_key: non_empty("ONESIGNAL_API_KEY"),
            api_url: non_empty("ONESIGNAL_API_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        };

        let source_kind = non_empty("CALENDAR_SOURCE").unwrap_or_else(|| "api".to_string());
        let calendar_source = match source_kind.to_ascii_lowercase().as_str() {
            "api" => CalendarSourceConfig::Api {
                base_url: non_empty("CALENDAR_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CALENDAR_API_BASE_URL.to_string()),
            },
            "file" => CalendarSourceConfig::File {
                path: non_empty("CALENDAR_FILE_PATH")
                    .unwrap_or_else(|| DEFAULT_CALENDAR_FILE_PATH.to_string())
                    .into(),
            },
            other => return Err(anyhow!("Invalid CALENDAR_SOURCE value: {}", other)),
        };

        let http_timeout_secs: u64 = non_empty("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "20".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_TIMEOUT_SECS value"))?;

        let scan_window_days: u32 = non_empty("SCAN_WINDOW_DAYS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid SCAN_WINDOW_DAYS value"))?;
        if scan_window_days < 2 {
            return Err(anyhow!("SCAN_WINDOW_DAYS must be at least 2"));
        }

        let daily_run_raw = non_empty("DAILY_RUN_AT").unwrap_or_else(|| "00:05".to_string());
        let daily_run_at = NaiveTime::parse_from_str(&daily_run_raw, "%H:%M")
            .map_err(|_| anyhow!("Invalid DAILY_RUN_AT value: {}", daily_run_raw))?;

        Ok(Config {
            time_zone,
            push,
            calendar_source,
            http_timeout: Duration::from_secs(http_timeout_secs),
            scan_window_days,
            daily_run_at,
        })
    }

    /// Logs the effective configuration with secrets masked.
    pub fn log_summary(&self) {
        tracing::info!(
            time_zone = %self.time_zone,
            calendar_source = ?self.calendar_source,
            onesignal_app_id = self.push.app_id.as_deref().unwrap_or("<unset>"),
            onesignal_api_key = %mask_secret(self.push.api_key.as_deref().unwrap_or_default()),
            onesignal_api_url = %self.push.api_url,
            http_timeout_secs = self.http_timeout.as_secs(),
            scan_window_days = self.scan_window_days,
            daily_run_at = %self.daily_run_at.format("%H:%M"),
            "Loaded configuration from environment/.env"
        );
    }
}

pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}
