use anyhow::anyhow;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};

use super::{PushBackend, PushPayload};
use crate::{config::PushCredentials, error::DispatchError};

pub const DEFAULT_ENDPOINT: &str = "https://onesignal.com/api/v1/notifications";

/// OneSignal REST backend (`POST /api/v1/notifications`).
pub struct OneSignalBackend {
    client: Client,
    endpoint: String,
    credentials: PushCredentials,
}

impl OneSignalBackend {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: PushCredentials,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bida-backend/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to initialize HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateNotificationRequest<'a> {
    app_id: &'a str,
    /// OneSignal keeps keys for 30 days and answers repeats with the
    /// original notification instead of scheduling a copy.
    idempotency_key: String,
    included_segments: [&'a str; 1],
    send_after: String,
    contents: &'a BTreeMap<String, String>,
    headings: &'a BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CreateNotificationResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

fn has_errors(errors: &Option<Value>) -> bool {
    match errors {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

#[async_trait]
impl PushBackend for OneSignalBackend {
    async fn schedule_notification(&self, payload: &PushPayload) -> Result<String, DispatchError> {
        let request = CreateNotificationRequest {
            app_id: &self.credentials.app_id,
            idempotency_key: payload.idempotency_key.to_string(),
            included_segments: [payload.target_scope.as_str()],
            send_after: payload
                .send_after
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            contents: &payload.contents,
            headings: &payload.headings,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", self.credentials.api_key),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body: parse_body(&text),
            });
        }

        let decoded: CreateNotificationResponse = serde_json::from_str(&text)
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))?;
        let id = decoded.id.filter(|id| !id.is_empty());

        // A 200 without an id but with errors means nothing was scheduled.
        match id {
            Some(id) => Ok(id),
            None if has_errors(&decoded.errors) => Err(DispatchError::Rejected {
                status: status.as_u16(),
                body: parse_body(&text),
            }),
            None => Ok("success".to_string()),
        }
    }
}
