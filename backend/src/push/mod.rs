//! Outbound push-notification backends.

pub mod onesignal;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{error::DispatchError, models::NotificationPlan};

pub use onesignal::OneSignalBackend;

/// Audience segment every notification is sent to.
pub const TARGET_SCOPE_ALL: &str = "All";
pub const DEFAULT_LOCALE: &str = "en";

/// Backend-neutral notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload {
    /// Same for every submission of the same plan; the backend drops repeats.
    pub idempotency_key: Uuid,
    pub target_scope: String,
    pub send_after: DateTime<Utc>,
    pub contents: BTreeMap<String, String>,
    pub headings: BTreeMap<String, String>,
}

impl PushPayload {
    pub fn from_plan(plan: &NotificationPlan) -> Self {
        Self {
            idempotency_key: plan.idempotency_key(),
            target_scope: TARGET_SCOPE_ALL.to_string(),
            send_after: plan.send_at_utc,
            contents: BTreeMap::from([(DEFAULT_LOCALE.to_string(), plan.body())]),
            headings: BTreeMap::from([(DEFAULT_LOCALE.to_string(), plan.heading())]),
        }
    }
}

/// A push service that accepts scheduled notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushBackend: Send + Sync {
    /// Schedules one notification; returns the backend's notification id.
    async fn schedule_notification(&self, payload: &PushPayload) -> Result<String, DispatchError>;
}
