use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for plan idempotency keys. Changing it makes every
/// previously scheduled notification look new to the push backend.
const PLAN_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x5c1d_2f0e_8a4b_4e07_9d6b_b1da_7e5a_0c31);

/// Lead time of a notification relative to the day it announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetKind {
    TwoDaysPrior,
    OneDayPrior,
    SameDay,
}

impl OffsetKind {
    /// Planning order for every qualifying day.
    pub const ALL: [OffsetKind; 3] = [
        OffsetKind::TwoDaysPrior,
        OffsetKind::OneDayPrior,
        OffsetKind::SameDay,
    ];

    pub fn days_before(&self) -> u64 {
        match self {
            OffsetKind::TwoDaysPrior => 2,
            OffsetKind::OneDayPrior => 1,
            OffsetKind::SameDay => 0,
        }
    }

    /// Local wall-clock hour of the send instant.
    pub fn send_hour(&self) -> u32 {
        match self {
            OffsetKind::TwoDaysPrior => 20,
            OffsetKind::OneDayPrior | OffsetKind::SameDay => 10,
        }
    }

    /// Stable identifier, same spelling as the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetKind::TwoDaysPrior => "two_days_prior",
            OffsetKind::OneDayPrior => "one_day_prior",
            OffsetKind::SameDay => "same_day",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OffsetKind::TwoDaysPrior => "2 days prior",
            OffsetKind::OneDayPrior => "1 day prior",
            OffsetKind::SameDay => "Same day",
        }
    }

    pub fn heading(&self, occasion: &str) -> String {
        match self {
            OffsetKind::TwoDaysPrior => format!("Holiday Reminder: {}", occasion),
            OffsetKind::OneDayPrior => format!("Holiday Tomorrow: {}", occasion),
            OffsetKind::SameDay => format!("Happy Holiday: {}!", occasion),
        }
    }

    pub fn body(&self, occasion: &str) -> String {
        match self {
            OffsetKind::TwoDaysPrior => format!("Just 2 days until '{}'! Get ready!", occasion),
            OffsetKind::OneDayPrior => format!("'{}' is tomorrow! Almost time!", occasion),
            OffsetKind::SameDay => format!("Today is '{}'! Enjoy your day off!", occasion),
        }
    }
}

/// One scheduled push notification for one qualifying day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPlan {
    pub occasion: String,
    /// Bikram Sambat date of the occasion, `YYYY-MM-DD`.
    pub local_date: String,
    pub offset_kind: OffsetKind,
    pub send_at_utc: DateTime<Utc>,
}

impl NotificationPlan {
    pub fn heading(&self) -> String {
        self.offset_kind.heading(&self.occasion)
    }

    pub fn body(&self) -> String {
        self.offset_kind.body(&self.occasion)
    }

    /// Key the push backend uses to drop resubmissions of this plan.
    /// Depends only on the day and the offset, so every daily run that
    /// still sees the day submits the same key.
    pub fn idempotency_key(&self) -> Uuid {
        let name = format!("{}/{}", self.local_date, self.offset_kind.as_str());
        Uuid::new_v5(&PLAN_KEY_NAMESPACE, name.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted { backend_id: String },
    Failed { detail: String, timed_out: bool },
    /// Send instant already passed when the plan reached the dispatcher.
    SkippedPast,
    /// No push credentials configured.
    SkippedUnconfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub plan: NotificationPlan,
    pub outcome: DispatchOutcome,
}

impl DispatchResult {
    pub fn accepted(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Accepted { .. })
    }
}
