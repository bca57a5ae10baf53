use futures::future::join_all;
use std::sync::Arc;

use crate::{
    error::{BackendConfigError, DispatchError},
    models::{DispatchOutcome, DispatchResult, NotificationPlan},
    push::{PushBackend, PushPayload},
    utils::time::Clock,
};

/// Submits notification plans to the push backend.
///
/// Every plan resolves to a [`DispatchResult`]; nothing here returns an
/// error or aborts sibling plans.
pub struct Dispatcher {
    backend: Result<Arc<dyn PushBackend>, BackendConfigError>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn PushBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend: Ok(backend),
            clock,
        }
    }

    /// A dispatcher without credentials: every plan is skipped with a warning.
    pub fn unconfigured(reason: BackendConfigError, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend: Err(reason),
            clock,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_ok()
    }

    pub async fn dispatch(&self, plan: NotificationPlan) -> DispatchResult {
        let backend = match &self.backend {
            Ok(backend) => backend,
            Err(reason) => {
                tracing::warn!(
                    local_date = %plan.local_date,
                    occasion = %plan.occasion,
                    offset = plan.offset_kind.label(),
                    reason = %reason,
                    "Push backend not configured, skipping notification"
                );
                return DispatchResult {
                    plan,
                    outcome: DispatchOutcome::SkippedUnconfigured,
                };
            }
        };

        let now = self.clock.now_utc();
        if plan.send_at_utc < now {
            tracing::info!(
                local_date = %plan.local_date,
                occasion = %plan.occasion,
                offset = plan.offset_kind.label(),
                send_at = %plan.send_at_utc,
                "Skipping notification scheduled in the past"
            );
            return DispatchResult {
                plan,
                outcome: DispatchOutcome::SkippedPast,
            };
        }

        tracing::info!(
            local_date = %plan.local_date,
            occasion = %plan.occasion,
            offset = plan.offset_kind.label(),
            send_at = %plan.send_at_utc,
            "Scheduling notification"
        );

        let payload = PushPayload::from_plan(&plan);
        let outcome = match backend.schedule_notification(&payload).await {
            Ok(backend_id) => {
                tracing::info!(
                    local_date = %plan.local_date,
                    occasion = %plan.occasion,
                    offset = plan.offset_kind.label(),
                    %backend_id,
                    "Notification scheduled"
                );
                DispatchOutcome::Accepted { backend_id }
            }
            Err(err) => {
                log_failure(&plan, &err);
                DispatchOutcome::Failed {
                    detail: failure_detail(&err),
                    timed_out: err.is_timeout(),
                }
            }
        };

        DispatchResult { plan, outcome }
    }

    /// Dispatches all plans concurrently and collects every result, in
    /// input order.
    pub async fn dispatch_all(
        &self,
        plans: impl IntoIterator<Item = NotificationPlan>,
    ) -> Vec<DispatchResult> {
        join_all(plans.into_iter().map(|plan| self.dispatch(plan))).await
    }
}

fn failure_detail(err: &DispatchError) -> String {
    match err.body() {
        Some(body) => format!("{}: {}", err, body),
        None => err.to_string(),
    }
}

fn log_failure(plan: &NotificationPlan, err: &DispatchError) {
    let body = err
        .body()
        .and_then(|body| serde_json::to_string_pretty(body).ok());
    tracing::error!(
        local_date = %plan.local_date,
        occasion = %plan.occasion,
        offset = plan.offset_kind.label(),
        status = ?err.status(),
        timed_out = err.is_timeout(),
        body = body.as_deref().unwrap_or("<none>"),
        error = %err,
        "Failed to schedule notification"
    );
}
