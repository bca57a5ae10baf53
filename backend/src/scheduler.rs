use chrono::{DateTime, Days, NaiveTime, Utc};
use chrono_tz::Tz;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::signal;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::ConversionError,
    services::{NotificationPipeline, RunSummary},
    utils::time::{resolve_local, Clock},
};

/// Runs the pipeline once at startup and then daily at a fixed local
/// wall-clock time until shutdown.
pub struct SchedulerDriver {
    pipeline: Arc<NotificationPipeline>,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
    daily_at: NaiveTime,
}

impl SchedulerDriver {
    pub fn new(
        pipeline: Arc<NotificationPipeline>,
        clock: Arc<dyn Clock>,
        daily_at: NaiveTime,
    ) -> Self {
        let time_zone = pipeline.time_zone();
        Self {
            pipeline,
            clock,
            time_zone,
            daily_at,
        }
    }

    pub async fn run_until_shutdown<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!("Scheduler started, running initial check");
        self.run_isolated().await;

        loop {
            let now = self.clock.now_utc();
            let next = match next_run_after(now, &self.time_zone, self.daily_at) {
                Ok(next) => next,
                Err(err) => {
                    tracing::error!(error = %err, "Could not compute next run time, retrying in 24h");
                    now + chrono::Duration::hours(24)
                }
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(
                next_run = %next.with_timezone(&self.time_zone),
                wait_secs = wait.as_secs(),
                "Waiting for next daily check"
            );

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.run_isolated().await;
                }
            }
        }
    }

    /// Runs the pipeline on its own task so that an error or a panic is
    /// logged and contained. Returns the summary of a successful run.
    pub async fn run_isolated(&self) -> Option<RunSummary> {
        let run_id = Uuid::new_v4();
        let pipeline = Arc::clone(&self.pipeline);
        let span = tracing::info_span!("daily_check", %run_id);

        let handle = tokio::spawn(async move { pipeline.run().await }.instrument(span));

        match handle.await {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(err)) => {
                tracing::error!(%run_id, error = %err, "Daily check failed");
                None
            }
            Err(err) if err.is_panic() => {
                tracing::error!(%run_id, "Daily check panicked");
                None
            }
            Err(err) => {
                tracing::error!(%run_id, error = %err, "Daily check was cancelled");
                None
            }
        }
    }
}

/// First instant strictly after `now` at which the local clock in `tz`
/// reads `at`. Days on which `at` does not exist are skipped.
pub fn next_run_after(
    now: DateTime<Utc>,
    tz: &Tz,
    at: NaiveTime,
) -> Result<DateTime<Utc>, ConversionError> {
    let today = now.with_timezone(tz).date_naive();
    let mut last_err = ConversionError::DateOutOfRange(today);

    for offset in 0..=2 {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        match resolve_local(tz, date.and_time(at)) {
            Ok(candidate) if candidate.with_timezone(&Utc) > now => {
                return Ok(candidate.with_timezone(&Utc));
            }
            Ok(_) => {}
            Err(err) => last_err = err,
        }
    }

    Err(last_err)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
