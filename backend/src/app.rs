use std::sync::Arc;

use crate::{
    config::{CalendarSourceConfig, Config},
    push::OneSignalBackend,
    services::{Dispatcher, NotificationPipeline},
    sources::{ApiCalendarSource, CalendarSource, FileCalendarSource},
    utils::time::Clock,
};

/// Wires the configured calendar source and push backend into a pipeline.
///
/// Missing push credentials are not an error here: the pipeline still runs
/// and every dispatch is skipped with a warning.
pub fn build_pipeline(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<NotificationPipeline> {
    let source: Arc<dyn CalendarSource> = match &config.calendar_source {
        CalendarSourceConfig::Api { base_url } => {
            Arc::new(ApiCalendarSource::new(base_url.clone(), config.http_timeout)?)
        }
        CalendarSourceConfig::File { path } => Arc::new(FileCalendarSource::new(path.clone())),
    };

    let dispatcher = match config.push.credentials() {
        Ok(credentials) => {
            let backend = OneSignalBackend::new(
                config.push.api_url.clone(),
                credentials,
                config.http_timeout,
            )?;
            Dispatcher::new(Arc::new(backend), clock.clone())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Push credentials missing, notifications will be skipped");
            Dispatcher::unconfigured(err, clock.clone())
        }
    };

    Ok(NotificationPipeline::new(
        source,
        dispatcher,
        clock,
        config.time_zone,
        config.scan_window_days,
    ))
}
