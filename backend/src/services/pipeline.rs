use chrono_tz::Tz;
use futures::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;

use super::{
    classifier::classify, dispatcher::Dispatcher, planner::plan_notifications, window::ScanWindow,
};
use crate::{
    error::{PipelineError, RecordError},
    models::{DayRecord, DispatchOutcome, DispatchResult},
    sources::{CalendarSource, SourceItem},
    utils::time::Clock,
};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub days_seen: usize,
    pub malformed: usize,
    pub unconvertible: usize,
    pub matched: usize,
    pub accepted: usize,
    pub failed: usize,
    pub skipped_past: usize,
    pub skipped_unconfigured: usize,
}

impl RunSummary {
    fn record_rejection(&mut self, err: &RecordError) {
        match err {
            RecordError::Malformed(_) => self.malformed += 1,
            RecordError::Conversion { .. } => self.unconvertible += 1,
        }
    }

    fn record_results(&mut self, results: &[DispatchResult]) {
        for result in results {
            match result.outcome {
                DispatchOutcome::Accepted { .. } => self.accepted += 1,
                DispatchOutcome::Failed { .. } => self.failed += 1,
                DispatchOutcome::SkippedPast => self.skipped_past += 1,
                DispatchOutcome::SkippedUnconfigured => self.skipped_unconfigured += 1,
            }
        }
    }
}

/// One scan: fetch → classify → window → plan → dispatch.
///
/// Nothing is kept between runs; the stream is consumed one day at a time.
pub struct NotificationPipeline {
    source: Arc<dyn CalendarSource>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    time_zone: Tz,
    window_days: u32,
}

impl NotificationPipeline {
    pub fn new(
        source: Arc<dyn CalendarSource>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        time_zone: Tz,
        window_days: u32,
    ) -> Self {
        Self {
            source,
            dispatcher,
            clock,
            time_zone,
            window_days,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Runs one scan. Only a calendar that cannot be read (or a window
    /// that cannot be computed) fails the run.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let now = self.clock.now_utc().with_timezone(&self.time_zone);
        let window =
            ScanWindow::starting_at(now, self.window_days).map_err(PipelineError::Window)?;
        let (range_start, range_end) = window.fetch_range();

        tracing::info!(
            source = %self.source.describe(),
            window_start = %window.start(),
            window_end = %window.end(),
            "Running daily holiday check"
        );

        let mut days = self.source.fetch_days(range_start, range_end).await?;
        let mut summary = RunSummary::default();

        while let Some(item) = days.try_next().await? {
            match item {
                SourceItem::Day(record) => {
                    summary.days_seen += 1;
                    self.process_day(record, &window, &mut summary).await;
                }
                SourceItem::Rejected(err) => {
                    tracing::warn!(error = %err, "Skipping calendar record");
                    summary.record_rejection(&err);
                }
            }
        }

        if summary.matched == 0 {
            tracing::info!(
                window_days = self.window_days,
                "No upcoming holidays or Saturdays found in the scan window"
            );
        }
        tracing::info!(
            days_seen = summary.days_seen,
            malformed = summary.malformed,
            unconvertible = summary.unconvertible,
            matched = summary.matched,
            accepted = summary.accepted,
            failed = summary.failed,
            skipped_past = summary.skipped_past,
            skipped_unconfigured = summary.skipped_unconfigured,
            "Daily check finished"
        );

        Ok(summary)
    }

    async fn process_day(&self, record: DayRecord, window: &ScanWindow, summary: &mut RunSummary) {
        let Some(day) = classify(&record) else {
            return;
        };
        let local_date = day.local_date.to_string();

        match window.contains_date(day.gregorian_date) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(%local_date, gregorian_date = %day.gregorian_date, "Outside scan window");
                return;
            }
            Err(err) => {
                tracing::warn!(%local_date, error = %err, "Skipping day with unresolvable midnight");
                summary.unconvertible += 1;
                return;
            }
        }

        let plans = match plan_notifications(&day, &self.time_zone) {
            Ok(plans) => plans,
            Err(err) => {
                tracing::warn!(%local_date, error = %err, "Skipping day with unresolvable send time");
                summary.unconvertible += 1;
                return;
            }
        };

        summary.matched += 1;
        tracing::info!(
            %local_date,
            gregorian_date = %day.gregorian_date,
            kind = day.kind_label(),
            occasion = %day.display_name,
            "Holiday found"
        );

        let results = self.dispatcher.dispatch_all(plans).await;
        summary.record_results(&results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ConversionError, MalformedRecordError},
        models::{BsDate, EventAnnotation},
        push::MockPushBackend,
        sources::InMemoryCalendarSource,
        utils::time::FixedClock,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Kathmandu;

    fn day(month: u32, day: u32, day_of_week: u8, events: Vec<EventAnnotation>) -> SourceItem {
        SourceItem::Day(DayRecord {
            local_date: BsDate::new(2082, 7, 1),
            gregorian_date: NaiveDate::from_ymd_opt(2025, month, day).unwrap(),
            day_of_week,
            events,
        })
    }

    fn pipeline(
        items: Vec<SourceItem>,
        mock: MockPushBackend,
        now: DateTime<Utc>,
    ) -> NotificationPipeline {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
        NotificationPipeline::new(
            Arc::new(InMemoryCalendarSource::new(items)),
            Dispatcher::new(Arc::new(mock), clock.clone()),
            clock,
            Kathmandu,
            30,
        )
    }

    #[tokio::test]
    async fn saturday_in_window_schedules_three_notifications() {
        let mut mock = MockPushBackend::new();
        mock.expect_schedule_notification()
            .times(3)
            .returning(|_| Ok("id".to_string()));

        let now = Utc.with_ymd_and_hms(2025, 11, 10, 6, 0, 0).unwrap();
        let summary = pipeline(
            vec![day(11, 12, 3, vec![]), day(11, 15, 6, vec![])],
            mock,
            now,
        )
        .run()
        .await
        .unwrap();

        assert_eq!(summary.days_seen, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.accepted, 3);
    }

    #[tokio::test]
    async fn past_offsets_are_skipped() {
        let mut mock = MockPushBackend::new();
        mock.expect_schedule_notification()
            .times(1)
            .withf(|payload| payload.headings["en"].starts_with("Happy Holiday"))
            .returning(|_| Ok("id".to_string()));

        // 11:45 local on 14 November: both reminders for the 15th are past.
        let now = Utc.with_ymd_and_hms(2025, 11, 14, 6, 0, 0).unwrap();
        let summary = pipeline(vec![day(11, 15, 6, vec![])], mock, now)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.skipped_past, 2);
        assert_eq!(summary.accepted, 1);
    }

    #[tokio::test]
    async fn rejected_records_are_counted_and_siblings_processed() {
        let mut mock = MockPushBackend::new();
        mock.expect_schedule_notification()
            .times(3)
            .returning(|_| Ok("id".to_string()));

        let now = Utc.with_ymd_and_hms(2025, 11, 10, 6, 0, 0).unwrap();
        let items = vec![
            SourceItem::Rejected(MalformedRecordError::new("2082-7-20", "missing date").into()),
            day(11, 19, 3, vec![EventAnnotation::holiday("Chhath")]),
            SourceItem::Rejected(RecordError::Conversion {
                location: "2101-1-1".into(),
                source: ConversionError::YearOutOfRange {
                    year: 2101,
                    min: 2070,
                    max: 2090,
                },
            }),
        ];
        let summary = pipeline(items, mock, now).run().await.unwrap();

        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.unconvertible, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.accepted, 3);
    }

    #[tokio::test]
    async fn ordinary_days_produce_no_dispatch() {
        let mut mock = MockPushBackend::new();
        mock.expect_schedule_notification().times(0);

        let now = Utc.with_ymd_and_hms(2025, 11, 10, 6, 0, 0).unwrap();
        let summary = pipeline(
            vec![
                day(11, 11, 2, vec![EventAnnotation::observance("World Science Day")]),
                day(11, 12, 3, vec![]),
            ],
            mock,
            now,
        )
        .run()
        .await
        .unwrap();

        assert_eq!(summary.days_seen, 2);
        assert_eq!(summary, RunSummary { days_seen: 2, ..RunSummary::default() });
    }
}
